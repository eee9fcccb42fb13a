#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tokio::sync::OnceCell;
use tower::ServiceExt;

use server::startup::{build_app, build_state};

pub const SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();
    cfg
}

/// Router over a connection that was never opened; only for paths that
/// fail before touching the database.
pub fn offline_app() -> Router {
    build_app(build_state(DatabaseConnection::Disconnected, &test_config()))
}

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Migrated database, or `None` when DB tests are disabled or unreachable.
pub async fn db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match models::db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skipping db test: {e}");
            return None;
        }
    };
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match migration::Migrator::up(&db, None).await {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("migrations failed: {e}");
                    false
                }
            }
        })
        .await;
    migrated.then_some(db)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    Ok(b.body(Body::from(serde_json::to_vec(&body)?))?)
}

pub fn get_request(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    Ok(b.body(Body::empty())?)
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().oneshot(req).await?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::{init_logging_default, init_logging_json};
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, auth};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::cache::{spawn_invalidation, StatsCache};
use service::lifecycle::repo::seaorm::SeaOrmLifecycleRepository;
use service::lifecycle::LifecycleService;
use service::notify::Notifier;

/// `LOG_FORMAT=json` switches to structured output.
pub fn init_logging() {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => init_logging_json(),
        _ => init_logging_default(),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config file first, environment as fallback.
fn load_config() -> anyhow::Result<AppConfig> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config file unavailable, using environment");
            AppConfig::from_env()
        }
    }
}

/// Wire services around an open connection. The stats cache is subscribed
/// to lifecycle events before the state is handed out.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> auth::ServerState {
    let notifier = Notifier::default();
    let stats_cache = StatsCache::from_config(&cfg.cache);
    spawn_invalidation(stats_cache.clone(), notifier.subscribe());

    let auth_repo = Arc::new(SeaOrmAuthRepository { db: db.clone() });
    let auth_service = Arc::new(AuthService::new(auth_repo, AuthConfig::from(&cfg.auth)));
    let lifecycle = LifecycleService::new(Arc::new(SeaOrmLifecycleRepository { db: db.clone() }), notifier);

    auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone() },
        auth_service,
        lifecycle,
        stats_cache,
    }
}

pub fn build_app(state: auth::ServerState) -> Router {
    routes::build_router(build_cors(), state)
}

async fn bootstrap_admin(state: &auth::ServerState, cfg: &AppConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (cfg.auth.admin_email.as_deref(), cfg.auth.admin_password.as_deref()) else {
        info!("no admin credentials configured, skipping bootstrap");
        return Ok(());
    };
    let admin = state.auth_service.bootstrap_admin(email, &cfg.auth.admin_name, password).await?;
    info!(admin_id = %admin.id, email = %admin.email, "admin account ready");
    Ok(())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    common::env::ensure_env("data").await?;
    let cfg = load_config()?;

    let db = models::db::connect_with_config(&models::db::DatabaseConfig::from(&cfg.database)).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let state = build_state(db, &cfg);
    bootstrap_admin(&state, &cfg).await?;

    let app = build_app(state);
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting homeserv api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

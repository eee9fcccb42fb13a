use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};

use models::user::Role;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{verify_token, AuthService};
use service::cache::StatsCache;
use service::lifecycle::repo::seaorm::SeaOrmLifecycleRepository;
use service::lifecycle::{ActingUser, LifecycleService};

use crate::errors::{ApiError, ApiJson};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub auth_service: Arc<AuthService<SeaOrmAuthRepository>>,
    pub lifecycle: LifecycleService<SeaOrmLifecycleRepository>,
    pub stats_cache: StatsCache,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthUser>), ApiError> {
    let user = state.auth_service.register(input).await?;
    state.stats_cache.invalidate_admin().await;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Logged in"), (status = 401, description = "Unauthorized"), (status = 403, description = "Blocked")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<LoginOutput>), ApiError> {
    let session = state.auth_service.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { user: session.user, token: session.token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
) -> Result<Json<AuthUser>, ApiError> {
    Ok(Json(state.auth_service.me(actor.id).await?))
}

fn is_public(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS
        || matches!(path, "/health" | "/metrics" | "/auth/login" | "/auth/register" | "/auth/logout")
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || (*method == Method::GET && path.starts_with("/services"))
}

/// Pull the raw token from `Authorization: Bearer` or the auth cookie.
fn extract_token(req: &Request) -> Result<Option<String>, ApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(ApiError::Unauthorized("expected Bearer token".into())),
        };
    }
    let jar = CookieJar::from_headers(req.headers());
    Ok(jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Global middleware: everything outside the public set needs a valid JWT.
/// Missing token is 400, invalid or expired is 401. The verified caller is
/// stored as an `ActingUser` extension.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    if is_public(req.method(), &path) {
        return Ok(next.run(req).await);
    }
    let Some(token) = extract_token(&req)? else {
        warn!(path = %path, "missing Authorization header and auth_token cookie");
        return Err(ApiError::BadRequest("missing authentication token".into()));
    };
    let claims = verify_token(&state.auth.jwt_secret, &token).map_err(|e| {
        warn!(path = %path, "token validation failed");
        ApiError::from(e)
    })?;
    req.extensions_mut().insert(ActingUser::new(claims.uid, claims.role));
    Ok(next.run(req).await)
}

/// Route guard; state is the role the route group requires.
pub async fn require_role(
    State(role): State<Role>,
    Extension(actor): Extension<ActingUser>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if actor.role != role {
        info!(user = %actor.id, have = %actor.role, need = %role, "role check failed");
        return Err(ApiError::Forbidden(format!("{} role required", role)));
    }
    Ok(next.run(req).await)
}

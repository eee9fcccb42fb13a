pub mod admin;
pub mod auth;
pub mod catalog;
pub mod customer;
pub mod directory;
pub mod professional;
pub mod profile;
pub mod stats;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use models::user::Role;

use crate::openapi::ApiDoc;
use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (axum::http::StatusCode, String) {
    common::metrics::encode_metrics()
}

fn customer_routes() -> Router<ServerState> {
    Router::new()
        .route("/customer/requests", get(customer::list).post(customer::create))
        .route("/customer/requests/:id", get(customer::get))
        .route("/customer/requests/:id/close", post(customer::close))
        .route("/customer/requests/:id/cancel", post(customer::cancel))
        .route("/customer/profile", get(profile::get).put(profile::update))
        .route("/stats/customer", get(stats::customer))
        .route_layer(middleware::from_fn_with_state(Role::Customer, auth::require_role))
}

fn professional_routes() -> Router<ServerState> {
    Router::new()
        .route("/professional/requests", get(professional::list))
        .route("/professional/requests/:id/accept", post(professional::accept))
        .route("/professional/requests/:id/reject", post(professional::reject))
        .route("/professional/requests/:id/complete", post(professional::complete))
        .route("/professional/profile", get(profile::get).put(profile::update))
        .route("/stats/professional", get(stats::professional))
        .route_layer(middleware::from_fn_with_state(Role::Professional, auth::require_role))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/admin/services", post(catalog::create))
        .route("/admin/services/:id", axum::routing::put(catalog::update).delete(catalog::delete))
        .route("/admin/requests", get(admin::list_requests))
        .route("/admin/requests/:id/assign", post(admin::assign))
        .route("/admin/requests/:id/unassign", post(admin::unassign))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/customers", get(admin::list_customers))
        .route("/admin/professionals", get(admin::list_professionals))
        .route("/admin/professionals/:id/verify", post(admin::verify_professional))
        .route("/admin/users/:id/status", post(admin::set_user_status))
        .route("/stats/admin", get(stats::admin))
        .route_layer(middleware::from_fn_with_state(Role::Admin, auth::require_role))
}

/// Build the full application router: public, per-role and docs routes
/// behind the JWT middleware and request tracing.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", get(profile::get).put(profile::update))
        .route("/professionals", get(directory::search))
        .route("/services", get(catalog::list))
        .route("/services/types", get(catalog::types))
        .route("/services/:id", get(catalog::get))
        .route("/services/:id/professionals", get(directory::for_service));

    public
        .merge(customer_routes())
        .merge(professional_routes())
        .merge(admin_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

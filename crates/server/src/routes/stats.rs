use axum::{extract::State, Extension, Json};

use service::lifecycle::ActingUser;
use service::stats_service::{self, AdminStats, RequestSummary};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/stats/admin", tag = "stats", responses((status = 200, description = "Platform counters")))]
pub async fn admin(State(state): State<ServerState>) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(stats_service::admin_stats(&state.db, &state.stats_cache).await?))
}

#[utoipa::path(get, path = "/stats/customer", tag = "stats", responses((status = 200, description = "Own request summary")))]
pub async fn customer(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
) -> Result<Json<RequestSummary>, ApiError> {
    Ok(Json(stats_service::customer_stats(&state.db, &state.stats_cache, actor.id).await?))
}

#[utoipa::path(get, path = "/stats/professional", tag = "stats", responses((status = 200, description = "Assigned work summary")))]
pub async fn professional(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
) -> Result<Json<RequestSummary>, ApiError> {
    Ok(Json(stats_service::professional_stats(&state.db, &state.stats_cache, actor.id).await?))
}

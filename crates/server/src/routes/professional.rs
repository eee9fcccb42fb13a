use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use common::types::Page;
use service::lifecycle::{ActingUser, ServiceRequest};
use service::pagination::Pagination;
use service::request_service;

use crate::errors::ApiError;
use crate::routes::auth::ServerState;
use crate::routes::customer::StatusQuery;

/// Assigned requests. `status` takes an exact status or one of the groups
/// `new`, `active`, `completed`.
#[utoipa::path(get, path = "/professional/requests", tag = "professional",
    params(("status" = Option<String>, Query, description = "Status or group")),
    responses((status = 200, description = "Assigned requests")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Query(q): Query<StatusQuery>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ServiceRequest>>, ApiError> {
    let page = request_service::list_professional_requests(&state.db, actor.id, q.status.as_deref(), opts).await?;
    Ok(Json(page))
}

#[utoipa::path(post, path = "/professional/requests/{id}/accept", tag = "professional", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Accepted"), (status = 409, description = "Invalid transition")))]
pub async fn accept(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.accept(id, &actor).await?))
}

#[utoipa::path(post, path = "/professional/requests/{id}/reject", tag = "professional", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Rejected"), (status = 409, description = "Invalid transition")))]
pub async fn reject(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.reject(id, &actor).await?))
}

#[utoipa::path(post, path = "/professional/requests/{id}/complete", tag = "professional", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Completed"), (status = 409, description = "Invalid transition")))]
pub async fn complete(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.complete(id, &actor).await?))
}

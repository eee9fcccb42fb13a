use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use common::types::Page;
use models::catalog;
use service::catalog_service::{self, NewService, ServiceFilter, ServiceUpdate};
use service::pagination::Pagination;

use crate::errors::{ApiError, ApiJson};
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/services", tag = "catalog",
    params(("type" = Option<String>, Query, description = "Service type"), ("search" = Option<String>, Query, description = "Name or description text"),
        ("page" = Option<u64>, Query, description = "1-based page"), ("per_page" = Option<u64>, Query, description = "Page size")),
    responses((status = 200, description = "Services")))]
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<ServiceFilter>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<catalog::Model>>, ApiError> {
    Ok(Json(catalog_service::list_services(&state.db, &filter, opts).await?))
}

#[utoipa::path(get, path = "/services/types", tag = "catalog", responses((status = 200, description = "Distinct service types")))]
pub async fn types(State(state): State<ServerState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(catalog_service::list_service_types(&state.db).await?))
}

#[utoipa::path(get, path = "/services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Service id")),
    responses((status = 200, description = "Service"), (status = 404, description = "Not found")))]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<catalog::Model>, ApiError> {
    Ok(Json(catalog_service::get_service(&state.db, id).await?))
}

#[utoipa::path(post, path = "/admin/services", tag = "admin", request_body = crate::openapi::NewServiceDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Name taken")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<NewService>,
) -> Result<(StatusCode, Json<catalog::Model>), ApiError> {
    let created = catalog_service::create_service(&state.db, input).await?;
    state.stats_cache.invalidate_admin().await;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(put, path = "/admin/services/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Service id")),
    request_body = crate::openapi::ServiceUpdateDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ServiceUpdate>,
) -> Result<Json<catalog::Model>, ApiError> {
    let updated = catalog_service::update_service(&state.db, id, input).await?;
    state.stats_cache.invalidate_admin().await;
    Ok(Json(updated))
}

#[utoipa::path(delete, path = "/admin/services/{id}", tag = "admin", params(("id" = Uuid, Path, description = "Service id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not found"), (status = 409, description = "Still referenced")))]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    catalog_service::delete_service(&state.db, id).await?;
    state.stats_cache.invalidate_admin().await;
    Ok(StatusCode::NO_CONTENT)
}

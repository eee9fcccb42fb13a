//! Admin endpoints: request assignment, account listings, professional
//! verification and blocking.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use models::{professional, user};
use service::admin_service::{self, CustomerFilter, CustomerView, ProfessionalFilter, ProfessionalView, UserFilter};
use service::lifecycle::{ActingUser, ServiceRequest};
use service::pagination::Pagination;
use service::request_service::{self, RequestFilter};

use crate::errors::{ApiError, ApiJson};
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub professional_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    pub approve: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusBody {
    pub active: bool,
}

#[utoipa::path(get, path = "/admin/requests", tag = "admin",
    params(("status" = Option<String>, Query, description = "Exact status"), ("customer_id" = Option<Uuid>, Query, description = "Customer filter"),
        ("professional_id" = Option<Uuid>, Query, description = "Professional filter")),
    responses((status = 200, description = "All requests")))]
pub async fn list_requests(
    State(state): State<ServerState>,
    Query(filter): Query<RequestFilter>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ServiceRequest>>, ApiError> {
    Ok(Json(request_service::list_all_requests(&state.db, &filter, opts).await?))
}

#[utoipa::path(post, path = "/admin/requests/{id}/assign", tag = "admin", params(("id" = Uuid, Path, description = "Request id")),
    request_body = crate::openapi::AssignDoc,
    responses((status = 200, description = "Assigned"), (status = 400, description = "Professional unavailable"), (status = 409, description = "Invalid transition or conflict")))]
pub async fn assign(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<AssignBody>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.assign(id, body.professional_id, &actor).await?))
}

#[utoipa::path(post, path = "/admin/requests/{id}/unassign", tag = "admin", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Back to requested"), (status = 409, description = "Invalid transition")))]
pub async fn unassign(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.unassign(id, &actor).await?))
}

#[utoipa::path(get, path = "/admin/professionals", tag = "admin",
    params(("status" = Option<String>, Query, description = "pending, approved, rejected or blocked"), ("available" = Option<bool>, Query, description = "Availability")),
    responses((status = 200, description = "Professionals")))]
pub async fn list_professionals(
    State(state): State<ServerState>,
    Query(filter): Query<ProfessionalFilter>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ProfessionalView>>, ApiError> {
    Ok(Json(admin_service::list_professionals(&state.db, &filter, opts).await?))
}

#[utoipa::path(get, path = "/admin/users", tag = "admin",
    params(("role" = Option<String>, Query, description = "customer, professional or admin"), ("status" = Option<String>, Query, description = "active, blocked, pending or approved"),
        ("q" = Option<String>, Query, description = "Name or email substring")),
    responses((status = 200, description = "Accounts"), (status = 400, description = "Bad filter")))]
pub async fn list_users(
    State(state): State<ServerState>,
    Query(filter): Query<UserFilter>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<user::Model>>, ApiError> {
    Ok(Json(admin_service::list_users(&state.db, &filter, opts).await?))
}

#[utoipa::path(get, path = "/admin/customers", tag = "admin",
    params(("active" = Option<bool>, Query, description = "Account state"), ("pincode" = Option<String>, Query, description = "Exact pincode"),
        ("q" = Option<String>, Query, description = "Name or email substring")),
    responses((status = 200, description = "Customers with their profiles")))]
pub async fn list_customers(
    State(state): State<ServerState>,
    Query(filter): Query<CustomerFilter>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<CustomerView>>, ApiError> {
    Ok(Json(admin_service::list_customers(&state.db, &filter, opts).await?))
}

#[utoipa::path(post, path = "/admin/professionals/{id}/verify", tag = "admin", params(("id" = Uuid, Path, description = "Professional user id")),
    request_body = crate::openapi::VerifyDoc,
    responses((status = 200, description = "Verification recorded"), (status = 400, description = "Missing reason"), (status = 404, description = "Not found")))]
pub async fn verify_professional(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<VerifyBody>,
) -> Result<Json<professional::Model>, ApiError> {
    let updated = admin_service::verify_professional(&state.db, id, actor.id, body.approve, body.reason).await?;
    state.stats_cache.invalidate_all();
    Ok(Json(updated))
}

#[utoipa::path(post, path = "/admin/users/{id}/status", tag = "admin", params(("id" = Uuid, Path, description = "User id")),
    request_body = crate::openapi::UserStatusDoc,
    responses((status = 200, description = "Updated"), (status = 400, description = "Cannot block self"), (status = 404, description = "Not found")))]
pub async fn set_user_status(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UserStatusBody>,
) -> Result<Json<user::Model>, ApiError> {
    let updated = admin_service::set_user_active(&state.db, id, body.active, actor.id).await?;
    state.stats_cache.invalidate_all();
    Ok(Json(updated))
}

//! Customer-facing request endpoints. Role is enforced by the router.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use common::types::Page;
use service::lifecycle::{ActingUser, ServiceRequest};
use service::pagination::Pagination;
use service::request_service;

use crate::errors::{ApiError, ApiJson};
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub service_id: Uuid,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// `rating` stays untyped so that a missing or non-numeric value reaches
/// the lifecycle, which reports it only after the state checks pass.
#[derive(Debug, Deserialize)]
pub struct CloseBody {
    #[serde(default)]
    pub rating: Value,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Only JSON numbers count; strings such as `"4"` do not.
pub(crate) fn parse_rating(v: &Value) -> Option<f64> {
    v.as_f64()
}

#[utoipa::path(get, path = "/customer/requests", tag = "customer",
    params(("status" = Option<String>, Query, description = "Exact status")),
    responses((status = 200, description = "Own requests, newest first")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Query(q): Query<StatusQuery>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ServiceRequest>>, ApiError> {
    let page = request_service::list_customer_requests(&state.db, actor.id, q.status.as_deref(), opts).await?;
    Ok(Json(page))
}

#[utoipa::path(post, path = "/customer/requests", tag = "customer", request_body = crate::openapi::CreateRequestDoc,
    responses((status = 201, description = "Created"), (status = 404, description = "Unknown service")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    ApiJson(body): ApiJson<CreateRequestBody>,
) -> Result<(StatusCode, Json<ServiceRequest>), ApiError> {
    let created = state.lifecycle.create(&actor, body.service_id, body.remarks).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/customer/requests/{id}", tag = "customer", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Request"), (status = 403, description = "Not the owner"), (status = 404, description = "Not found")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(request_service::get_customer_request(&state.db, actor.id, id).await?))
}

#[utoipa::path(post, path = "/customer/requests/{id}/close", tag = "customer", params(("id" = Uuid, Path, description = "Request id")),
    request_body = crate::openapi::CloseRequestDoc,
    responses((status = 200, description = "Closed"), (status = 400, description = "Bad rating"), (status = 409, description = "Invalid transition")))]
pub async fn close(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<CloseBody>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.close(id, parse_rating(&body.rating), body.remarks, &actor).await?))
}

#[utoipa::path(post, path = "/customer/requests/{id}/cancel", tag = "customer", params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Cancelled"), (status = 409, description = "Invalid transition")))]
pub async fn cancel(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, ApiError> {
    Ok(Json(state.lifecycle.cancel(id, &actor).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rating_accepts_json_numbers() {
        assert_eq!(parse_rating(&json!(4)), Some(4.0));
        assert_eq!(parse_rating(&json!(4.5)), Some(4.5));
    }

    #[test]
    fn rating_rejects_strings_and_other_values() {
        for v in [json!(" 3 "), json!("five"), json!(null), json!(true), json!([5])] {
            assert_eq!(parse_rating(&v), None, "{v}");
        }
    }
}

//! Professional discovery for customers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use common::types::Page;
use service::pagination::Pagination;
use service::search_service::{self, ProfessionalCard, ProfessionalSearch};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub available: Option<bool>,
}

#[utoipa::path(get, path = "/professionals", tag = "catalog",
    params(("service_type" = Option<String>, Query, description = "Service type"), ("min_rating" = Option<f64>, Query, description = "Minimum average rating, 0 to 5"),
        ("available" = Option<bool>, Query, description = "Free for assignment")),
    responses((status = 200, description = "Approved professionals, best rated first"), (status = 400, description = "Bad filter")))]
pub async fn search(
    State(state): State<ServerState>,
    Query(search): Query<ProfessionalSearch>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ProfessionalCard>>, ApiError> {
    Ok(Json(search_service::search_professionals(&state.db, &search, opts).await?))
}

#[utoipa::path(get, path = "/services/{id}/professionals", tag = "catalog", params(("id" = Uuid, Path, description = "Service id"),
        ("available" = Option<bool>, Query, description = "Free for assignment")),
    responses((status = 200, description = "Professionals offering the service type"), (status = 404, description = "Unknown service")))]
pub async fn for_service(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Query(q): Query<AvailabilityQuery>,
    Query(opts): Query<Pagination>,
) -> Result<Json<Page<ProfessionalCard>>, ApiError> {
    Ok(Json(search_service::professionals_for_service(&state.db, id, q.available, opts).await?))
}

//! Self-service profile endpoints, shared by every role.

use axum::{extract::State, Extension, Json};

use service::lifecycle::ActingUser;
use service::profile_service::{self, Profile, ProfileUpdate};

use crate::errors::{ApiError, ApiJson};
use crate::routes::auth::ServerState;

#[utoipa::path(get, path = "/auth/profile", tag = "auth",
    responses((status = 200, description = "Account and role profile"), (status = 401, description = "Unauthorized")))]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(profile_service::get_profile(&state.db, actor.id).await?))
}

#[utoipa::path(put, path = "/auth/profile", tag = "auth", request_body = crate::openapi::ProfileUpdateDoc,
    responses((status = 200, description = "Updated profile"), (status = 400, description = "Field not editable or invalid")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<ActingUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(profile_service::update_profile(&state.db, actor.id, update).await?))
}

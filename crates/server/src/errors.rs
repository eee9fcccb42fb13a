use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use common::types::ErrorBody;
use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use service::lifecycle::LifecycleError;

/// Every handler error ends up here and leaves as `{"error", "status"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody::new(status.as_u16(), self.to_string()))).into_response()
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        let msg = e.to_string();
        match e {
            LifecycleError::NotFound(_) => ApiError::NotFound(msg),
            LifecycleError::InvalidTransition { .. } | LifecycleError::ConcurrencyConflict => ApiError::Conflict(msg),
            LifecycleError::Validation(_) => ApiError::BadRequest(msg),
            LifecycleError::Forbidden(_) => ApiError::Forbidden(msg),
            LifecycleError::Persistence(_) => ApiError::Internal(msg),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let msg = e.to_string();
        match e {
            ServiceError::Validation(_) | ServiceError::Model(ModelError::Validation(_)) => ApiError::BadRequest(msg),
            ServiceError::NotFound(_) => ApiError::NotFound(msg),
            ServiceError::Conflict(_) => ApiError::Conflict(msg),
            ServiceError::Forbidden(_) => ApiError::Forbidden(msg),
            ServiceError::Db(_) | ServiceError::Model(ModelError::Db(_)) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let msg = e.to_string();
        match e {
            AuthError::Validation(_) => ApiError::BadRequest(msg),
            AuthError::Conflict => ApiError::Conflict(msg),
            AuthError::NotFound => ApiError::NotFound(msg),
            AuthError::Unauthorized => ApiError::Unauthorized(msg),
            AuthError::Inactive => ApiError::Forbidden(msg),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                error!(code = e.code(), "auth failure");
                ApiError::Internal(msg)
            }
        }
    }
}

/// `Json` whose rejections use the same error envelope (always 400).
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

//! HTTP mapping of [`HaError`]

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ha_core::HaError;
use serde_json::json;
use tracing::error;

/// Handler error; renders as `{"error": code, "message": text}`
#[derive(Debug)]
pub struct ApiError(pub HaError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl<E: Into<HaError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

pub fn status_for(err: &HaError) -> StatusCode {
    match err {
        HaError::Invalid { .. } => StatusCode::BAD_REQUEST,
        HaError::NotFound { .. } => StatusCode::NOT_FOUND,
        HaError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        HaError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        HaError::Conflict { .. } => StatusCode::CONFLICT,
        HaError::Locked { .. } => StatusCode::TOO_MANY_REQUESTS,
        HaError::Crypto { .. }
        | HaError::Serialization { .. }
        | HaError::Storage { .. }
        | HaError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };
        let mut body = json!({ "error": self.0.code(), "message": message });
        let mut response = if let HaError::Locked {
            retry_after_secs, ..
        } = &self.0
        {
            body["retryAfterSecs"] = json!(retry_after_secs);
            let mut response = (status, Json(body)).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            response
        } else {
            (status, Json(body)).into_response()
        };
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

//! HTTP error mapping.
//!
//! Maps application errors to HTTP responses with a Docker-style
//! `{"message": "..."}` body, so clients of the proxy see errors in the same
//! shape the Docker Engine API uses.
//!
//! # Strategy
//! - Schema violations in upstream payloads → `500 Internal Server Error`
//! - Upstream transport failures → `502 Bad Gateway` (`504` on timeout)
//! - Missing or unknown credentials → `401 Unauthorized`
//! - Store failures → `503 Service Unavailable`
//! - Unreadable or oversized request bodies → `400 Bad Request`

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use super::{AppError, AuthError, FilterError, StoreError, UpstreamError};

/// Maps a `FilterError` to an HTTP status code.
pub fn filter_status(error: &FilterError) -> StatusCode {
    match error {
        FilterError::ContainerIdentifierNotFound
        | FilterError::InvalidResponse(_)
        | FilterError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps an `UpstreamError` to an HTTP status code.
pub fn upstream_status(error: &UpstreamError) -> StatusCode {
    match error {
        UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::Request(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::Request(_) | UpstreamError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Maps an `AuthError` to an HTTP status code.
pub fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::MissingCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::AdminRequired => StatusCode::FORBIDDEN,
    }
}

/// Maps any `AppError` to an HTTP status code.
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::Filter(e) => filter_status(e),
        AppError::Upstream(e) => upstream_status(e),
        AppError::Auth(e) => auth_status(e),
        AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::RequestBody(_) => StatusCode::BAD_REQUEST,
    }
}

/// Builds a Docker-style error body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
        error_response(status, self.to_string())
    }
}

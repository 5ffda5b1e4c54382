//! `Error` -> HTTP response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use hybridsearch_core::error::{Error, ErrorCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.0.code();
        let status = match code {
            ErrorCode::InvalidQuery => StatusCode::BAD_REQUEST,
            ErrorCode::StoreNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DependencyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = ErrorPayload {
            code,
            message: self.0.to_string(),
            details: None,
        };

        (status, Json(payload)).into_response()
    }
}

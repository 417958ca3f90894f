//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_core::{CoreError, ErrorKind};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            ApiError::Core(e) => {
                let (status, code) = match e.kind() {
                    ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
                    ErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
                    ErrorKind::Unknown => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                match e.kind() {
                    ErrorKind::Unknown => error!("Request failed: {}", e),
                    ErrorKind::Unavailable => warn!("Request failed: {}", e),
                    _ => {}
                }
                (status, code, e.user_message(), e.field().map(str::to_string))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, field) = self.parts();

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
                "field": field
            }
        }));

        (status, body).into_response()
    }
}

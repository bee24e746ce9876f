//! Webhook error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Result type for webhook operations.
pub type ClovaResult<T> = Result<T, ClovaError>;

#[derive(Debug, thiserror::Error)]
pub enum ClovaError {
    #[error("Invalid CEK payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClovaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ClovaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Webhook request failed");
        } else {
            tracing::warn!(error = %self, "Rejected webhook request");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

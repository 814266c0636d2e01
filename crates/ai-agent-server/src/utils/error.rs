use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Failures talking to the completion API.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Failed to call LLM API: {0}")]
    Request(String),

    #[error("LLM API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    #[error("No choices returned from LLM")]
    EmptyResponse,
}

/// Failures talking to the backend (tenant config, conversation persistence).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend API key not configured")]
    NotConfigured,

    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse backend response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("LLM returned an empty reply")]
    EmptyReply,
}

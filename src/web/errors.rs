//! Mapping of handler failures to HTTP responses

use super::models::ErrorResponse;
use crate::engines::SearchError;
use crate::llm::LlmError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

pub const QUERY_REQUIRED: &str = "Query parameter is required";
pub const QUERY_EMPTY: &str = "Query is required";
pub const SEARCH_FAILED: &str = "Failed to fetch search results";
pub const SUMMARY_FAILED: &str = "Failed to generate summary";

/// Handler failure; the cause is logged, the client gets a fixed message
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("search API error: {0}")]
    Search(#[from] SearchError),
    #[error("model API error: {0}")]
    Llm(#[from] LlmError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, *message),
            ApiError::Search(_) => (StatusCode::INTERNAL_SERVER_ERROR, SEARCH_FAILED),
            ApiError::Llm(_) => (StatusCode::INTERNAL_SERVER_ERROR, SUMMARY_FAILED),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("{}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

//! Error types for moodtune-core
//!
//! Every failure leaves the service as `{ "error": string, "code": string }`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AnalysisError, DetectionError, MappingError, RecommendationError};

/// Message used for every mapping failure on the wire
pub const INVALID_MAPPING_MESSAGE: &str = "Invalid emotion/language mapping";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown emotion or language (400)
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Analysis already in flight (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Detector or recommender failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// moodtune-common error
    #[error("Common error: {0}")]
    Common(#[from] moodtune_common::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let message = err.user_message();
        match err {
            AnalysisError::InvalidInput(_) => ApiError::BadRequest(message),
            AnalysisError::Mapping(inner) => ApiError::Mapping(inner),
            AnalysisError::Concurrency => ApiError::Conflict(message),
            AnalysisError::Detection(_) | AnalysisError::Recommendation(_) => {
                ApiError::Upstream(message)
            }
            AnalysisError::Capture(_) => ApiError::Internal(message),
        }
    }
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        AnalysisError::from(err).into()
    }
}

impl From<RecommendationError> for ApiError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::EmptySeeds => ApiError::BadRequest(err.to_string()),
            RecommendationError::MissingCredential => ApiError::Internal(err.to_string()),
            RecommendationError::Upstream { message, .. } => ApiError::Upstream(message),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Mapping(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_MAPPING",
                INVALID_MAPPING_MESSAGE.to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": error_code,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

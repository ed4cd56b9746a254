//! Error types for Wayfetch
//!
//! This module defines custom error types used throughout the application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid router configuration: {0}")]
    InvalidConfig(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Classified failure of a single tier attempt
///
/// Tier failures never surface to the ultimate caller as errors; they are
/// recorded in the attempt trace and trigger cascade to the next tier.
#[derive(Debug, Error)]
pub enum TierFailure {
    #[error("tier '{tier_id}' exceeded its {budget_ms}ms budget")]
    Timeout { tier_id: String, budget_ms: u64 },

    #[error("tier '{tier_id}' execution failed: {message}")]
    Execution { tier_id: String, message: String },
}

impl TierFailure {
    /// Short classification label used in attempt traces and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            TierFailure::Timeout { .. } => "timeout",
            TierFailure::Execution { .. } => "execution_error",
        }
    }
}

/// Error raised by a Fetcher implementation
///
/// The only error type delegates are allowed to produce; the executor
/// classifies it into a [`TierFailure`] and never propagates it further.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("blocked by target: {0}")]
    Blocked(String),

    #[error("fetch failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            FetchError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::InvalidConfig(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_CONFIG",
                msg.clone(),
            ),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
            ),
            AppError::JsonError(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                "Invalid JSON in request".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_failure_kind() {
        let timeout = TierFailure::Timeout {
            tier_id: "plain_http".to_string(),
            budget_ms: 5000,
        };
        assert_eq!(timeout.kind(), "timeout");

        let exec = TierFailure::Execution {
            tier_id: "plain_http".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(exec.kind(), "execution_error");
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status { status: 403 };
        assert_eq!(err.to_string(), "upstream returned status 403");
    }
}

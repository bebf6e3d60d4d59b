//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use nudge_core::error::NudgeError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Dependency failures surface as 502 since the request itself was fine.
impl From<NudgeError> for ApiError {
    fn from(err: NudgeError) -> Self {
        let code = err.code().as_str();
        let status = match &err {
            NudgeError::Configuration(_) | NudgeError::UnsupportedProvider { .. } => {
                StatusCode::BAD_REQUEST
            }
            NudgeError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            NudgeError::NotFound { .. } => StatusCode::NOT_FOUND,
            NudgeError::Llm { .. }
            | NudgeError::Transport { .. }
            | NudgeError::Network { .. }
            | NudgeError::Timeout { .. } => StatusCode::BAD_GATEWAY,
            NudgeError::Store { .. }
            | NudgeError::Io(_)
            | NudgeError::Serialization(_)
            | NudgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let api = ApiError::new(status, code, err.to_string());
        match err.suggestion() {
            Some(suggestion) => api.with_details(serde_json::json!({ "suggestion": suggestion })),
            None => api,
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_core::error::ErrorCode;

    #[test]
    fn test_validation_maps_to_422_with_suggestion() {
        let err = NudgeError::validation_with_suggestion(
            ErrorCode::ValUnknownMode,
            "Unknown mode 'coach'",
            "Use one of: friend, mentor, tutor, accountability",
        );
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code, "VAL_003");
        assert!(api.details.is_some());
    }

    #[test]
    fn test_dependency_errors_map_to_bad_gateway() {
        let api = ApiError::from(NudgeError::transport("offline"));
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, "TRN_001");
    }

    #[test]
    fn test_not_found() {
        let api = ApiError::from(NudgeError::goal_not_found(7));
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(api.message.contains("'7'"));
    }
}

//! Error types for nudge operations.
//!
//! Errors fall into three families: configuration errors abort startup,
//! dependency errors (store, completion, transport) abort a single trigger or
//! message, and validation errors are reported straight back to the caller.

use thiserror::Error;

/// Result type alias for nudge operations.
pub type NudgeResult<T> = Result<T, NudgeError>;

/// Main error type for all nudge operations.
#[derive(Error, Debug)]
pub enum NudgeError {
    /// Configuration error. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Entity not found.
    #[error("Not found: {message}")]
    NotFound { message: String, code: ErrorCode },

    /// Context store operation failed.
    #[error("Store error: {message}")]
    Store {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM completion failed.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound transport failed to deliver.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bounded wait elapsed.
    #[error("Timed out after {after_ms}ms: {operation}")]
    Timeout { operation: String, after_ms: u64 },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalidCadence,
    CfgInvalidValue,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValEmptyMessage,
    ValUnknownMode,
    ValUnknownCategory,

    // Not found (NF_xxx)
    NfGoal,

    // Store (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbLockPoisoned,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Transport (TRN_xxx)
    TrnSendFailed,
    TrnNotReady,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalidCadence => "CFG_001",
            ErrorCode::CfgInvalidValue => "CFG_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValEmptyMessage => "VAL_002",
            ErrorCode::ValUnknownMode => "VAL_003",
            ErrorCode::ValUnknownCategory => "VAL_004",
            ErrorCode::NfGoal => "NF_001",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbLockPoisoned => "DB_003",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::TrnSendFailed => "TRN_001",
            ErrorCode::TrnNotReady => "TRN_002",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl NudgeError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a validation error with a specific code and suggestion.
    pub fn validation_with_suggestion(
        code: ErrorCode,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a not-found error for a goal.
    pub fn goal_not_found(goal_id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: format!("Goal with id '{}' not found", goal_id),
            code: ErrorCode::NfGoal,
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            code: ErrorCode::TrnSendFailed,
            source: None,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after_ms: after.as_millis() as u64,
        }
    }

    /// Create an API/network error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgInvalidValue,
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Store { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Transport { code, .. } => *code,
            Self::Timeout { .. } => ErrorCode::NetTimeout,
            Self::Network { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error is a recoverable dependency failure.
    ///
    /// Transient errors abort only the current trigger or message.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Store { .. }
                | Self::Llm { .. }
                | Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => Some("Please check the trigger and engine configuration"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Store { .. } => Some("Please check the database path and permissions"),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            Self::Transport { .. } => Some("Please check the outbound transport"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for NudgeError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = NudgeError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_dependency_errors_are_transient() {
        assert!(NudgeError::store("locked").is_transient());
        assert!(NudgeError::llm("down").is_transient());
        assert!(NudgeError::transport("offline").is_transient());
        assert!(NudgeError::timeout("completion", std::time::Duration::from_secs(2)).is_transient());
        assert!(!NudgeError::configuration("bad cadence").is_transient());
    }

    #[test]
    fn test_timeout_message() {
        let err = NudgeError::timeout("completion", std::time::Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Timed out after 1500ms: completion");
        assert_eq!(err.code(), ErrorCode::NetTimeout);
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::CfgInvalidCadence.as_str(), "CFG_001");
        assert_eq!(ErrorCode::TrnSendFailed.as_str(), "TRN_001");
    }
}

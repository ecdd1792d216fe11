//! # AppError
//!
//! Centralized error handling for the Khawater board.
//! Remote and storage failures are recoverable by design of the repository;
//! only validation errors ever reach a user.

use thiserror::Error;

/// The primary error type for all kh-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The remote store has no usable endpoint or key; no request was sent.
    #[error("remote store is not configured")]
    NotConfigured,

    /// Non-2xx answer or network failure talking to the remote store.
    /// `status` is `None` when the request never produced a response.
    #[error("remote store error{}: {body}", .status.map(|s| format!(" {s}")).unwrap_or_default())]
    Remote { status: Option<u16>, body: String },

    /// Local persistence unavailable or corrupt
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation failure (e.g., empty whisper, post too long)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Resource not found (e.g., Post)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Anything else (serialization of our own types, template rendering)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a [`AppError::Remote`] from an HTTP status and response body.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            body: body.into(),
        }
    }

    /// Builds a [`AppError::Remote`] for a request that never got an answer.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            body: message.into(),
        }
    }

    /// True for the failures the repository converts into fallback behaviour.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::Remote { .. } | Self::Storage(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for Khawater logic.
pub type Result<T> = std::result::Result<T, AppError>;

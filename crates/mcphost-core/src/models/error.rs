//! Model backend error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while consulting a model backend
///
/// None of these are recoverable inside a conversation; they abort the
/// message being processed.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The backend call failed
    #[error("{backend} API error: {message}")]
    Api { backend: String, message: String },

    /// The backend answered with something that cannot be interpreted
    #[error("Invalid response from {backend}: {message}")]
    InvalidResponse { backend: String, message: String },

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl ModelError {
    pub fn api(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

//! Conversation engine errors

use thiserror::Error;

use crate::models::ModelError;

/// Why a user message could not be answered
///
/// Tool-level failures never show up here; they become assistant turns.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("request cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;

//! Dispatch errors

use thiserror::Error;

use crate::session::InvocationError;

/// Failure to route or execute a tool call through the pool
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No connected provider exposes the tool
    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

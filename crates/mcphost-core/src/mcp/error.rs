//! MCP transport errors

use thiserror::Error;

/// Errors raised while talking to a tool provider process
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to launch provider process: {0}")]
    Spawn(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

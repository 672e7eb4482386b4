//! Provider session errors

use std::time::Duration;

use thiserror::Error;

use crate::mcp::McpError;

/// Failure to bring a provider session up
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The provider process could not be started
    #[error("launch failed: {0}")]
    Launch(String),

    /// The protocol handshake did not complete
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The tool list could not be retrieved
    #[error("tool discovery failed: {0}")]
    ToolDiscovery(String),

    /// The provider advertised the same tool name twice
    #[error("provider advertised duplicate tool `{tool}`")]
    DuplicateTool { tool: String },

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
}

impl ConnectionError {
    /// Classify a transport error raised while launching and handshaking
    pub(crate) fn from_connect(error: McpError) -> Self {
        match error {
            McpError::Spawn(message) => Self::Launch(message),
            McpError::Io(e) => Self::Launch(e.to_string()),
            other => Self::Handshake(other.to_string()),
        }
    }
}

/// Failure of a single tool invocation
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("provider `{provider}` is not connected")]
    NotConnected { provider: String },

    /// The tool ran and the provider returned an error payload
    #[error("tool `{tool}` returned an error: {message}")]
    ToolFailed { tool: String, message: String },

    /// The request or its response was lost on the channel
    #[error("channel error while calling `{tool}`: {message}")]
    Channel { tool: String, message: String },

    #[error("tool `{tool}` timed out after {after:?}")]
    Timeout { tool: String, after: Duration },
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;
pub type InvocationResult<T> = Result<T, InvocationError>;

//! Seams between a provider session and the process it talks to

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::{ProviderConfig, ToolDescriptor};

use super::client::McpClient;
use super::error::McpResult;

/// Payload returned by a provider for one `call_tool` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text content of the result
    pub content: String,
    /// Whether the provider flagged the result as an error
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// An established, handshaken request/response channel to one provider
///
/// One request yields exactly one response, in order.
#[async_trait]
pub trait ToolChannel: Send + Sync {
    /// Request the provider's tool list
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Execute a tool on the provider
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput>;

    /// Shut the channel down and release the provider process
    async fn close(self: Box<Self>) -> McpResult<()>;
}

/// Launches a provider and performs the protocol handshake
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ProviderConfig) -> McpResult<Box<dyn ToolChannel>>;
}

/// Connector that spawns providers as child processes speaking MCP over stdio
pub struct StdioConnector {
    logger: Arc<dyn Logger>,
}

impl StdioConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn connect(&self, config: &ProviderConfig) -> McpResult<Box<dyn ToolChannel>> {
        let client = McpClient::spawn(config, Arc::clone(&self.logger)).await?;
        Ok(Box::new(client))
    }
}

//! In-process fake tool providers
//!
//! Deterministic stand-ins for provider processes, used by the unit tests and
//! by embedders who want to exercise the pool without spawning anything.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::types::{ProviderConfig, ToolDescriptor};

use super::channel::{Connector, ToolChannel, ToolOutput};
use super::error::{McpError, McpResult};

/// How a fake provider answers one tool
#[derive(Debug, Clone)]
pub enum MockToolReply {
    /// Successful result content
    Content(String),
    /// Result flagged as an error by the provider
    Error(String),
    /// Transport failure while the call is in flight
    Broken(String),
    /// Never answers
    Hang,
}

/// Behaviour of one fake provider
#[derive(Debug, Clone, Default)]
pub struct MockToolProvider {
    tools: Vec<ToolDescriptor>,
    replies: HashMap<String, MockToolReply>,
    launch_error: Option<String>,
    handshake_error: Option<String>,
    list_error: Option<String>,
    connect_delay: Duration,
}

impl MockToolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a tool
    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    /// Advertise a tool that answers with fixed content
    pub fn with_tool_reply(mut self, name: &str, content: impl Into<String>) -> Self {
        self.tools.push(ToolDescriptor::new(name, format!("Mock tool {name}")));
        self.replies
            .insert(name.to_string(), MockToolReply::Content(content.into()));
        self
    }

    /// Set how a tool answers (the tool does not have to be advertised)
    pub fn with_reply(mut self, name: &str, reply: MockToolReply) -> Self {
        self.replies.insert(name.to_string(), reply);
        self
    }

    /// Fail as if the process could not be started
    pub fn failing_launch(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    /// Fail during the protocol handshake
    pub fn failing_handshake(mut self, message: impl Into<String>) -> Self {
        self.handshake_error = Some(message.into());
        self
    }

    /// Fail the tool-list request
    pub fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    /// Delay before the connection is established
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

/// A tool call observed by a fake provider
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub provider: String,
    pub tool: String,
    pub arguments: Value,
}

/// Connector backed by [`MockToolProvider`]s, keyed by provider name
///
/// Configs whose name has no registered fake fail to launch, like a
/// missing executable would.
#[derive(Default)]
pub struct MockConnector {
    providers: Mutex<HashMap<String, MockToolProvider>>,
    live: Arc<Mutex<HashMap<String, usize>>>,
    connects: Mutex<HashMap<String, usize>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fake provider under `name`
    pub fn with_provider(self, name: &str, provider: MockToolProvider) -> Self {
        self.set_provider(name, provider);
        self
    }

    /// Replace the behaviour of a provider for subsequent connects
    pub fn set_provider(&self, name: &str, provider: MockToolProvider) {
        self.providers.lock().insert(name.to_string(), provider);
    }

    /// Number of open channels to `name`
    pub fn live_channels(&self, name: &str) -> usize {
        self.live.lock().get(name).copied().unwrap_or(0)
    }

    /// Number of connect attempts made for `name`
    pub fn connect_attempts(&self, name: &str) -> usize {
        self.connects.lock().get(name).copied().unwrap_or(0)
    }

    /// Every tool call received so far, in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &ProviderConfig) -> McpResult<Box<dyn ToolChannel>> {
        *self.connects.lock().entry(config.name.clone()).or_insert(0) += 1;

        let provider = self.providers.lock().get(&config.name).cloned();
        let Some(provider) = provider else {
            return Err(McpError::Spawn(format!(
                "{}: No such file or directory",
                config.command
            )));
        };

        if !provider.connect_delay.is_zero() {
            tokio::time::sleep(provider.connect_delay).await;
        }
        if let Some(message) = provider.launch_error {
            return Err(McpError::Spawn(message));
        }
        if let Some(message) = provider.handshake_error {
            return Err(McpError::InitializationFailed(message));
        }

        *self.live.lock().entry(config.name.clone()).or_insert(0) += 1;

        Ok(Box::new(MockChannel {
            provider_name: config.name.clone(),
            tools: provider.tools,
            replies: provider.replies,
            list_error: provider.list_error,
            live: Arc::clone(&self.live),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct MockChannel {
    provider_name: String,
    tools: Vec<ToolDescriptor>,
    replies: HashMap<String, MockToolReply>,
    list_error: Option<String>,
    live: Arc<Mutex<HashMap<String, usize>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[async_trait]
impl ToolChannel for MockChannel {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        match &self.list_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.calls.lock().push(RecordedCall {
            provider: self.provider_name.clone(),
            tool: name.to_string(),
            arguments: arguments.clone(),
        });

        match self.replies.get(name) {
            Some(MockToolReply::Content(content)) => Ok(ToolOutput::success(content.clone())),
            Some(MockToolReply::Error(message)) => Ok(ToolOutput::error(message.clone())),
            Some(MockToolReply::Broken(message)) => Err(McpError::ToolCallFailed(message.clone())),
            Some(MockToolReply::Hang) => {
                std::future::pending::<()>().await;
                Err(McpError::ToolCallFailed("unreachable".to_string()))
            }
            None if self.tools.iter().any(|t| t.name == name) => {
                Ok(ToolOutput::success(format!("{name} called with {arguments}")))
            }
            None => Ok(ToolOutput::error(format!("Unknown tool: {name}"))),
        }
    }

    async fn close(self: Box<Self>) -> McpResult<()> {
        Ok(())
    }
}

impl Drop for MockChannel {
    fn drop(&mut self) {
        let mut live = self.live.lock();
        if let Some(count) = live.get_mut(&self.provider_name) {
            *count = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unregistered_provider_fails_to_launch() {
        let connector = MockConnector::new();
        let result = connector.connect(&ProviderConfig::new("missing", "python")).await;

        assert!(matches!(result, Err(McpError::Spawn(_))));
        assert_eq!(connector.connect_attempts("missing"), 1);
        assert_eq!(connector.live_channels("missing"), 0);
    }

    #[tokio::test]
    async fn test_channel_replies_and_records_calls() {
        let connector = MockConnector::new().with_provider(
            "clock",
            MockToolProvider::new()
                .with_tool_reply("get_time", "2024-01-01T00:00:00")
                .with_tool(ToolDescriptor::new("echo", "Echo back")),
        );

        let channel = connector
            .connect(&ProviderConfig::new("clock", "python"))
            .await
            .unwrap();
        assert_eq!(connector.live_channels("clock"), 1);

        let tools = channel.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);

        let time = channel.call_tool("get_time", json!({})).await.unwrap();
        assert_eq!(time, ToolOutput::success("2024-01-01T00:00:00"));

        let echo = channel.call_tool("echo", json!({ "message": "hi" })).await.unwrap();
        assert!(!echo.is_error);
        assert!(echo.content.contains("hi"));

        let unknown = channel.call_tool("nope", json!({})).await.unwrap();
        assert!(unknown.is_error);

        assert_eq!(connector.calls().len(), 3);

        channel.close().await.unwrap();
        assert_eq!(connector.live_channels("clock"), 0);
    }
}

//! Provider sessions
//!
//! A `ProviderSession` owns the one connection to one tool provider process.
//! It is the only component that launches or tears down provider processes,
//! and the only reader/writer of its channel.

mod error;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::logging::Logger;
use crate::mcp::{Connector, ToolChannel};
use crate::types::{ProviderConfig, SessionState, TimeoutSettings, ToolDescriptor, ToolInvocationResult};

pub use error::{ConnectionError, ConnectionResult, InvocationError, InvocationResult};

/// Connection to a single tool provider
///
/// Channel use is serialized: `connect`, `invoke` and `close` take the
/// channel lock for their whole duration, so at most one request is in
/// flight per provider and at most one channel is ever live.
pub struct ProviderSession {
    name: String,
    connector: Arc<dyn Connector>,
    logger: Arc<dyn Logger>,
    connect_timeout: Duration,
    tool_timeout: Duration,
    state: RwLock<SessionState>,
    tools: RwLock<Vec<ToolDescriptor>>,
    config: RwLock<Option<ProviderConfig>>,
    channel: Mutex<Option<Box<dyn ToolChannel>>>,
}

impl ProviderSession {
    /// Create a disconnected session
    pub fn new(name: impl Into<String>, connector: Arc<dyn Connector>, logger: Arc<dyn Logger>) -> Self {
        let timeouts = TimeoutSettings::default();
        Self {
            name: name.into(),
            connector,
            logger,
            connect_timeout: timeouts.connect(),
            tool_timeout: timeouts.tool(),
            state: RwLock::new(SessionState::Disconnected),
            tools: RwLock::new(Vec::new()),
            config: RwLock::new(None),
            channel: Mutex::new(None),
        }
    }

    /// Set the connect and tool-call deadlines
    pub fn with_timeouts(mut self, timeouts: &TimeoutSettings) -> Self {
        self.connect_timeout = timeouts.connect();
        self.tool_timeout = timeouts.tool();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Tools discovered by the last successful connect, in provider order
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        self.tools.read().clone()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().iter().any(|t| t.name == name)
    }

    /// Launch spec used by the last connect attempt
    pub fn config(&self) -> Option<ProviderConfig> {
        self.config.read().clone()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    /// Launch the provider, complete the handshake and discover its tools
    ///
    /// Any previous channel is closed first. The session keeps its own name;
    /// `config` supplies the launch spec. Returns a one-line summary.
    pub async fn connect(&self, config: &ProviderConfig) -> ConnectionResult<String> {
        let mut channel = self.channel.lock().await;
        if let Some(previous) = channel.take() {
            self.shutdown(previous).await;
        }

        self.set_state(SessionState::Connecting);
        self.tools.write().clear();
        *self.config.write() = Some(config.clone());

        let opened = match tokio::time::timeout(self.connect_timeout, self.open(config)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(self.connect_timeout)),
        };

        match opened {
            Ok((live, tools)) => {
                let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
                let summary = if names.is_empty() {
                    format!("{} connected; tools: (none)", self.name)
                } else {
                    format!("{} connected; tools: {}", self.name, names.join(", "))
                };

                *self.tools.write() = tools;
                *channel = Some(live);
                self.set_state(SessionState::Connected);

                self.logger.info(&format!("[ProviderSession] {}", summary));
                Ok(summary)
            }
            Err(e) => {
                self.set_state(SessionState::Failed);
                self.logger.error(&format!(
                    "[ProviderSession] {} failed to connect: {}",
                    self.name, e
                ));
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        config: &ProviderConfig,
    ) -> ConnectionResult<(Box<dyn ToolChannel>, Vec<ToolDescriptor>)> {
        let live = self
            .connector
            .connect(config)
            .await
            .map_err(ConnectionError::from_connect)?;

        let tools = match live.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                self.shutdown(live).await;
                return Err(ConnectionError::ToolDiscovery(e.to_string()));
            }
        };

        let mut seen = HashSet::new();
        if let Some(duplicate) = tools.iter().find(|t| !seen.insert(t.name.as_str())) {
            let tool = duplicate.name.clone();
            self.shutdown(live).await;
            return Err(ConnectionError::DuplicateTool { tool });
        }

        Ok((live, tools))
    }

    /// Execute `tool_name` on this provider
    ///
    /// Single attempt; the caller decides whether to retry.
    pub async fn invoke(&self, tool_name: &str, args: Value) -> InvocationResult<ToolInvocationResult> {
        let channel = self.channel.lock().await;
        let live = match channel.as_ref() {
            Some(live) if self.is_connected() => live,
            _ => {
                return Err(InvocationError::NotConnected {
                    provider: self.name.clone(),
                })
            }
        };

        self.logger.debug(&format!(
            "[ProviderSession] {} invoking {} with {}",
            self.name, tool_name, args
        ));

        let output = tokio::time::timeout(self.tool_timeout, live.call_tool(tool_name, args))
            .await
            .map_err(|_| InvocationError::Timeout {
                tool: tool_name.to_string(),
                after: self.tool_timeout,
            })?
            .map_err(|e| InvocationError::Channel {
                tool: tool_name.to_string(),
                message: e.to_string(),
            })?;

        if output.is_error {
            self.logger.warn(&format!(
                "[ProviderSession] {} tool {} returned an error: {}",
                self.name, tool_name, output.content
            ));
            return Err(InvocationError::ToolFailed {
                tool: tool_name.to_string(),
                message: output.content,
            });
        }

        Ok(ToolInvocationResult::new(tool_name, output.content))
    }

    /// Release the channel; safe to call repeatedly
    pub async fn close(&self) {
        let mut channel = self.channel.lock().await;
        if let Some(live) = channel.take() {
            self.shutdown(live).await;
        }
        self.tools.write().clear();
        self.set_state(SessionState::Disconnected);
    }

    async fn shutdown(&self, live: Box<dyn ToolChannel>) {
        if let Err(e) = live.close().await {
            self.logger.warn(&format!(
                "[ProviderSession] {} did not close cleanly: {}",
                self.name, e
            ));
        }
    }
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("tools", &self.tools.read().len())
            .finish()
    }
}

//! MCP Client using the official rmcp SDK
//!
//! Spawns a tool provider as a child process and speaks MCP over its stdio.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    transport::TokioChildProcess,
    RoleClient,
};
use serde_json::Value;
use tokio::process::Command;

use crate::logging::Logger;
use crate::types::{ProviderConfig, ToolDescriptor};

use super::channel::{ToolChannel, ToolOutput};
use super::error::{McpError, McpResult};

/// MCP client for one tool provider process
pub struct McpClient {
    /// Provider name, for log lines
    name: String,
    /// The underlying rmcp running service (owns the child process)
    client: RunningService<RoleClient, ClientInfo>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Launch the provider described by `config` and complete the handshake
    pub async fn spawn(config: &ProviderConfig, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Launching {}: {}",
            config.name,
            config.command_line()
        ));

        let mut command = Command::new(&config.command);
        command.args(&config.args).envs(&config.env);

        let transport = TokioChildProcess::new(command)
            .map_err(|e| McpError::Spawn(format!("{}: {}", config.command, e)))?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        let client = Self {
            name: config.name.clone(),
            client,
            logger,
        };
        match client.server_info() {
            Some(server) => client.logger.info(&format!(
                "[McpClient] {} initialized (server {} {})",
                client.name, server.name, server.version
            )),
            None => client
                .logger
                .info(&format!("[McpClient] {} initialized", client.name)),
        }

        Ok(client)
    }

    /// Name and version the provider reported during the handshake
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "mcphost".to_string(),
            title: Some("mcphost".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
            input_schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

/// Flatten the text parts of an MCP tool result
fn result_text(result: &CallToolResult) -> String {
    // Content is Annotated<RawContent>; non-text parts are not forwarded
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ToolChannel for McpClient {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] {} listed {} tools",
            self.name,
            result.tools.len()
        ));

        Ok(result.tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolOutput> {
        self.logger.info(&format!("[McpClient] {} calling tool: {}", self.name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = self
            .client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        Ok(ToolOutput {
            content: result_text(&result),
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(self: Box<Self>) -> McpResult<()> {
        self.logger.info(&format!("[McpClient] Closing connection to {}", self.name));
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[tokio::test]
    async fn test_spawn_nonexistent_command_fails() {
        let config = ProviderConfig::new("ghost", "mcphost-definitely-not-a-real-binary");
        let result = McpClient::spawn(&config, Arc::new(NoOpLogger)).await;

        match result {
            Err(McpError::Spawn(message)) => {
                assert!(message.contains("mcphost-definitely-not-a-real-binary"));
            }
            Err(other) => panic!("expected spawn error, got {other}"),
            Ok(_) => panic!("spawning a missing binary must fail"),
        }
    }
}

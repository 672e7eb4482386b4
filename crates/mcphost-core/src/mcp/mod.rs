//! MCP (Model Context Protocol) transport module
//!
//! Uses the official rmcp SDK to launch tool providers as child processes
//! and talk to them over stdio. Framing and encoding are rmcp's concern;
//! this module only exposes "list tools" and "call tool".
//!
//! # Example
//!
//! ```rust,ignore
//! use mcphost_core::mcp::{Connector, StdioConnector};
//! use std::sync::Arc;
//!
//! let connector = StdioConnector::new(Arc::new(NoOpLogger));
//! let channel = connector
//!     .connect(&ProviderConfig::new("mcp_os_name", "python").with_args(["server/mcp_os_name.py"]))
//!     .await?;
//!
//! let tools = channel.list_tools().await?;
//! let output = channel.call_tool("get_os_info", json!({})).await?;
//! channel.close().await?;
//! ```

mod channel;
mod client;
mod error;
mod mock;

pub use channel::{Connector, StdioConnector, ToolChannel, ToolOutput};
pub use client::McpClient;
pub use error::{McpError, McpResult};
pub use mock::{MockConnector, MockToolProvider, MockToolReply, RecordedCall};

//! mcphost core
//!
//! Lets a conversational model call tools exposed by independent,
//! out-of-process MCP tool providers.
//!
//! - [`ProviderSession`]: one connection to one provider process
//! - [`ToolRegistry`]: merged tool name -> (descriptor, owning session) index
//! - [`ProviderPool`]: concurrent startup, status report, tool dispatch
//! - [`ConversationEngine`]: model call, optional tool call, final answer
//!
//! ```rust,ignore
//! use mcphost_core::{ConversationEngine, ProviderPool, StdioConnector, create_model_backend};
//!
//! let pool = Arc::new(ProviderPool::new(Arc::new(StdioConnector::new(logger.clone())), logger.clone()));
//! println!("{}", pool.start_all(&config.providers).await);
//!
//! let model = create_model_backend(&config.model, logger.clone());
//! let engine = ConversationEngine::new(pool, model, logger);
//! let turns = engine.handle_message("What time is it?", &history).await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod mcp;
pub mod session;
pub mod tools;
pub mod pool;
pub mod models;
pub mod conversation;

// Re-export commonly used types
pub use types::{
    CancellationToken, ChatMessage, ConversationTurn, MessageRole, ModelSettings,
    ProviderConfig, SessionState, TimeoutSettings, ToolCall, ToolConvention, ToolDescriptor,
    ToolInvocationResult, TurnMetadata,
};

pub use logging::{ConsoleLogger, Logger, MemoryLogger, NoOpLogger};

pub use config::{ConfigProvider, FileConfigProvider, HostConfig, MemoryConfigProvider};

pub use mcp::{Connector, McpClient, McpError, MockConnector, StdioConnector, ToolChannel};

pub use session::{ConnectionError, InvocationError, ProviderSession};

pub use tools::{ToolRegistry, ToolShadowing};

pub use pool::{DispatchError, ProviderOutcome, ProviderPool, StartupReport};

pub use models::{create_model_backend, ModelBackend, ModelError, ModelResponse, MockModel};

pub use conversation::{ConversationEngine, EngineConfig, EngineError};

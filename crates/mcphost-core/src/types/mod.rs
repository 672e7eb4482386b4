//! Core types shared across the host
//!
//! This module contains the data model exchanged between the caller,
//! the model backends and the tool providers.

mod message;
mod model;
mod provider;
mod tool;
mod cancellation;

pub use message::{ChatMessage, ConversationTurn, MessageRole, TurnMetadata};
pub use model::{ModelSettings, TimeoutSettings, ToolConvention};
pub use provider::{ConfigSource, ProviderConfig, SessionState};
pub use tool::{ToolCall, ToolDescriptor, ToolInvocationResult};
pub use cancellation::CancellationToken;

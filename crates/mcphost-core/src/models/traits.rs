//! Model backend trait definition

use async_trait::async_trait;

use crate::types::{CancellationToken, ChatMessage, ToolCall, ToolDescriptor};

use super::error::ModelResult;

/// What a backend answered
///
/// Backends signal tool use differently (structured tool-call objects or a
/// textual marker); each adapter turns its own signal into `ToolRequest`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Text(String),
    ToolRequest(ToolCall),
}

/// Options for a single completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools the model may request; `None` means tool use is not offered
    pub tools: Option<Vec<ToolDescriptor>>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Tools offered to the model, treating an empty list as none
    pub fn offered_tools(&self) -> Option<&[ToolDescriptor]> {
        self.tools.as_deref().filter(|tools| !tools.is_empty())
    }
}

/// A language-model backend
///
/// Implementations return one complete response per call.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend identifier (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Run one completion over `messages`
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ModelResult<ModelResponse>;
}

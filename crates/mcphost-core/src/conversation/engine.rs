//! ConversationEngine - drives one user message through model and tools

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::logging::Logger;
use crate::models::{CompletionOptions, ModelBackend, ModelError, ModelResponse};
use crate::pool::{DispatchError, ProviderPool};
use crate::types::{
    CancellationToken, ChatMessage, ConversationTurn, ModelSettings, TimeoutSettings,
    ToolDescriptor,
};

use super::error::{EngineError, EngineResult};

const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an assistant that can use tools provided by connected tool servers.";

/// Where the engine is within one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    AwaitingModelResponse,
    AwaitingToolResult,
    AwaitingFinalModelResponse,
    Complete,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::AwaitingModelResponse => "awaiting model response",
            EngineState::AwaitingToolResult => "awaiting tool result",
            EngineState::AwaitingFinalModelResponse => "awaiting final model response",
            EngineState::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Replaces the default opening line of the system prompt
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Deadline for each model call
    pub model_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_tokens: Some(1024),
            temperature: None,
            model_timeout: TimeoutSettings::default().model(),
        }
    }
}

impl EngineConfig {
    pub fn from_settings(
        model: &ModelSettings,
        timeouts: &TimeoutSettings,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            system_prompt,
            max_tokens: Some(model.max_tokens),
            temperature: model.temperature,
            model_timeout: timeouts.model(),
        }
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }
}

/// The model-facing loop
///
/// Holds no conversation state of its own: history is passed in by the
/// caller and only new turns are returned.
pub struct ConversationEngine {
    pool: Arc<ProviderPool>,
    model: Arc<dyn ModelBackend>,
    config: EngineConfig,
    logger: Arc<dyn Logger>,
}

impl ConversationEngine {
    pub fn new(pool: Arc<ProviderPool>, model: Arc<dyn ModelBackend>, logger: Arc<dyn Logger>) -> Self {
        Self {
            pool,
            model,
            config: EngineConfig::default(),
            logger,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pool(&self) -> &Arc<ProviderPool> {
        &self.pool
    }

    /// Answer `message` given the prior `history`
    ///
    /// Returns the turns to append after the user's own message.
    pub async fn handle_message(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> EngineResult<Vec<ConversationTurn>> {
        self.handle_message_with_cancel(message, history, CancellationToken::new())
            .await
    }

    /// [`handle_message`](Self::handle_message) with a cancellation token
    pub async fn handle_message_with_cancel(
        &self,
        message: &str,
        history: &[ConversationTurn],
        cancel_token: CancellationToken,
    ) -> EngineResult<Vec<ConversationTurn>> {
        let descriptors = self.pool.descriptors();
        let mut messages = self.build_messages(message, history, &descriptors);

        self.enter(EngineState::AwaitingModelResponse);
        let tools = (!descriptors.is_empty()).then_some(descriptors);
        let call = match self.call_model(messages.clone(), tools, &cancel_token).await? {
            ModelResponse::Text(text) => {
                self.enter(EngineState::Complete);
                return Ok(vec![ConversationTurn::assistant(text)]);
            }
            ModelResponse::ToolRequest(call) => call,
        };

        self.enter(EngineState::AwaitingToolResult);
        self.logger.info(&format!(
            "[ConversationEngine] Model requested tool {} with {}",
            call.name, call.input
        ));

        let dispatched = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(EngineError::Cancelled),
            result = self.pool.invoke(&call.name, call.input.clone()) => result,
        };

        let result = match dispatched {
            Ok(result) => result,
            Err(DispatchError::UnknownTool(name)) => {
                self.enter(EngineState::Complete);
                return Ok(vec![ConversationTurn::assistant(format!(
                    "Tool `{}` does not exist.",
                    name
                ))]);
            }
            Err(DispatchError::Invocation(e)) => {
                self.logger.warn(&format!(
                    "[ConversationEngine] Tool {} failed: {}",
                    call.name, e
                ));
                self.enter(EngineState::Complete);
                return Ok(vec![ConversationTurn::assistant(format!(
                    "Tool `{}` failed: {}",
                    call.name, e
                ))]);
            }
        };

        let mut turns = vec![ConversationTurn::tool_output(
            &result.tool_name,
            &result.raw_output,
        )];
        messages.push(ChatMessage::user(format!(
            "Tool result for {}:\n{}",
            result.tool_name, result.raw_output
        )));

        self.enter(EngineState::AwaitingFinalModelResponse);
        let answer = match self.call_model(messages, None, &cancel_token).await? {
            ModelResponse::Text(text) => text,
            ModelResponse::ToolRequest(chained) => {
                self.logger.warn(&format!(
                    "[ConversationEngine] Ignoring chained tool request for {}",
                    chained.name
                ));
                format!(
                    "The model asked to run `{}` next, but only one tool call per message is supported.",
                    chained.name
                )
            }
        };
        turns.push(ConversationTurn::assistant(answer));

        self.enter(EngineState::Complete);
        Ok(turns)
    }

    fn enter(&self, state: EngineState) {
        self.logger
            .debug(&format!("[ConversationEngine] State: {}", state));
    }

    fn build_messages(
        &self,
        message: &str,
        history: &[ConversationTurn],
        descriptors: &[ToolDescriptor],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt(descriptors)));
        messages.extend(history.iter().filter_map(ConversationTurn::to_chat_message));
        messages.push(ChatMessage::user(message));
        messages
    }

    fn system_prompt(&self, descriptors: &[ToolDescriptor]) -> String {
        let mut prompt = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        if descriptors.is_empty() {
            prompt.push_str("\nNo tools are currently available.");
            return prompt;
        }

        prompt.push_str("\nAvailable tools:");
        for (i, tool) in descriptors.iter().enumerate() {
            prompt.push_str(&format!("\n{}. {}: {}", i + 1, tool.name, tool.description));
        }
        prompt.push_str("\nUse a tool when it helps answer the question.");
        prompt
    }

    async fn call_model(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDescriptor>>,
        cancel_token: &CancellationToken,
    ) -> EngineResult<ModelResponse> {
        let options = CompletionOptions {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            tools,
        };

        let deadline = self.config.model_timeout;
        let completion = tokio::time::timeout(
            deadline,
            self.model.complete(messages, options, cancel_token.clone()),
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(EngineError::Cancelled),
            outcome = completion => outcome,
        };

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(ModelError::Cancelled)) => Err(EngineError::Cancelled),
            Ok(Err(e)) => {
                self.logger
                    .error(&format!("[ConversationEngine] Model call failed: {}", e));
                Err(EngineError::Model(e))
            }
            Err(_) => {
                self.logger.error(&format!(
                    "[ConversationEngine] Model call timed out after {:?}",
                    deadline
                ));
                Err(EngineError::Model(ModelError::Timeout(deadline)))
            }
        }
    }
}

//! Mock model backend for testing
//!
//! Plays back scripted replies and records every request, without network
//! dependencies. When the script runs out it echoes the last user message.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::logging::{Logger, NoOpLogger};
use crate::types::{CancellationToken, ChatMessage, MessageRole, ToolCall, ToolDescriptor};

use super::error::{ModelError, ModelResult};
use super::traits::{CompletionOptions, ModelBackend, ModelResponse};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain assistant text
    Text(String),
    /// Structured tool-invocation request
    ToolCall { name: String, input: Value },
    /// Backend failure
    Error(String),
    /// Never answers; only cancellation ends the call
    Hang,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn tool_call(name: impl Into<String>, input: Value) -> Self {
        Self::ToolCall {
            name: name.into(),
            input,
        }
    }
}

/// A request as the mock received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolDescriptor>>,
}

/// Scripted model backend
pub struct MockModel {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    /// Create an echo model with an empty script
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger: Arc::new(NoOpLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Queue a reply
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.push_reply(reply);
        self
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User && !m.content.is_empty())
            .map(|m| m.content.clone())
            .unwrap_or_else(|| "Hello from MockModel!".to_string())
    }
}

#[async_trait]
impl ModelBackend for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ModelResult<ModelResponse> {
        let call_number = {
            let mut requests = self.requests.lock();
            requests.push(RecordedRequest {
                messages: messages.clone(),
                tools: options.tools.clone(),
            });
            requests.len()
        };

        if cancel_token.is_cancelled() {
            return Err(ModelError::Cancelled);
        }

        let reply = self.replies.lock().pop_front();
        self.logger.debug(&format!(
            "[MockModel] request #{} -> {:?}",
            call_number, reply
        ));

        match reply {
            Some(MockReply::Text(text)) => Ok(ModelResponse::Text(text)),
            Some(MockReply::ToolCall { name, input }) => Ok(ModelResponse::ToolRequest(
                ToolCall::new(format!("mock_call_{call_number}"), name, input),
            )),
            Some(MockReply::Error(message)) => Err(ModelError::api("mock", message)),
            Some(MockReply::Hang) => {
                cancel_token.cancelled().await;
                Err(ModelError::Cancelled)
            }
            None => Ok(ModelResponse::Text(format!(
                "Echo: {}",
                Self::last_user_message(&messages)
            ))),
        }
    }
}

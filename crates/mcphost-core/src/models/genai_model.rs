//! GenaiModel - structured tool calling through the genai crate
//!
//! Handles every genai-supported backend (OpenAI, Anthropic, Gemini, Ollama,
//! ...) plus OpenAI-compatible endpoints. The response stream is collected
//! into one [`ModelResponse`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatRequest, ChatStreamEvent};
use genai::Client;

use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ModelSettings};

use super::error::{ModelError, ModelResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{CompletionOptions, ModelBackend, ModelResponse};

/// Model backend using genai for all supported LLM APIs
pub struct GenaiModel {
    settings: ModelSettings,
    client: Client,
    logger: Arc<dyn Logger>,
}

impl GenaiModel {
    pub fn new(settings: ModelSettings, logger: Arc<dyn Logger>) -> Self {
        let client = create_client(&settings);
        Self {
            settings,
            client,
            logger,
        }
    }

    /// Strip a leading backend prefix ("openai/gpt-4" -> "gpt-4")
    pub fn extract_model_name<'a>(backend: &str, model: &'a str) -> &'a str {
        model
            .strip_prefix(backend)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(model)
    }

    fn api_error(&self, error: impl std::fmt::Display) -> ModelError {
        ModelError::api(&self.settings.backend, error.to_string())
    }
}

#[async_trait]
impl ModelBackend for GenaiModel {
    fn name(&self) -> &str {
        &self.settings.backend
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ModelResult<ModelResponse> {
        let model_name = Self::extract_model_name(&self.settings.backend, &self.settings.model);
        self.logger.info(&format!(
            "[GenaiModel] complete: backend={}, model={}, messages={}",
            self.settings.backend,
            model_name,
            messages.len()
        ));

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));
        if let Some(tools) = options.offered_tools() {
            chat_req = chat_req.with_tools(to_genai_tools(tools));
        }
        let genai_options = to_genai_options(&options);

        let chat_stream = self
            .client
            .exec_chat_stream(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| self.api_error(e))?;

        let mut stream = Box::pin(chat_stream.stream);
        let mut text = String::new();
        let mut tool_call = None;

        loop {
            let next = tokio::select! {
                _ = cancel_token.cancelled() => {
                    self.logger.info("[GenaiModel] Stream cancelled");
                    return Err(ModelError::Cancelled);
                }
                next = stream.next() => next,
            };

            let Some(event) = next else { break };
            match event.map_err(|e| self.api_error(e))? {
                ChatStreamEvent::Chunk(chunk) => text.push_str(&chunk.content),
                ChatStreamEvent::End(end) => {
                    // Only the first tool call is honored
                    if let Some(first) = end.captured_tool_calls().and_then(|calls| calls.first().copied()) {
                        tool_call = Some(from_genai_tool_call(first));
                    }
                }
                _ => {}
            }
        }

        if let Some(call) = tool_call {
            self.logger
                .info(&format!("[GenaiModel] Tool call requested: {}", call.name));
            return Ok(ModelResponse::ToolRequest(call));
        }

        if text.trim().is_empty() {
            return Err(ModelError::invalid_response(
                &self.settings.backend,
                "empty response",
            ));
        }

        self.logger
            .debug(&format!("[GenaiModel] Received {} chars", text.len()));
        Ok(ModelResponse::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_extract_model_name() {
        assert_eq!(GenaiModel::extract_model_name("openai", "openai/gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(
            GenaiModel::extract_model_name("openrouter", "meta-llama/llama-3-8b-instruct"),
            "meta-llama/llama-3-8b-instruct"
        );
        assert_eq!(GenaiModel::extract_model_name("openai", "gpt-4o"), "gpt-4o");
    }

    #[test]
    fn test_name_is_backend() {
        let model = GenaiModel::new(ModelSettings::new("anthropic", "claude-3-5-haiku-latest"), Arc::new(NoOpLogger));
        assert_eq!(model.name(), "anthropic");
    }
}

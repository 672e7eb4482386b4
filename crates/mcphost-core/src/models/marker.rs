//! Textual tool-call convention
//!
//! For backends without structured tool calling. The model is told to reply
//! with `/tool_name`, optionally followed by a JSON object of arguments:
//!
//! ```text
//! /get_disk_usage {"path": "/home"}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, MessageRole, ToolCall, ToolDescriptor};

use super::error::{ModelError, ModelResult};
use super::traits::{CompletionOptions, ModelBackend, ModelResponse};

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(\w+)").expect("marker pattern is valid"));

/// Parse a leading `/tool_name [json]` marker
///
/// Returns `Ok(None)` for ordinary text. A JSON object that does not parse
/// is an error; anything after a complete object is ignored.
pub fn parse_marker(text: &str) -> Result<Option<ToolCall>, String> {
    let trimmed = text.trim();
    let Some(captures) = MARKER.captures(trimmed) else {
        return Ok(None);
    };
    let name = &captures[1];
    let rest = trimmed[captures[0].len()..].trim_start();

    let input = if rest.starts_with('{') {
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) => value,
            Some(Err(e)) => return Err(format!("malformed arguments for /{}: {}", name, e)),
            None => json!({}),
        }
    } else {
        json!({})
    };

    Ok(Some(ToolCall::new(format!("marker_{name}"), name, input)))
}

fn instructions(tools: &[ToolDescriptor]) -> String {
    let mut text = String::from(
        "To use a tool, reply with only a slash followed by the tool name, \
         optionally followed by a JSON object of arguments, for example \
         `/get_time` or `/get_disk_usage {\"path\": \"/\"}`. \
         Otherwise answer normally.\n\nTools:",
    );
    for tool in tools {
        text.push_str(&format!("\n/{} - {}", tool.name, tool.description));
    }
    text
}

/// Wraps a plain-text backend and turns `/tool_name` replies into tool requests
pub struct MarkerAdapter {
    inner: Arc<dyn ModelBackend>,
    logger: Arc<dyn Logger>,
}

impl MarkerAdapter {
    pub fn new(inner: Arc<dyn ModelBackend>, logger: Arc<dyn Logger>) -> Self {
        Self { inner, logger }
    }
}

#[async_trait]
impl ModelBackend for MarkerAdapter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        mut messages: Vec<ChatMessage>,
        mut options: CompletionOptions,
        cancel_token: CancellationToken,
    ) -> ModelResult<ModelResponse> {
        // The wrapped backend never sees structured tool descriptors
        let tools = options.tools.take().filter(|tools| !tools.is_empty());

        if let Some(tools) = &tools {
            let guide = instructions(tools);
            match messages.iter_mut().find(|m| m.role == MessageRole::System) {
                Some(system) => {
                    system.content.push_str("\n\n");
                    system.content.push_str(&guide);
                }
                None => messages.insert(0, ChatMessage::system(guide)),
            }
        }

        let response = self.inner.complete(messages, options, cancel_token).await?;

        let text = match response {
            ModelResponse::Text(text) if tools.is_some() => text,
            other => return Ok(other),
        };

        match parse_marker(&text) {
            Ok(Some(call)) => {
                self.logger
                    .info(&format!("[MarkerAdapter] Tool marker found: /{}", call.name));
                Ok(ModelResponse::ToolRequest(call))
            }
            Ok(None) => Ok(ModelResponse::Text(text)),
            Err(message) => Err(ModelError::invalid_response(self.inner.name(), message)),
        }
    }
}

//! Language-model backends
//!
//! ## Architecture
//!
//! Every backend implements [`ModelBackend`] and answers with one
//! [`ModelResponse`]: plain text or a tool request.
//!
//! - `GenaiModel` covers the backends the `genai` crate speaks (OpenAI,
//!   Anthropic, Gemini, Ollama, ...) using structured tool calls. OpenRouter,
//!   Mistral and other OpenAI-compatible endpoints go through genai's
//!   `ServiceTargetResolver`.
//! - `MarkerAdapter` wraps any backend and implements the `/tool_name`
//!   textual convention for models without function calling.
//! - `MockModel` is kept for testing and demos.

mod error;
mod genai_adapter;
mod genai_model;
mod marker;
mod mock;
mod traits;

pub use error::{ModelError, ModelResult};
pub use genai_adapter::{backend_env_key, is_genai_native, is_genai_supported};
pub use genai_model::GenaiModel;
pub use marker::{parse_marker, MarkerAdapter};
pub use mock::{MockModel, MockReply, RecordedRequest};
pub use traits::{CompletionOptions, ModelBackend, ModelResponse};

use std::sync::Arc;

use crate::logging::Logger;
use crate::types::{ModelSettings, ToolConvention};

/// Create the backend described by `settings`
///
/// `mock` gives a [`MockModel`]; anything else goes through genai, with
/// unknown identifiers treated as OpenAI-compatible endpoints.
pub fn create_model_backend(settings: &ModelSettings, logger: Arc<dyn Logger>) -> Arc<dyn ModelBackend> {
    let backend: Arc<dyn ModelBackend> = match settings.backend.to_lowercase().as_str() {
        "mock" => Arc::new(MockModel::new().with_logger(Arc::clone(&logger))),
        id => {
            if !is_genai_supported(id) {
                logger.warn(&format!(
                    "[models] Unknown backend `{}`, treating it as OpenAI-compatible",
                    id
                ));
            }
            Arc::new(GenaiModel::new(settings.clone(), Arc::clone(&logger)))
        }
    };

    match settings.convention {
        ToolConvention::Structured => backend,
        ToolConvention::Marker => Arc::new(MarkerAdapter::new(backend, logger)),
    }
}

/// List all supported backend identifiers
pub fn supported_backends() -> Vec<&'static str> {
    vec![
        // Native genai backends
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        "nebius",
        "zai",
        // OpenAI-compatible backends via resolver
        "azure",
        "openrouter",
        "mistral",
        "redhat",
        // Testing
        "mock",
    ]
}

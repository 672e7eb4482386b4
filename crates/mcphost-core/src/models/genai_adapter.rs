//! Adapter between mcphost types and genai types
//!
//! Conversion functions plus client construction. API keys come from the
//! host settings first, then from the backend's environment variable, and
//! finally from genai's own default lookup.

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole,
    Tool as GenaiTool, ToolCall as GenaiToolCall,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::types::{ChatMessage, MessageRole, ModelSettings, ToolCall, ToolDescriptor};

use super::traits::CompletionOptions;

// ============================================================================
// Message Conversion: mcphost -> genai
// ============================================================================

/// Convert a MessageRole to genai ChatRole
///
/// Tool-role messages are filtered out before a backend is called; if one
/// slips through it is sent as user context.
pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User | MessageRole::Tool => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
    }
}

pub fn to_genai_message(msg: ChatMessage) -> GenaiMessage {
    match to_genai_role(msg.role) {
        GenaiRole::System => GenaiMessage::system(msg.content),
        GenaiRole::Assistant => GenaiMessage::assistant(msg.content),
        _ => GenaiMessage::user(msg.content),
    }
}

pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool Conversion
// ============================================================================

pub fn to_genai_tool(tool: &ToolDescriptor) -> GenaiTool {
    GenaiTool::new(&tool.name)
        .with_description(&tool.description)
        .with_schema(tool.input_schema.clone())
}

pub fn to_genai_tools(tools: &[ToolDescriptor]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

/// Convert a captured genai ToolCall into our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

// ============================================================================
// Options Conversion
// ============================================================================

pub fn to_genai_options(options: &CompletionOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Tool calls arrive with the End event
    genai_opts.with_capture_tool_calls(true)
}

// ============================================================================
// Backend to environment key mapping
// ============================================================================

/// Environment variable holding the API key for `backend`
pub fn backend_env_key(backend: &str) -> String {
    match backend.to_lowercase().as_str() {
        "gemini" | "google" => "GEMINI_API_KEY".to_string(),
        "azure" => "AZURE_OPENAI_API_KEY".to_string(),
        "redhat" | "rhel" | "rhai" => "REDHAT_API_KEY".to_string(),
        other => format!("{}_API_KEY", other.to_uppercase().replace('-', "_")),
    }
}

fn default_endpoint(backend: &str) -> Option<&'static str> {
    match backend {
        "openrouter" => Some("https://openrouter.ai/api/v1/"),
        "mistral" => Some("https://api.mistral.ai/v1/"),
        _ => None,
    }
}

// ============================================================================
// Client Creation
// ============================================================================

/// Create a genai Client for the configured backend
pub fn create_client(settings: &ModelSettings) -> Client {
    let backend = settings.backend.to_lowercase();

    let auth_backend = backend.clone();
    let explicit_key = settings.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let backend = auth_backend.clone();
            let explicit_key = explicit_key.clone();

            Box::pin(async move {
                if let Some(key) = explicit_key {
                    return Ok(Some(AuthData::from_single(key)));
                }

                match std::env::var(backend_env_key(&backend)) {
                    Ok(key) if !key.is_empty() => Ok(Some(AuthData::from_single(key))),
                    // Fall back to genai's lookup (Ollama needs no key at all)
                    _ => Ok(None),
                }
            })
        },
    );

    let target_backend = backend;
    let target_api_base = settings.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let native = is_genai_native(&target_backend);

            let endpoint = match (&target_api_base, default_endpoint(&target_backend)) {
                (Some(base), _) => Endpoint::from_owned(base.clone()),
                (None, Some(url)) => Endpoint::from_static(url),
                // Native backends resolve normally
                (None, None) => return Ok(target),
            };

            // Non-native backends speak the OpenAI protocol
            let adapter_kind = if native {
                target.model.adapter_kind
            } else {
                AdapterKind::OpenAI
            };

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model: ModelIden::new(adapter_kind, target.model.model_name.clone()),
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Check if a backend is natively supported by genai
pub fn is_genai_native(backend: &str) -> bool {
    matches!(
        backend.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
            | "nebius"
            | "zai"
    )
}

/// Check if a backend can be handled by genai (native or via OpenAI-compat)
pub fn is_genai_supported(backend: &str) -> bool {
    is_genai_native(backend)
        || matches!(
            backend.to_lowercase().as_str(),
            "azure" | "openrouter" | "mistral" | "redhat" | "rhel" | "rhai"
        )
}

//! Model backend and timeout settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a model backend signals that it wants a tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolConvention {
    /// Structured tool-call objects (function calling)
    #[default]
    Structured,
    /// A leading `/tool_name` marker in plain text
    Marker,
}

/// Model backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Backend identifier ("openai", "anthropic", "ollama", ..., or "mock")
    pub backend: String,
    /// Model identifier as used by the backend's API
    pub model: String,
    /// API key; when unset the backend's standard environment variable is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (OpenAI-compatible endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub convention: ToolConvention,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::new("openai", "gpt-4o-mini")
    }
}

impl ModelSettings {
    /// Create settings for a backend/model pair
    pub fn new(backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            model: model.into(),
            api_key: None,
            api_base: None,
            convention: ToolConvention::Structured,
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the tool convention
    pub fn with_convention(mut self, convention: ToolConvention) -> Self {
        self.convention = convention;
        self
    }
}

/// Deadlines applied to provider startup, tool calls and model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,
    #[serde(default = "default_tool_secs")]
    pub tool_secs: u64,
    #[serde(default = "default_model_secs")]
    pub model_secs: u64,
}

fn default_connect_secs() -> u64 {
    30
}

fn default_tool_secs() -> u64 {
    60
}

fn default_model_secs() -> u64 {
    120
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            tool_secs: default_tool_secs(),
            model_secs: default_model_secs(),
        }
    }
}

impl TimeoutSettings {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }

    pub fn model(&self) -> Duration {
        Duration::from_secs(self.model_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_settings_builder() {
        let settings = ModelSettings::new("openai", "gpt-3.5-turbo")
            .with_api_key("sk-test")
            .with_convention(ToolConvention::Marker);

        assert_eq!(settings.backend, "openai");
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.convention, ToolConvention::Marker);
        assert_eq!(settings.max_tokens, 1024);
    }

    #[test]
    fn test_model_settings_yaml() {
        let yaml = "backend: anthropic\nmodel: claude-3-7-sonnet-20250219\nconvention: marker\n";
        let settings: ModelSettings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.convention, ToolConvention::Marker);
        assert_eq!(settings.max_tokens, 1024);
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_timeout_defaults() {
        let timeouts: TimeoutSettings = serde_yaml::from_str("tool_secs: 5\n").unwrap();
        assert_eq!(timeouts.tool(), Duration::from_secs(5));
        assert_eq!(timeouts.connect(), Duration::from_secs(30));
        assert_eq!(timeouts.model(), Duration::from_secs(120));
    }
}

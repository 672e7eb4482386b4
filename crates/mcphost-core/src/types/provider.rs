//! Tool provider configuration and session state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a provider configuration came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// From user-level config (~/.config/mcphost/config.yaml)
    NativeUser,
    /// From workspace-level config (.config/mcphost/config.yaml)
    NativeWorkspace,
    /// Built at runtime (tests, embedding applications)
    Runtime,
    #[default]
    Unknown,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::NativeUser => write!(f, "~/.config/mcphost/config.yaml"),
            ConfigSource::NativeWorkspace => write!(f, ".config/mcphost/config.yaml"),
            ConfigSource::Runtime => write!(f, "Runtime"),
            ConfigSource::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Launch specification for one tool provider process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, unique within a pool
    pub name: String,
    /// Program to launch
    pub command: String,
    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment overrides, merged over the host's environment
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Whether this provider is launched at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Where this config came from (not serialized to file)
    #[serde(skip)]
    pub source: ConfigSource,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Create a new provider configuration
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: vec![],
            env: BTreeMap::new(),
            enabled: true,
            source: ConfigSource::Unknown,
        }
    }

    /// Set the program arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add one environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Disable the provider
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the source of this configuration
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    /// The command line as a single display string
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Connection state of a provider session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_builder() {
        let config = ProviderConfig::new("mcp_os_name", "python")
            .with_args(["server/mcp_os_name.py"])
            .with_env("PYTHONIOENCODING", "utf-8");

        assert!(config.enabled);
        assert_eq!(config.command_line(), "python server/mcp_os_name.py");
        assert_eq!(config.env.get("PYTHONIOENCODING").map(String::as_str), Some("utf-8"));
        assert!(!config.clone().disabled().enabled);
    }

    #[test]
    fn test_provider_config_yaml_defaults() {
        let yaml = "name: disk\ncommand: python\n";
        let config: ProviderConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.enabled);
        assert!(config.args.is_empty());
        assert!(config.env.is_empty());
        assert_eq!(config.source, ConfigSource::Unknown);
    }
}

//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/mcphost/config.yaml) and workspace-level
//! (.config/mcphost/config.yaml) config.
//!
//! ```yaml
//! providers:
//!   - name: mcp_os_name
//!     command: python
//!     args: [server/mcp_os_name.py]
//!   - name: mcp_disk
//!     command: python
//!     args: [server/mcp_disk.py]
//!     env:
//!       DISK_ROOT: /
//! model:
//!   backend: openai
//!   model: gpt-4o-mini
//!   convention: marker
//! timeouts:
//!   tool_secs: 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigSource, ModelSettings, ProviderConfig, TimeoutSettings};
use super::traits::{same_name, ConfigError, ConfigProvider, ConfigResult};

/// Host configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HostConfig {
    /// Tool providers, launched in this order
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub model: ModelSettings,

    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Replaces the opening line of the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/mcphost/config.yaml)
    User,
    /// Workspace-level config (.config/mcphost/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }

    fn source(&self) -> ConfigSource {
        match self {
            ConfigLevel::User => ConfigSource::NativeUser,
            ConfigLevel::Workspace => ConfigSource::NativeWorkspace,
        }
    }
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use mcphost_core::config::FileConfigProvider;
///
/// // User-level config
/// let user_config = FileConfigProvider::user();
///
/// // Workspace-level config
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<HostConfig>>,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/mcphost/config.yaml)
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("mcphost").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/mcphost/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("mcphost")
            .join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// The workspace config if `workspace_root` has one, otherwise the user config
    pub fn discover(workspace_root: impl AsRef<Path>) -> Self {
        let workspace = Self::workspace(workspace_root);
        if workspace.exists() {
            workspace
        } else {
            Self::user()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load config from file; a missing file is an empty config
    fn load(&self) -> ConfigResult<HostConfig> {
        if !self.path.exists() {
            return Ok(HostConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HostConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, config: &HostConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Cached or freshly loaded config
    pub fn host_config(&self) -> ConfigResult<HostConfig> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }

        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<HostConfig> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    pub fn set_model(&self, model: ModelSettings) -> ConfigResult<()> {
        let mut config = self.host_config()?;
        config.model = model;
        self.save(&config)
    }

    pub fn set_timeouts(&self, timeouts: TimeoutSettings) -> ConfigResult<()> {
        let mut config = self.host_config()?;
        config.timeouts = timeouts;
        self.save(&config)
    }

    /// Create a backup of the current config file
    pub fn backup(&self) -> ConfigResult<Option<PathBuf>> {
        if !self.exists() {
            return Ok(None);
        }

        let backup_path = self.path.with_extension("yaml.backup");
        fs::copy(&self.path, &backup_path)?;
        Ok(Some(backup_path))
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get_providers(&self) -> Vec<ProviderConfig> {
        let source = self.level.source();

        self.host_config()
            .map(|c| {
                c.providers
                    .into_iter()
                    .map(|p| p.with_source(source.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn update_provider(&self, name: &str, config: ProviderConfig) -> ConfigResult<()> {
        let mut file_config = self.host_config()?;

        match file_config.providers.iter_mut().find(|p| same_name(&p.name, name)) {
            Some(existing) => *existing = config,
            None => return Err(ConfigError::ProviderNotFound(name.to_string())),
        }
        self.save(&file_config)
    }

    async fn add_provider(&self, config: ProviderConfig) -> ConfigResult<()> {
        let mut file_config = self.host_config()?;

        if file_config.providers.iter().any(|p| same_name(&p.name, &config.name)) {
            return Err(ConfigError::ProviderExists(config.name));
        }

        file_config.providers.push(config);
        self.save(&file_config)
    }

    async fn remove_provider(&self, name: &str) -> ConfigResult<()> {
        let mut file_config = self.host_config()?;

        let original_len = file_config.providers.len();
        file_config.providers.retain(|p| !same_name(&p.name, name));

        if file_config.providers.len() == original_len {
            Err(ConfigError::ProviderNotFound(name.to_string()))
        } else {
            self.save(&file_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolConvention;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_config_provider() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        // Initially empty
        assert!(!provider.exists());
        assert!(provider.get_providers().await.is_empty());

        provider
            .add_provider(ProviderConfig::new("mcp_os_name", "python").with_args(["server/mcp_os_name.py"]))
            .await
            .unwrap();

        // File should exist now
        assert!(provider.exists());
        let providers = provider.get_providers().await;
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].source, ConfigSource::NativeUser);

        // Reload and verify persistence
        provider.reload().unwrap();
        assert_eq!(provider.get_providers().await.len(), 1);

        provider.remove_provider("MCP_OS_NAME").await.unwrap();
        assert!(provider.get_providers().await.is_empty());
    }

    #[test]
    fn test_parse_host_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
providers:
  - name: mcp_os_name
    command: python
    args: [server/mcp_os_name.py]
  - name: mcp_disk
    command: python
    args: [server/mcp_disk.py]
    enabled: false
    env:
      DISK_ROOT: /
model:
  backend: openai
  model: gpt-4o-mini
  convention: marker
timeouts:
  tool_secs: 5
system_prompt: You are terse.
"#,
        )
        .unwrap();

        let config = FileConfigProvider::new(&path, ConfigLevel::Workspace)
            .host_config()
            .unwrap();

        assert_eq!(config.providers.len(), 2);
        assert!(config.providers[0].enabled);
        assert!(!config.providers[1].enabled);
        assert_eq!(config.providers[1].env.get("DISK_ROOT").map(String::as_str), Some("/"));
        assert_eq!(config.model.convention, ToolConvention::Marker);
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.timeouts.tool_secs, 5);
        assert_eq!(config.timeouts.connect_secs, 30);
        assert_eq!(config.system_prompt.as_deref(), Some("You are terse."));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "providers: [ {name: ").unwrap();

        let result = FileConfigProvider::new(&path, ConfigLevel::User).host_config();
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }

    #[test]
    fn test_model_settings_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        provider
            .set_model(ModelSettings::new("ollama", "llama3.2").with_api_base("http://localhost:11434/"))
            .unwrap();

        let reloaded = FileConfigProvider::new(&path, ConfigLevel::User).host_config().unwrap();
        assert_eq!(reloaded.model.backend, "ollama");
        assert_eq!(reloaded.model.api_base.as_deref(), Some("http://localhost:11434/"));
    }

    #[test]
    fn test_discover_prefers_workspace() {
        let dir = tempdir().unwrap();
        assert_eq!(FileConfigProvider::discover(dir.path()).level(), ConfigLevel::User);

        let workspace = FileConfigProvider::workspace(dir.path());
        workspace.set_timeouts(TimeoutSettings::default()).unwrap();
        assert_eq!(FileConfigProvider::discover(dir.path()).level(), ConfigLevel::Workspace);
    }

    #[test]
    fn test_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        // No backup if file doesn't exist
        assert!(provider.backup().unwrap().is_none());

        fs::write(&path, "providers: []").unwrap();

        let backup_path = provider.backup().unwrap().unwrap();
        assert!(backup_path.exists());
        assert!(backup_path.to_string_lossy().contains("backup"));
    }
}

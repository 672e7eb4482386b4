//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{ConfigSource, ProviderConfig};
use super::traits::{same_name, ConfigError, ConfigProvider};

/// In-memory configuration provider
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    providers: RwLock<Vec<ProviderConfig>>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial providers
    pub fn with_providers(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers: RwLock::new(providers),
        }
    }

    /// Set providers directly
    pub fn set_providers(&self, providers: Vec<ProviderConfig>) {
        *self.providers.write() = providers;
    }

    pub fn clear(&self) {
        self.providers.write().clear();
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get_providers(&self) -> Vec<ProviderConfig> {
        self.providers
            .read()
            .iter()
            .cloned()
            .map(|p| p.with_source(ConfigSource::Runtime))
            .collect()
    }

    async fn update_provider(&self, name: &str, config: ProviderConfig) -> Result<(), ConfigError> {
        let mut guard = self.providers.write();
        match guard.iter_mut().find(|p| same_name(&p.name, name)) {
            Some(existing) => {
                *existing = config;
                Ok(())
            }
            None => Err(ConfigError::ProviderNotFound(name.to_string())),
        }
    }

    async fn add_provider(&self, config: ProviderConfig) -> Result<(), ConfigError> {
        let mut guard = self.providers.write();
        if guard.iter().any(|p| same_name(&p.name, &config.name)) {
            return Err(ConfigError::ProviderExists(config.name));
        }
        guard.push(config);
        Ok(())
    }

    async fn remove_provider(&self, name: &str) -> Result<(), ConfigError> {
        let mut guard = self.providers.write();
        let original_len = guard.len();
        guard.retain(|p| !same_name(&p.name, name));

        if guard.len() == original_len {
            Err(ConfigError::ProviderNotFound(name.to_string()))
        } else {
            Ok(())
        }
    }
}

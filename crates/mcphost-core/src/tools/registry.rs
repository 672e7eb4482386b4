//! Merged tool registry
//!
//! Maps every tool name to its descriptor and the session that owns it.
//! When two providers expose the same name the later-configured provider
//! wins; each collision is recorded and logged so shadowing is observable.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::logging::Logger;
use crate::session::ProviderSession;
use crate::types::ToolDescriptor;

/// A tool name claimed by more than one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolShadowing {
    pub tool: String,
    /// Provider whose entry was overwritten
    pub shadowed_provider: String,
    /// Provider that owns the name after the overwrite
    pub owner_provider: String,
}

struct RegistryEntry {
    descriptor: ToolDescriptor,
    provider: String,
    session: Weak<ProviderSession>,
}

impl RegistryEntry {
    /// The owning session, if it is alive and still lists `tool_name`
    fn live_session(&self, tool_name: &str) -> Option<Arc<ProviderSession>> {
        self.session
            .upgrade()
            .filter(|session| session.has_tool(tool_name))
    }
}

#[derive(Default)]
struct Snapshot {
    /// Tool names in first-registration order
    order: Vec<String>,
    entries: HashMap<String, RegistryEntry>,
    shadowed: Vec<ToolShadowing>,
}

/// Name-keyed index of tools across all connected providers
///
/// The registry holds weak references only; session lifetime belongs to
/// the pool. `rebuild` swaps in a complete new mapping, so concurrent
/// readers see either the old or the new one.
pub struct ToolRegistry {
    snapshot: RwLock<Arc<Snapshot>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            logger,
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Repopulate the mapping from `sessions`, in the order given
    pub fn rebuild(&self, sessions: &[Arc<ProviderSession>]) {
        let mut next = Snapshot::default();

        for session in sessions {
            for descriptor in session.tools() {
                let name = descriptor.name.clone();
                let entry = RegistryEntry {
                    descriptor,
                    provider: session.name().to_string(),
                    session: Arc::downgrade(session),
                };

                match next.entries.insert(name.clone(), entry) {
                    Some(previous) => {
                        self.logger.warn(&format!(
                            "[ToolRegistry] Tool `{}` from {} is shadowed by {}",
                            name,
                            previous.provider,
                            session.name()
                        ));
                        next.shadowed.push(ToolShadowing {
                            tool: name,
                            shadowed_provider: previous.provider,
                            owner_provider: session.name().to_string(),
                        });
                    }
                    None => next.order.push(name),
                }
            }
        }

        self.logger.info(&format!(
            "[ToolRegistry] Registered {} tools from {} providers",
            next.order.len(),
            sessions.len()
        ));

        *self.snapshot.write() = Arc::new(next);
    }

    /// Look up a tool and its owning session
    ///
    /// Returns `None` when the name is unknown, the session has been
    /// dropped, or the session no longer lists the tool.
    pub fn resolve(&self, tool_name: &str) -> Option<(ToolDescriptor, Arc<ProviderSession>)> {
        let snapshot = self.current();
        let entry = snapshot.entries.get(tool_name)?;
        let session = entry.live_session(tool_name)?;
        Some((entry.descriptor.clone(), session))
    }

    /// Descriptors whose owning session still lists them, in a stable order
    pub fn all_descriptors(&self) -> Vec<ToolDescriptor> {
        let snapshot = self.current();
        snapshot
            .order
            .iter()
            .filter_map(|name| {
                snapshot
                    .entries
                    .get(name)
                    .filter(|entry| entry.live_session(name).is_some())
            })
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    /// Name of the provider that currently owns `tool_name`
    pub fn owner_of(&self, tool_name: &str) -> Option<String> {
        let snapshot = self.current();
        let entry = snapshot.entries.get(tool_name)?;
        entry.live_session(tool_name)?;
        Some(entry.provider.clone())
    }

    /// Collisions resolved by the last rebuild
    pub fn shadowed(&self) -> Vec<ToolShadowing> {
        self.current().shadowed.clone()
    }

    /// Number of tools currently offered
    pub fn len(&self) -> usize {
        self.all_descriptors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{MockConnector, MockToolProvider};
    use crate::types::ProviderConfig;

    async fn connected(connector: &Arc<MockConnector>, name: &str) -> Arc<ProviderSession> {
        let session = Arc::new(ProviderSession::new(
            name,
            connector.clone(),
            Arc::new(NoOpLogger),
        ));
        session
            .connect(&ProviderConfig::new(name, "python"))
            .await
            .unwrap();
        session
    }

    fn connector() -> Arc<MockConnector> {
        Arc::new(
            MockConnector::new()
                .with_provider(
                    "alpha",
                    MockToolProvider::new()
                        .with_tool_reply("get_time", "alpha time")
                        .with_tool_reply("shared", "from alpha"),
                )
                .with_provider(
                    "beta",
                    MockToolProvider::new()
                        .with_tool_reply("shared", "from beta")
                        .with_tool_reply("get_os_info", "linux"),
                ),
        )
    }

    #[tokio::test]
    async fn test_last_registered_wins() {
        let connector = connector();
        let alpha = connected(&connector, "alpha").await;
        let beta = connected(&connector, "beta").await;
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(logger.clone());

        for _ in 0..3 {
            registry.rebuild(&[alpha.clone(), beta.clone()]);

            let (_, owner) = registry.resolve("shared").unwrap();
            assert_eq!(owner.name(), "beta");
            assert_eq!(registry.owner_of("shared").as_deref(), Some("beta"));
        }

        assert_eq!(
            registry.shadowed(),
            vec![ToolShadowing {
                tool: "shared".to_string(),
                shadowed_provider: "alpha".to_string(),
                owner_provider: "beta".to_string(),
            }]
        );
        let warnings = logger.messages(LogLevel::Warn);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("shared"));
    }

    #[tokio::test]
    async fn test_descriptor_order_is_stable() {
        let connector = connector();
        let alpha = connected(&connector, "alpha").await;
        let beta = connected(&connector, "beta").await;
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));

        registry.rebuild(&[alpha.clone(), beta.clone()]);

        let names: Vec<String> = registry
            .all_descriptors()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["get_time", "shared", "get_os_info"]);
        assert_eq!(names, registry.all_descriptors().into_iter().map(|d| d.name).collect::<Vec<_>>());
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_stale_entries() {
        let connector = connector();
        let alpha = connected(&connector, "alpha").await;
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));
        registry.rebuild(&[alpha.clone()]);

        assert!(registry.resolve("missing").is_none());
        assert!(registry.resolve("get_time").is_some());

        // A closed session no longer lists its tools
        alpha.close().await;
        assert!(registry.resolve("get_time").is_none());
        assert!(registry.all_descriptors().is_empty());
        assert!(registry.owner_of("get_time").is_none());

        // A dropped session is never kept alive by the registry
        let beta = connected(&connector, "beta").await;
        registry.rebuild(&[beta.clone()]);
        drop(beta);
        assert!(registry.resolve("get_os_info").is_none());
        assert!(registry.all_descriptors().is_empty());
        assert!(registry.owner_of("get_os_info").is_none());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_mapping() {
        let connector = connector();
        let alpha = connected(&connector, "alpha").await;
        let beta = connected(&connector, "beta").await;
        let registry = ToolRegistry::new(Arc::new(NoOpLogger));

        registry.rebuild(&[beta.clone(), alpha.clone()]);
        assert_eq!(registry.owner_of("shared").as_deref(), Some("alpha"));

        registry.rebuild(&[beta.clone()]);
        assert_eq!(registry.owner_of("shared").as_deref(), Some("beta"));
        assert!(registry.owner_of("get_time").is_none());
        assert!(registry.shadowed().is_empty());

        registry.rebuild(&[]);
        assert!(registry.is_empty());
    }
}

//! Provider pool
//!
//! Owns every [`ProviderSession`], brings them up concurrently and routes
//! tool calls through the [`ToolRegistry`]. A pool is constructed
//! explicitly and handed to whatever drives the conversation.
//!
//! # Example
//!
//! ```rust,ignore
//! let pool = ProviderPool::new(Arc::new(StdioConnector::new(logger.clone())), logger);
//! let report = pool.start_all(&config.providers).await;
//! println!("{report}");
//!
//! let result = pool.invoke("get_time", json!({})).await?;
//! ```

mod error;
mod report;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::logging::Logger;
use crate::mcp::Connector;
use crate::session::ProviderSession;
use crate::tools::{ToolRegistry, ToolShadowing};
use crate::types::{ProviderConfig, TimeoutSettings, ToolDescriptor, ToolInvocationResult};

pub use error::{DispatchError, DispatchResult};
pub use report::{ProviderOutcome, StartupReport};

enum Startup {
    Connect(Arc<ProviderSession>, ProviderConfig),
    Skip(String),
    Duplicate(String),
}

/// The set of provider sessions plus the merged tool registry
pub struct ProviderPool {
    connector: Arc<dyn Connector>,
    logger: Arc<dyn Logger>,
    timeouts: TimeoutSettings,
    sessions: RwLock<Vec<Arc<ProviderSession>>>,
    registry: ToolRegistry,
    /// Serializes `start_all` and `close_all`
    startup: Mutex<()>,
}

impl ProviderPool {
    pub fn new(connector: Arc<dyn Connector>, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector,
            registry: ToolRegistry::new(logger.clone()),
            logger,
            timeouts: TimeoutSettings::default(),
            sessions: RwLock::new(Vec::new()),
            startup: Mutex::new(()),
        }
    }

    /// Deadlines applied to sessions created by this pool
    pub fn with_timeouts(mut self, timeouts: TimeoutSettings) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Connect every configured provider concurrently
    ///
    /// Waits for all of them; individual failures only show up in the
    /// report. The report has one line per entry in `configs`. Sessions
    /// are reused by name, and sessions absent from `configs` are closed.
    pub async fn start_all(&self, configs: &[ProviderConfig]) -> StartupReport {
        let _guard = self.startup.lock().await;

        let existing: HashMap<String, Arc<ProviderSession>> = self
            .sessions
            .read()
            .iter()
            .map(|s| (s.name().to_string(), Arc::clone(s)))
            .collect();

        let mut seen = HashSet::new();
        let mut active = Vec::new();
        let mut plan = Vec::with_capacity(configs.len());

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                plan.push(Startup::Duplicate(config.name.clone()));
                continue;
            }
            if !config.enabled {
                plan.push(Startup::Skip(config.name.clone()));
                continue;
            }

            let session = existing.get(&config.name).cloned().unwrap_or_else(|| {
                Arc::new(
                    ProviderSession::new(
                        config.name.clone(),
                        Arc::clone(&self.connector),
                        self.logger.clone(),
                    )
                    .with_timeouts(&self.timeouts),
                )
            });
            active.push(Arc::clone(&session));
            plan.push(Startup::Connect(session, config.clone()));
        }

        self.logger.info(&format!(
            "[ProviderPool] Starting {} of {} configured providers",
            active.len(),
            configs.len()
        ));

        let outcomes = join_all(plan.into_iter().map(|step| async move {
            match step {
                Startup::Connect(session, config) => match session.connect(&config).await {
                    Ok(summary) => ProviderOutcome::Connected {
                        name: config.name,
                        summary,
                    },
                    Err(e) => ProviderOutcome::Failed {
                        name: config.name,
                        error: e.to_string(),
                    },
                },
                Startup::Skip(name) => ProviderOutcome::Skipped { name },
                Startup::Duplicate(name) => ProviderOutcome::Failed {
                    name,
                    error: "duplicate provider name".to_string(),
                },
            }
        }))
        .await;

        let connected: Vec<Arc<ProviderSession>> = active
            .iter()
            .filter(|s| s.is_connected())
            .cloned()
            .collect();
        self.registry.rebuild(&connected);

        let kept: HashSet<&str> = active.iter().map(|s| s.name()).collect();
        let removed: Vec<Arc<ProviderSession>> = existing
            .values()
            .filter(|s| !kept.contains(s.name()))
            .cloned()
            .collect();
        *self.sessions.write() = active.clone();

        for session in removed {
            self.logger.info(&format!(
                "[ProviderPool] Closing {} (no longer configured)",
                session.name()
            ));
            session.close().await;
        }

        let report = StartupReport { outcomes };
        self.logger.info(&format!(
            "[ProviderPool] {} connected, {} failed",
            report.connected_count(),
            report.failed_count()
        ));
        report
    }

    /// Execute a tool on whichever provider owns it
    pub async fn invoke(&self, tool_name: &str, args: Value) -> DispatchResult<ToolInvocationResult> {
        let Some((_, session)) = self.registry.resolve(tool_name) else {
            self.logger
                .warn(&format!("[ProviderPool] Unknown tool requested: {}", tool_name));
            return Err(DispatchError::UnknownTool(tool_name.to_string()));
        };

        self.logger.debug(&format!(
            "[ProviderPool] Routing {} to {}",
            tool_name,
            session.name()
        ));
        Ok(session.invoke(tool_name, args).await?)
    }

    /// Descriptors of every routable tool, in a stable order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.registry.all_descriptors()
    }

    /// Provider currently owning `tool_name`
    pub fn owner_of(&self, tool_name: &str) -> Option<String> {
        self.registry.owner_of(tool_name)
    }

    pub fn shadowed(&self) -> Vec<ToolShadowing> {
        self.registry.shadowed()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Sessions for the enabled providers of the last `start_all`
    pub fn sessions(&self) -> Vec<Arc<ProviderSession>> {
        self.sessions.read().clone()
    }

    pub fn session(&self, name: &str) -> Option<Arc<ProviderSession>> {
        self.sessions.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Close every session and empty the registry
    pub async fn close_all(&self) {
        let _guard = self.startup.lock().await;

        let sessions = std::mem::take(&mut *self.sessions.write());
        self.registry.rebuild(&[]);
        join_all(sessions.iter().map(|s| s.close())).await;

        self.logger.info(&format!(
            "[ProviderPool] Closed {} sessions",
            sessions.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockConnector, MockToolProvider};
    use crate::session::InvocationError;
    use crate::types::SessionState;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn pool(connector: &Arc<MockConnector>) -> ProviderPool {
        ProviderPool::new(connector.clone(), Arc::new(NoOpLogger))
    }

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig::new(name, "python").with_args([format!("server/{name}.py")])
    }

    fn connector() -> Arc<MockConnector> {
        Arc::new(
            MockConnector::new()
                .with_provider("a", MockToolProvider::new().with_tool_reply("get_time", "2024-01-01T00:00:00"))
                .with_provider(
                    "c",
                    MockToolProvider::new()
                        .with_tool_reply("get_os_info", "linux")
                        .with_tool_reply("get_disk_usage", "42%"),
                ),
        )
    }

    #[tokio::test]
    async fn test_start_all_reports_every_provider() {
        let connector = connector();
        let pool = pool(&connector);

        let report = pool.start_all(&[config("a"), config("b"), config("c")]).await;

        assert_eq!(report.lines().len(), 3);
        assert_eq!(report.connected_count(), 2);
        assert_eq!(report.failed_count(), 1);

        let names: Vec<String> = pool.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["get_time", "get_os_info", "get_disk_usage"]);
    }

    #[tokio::test]
    async fn test_failed_provider_is_absent() {
        let connector = Arc::new(
            MockConnector::new()
                .with_provider("a", MockToolProvider::new().with_tool_reply("get_time", "noon"))
                .with_provider(
                    "b",
                    MockToolProvider::new()
                        .with_tool_reply("b_only", "never")
                        .failing_launch("python: can't open file 'server/b.py'"),
                ),
        );
        let pool = pool(&connector);

        let report = pool.start_all(&[config("a"), config("b")]).await;

        let text = report.text();
        let b_line = text.lines().find(|l| l.contains("b")).unwrap();
        assert!(b_line.starts_with("Failed to connect to b"));
        assert!(b_line.contains("error:"));
        assert!(pool.descriptors().iter().all(|d| d.name != "b_only"));

        let err = pool.invoke("b_only", json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(ref name) if name == "b_only"));
        assert_eq!(pool.session("b").unwrap().state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_report_has_one_line_per_provider_with_multiline_errors() {
        let connector = Arc::new(
            MockConnector::new()
                .with_provider("a", MockToolProvider::new().with_tool_reply("get_time", "noon"))
                .with_provider(
                    "b",
                    MockToolProvider::new()
                        .with_tool_reply("b_only", "never")
                        .failing_handshake("Traceback:\n  File server.py\nImportError"),
                ),
        );
        let pool = pool(&connector);
        let configs = [config("a"), config("b")];

        let report = pool.start_all(&configs).await;

        assert_eq!(report.text().lines().count(), configs.len());
        assert!(report.text().lines().nth(1).unwrap().contains("ImportError"));
    }

    #[tokio::test]
    async fn test_closed_session_tools_are_not_offered() {
        let connector = connector();
        let pool = pool(&connector);
        pool.start_all(&[config("a"), config("c")]).await;
        assert_eq!(pool.owner_of("get_time").as_deref(), Some("a"));

        pool.session("a").unwrap().close().await;

        let names: Vec<String> = pool.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["get_os_info", "get_disk_usage"]);
        assert!(pool.owner_of("get_time").is_none());
        assert_eq!(pool.owner_of("get_os_info").as_deref(), Some("c"));
        assert!(matches!(
            pool.invoke("get_time", json!({})).await,
            Err(DispatchError::UnknownTool(_))
        ));
    }

    #[tokio::test]
    async fn test_start_all_runs_concurrently() {
        let slow = || {
            MockToolProvider::new()
                .with_tool_reply("tick", "tock")
                .with_connect_delay(Duration::from_millis(300))
        };
        let connector = Arc::new(
            MockConnector::new()
                .with_provider("one", slow())
                .with_provider("two", slow())
                .with_provider("three", slow()),
        );
        let pool = pool(&connector);

        let started = Instant::now();
        let report = pool.start_all(&[config("one"), config("two"), config("three")]).await;

        assert_eq!(report.connected_count(), 3);
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_invoke_routes_to_owner() {
        let connector = connector();
        let pool = pool(&connector);
        pool.start_all(&[config("a"), config("c")]).await;

        let result = pool.invoke("get_disk_usage", json!({ "path": "/" })).await.unwrap();

        assert_eq!(result.raw_output, "42%");
        let calls = connector.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].provider, "c");
        assert_eq!(calls[0].arguments, json!({ "path": "/" }));
    }

    #[tokio::test]
    async fn test_invocation_errors_pass_through() {
        let connector = connector();
        let pool = pool(&connector);
        pool.start_all(&[config("a")]).await;
        pool.session("a").unwrap().close().await;

        // Closed sessions drop their tools, so resolution fails first
        let err = pool.invoke("get_time", json!({})).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(_)));

        connector.set_provider(
            "a",
            MockToolProvider::new().with_tool(ToolDescriptor::new("get_time", "Current time")).with_reply(
                "get_time",
                crate::mcp::MockToolReply::Error("clock unavailable".to_string()),
            ),
        );
        pool.start_all(&[config("a")]).await;

        let err = pool.invoke("get_time", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Invocation(InvocationError::ToolFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_collisions_follow_config_order() {
        let connector = Arc::new(
            MockConnector::new()
                .with_provider("first", MockToolProvider::new().with_tool_reply("status", "first"))
                .with_provider("second", MockToolProvider::new().with_tool_reply("status", "second")),
        );
        let pool = pool(&connector);

        pool.start_all(&[config("first"), config("second")]).await;
        assert_eq!(pool.owner_of("status").as_deref(), Some("second"));
        assert_eq!(pool.invoke("status", json!({})).await.unwrap().raw_output, "second");
        assert_eq!(pool.shadowed().len(), 1);

        pool.start_all(&[config("second"), config("first")]).await;
        assert_eq!(pool.owner_of("status").as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_disabled_and_duplicate_providers() {
        let connector = connector();
        let pool = pool(&connector);

        let report = pool
            .start_all(&[config("a"), config("c").disabled(), config("a")])
            .await;

        assert_eq!(
            report.lines(),
            vec![
                "a connected; tools: get_time".to_string(),
                "c skipped (disabled)".to_string(),
                "Failed to connect to a (error: duplicate provider name)".to_string(),
            ]
        );
        assert_eq!(connector.connect_attempts("a"), 1);
        assert_eq!(connector.connect_attempts("c"), 0);
        assert!(pool.owner_of("get_os_info").is_none());
    }

    #[tokio::test]
    async fn test_restart_reuses_and_closes_sessions() {
        let connector = connector();
        let pool = pool(&connector);

        pool.start_all(&[config("a"), config("c")]).await;
        let a_before = pool.session("a").unwrap();

        pool.start_all(&[config("a")]).await;

        assert!(Arc::ptr_eq(&a_before, &pool.session("a").unwrap()));
        assert_eq!(connector.live_channels("a"), 1);
        assert_eq!(connector.live_channels("c"), 0);
        assert!(pool.session("c").is_none());
        assert!(pool.owner_of("get_os_info").is_none());
    }

    #[tokio::test]
    async fn test_close_all() {
        let connector = connector();
        let pool = pool(&connector);
        pool.start_all(&[config("a"), config("c")]).await;

        pool.close_all().await;
        pool.close_all().await;

        assert!(pool.sessions().is_empty());
        assert!(pool.descriptors().is_empty());
        assert_eq!(connector.live_channels("a"), 0);
        assert_eq!(connector.live_channels("c"), 0);
    }

    #[tokio::test]
    async fn test_concurrent_invokes_from_independent_callers() {
        let connector = connector();
        let pool = Arc::new(pool(&connector));
        pool.start_all(&[config("a"), config("c")]).await;

        let handles: Vec<_> = ["get_time", "get_os_info", "get_disk_usage", "get_time"]
            .into_iter()
            .map(|tool| {
                let pool = Arc::clone(&pool);
                tokio::spawn(async move { pool.invoke(tool, json!({})).await })
            })
            .collect();

        let outputs: Vec<String> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap().raw_output)
            .collect();
        assert_eq!(outputs, vec!["2024-01-01T00:00:00", "linux", "42%", "2024-01-01T00:00:00"]);
    }
}

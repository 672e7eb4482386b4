//! Logger trait definition

use std::sync::Arc;

/// Logger abstraction for runtime-agnostic logging
///
/// Every component takes an `Arc<dyn Logger>` at construction; there is no
/// process-wide logger.
///
/// Implementations:
/// - `NoOpLogger`: Silent logger for library use and tests
/// - `ConsoleLogger`: Logs to stderr
/// - `MemoryLogger`: Captures entries for assertions
pub trait Logger: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;

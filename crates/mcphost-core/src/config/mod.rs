//! Host configuration
//!
//! Supports multiple configuration sources:
//! - `MemoryConfigProvider`: In-memory for tests and embedding
//! - `FileConfigProvider`: YAML file-based (user/workspace level)

mod traits;
mod memory;
mod file;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use memory::MemoryConfigProvider;
pub use file::{FileConfigProvider, HostConfig, ConfigLevel};

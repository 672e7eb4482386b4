//! Model-facing conversation loop
//!
//! One user message in, a handful of new turns out:
//!
//! ```text
//! AwaitingModelResponse ──text──────────────────────────────────────▶ Complete
//!        │
//!        └─tool request─▶ AwaitingToolResult ─ok─▶ AwaitingFinalModelResponse ─▶ Complete
//!                                 │
//!                                 └─unknown tool / invocation error──────────▶ Complete
//! ```

mod engine;
mod error;

pub use engine::{ConversationEngine, EngineConfig, EngineState};
pub use error::{EngineError, EngineResult};

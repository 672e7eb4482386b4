//! Tool routing
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  ToolRegistry                                 │
//! │                                               │
//! │  tool name -> (descriptor, owning session)    │
//! │  - rebuilt wholesale after every start_all    │
//! │  - last-configured provider wins collisions   │
//! │  - collisions exposed through shadowed()      │
//! └───────────────────────────────────────────────┘
//!           │
//!           │ weak refs
//!           ▼
//! ┌───────────────────────────────────────────────┐
//! │  ProviderSession (one per provider process)   │
//! └───────────────────────────────────────────────┘
//! ```

mod registry;

pub use registry::{ToolRegistry, ToolShadowing};

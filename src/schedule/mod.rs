//! Schedule document module.
//!
//! This module provides:
//! - `model`: Data structures for the graph (Scene, ShootDay, ScheduleRoot)
//! - `manager`: ScheduleManager over an Automerge document, and its shared lock
//! - `import`: typed resolution of external scene-list exports
//! - `wasm`: WASM bindings for browser usage (JsScheduleManager)

pub mod import;
pub mod manager;
pub mod model;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use import::ScheduleImport;
pub use manager::{PageLengthUpdate, ScheduleManager, SharedScheduleManager};
pub use model::*;

#[cfg(feature = "wasm")]
pub use wasm::JsScheduleManager;

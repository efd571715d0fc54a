//! World engine: one explicit context object that owns every store and keeps
//! the external audio engine consistent with editor state.
//!
//! # Invariants
//! - At most one entity across all stores has `is_selected` set, and it is
//!   the one recorded in the selection state.
//! - Nothing fails outward: rejected operations are logged and reported as
//!   `bool`/`Option`.
//! - Time only moves through [`WorldEngine::tick`].

mod config;
mod facade;
mod sim;
mod stats;

pub use config::{ConfigError, EngineConfig};
pub use facade::{EngineState, GridContents, WorldEngine};
pub use sim::TickReport;
pub use stats::SystemStats;

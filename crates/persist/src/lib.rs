//! Persistence: the world registry and the contract for fetching the shared
//! global chunk.
//!
//! # Invariants
//! - The `default` world always exists and is never deleted.
//! - World names are non-blank and unique.
//! - Export/import carries `{id, name, version}` only, never entity data.
//! - Persistence failures are reported as values, never panics.

mod global;
mod worlds;

pub use global::{FileStateSource, GlobalStateSource, GlobalWorldState, PersistOutcome};
pub use worlds::{WORLD_FORMAT_VERSION, WorldError, WorldExport, WorldId, WorldInfo, WorldManager};

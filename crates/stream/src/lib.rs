//! Streaming: chunked world partition, chunk load/unload, adjacency queries.
//!
//! # Invariants
//! - The origin chunk `0,0,0` is loaded at construction and can never be
//!   unloaded or deleted.
//! - Chunk-addressed grids are keyed by their coordinate; free-form grids by
//!   an opaque id. Both share one map.
//! - Streaming never drops the origin chunk or a free-form grid.

mod grid;
mod stream;

pub use grid::{Grid, GridConfig, GridError, GridStore, GridUpdate};
pub use stream::{StreamBudget, StreamPlan};

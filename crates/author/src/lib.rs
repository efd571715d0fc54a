//! Authoring state: which entity the editor has selected and how the
//! transform gizmo manipulates it.
//!
//! # Invariants
//! - At most one entity is selected at a time, regardless of its kind.
//! - Changing the transform mode never touches the selection.

mod selection;

pub use selection::{SelectionChange, SelectionState};

//! Shared types for the soundscape engine: identifiers, chunk addressing,
//! transforms, entity kind enumerations and parameter maps.
//!
//! This crate carries no behavior beyond small conversions; every store in
//! the workspace speaks in these types.

mod kinds;
mod params;
mod types;

pub use kinds::{
    EffectShape, EffectType, MovementType, ParseKindError, SoundObjectType, TransformMode,
};
pub use params::{ParamValue, Params};
pub use types::{EntityId, GridCoord, GridId, ParseCoordError, Transform};

/// Re-exported so downstream crates agree on one vector type.
pub use glam::Vec3;

//! Entity kernel: the authoritative stores for every placeable entity kind.
//!
//! # Invariants
//! - Each store owns one flat map keyed by [`EntityId`]; chunk membership is a
//!   back-reference (`grid_id`), never a second copy.
//! - Every audio-relevant mutation emits its [`AudioCommand`]s into the sink
//!   passed to that same call. Deregistration is emitted before the entity
//!   leaves its store.
//! - Kinematics are pure functions of the object and an explicit [`SimTime`].
//!
//! [`EntityId`]: soundscape_common::EntityId
//! [`AudioCommand`]: soundscape_audio::AudioCommand

pub mod defaults;
pub mod effects;
pub mod kinematics;
pub mod mobile;
pub mod objects;
mod rng;

pub use defaults::{default_audio_params, validate_audio_params};
pub use effects::{EffectError, EffectZone, EffectZoneStore, EffectZoneUpdate, default_effect_params};
pub use kinematics::{SimTime, calculate_next_position};
pub use mobile::{
    MobileError, MobileObject, MobileObjectStore, MobileParams, MobileParamsUpdate,
    validate_mobile_params,
};
pub use objects::{ObjectError, SoundObject, SoundObjectStore, SoundObjectUpdate};
pub use rng::SplitMix64;

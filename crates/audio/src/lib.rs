//! Audio engine contract.
//!
//! Stores never talk to an audio engine directly. They push [`AudioCommand`]s
//! into an [`AudioSink`] in the same call that mutates their state. An
//! [`Outbox`] records commands (tests, batching); an [`AudioBridge`] forwards
//! each one to a live [`AudioEngine`] immediately.
//!
//! # Invariants
//! - Every engine call is best-effort: failures are logged and counted, never
//!   propagated, and never roll back local state.
//! - Commands reach the engine in the order the store emitted them.

mod command;
mod engine;
mod sink;

pub use command::AudioCommand;
pub use engine::{AudioEngine, AudioError, ContextState, NullAudioEngine, RecordingAudioEngine};
pub use sink::{AudioBridge, AudioSink, AudioStats, Outbox};

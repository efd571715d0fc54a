use serde::{Deserialize, Serialize};
use soundscape_common::GridCoord;
use soundscape_kernel::{EffectZone, MobileObject, SoundObject};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Snapshot of the shared "global" chunk served by the persistence
/// collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalWorldState {
    pub coordinates: GridCoord,
    pub objects: Vec<SoundObject>,
    pub mobile_objects: Vec<MobileObject>,
    pub effect_zones: Vec<EffectZone>,
}

impl GlobalWorldState {
    pub fn entity_count(&self) -> usize {
        self.objects.len() + self.mobile_objects.len() + self.effect_zones.len()
    }
}

/// Result of a persistence call. Retryable failures are transient (I/O,
/// network); fatal ones mean the data itself is unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome<T> {
    Success(T),
    RetryableError(String),
    FatalError(String),
}

impl<T> PersistOutcome<T> {
    /// The success value, dropping the error detail.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }
}

/// Where the global chunk comes from.
pub trait GlobalStateSource {
    fn get_global_world_state(&mut self) -> PersistOutcome<GlobalWorldState>;
}

/// Reads the global chunk from a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileStateSource {
    path: PathBuf,
}

impl FileStateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GlobalStateSource for FileStateSource {
    fn get_global_world_state(&mut self) -> PersistOutcome<GlobalWorldState> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return PersistOutcome::FatalError(format!("{}: {e}", self.path.display()));
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "global state read failed");
                return PersistOutcome::RetryableError(e.to_string());
            }
        };
        match serde_json::from_str(&text) {
            Ok(state) => PersistOutcome::Success(state),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "global state is malformed");
                PersistOutcome::FatalError(e.to_string())
            }
        }
    }
}

//! Sound-object store.
//!
//! Each sound object is a voice in the audio engine. The store is the single
//! owner of object state; every audio-relevant mutation emits its commands
//! into the caller's [`AudioSink`] within the same call.

use crate::defaults::default_audio_params;
use serde::{Deserialize, Serialize};
use soundscape_audio::{AudioCommand, AudioSink};
use soundscape_common::{EntityId, GridId, Params, SoundObjectType, Transform, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    #[error("sound object {0} not found")]
    NotFound(EntityId),
}

/// A placeable sound-emitting entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundObject {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub object_type: SoundObjectType,
    #[serde(flatten)]
    pub transform: Transform,
    pub audio_params: Params,
    /// Continuous mode.
    pub audio_enabled: bool,
    pub is_selected: bool,
    /// Chunk the object was placed in.
    pub grid_id: Option<GridId>,
}

/// Partial update for a sound object. `audio_params` is a patch merged over
/// the current parameters. Selection is not updatable here; it only moves
/// through the engine's `select_entity`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundObjectUpdate {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub audio_params: Option<Params>,
}

impl SoundObjectUpdate {
    /// Update that only moves the object.
    pub fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Update that only merges a parameter patch.
    pub fn audio_params(patch: Params) -> Self {
        Self {
            audio_params: Some(patch),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SoundObjectStore {
    objects: BTreeMap<EntityId, SoundObject>,
}

impl SoundObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Look up an object by id.
    pub fn get(&self, id: EntityId) -> Option<&SoundObject> {
        self.objects.get(&id)
    }

    /// All objects in id order.
    pub fn all(&self) -> impl Iterator<Item = &SoundObject> {
        self.objects.values()
    }

    /// Objects whose back-reference points at `grid_id`.
    pub fn objects_in_grid(&self, grid_id: GridId) -> Vec<&SoundObject> {
        self.objects
            .values()
            .filter(|o| o.grid_id == Some(grid_id))
            .collect()
    }

    /// Place a new object with default parameters and register its voice.
    pub fn add_object(
        &mut self,
        object_type: SoundObjectType,
        position: Vec3,
        grid_id: Option<GridId>,
        audio: &mut dyn AudioSink,
    ) -> EntityId {
        let id = EntityId::new();
        let audio_params = default_audio_params(object_type);
        audio.send(AudioCommand::CreateSoundSource {
            id,
            object_type,
            params: audio_params.clone(),
            position,
        });
        self.objects.insert(
            id,
            SoundObject {
                id,
                object_type,
                transform: Transform::at(position),
                audio_params,
                audio_enabled: false,
                is_selected: false,
                grid_id,
            },
        );
        tracing::debug!(%id, %object_type, ?position, "sound object added");
        id
    }

    /// Insert an object built elsewhere (imports), registering its voice.
    /// Percussion-only objects are forced out of continuous mode.
    pub fn insert_object(&mut self, mut object: SoundObject, audio: &mut dyn AudioSink) {
        if object.audio_enabled && object.object_type.is_percussion_only() {
            tracing::warn!(id = %object.id, object_type = %object.object_type, "percussion-only object imported in continuous mode, disabling");
            object.audio_enabled = false;
        }
        audio.send(AudioCommand::CreateSoundSource {
            id: object.id,
            object_type: object.object_type,
            params: object.audio_params.clone(),
            position: object.transform.position,
        });
        if object.audio_enabled {
            audio.send(AudioCommand::StartContinuousSound {
                id: object.id,
                params: object.audio_params.clone(),
            });
        }
        self.objects.insert(object.id, object);
    }

    /// Merge `update` into the object. Position changes and parameter changes
    /// are forwarded; parameter updates carry the full merged map.
    pub fn update_object(
        &mut self,
        id: EntityId,
        update: SoundObjectUpdate,
        audio: &mut dyn AudioSink,
    ) -> Result<(), ObjectError> {
        let object = self.objects.get_mut(&id).ok_or(ObjectError::NotFound(id))?;

        if let Some(position) = update.position {
            if position != object.transform.position {
                object.transform.position = position;
                audio.send(AudioCommand::UpdateSoundPosition { id, position });
            }
        }
        if let Some(rotation) = update.rotation {
            object.transform.rotation = rotation;
        }
        if let Some(scale) = update.scale {
            object.transform.scale = scale;
        }
        if let Some(patch) = update.audio_params {
            let merged = object.audio_params.merged(&patch);
            if merged != object.audio_params {
                object.audio_params = merged;
                audio.send(AudioCommand::UpdateSoundParams {
                    id,
                    params: object.audio_params.clone(),
                });
            }
        }
        Ok(())
    }

    /// Deregister the voice, then drop the object.
    pub fn remove_object(
        &mut self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<SoundObject, ObjectError> {
        if !self.objects.contains_key(&id) {
            return Err(ObjectError::NotFound(id));
        }
        audio.send(AudioCommand::RemoveSoundSource { id });
        let removed = self.objects.remove(&id).ok_or(ObjectError::NotFound(id))?;
        tracing::debug!(%id, "sound object removed");
        Ok(removed)
    }

    /// Switch continuous mode. `force` picks the target state, otherwise the
    /// current state is flipped. Percussion-only objects never change.
    ///
    /// Returns the resulting `audio_enabled`.
    pub fn toggle_object_audio(
        &mut self,
        id: EntityId,
        force: Option<bool>,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        let object = self.objects.get_mut(&id).ok_or(ObjectError::NotFound(id))?;
        if object.object_type.is_percussion_only() {
            tracing::debug!(%id, object_type = %object.object_type, "percussion-only object, toggle ignored");
            return Ok(object.audio_enabled);
        }
        let target = force.unwrap_or(!object.audio_enabled);
        if target == object.audio_enabled {
            return Ok(target);
        }
        object.audio_enabled = target;
        if target {
            audio.send(AudioCommand::StartContinuousSound {
                id,
                params: object.audio_params.clone(),
            });
        } else {
            audio.send(AudioCommand::StopSound { id });
        }
        Ok(target)
    }

    /// Shared gate for one-shot and gate commands: objects in continuous mode
    /// suppress them. Returns whether a command was emitted.
    fn fire(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
        build: impl FnOnce(EntityId, Params) -> AudioCommand,
    ) -> Result<bool, ObjectError> {
        let object = self.objects.get(&id).ok_or(ObjectError::NotFound(id))?;
        if object.audio_enabled {
            tracing::trace!(%id, "trigger suppressed by continuous mode");
            return Ok(false);
        }
        audio.send(build(id, object.audio_params.clone()));
        Ok(true)
    }

    /// Fire a note attack. Returns false when suppressed by continuous mode.
    pub fn trigger_object_note(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        self.fire(id, audio, |id, params| AudioCommand::TriggerNoteAttack { id, params })
    }

    /// Fire a noise attack. Returns false when suppressed by continuous mode.
    pub fn trigger_object_percussion(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        self.fire(id, audio, |id, params| AudioCommand::TriggerNoiseAttack { id, params })
    }

    /// Fire a full attack/release. Returns false when suppressed by continuous mode.
    pub fn trigger_object_attack_release(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        self.fire(id, audio, |id, params| AudioCommand::TriggerAttackRelease {
            id,
            params,
        })
    }

    /// Open the gate. Returns false when suppressed by continuous mode.
    pub fn start_object_gate(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        self.fire(id, audio, |id, params| AudioCommand::StartSound { id, params })
    }

    /// Close the gate. Returns false when suppressed by continuous mode.
    pub fn stop_object_gate(
        &self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        self.fire(id, audio, |id, _| AudioCommand::StopSound { id })
    }

    /// Replace the object's chord from a user-edited JSON array of
    /// frequencies. Malformed or empty input is ignored and the previous chord
    /// kept. Returns whether the chord changed.
    pub fn set_chord_from_text(
        &mut self,
        id: EntityId,
        text: &str,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        if !self.objects.contains_key(&id) {
            return Err(ObjectError::NotFound(id));
        }
        let chord: Vec<f64> = match serde_json::from_str(text) {
            Ok(chord) => chord,
            Err(err) => {
                tracing::debug!(%id, error = %err, "ignoring malformed chord text");
                return Ok(false);
            }
        };
        if chord.is_empty() || chord.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            tracing::debug!(%id, "ignoring chord without positive frequencies");
            return Ok(false);
        }
        self.update_object(
            id,
            SoundObjectUpdate::audio_params(Params::new().with("chord", chord)),
            audio,
        )?;
        Ok(true)
    }

    /// Replace the object's sample URL from a user-edited JSON string.
    /// Malformed input is ignored. Returns whether the URL changed.
    pub fn set_sample_url_from_text(
        &mut self,
        id: EntityId,
        text: &str,
        audio: &mut dyn AudioSink,
    ) -> Result<bool, ObjectError> {
        if !self.objects.contains_key(&id) {
            return Err(ObjectError::NotFound(id));
        }
        let url: String = match serde_json::from_str(text) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(%id, error = %err, "ignoring malformed sample url text");
                return Ok(false);
            }
        };
        let looks_like_url =
            url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/');
        if !looks_like_url {
            tracing::debug!(%id, %url, "ignoring sample url without scheme or absolute path");
            return Ok(false);
        }
        self.update_object(
            id,
            SoundObjectUpdate::audio_params(Params::new().with("sampleUrl", url)),
            audio,
        )?;
        Ok(true)
    }

    /// Set `is_selected` on every object: true for `keep`, false otherwise.
    pub fn mark_selected(&mut self, keep: Option<EntityId>) {
        for object in self.objects.values_mut() {
            object.is_selected = Some(object.id) == keep;
        }
    }

    /// Re-send position and parameters for every voice.
    pub fn resync(&self, audio: &mut dyn AudioSink) {
        for object in self.objects.values() {
            audio.send(AudioCommand::UpdateSoundPosition {
                id: object.id,
                position: object.transform.position,
            });
            audio.send(AudioCommand::UpdateSoundParams {
                id: object.id,
                params: object.audio_params.clone(),
            });
        }
    }

    /// Deregister every voice and empty the store. Returns how many objects
    /// were removed.
    pub fn clear_all_objects(&mut self, audio: &mut dyn AudioSink) -> usize {
        for id in self.objects.keys() {
            audio.send(AudioCommand::RemoveSoundSource { id: *id });
        }
        let count = self.objects.len();
        self.objects.clear();
        tracing::info!(count, "cleared all sound objects");
        count
    }
}

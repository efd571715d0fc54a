//! Effect-zone store. Each zone drives one global effect in the audio
//! engine, keyed by the zone id.

use serde::{Deserialize, Serialize};
use soundscape_audio::{AudioCommand, AudioSink};
use soundscape_common::{EffectShape, EffectType, EntityId, GridId, Params, Transform, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("effect zone {0} not found")]
    NotFound(EntityId),
}

/// Default parameters for an effect of `effect_type`, including `radius`.
pub fn default_effect_params(effect_type: EffectType, radius: f64) -> Params {
    let p = Params::new().with("wet", 1.0);
    let p = match effect_type {
        EffectType::AutoFilter => p
            .with("frequency", 1.0)
            .with("depth", 1.0)
            .with("baseFrequency", 200.0)
            .with("octaves", 2.6),
        EffectType::AutoWah => p
            .with("baseFrequency", 100.0)
            .with("octaves", 6.0)
            .with("sensitivity", 0.0)
            .with("Q", 2.0),
        EffectType::Phaser => p
            .with("frequency", 0.5)
            .with("octaves", 3.0)
            .with("baseFrequency", 350.0)
            .with("Q", 10.0),
        EffectType::Distortion => p.with("distortion", 0.4).with("oversample", "none"),
        EffectType::FeedbackDelay => p.with("delayTime", 0.25).with("feedback", 0.5),
        EffectType::PingPongDelay => p.with("delayTime", 0.25).with("feedback", 0.3),
        EffectType::Reverb => p.with("decay", 1.5).with("preDelay", 0.01),
        EffectType::Freeverb => p.with("roomSize", 0.7).with("dampening", 3000.0),
        EffectType::JcReverb => p.with("roomSize", 0.5),
        EffectType::Chorus => p
            .with("frequency", 1.5)
            .with("delayTime", 3.5)
            .with("depth", 0.7)
            .with("spread", 180.0),
        EffectType::Tremolo => p
            .with("frequency", 10.0)
            .with("depth", 0.5)
            .with("spread", 180.0),
        EffectType::Vibrato => p.with("frequency", 5.0).with("depth", 0.1),
        EffectType::PitchShift => p
            .with("pitch", 0.0)
            .with("windowSize", 0.1)
            .with("delayTime", 0.0)
            .with("feedback", 0.0),
        EffectType::FrequencyShifter => p.with("frequency", 42.0),
        EffectType::StereoWidener => p.with("width", 0.5),
        EffectType::AutoPanner => p.with("frequency", 1.0).with("depth", 1.0),
    };
    p.with("radius", radius)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectZone {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub shape: EffectShape,
    #[serde(flatten)]
    pub transform: Transform,
    /// Parameter edits are expected to be refused by the UI while locked.
    pub is_locked: bool,
    pub is_selected: bool,
    pub effect_params: Params,
    pub grid_id: Option<GridId>,
}

impl EffectZone {
    /// Current `radius` parameter, if set.
    pub fn radius(&self) -> Option<f64> {
        self.effect_params.number("radius")
    }
}

/// Partial update for an effect zone. Selection goes through the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectZoneUpdate {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub shape: Option<EffectShape>,
    /// Patch merged over the current parameters.
    pub effect_params: Option<Params>,
}

#[derive(Debug, Clone)]
pub struct EffectZoneStore {
    zones: BTreeMap<EntityId, EffectZone>,
    default_radius: f64,
}

impl Default for EffectZoneStore {
    fn default() -> Self {
        Self::with_default_radius(3.0)
    }
}

impl EffectZoneStore {
    /// Create an empty store with the default radius.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose new zones start at `default_radius`.
    pub fn with_default_radius(default_radius: f64) -> Self {
        Self {
            zones: BTreeMap::new(),
            default_radius,
        }
    }

    /// Number of zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Look up a zone by id.
    pub fn get(&self, id: EntityId) -> Option<&EffectZone> {
        self.zones.get(&id)
    }

    /// All zones in id order.
    pub fn all(&self) -> impl Iterator<Item = &EffectZone> {
        self.zones.values()
    }

    /// Zones whose back-reference points at `grid_id`.
    pub fn effect_zones_in_grid(&self, grid_id: GridId) -> Vec<&EffectZone> {
        self.zones
            .values()
            .filter(|z| z.grid_id == Some(grid_id))
            .collect()
    }

    /// Create a zone with the type's default parameters and register its global effect.
    pub fn add_effect_zone(
        &mut self,
        effect_type: EffectType,
        position: Vec3,
        shape: EffectShape,
        grid_id: Option<GridId>,
        audio: &mut dyn AudioSink,
    ) -> EntityId {
        let id = EntityId::new();
        let effect_params = default_effect_params(effect_type, self.default_radius);
        audio.send(AudioCommand::CreateGlobalEffect {
            id,
            effect_type,
            position,
        });
        audio.send(AudioCommand::SetEffectZoneRadius {
            id,
            radius: self.default_radius,
        });
        self.zones.insert(
            id,
            EffectZone {
                id,
                effect_type,
                shape,
                transform: Transform::at(position),
                is_locked: false,
                is_selected: false,
                effect_params,
                grid_id,
            },
        );
        tracing::debug!(%id, %effect_type, %shape, ?position, "effect zone added");
        id
    }

    /// Insert a zone built elsewhere (imports), registering its effect.
    pub fn insert_effect_zone(&mut self, zone: EffectZone, audio: &mut dyn AudioSink) {
        audio.send(AudioCommand::CreateGlobalEffect {
            id: zone.id,
            effect_type: zone.effect_type,
            position: zone.transform.position,
        });
        if let Some(radius) = zone.radius() {
            audio.send(AudioCommand::SetEffectZoneRadius { id: zone.id, radius });
        }
        audio.send(AudioCommand::UpdateGlobalEffect {
            id: zone.id,
            params: zone.effect_params.clone(),
        });
        self.zones.insert(zone.id, zone);
    }

    /// Forward position and parameter changes, then merge into the store.
    pub fn update_effect_zone(
        &mut self,
        id: EntityId,
        update: EffectZoneUpdate,
        audio: &mut dyn AudioSink,
    ) -> Result<(), EffectError> {
        let zone = self.zones.get_mut(&id).ok_or(EffectError::NotFound(id))?;

        if let Some(position) = update.position {
            audio.send(AudioCommand::UpdateEffectZonePosition { id, position });
            zone.transform.position = position;
        }
        if let Some(patch) = update.effect_params {
            let merged = zone.effect_params.merged(&patch);
            if let Some(radius) = merged.number("radius") {
                if zone.radius() != Some(radius) {
                    audio.send(AudioCommand::SetEffectZoneRadius { id, radius });
                }
            }
            audio.send(AudioCommand::UpdateGlobalEffect {
                id,
                params: merged.clone(),
            });
            zone.effect_params = merged;
        }
        if let Some(rotation) = update.rotation {
            zone.transform.rotation = rotation;
        }
        if let Some(scale) = update.scale {
            zone.transform.scale = scale;
        }
        if let Some(shape) = update.shape {
            zone.shape = shape;
        }
        Ok(())
    }

    /// Deregister the global effect, then drop the zone.
    pub fn remove_effect_zone(
        &mut self,
        id: EntityId,
        audio: &mut dyn AudioSink,
    ) -> Result<EffectZone, EffectError> {
        if !self.zones.contains_key(&id) {
            return Err(EffectError::NotFound(id));
        }
        audio.send(AudioCommand::RemoveGlobalEffect { id });
        let removed = self.zones.remove(&id).ok_or(EffectError::NotFound(id))?;
        tracing::debug!(%id, "effect zone removed");
        Ok(removed)
    }

    /// Flip `is_locked`. Returns the new value.
    pub fn toggle_lock_effect_zone(&mut self, id: EntityId) -> Result<bool, EffectError> {
        let zone = self.zones.get_mut(&id).ok_or(EffectError::NotFound(id))?;
        zone.is_locked = !zone.is_locked;
        Ok(zone.is_locked)
    }

    /// Ask the audio engine to rebuild every global effect.
    pub fn refresh_all_effects(&self, audio: &mut dyn AudioSink) {
        audio.send(AudioCommand::RefreshAllGlobalEffects);
    }

    /// Set `is_selected` on every zone: true for `keep`, false otherwise.
    pub fn mark_selected(&mut self, keep: Option<EntityId>) {
        for zone in self.zones.values_mut() {
            zone.is_selected = Some(zone.id) == keep;
        }
    }

    /// Re-send position, radius and parameters for every zone.
    pub fn resync(&self, audio: &mut dyn AudioSink) {
        for zone in self.zones.values() {
            audio.send(AudioCommand::UpdateEffectZonePosition {
                id: zone.id,
                position: zone.transform.position,
            });
            if let Some(radius) = zone.radius() {
                audio.send(AudioCommand::SetEffectZoneRadius { id: zone.id, radius });
            }
            audio.send(AudioCommand::UpdateGlobalEffect {
                id: zone.id,
                params: zone.effect_params.clone(),
            });
        }
    }

    /// Deregister every effect and empty the store.
    pub fn clear_all(&mut self, audio: &mut dyn AudioSink) -> usize {
        for id in self.zones.keys() {
            audio.send(AudioCommand::RemoveGlobalEffect { id: *id });
        }
        let count = self.zones.len();
        self.zones.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundscape_audio::Outbox;

    fn store_with_zone(effect_type: EffectType) -> (EffectZoneStore, EntityId, Outbox) {
        let mut store = EffectZoneStore::new();
        let mut outbox = Outbox::new();
        let id = store.add_effect_zone(effect_type, Vec3::ZERO, EffectShape::Sphere, None, &mut outbox);
        outbox.drain();
        (store, id, outbox)
    }

    #[test]
    fn every_effect_default_carries_radius() {
        for t in EffectType::ALL {
            let p = default_effect_params(*t, 4.0);
            assert_eq!(p.number("radius"), Some(4.0), "{t}");
            assert!(p.len() > 2, "{t} has no effect-specific defaults");
        }
    }

    #[test]
    fn family_specific_defaults() {
        let reverb = default_effect_params(EffectType::Reverb, 3.0);
        assert!(reverb.contains("decay") && reverb.contains("preDelay"));
        let delay = default_effect_params(EffectType::FeedbackDelay, 3.0);
        assert!(delay.contains("delayTime") && delay.contains("feedback"));
        let chorus = default_effect_params(EffectType::Chorus, 3.0);
        assert!(chorus.contains("frequency") && chorus.contains("depth"));
    }

    #[test]
    fn add_registers_global_effect() {
        let mut store = EffectZoneStore::with_default_radius(5.0);
        let mut outbox = Outbox::new();
        let id = store.add_effect_zone(
            EffectType::Reverb,
            Vec3::ONE,
            EffectShape::Cube,
            None,
            &mut outbox,
        );
        assert_eq!(outbox.names(), vec!["createGlobalEffect", "setEffectZoneRadius"]);
        let zone = store.get(id).unwrap();
        assert_eq!(zone.radius(), Some(5.0));
        assert_eq!(zone.shape, EffectShape::Cube);
        assert!(!zone.is_locked);
    }

    #[test]
    fn update_forwards_position_radius_and_params() {
        let (mut store, id, mut outbox) = store_with_zone(EffectType::Chorus);
        let update = EffectZoneUpdate {
            position: Some(Vec3::new(1.0, 0.0, 0.0)),
            effect_params: Some(Params::new().with("radius", 8.0).with("depth", 0.2)),
            ..EffectZoneUpdate::default()
        };
        store.update_effect_zone(id, update, &mut outbox).unwrap();
        assert_eq!(
            outbox.names(),
            vec!["updateEffectZonePosition", "setEffectZoneRadius", "updateGlobalEffect"]
        );
        let zone = store.get(id).unwrap();
        assert_eq!(zone.radius(), Some(8.0));
        assert_eq!(zone.effect_params.number("depth"), Some(0.2));
        assert_eq!(zone.effect_params.number("frequency"), Some(1.5));
    }

    #[test]
    fn unchanged_radius_is_not_resent() {
        let (mut store, id, mut outbox) = store_with_zone(EffectType::Tremolo);
        let update = EffectZoneUpdate {
            effect_params: Some(Params::new().with("depth", 0.9)),
            ..EffectZoneUpdate::default()
        };
        store.update_effect_zone(id, update, &mut outbox).unwrap();
        assert_eq!(outbox.names(), vec!["updateGlobalEffect"]);
    }

    #[test]
    fn remove_deregisters_first() {
        let (mut store, id, mut outbox) = store_with_zone(EffectType::Phaser);
        store.remove_effect_zone(id, &mut outbox).unwrap();
        assert_eq!(outbox.names(), vec!["removeGlobalEffect"]);
        assert!(store.is_empty());
        assert_eq!(
            store.remove_effect_zone(id, &mut outbox),
            Err(EffectError::NotFound(id))
        );
    }

    #[test]
    fn lock_toggles() {
        let (mut store, id, _) = store_with_zone(EffectType::Vibrato);
        assert_eq!(store.toggle_lock_effect_zone(id), Ok(true));
        assert_eq!(store.toggle_lock_effect_zone(id), Ok(false));
    }

    #[test]
    fn refresh_emits_single_rebuild() {
        let (store, _, mut outbox) = store_with_zone(EffectType::Reverb);
        store.refresh_all_effects(&mut outbox);
        assert_eq!(outbox.names(), vec!["refreshAllGlobalEffects"]);
    }
}

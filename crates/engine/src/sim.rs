//! Time, streaming and collaborator hooks of the engine.

use crate::facade::{WorldEngine, absorb};
use soundscape_audio::ContextState;
use soundscape_common::{EntityId, GridId};
use soundscape_persist::{GlobalStateSource, PersistOutcome};
use std::collections::BTreeSet;

/// What one [`WorldEngine::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub moved: usize,
    /// Sound objects a mobile object entered range of, with the mobile id.
    pub triggered: Vec<(EntityId, EntityId)>,
}

impl WorldEngine {
    /// Advance the simulation clock by `delta_seconds`, move every active
    /// mobile object and fire sound objects that a mobile just came within
    /// its proximity threshold of.
    ///
    /// Triggers are edge-triggered: a pair fires once on entering range and
    /// again only after leaving it. Percussion-only objects get a noise
    /// attack, everything else a note attack; continuous-mode objects stay
    /// silent.
    pub fn tick(&mut self, delta_seconds: f32) -> TickReport {
        let _span = tracing::info_span!("tick", t = self.clock.seconds()).entered();
        self.clock = self.clock.advanced(delta_seconds as f64);
        let moved = self.mobiles.advance(delta_seconds, self.clock);

        let mut now_in_range = BTreeSet::new();
        for mobile in self.mobiles.all().filter(|m| m.mobile_params.is_active) {
            let threshold = mobile.mobile_params.proximity_threshold;
            for object in self.objects.all() {
                if mobile.transform.position.distance(object.transform.position) <= threshold {
                    now_in_range.insert((mobile.id, object.id));
                }
            }
        }

        let entered: Vec<(EntityId, EntityId)> =
            now_in_range.difference(&self.in_range).copied().collect();
        let mut triggered = Vec::new();
        for (mobile, object) in entered {
            let percussive = self
                .objects
                .get(object)
                .is_some_and(|o| o.object_type.is_percussion_only());
            let fired = if percussive {
                self.objects.trigger_object_percussion(object, &mut self.audio)
            } else {
                self.objects.trigger_object_note(object, &mut self.audio)
            };
            if absorb("proximity_trigger", fired).unwrap_or(false) {
                tracing::debug!(%mobile, %object, "proximity trigger");
                triggered.push((object, mobile));
            }
        }
        self.in_range = now_in_range;

        tracing::trace!(moved = moved.len(), triggered = triggered.len(), "tick complete");
        TickReport {
            moved: moved.len(),
            triggered,
        }
    }

    /// Plan and apply one budgeted stream pass around the current chunk.
    /// Returns `(loaded, unloaded)`.
    pub fn stream_around_current(&mut self) -> (usize, usize) {
        let _span = tracing::info_span!("stream_around_current").entered();
        let plan = self.grids.plan_stream(self.config.stream_budget());
        self.grids.apply_stream_plan(&plan)
    }

    /// Make sure the audio context is running, starting it when needed.
    /// Failures are logged only.
    pub fn ensure_audio_context(&mut self) -> ContextState {
        match self.audio.ensure_context() {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "audio context could not be started");
                self.audio.context_state()
            }
        }
    }

    /// Pull the shared global chunk from `source`, load its chunk and add
    /// every entity not already present. Entities without a grid are placed
    /// in the snapshot's chunk. Succeeds with the number of entities added.
    pub fn load_global_state(&mut self, source: &mut dyn GlobalStateSource) -> PersistOutcome<usize> {
        let state = match source.get_global_world_state() {
            PersistOutcome::Success(state) => state,
            PersistOutcome::RetryableError(e) => {
                tracing::warn!(error = %e, "global state temporarily unavailable");
                return PersistOutcome::RetryableError(e);
            }
            PersistOutcome::FatalError(e) => {
                tracing::warn!(error = %e, "global state unusable");
                return PersistOutcome::FatalError(e);
            }
        };

        tracing::debug!(offered = state.entity_count(), coordinates = %state.coordinates, "global state received");
        let chunk = GridId::Chunk(state.coordinates);
        self.grids.load_grid(state.coordinates);
        let mut added = 0;

        for mut object in state.objects {
            if self.objects.get(object.id).is_some() {
                continue;
            }
            object.is_selected = false;
            object.grid_id.get_or_insert(chunk);
            self.objects.insert_object(object, &mut self.audio);
            added += 1;
        }
        for mut mobile in state.mobile_objects {
            if self.mobiles.find_mobile_object_by_id(mobile.id).is_some() {
                continue;
            }
            mobile.is_selected = false;
            mobile.grid_id.get_or_insert(chunk);
            self.mobiles.insert_mobile_object(mobile);
            added += 1;
        }
        for mut zone in state.effect_zones {
            if self.effects.get(zone.id).is_some() {
                continue;
            }
            zone.is_selected = false;
            zone.grid_id.get_or_insert(chunk);
            self.effects.insert_effect_zone(zone, &mut self.audio);
            added += 1;
        }

        tracing::info!(added, coordinates = %state.coordinates, "global state loaded");
        PersistOutcome::Success(added)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::facade::WorldEngine;
    use soundscape_audio::{ContextState, RecordingAudioEngine};
    use soundscape_common::{
        EntityId, GridCoord, GridId, MovementType, SoundObjectType, Transform, Vec3,
    };
    use soundscape_kernel::{MobileParamsUpdate, SoundObject, default_audio_params};
    use soundscape_persist::{GlobalStateSource, GlobalWorldState, PersistOutcome};

    fn engine() -> (WorldEngine, RecordingAudioEngine) {
        let recorder = RecordingAudioEngine::new();
        let config = EngineConfig {
            rng_seed: Some(9),
            ..EngineConfig::default()
        };
        (WorldEngine::new(config, Box::new(recorder.clone())), recorder)
    }

    fn count(recorder: &RecordingAudioEngine, name: &str) -> usize {
        recorder.received().iter().filter(|c| c.name() == name).count()
    }

    #[test]
    fn tick_advances_clock_and_moves_active_mobiles() {
        let (mut engine, _) = engine();
        let moving = engine.add_mobile_object(Vec3::ZERO, MovementType::Linear);
        let parked = engine.add_mobile_object(Vec3::ZERO, MovementType::Linear);
        engine.toggle_mobile_object(parked);

        let report = engine.tick(0.5);
        assert_eq!(report.moved, 1);
        assert_eq!(engine.sim_time().seconds(), 0.5);
        assert_eq!(
            engine.find_mobile_object_by_id(moving).unwrap().transform.position,
            Vec3::new(0.5, 0.0, 0.0)
        );
        assert_eq!(
            engine.find_mobile_object_by_id(parked).unwrap().transform.position,
            Vec3::ZERO
        );
    }

    #[test]
    fn proximity_triggers_once_on_entry() {
        let (mut engine, recorder) = engine();
        let object = engine.add_object(SoundObjectType::Cube, Vec3::new(1.0, 0.0, 0.0));
        let mobile = engine.add_mobile_object(Vec3::ZERO, MovementType::Linear);

        let first = engine.tick(0.1);
        assert_eq!(first.triggered, vec![(object, mobile)]);
        engine.tick(0.1);
        assert_eq!(count(&recorder, "triggerNoteAttack"), 1);

        // Walk out of range, then jump back in.
        for _ in 0..40 {
            engine.tick(0.1);
        }
        assert!(engine.update_mobile_object_position(mobile, Vec3::new(1.2, 0.0, 0.0)));
        engine.tick(0.0);
        assert_eq!(count(&recorder, "triggerNoteAttack"), 2);
    }

    #[test]
    fn percussive_objects_get_noise_attacks() {
        let (mut engine, recorder) = engine();
        engine.add_object(SoundObjectType::Torus, Vec3::new(0.5, 0.0, 0.0));
        engine.add_mobile_object(Vec3::ZERO, MovementType::Linear);
        engine.tick(0.1);
        assert_eq!(count(&recorder, "triggerNoiseAttack"), 1);
        assert_eq!(count(&recorder, "triggerNoteAttack"), 0);
    }

    #[test]
    fn continuous_objects_are_not_triggered_by_proximity() {
        let (mut engine, recorder) = engine();
        let object = engine.add_object(SoundObjectType::Sphere, Vec3::new(0.5, 0.0, 0.0));
        engine.toggle_object_audio(object, Some(true));
        engine.add_mobile_object(Vec3::ZERO, MovementType::Linear);
        assert!(engine.tick(0.1).triggered.is_empty());
        assert_eq!(count(&recorder, "triggerNoteAttack"), 0);
    }

    #[test]
    fn identical_mobiles_stay_in_phase() {
        let (mut engine, _) = engine();
        let a = engine.add_mobile_object(Vec3::ONE, MovementType::Figure8);
        let b = engine.add_mobile_object(Vec3::ONE, MovementType::Figure8);
        let radius = MobileParamsUpdate {
            radius: Some(3.0),
            ..MobileParamsUpdate::default()
        };
        engine.update_mobile_object(a, &radius);
        engine.update_mobile_object(b, &radius);
        for _ in 0..25 {
            engine.tick(1.0 / 60.0);
        }
        assert_eq!(
            engine.find_mobile_object_by_id(a).unwrap().transform.position,
            engine.find_mobile_object_by_id(b).unwrap().transform.position
        );
    }

    #[test]
    fn stream_pass_respects_config_budget() {
        let recorder = RecordingAudioEngine::new();
        let config = EngineConfig {
            stream_load_budget: 5,
            ..EngineConfig::default()
        };
        let mut engine = WorldEngine::new(config, Box::new(recorder));
        assert_eq!(engine.stream_around_current(), (5, 0));
        engine.move_to_grid(GridCoord::new(10, 0, 0));
        let (_, unloaded) = engine.stream_around_current();
        assert_eq!(unloaded, 5);
        assert!(engine.grid_store().contains(GridId::ORIGIN));
    }

    #[test]
    fn audio_context_is_started_when_suspended() {
        let recorder = RecordingAudioEngine::new().with_context_state(ContextState::Suspended);
        let mut engine = WorldEngine::new(EngineConfig::default(), Box::new(recorder));
        assert_eq!(engine.ensure_audio_context(), ContextState::Running);
    }

    #[test]
    fn audio_context_failure_is_absorbed() {
        let recorder = RecordingAudioEngine::new()
            .with_context_state(ContextState::Suspended)
            .with_failing_start();
        let mut engine = WorldEngine::new(EngineConfig::default(), Box::new(recorder));
        assert_eq!(engine.ensure_audio_context(), ContextState::Suspended);
    }

    struct Canned(PersistOutcome<GlobalWorldState>);

    impl GlobalStateSource for Canned {
        fn get_global_world_state(&mut self) -> PersistOutcome<GlobalWorldState> {
            self.0.clone()
        }
    }

    fn global_object(position: Vec3) -> SoundObject {
        SoundObject {
            id: EntityId::new(),
            object_type: SoundObjectType::Cylinder,
            transform: Transform::at(position),
            audio_params: default_audio_params(SoundObjectType::Cylinder),
            audio_enabled: false,
            is_selected: true,
            grid_id: None,
        }
    }

    #[test]
    fn global_state_is_merged_once() {
        let (mut engine, recorder) = engine();
        let coords = GridCoord::new(0, 1, 0);
        let mut source = Canned(PersistOutcome::Success(GlobalWorldState {
            coordinates: coords,
            objects: vec![global_object(Vec3::ZERO), global_object(Vec3::ONE)],
            ..GlobalWorldState::default()
        }));

        assert_eq!(engine.load_global_state(&mut source), PersistOutcome::Success(2));
        assert_eq!(engine.load_global_state(&mut source), PersistOutcome::Success(0));

        let contents = engine.grid_contents(GridId::Chunk(coords));
        assert_eq!(contents.objects.len(), 2);
        assert!(contents.objects.iter().all(|o| !o.is_selected));
        assert_eq!(count(&recorder, "createSoundSource"), 2);
    }

    #[test]
    fn imported_percussive_object_stays_triggerable() {
        let (mut engine, recorder) = engine();
        let plane = SoundObject {
            object_type: SoundObjectType::Plane,
            audio_params: default_audio_params(SoundObjectType::Plane),
            audio_enabled: true,
            ..global_object(Vec3::ZERO)
        };
        let id = plane.id;
        let mut source = Canned(PersistOutcome::Success(GlobalWorldState {
            objects: vec![plane],
            ..GlobalWorldState::default()
        }));

        assert_eq!(engine.load_global_state(&mut source), PersistOutcome::Success(1));
        assert!(!engine.find_object_by_id(id).unwrap().audio_enabled);
        assert_eq!(count(&recorder, "startContinuousSound"), 0);
        assert!(engine.trigger_object_percussion(id));
        assert_eq!(count(&recorder, "triggerNoiseAttack"), 1);
    }

    #[test]
    fn global_state_errors_pass_through() {
        let (mut engine, _) = engine();
        let mut retry = Canned(PersistOutcome::RetryableError("offline".into()));
        assert_eq!(
            engine.load_global_state(&mut retry),
            PersistOutcome::RetryableError("offline".into())
        );
        let mut fatal = Canned(PersistOutcome::FatalError("corrupt".into()));
        assert!(matches!(
            engine.load_global_state(&mut fatal),
            PersistOutcome::FatalError(_)
        ));
        assert_eq!(engine.get_system_stats().object_count, 0);
        assert_eq!(engine.grid_store().len(), 1);
    }
}

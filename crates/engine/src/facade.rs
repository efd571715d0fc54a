use crate::config::EngineConfig;
use crate::stats::SystemStats;
use serde::Serialize;
use soundscape_audio::{AudioBridge, AudioEngine, AudioStats};
use soundscape_author::SelectionState;
use soundscape_common::{
    EffectShape, EffectType, EntityId, GridCoord, GridId, MovementType, SoundObjectType,
    TransformMode, Vec3,
};
use soundscape_kernel::{
    EffectZone, EffectZoneStore, EffectZoneUpdate, MobileObject, MobileObjectStore,
    MobileParamsUpdate, SimTime, SoundObject, SoundObjectStore, SoundObjectUpdate,
    calculate_next_position,
};
use soundscape_persist::{WorldId, WorldInfo, WorldManager};
use soundscape_stream::{Grid, GridStore, GridUpdate};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Log a rejected operation and turn it into `None`.
pub(crate) fn absorb<T, E: Display>(operation: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(operation, error = %err, "operation rejected");
            None
        }
    }
}

/// Entities whose back-reference points at one grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridContents<'a> {
    pub objects: Vec<&'a SoundObject>,
    pub mobile_objects: Vec<&'a MobileObject>,
    pub effect_zones: Vec<&'a EffectZone>,
}

impl GridContents<'_> {
    pub fn len(&self) -> usize {
        self.objects.len() + self.mobile_objects.len() + self.effect_zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned snapshot of everything the editor shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub current_world: WorldId,
    pub worlds: Vec<WorldInfo>,
    pub current_grid_coordinates: GridCoord,
    pub active_grid: Option<GridId>,
    pub selected_grid: Option<GridId>,
    pub grids: Vec<Grid>,
    pub objects: Vec<SoundObject>,
    pub mobile_objects: Vec<MobileObject>,
    pub effect_zones: Vec<EffectZone>,
    pub selection: SelectionState,
    pub sim_time: f64,
}

/// The single coordinating surface over every store.
///
/// All mutators absorb store errors: they log a warning and report failure
/// through `bool`/`Option` instead of propagating.
#[derive(Debug)]
pub struct WorldEngine {
    pub(crate) config: EngineConfig,
    pub(crate) audio: AudioBridge,
    pub(crate) grids: GridStore,
    pub(crate) objects: SoundObjectStore,
    pub(crate) mobiles: MobileObjectStore,
    pub(crate) effects: EffectZoneStore,
    pub(crate) selection: SelectionState,
    pub(crate) worlds: WorldManager,
    pub(crate) clock: SimTime,
    /// `(mobile, object)` pairs currently within proximity range.
    pub(crate) in_range: BTreeSet<(EntityId, EntityId)>,
}

impl WorldEngine {
    /// Build an engine from `config`, dispatching audio to `engine`.
    pub fn new(config: EngineConfig, engine: Box<dyn AudioEngine>) -> Self {
        let seed = config
            .rng_seed
            .unwrap_or_else(|| uuid::Uuid::new_v4().as_u64_pair().0);
        tracing::info!(
            grid_size = config.grid_size,
            render_distance = config.render_distance,
            seed,
            "world engine initialized"
        );
        Self {
            grids: GridStore::new(config.grid_config()),
            objects: SoundObjectStore::new(),
            mobiles: MobileObjectStore::with_seed(seed),
            effects: EffectZoneStore::with_default_radius(config.default_effect_radius),
            selection: SelectionState::new(),
            worlds: WorldManager::new(),
            audio: AudioBridge::new(engine),
            clock: SimTime::ZERO,
            in_range: BTreeSet::new(),
            config,
        }
    }

    /// Settings the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of the grid store.
    pub fn grid_store(&self) -> &GridStore {
        &self.grids
    }

    /// Current selection and transform mode.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Read-only view of the world registry.
    pub fn world_manager(&self) -> &WorldManager {
        &self.worlds
    }

    /// Audio dispatch counters.
    pub fn audio_stats(&self) -> AudioStats {
        self.audio.stats()
    }

    /// Current simulation clock.
    pub fn sim_time(&self) -> SimTime {
        self.clock
    }

    fn insertion_grid(&self) -> Option<GridId> {
        self.grids.active_grid()
    }

    // --- grids ---

    /// Canonical `"x,y,z"` key for a chunk.
    pub fn get_grid_key(coords: GridCoord) -> String {
        GridStore::get_grid_key(coords)
    }

    /// Load a chunk. Returns false if it was already present.
    pub fn load_grid(&mut self, coords: GridCoord) -> bool {
        self.grids.load_grid(coords)
    }

    /// Entities placed in an unloaded chunk stay in their stores and
    /// reattach when the chunk is loaded again.
    pub fn unload_grid(&mut self, coords: GridCoord) -> bool {
        absorb("unload_grid", self.grids.unload_grid(coords)).is_some()
    }

    /// Make `coords` the viewer's chunk, loading it if needed.
    pub fn move_to_grid(&mut self, coords: GridCoord) {
        self.grids.move_to_grid(coords);
    }

    /// The viewer's chunk.
    pub fn current_grid_coordinates(&self) -> GridCoord {
        self.grids.current_grid_coordinates()
    }

    /// Chunks within render distance of the viewer's chunk.
    pub fn get_adjacent_grids(&self) -> Vec<GridCoord> {
        self.grids.get_adjacent_grids()
    }

    /// Create a free-form grid at `position` with edge length `size`.
    pub fn create_grid(&mut self, position: Vec3, size: f32) -> Option<GridId> {
        absorb("create_grid", self.grids.create_grid(position, size))
    }

    /// Highlight a grid. Independent of the active grid and of entity
    /// selection.
    pub fn select_grid(&mut self, id: Option<GridId>) -> bool {
        absorb("select_grid", self.grids.select_grid(id)).is_some()
    }

    /// Choose the grid that receives new entities.
    pub fn set_active_grid(&mut self, id: Option<GridId>) -> bool {
        absorb("set_active_grid", self.grids.set_active_grid(id)).is_some()
    }

    /// Grid that receives new entities.
    pub fn active_grid(&self) -> Option<GridId> {
        self.grids.active_grid()
    }

    /// Apply a partial grid update.
    pub fn update_grid(&mut self, id: GridId, update: GridUpdate) -> bool {
        absorb("update_grid", self.grids.update_grid(id, update)).is_some()
    }

    /// Delete a grid together with every entity placed in it.
    pub fn delete_grid(&mut self, id: GridId) -> bool {
        if absorb("delete_grid", self.grids.delete_grid(id)).is_none() {
            return false;
        }
        let objects: Vec<EntityId> = self.objects.objects_in_grid(id).iter().map(|o| o.id).collect();
        let mobiles: Vec<EntityId> = self
            .mobiles
            .mobile_objects_in_grid(id)
            .iter()
            .map(|m| m.id)
            .collect();
        let zones: Vec<EntityId> = self
            .effects
            .effect_zones_in_grid(id)
            .iter()
            .map(|z| z.id)
            .collect();
        for object in objects {
            self.remove_object(object);
        }
        for mobile in mobiles {
            self.remove_mobile_object(mobile);
        }
        for zone in zones {
            self.remove_effect_zone(zone);
        }
        true
    }

    /// Change a grid's edge length.
    pub fn resize_grid(&mut self, id: GridId, size: f32) -> bool {
        absorb("resize_grid", self.grids.resize_grid(id, size)).is_some()
    }

    /// Move a grid.
    pub fn move_grid(&mut self, id: GridId, position: Vec3) -> bool {
        absorb("move_grid", self.grids.move_grid(id, position)).is_some()
    }

    /// Rotate a grid.
    pub fn rotate_grid(&mut self, id: GridId, rotation: Vec3) -> bool {
        absorb("rotate_grid", self.grids.rotate_grid(id, rotation)).is_some()
    }

    /// Scale a grid.
    pub fn scale_grid(&mut self, id: GridId, scale: Vec3) -> bool {
        absorb("scale_grid", self.grids.scale_grid(id, scale)).is_some()
    }

    /// Every entity placed in grid `id`.
    pub fn grid_contents(&self, id: GridId) -> GridContents<'_> {
        GridContents {
            objects: self.objects.objects_in_grid(id),
            mobile_objects: self.mobiles.mobile_objects_in_grid(id),
            effect_zones: self.effects.effect_zones_in_grid(id),
        }
    }

    // --- sound objects ---

    /// Place an object in the active grid.
    pub fn add_object(&mut self, object_type: SoundObjectType, position: Vec3) -> EntityId {
        let grid = self.insertion_grid();
        self.objects
            .add_object(object_type, position, grid, &mut self.audio)
    }

    /// Merge a partial update into a sound object.
    pub fn update_object(&mut self, id: EntityId, update: SoundObjectUpdate) -> bool {
        absorb(
            "update_object",
            self.objects.update_object(id, update, &mut self.audio),
        )
        .is_some()
    }

    /// Deregister and remove a sound object, dropping it from the selection.
    pub fn remove_object(&mut self, id: EntityId) -> bool {
        let removed = absorb("remove_object", self.objects.remove_object(id, &mut self.audio));
        if removed.is_some() {
            self.forget_entity(id);
        }
        removed.is_some()
    }

    /// Returns the resulting continuous-mode state.
    pub fn toggle_object_audio(&mut self, id: EntityId, force: Option<bool>) -> Option<bool> {
        absorb(
            "toggle_object_audio",
            self.objects.toggle_object_audio(id, force, &mut self.audio),
        )
    }

    /// Fire a note on an object. False if unknown or in continuous mode.
    pub fn trigger_object_note(&mut self, id: EntityId) -> bool {
        absorb(
            "trigger_object_note",
            self.objects.trigger_object_note(id, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Fire a noise hit on an object. False if unknown or in continuous mode.
    pub fn trigger_object_percussion(&mut self, id: EntityId) -> bool {
        absorb(
            "trigger_object_percussion",
            self.objects.trigger_object_percussion(id, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Fire an attack/release on an object. False if unknown or in continuous mode.
    pub fn trigger_object_attack_release(&mut self, id: EntityId) -> bool {
        absorb(
            "trigger_object_attack_release",
            self.objects.trigger_object_attack_release(id, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Open an object's gate. False if unknown or in continuous mode.
    pub fn start_object_gate(&mut self, id: EntityId) -> bool {
        absorb(
            "start_object_gate",
            self.objects.start_object_gate(id, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Close an object's gate. False if unknown or in continuous mode.
    pub fn stop_object_gate(&mut self, id: EntityId) -> bool {
        absorb(
            "stop_object_gate",
            self.objects.stop_object_gate(id, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Set the chord from a JSON array typed by the user. Malformed text is ignored.
    pub fn set_object_chord_from_text(&mut self, id: EntityId, text: &str) -> bool {
        absorb(
            "set_object_chord_from_text",
            self.objects.set_chord_from_text(id, text, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Set the sample URL from a JSON string typed by the user. Malformed text is ignored.
    pub fn set_object_sample_url_from_text(&mut self, id: EntityId, text: &str) -> bool {
        absorb(
            "set_object_sample_url_from_text",
            self.objects.set_sample_url_from_text(id, text, &mut self.audio),
        )
        .unwrap_or(false)
    }

    /// Deregister and drop every sound object.
    pub fn clear_all_objects(&mut self) -> usize {
        let selected = self.selection.selected_entity_id();
        if selected.is_some_and(|id| self.objects.get(id).is_some()) {
            self.selection.select_entity(None);
        }
        self.in_range.clear();
        self.objects.clear_all_objects(&mut self.audio)
    }

    /// Look up a sound object by id.
    pub fn find_object_by_id(&self, id: EntityId) -> Option<&SoundObject> {
        self.objects.get(id)
    }

    // --- mobile objects ---

    /// Place a mobile object in the active grid.
    pub fn add_mobile_object(&mut self, position: Vec3, movement_type: MovementType) -> EntityId {
        let grid = self.insertion_grid();
        self.mobiles.add_mobile_object(position, movement_type, grid)
    }

    /// Look up a mobile object by id.
    pub fn find_mobile_object_by_id(&self, id: EntityId) -> Option<&MobileObject> {
        self.mobiles.find_mobile_object_by_id(id)
    }

    /// Teleport a mobile object.
    pub fn update_mobile_object_position(&mut self, id: EntityId, position: Vec3) -> bool {
        absorb(
            "update_mobile_object_position",
            self.mobiles.update_mobile_object_position(id, position),
        )
        .is_some()
    }

    /// Merge and validate a mobile params update.
    pub fn update_mobile_object(&mut self, id: EntityId, update: &MobileParamsUpdate) -> bool {
        absorb(
            "update_mobile_object",
            self.mobiles.update_mobile_params(id, update),
        )
        .is_some()
    }

    /// Flip `is_active`. Returns the new value.
    pub fn toggle_mobile_object(&mut self, id: EntityId) -> Option<bool> {
        absorb("toggle_mobile_object", self.mobiles.toggle_active(id))
    }

    /// Remove a mobile object, dropping it from the selection.
    pub fn remove_mobile_object(&mut self, id: EntityId) -> bool {
        let removed = absorb("remove_mobile_object", self.mobiles.remove_mobile_object(id));
        if removed.is_some() {
            self.forget_entity(id);
        }
        removed.is_some()
    }

    /// Where `id` would be after `delta_time` at the current clock, without
    /// moving it.
    pub fn calculate_next_position(&self, id: EntityId, delta_time: f32) -> Option<Vec3> {
        self.mobiles
            .find_mobile_object_by_id(id)
            .map(|m| calculate_next_position(m, delta_time, self.clock))
    }

    // --- effect zones ---

    /// Place an effect zone in the active grid.
    pub fn add_effect_zone(
        &mut self,
        effect_type: EffectType,
        position: Vec3,
        shape: EffectShape,
    ) -> EntityId {
        let grid = self.insertion_grid();
        self.effects
            .add_effect_zone(effect_type, position, shape, grid, &mut self.audio)
    }

    /// Look up an effect zone by id.
    pub fn find_effect_zone_by_id(&self, id: EntityId) -> Option<&EffectZone> {
        self.effects.get(id)
    }

    /// Merge a partial update into an effect zone.
    pub fn update_effect_zone(&mut self, id: EntityId, update: EffectZoneUpdate) -> bool {
        absorb(
            "update_effect_zone",
            self.effects.update_effect_zone(id, update, &mut self.audio),
        )
        .is_some()
    }

    /// Deregister and remove an effect zone, dropping it from the selection.
    pub fn remove_effect_zone(&mut self, id: EntityId) -> bool {
        let removed = absorb(
            "remove_effect_zone",
            self.effects.remove_effect_zone(id, &mut self.audio),
        );
        if removed.is_some() {
            self.forget_entity(id);
        }
        removed.is_some()
    }

    /// Flip a zone's lock. Returns the new value.
    pub fn toggle_lock_effect_zone(&mut self, id: EntityId) -> Option<bool> {
        absorb(
            "toggle_lock_effect_zone",
            self.effects.toggle_lock_effect_zone(id),
        )
    }

    /// Ask the audio engine to rebuild every global effect.
    pub fn refresh_all_effects(&mut self) {
        self.effects.refresh_all_effects(&mut self.audio);
    }

    // --- selection ---

    fn entity_exists(&self, id: EntityId) -> bool {
        self.objects.get(id).is_some()
            || self.mobiles.find_mobile_object_by_id(id).is_some()
            || self.effects.get(id).is_some()
    }

    /// Select one entity of any kind (or none). Afterwards exactly the chosen
    /// entity carries `is_selected` across every store.
    pub fn select_entity(&mut self, id: Option<EntityId>) -> bool {
        if let Some(id) = id {
            if !self.entity_exists(id) {
                tracing::warn!(%id, "cannot select unknown entity");
                return false;
            }
        }
        self.selection.select_entity(id);
        self.apply_selection_flags();
        true
    }

    /// Currently selected entity.
    pub fn selected_entity_id(&self) -> Option<EntityId> {
        self.selection.selected_entity_id()
    }

    /// Switch gizmo mode.
    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        self.selection.set_transform_mode(mode);
    }

    /// Active gizmo mode.
    pub fn transform_mode(&self) -> TransformMode {
        self.selection.transform_mode()
    }

    fn apply_selection_flags(&mut self) {
        let keep = self.selection.selected_entity_id();
        self.objects.mark_selected(keep);
        self.mobiles.mark_selected(keep);
        self.effects.mark_selected(keep);
    }

    fn forget_entity(&mut self, id: EntityId) {
        self.selection.forget(id);
        self.in_range.retain(|(m, o)| *m != id && *o != id);
    }

    // --- worlds ---

    /// Register a new world.
    pub fn create_world(&mut self, name: &str) -> Option<WorldId> {
        absorb("create_world", self.worlds.create_world(name))
    }

    /// Make `id` the current world.
    pub fn switch_world(&mut self, id: &WorldId) -> bool {
        absorb("switch_world", self.worlds.switch_world(id)).is_some()
    }

    /// Delete a world. The default world is refused.
    pub fn delete_world(&mut self, id: &WorldId) -> bool {
        absorb("delete_world", self.worlds.delete_world(id)).is_some()
    }

    /// Rename a world.
    pub fn rename_world(&mut self, id: &WorldId, name: &str) -> bool {
        absorb("rename_world", self.worlds.rename_world(id, name)).is_some()
    }

    /// Copy a world under a `(copy)` name.
    pub fn duplicate_world(&mut self, id: &WorldId) -> Option<WorldId> {
        absorb("duplicate_world", self.worlds.duplicate_world(id))
    }

    /// JSON export of one world.
    pub fn export_world(&self, id: &WorldId) -> Option<String> {
        absorb("export_world", self.worlds.export_world(id))
    }

    /// Import a world export under a fresh id.
    pub fn import_world(&mut self, json: &str) -> Option<WorldId> {
        absorb("import_world", self.worlds.import_world(json))
    }

    /// Id of the world being edited.
    pub fn current_world_id(&self) -> &WorldId {
        self.worlds.current_world_id()
    }

    // --- aggregate ---

    /// Owned snapshot of every store for the editor.
    pub fn get_current_state(&self) -> EngineState {
        EngineState {
            current_world: self.worlds.current_world_id().clone(),
            worlds: self.worlds.worlds().to_vec(),
            current_grid_coordinates: self.grids.current_grid_coordinates(),
            active_grid: self.grids.active_grid(),
            selected_grid: self.grids.selected_grid(),
            grids: self.grids.grids().cloned().collect(),
            objects: self.objects.all().cloned().collect(),
            mobile_objects: self.mobiles.all().cloned().collect(),
            effect_zones: self.effects.all().cloned().collect(),
            selection: self.selection,
            sim_time: self.clock.seconds(),
        }
    }

    /// Aggregate counters across every store.
    pub fn get_system_stats(&self) -> SystemStats {
        SystemStats {
            world_count: self.worlds.len(),
            current_world: self
                .worlds
                .current_world()
                .map(|w| w.name.clone())
                .unwrap_or_default(),
            grid_count: self.grids.len(),
            loaded_grid_count: self.grids.loaded_count(),
            current_grid: self.grids.current_grid_coordinates(),
            object_count: self.objects.len(),
            continuous_object_count: self.objects.all().filter(|o| o.audio_enabled).count(),
            mobile_object_count: self.mobiles.len(),
            active_mobile_count: self
                .mobiles
                .all()
                .filter(|m| m.mobile_params.is_active)
                .count(),
            effect_zone_count: self.effects.len(),
            locked_effect_zone_count: self.effects.all().filter(|z| z.is_locked).count(),
            selected_entity: self.selection.selected_entity_id(),
            transform_mode: self.selection.transform_mode(),
            sim_time: self.clock.seconds(),
            audio: self.audio.stats(),
            audio_context: self.audio.context_state(),
        }
    }

    /// Tear down every store and manager, deregistering all voices and
    /// effects first.
    pub fn clear_all_data(&mut self) {
        let objects = self.objects.clear_all_objects(&mut self.audio);
        let zones = self.effects.clear_all(&mut self.audio);
        let mobiles = self.mobiles.clear();
        self.grids.reset();
        self.selection.reset();
        self.worlds.reset();
        self.clock = SimTime::ZERO;
        self.in_range.clear();
        tracing::info!(objects, mobiles, zones, "cleared all data");
    }

    /// Re-push every voice and effect to the audio engine and re-derive the
    /// `is_selected` flags from the selection state.
    pub fn sync_all_components(&mut self) {
        if let Some(id) = self.selection.selected_entity_id() {
            if !self.entity_exists(id) {
                self.selection.select_entity(None);
            }
        }
        self.apply_selection_flags();
        self.objects.resync(&mut self.audio);
        self.effects.resync(&mut self.audio);
        self.effects.refresh_all_effects(&mut self.audio);
        tracing::debug!("components resynced");
    }
}

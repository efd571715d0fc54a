use soundscape_audio::{AudioStats, ContextState};
use soundscape_common::{EntityId, GridCoord, TransformMode};
use std::fmt;

/// Aggregate counters across every store.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub world_count: usize,
    pub current_world: String,
    pub grid_count: usize,
    pub loaded_grid_count: usize,
    pub current_grid: GridCoord,
    pub object_count: usize,
    pub continuous_object_count: usize,
    pub mobile_object_count: usize,
    pub active_mobile_count: usize,
    pub effect_zone_count: usize,
    pub locked_effect_zone_count: usize,
    pub selected_entity: Option<EntityId>,
    pub transform_mode: TransformMode,
    pub sim_time: f64,
    pub audio: AudioStats,
    pub audio_context: ContextState,
}

impl SystemStats {
    pub fn total_entities(&self) -> usize {
        self.object_count + self.mobile_object_count + self.effect_zone_count
    }
}

impl fmt::Display for SystemStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "world:        {} ({} total)", self.current_world, self.world_count)?;
        writeln!(
            f,
            "grids:        {} ({} loaded), current {}",
            self.grid_count, self.loaded_grid_count, self.current_grid
        )?;
        writeln!(
            f,
            "objects:      {} ({} continuous)",
            self.object_count, self.continuous_object_count
        )?;
        writeln!(
            f,
            "mobiles:      {} ({} active)",
            self.mobile_object_count, self.active_mobile_count
        )?;
        writeln!(
            f,
            "effect zones: {} ({} locked)",
            self.effect_zone_count, self.locked_effect_zone_count
        )?;
        match self.selected_entity {
            Some(id) => writeln!(f, "selection:    {id} [{}]", self.transform_mode)?,
            None => writeln!(f, "selection:    none [{}]", self.transform_mode)?,
        }
        writeln!(f, "sim time:     {:.3}s", self.sim_time)?;
        write!(
            f,
            "audio:        {} dispatched, {} failed, context {:?}",
            self.audio.dispatched, self.audio.failures, self.audio_context
        )
    }
}

use crate::grid::GridStore;
use soundscape_common::{GridCoord, GridId};

/// Per-call limits on how many chunks a stream pass may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamBudget {
    pub load: usize,
    pub unload: usize,
}

impl Default for StreamBudget {
    fn default() -> Self {
        Self { load: 8, unload: 8 }
    }
}

/// Chunks a stream pass wants to bring in and drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamPlan {
    pub to_load: Vec<GridCoord>,
    pub to_unload: Vec<GridCoord>,
}

impl StreamPlan {
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty() && self.to_unload.is_empty()
    }
}

impl GridStore {
    /// Work out which chunks to load around the current chunk and which
    /// chunk-addressed grids fell out of render distance.
    ///
    /// Custom grids and the origin are never unload candidates. Both lists
    /// are truncated to the budget, nearest-first for loads.
    pub fn plan_stream(&self, budget: StreamBudget) -> StreamPlan {
        let _span = tracing::debug_span!("plan_stream").entered();
        let current = self.current_grid_coordinates();
        let distance = self.config().render_distance.max(0) as u64;

        let mut wanted = self.get_adjacent_grids();
        wanted.push(current);
        wanted.retain(|c| !self.contains(GridId::Chunk(*c)));
        wanted.sort_by_key(|c| c.chebyshev(current));
        wanted.truncate(budget.load);

        let to_unload: Vec<GridCoord> = self
            .grids()
            .filter(|g| matches!(g.id, GridId::Chunk(_)) && g.is_loaded)
            .map(|g| g.coordinates)
            .filter(|c| !c.is_origin() && c.chebyshev(current) > distance)
            .take(budget.unload)
            .collect();

        tracing::trace!(
            load = wanted.len(),
            unload = to_unload.len(),
            "stream plan ready"
        );
        StreamPlan {
            to_load: wanted,
            to_unload,
        }
    }

    /// Apply a plan. Returns `(loaded, unloaded)` counts.
    pub fn apply_stream_plan(&mut self, plan: &StreamPlan) -> (usize, usize) {
        let loaded = plan.to_load.iter().filter(|c| self.load_grid(**c)).count();
        let unloaded = plan
            .to_unload
            .iter()
            .filter(|c| self.unload_grid(**c).is_ok())
            .count();
        tracing::debug!(loaded, unloaded, total = self.len(), "stream plan applied");
        (loaded, unloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use soundscape_common::Vec3;

    #[test]
    fn fresh_store_wants_all_neighbours() {
        let store = GridStore::default();
        let plan = store.plan_stream(StreamBudget { load: 100, unload: 100 });
        assert_eq!(plan.to_load.len(), 26);
        assert!(plan.to_unload.is_empty());
    }

    #[test]
    fn load_budget_is_respected() {
        let store = GridStore::default();
        let plan = store.plan_stream(StreamBudget { load: 3, unload: 0 });
        assert_eq!(plan.to_load.len(), 3);
    }

    #[test]
    fn current_chunk_is_loaded_first() {
        let mut store = GridStore::default();
        store.move_to_grid(GridCoord::new(4, 0, 0));
        store.unload_grid(GridCoord::new(4, 0, 0)).unwrap();
        let plan = store.plan_stream(StreamBudget { load: 1, unload: 0 });
        assert_eq!(plan.to_load, vec![GridCoord::new(4, 0, 0)]);
    }

    #[test]
    fn far_chunks_unload_but_origin_and_custom_stay() {
        let mut store = GridStore::new(GridConfig::default());
        let custom = store.create_grid(Vec3::new(500.0, 0.0, 0.0), 10.0).unwrap();
        store.load_grid(GridCoord::new(1, 0, 0));
        store.move_to_grid(GridCoord::new(10, 0, 0));

        let plan = store.plan_stream(StreamBudget::default());
        assert_eq!(plan.to_unload, vec![GridCoord::new(1, 0, 0)]);

        store.apply_stream_plan(&plan);
        assert!(store.contains(GridId::ORIGIN));
        assert!(store.contains(custom));
        assert!(!store.contains(GridId::Chunk(GridCoord::new(1, 0, 0))));
    }

    #[test]
    fn planning_at_the_far_edge_unloads_the_other_end() {
        let mut store = GridStore::default();
        store.load_grid(GridCoord::new(i32::MIN, 0, 0));
        store.move_to_grid(GridCoord::new(i32::MAX, 0, 0));
        let plan = store.plan_stream(StreamBudget { load: 100, unload: 100 });
        assert_eq!(plan.to_load.len(), 17);
        assert_eq!(plan.to_unload, vec![GridCoord::new(i32::MIN, 0, 0)]);
    }

    #[test]
    fn repeated_passes_converge() {
        let mut store = GridStore::default();
        store.move_to_grid(GridCoord::new(2, 2, 2));
        for _ in 0..10 {
            let plan = store.plan_stream(StreamBudget { load: 5, unload: 5 });
            store.apply_stream_plan(&plan);
        }
        assert!(store.plan_stream(StreamBudget::default()).is_empty());
        // 27 around (2,2,2) plus the origin.
        assert_eq!(store.len(), 28);
    }
}

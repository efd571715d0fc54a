use serde::{Deserialize, Serialize};
use soundscape_common::{GridCoord, GridId, Transform, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("the origin chunk is permanent")]
    OriginProtected,
    #[error("grid {0} not found")]
    NotFound(GridId),
    #[error("grid size must be positive")]
    InvalidSize,
}

/// Partition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Edge length of a chunk in world units.
    pub grid_size: f32,
    /// Chebyshev radius (in chunks) considered adjacent to the current chunk.
    pub render_distance: i32,
    pub default_color: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            render_distance: 1,
            default_color: "#444444".to_string(),
        }
    }
}

/// A cubical chunk of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub id: GridId,
    pub coordinates: GridCoord,
    /// `transform.position` is the world-space origin of the chunk.
    #[serde(flatten)]
    pub transform: Transform,
    pub grid_size: f32,
    pub grid_color: String,
    pub is_loaded: bool,
    pub is_selected: bool,
}

/// Field-level grid edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridUpdate {
    pub grid_color: Option<String>,
    pub is_loaded: Option<bool>,
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub grid_size: Option<f32>,
}

/// Chunk registry plus the viewer's current chunk.
///
/// "Selected" is a UI highlight, exclusive among grids. "Active" is the
/// default insertion target for new entities. Neither implies the other.
#[derive(Debug, Clone)]
pub struct GridStore {
    config: GridConfig,
    grids: BTreeMap<GridId, Grid>,
    current: GridCoord,
    active: Option<GridId>,
}

impl GridStore {
    /// Create a store holding only the origin chunk, which starts active.
    pub fn new(config: GridConfig) -> Self {
        let mut store = Self {
            config,
            grids: BTreeMap::new(),
            current: GridCoord::ORIGIN,
            active: Some(GridId::ORIGIN),
        };
        store.load_grid(GridCoord::ORIGIN);
        store
    }

    /// Addressing and streaming settings.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Canonical `"x,y,z"` key for a chunk coordinate.
    pub fn get_grid_key(coords: GridCoord) -> String {
        coords.key()
    }

    /// Number of grids, loaded or custom.
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// Number of grids with `is_loaded` set.
    pub fn loaded_count(&self) -> usize {
        self.grids.values().filter(|g| g.is_loaded).count()
    }

    /// Look up a grid by id.
    pub fn get(&self, id: GridId) -> Option<&Grid> {
        self.grids.get(&id)
    }

    /// Whether a grid with `id` exists.
    pub fn contains(&self, id: GridId) -> bool {
        self.grids.contains_key(&id)
    }

    /// All grids in id order.
    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        self.grids.values()
    }

    /// The viewer's chunk.
    pub fn current_grid_coordinates(&self) -> GridCoord {
        self.current
    }

    /// Grid that receives newly created entities.
    pub fn active_grid(&self) -> Option<GridId> {
        self.active
    }

    /// Highlighted grid, if any.
    pub fn selected_grid(&self) -> Option<GridId> {
        self.grids.values().find(|g| g.is_selected).map(|g| g.id)
    }

    /// Load the chunk at `coords`. Returns false if it was already present.
    pub fn load_grid(&mut self, coords: GridCoord) -> bool {
        let id = GridId::Chunk(coords);
        if self.grids.contains_key(&id) {
            return false;
        }
        let grid_size = self.config.grid_size;
        self.grids.insert(
            id,
            Grid {
                id,
                coordinates: coords,
                transform: Transform::at(coords.world_origin(grid_size)),
                grid_size,
                grid_color: self.config.default_color.clone(),
                is_loaded: true,
                is_selected: false,
            },
        );
        tracing::debug!(%coords, "grid loaded");
        true
    }

    /// Remove the chunk at `coords`. The origin is refused.
    pub fn unload_grid(&mut self, coords: GridCoord) -> Result<Grid, GridError> {
        if coords.is_origin() {
            tracing::warn!("refusing to unload the origin chunk");
            return Err(GridError::OriginProtected);
        }
        let id = GridId::Chunk(coords);
        let grid = self.grids.remove(&id).ok_or(GridError::NotFound(id))?;
        self.forget(id);
        tracing::debug!(%coords, "grid unloaded");
        Ok(grid)
    }

    /// Make `coords` the viewer's chunk, loading it first if needed.
    pub fn move_to_grid(&mut self, coords: GridCoord) {
        self.load_grid(coords);
        self.current = coords;
        tracing::debug!(%coords, "moved to grid");
    }

    /// Every coordinate within `render_distance` (Chebyshev) of the current
    /// chunk, excluding the current chunk itself and anything past the edge
    /// of chunk space.
    pub fn get_adjacent_grids(&self) -> Vec<GridCoord> {
        let r = self.config.render_distance.max(0);
        let mut result = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    if let Some(coord) = self.current.checked_offset(dx, dy, dz) {
                        result.push(coord);
                    }
                }
            }
        }
        result
    }

    /// Free-form grid keyed by a fresh opaque id. Its coordinate is
    /// `round(position / size)` per axis.
    pub fn create_grid(&mut self, position: Vec3, size: f32) -> Result<GridId, GridError> {
        if !valid_size(size) {
            return Err(GridError::InvalidSize);
        }
        let id = GridId::new_custom();
        let coordinates = GridCoord::from_world_rounded(position, size);
        self.grids.insert(
            id,
            Grid {
                id,
                coordinates,
                transform: Transform::at(position),
                grid_size: size,
                grid_color: self.config.default_color.clone(),
                is_loaded: true,
                is_selected: false,
            },
        );
        tracing::debug!(%id, %coordinates, "grid created");
        Ok(id)
    }

    /// Highlight one grid (or none). Exclusive among grids.
    pub fn select_grid(&mut self, id: Option<GridId>) -> Result<(), GridError> {
        if let Some(id) = id {
            if !self.grids.contains_key(&id) {
                return Err(GridError::NotFound(id));
            }
        }
        for grid in self.grids.values_mut() {
            grid.is_selected = Some(grid.id) == id;
        }
        Ok(())
    }

    /// Choose the grid that receives new entities. `None` clears it.
    pub fn set_active_grid(&mut self, id: Option<GridId>) -> Result<(), GridError> {
        if let Some(id) = id {
            if !self.grids.contains_key(&id) {
                return Err(GridError::NotFound(id));
            }
        }
        self.active = id;
        Ok(())
    }

    /// Apply a partial update. Sizes must be positive.
    pub fn update_grid(&mut self, id: GridId, update: GridUpdate) -> Result<(), GridError> {
        if matches!(update.grid_size, Some(s) if !valid_size(s)) {
            return Err(GridError::InvalidSize);
        }
        let grid = self.grids.get_mut(&id).ok_or(GridError::NotFound(id))?;
        if let Some(color) = update.grid_color {
            grid.grid_color = color;
        }
        if let Some(loaded) = update.is_loaded {
            grid.is_loaded = loaded;
        }
        if let Some(position) = update.position {
            grid.transform.position = position;
        }
        if let Some(rotation) = update.rotation {
            grid.transform.rotation = rotation;
        }
        if let Some(scale) = update.scale {
            grid.transform.scale = scale;
        }
        if let Some(size) = update.grid_size {
            grid.grid_size = size;
        }
        Ok(())
    }

    /// Delete any grid except the origin chunk.
    pub fn delete_grid(&mut self, id: GridId) -> Result<Grid, GridError> {
        if id.is_origin() {
            tracing::warn!("refusing to delete the origin chunk");
            return Err(GridError::OriginProtected);
        }
        let grid = self.grids.remove(&id).ok_or(GridError::NotFound(id))?;
        self.forget(id);
        tracing::debug!(%id, "grid deleted");
        Ok(grid)
    }

    /// Change a grid's edge length.
    pub fn resize_grid(&mut self, id: GridId, size: f32) -> Result<(), GridError> {
        self.update_grid(
            id,
            GridUpdate {
                grid_size: Some(size),
                ..GridUpdate::default()
            },
        )
    }

    /// Move a grid's transform.
    pub fn move_grid(&mut self, id: GridId, position: Vec3) -> Result<(), GridError> {
        self.update_grid(
            id,
            GridUpdate {
                position: Some(position),
                ..GridUpdate::default()
            },
        )
    }

    /// Rotate a grid's transform.
    pub fn rotate_grid(&mut self, id: GridId, rotation: Vec3) -> Result<(), GridError> {
        self.update_grid(
            id,
            GridUpdate {
                rotation: Some(rotation),
                ..GridUpdate::default()
            },
        )
    }

    /// Scale a grid's transform.
    pub fn scale_grid(&mut self, id: GridId, scale: Vec3) -> Result<(), GridError> {
        self.update_grid(
            id,
            GridUpdate {
                scale: Some(scale),
                ..GridUpdate::default()
            },
        )
    }

    /// Drop every grid but the origin and reset current/active to it.
    pub fn reset(&mut self) {
        self.grids.retain(|id, _| id.is_origin());
        self.current = GridCoord::ORIGIN;
        self.active = Some(GridId::ORIGIN);
        self.load_grid(GridCoord::ORIGIN);
        if let Some(origin) = self.grids.get_mut(&GridId::ORIGIN) {
            origin.is_selected = false;
        }
    }

    /// Active grid falls back to the origin when the active one disappears.
    fn forget(&mut self, id: GridId) {
        if self.active == Some(id) {
            self.active = Some(GridId::ORIGIN);
        }
    }
}

fn valid_size(size: f32) -> bool {
    size.is_finite() && size > 0.0
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_key_format() {
        assert_eq!(GridStore::get_grid_key(GridCoord::new(3, -1, 0)), "3,-1,0");
    }

    #[test]
    fn origin_is_loaded_and_active_at_start() {
        let store = GridStore::default();
        assert_eq!(store.len(), 1);
        assert!(store.get(GridId::ORIGIN).unwrap().is_loaded);
        assert_eq!(store.active_grid(), Some(GridId::ORIGIN));
    }

    #[test]
    fn load_twice_is_noop() {
        let mut store = GridStore::default();
        assert!(!store.load_grid(GridCoord::ORIGIN));
        assert!(store.load_grid(GridCoord::new(1, 0, 0)));
        assert!(!store.load_grid(GridCoord::new(1, 0, 0)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn loaded_chunk_origin_is_scaled_coordinate() {
        let mut store = GridStore::default();
        store.load_grid(GridCoord::new(-2, 1, 3));
        let grid = store.get(GridId::Chunk(GridCoord::new(-2, 1, 3))).unwrap();
        assert_eq!(grid.transform.position, Vec3::new(-40.0, 20.0, 60.0));
    }

    #[test]
    fn origin_cannot_be_unloaded_or_deleted() {
        let mut store = GridStore::default();
        assert_eq!(store.unload_grid(GridCoord::ORIGIN), Err(GridError::OriginProtected));
        assert_eq!(store.delete_grid(GridId::ORIGIN), Err(GridError::OriginProtected));
        assert!(store.contains(GridId::ORIGIN));
    }

    #[test]
    fn unload_removes_other_chunks() {
        let mut store = GridStore::default();
        let c = GridCoord::new(0, 0, 1);
        store.load_grid(c);
        assert!(store.unload_grid(c).is_ok());
        assert_eq!(store.unload_grid(c), Err(GridError::NotFound(GridId::Chunk(c))));
    }

    #[test]
    fn move_to_unloaded_grid_loads_it() {
        let mut store = GridStore::default();
        let target = GridCoord::new(1, 0, 0);
        store.move_to_grid(target);
        assert_eq!(store.current_grid_coordinates(), target);
        let grid = store.get(GridId::Chunk(target)).unwrap();
        assert_eq!(grid.transform.position, Vec3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn adjacency_excludes_center() {
        let mut store = GridStore::default();
        store.move_to_grid(GridCoord::new(5, 5, 5));
        let adjacent = store.get_adjacent_grids();
        assert_eq!(adjacent.len(), 26);
        assert!(!adjacent.contains(&GridCoord::new(5, 5, 5)));
        assert!(adjacent.iter().all(|c| c.chebyshev(GridCoord::new(5, 5, 5)) == 1));
    }

    #[test]
    fn adjacency_clips_at_the_edge_of_chunk_space() {
        let mut store = GridStore::default();
        let corner = GridCoord::new(i32::MAX, 0, i32::MIN);
        store.move_to_grid(corner);
        let adjacent = store.get_adjacent_grids();
        // Only the inward half on x and z survives: 2 * 3 * 2 - 1.
        assert_eq!(adjacent.len(), 11);
        assert!(adjacent.iter().all(|c| c.chebyshev(corner) == 1));
    }

    #[test]
    fn adjacency_grows_with_render_distance() {
        let store = GridStore::new(GridConfig {
            render_distance: 2,
            ..GridConfig::default()
        });
        assert_eq!(store.get_adjacent_grids().len(), 124);
    }

    #[test]
    fn create_grid_rounds_coordinates() {
        let mut store = GridStore::default();
        let id = store.create_grid(Vec3::new(40.0, 0.0, 0.0), 20.0).unwrap();
        let grid = store.get(id).unwrap();
        assert_eq!(grid.coordinates, GridCoord::new(2, 0, 0));
        assert!(matches!(id, GridId::Custom(_)));
        let half = store.create_grid(Vec3::new(-10.0, 0.0, 0.0), 20.0).unwrap();
        assert_eq!(store.get(half).unwrap().coordinates, GridCoord::ORIGIN);
        assert_eq!(store.create_grid(Vec3::ZERO, 0.0), Err(GridError::InvalidSize));
    }

    #[test]
    fn selection_is_exclusive_and_independent_of_active() {
        let mut store = GridStore::default();
        store.load_grid(GridCoord::new(1, 0, 0));
        let other = GridId::Chunk(GridCoord::new(1, 0, 0));

        store.select_grid(Some(GridId::ORIGIN)).unwrap();
        store.select_grid(Some(other)).unwrap();
        assert_eq!(store.selected_grid(), Some(other));
        assert_eq!(store.grids().filter(|g| g.is_selected).count(), 1);
        assert_eq!(store.active_grid(), Some(GridId::ORIGIN));

        store.set_active_grid(Some(other)).unwrap();
        store.select_grid(None).unwrap();
        assert_eq!(store.selected_grid(), None);
        assert_eq!(store.active_grid(), Some(other));
    }

    #[test]
    fn deleting_active_grid_falls_back_to_origin() {
        let mut store = GridStore::default();
        let id = store.create_grid(Vec3::new(10.0, 0.0, 0.0), 5.0).unwrap();
        store.set_active_grid(Some(id)).unwrap();
        store.delete_grid(id).unwrap();
        assert_eq!(store.active_grid(), Some(GridId::ORIGIN));
    }

    #[test]
    fn field_mutators() {
        let mut store = GridStore::default();
        let id = GridId::ORIGIN;
        store.resize_grid(id, 10.0).unwrap();
        store.move_grid(id, Vec3::ONE).unwrap();
        store.rotate_grid(id, Vec3::new(0.0, 1.5, 0.0)).unwrap();
        store.scale_grid(id, Vec3::splat(2.0)).unwrap();
        store
            .update_grid(
                id,
                GridUpdate {
                    grid_color: Some("#ff00ff".into()),
                    ..GridUpdate::default()
                },
            )
            .unwrap();
        let g = store.get(id).unwrap();
        assert_eq!(g.grid_size, 10.0);
        assert_eq!(g.transform.position, Vec3::ONE);
        assert_eq!(g.transform.rotation.y, 1.5);
        assert_eq!(g.transform.scale, Vec3::splat(2.0));
        assert_eq!(g.grid_color, "#ff00ff");
        assert_eq!(store.resize_grid(id, -1.0), Err(GridError::InvalidSize));
    }

    #[test]
    fn reset_keeps_only_origin() {
        let mut store = GridStore::default();
        store.move_to_grid(GridCoord::new(3, 0, 0));
        store.create_grid(Vec3::ZERO, 4.0).unwrap();
        store.select_grid(Some(GridId::ORIGIN)).unwrap();
        store.reset();
        assert_eq!(store.len(), 1);
        assert_eq!(store.current_grid_coordinates(), GridCoord::ORIGIN);
        assert_eq!(store.selected_grid(), None);
    }
}

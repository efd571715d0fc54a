//! Mobile-object store: autonomous movers driven by the kinematics engine.

use crate::kinematics::{SimTime, calculate_next_position};
use crate::rng::SplitMix64;
use serde::{Deserialize, Serialize};
use soundscape_common::{EntityId, GridId, MovementType, Transform, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MobileError {
    #[error("mobile object {0} not found")]
    NotFound(EntityId),
    #[error("invalid mobile params for {0}")]
    InvalidParams(EntityId),
}

/// Movement configuration of a mobile object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileParams {
    pub movement_type: MovementType,
    pub radius: f32,
    pub speed: f32,
    /// Distance at which the object triggers nearby sound objects.
    pub proximity_threshold: f32,
    pub is_active: bool,
    pub center_position: Vec3,
    pub direction: Vec3,
    pub axis: Vec3,
    pub amplitude: f32,
    pub frequency: f32,
    pub random_seed: u64,
    #[serde(default)]
    pub show_proximity: bool,
    #[serde(default)]
    pub show_path: bool,
}

impl MobileParams {
    /// Default parameters orbiting `center`.
    pub fn anchored_at(center: Vec3) -> Self {
        Self {
            movement_type: MovementType::default(),
            radius: 2.0,
            speed: 1.0,
            proximity_threshold: 1.5,
            is_active: true,
            center_position: center,
            direction: Vec3::X,
            axis: Vec3::Y,
            amplitude: 1.0,
            frequency: 1.0,
            random_seed: 0,
            show_proximity: false,
            show_path: false,
        }
    }
}

/// Range-check mobile params. Advisory; stores only enforce it on updates.
pub fn validate_mobile_params(params: &MobileParams) -> bool {
    let finite = |v: Vec3| v.is_finite();
    params.radius > 0.0
        && params.speed >= 0.0
        && params.proximity_threshold > 0.0
        && params.amplitude >= 0.0
        && params.frequency > 0.0
        && finite(params.direction)
        && finite(params.axis)
        && finite(params.center_position)
}

/// Partial update for [`MobileParams`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MobileParamsUpdate {
    pub movement_type: Option<MovementType>,
    pub radius: Option<f32>,
    pub speed: Option<f32>,
    pub proximity_threshold: Option<f32>,
    pub is_active: Option<bool>,
    pub center_position: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub axis: Option<Vec3>,
    pub amplitude: Option<f32>,
    pub frequency: Option<f32>,
    pub show_proximity: Option<bool>,
    pub show_path: Option<bool>,
}

impl MobileParamsUpdate {
    fn apply_to(&self, params: &MobileParams) -> MobileParams {
        MobileParams {
            movement_type: self.movement_type.unwrap_or(params.movement_type),
            radius: self.radius.unwrap_or(params.radius),
            speed: self.speed.unwrap_or(params.speed),
            proximity_threshold: self.proximity_threshold.unwrap_or(params.proximity_threshold),
            is_active: self.is_active.unwrap_or(params.is_active),
            center_position: self.center_position.unwrap_or(params.center_position),
            direction: self.direction.unwrap_or(params.direction),
            axis: self.axis.unwrap_or(params.axis),
            amplitude: self.amplitude.unwrap_or(params.amplitude),
            frequency: self.frequency.unwrap_or(params.frequency),
            random_seed: params.random_seed,
            show_proximity: self.show_proximity.unwrap_or(params.show_proximity),
            show_path: self.show_path.unwrap_or(params.show_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileObject {
    pub id: EntityId,
    #[serde(flatten)]
    pub transform: Transform,
    pub mobile_params: MobileParams,
    pub is_selected: bool,
    pub grid_id: Option<GridId>,
}

#[derive(Debug, Clone)]
pub struct MobileObjectStore {
    objects: BTreeMap<EntityId, MobileObject>,
    seeds: SplitMix64,
}

impl Default for MobileObjectStore {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl MobileObjectStore {
    /// Create an empty store seeded with 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose random seeds are drawn from a generator seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            objects: BTreeMap::new(),
            seeds: SplitMix64::new(seed),
        }
    }

    /// Number of mobile objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All mobile objects in id order.
    pub fn all(&self) -> impl Iterator<Item = &MobileObject> {
        self.objects.values()
    }

    /// Mobile objects whose back-reference points at `grid_id`.
    pub fn mobile_objects_in_grid(&self, grid_id: GridId) -> Vec<&MobileObject> {
        self.objects
            .values()
            .filter(|m| m.grid_id == Some(grid_id))
            .collect()
    }

    /// Look up a mobile object by id.
    pub fn find_mobile_object_by_id(&self, id: EntityId) -> Option<&MobileObject> {
        self.objects.get(&id)
    }

    /// Create a mobile object anchored at `position` with a fresh random seed.
    pub fn add_mobile_object(
        &mut self,
        position: Vec3,
        movement_type: MovementType,
        grid_id: Option<GridId>,
    ) -> EntityId {
        let id = EntityId::new();
        let mobile_params = MobileParams {
            movement_type,
            random_seed: self.seeds.next_u64(),
            ..MobileParams::anchored_at(position)
        };
        self.objects.insert(
            id,
            MobileObject {
                id,
                transform: Transform::at(position),
                mobile_params,
                is_selected: false,
                grid_id,
            },
        );
        tracing::debug!(%id, %movement_type, ?position, "mobile object added");
        id
    }

    /// Insert a mobile object built elsewhere (imports).
    pub fn insert_mobile_object(&mut self, object: MobileObject) {
        self.objects.insert(object.id, object);
    }

    /// Teleport a mobile object. Its movement center is left unchanged.
    pub fn update_mobile_object_position(
        &mut self,
        id: EntityId,
        position: Vec3,
    ) -> Result<(), MobileError> {
        let object = self.objects.get_mut(&id).ok_or(MobileError::NotFound(id))?;
        object.transform.position = position;
        Ok(())
    }

    /// Merge `update` into the object's params. The merged result must pass
    /// [`validate_mobile_params`], otherwise nothing changes.
    pub fn update_mobile_params(
        &mut self,
        id: EntityId,
        update: &MobileParamsUpdate,
    ) -> Result<(), MobileError> {
        let object = self.objects.get_mut(&id).ok_or(MobileError::NotFound(id))?;
        let merged = update.apply_to(&object.mobile_params);
        if !validate_mobile_params(&merged) {
            tracing::warn!(%id, "rejected invalid mobile params");
            return Err(MobileError::InvalidParams(id));
        }
        object.mobile_params = merged;
        Ok(())
    }

    /// Flip `is_active`. Returns the new value.
    pub fn toggle_active(&mut self, id: EntityId) -> Result<bool, MobileError> {
        let object = self.objects.get_mut(&id).ok_or(MobileError::NotFound(id))?;
        object.mobile_params.is_active = !object.mobile_params.is_active;
        Ok(object.mobile_params.is_active)
    }

    /// Remove a mobile object, returning it.
    pub fn remove_mobile_object(&mut self, id: EntityId) -> Result<MobileObject, MobileError> {
        let removed = self.objects.remove(&id).ok_or(MobileError::NotFound(id))?;
        tracing::debug!(%id, "mobile object removed");
        Ok(removed)
    }

    /// Move every active object to its position at `time`. Returns the moved
    /// ids with their new positions.
    pub fn advance(&mut self, delta_time: f32, time: SimTime) -> Vec<(EntityId, Vec3)> {
        let mut moved = Vec::new();
        for object in self.objects.values_mut() {
            if !object.mobile_params.is_active {
                continue;
            }
            let next = calculate_next_position(object, delta_time, time);
            object.transform.position = next;
            moved.push((object.id, next));
        }
        moved
    }

    /// Set `is_selected` on every mobile object: true for `keep`, false otherwise.
    pub fn mark_selected(&mut self, keep: Option<EntityId>) {
        for object in self.objects.values_mut() {
            object.is_selected = Some(object.id) == keep;
        }
    }

    /// Remove every mobile object. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.objects.len();
        self.objects.clear();
        count
    }
}

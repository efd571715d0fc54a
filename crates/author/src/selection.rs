use serde::{Deserialize, Serialize};
use soundscape_common::{EntityId, TransformMode};

/// Live editor selection. Holds ids only; the entity stores own the
/// `is_selected` flags and the engine keeps them in line with this state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    selected_entity_id: Option<EntityId>,
    transform_mode: TransformMode,
}

/// Outcome of a selection transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<EntityId>,
    pub current: Option<EntityId>,
}

impl SelectionChange {
    /// Whether the selection actually moved.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

impl SelectionState {
    /// Nothing selected, translate mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected entity.
    pub fn selected_entity_id(&self) -> Option<EntityId> {
        self.selected_entity_id
    }

    /// Active gizmo mode.
    pub fn transform_mode(&self) -> TransformMode {
        self.transform_mode
    }

    /// Whether `id` is the selected entity.
    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected_entity_id == Some(id)
    }

    /// Select `id`, or clear the selection with `None`.
    pub fn select_entity(&mut self, id: Option<EntityId>) -> SelectionChange {
        let previous = std::mem::replace(&mut self.selected_entity_id, id);
        let change = SelectionChange {
            previous,
            current: id,
        };
        if change.changed() {
            tracing::debug!(?previous, current = ?id, "selection changed");
        }
        change
    }

    /// Switch gizmo mode. Selection is untouched.
    pub fn set_transform_mode(&mut self, mode: TransformMode) {
        self.transform_mode = mode;
        tracing::debug!(%mode, "transform mode");
    }

    /// Drop the selection if it points at `id` (entity removed).
    pub fn forget(&mut self, id: EntityId) -> bool {
        if self.selected_entity_id == Some(id) {
            self.selected_entity_id = None;
            true
        } else {
            false
        }
    }

    /// Back to nothing selected, translate mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

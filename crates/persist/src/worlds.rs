use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamped into exported world documents.
pub const WORLD_FORMAT_VERSION: u32 = 1;

const DEFAULT_WORLD_ID: &str = "default";
const DEFAULT_WORLD_NAME: &str = "Default World";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("the default world cannot be deleted")]
    DefaultProtected,
    #[error("world {0} not found")]
    NotFound(WorldId),
    #[error("world name must not be blank")]
    BlankName,
    #[error("a world named {0:?} already exists")]
    DuplicateName(String),
    #[error("malformed world document: {0}")]
    MalformedImport(String),
    #[error("failed to encode world document: {0}")]
    Encode(String),
    #[error("world document version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    /// Id of the permanent default world.
    pub fn default_world() -> Self {
        Self(DEFAULT_WORLD_ID.to_string())
    }

    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Whether this is the default world.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_WORLD_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub id: WorldId,
    pub name: String,
}

/// Exported world document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldExport {
    pub id: WorldId,
    pub name: String,
    pub version: u32,
}

/// In-memory registry of named worlds plus the current selection.
#[derive(Debug, Clone)]
pub struct WorldManager {
    worlds: Vec<WorldInfo>,
    current: WorldId,
}

impl WorldManager {
    /// Registry holding only the default world.
    pub fn new() -> Self {
        Self {
            worlds: vec![WorldInfo {
                id: WorldId::default_world(),
                name: DEFAULT_WORLD_NAME.to_string(),
            }],
            current: WorldId::default_world(),
        }
    }

    /// Worlds in creation order.
    pub fn worlds(&self) -> &[WorldInfo] {
        &self.worlds
    }

    /// Number of worlds.
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Id of the world being edited.
    pub fn current_world_id(&self) -> &WorldId {
        &self.current
    }

    /// The world being edited.
    pub fn current_world(&self) -> Option<&WorldInfo> {
        self.get(&self.current)
    }

    /// Look up a world by id.
    pub fn get(&self, id: &WorldId) -> Option<&WorldInfo> {
        self.worlds.iter().find(|w| &w.id == id)
    }

    /// Register a new world with a trimmed, unique, non-blank name.
    pub fn create_world(&mut self, name: &str) -> Result<WorldId, WorldError> {
        let name = self.check_name(name, None)?;
        let id = WorldId::generate();
        tracing::info!(%id, %name, "world created");
        self.worlds.push(WorldInfo {
            id: id.clone(),
            name,
        });
        Ok(id)
    }

    /// Make `id` the current world.
    pub fn switch_world(&mut self, id: &WorldId) -> Result<(), WorldError> {
        if self.get(id).is_none() {
            return Err(WorldError::NotFound(id.clone()));
        }
        self.current = id.clone();
        tracing::info!(%id, "switched world");
        Ok(())
    }

    /// Delete a world. Deleting the current one switches back to `default`.
    pub fn delete_world(&mut self, id: &WorldId) -> Result<WorldInfo, WorldError> {
        if id.is_default() {
            tracing::warn!("refusing to delete the default world");
            return Err(WorldError::DefaultProtected);
        }
        let index = self
            .worlds
            .iter()
            .position(|w| &w.id == id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        let removed = self.worlds.remove(index);
        if &self.current == id {
            self.current = WorldId::default_world();
        }
        tracing::info!(%id, "world deleted");
        Ok(removed)
    }

    /// Rename a world. Blank and duplicate names are rejected.
    pub fn rename_world(&mut self, id: &WorldId, name: &str) -> Result<(), WorldError> {
        if self.get(id).is_none() {
            return Err(WorldError::NotFound(id.clone()));
        }
        let name = self.check_name(name, Some(id))?;
        if let Some(world) = self.worlds.iter_mut().find(|w| &w.id == id) {
            tracing::debug!(%id, from = %world.name, to = %name, "world renamed");
            world.name = name;
        }
        Ok(())
    }

    /// Copy a world under a fresh id and a `"<name> (copy)"` style name.
    pub fn duplicate_world(&mut self, id: &WorldId) -> Result<WorldId, WorldError> {
        let source = self.get(id).ok_or_else(|| WorldError::NotFound(id.clone()))?;
        let name = self.unique_name(&format!("{} (copy)", source.name));
        let copy = WorldId::generate();
        tracing::info!(source = %id, %copy, "world duplicated");
        self.worlds.push(WorldInfo {
            id: copy.clone(),
            name,
        });
        Ok(copy)
    }

    /// Versioned JSON document for one world.
    pub fn export_world(&self, id: &WorldId) -> Result<String, WorldError> {
        let world = self.get(id).ok_or_else(|| WorldError::NotFound(id.clone()))?;
        let doc = WorldExport {
            id: world.id.clone(),
            name: world.name.clone(),
            version: WORLD_FORMAT_VERSION,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| WorldError::Encode(e.to_string()))
    }

    /// Import an exported document. The world always gets a fresh id; a
    /// clashing name is suffixed rather than rejected.
    pub fn import_world(&mut self, json: &str) -> Result<WorldId, WorldError> {
        let doc: WorldExport =
            serde_json::from_str(json).map_err(|e| WorldError::MalformedImport(e.to_string()))?;
        if doc.version > WORLD_FORMAT_VERSION {
            return Err(WorldError::UnsupportedVersion {
                found: doc.version,
                supported: WORLD_FORMAT_VERSION,
            });
        }
        let trimmed = doc.name.trim();
        if trimmed.is_empty() {
            return Err(WorldError::BlankName);
        }
        let name = self.unique_name(trimmed);
        let id = WorldId::generate();
        tracing::info!(%id, original = %doc.id, %name, "world imported");
        self.worlds.push(WorldInfo {
            id: id.clone(),
            name,
        });
        Ok(id)
    }

    /// Back to the single default world.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn check_name(&self, name: &str, renaming: Option<&WorldId>) -> Result<String, WorldError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorldError::BlankName);
        }
        let taken = self
            .worlds
            .iter()
            .any(|w| w.name == name && Some(&w.id) != renaming);
        if taken {
            return Err(WorldError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    fn unique_name(&self, base: &str) -> String {
        let free = |candidate: &str| self.worlds.iter().all(|w| w.name != candidate);
        if free(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| free(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl Default for WorldManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_default_world_selected() {
        let m = WorldManager::new();
        assert_eq!(m.len(), 1);
        assert!(m.current_world_id().is_default());
        assert_eq!(m.current_world().unwrap().name, "Default World");
    }

    #[test]
    fn default_world_is_protected() {
        let mut m = WorldManager::new();
        assert_eq!(
            m.delete_world(&WorldId::default_world()),
            Err(WorldError::DefaultProtected)
        );
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn deleting_current_world_falls_back_to_default() {
        let mut m = WorldManager::new();
        let id = m.create_world("Forest").unwrap();
        m.switch_world(&id).unwrap();
        assert_eq!(m.current_world_id(), &id);
        m.delete_world(&id).unwrap();
        assert!(m.current_world_id().is_default());
        assert_eq!(m.delete_world(&id), Err(WorldError::NotFound(id)));
    }

    #[test]
    fn switch_to_unknown_world_fails() {
        let mut m = WorldManager::new();
        let ghost = WorldId::from("nope");
        assert_eq!(m.switch_world(&ghost), Err(WorldError::NotFound(ghost)));
        assert!(m.current_world_id().is_default());
    }

    #[test]
    fn rename_rejects_blank_and_duplicates() {
        let mut m = WorldManager::new();
        let a = m.create_world("A").unwrap();
        m.create_world("B").unwrap();
        assert_eq!(m.rename_world(&a, "   "), Err(WorldError::BlankName));
        assert_eq!(
            m.rename_world(&a, "B"),
            Err(WorldError::DuplicateName("B".into()))
        );
        assert!(m.rename_world(&a, "A").is_ok());
        m.rename_world(&a, "  Cave ").unwrap();
        assert_eq!(m.get(&a).unwrap().name, "Cave");
    }

    #[test]
    fn create_rejects_blank_and_duplicate_names() {
        let mut m = WorldManager::new();
        assert_eq!(m.create_world(""), Err(WorldError::BlankName));
        assert_eq!(
            m.create_world("Default World"),
            Err(WorldError::DuplicateName("Default World".into()))
        );
    }

    #[test]
    fn duplicate_gets_fresh_id_and_unique_name() {
        let mut m = WorldManager::new();
        let a = m.create_world("Lake").unwrap();
        let b = m.duplicate_world(&a).unwrap();
        let c = m.duplicate_world(&a).unwrap();
        assert_ne!(a, b);
        assert_eq!(m.get(&b).unwrap().name, "Lake (copy)");
        assert_eq!(m.get(&c).unwrap().name, "Lake (copy) 2");
    }

    #[test]
    fn export_carries_only_id_name_version() {
        let mut m = WorldManager::new();
        let id = m.create_world("Desert").unwrap();
        let json = m.export_world(&id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["name"], "Desert");
        assert_eq!(obj["id"], id.as_str());
        assert_eq!(obj["version"], WORLD_FORMAT_VERSION);
    }

    #[test]
    fn import_assigns_new_id_and_dedupes_name() {
        let mut m = WorldManager::new();
        let id = m.create_world("Desert").unwrap();
        let json = m.export_world(&id).unwrap();
        let imported = m.import_world(&json).unwrap();
        assert_ne!(imported, id);
        assert_eq!(m.get(&imported).unwrap().name, "Desert 2");
    }

    #[test]
    fn import_rejects_garbage_and_future_versions() {
        let mut m = WorldManager::new();
        assert!(matches!(
            m.import_world("{not json"),
            Err(WorldError::MalformedImport(_))
        ));
        let future = r#"{"id":"x","name":"Future","version":99}"#;
        assert_eq!(
            m.import_world(future),
            Err(WorldError::UnsupportedVersion {
                found: 99,
                supported: WORLD_FORMAT_VERSION
            })
        );
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn reset_leaves_only_default() {
        let mut m = WorldManager::new();
        let id = m.create_world("Temp").unwrap();
        m.switch_world(&id).unwrap();
        m.reset();
        assert_eq!(m.len(), 1);
        assert!(m.current_world_id().is_default());
    }
}

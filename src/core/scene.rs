//! Scene serialization and deserialization
//!
//! Supports saving and loading scenes in RON (Rusty Object Notation) and JSON
//! format. Only local transforms and parent links are stored; world values
//! are rebuilt by the next propagation pass after loading.

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use hecs::Entity;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ecs::{Hierarchy, Name, Transform, World};
use crate::math::euler_degrees_from_quat;

/// Local transform values as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    #[serde(default = "TransformRecord::unit_scale")]
    pub scale: Vec3,
    /// Euler angles in degrees, informational only
    #[serde(default)]
    pub euler_degrees: Vec3,
}

impl TransformRecord {
    fn unit_scale() -> Vec3 {
        Vec3::ONE
    }

    /// Build a fresh, dirty transform from the stored local values
    #[must_use]
    pub fn to_transform(&self) -> Transform {
        Transform::from_parts(self.position, self.rotation, self.scale)
    }
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self::from(&Transform::default())
    }
}

impl From<&Transform> for TransformRecord {
    fn from(transform: &Transform) -> Self {
        Self {
            position: transform.local_position(),
            rotation: transform.local_rotation(),
            scale: transform.local_scale(),
            euler_degrees: euler_degrees_from_quat(transform.local_rotation()),
        }
    }
}

/// A serializable entity with its components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerializedEntity {
    /// Optional entity name
    pub name: Option<String>,
    /// Local transform
    pub transform: TransformRecord,
    /// Parent entity index (if any)
    pub parent_index: Option<usize>,
}

/// A serializable scene containing multiple entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    /// All entities in the scene, parents before children
    pub entities: Vec<SerializedEntity>,
}

impl Scene {
    /// Create a new empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            entities: Vec::new(),
        }
    }

    /// Add an entity to the scene
    pub fn add_entity(&mut self, entity: SerializedEntity) -> usize {
        let index = self.entities.len();
        self.entities.push(entity);
        index
    }

    /// Capture every transform in `world`, walking each root's subtree so
    /// that parents are stored before their children.
    #[must_use]
    pub fn capture(name: impl Into<String>, world: &World) -> Self {
        let mut scene = Self::new(name);
        let mut indices: FxHashMap<Entity, usize> = FxHashMap::default();

        for root in world.roots() {
            let mut stack = vec![root];
            while let Some(entity) = stack.pop() {
                let Some(transform) = world.transform(entity) else {
                    continue;
                };
                let parent_index = world
                    .parent(entity)
                    .and_then(|parent| indices.get(&parent).copied());
                let name = world.get::<Name>(entity).ok().map(|n| n.0.clone());

                let index = scene.add_entity(SerializedEntity {
                    name,
                    transform: TransformRecord::from(&transform),
                    parent_index,
                });
                indices.insert(entity, index);

                stack.extend(world.children(entity).iter().rev().copied());
            }
        }

        log::debug!(
            "Captured scene '{}' with {} entities",
            scene.name,
            scene.entities.len()
        );
        scene
    }

    /// Spawn every entity of the scene into `world` and link the hierarchy.
    ///
    /// Returns the spawned entities in scene order. The transforms are dirty
    /// until the next propagation pass.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity refers to a parent that is not stored
    /// before it. Nothing is spawned in that case.
    pub fn instantiate(&self, world: &mut World) -> Result<Vec<Entity>, SceneError> {
        for (index, entity) in self.entities.iter().enumerate() {
            if let Some(parent) = entity.parent_index {
                if parent >= index {
                    return Err(SceneError::InvalidParent { index, parent });
                }
            }
        }

        let mut spawned = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            let transform = entity.transform.to_transform();
            let spawned_entity = match (entity.parent_index, &entity.name) {
                (Some(parent), Some(name)) => world
                    .spawn_child(spawned[parent], (Name::new(name.clone()), transform))
                    .map_err(|_| SceneError::InvalidParent {
                        index: spawned.len(),
                        parent,
                    })?,
                (Some(parent), None) => world
                    .spawn_child(spawned[parent], (transform,))
                    .map_err(|_| SceneError::InvalidParent {
                        index: spawned.len(),
                        parent,
                    })?,
                (None, Some(name)) => world.spawn_named(name.clone(), transform),
                (None, None) => world.spawn((transform,)),
            };
            spawned.push(spawned_entity);
        }

        log::info!(
            "Instantiated scene '{}' ({} entities)",
            self.name,
            spawned.len()
        );
        Ok(spawned)
    }

    /// Serialize the scene as pretty-printed RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, SceneError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::SerializeError(e.to_string()))
    }

    /// Parse a scene from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene
    pub fn from_ron_str(text: &str) -> Result<Self, SceneError> {
        ron::from_str(text).map_err(|e| SceneError::DeserializeError(e.to_string()))
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        write_file(path.as_ref(), &self.to_ron_string()?)?;
        log::info!("Saved scene '{}' to {}", self.name, path.as_ref().display());
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        Self::from_ron_str(&read_file(path.as_ref())?)
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SceneError::SerializeError(e.to_string()))?;
        write_file(path.as_ref(), &json)?;
        log::info!("Saved scene '{}' to {}", self.name, path.as_ref().display());
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        serde_json::from_str(&read_file(path.as_ref())?)
            .map_err(|e| SceneError::DeserializeError(e.to_string()))
    }

    /// Get the number of entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scene is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), SceneError> {
    fs::write(path, contents).map_err(|e| SceneError::IoError(format!("{}: {e}", path.display())))
}

fn read_file(path: &Path) -> Result<String, SceneError> {
    fs::read_to_string(path).map_err(|e| SceneError::IoError(format!("{}: {e}", path.display())))
}

/// Errors that can occur during scene operations
#[derive(Debug, Clone)]
pub enum SceneError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// An entity's parent index does not point at an earlier entity
    InvalidParent {
        /// Index of the offending entity
        index: usize,
        /// Parent index it refers to
        parent: usize,
    },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::InvalidParent { index, parent } => {
                write!(f, "Entity {index} refers to invalid parent index {parent}")
            }
        }
    }
}

impl std::error::Error for SceneError {}

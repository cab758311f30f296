//! Transform propagation errors

use glam::Vec3;
use hecs::Entity;

/// Errors that can occur while synchronizing or editing transforms
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// A parent's world scale has a zero component, so local values cannot
    /// be derived from world values under it
    DegenerateParentScale {
        /// Entity whose local values were being derived
        entity: Entity,
        /// Its name at the time of the failure
        entity_name: String,
        /// The parent with the degenerate scale
        parent: Entity,
        /// The parent's name at the time of the failure
        parent_name: String,
        /// The offending scale
        scale: Vec3,
    },
    /// The entity has no `Transform` component
    MissingTransform {
        /// The entity that was looked up
        entity: Entity,
    },
    /// Reparenting would make an entity its own ancestor
    CyclicParent {
        /// The entity being moved
        entity: Entity,
        /// The requested parent, which is the entity or one of its descendants
        new_parent: Entity,
    },
    /// The entity does not exist in the hierarchy
    NoSuchEntity {
        /// The missing entity
        entity: Entity,
    },
}

impl TransformError {
    /// Entity the error is about
    #[must_use]
    pub fn entity(&self) -> Entity {
        match self {
            Self::DegenerateParentScale { entity, .. }
            | Self::MissingTransform { entity }
            | Self::CyclicParent { entity, .. }
            | Self::NoSuchEntity { entity } => *entity,
        }
    }
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateParentScale {
                entity_name,
                parent_name,
                scale,
                ..
            } => write!(
                f,
                "Degenerate parent scale: '{parent_name}' has world scale {scale}, cannot derive local transform of '{entity_name}'"
            ),
            Self::MissingTransform { entity } => write!(f, "Entity {entity:?} has no Transform"),
            Self::CyclicParent { entity, new_parent } => write!(
                f,
                "Cannot parent {entity:?} under {new_parent:?}: it is the entity or one of its descendants"
            ),
            Self::NoSuchEntity { entity } => write!(f, "No such entity: {entity:?}"),
        }
    }
}

impl std::error::Error for TransformError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_scale_message_names_both_entities() {
        let mut world = hecs::World::new();
        let child = world.spawn(());
        let parent = world.spawn(());

        let error = TransformError::DegenerateParentScale {
            entity: child,
            entity_name: "Wheel".to_string(),
            parent,
            parent_name: "Car".to_string(),
            scale: Vec3::new(0.0, 1.0, 1.0),
        };

        let message = error.to_string();
        assert!(message.contains("Wheel"));
        assert!(message.contains("Car"));
        assert_eq!(error.entity(), child);
    }
}

//! Entity hierarchy components and the accessor traits used by transform
//! propagation.
//!
//! The propagation systems never touch a concrete store. They go through
//! [`Hierarchy`] (read parent/children, read and write transforms) and
//! [`HierarchyMut`] (rewire parent edges), so any tree-of-entities store can
//! drive them.

use hecs::Entity;
use smallvec::SmallVec;

use super::components::Transform;

/// Inline child list, sized for typical scene fan-out
pub type ChildList = SmallVec<[Entity; 8]>;

/// Parent component - indicates this entity has a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Parent {
    /// Create a new parent reference
    #[must_use]
    pub const fn new(entity: Entity) -> Self {
        Self(entity)
    }

    /// Get the parent entity
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.0
    }
}

/// Children component - tracks all children of this entity
#[derive(Debug, Clone, Default)]
pub struct Children(pub ChildList);

impl Children {
    /// Create an empty children list
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create from a single child
    #[must_use]
    pub fn single(child: Entity) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self(children)
    }

    /// Add a child
    pub fn add(&mut self, child: Entity) {
        if !self.0.contains(&child) {
            self.0.push(child);
        }
    }

    /// Remove a child
    pub fn remove(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.0.iter().position(|&e| e == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if this entity has children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over children
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter()
    }
}

/// Read access to a tree of entities and their transforms.
pub trait Hierarchy {
    /// Parent of `entity`, or `None` for roots and unknown entities
    fn parent(&self, entity: Entity) -> Option<Entity>;

    /// Direct children of `entity`, in insertion order
    fn children(&self, entity: Entity) -> ChildList;

    /// Every entity with a transform whose parent is absent or has no
    /// transform. Children of such parents are placed as roots.
    fn roots(&self) -> Vec<Entity>;

    /// Copy of the entity's transform
    fn transform(&self, entity: Entity) -> Option<Transform>;

    /// Mutable access to the entity's transform
    fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform>;

    /// Human readable label, used in diagnostics only
    fn name(&self, entity: Entity) -> String {
        format!("{entity:?}")
    }

    /// Check if `entity` has a parent
    fn has_parent(&self, entity: Entity) -> bool {
        self.parent(entity).is_some()
    }

    /// Check if `entity` has children
    fn has_children(&self, entity: Entity) -> bool {
        !self.children(entity).is_empty()
    }

    /// Whether `ancestor` is `entity` itself or appears on its parent chain
    fn is_ancestor_or_self(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.parent(e);
        }
        false
    }
}

/// Topology edits. Only the parent edge changes; transforms are left alone.
pub trait HierarchyMut: Hierarchy {
    /// Detach `child` from its current parent and attach it under
    /// `new_parent` (or make it a root).
    ///
    /// # Errors
    ///
    /// Returns the entity that does not exist
    fn set_parent(&mut self, child: Entity, new_parent: Option<Entity>) -> Result<(), Entity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_add_remove() {
        let mut world = hecs::World::new();
        let entity1 = world.spawn(());
        let entity2 = world.spawn(());

        let mut children = Children::new();

        children.add(entity1);
        children.add(entity2);
        assert_eq!(children.len(), 2);

        // No duplicates
        children.add(entity1);
        assert_eq!(children.len(), 2);

        children.remove(entity1);
        assert_eq!(children.len(), 1);
        assert!(!children.remove(entity1));
    }

    #[test]
    fn test_children_single() {
        let mut world = hecs::World::new();
        let entity = world.spawn(());

        let children = Children::single(entity);
        assert_eq!(children.iter().copied().collect::<Vec<_>>(), vec![entity]);
    }
}

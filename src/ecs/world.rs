//! World wrapper around hecs

use hecs::Entity;

use super::components::{Name, Transform};
use super::hierarchy::{ChildList, Children, Hierarchy, HierarchyMut, Parent};

/// Game world containing all entities and components.
///
/// Owns the parent/child edges (`Parent` and `Children` components) and is
/// the default [`Hierarchy`] backing the transform systems.
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Spawn a named root entity with a transform
    pub fn spawn_named(&mut self, name: impl Into<String>, transform: Transform) -> Entity {
        self.inner.spawn((Name::new(name), transform))
    }

    /// Spawn an entity and attach it under `parent`.
    ///
    /// The new entity's transform (if any) is expected to be local to
    /// `parent`; it is picked up by the next propagation pass.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchEntity` if `parent` does not exist. The child is not
    /// spawned in that case.
    pub fn spawn_child(
        &mut self,
        parent: Entity,
        components: impl hecs::DynamicBundle,
    ) -> Result<Entity, hecs::NoSuchEntity> {
        if !self.inner.contains(parent) {
            return Err(hecs::NoSuchEntity);
        }
        let child = self.inner.spawn(components);
        self.attach(child, parent)?;
        Ok(child)
    }

    /// Despawn an entity together with all of its descendants
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.inner.contains(entity) {
            return Err(hecs::NoSuchEntity);
        }
        self.detach(entity);

        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            if self.inner.despawn(current).is_err() {
                log::warn!("Child list of a despawned subtree referred to dead entity {current:?}");
            }
        }
        Ok(())
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Query for entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query::<Q>()
    }

    /// Remove `child` from its parent's `Children` and drop its `Parent`
    fn detach(&mut self, child: Entity) {
        if let Ok(parent) = self.inner.remove_one::<Parent>(child) {
            if let Ok(mut children) = self.inner.get::<&mut Children>(parent.entity()) {
                children.remove(child);
            }
        }
    }

    /// Record the `child` -> `parent` edge on both ends
    fn attach(&mut self, child: Entity, parent: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.inner.contains(parent) {
            return Err(hecs::NoSuchEntity);
        }
        self.inner.insert_one(child, Parent::new(parent))?;
        if let Ok(mut children) = self.inner.get::<&mut Children>(parent) {
            children.add(child);
            return Ok(());
        }
        self.inner.insert_one(parent, Children::single(child))
    }

    fn has_transform(&self, entity: Entity) -> bool {
        self.inner.get::<&Transform>(entity).is_ok()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy for World {
    fn parent(&self, entity: Entity) -> Option<Entity> {
        self.inner
            .get::<&Parent>(entity)
            .ok()
            .map(|parent| parent.entity())
    }

    fn children(&self, entity: Entity) -> ChildList {
        self.inner
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    fn roots(&self) -> Vec<Entity> {
        let mut roots: Vec<Entity> = self
            .inner
            .query::<(&Transform, Option<&Parent>)>()
            .iter()
            .filter_map(|(entity, (_, parent))| match parent {
                None => Some(entity),
                // Grouping parents without a transform do not place children
                Some(parent) => (!self.has_transform(parent.entity())).then_some(entity),
            })
            .collect();
        // Archetype order is not stable across structural changes
        roots.sort_by_key(|entity| entity.id());
        roots
    }

    fn transform(&self, entity: Entity) -> Option<Transform> {
        self.inner.get::<&Transform>(entity).ok().map(|t| *t)
    }

    fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.inner.query_one_mut::<&mut Transform>(entity).ok()
    }

    fn name(&self, entity: Entity) -> String {
        self.inner
            .get::<&Name>(entity)
            .map(|name| name.0.clone())
            .unwrap_or_else(|_| format!("{entity:?}"))
    }
}

impl HierarchyMut for World {
    /// Rewire the parent edge. Cycles are not checked here; the transform
    /// reparent operation rejects them before calling this.
    fn set_parent(&mut self, child: Entity, new_parent: Option<Entity>) -> Result<(), Entity> {
        if !self.inner.contains(child) {
            return Err(child);
        }
        if let Some(parent) = new_parent {
            if !self.inner.contains(parent) {
                return Err(parent);
            }
        }

        self.detach(child);
        if let Some(parent) = new_parent {
            self.attach(child, parent).map_err(|_| parent)?;
        }
        Ok(())
    }
}

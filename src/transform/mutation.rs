//! Transform edits through the hierarchy
//!
//! Local setters only flag the entity. World setters re-derive the matching
//! local field immediately against the parent's current world state, so a
//! degenerate parent is reported at the call site and nothing is written.

use glam::{Quat, Vec3};
use hecs::Entity;

use super::{Propagator, TransformError};
use crate::ecs::{Hierarchy, Transform};
use crate::math::{LocalPose, decompose_local_from_world};

impl<H: Hierarchy> Propagator<'_, H> {
    /// Set the position relative to the parent
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if the entity has no transform
    pub fn set_local_position(
        &mut self,
        entity: Entity,
        position: Vec3,
    ) -> Result<(), TransformError> {
        self.edit(entity, |t| t.set_local_position(position))
    }

    /// Set the rotation relative to the parent
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if the entity has no transform
    pub fn set_local_rotation(
        &mut self,
        entity: Entity,
        rotation: Quat,
    ) -> Result<(), TransformError> {
        self.edit(entity, |t| t.set_local_rotation(rotation))
    }

    /// Set the rotation relative to the parent from XYZ Euler degrees
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if the entity has no transform
    pub fn set_local_rotation_from_euler(
        &mut self,
        entity: Entity,
        degrees: Vec3,
    ) -> Result<(), TransformError> {
        self.edit(entity, |t| t.set_local_rotation_from_euler(degrees))
    }

    /// Set the scale relative to the parent
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if the entity has no transform
    pub fn set_local_scale(&mut self, entity: Entity, scale: Vec3) -> Result<(), TransformError> {
        self.edit(entity, |t| t.set_local_scale(scale))
    }

    /// Place the entity at an absolute position
    ///
    /// The local position is derived from the parent's world state as it is
    /// stored now. If the parent was edited and not yet synced, the next
    /// Local→World pass applies the parent's change on top and the entity
    /// ends up away from `position`; sync the parent first (or enable
    /// `immediate_mode`) to place it exactly.
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if the entity has no transform, or
    /// `DegenerateParentScale` if the parent's world scale has a zero
    /// component. Nothing is written on error.
    pub fn set_world_position(
        &mut self,
        entity: Entity,
        position: Vec3,
    ) -> Result<(), TransformError> {
        let current = self.require(entity)?;
        let local = self.local_from_world(
            entity,
            position,
            current.world_rotation(),
            current.world_scale(),
        )?;
        self.edit_world(entity, |t| {
            t.set_local_position(local.position);
            t.write_world_position(position);
        })
    }

    /// Give the entity an absolute rotation
    ///
    /// # Errors
    ///
    /// See [`Propagator::set_world_position`]
    pub fn set_world_rotation(
        &mut self,
        entity: Entity,
        rotation: Quat,
    ) -> Result<(), TransformError> {
        let current = self.require(entity)?;
        let local = self.local_from_world(
            entity,
            current.world_position(),
            rotation,
            current.world_scale(),
        )?;
        self.edit_world(entity, |t| {
            t.set_local_rotation(local.rotation);
            t.write_world_rotation(rotation);
        })
    }

    /// Give the entity an absolute scale
    ///
    /// # Errors
    ///
    /// See [`Propagator::set_world_position`]
    pub fn set_world_scale(&mut self, entity: Entity, scale: Vec3) -> Result<(), TransformError> {
        let current = self.require(entity)?;
        let local = self.local_from_world(
            entity,
            current.world_position(),
            current.world_rotation(),
            scale,
        )?;
        self.edit_world(entity, |t| {
            t.set_local_scale(local.scale);
            t.write_world_scale(scale);
        })
    }

    fn require(&self, entity: Entity) -> Result<Transform, TransformError> {
        self.hierarchy
            .transform(entity)
            .ok_or(TransformError::MissingTransform { entity })
    }

    fn edit(
        &mut self,
        entity: Entity,
        write: impl FnOnce(&mut Transform),
    ) -> Result<(), TransformError> {
        let transform = self
            .hierarchy
            .transform_mut(entity)
            .ok_or(TransformError::MissingTransform { entity })?;
        write(transform);
        self.after_write(entity)
    }

    fn edit_world(
        &mut self,
        entity: Entity,
        write: impl FnOnce(&mut Transform),
    ) -> Result<(), TransformError> {
        let transform = self
            .hierarchy
            .transform_mut(entity)
            .ok_or(TransformError::MissingTransform { entity })?;
        write(transform);
        self.mark_children_parent_dirty(entity);
        self.after_write(entity)
    }

    fn after_write(&mut self, entity: Entity) -> Result<(), TransformError> {
        if self.config.immediate_mode {
            self.sync_subtree(entity)?;
        }
        Ok(())
    }

    fn local_from_world(
        &self,
        entity: Entity,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<LocalPose, TransformError> {
        match self.parent_pose(entity) {
            None => Ok(LocalPose {
                position,
                rotation,
                scale,
            }),
            Some((parent, pose)) => decompose_local_from_world(
                position,
                rotation,
                scale,
                pose.matrix,
                pose.rotation,
                pose.scale,
            )
            .map_err(|degenerate| self.degenerate(entity, parent, degenerate.scale)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TransformConfig;
    use crate::ecs::DirtyState;
    use crate::transform::testing::FakeHierarchy;

    const EPSILON: f32 = 1e-4;

    fn synced_pair(parent_scale: Vec3) -> (FakeHierarchy, Entity, Entity, Entity) {
        let mut tree = FakeHierarchy::default();
        let parent = tree.add(
            "parent",
            None,
            Transform::from_parts(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY, parent_scale),
        );
        let child = tree.add("child", Some(parent), Transform::from_position(Vec3::Y));
        let grandchild = tree.add("grandchild", Some(child), Transform::new());
        let config = TransformConfig::default();
        Propagator::new(&mut tree, &config).local_to_world();
        (tree, parent, child, grandchild)
    }

    #[test]
    fn test_local_setters_flag_entity() {
        let (mut tree, _, child, _) = synced_pair(Vec3::ONE);
        let config = TransformConfig::default();
        let mut propagator = Propagator::new(&mut tree, &config);

        propagator.set_local_position(child, Vec3::Z).unwrap();
        propagator
            .set_local_rotation_from_euler(child, Vec3::new(0.0, 90.0, 0.0))
            .unwrap();
        propagator.set_local_scale(child, Vec3::splat(2.0)).unwrap();

        let t = tree.get(child);
        assert_eq!(t.dirty_state(), DirtyState::SelfDirty);
        assert_eq!(t.local_position(), Vec3::Z);
        assert_eq!(t.local_euler_degrees(), Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(t.local_scale(), Vec3::splat(2.0));
    }

    #[test]
    fn test_set_world_position_against_unsynced_parent() {
        let (mut tree, parent, child, _) = synced_pair(Vec3::ONE);
        let config = TransformConfig::default();
        let target = Vec3::new(3.0, 3.0, 3.0);

        let mut propagator = Propagator::new(&mut tree, &config);
        propagator
            .set_local_position(parent, Vec3::new(2.0, 0.0, 0.0))
            .unwrap();
        propagator.set_world_position(child, target).unwrap();
        propagator.local_to_world();

        // Parent's pending move is applied on top of the write
        let moved = propagator.hierarchy().get(child).world_position();
        assert!((moved - Vec3::new(4.0, 3.0, 3.0)).length() < EPSILON);

        propagator.set_world_position(child, target).unwrap();
        propagator.local_to_world();
        assert!((tree.get(child).world_position() - target).length() < EPSILON);
    }

    #[test]
    fn test_set_world_position_flags_children() {
        let (mut tree, _, child, grandchild) = synced_pair(Vec3::ONE);
        let config = TransformConfig::default();

        Propagator::new(&mut tree, &config)
            .set_world_position(child, Vec3::new(3.0, 3.0, 3.0))
            .unwrap();

        let t = tree.get(child);
        assert!((t.local_position() - Vec3::new(2.0, 3.0, 3.0)).length() < EPSILON);
        assert_eq!(t.world_position(), Vec3::new(3.0, 3.0, 3.0));
        assert!(t.is_self_dirty());
        assert!(tree.get(grandchild).is_parent_dirty());
    }

    #[test]
    fn test_set_world_scale_and_rotation() {
        let (mut tree, _, child, _) = synced_pair(Vec3::splat(2.0));
        let config = TransformConfig::default();
        let rotation = Quat::from_rotation_y(0.5);

        let mut propagator = Propagator::new(&mut tree, &config);
        propagator.set_world_scale(child, Vec3::splat(6.0)).unwrap();
        propagator.set_world_rotation(child, rotation).unwrap();
        propagator.local_to_world();

        let t = tree.get(child);
        assert!((t.local_scale() - Vec3::splat(3.0)).length() < EPSILON);
        assert!((t.world_scale() - Vec3::splat(6.0)).length() < EPSILON);
        assert!(t.world_rotation().angle_between(rotation) < EPSILON);
    }

    #[test]
    fn test_degenerate_parent_rejected_without_writes() {
        let (mut tree, parent, child, _) = synced_pair(Vec3::ONE);
        let config = TransformConfig::default();

        let mut propagator = Propagator::new(&mut tree, &config);
        propagator
            .set_local_scale(parent, Vec3::new(0.0, 1.0, 1.0))
            .unwrap();
        propagator.local_to_world();
        let before = propagator.hierarchy().get(child);

        let result = propagator.set_world_position(child, Vec3::new(9.0, 9.0, 9.0));

        assert!(matches!(
            result,
            Err(TransformError::DegenerateParentScale { entity, .. }) if entity == child
        ));
        assert_eq!(tree.get(child), before);
    }

    #[test]
    fn test_immediate_mode_syncs_on_write() {
        let (mut tree, parent, child, _) = synced_pair(Vec3::ONE);
        let config = TransformConfig::default().with_immediate_mode(true);

        Propagator::new(&mut tree, &config)
            .set_local_position(parent, Vec3::new(0.0, 0.0, 2.0))
            .unwrap();

        assert_eq!(tree.get(parent).dirty_state(), DirtyState::Clean);
        assert_eq!(tree.get(child).world_position(), Vec3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn test_missing_transform() {
        let mut tree = FakeHierarchy::default();
        let bare = tree.add_without_transform("bare", None);
        let config = TransformConfig::default();

        let result = Propagator::new(&mut tree, &config).set_local_position(bare, Vec3::X);
        assert_eq!(result, Err(TransformError::MissingTransform { entity: bare }));
    }
}

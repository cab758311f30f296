//! Re-basing a subtree under a new parent

use glam::Mat4;
use hecs::Entity;

use super::local_to_world::is_outdated;
use super::{Propagator, TransformError};
use crate::ecs::{Hierarchy, HierarchyMut, ParentPose, Transform};
use crate::math::{LocalPose, decompose_local_from_world};

impl<H: HierarchyMut> Propagator<'_, H> {
    /// Move `entity` under `new_parent` (or make it a root) without moving
    /// it in world space.
    ///
    /// World values of the subtree and of the new parent are brought up to
    /// date on copies first. The entity's new local values are computed
    /// against the new parent's world state; descendants keep their local
    /// values. Only when every value is computed are the parent edge and the
    /// transforms written, so a failed call leaves the hierarchy untouched.
    ///
    /// # Errors
    ///
    /// - `MissingTransform` if `entity` or `new_parent` has no transform
    /// - `CyclicParent` if `new_parent` is `entity` or one of its descendants
    /// - `DegenerateParentScale` if the new parent's world scale has a zero
    ///   component, or a pending world write in the subtree cannot be
    ///   reconciled
    pub fn reparent(
        &mut self,
        entity: Entity,
        new_parent: Option<Entity>,
    ) -> Result<(), TransformError> {
        if self.hierarchy.transform(entity).is_none() {
            return Err(TransformError::MissingTransform { entity });
        }
        let new_parent_pose = match new_parent {
            None => None,
            Some(parent) => {
                if self.hierarchy.is_ancestor_or_self(entity, parent) {
                    return Err(TransformError::CyclicParent {
                        entity,
                        new_parent: parent,
                    });
                }
                Some((parent, self.fresh_transform(parent)?.pose()))
            }
        };

        let moved = self.fresh_transform(entity)?;
        let plan = self.plan_rebase(entity, moved, new_parent_pose)?;

        self.hierarchy
            .set_parent(entity, new_parent)
            .map_err(|missing| TransformError::NoSuchEntity { entity: missing })?;
        for (planned, transform) in &plan {
            if let Some(stored) = self.hierarchy.transform_mut(*planned) {
                *stored = *transform;
            }
        }

        let target = new_parent.map_or_else(
            || "the root".to_string(),
            |parent| format!("'{}'", self.hierarchy.name(parent)),
        );
        log::debug!(
            "Reparented '{}' under {target}, re-based {} entities",
            self.hierarchy.name(entity),
            plan.len()
        );
        Ok(())
    }

    /// Synced copies of every transform in the moved subtree, parents before
    /// children, with `moved` re-based onto `new_parent`.
    fn plan_rebase(
        &self,
        entity: Entity,
        mut moved: Transform,
        new_parent: Option<(Entity, ParentPose)>,
    ) -> Result<Vec<(Entity, Transform)>, TransformError> {
        let local = match new_parent {
            None => LocalPose {
                position: moved.world_position(),
                rotation: moved.world_rotation(),
                scale: moved.world_scale(),
            },
            Some((parent, pose)) => decompose_local_from_world(
                moved.world_position(),
                moved.world_rotation(),
                moved.world_scale(),
                pose.matrix,
                pose.rotation,
                pose.scale,
            )
            .map_err(|degenerate| self.degenerate(entity, parent, degenerate.scale))?,
        };
        moved.apply_local_pose(Some(local.position), Some(local.rotation), Some(local.scale));
        moved.set_parent_world_matrix(new_parent.map_or(Mat4::IDENTITY, |(_, pose)| pose.matrix));
        moved.clear_dirty();

        let mut plan = vec![(entity, moved)];
        let mut stack = Vec::new();
        self.children_frames(entity, moved.pose(), false, &mut stack);

        while let Some(frame) = stack.pop() {
            let Some(mut transform) = self.hierarchy.transform(frame.entity) else {
                continue;
            };
            if is_outdated(&transform, frame.parent) {
                self.recompute(&mut transform, frame.entity, frame.parent)?;
            }
            self.children_frames(frame.entity, transform.pose(), false, &mut stack);
            plan.push((frame.entity, transform));
        }
        Ok(plan)
    }
}

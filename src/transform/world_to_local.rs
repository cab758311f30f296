//! World→Local reconciliation

use hecs::Entity;

use super::{Frame, PassReport, Propagator, TransformError};
use crate::ecs::{Hierarchy, ParentPose, Transform};
use crate::math::decompose_local_from_world;

impl<H: Hierarchy> Propagator<'_, H> {
    /// Re-derive local values for every entity whose world values were
    /// written directly on the component.
    ///
    /// Each reconciled entity gets its world matrix rebuilt from its world
    /// fields and its direct children are flagged parent-dirty. Descendants
    /// are brought up to date by the next Local→World pass.
    pub fn world_to_local(&mut self) -> PassReport {
        let mut report = PassReport::default();
        for root in self.hierarchy.roots() {
            let mut stack = vec![Frame {
                entity: root,
                parent: None,
                parent_updated: false,
            }];

            while let Some(frame) = stack.pop() {
                report.stats.visited += 1;

                let Some(mut transform) = self.hierarchy.transform(frame.entity) else {
                    continue;
                };

                if transform.pending_world().any() {
                    if let Err(error) = self.reconcile(&mut transform, frame.entity, frame.parent)
                    {
                        report.fail(error);
                        continue;
                    }
                    transform.rebuild_world_matrix();
                    if let Some(stored) = self.hierarchy.transform_mut(frame.entity) {
                        *stored = transform;
                    }
                    self.mark_children_parent_dirty(frame.entity);
                    report.stats.reconciled += 1;
                }

                self.children_frames(frame.entity, transform.pose(), false, &mut stack);
            }
        }

        log::debug!(
            "World->Local pass: visited {}, reconciled {}, failed {}",
            report.stats.visited,
            report.stats.reconciled,
            report.stats.failed
        );
        report
    }

    /// Overwrite the local fields matching `transform`'s pending world
    /// writes, derived against `parent`. Returns whether anything was pending.
    ///
    /// Nothing is written when the parent scale is degenerate.
    pub(super) fn reconcile(
        &self,
        transform: &mut Transform,
        entity: Entity,
        parent: Option<(Entity, ParentPose)>,
    ) -> Result<bool, TransformError> {
        let pending = transform.pending_world();
        if !pending.any() {
            return Ok(false);
        }

        let (position, rotation, scale) = match parent {
            None => (
                transform.world_position(),
                transform.world_rotation(),
                transform.world_scale(),
            ),
            Some((parent, pose)) => {
                let local = decompose_local_from_world(
                    transform.world_position(),
                    transform.world_rotation(),
                    transform.world_scale(),
                    pose.matrix,
                    pose.rotation,
                    pose.scale,
                )
                .map_err(|degenerate| self.degenerate(entity, parent, degenerate.scale))?;
                (local.position, local.rotation, local.scale)
            }
        };

        transform.apply_local_pose(
            pending.position.then_some(position),
            pending.rotation.then_some(rotation),
            pending.scale.then_some(scale),
        );
        transform.clear_pending_world();
        Ok(true)
    }

    pub(super) fn mark_children_parent_dirty(&mut self, entity: Entity) {
        for child in self.hierarchy.children(entity) {
            if let Some(transform) = self.hierarchy.transform_mut(child) {
                transform.mark_parent_dirty();
            }
        }
    }
}

//! Local→World propagation

use glam::Mat4;
use hecs::Entity;

use super::{Frame, PassReport, PropagationStats, Propagator, TransformError};
use crate::ecs::{Hierarchy, ParentPose, Transform};

impl<H: Hierarchy> Propagator<'_, H> {
    /// Derive world values from local values across the whole hierarchy.
    ///
    /// An entity is recomputed when it was edited, when its parent was
    /// recomputed in this pass, or when its cached parent matrix no longer
    /// matches the parent. Pending direct world writes are reconciled first,
    /// against the parent's freshly updated state.
    ///
    /// When both dirty flags are set the parent wins: the entity keeps its
    /// local values and its world values follow the parent's new state.
    pub fn local_to_world(&mut self) -> PassReport {
        self.local_to_world_except(&[])
    }

    /// Local→World pass that leaves the subtrees rooted at `skipped`
    /// untouched, e.g. subtrees that already failed earlier in the tick.
    pub fn local_to_world_except(&mut self, skipped: &[Entity]) -> PassReport {
        let mut report = PassReport::default();
        for root in self.hierarchy.roots() {
            self.walk_local_to_world(
                Frame {
                    entity: root,
                    parent: None,
                    parent_updated: false,
                },
                skipped,
                &mut report,
            );
        }

        log::debug!(
            "Local->World pass: visited {}, recomputed {}, reconciled {}, failed {}",
            report.stats.visited,
            report.stats.recomputed,
            report.stats.reconciled,
            report.stats.failed
        );
        report
    }

    /// Run the Local→World pass over the subtree rooted at `entity` only,
    /// using its parent's current world state.
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if `entity` has no transform, or the first
    /// `DegenerateParentScale` hit in the subtree.
    pub fn sync_subtree(&mut self, entity: Entity) -> Result<PropagationStats, TransformError> {
        if self.hierarchy.transform(entity).is_none() {
            return Err(TransformError::MissingTransform { entity });
        }

        let mut report = PassReport::default();
        let parent = self.parent_pose(entity);
        self.walk_local_to_world(
            Frame {
                entity,
                parent,
                parent_updated: false,
            },
            &[],
            &mut report,
        );
        report.into_result()
    }

    fn walk_local_to_world(
        &mut self,
        start: Frame,
        skipped: &[Entity],
        report: &mut PassReport,
    ) {
        let mut stack = vec![start];

        while let Some(frame) = stack.pop() {
            if skipped.contains(&frame.entity) {
                continue;
            }
            report.stats.visited += 1;

            let Some(transform) = self.hierarchy.transform(frame.entity) else {
                log::warn!(
                    "Entity '{}' is in the hierarchy but has no Transform",
                    self.hierarchy.name(frame.entity)
                );
                continue;
            };

            let updated = frame.parent_updated || is_outdated(&transform, frame.parent);

            let pose = if updated {
                match self.update_local_to_world(frame.entity, frame.parent, report) {
                    Ok(pose) => pose,
                    Err(error) => {
                        // Nothing below a failed entity is touched this pass
                        report.fail(error);
                        continue;
                    }
                }
            } else {
                transform.pose()
            };

            self.children_frames(frame.entity, pose, updated, &mut stack);
        }
    }

    /// Recompute one entity and return the pose its children should use.
    /// Works on a copy so a failure leaves the stored transform untouched.
    fn update_local_to_world(
        &mut self,
        entity: Entity,
        parent: Option<(Entity, ParentPose)>,
        report: &mut PassReport,
    ) -> Result<ParentPose, TransformError> {
        let mut transform = self
            .hierarchy
            .transform(entity)
            .ok_or(TransformError::MissingTransform { entity })?;

        if self.recompute(&mut transform, entity, parent)? {
            report.stats.reconciled += 1;
        }

        let pose = transform.pose();
        if let Some(stored) = self.hierarchy.transform_mut(entity) {
            *stored = transform;
        }
        report.stats.recomputed += 1;
        log::trace!("Recomputed world transform of {entity:?}");
        Ok(pose)
    }

    /// Reconcile pending world writes, then derive world values from local
    /// values. Returns whether anything was reconciled.
    pub(super) fn recompute(
        &self,
        transform: &mut Transform,
        entity: Entity,
        parent: Option<(Entity, ParentPose)>,
    ) -> Result<bool, TransformError> {
        let reconciled = self.reconcile(transform, entity, parent)?;
        transform.apply_local_to_world(
            parent.as_ref().map(|(_, pose)| pose),
            self.config.renormalize_world_rotation,
        );
        Ok(reconciled)
    }

    /// Up-to-date copy of `entity`'s transform, computed from the top of its
    /// ancestor chain down. Nothing is written to the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `MissingTransform` if `entity` has no transform, or
    /// `DegenerateParentScale` if a pending world write on the chain cannot
    /// be reconciled.
    pub(super) fn fresh_transform(&self, entity: Entity) -> Result<Transform, TransformError> {
        let mut chain = vec![entity];
        let mut current = entity;
        while let Some(parent) = self.hierarchy.parent(current) {
            // A parent without a transform ends the chain, as for roots
            if self.hierarchy.transform(parent).is_none() {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        let mut parent: Option<(Entity, ParentPose)> = None;
        let mut parent_updated = false;
        let mut fresh = None;
        for &link in chain.iter().rev() {
            let mut transform = self
                .hierarchy
                .transform(link)
                .ok_or(TransformError::MissingTransform { entity: link })?;
            let updated = parent_updated || is_outdated(&transform, parent);
            if updated {
                self.recompute(&mut transform, link, parent)?;
            }
            parent = Some((link, transform.pose()));
            parent_updated = updated;
            fresh = Some(transform);
        }
        fresh.ok_or(TransformError::MissingTransform { entity })
    }
}

/// Whether `transform` was edited, or was last synced against a different
/// parent matrix than `parent`'s current one (identity for roots).
pub(super) fn is_outdated(transform: &Transform, parent: Option<(Entity, ParentPose)>) -> bool {
    let expected = parent.map_or(Mat4::IDENTITY, |(_, pose)| pose.matrix);
    transform.is_stale() || transform.parent_world_matrix() != expected
}

//! Hierarchical transform propagation
//!
//! Keeps every entity's local (parent-relative) and world transform in
//! agreement while entities are edited and reparented.
//!
//! # Passes
//!
//! - **Local→World** ([`Propagator::local_to_world`]): roots first, parents
//!   before children. Derives world values from local values wherever an
//!   entity or one of its ancestors changed.
//! - **World→Local** ([`Propagator::world_to_local`]): re-derives local values
//!   after world values were written directly on the component.
//! - **Reparent** ([`Propagator::reparent`]): re-bases a subtree under a new
//!   parent without moving it in world space.
//!
//! Both passes walk the tree with an explicit stack, so hierarchy depth is
//! not limited by the call stack. Clean entities cost a few flag checks and
//! are never written.
//!
//! # Example
//!
//! ```ignore
//! let mut world = World::new();
//! let ship = world.spawn_named("ship", Transform::from_position(Vec3::X));
//! let turret = world.spawn_child(ship, (Transform::from_position(Vec3::Y),))?;
//!
//! let mut system = TransformSystem::new(TransformConfig::default());
//! system.update(&mut world);
//!
//! // turret world position is now (1, 1, 0)
//! ```

mod error;
mod local_to_world;
mod mutation;
mod reparent;
mod system;
#[cfg(test)]
mod testing;
mod world_to_local;

pub use error::TransformError;
pub use system::TransformSystem;

use std::ops::AddAssign;

use glam::Mat4;
use hecs::Entity;

use crate::core::TransformConfig;
use crate::ecs::{Hierarchy, ParentPose};

/// Counters for one propagation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Entities reached by the traversal
    pub visited: usize,
    /// Entities whose world matrix was recomputed
    pub recomputed: usize,
    /// Entities whose local values were re-derived from world values
    pub reconciled: usize,
    /// Subtrees aborted by an error
    pub failed: usize,
}

impl AddAssign for PropagationStats {
    fn add_assign(&mut self, other: Self) {
        self.visited += other.visited;
        self.recomputed += other.recomputed;
        self.reconciled += other.reconciled;
        self.failed += other.failed;
    }
}

/// Outcome of a pass over the whole hierarchy.
///
/// A failing subtree does not stop the pass; its error is collected here and
/// the remaining subtrees are still synchronized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Pass counters
    pub stats: PropagationStats,
    /// One error per aborted subtree
    pub errors: Vec<TransformError>,
}

impl PassReport {
    /// Check whether every subtree completed
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: PassReport) {
        self.stats += other.stats;
        self.errors.extend(other.errors);
    }

    /// Convert into a `Result`, keeping the first error
    ///
    /// # Errors
    ///
    /// Returns the first error recorded by the pass
    pub fn into_result(self) -> Result<PropagationStats, TransformError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.stats),
        }
    }

    fn fail(&mut self, error: TransformError) {
        self.stats.failed += 1;
        self.errors.push(error);
    }
}

/// One pending visit in a tree walk
#[derive(Debug, Clone, Copy)]
struct Frame {
    entity: Entity,
    parent: Option<(Entity, ParentPose)>,
    parent_updated: bool,
}

/// Runs propagation passes and transform edits against an injected
/// [`Hierarchy`].
///
/// Holds the hierarchy mutably for its whole lifetime, so the tree cannot be
/// restructured from elsewhere while a pass is running.
pub struct Propagator<'a, H: Hierarchy> {
    hierarchy: &'a mut H,
    config: &'a TransformConfig,
}

impl<'a, H: Hierarchy> Propagator<'a, H> {
    /// Create a propagator over `hierarchy`
    pub fn new(hierarchy: &'a mut H, config: &'a TransformConfig) -> Self {
        Self { hierarchy, config }
    }

    /// Borrow the underlying hierarchy
    #[must_use]
    pub fn hierarchy(&self) -> &H {
        &*self.hierarchy
    }

    /// Read an entity's world matrix.
    ///
    /// Returns the cached value even when the entity has not been synced
    /// since its last edit; that read is logged as a warning when
    /// `warn_on_stale_read` is enabled.
    #[must_use]
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let transform = self.hierarchy.transform(entity)?;
        if transform.is_stale() && self.config.warn_on_stale_read {
            log::warn!(
                "Reading world matrix of '{}' before propagation, value may be one tick behind",
                self.hierarchy.name(entity)
            );
        }
        Some(transform.world_matrix())
    }

    /// The parent of `entity` together with its current world state.
    ///
    /// A parent without a transform is treated as absent.
    fn parent_pose(&self, entity: Entity) -> Option<(Entity, ParentPose)> {
        let parent = self.hierarchy.parent(entity)?;
        match self.hierarchy.transform(parent) {
            Some(transform) => Some((parent, transform.pose())),
            None => {
                log::warn!(
                    "Parent '{}' of '{}' has no Transform, treating child as a root",
                    self.hierarchy.name(parent),
                    self.hierarchy.name(entity)
                );
                None
            }
        }
    }

    fn degenerate(&self, entity: Entity, parent: Entity, scale: glam::Vec3) -> TransformError {
        TransformError::DegenerateParentScale {
            entity,
            entity_name: self.hierarchy.name(entity),
            parent,
            parent_name: self.hierarchy.name(parent),
            scale,
        }
    }

    fn children_frames(
        &self,
        entity: Entity,
        pose: ParentPose,
        parent_updated: bool,
        stack: &mut Vec<Frame>,
    ) {
        // Reversed so children are visited in insertion order
        for &child in self.hierarchy.children(entity).iter().rev() {
            stack.push(Frame {
                entity: child,
                parent: Some((entity, pose)),
                parent_updated,
            });
        }
    }
}

//! Per-tick transform synchronization

use super::{PassReport, Propagator, TransformError};
use crate::core::{PassHistory, TransformConfig};
use crate::ecs::Hierarchy;

/// Runs the transform passes once per simulation tick.
///
/// Schedule it after everything that writes transforms (gameplay, physics,
/// animation) and before anything that reads world matrices (rendering,
/// audio). Failures are logged and the affected subtrees are skipped for this
/// tick; the rest of the hierarchy is still synchronized.
#[derive(Debug)]
pub struct TransformSystem {
    config: TransformConfig,
    history: PassHistory,
}

impl TransformSystem {
    /// Create a system with the given configuration
    #[must_use]
    pub fn new(config: TransformConfig) -> Self {
        let history = PassHistory::new(config.stats_history);
        Self { config, history }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Get the statistics of recent ticks
    #[must_use]
    pub fn history(&self) -> &PassHistory {
        &self.history
    }

    /// Borrow a propagator for edits and targeted passes between ticks
    pub fn propagator<'a, H: Hierarchy>(&'a self, hierarchy: &'a mut H) -> Propagator<'a, H> {
        Propagator::new(hierarchy, &self.config)
    }

    /// Synchronize the whole hierarchy: reconcile direct world writes, then
    /// propagate local values down from the roots.
    pub fn update<H: Hierarchy>(&mut self, hierarchy: &mut H) -> PassReport {
        let report = {
            let mut propagator = Propagator::new(hierarchy, &self.config);
            let mut report = propagator.world_to_local();
            let failed: Vec<_> = report.errors.iter().map(TransformError::entity).collect();
            report.merge(propagator.local_to_world_except(&failed));
            report
        };

        for error in &report.errors {
            log::error!("Transform propagation skipped a subtree this tick: {error}");
        }
        self.history.record(report.stats);
        report
    }
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::ecs::{Name, Transform, World};

    #[test]
    fn test_update_syncs_world() {
        let mut world = World::new();
        let root = world.spawn_named("root", Transform::from_position(Vec3::X));
        let child = world
            .spawn_child(root, (Transform::from_position(Vec3::Y),))
            .unwrap();

        let mut system = TransformSystem::default();
        let report = system.update(&mut world);

        assert!(report.is_ok());
        assert_eq!(report.stats.recomputed, 2);
        assert_eq!(
            world.transform(child).unwrap().world_position(),
            Vec3::new(1.0, 1.0, 0.0)
        );
        assert_eq!(system.history().total_passes(), 1);
    }

    #[test]
    fn test_update_syncs_children_of_grouping_entity() {
        let mut world = World::new();
        let group = world.spawn((Name::new("group"),));
        let child = world
            .spawn_child(group, (Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),))
            .unwrap();

        let mut system = TransformSystem::default();
        let report = system.update(&mut world);

        assert_eq!(report.stats.recomputed, 1);
        let t = world.transform(child).unwrap();
        assert_eq!(t.world_position(), Vec3::new(2.0, 0.0, 0.0));
        assert!(!t.is_stale());
    }

    #[test]
    fn test_update_reconciles_direct_world_writes() {
        let mut world = World::new();
        let root = world.spawn_named("root", Transform::from_position(Vec3::X));
        let child = world.spawn_child(root, (Transform::new(),)).unwrap();
        let mut system = TransformSystem::default();
        system.update(&mut world);

        // Physics-style write straight into the component
        world
            .get_mut::<Transform>(child)
            .unwrap()
            .set_world_position(Vec3::new(1.0, 5.0, 0.0));
        let report = system.update(&mut world);

        assert_eq!(report.stats.reconciled, 1);
        let t = world.transform(child).unwrap();
        assert!((t.local_position() - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);
        assert!((t.world_position() - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-4);
        assert!(!t.is_stale());
    }

    #[test]
    fn test_update_reports_degenerate_subtree_and_continues() {
        let mut world = World::new();
        let flat = world.spawn_named("flat", Transform::new());
        let child = world.spawn_child(flat, (Transform::new(),)).unwrap();
        let healthy = world.spawn_named("healthy", Transform::new());
        let mut system = TransformSystem::default();
        system.update(&mut world);

        world
            .get_mut::<Transform>(flat)
            .unwrap()
            .set_local_scale(Vec3::new(1.0, 0.0, 1.0));
        system.update(&mut world);

        world
            .get_mut::<Transform>(child)
            .unwrap()
            .set_world_position(Vec3::ONE);
        world
            .get_mut::<Transform>(healthy)
            .unwrap()
            .set_local_position(Vec3::Z);
        let report = system.update(&mut world);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].entity(), child);
        assert_eq!(world.transform(healthy).unwrap().world_position(), Vec3::Z);
        assert_eq!(system.history().total_failures(), 1);
    }
}

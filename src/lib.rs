//! Hierarchical scene transforms built on hecs
//!
//! This crate provides:
//! - Local and world transform components with dirty tracking
//! - Parent/child hierarchy stored in an ECS world
//! - Local→World and World→Local propagation passes
//! - Reparenting that keeps entities fixed in world space
//! - Scene capture and RON/JSON persistence

pub mod core;
pub mod ecs;
pub mod math;
pub mod transform;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{PassHistory, Scene, TransformConfig};
    pub use crate::ecs::{Children, Hierarchy, HierarchyMut, Name, Parent, Transform, World};
    pub use crate::transform::{
        PassReport, PropagationStats, Propagator, TransformError, TransformSystem,
    };
    pub use glam::{Mat4, Quat, Vec3};
}

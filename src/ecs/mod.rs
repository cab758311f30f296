//! Entity Component System module
//!
//! Built on top of the hecs ECS library

mod components;
mod hierarchy;
mod world;

pub use components::{DirtyState, Name, ParentPose, PendingWorld, Transform};
pub use hierarchy::{ChildList, Children, Hierarchy, HierarchyMut, Parent};
pub use world::World;

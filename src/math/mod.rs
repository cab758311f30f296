//! Affine math shared by the transform systems
//!
//! Pure functions only: building TRS matrices and recovering parent-relative
//! values from world-space ones.

mod compose;

pub use compose::{
    DegenerateScale, LocalPose, compose, decompose_local_from_world, euler_degrees_from_quat,
    quat_from_euler_degrees, sanitize_rotation,
};

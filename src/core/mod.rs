//! Core module
//!
//! Contains configuration, statistics and scene persistence

mod config;
mod debug;
mod scene;

pub use config::{ConfigError, TransformConfig};
pub use debug::PassHistory;
pub use scene::{Scene, SceneError, SerializedEntity, TransformRecord};

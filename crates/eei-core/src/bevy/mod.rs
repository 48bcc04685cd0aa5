//! Bevy integration for eei.
//!
//! The ECS owns a single `SceneDirector` resource. Systems translate window
//! input into `InputEvent`s, run one director frame per `Update`, and replay
//! the resulting draw list through gizmos.

pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use plugin::{EeiHeadlessPlugin, EeiPlugin, FrameSet};
pub use resources::*;
pub use systems::{HudText, MainCamera};

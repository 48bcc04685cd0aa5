//! Systems driving the scene director.
//!
//! Organized by functionality:
//! - input: ButtonInput/window state to `InputEvent`s
//! - scene: command processing, frame dispatch, audio and status sync
//! - rendering: camera, draw list replay through gizmos, HUD

pub mod input;
pub mod rendering;
pub mod scene;

pub use input::*;
pub use rendering::*;
pub use scene::*;

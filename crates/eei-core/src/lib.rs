//! EEI Core Library
//!
//! Authoring model, composition format and runtime for eei scenes.
//!
//! The library is split into two layers:
//! - Plain modules: the editor tree (`model`), the JSON composition codec
//!   (`composition`), the playback runtime (`runtime`) and the scenes that
//!   drive them. None of these touch the ECS.
//! - Bevy integration (`bevy`): plugins that feed window input into the
//!   active scene and turn its draw list into gizmos.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod composition;
pub mod config;
pub mod context;
pub mod draw;
pub mod input;
pub mod model;
pub mod payload;
pub mod payloads;
pub mod physics;
pub mod registry;
pub mod runtime;
pub mod scene;
pub mod scenes;
pub mod state;

// Bevy integration
pub mod bevy;

pub use composition::{
    COMPOSITION_VERSION, CompositionDocument, CompositionError, ExportOptions, Metadata,
    NodeEntry, SceneBlock, Transform, load_composition, resolve_composition_path,
};
pub use config::{AppConfig, CompositionPaths, ConfigError, EditorConfig, WindowConfig};
pub use context::{AppContext, AudioCommand, AudioQueue, SceneRequest};
pub use draw::{DrawCommand, DrawList, Rgba};
pub use input::{InputEvent, Key, Modifiers, PointerButton};
pub use model::{EditorModel, Node, NodeId, NodeKind};
pub use payload::{Payload, PayloadTransform, Spawnable};
pub use physics::MassBody;
pub use registry::{PaletteItem, PaletteKind, PaletteRegistry};
pub use runtime::{CompositionRuntime, RuntimeNode};
pub use scene::{Scene, SceneDirector};
pub use state::StateError;

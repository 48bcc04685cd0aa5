//! Bevy plugins for eei.
//!
//! Provides:
//! - `EeiHeadlessPlugin`: director, input translation and command processing
//!   without window or rendering dependencies, for headless testing
//! - `EeiPlugin`: `EeiHeadlessPlugin` + cursor tracking, camera, gizmos and HUD

use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;

use crate::bevy::resources::*;
use crate::bevy::systems;
use crate::config::AppConfig;
use crate::registry::PaletteRegistry;
use crate::scenes::{MAIN_SCENE, default_director};

/// Ordering of the per-frame work in `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Window and device input to `FrameInput`.
    Gather,
    /// Commands, director frame, audio.
    Run,
}

// ============================================================================
// Headless Plugin (logic only, no rendering/window dependencies)
// ============================================================================

/// Headless plugin running the scene director.
///
/// Use this plugin in tests with `MinimalPlugins`. The `ButtonInput`
/// resources must exist, either from `InputPlugin` or inserted directly.
///
/// Excluded systems (window/rendering-dependent):
/// - Cursor and window size tracking (`track_cursor`, `watch_window_size`)
/// - Camera2d and HUD spawning (`setup_camera`)
/// - Gizmo replay of the draw list (`draw_scene_gizmos`, `update_hud`)
pub struct EeiHeadlessPlugin {
    pub config: AppConfig,
    pub registry: Arc<PaletteRegistry>,
    /// Composition file overriding the configured candidates.
    pub composition: Option<PathBuf>,
    pub start_scene: String,
    pub command_queue: Option<CommandQueue>,
    pub status_store: Option<StatusStore>,
}

impl Default for EeiHeadlessPlugin {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            registry: Arc::new(PaletteRegistry::builtin()),
            composition: None,
            start_scene: MAIN_SCENE.to_string(),
            command_queue: None,
            status_store: None,
        }
    }
}

impl Plugin for EeiHeadlessPlugin {
    fn build(&self, app: &mut App) {
        // ====================================================================
        // Resources
        // ====================================================================
        let director = default_director(
            &self.config,
            Arc::clone(&self.registry),
            self.composition.clone(),
        );

        app.insert_resource(SceneDirectorRes(director))
            .insert_resource(StartScene(self.start_scene.clone()))
            .insert_resource(self.command_queue.clone().unwrap_or_default())
            .insert_resource(self.status_store.clone().unwrap_or_default())
            .init_resource::<FrameInput>()
            .init_resource::<DrawListRes>()
            .init_resource::<AudioLog>();

        // ====================================================================
        // Systems
        // ====================================================================
        app.configure_sets(Update, (FrameSet::Gather, FrameSet::Run).chain());

        app.add_systems(Startup, systems::enter_start_scene);

        app.add_systems(
            Update,
            (systems::collect_keyboard_input, systems::collect_mouse_input)
                .chain()
                .in_set(FrameSet::Gather),
        );

        app.add_systems(
            Update,
            (
                systems::process_commands,
                systems::run_scene_frame,
                systems::drain_audio,
                systems::exit_when_stopped,
            )
                .chain()
                .in_set(FrameSet::Run),
        );

        app.add_systems(PostUpdate, systems::sync_status);
        app.add_systems(Last, systems::shutdown_on_exit);
    }
}

// ============================================================================
// Windowed Plugin (headless + window/rendering)
// ============================================================================

/// Full plugin for the windowed application.
#[derive(Default)]
pub struct EeiPlugin {
    pub headless: EeiHeadlessPlugin,
}

impl EeiPlugin {
    pub fn new(config: AppConfig, composition: Option<PathBuf>, start_scene: &str) -> Self {
        Self {
            headless: EeiHeadlessPlugin {
                config,
                composition,
                start_scene: start_scene.to_string(),
                ..Default::default()
            },
        }
    }
}

impl Plugin for EeiPlugin {
    fn build(&self, app: &mut App) {
        let headless = &self.headless;
        app.add_plugins(EeiHeadlessPlugin {
            config: headless.config.clone(),
            registry: Arc::clone(&headless.registry),
            composition: headless.composition.clone(),
            start_scene: headless.start_scene.clone(),
            command_queue: headless.command_queue.clone(),
            status_store: headless.status_store.clone(),
        });

        app.add_systems(Startup, systems::setup_camera);

        app.add_systems(
            Update,
            (systems::watch_window_size, systems::track_cursor)
                .chain()
                .in_set(FrameSet::Gather)
                .before(systems::collect_keyboard_input),
        );

        app.add_systems(
            PostUpdate,
            (systems::draw_scene_gizmos, systems::update_hud).after(systems::sync_status),
        );
    }
}

//! Test utilities for headless Bevy integration tests.
//!
//! Provides `TestApp`, a wrapper around `bevy::app::App` that uses
//! `MinimalPlugins` + `EeiHeadlessPlugin` for testing the scene director
//! without a rendering or windowing backend.

use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::bevy::plugin::EeiHeadlessPlugin;
use crate::bevy::resources::{
    AudioLog, CommandQueue, DrawListRes, SceneCommand, SceneDirectorRes, StatusStore,
    StatusSummary,
};
use crate::scenes::{EDITOR_SCENE, MAIN_SCENE};

/// A headless Bevy app wrapper for testing.
///
/// Both scenes read and write a composition file inside a private temporary
/// directory, so tests never touch the repository assets.
pub(crate) struct TestApp {
    pub app: App,
    export_path: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Create a new test app starting in the main scene.
    pub fn new() -> Self {
        Self::with_start_scene(MAIN_SCENE)
    }

    /// Create a new test app starting in the editor.
    pub fn in_editor() -> Self {
        Self::with_start_scene(EDITOR_SCENE)
    }

    pub fn with_start_scene(scene: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let export_path = dir.path().join("test_export.eei.json");

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        // No InputPlugin: button state stays as tests set it until cleared.
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<ButtonInput<MouseButton>>();
        app.add_plugins(EeiHeadlessPlugin {
            composition: Some(export_path.clone()),
            start_scene: scene.to_string(),
            ..Default::default()
        });
        // Pause virtual time so frame deltas stay at zero.
        app.world_mut().resource_mut::<Time<Virtual>>().pause();
        // Run one update to enter the start scene
        app.update();

        Self {
            app,
            export_path,
            _dir: dir,
        }
    }

    /// Run a single frame update.
    pub fn update(&mut self) {
        self.app.update();
    }

    /// Push a command and run one frame.
    pub fn send(&mut self, command: SceneCommand) {
        self.app.world().resource::<CommandQueue>().push(command);
        self.update();
    }

    /// Hold `code` for one frame, then release it.
    pub fn press_key(&mut self, code: KeyCode) {
        self.app
            .world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(code);
        self.update();

        let mut keys = self.app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release(code);
        keys.clear();
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub fn active_scene(&self) -> Option<String> {
        self.app
            .world()
            .resource::<SceneDirectorRes>()
            .0
            .active_name()
            .map(str::to_string)
    }

    pub fn status(&self) -> StatusSummary {
        self.app.world().resource::<StatusStore>().get_summary()
    }

    pub fn draw_list_len(&self) -> usize {
        self.app.world().resource::<DrawListRes>().0.len()
    }

    pub fn audio_log(&self) -> &AudioLog {
        self.app.world().resource::<AudioLog>()
    }
}

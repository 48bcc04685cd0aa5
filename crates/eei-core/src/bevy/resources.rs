//! ECS resources wrapping the scene director and its per-frame buffers.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::{Mutex, RwLock};

use crate::context::AudioCommand;
use crate::draw::DrawList;
use crate::input::InputEvent;
use crate::scene::SceneDirector;

/// Maximum number of audio commands kept in `AudioLog`.
const MAX_AUDIO_LOG: usize = 64;

/// The scene director driven by the ECS schedule.
#[derive(Resource)]
pub struct SceneDirectorRes(pub SceneDirector);

/// Scene the director enters on startup.
#[derive(Resource, Debug, Clone)]
pub struct StartScene(pub String);

/// Commands pushed from outside the ECS (tests, tooling).
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    /// Deliver an input event as if it came from the window.
    Input(InputEvent),
    SwitchScene(String),
    CycleScene(i32),
    Quit,
}

/// Thread-safe queue of `SceneCommand`s drained once per frame.
#[derive(Resource, Clone)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<SceneCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, command: SceneCommand) {
        self.inner.lock().push_back(command);
    }

    pub fn drain(&self) -> Vec<SceneCommand> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Input events gathered during the current frame.
#[derive(Resource, Debug, Default)]
pub struct FrameInput {
    /// Last known pointer position in canvas space.
    pub cursor: Vec2,
    pub events: Vec<InputEvent>,
}

impl FrameInput {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Draw commands produced by the active scene this frame.
#[derive(Resource, Debug, Default)]
pub struct DrawListRes(pub DrawList);

/// Recently issued audio commands, oldest first.
#[derive(Resource, Debug, Default)]
pub struct AudioLog {
    entries: VecDeque<AudioCommand>,
}

impl AudioLog {
    pub fn record(&mut self, command: AudioCommand) {
        if self.entries.len() >= MAX_AUDIO_LOG {
            self.entries.pop_front();
        }
        self.entries.push_back(command);
    }

    pub fn entries(&self) -> impl Iterator<Item = &AudioCommand> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&AudioCommand> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Status summary shown in the HUD.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSummary {
    pub scene: Option<String>,
    pub rows: Vec<String>,
}

/// Shared snapshot of the director status, readable outside the ECS.
#[derive(Resource, Clone, Default)]
pub struct StatusStore {
    summary: Arc<RwLock<StatusSummary>>,
    version: Arc<RwLock<u64>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_summary(&self) -> StatusSummary {
        self.summary.read().clone()
    }

    pub fn get_version(&self) -> u64 {
        *self.version.read()
    }

    /// Replace the summary. The version only moves when something changed.
    pub fn update(&self, summary: StatusSummary) {
        let mut current = self.summary.write();
        if *current == summary {
            return;
        }
        *current = summary;
        *self.version.write() += 1;
    }
}

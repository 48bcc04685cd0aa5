//! Per-application context handed to scenes and payload hooks.

use std::collections::VecDeque;

use bevy::math::Vec2;

/// Audio requests produced by payloads. The shell drains and plays them.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    PlayMusic {
        track: String,
        volume: f32,
        looping: bool,
        fade_ms: u32,
    },
    StopMusic {
        fade_ms: u32,
    },
}

/// FIFO of pending audio commands.
#[derive(Debug, Clone, Default)]
pub struct AudioQueue {
    pending: VecDeque<AudioCommand>,
    music_playing: bool,
}

impl AudioQueue {
    pub fn play_music(&mut self, track: impl Into<String>, volume: f32, looping: bool, fade_ms: u32) {
        self.music_playing = true;
        self.pending.push_back(AudioCommand::PlayMusic {
            track: track.into(),
            volume,
            looping,
            fade_ms,
        });
    }

    pub fn stop_music(&mut self, fade_ms: u32) {
        self.music_playing = false;
        self.pending.push_back(AudioCommand::StopMusic { fade_ms });
    }

    /// Whether the last music command was a play.
    pub fn is_music_playing(&self) -> bool {
        self.music_playing
    }

    pub fn drain(&mut self) -> Vec<AudioCommand> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Scene switch requested from inside a scene. Applied at the end of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneRequest {
    Switch(String),
}

#[derive(Debug, Clone)]
pub struct AppContext {
    /// Size of the drawable canvas in logical pixels.
    pub viewport: Vec2,
    /// Seconds since the application started.
    pub elapsed: f32,
    pub audio: AudioQueue,
    scene_request: Option<SceneRequest>,
    running: bool,
}

impl AppContext {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            elapsed: 0.0,
            audio: AudioQueue::default(),
            scene_request: None,
            running: true,
        }
    }

    /// Ask the director to switch to the scene registered under `name`.
    pub fn request_scene(&mut self, name: impl Into<String>) {
        self.scene_request = Some(SceneRequest::Switch(name.into()));
    }

    pub fn take_scene_request(&mut self) -> Option<SceneRequest> {
        self.scene_request.take()
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Vec2::new(640.0, 360.0))
    }
}

//! Scene director systems.

use bevy::app::AppExit;
use bevy::prelude::*;

use crate::bevy::resources::{
    AudioLog, CommandQueue, DrawListRes, FrameInput, SceneCommand, SceneDirectorRes, StartScene,
    StatusStore, StatusSummary,
};
use crate::context::AudioCommand;
use crate::scene::SceneDirector;

/// Startup system entering the configured first scene.
pub fn enter_start_scene(mut director: ResMut<SceneDirectorRes>, start: Res<StartScene>) {
    if !director.0.set_scene_by_name(&start.0) {
        tracing::warn!("[eei] falling back to the first registered scene");
        director.0.set_scene(0);
    }
}

/// System to process all commands from the external command queue.
pub fn process_commands(
    queue: Res<CommandQueue>,
    mut director: ResMut<SceneDirectorRes>,
    mut frame: ResMut<FrameInput>,
) {
    for command in queue.drain() {
        match command {
            SceneCommand::Input(event) => {
                if let Some(position) = event.pointer_position() {
                    frame.cursor = position;
                }
                frame.push(event);
            }
            SceneCommand::SwitchScene(name) => {
                tracing::info!("[command] SwitchScene: {name}");
                director.0.set_scene_by_name(&name);
            }
            SceneCommand::CycleScene(step) => {
                tracing::info!("[command] CycleScene: {step}");
                director.0.cycle_scene(step);
            }
            SceneCommand::Quit => {
                tracing::info!("[command] Quit");
                director.0.context_mut().quit();
            }
        }
    }
}

/// System running one director frame: events, update, render and any
/// scene switch requested along the way.
pub fn run_scene_frame(
    time: Res<Time>,
    mut director: ResMut<SceneDirectorRes>,
    mut frame: ResMut<FrameInput>,
    mut draw: ResMut<DrawListRes>,
) {
    let events = frame.take();
    director.0.frame(&events, time.delta_secs(), &mut draw.0);
}

fn flush_audio(director: &mut SceneDirector, log: &mut AudioLog) {
    for command in director.context_mut().audio.drain() {
        match &command {
            AudioCommand::PlayMusic {
                track,
                volume,
                looping,
                fade_ms,
            } => {
                tracing::info!(
                    "[audio] play {track} (volume={volume}, loop={looping}, fade={fade_ms}ms)"
                );
            }
            AudioCommand::StopMusic { fade_ms } => {
                tracing::info!("[audio] stop (fade={fade_ms}ms)");
            }
        }
        log.record(command);
    }
}

/// System to hand queued audio requests to the audio backend.
///
/// There is no mixer yet; requests are logged and kept in `AudioLog`.
pub fn drain_audio(mut director: ResMut<SceneDirectorRes>, mut log: ResMut<AudioLog>) {
    flush_audio(&mut director.0, &mut log);
}

/// System to publish the director status to the shared store.
pub fn sync_status(director: Res<SceneDirectorRes>, store: Res<StatusStore>) {
    store.update(StatusSummary {
        scene: director.0.active_name().map(str::to_string),
        rows: director.0.status_rows(),
    });
}

/// System to request application exit once the context stopped running.
pub fn exit_when_stopped(director: Res<SceneDirectorRes>, mut exit: MessageWriter<AppExit>) {
    if !director.0.context().is_running() {
        exit.write(AppExit::Success);
    }
}

/// System to tear the active scene down when the app is exiting.
pub fn shutdown_on_exit(
    mut exits: MessageReader<AppExit>,
    mut director: ResMut<SceneDirectorRes>,
    mut log: ResMut<AudioLog>,
) {
    if exits.read().next().is_none() {
        return;
    }
    director.0.shutdown();
    flush_audio(&mut director.0, &mut log);
}

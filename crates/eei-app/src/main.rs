//! EEI
//!
//! Windowed shell: loads `settings.toml`, opens the window and runs the
//! scene director through `EeiPlugin`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use bevy::prelude::*;
use bevy::window::{MonitorSelection, WindowMode, WindowResolution};
use bevy::winit::{UpdateMode, WinitSettings};
use clap::{Parser, ValueEnum};
use eei_core::bevy::EeiPlugin;
use eei_core::scenes::{EDITOR_SCENE, MAIN_SCENE};
use eei_core::{AppConfig, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StartScene {
    Main,
    Editor,
}

impl StartScene {
    fn name(self) -> &'static str {
        match self {
            Self::Main => MAIN_SCENE,
            Self::Editor => EDITOR_SCENE,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "eei", version, about = "Play and edit eei compositions")]
struct Args {
    /// Settings file.
    #[arg(long, default_value = "settings.toml")]
    config: PathBuf,

    /// Composition to play and edit instead of the configured files.
    #[arg(long)]
    composition: Option<PathBuf>,

    /// Scene to start in.
    #[arg(long, value_enum, default_value_t = StartScene::Main)]
    scene: StartScene,
}

fn load_config(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    match AppConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(path)) => {
            tracing::warn!("[eei] {} not found, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(e) => Err(e).context("failed to load settings"),
    }
}

fn window_plugin(config: &AppConfig) -> WindowPlugin {
    let window = &config.window;
    let mode = if window.fullscreen {
        WindowMode::BorderlessFullscreen(MonitorSelection::Primary)
    } else {
        WindowMode::Windowed
    };

    WindowPlugin {
        primary_window: Some(Window {
            title: window.title.clone(),
            resolution: WindowResolution::new(window.width, window.height),
            resizable: window.resizable,
            mode,
            ..default()
        }),
        ..default()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;
    tracing::info!(
        "[eei] starting in {} scene ({}x{})",
        args.scene.name(),
        config.window.width,
        config.window.height
    );

    let frame_time = Duration::from_secs_f64(1.0 / f64::from(config.window.fps.max(1)));

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<bevy::log::LogPlugin>()
                .set(window_plugin(&config)),
        )
        .insert_resource(ClearColor(Color::WHITE))
        .insert_resource(WinitSettings {
            focused_mode: UpdateMode::reactive(frame_time),
            unfocused_mode: UpdateMode::reactive_low_power(frame_time),
        })
        .add_plugins(EeiPlugin::new(config, args.composition, args.scene.name()))
        .run();

    Ok(())
}

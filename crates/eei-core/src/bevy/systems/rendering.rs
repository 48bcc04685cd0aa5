//! Rendering systems.
//!
//! The scene draw list lives in canvas space (origin top-left, y down). The
//! 2D camera sits at the window center, so canvas points map to world points
//! by recentering and flipping y.

use bevy::prelude::*;
use bevy::sprite::Anchor;

use crate::bevy::resources::{DrawListRes, SceneDirectorRes, StatusStore};
use crate::draw::{DrawCommand, Rgba};

const HUD_MARGIN: f32 = 8.0;
const HUD_FONT_SIZE: f32 = 14.0;

/// Marker for the main camera.
#[derive(Component)]
pub struct MainCamera;

/// Marker for the status text overlay.
#[derive(Component)]
pub struct HudText;

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::srgba_u8(c.r, c.g, c.b, c.a)
    }
}

/// Convert a canvas point to world coordinates for a viewport of `size`.
pub fn canvas_to_world(point: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(point.x - size.x / 2.0, size.y / 2.0 - point.y)
}

/// Startup system spawning the camera and the HUD text.
pub fn setup_camera(mut commands: Commands) {
    tracing::info!("[eei] setup_camera called");
    commands.spawn((Camera2d, MainCamera));
    commands.spawn((
        HudText,
        Text2d::new(""),
        TextFont {
            font_size: HUD_FONT_SIZE,
            ..default()
        },
        TextColor(Color::BLACK),
        Anchor::TOP_LEFT,
        Transform::from_translation(Vec3::new(0.0, 0.0, 10.0)),
    ));
}

/// System to replay the scene draw list through gizmos.
pub fn draw_scene_gizmos(
    mut gizmos: Gizmos,
    draw: Res<DrawListRes>,
    director: Res<SceneDirectorRes>,
) {
    let viewport = director.0.context().viewport;
    let world = |p: Vec2| canvas_to_world(p, viewport);

    for command in &draw.0 {
        match *command {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                gizmos.circle_2d(Isometry2d::from_translation(world(center)), radius, Color::from(color));
            }
            DrawCommand::Rect {
                center,
                size,
                color,
            } => {
                gizmos.rect_2d(Isometry2d::from_translation(world(center)), size, Color::from(color));
            }
            DrawCommand::Line { start, end, color } => {
                gizmos.line_2d(world(start), world(end), Color::from(color));
            }
            DrawCommand::Ellipse {
                center,
                half_size,
                color,
            } => {
                gizmos.ellipse_2d(
                    Isometry2d::from_translation(world(center)),
                    half_size,
                    Color::from(color),
                );
            }
        }
    }
}

/// System to refresh the HUD from the status store.
pub fn update_hud(
    store: Res<StatusStore>,
    director: Res<SceneDirectorRes>,
    mut last_version: Local<Option<u64>>,
    mut hud: Query<(&mut Text2d, &mut Transform), With<HudText>>,
) {
    let Ok((mut text, mut transform)) = hud.single_mut() else {
        return;
    };

    let size = director.0.context().viewport;
    let corner = canvas_to_world(Vec2::splat(HUD_MARGIN), size);
    transform.translation.x = corner.x;
    transform.translation.y = corner.y;

    let version = store.get_version();
    if *last_version == Some(version) {
        return;
    }
    *last_version = Some(version);
    text.0 = store.get_summary().rows.join("\n");
}

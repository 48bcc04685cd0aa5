//! Environment payloads: zones and scene-wide effects that host entities.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::draw::{DrawList, Rgba};
use crate::payload::{Payload, PayloadTransform, Spawnable};
use crate::registry::PaletteRegistryBuilder;

/// Registration list for environments, in palette order.
pub fn register(builder: PaletteRegistryBuilder) -> PaletteRegistryBuilder {
    builder
        .environment::<BlackZone>("Black Zone")
        .environment::<MusicEnvironment>("Music")
        .environment::<VoidEnvironment>("Void Environment")
}

// ============================================================================
// BlackZone
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackZoneState {
    pub dims: [f32; 2],
}

/// A dark rectangle centered on its position.
#[derive(Debug, Clone)]
pub struct BlackZone {
    position: Vec2,
    transform: PayloadTransform,
    pub state: BlackZoneState,
}

impl Spawnable for BlackZone {
    const TYPE_PATH: &'static str = "environments::black_zone::BlackZone";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: BlackZoneState {
                dims: [200.0, 200.0],
            },
        }
    }
}

impl Payload for BlackZone {
    payload_state_accessors!();

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        draw.rect(self.position, Vec2::from(self.state.dims), Rgba::GRAY20);
    }
}

// ============================================================================
// MusicEnvironment
// ============================================================================

pub const DEFAULT_TRACK: &str = "demo.mp3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicState {
    pub track: String,
    pub volume: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub fade_ms: u32,
    /// Fade used when stopping; falls back to `fade_ms`.
    pub stop_fade_ms: Option<u32>,
}

/// Plays a background track while it is part of the live tree.
#[derive(Debug, Clone)]
pub struct MusicEnvironment {
    position: Vec2,
    transform: PayloadTransform,
    pub state: MusicState,
    active: bool,
}

impl MusicEnvironment {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Spawnable for MusicEnvironment {
    const TYPE_PATH: &'static str = "environments::music::MusicEnvironment";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: MusicState {
                track: DEFAULT_TRACK.to_string(),
                volume: 1.0,
                looping: true,
                fade_ms: 0,
                stop_fade_ms: None,
            },
            active: false,
        }
    }
}

impl Payload for MusicEnvironment {
    payload_state_accessors!();

    fn on_spawn(&mut self, ctx: &mut AppContext) {
        let track = if self.state.track.is_empty() {
            tracing::warn!("[music] empty track in composition, using {DEFAULT_TRACK}");
            DEFAULT_TRACK
        } else {
            self.state.track.as_str()
        };
        ctx.audio
            .play_music(track, self.state.volume, self.state.looping, self.state.fade_ms);
        self.active = true;
    }

    fn on_despawn(&mut self, ctx: &mut AppContext) {
        if !self.active {
            return;
        }
        ctx.audio
            .stop_music(self.state.stop_fade_ms.unwrap_or(self.state.fade_ms));
        self.active = false;
    }
}

// ============================================================================
// VoidEnvironment
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidEnvironmentState {
    pub visible: bool,
    pub radius: f32,
    pub color: [u8; 3],
    pub crosshair: bool,
}

/// Behaviorless environment used to anchor subtrees.
#[derive(Debug, Clone)]
pub struct VoidEnvironment {
    position: Vec2,
    transform: PayloadTransform,
    pub state: VoidEnvironmentState,
}

impl Spawnable for VoidEnvironment {
    const TYPE_PATH: &'static str = "environments::void::VoidEnvironment";

    fn spawn(position: Vec2) -> Self {
        Self {
            position,
            transform: PayloadTransform::default(),
            state: VoidEnvironmentState {
                visible: false,
                radius: 24.0,
                color: [50, 50, 50],
                crosshair: true,
            },
        }
    }
}

impl Payload for VoidEnvironment {
    payload_state_accessors!();

    fn radius(&self) -> f32 {
        self.state.radius.max(1.0)
    }

    fn render(&self, _ctx: &AppContext, draw: &mut DrawList) {
        if !self.state.visible {
            return;
        }
        let color = Rgba::from_array(self.state.color);
        let radius = self.radius();
        draw.circle(self.position, radius, color);

        if self.state.crosshair {
            let arm = (radius / 2.0).max(4.0);
            draw.line(
                self.position - Vec2::new(arm, 0.0),
                self.position + Vec2::new(arm, 0.0),
                color,
            );
            draw.line(
                self.position - Vec2::new(0.0, arm),
                self.position + Vec2::new(0.0, arm),
                color,
            );
        }
    }
}

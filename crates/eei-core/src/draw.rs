//! Immediate-mode draw list.
//!
//! Scenes and payloads describe what they want drawn each frame in canvas
//! space; the Bevy layer replays the list through gizmos.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Dark gray used for zones.
    pub const GRAY20: Self = Self::rgb(51, 51, 51);
    pub const HIGHLIGHT: Self = Self::rgb(255, 200, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_array(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    /// Axis-aligned rectangle given by its center.
    Rect {
        center: Vec2,
        size: Vec2,
        color: Rgba,
    },
    Line {
        start: Vec2,
        end: Vec2,
        color: Rgba,
    },
    Ellipse {
        center: Vec2,
        half_size: Vec2,
        color: Rgba,
    },
}

/// Ordered list of draw commands for one frame. Later commands draw on top.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn rect(&mut self, center: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect {
            center,
            size,
            color,
        });
    }

    pub fn line(&mut self, start: Vec2, end: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Line { start, end, color });
    }

    pub fn ellipse(&mut self, center: Vec2, half_size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Ellipse {
            center,
            half_size,
            color,
        });
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

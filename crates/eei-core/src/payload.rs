//! The payload capability set.
//!
//! A payload is the live game object owned by a tree node: an entity or an
//! environment. Everything the editor and the loader need from it goes
//! through this trait, so both can work with any registered type.

use std::fmt;

use bevy::math::Vec2;
use serde_json::{Map, Value};

use crate::context::AppContext;
use crate::draw::DrawList;
use crate::input::InputEvent;
use crate::state::StateError;

/// Optional rotation and scale carried through load and export unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PayloadTransform {
    pub rotation: Option<f32>,
    pub scale: Option<Vec2>,
}

pub trait Payload: Send + Sync + fmt::Debug {
    /// Stable type identifier written to compositions.
    fn type_path(&self) -> &'static str;

    fn position(&self) -> Vec2;

    fn set_position(&mut self, position: Vec2);

    /// Radius used for picking and for keeping the payload inside bounds.
    fn radius(&self) -> f32 {
        0.0
    }

    /// Rotation in radians, for payloads that have one.
    fn rotation(&self) -> Option<f32> {
        None
    }

    fn set_rotation(&mut self, _rotation: f32) {}

    fn scale(&self) -> Option<Vec2> {
        None
    }

    fn set_scale(&mut self, _scale: Vec2) {}

    /// Authorable state, excluding the transform.
    fn state(&self) -> Map<String, Value>;

    /// Assign a single state key. Unknown keys and mistyped values fail.
    fn apply_state(&mut self, key: &str, value: &Value) -> Result<(), StateError>;

    fn on_spawn(&mut self, _ctx: &mut AppContext) {}

    fn on_despawn(&mut self, _ctx: &mut AppContext) {}

    /// Returns true when the event was consumed.
    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut AppContext) -> bool {
        false
    }

    fn update(&mut self, _dt: f32, _ctx: &mut AppContext) {}

    fn render(&self, _ctx: &AppContext, _draw: &mut DrawList) {}
}

/// A payload type that can be registered in the palette.
pub trait Spawnable: Payload + Sized + 'static {
    const TYPE_PATH: &'static str;

    fn spawn(position: Vec2) -> Self;
}

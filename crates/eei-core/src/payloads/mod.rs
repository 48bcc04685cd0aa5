//! Built-in payload types.
//!
//! Each submodule owns its registration list; `PaletteRegistry::builtin`
//! calls them in order, which fixes the palette indices.

/// Implements the transform and state accessors shared by every built-in
/// payload. The type must have `position: Vec2`, `transform: PayloadTransform`
/// and `state: <serde struct>`.
macro_rules! payload_state_accessors {
    () => {
        fn type_path(&self) -> &'static str {
            <Self as $crate::payload::Spawnable>::TYPE_PATH
        }

        fn position(&self) -> ::bevy::math::Vec2 {
            self.position
        }

        fn set_position(&mut self, position: ::bevy::math::Vec2) {
            self.position = position;
        }

        fn rotation(&self) -> Option<f32> {
            self.transform.rotation
        }

        fn set_rotation(&mut self, rotation: f32) {
            self.transform.rotation = Some(rotation);
        }

        fn scale(&self) -> Option<::bevy::math::Vec2> {
            self.transform.scale
        }

        fn set_scale(&mut self, scale: ::bevy::math::Vec2) {
            self.transform.scale = Some(scale);
        }

        fn state(&self) -> ::serde_json::Map<String, ::serde_json::Value> {
            $crate::state::export_state(&self.state)
        }

        fn apply_state(
            &mut self,
            key: &str,
            value: &::serde_json::Value,
        ) -> Result<(), $crate::state::StateError> {
            $crate::state::assign_state(&mut self.state, key, value)
        }
    };
}

pub mod entities;
pub mod environments;

pub use entities::{Ball, Eye, Mouth, VoidEntity};
pub use environments::{BlackZone, MusicEnvironment, VoidEnvironment};

//! Scene state machine.
//!
//! A `SceneDirector` owns the registered scene factories, the active scene
//! and the shared `AppContext`. Switching scenes exits the current one and
//! builds a fresh instance of the target.

use bevy::math::Vec2;

use crate::context::{AppContext, SceneRequest};
use crate::draw::DrawList;
use crate::input::{InputEvent, Key, Modifiers};

pub trait Scene: Send + Sync {
    fn on_enter(&mut self, _ctx: &mut AppContext) {}

    fn on_exit(&mut self, _ctx: &mut AppContext) {}

    fn handle_event(&mut self, _event: &InputEvent, _ctx: &mut AppContext) {}

    fn update(&mut self, _dt: f32, _ctx: &mut AppContext) {}

    fn render(&self, _ctx: &AppContext, _draw: &mut DrawList) {}

    fn on_window_resize(&mut self, _size: Vec2, _ctx: &mut AppContext) {}

    /// Lines shown in the debug HUD.
    fn status_rows(&self) -> Vec<String> {
        Vec::new()
    }
}

pub type SceneFactory = Box<dyn Fn() -> Box<dyn Scene> + Send + Sync>;

pub struct SceneDirector {
    factories: Vec<(String, SceneFactory)>,
    active: Option<Box<dyn Scene>>,
    active_index: Option<usize>,
    context: AppContext,
}

impl SceneDirector {
    pub fn new(context: AppContext) -> Self {
        Self {
            factories: Vec::new(),
            active: None,
            active_index: None,
            context,
        }
    }

    /// Register a scene under `name`. Registration order defines cycling order.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Scene> + Send + Sync + 'static,
    {
        self.factories.push((name.to_string(), Box::new(factory)));
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_index
            .and_then(|i| self.factories.get(i))
            .map(|(name, _)| name.as_str())
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.context
    }

    /// Activate scene `index`, wrapping around the registered list.
    pub fn set_scene(&mut self, index: usize) {
        if self.factories.is_empty() {
            tracing::warn!("[scene] no scenes registered");
            return;
        }
        let index = index % self.factories.len();

        if let Some(mut previous) = self.active.take() {
            previous.on_exit(&mut self.context);
        }

        let (name, factory) = &self.factories[index];
        let mut scene = factory();
        tracing::info!("[scene] entering {name}");
        scene.on_enter(&mut self.context);
        self.active = Some(scene);
        self.active_index = Some(index);
    }

    /// Activate the scene registered as `name`. Returns false if unknown.
    pub fn set_scene_by_name(&mut self, name: &str) -> bool {
        let Some(index) = self.factories.iter().position(|(n, _)| n == name) else {
            tracing::warn!("[scene] unknown scene {name}");
            return false;
        };
        self.set_scene(index);
        true
    }

    /// Move `step` scenes forward (negative steps go back).
    pub fn cycle_scene(&mut self, step: i32) {
        let len = self.factories.len();
        if len == 0 {
            return;
        }
        let current = self.active_index.unwrap_or(0);
        let len = i64::try_from(len).unwrap_or(i64::MAX);
        let current = i64::try_from(current).unwrap_or(0);
        let next = (current + i64::from(step)).rem_euclid(len);
        self.set_scene(usize::try_from(next).unwrap_or(0));
    }

    /// Route one input event. Scene cycling keys are handled here, the rest
    /// goes to the active scene.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown {
                key: Key::Tab,
                modifiers: Modifiers { shift, .. },
            } => {
                self.cycle_scene(if shift { -1 } else { 1 });
            }
            InputEvent::KeyDown { key: Key::F2, .. } => self.cycle_scene(1),
            InputEvent::KeyDown { key: Key::F1, .. } => self.cycle_scene(-1),
            InputEvent::Resized { size } => {
                self.context.viewport = size;
                if let Some(scene) = self.active.as_mut() {
                    scene.on_window_resize(size, &mut self.context);
                }
            }
            _ => {
                if let Some(scene) = self.active.as_mut() {
                    scene.handle_event(event, &mut self.context);
                }
            }
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.context.elapsed += dt;
        if let Some(scene) = self.active.as_mut() {
            scene.update(dt, &mut self.context);
        }
    }

    pub fn render(&self, draw: &mut DrawList) {
        if let Some(scene) = self.active.as_ref() {
            scene.render(&self.context, draw);
        }
    }

    /// Apply a scene switch requested during this frame, if any.
    pub fn apply_pending_request(&mut self) {
        if let Some(SceneRequest::Switch(name)) = self.context.take_scene_request() {
            self.set_scene_by_name(&name);
        }
    }

    /// Run one full frame: events, update, render, then pending switches.
    pub fn frame(&mut self, events: &[InputEvent], dt: f32, draw: &mut DrawList) {
        for event in events {
            self.handle_event(event);
        }
        self.update(dt);
        draw.clear();
        self.render(draw);
        self.apply_pending_request();
    }

    pub fn status_rows(&self) -> Vec<String> {
        let mut rows = Vec::new();
        if let Some(name) = self.active_name() {
            rows.push(format!("scene: {name}"));
        }
        if let Some(scene) = self.active.as_ref() {
            rows.extend(scene.status_rows());
        }
        rows
    }

    /// Exit the active scene and silence audio. Safe to call twice.
    pub fn shutdown(&mut self) {
        if let Some(mut scene) = self.active.take() {
            tracing::info!("[scene] shutting down {}", self.active_name().unwrap_or("?"));
            scene.on_exit(&mut self.context);
        }
        self.active_index = None;
        if self.context.audio.is_music_playing() {
            self.context.audio.stop_music(0);
        }
        self.context.quit();
    }
}

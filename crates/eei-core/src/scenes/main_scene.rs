//! Playback scene: loads a composition and runs it.

use std::path::PathBuf;
use std::sync::Arc;

use bevy::math::Vec2;

use crate::composition::{load_composition, resolve_composition_path};
use crate::context::AppContext;
use crate::draw::DrawList;
use crate::input::InputEvent;
use crate::registry::PaletteRegistry;
use crate::runtime::CompositionRuntime;
use crate::scene::Scene;

pub struct MainScene {
    registry: Arc<PaletteRegistry>,
    /// Tried in order; the first existing file is played.
    candidates: Vec<PathBuf>,
    loaded_from: Option<PathBuf>,
    runtime: CompositionRuntime,
}

impl MainScene {
    pub fn new(registry: Arc<PaletteRegistry>, candidates: Vec<PathBuf>) -> Self {
        Self {
            registry,
            candidates,
            loaded_from: None,
            runtime: CompositionRuntime::empty(),
        }
    }

    pub fn runtime(&self) -> &CompositionRuntime {
        &self.runtime
    }

    fn load(&mut self) {
        self.loaded_from = None;
        let Some(path) = resolve_composition_path(&self.candidates) else {
            tracing::warn!("[main-scene] no composition found in {:?}", self.candidates);
            self.runtime = CompositionRuntime::empty();
            return;
        };

        self.runtime = match load_composition(&path, &self.registry) {
            Ok(runtime) => {
                self.loaded_from = Some(path);
                runtime
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("[main-scene] {e}");
                CompositionRuntime::empty()
            }
            Err(e) => {
                tracing::error!("[main-scene] failed to load {}: {e}", path.display());
                CompositionRuntime::empty()
            }
        };
    }

    /// Run `f` with the viewport set to the authored canvas. Without a
    /// canvas the window viewport is used as is.
    fn on_canvas<R>(
        &mut self,
        ctx: &mut AppContext,
        f: impl FnOnce(&mut CompositionRuntime, &mut AppContext) -> R,
    ) -> R {
        let window = ctx.viewport;
        if let Some([width, height]) = self.runtime.canvas_size() {
            ctx.viewport = Vec2::new(width as f32, height as f32);
        }
        let result = f(&mut self.runtime, ctx);
        ctx.viewport = window;
        result
    }
}

impl Scene for MainScene {
    fn on_enter(&mut self, ctx: &mut AppContext) {
        self.load();
        self.on_canvas(ctx, |runtime, ctx| runtime.spawn_all(ctx));
    }

    fn on_exit(&mut self, ctx: &mut AppContext) {
        self.runtime.despawn_all(ctx);
        self.runtime = CompositionRuntime::empty();
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut AppContext) {
        self.on_canvas(ctx, |runtime, ctx| runtime.handle_event(event, ctx));
    }

    fn update(&mut self, dt: f32, ctx: &mut AppContext) {
        self.on_canvas(ctx, |runtime, ctx| runtime.update(dt, ctx));
    }

    fn render(&self, ctx: &AppContext, draw: &mut DrawList) {
        self.runtime.render(ctx, draw);
    }

    fn status_rows(&self) -> Vec<String> {
        let source = self
            .loaded_from
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());
        vec![
            format!("composition: {source}"),
            format!("nodes: {}", self.runtime.len()),
        ]
    }
}

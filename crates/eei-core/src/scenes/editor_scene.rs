//! Composition editor scene.
//!
//! Maps pointer and keyboard input onto `EditorModel` operations:
//!
//! - left click on the canvas selects the nearest node and drags it
//! - palette spawns start a drag; releasing the pointer saves
//! - right click opens a context menu with a delete action
//! - Delete/Backspace deletes the selection and saves
//! - Ctrl+S saves, P saves and plays in the main scene
//! - 1..9 spawn palette entities at the pointer (Shift: environments)

use std::path::PathBuf;
use std::sync::Arc;

use bevy::math::{Rect, Vec2};

use crate::composition::{ExportOptions, load_composition, resolve_composition_path};
use crate::context::AppContext;
use crate::draw::{DrawList, Rgba};
use crate::input::{InputEvent, Key, Modifiers, PointerButton};
use crate::model::{EditorModel, NodeId};
use crate::registry::{PaletteKind, PaletteRegistry};
use crate::scene::Scene;
use crate::scenes::MAIN_SCENE;

/// Gap between a node's radius and its selection ring.
const SELECTION_RING_PADDING: f32 = 6.0;
const MENU_ITEM_SIZE: Vec2 = Vec2::new(120.0, 24.0);
const CANVAS_BORDER: Rgba = Rgba::rgb(200, 200, 200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    MoveExisting,
    /// Dragging a node that was just spawned from the palette.
    SpawnNew,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    mode: DragMode,
    /// Payload position minus pointer position at drag start.
    offset: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct ContextMenu {
    anchor: Vec2,
    target: NodeId,
}

impl ContextMenu {
    fn delete_item(&self) -> Rect {
        Rect::from_corners(self.anchor, self.anchor + MENU_ITEM_SIZE)
    }
}

pub struct EditorScene {
    model: EditorModel,
    export_path: PathBuf,
    candidates: Vec<PathBuf>,
    canvas: [u32; 2],
    pointer: Vec2,
    drag: Option<Drag>,
    context_menu: Option<ContextMenu>,
    status: String,
}

impl EditorScene {
    pub fn new(
        registry: Arc<PaletteRegistry>,
        export_path: PathBuf,
        candidates: Vec<PathBuf>,
        canvas: [u32; 2],
    ) -> Self {
        Self {
            model: EditorModel::new(registry),
            export_path,
            candidates,
            canvas,
            pointer: Vec2::ZERO,
            drag: None,
            context_menu: None,
            status: String::new(),
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EditorModel {
        &mut self.model
    }

    /// Message describing the last editor action.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|d| d.mode)
    }

    pub fn is_context_menu_open(&self) -> bool {
        self.context_menu.is_some()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn canvas_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.canvas[0] as f32, self.canvas[1] as f32)
    }

    /// Load the first existing candidate composition into the model.
    pub fn load_initial_composition(&mut self) {
        let Some(path) = resolve_composition_path(&self.candidates) else {
            self.set_status("no initial composition, starting a new scene".to_string());
            return;
        };

        let registry = Arc::clone(self.model.registry());
        match load_composition(&path, &registry) {
            Ok(runtime) => {
                let count = self.model.load_from_runtime(runtime);
                self.set_status(format!("loaded {count} node(s) from {}", path.display()));
            }
            Err(e) if e.is_not_found() => {
                self.set_status(format!("initial file does not exist: {}", path.display()));
            }
            Err(e) => {
                tracing::error!("[editor] {e}");
                self.set_status(format!("failed to load composition: {e}"));
            }
        }
    }

    /// Save to the export path. Returns false on I/O or encoding failure.
    pub fn save(&mut self) -> bool {
        let options = ExportOptions::default()
            .with_name(self.composition_name())
            .with_canvas(self.canvas);

        match self.model.save_composition(&self.export_path, &options) {
            Ok(path) => {
                self.set_status(format!("saved composition to {}", path.display()));
                true
            }
            Err(e) => {
                tracing::error!("[editor] save failed: {e}");
                self.set_status(format!("failed to save composition: {e}"));
                false
            }
        }
    }

    /// Spawn palette item `(kind, index)` under the pointer, or at the canvas
    /// center when the pointer is off-canvas, and start dragging it.
    pub fn begin_palette_spawn(&mut self, kind: PaletteKind, index: usize) -> bool {
        let bounds = self.canvas_bounds();
        let position = if bounds.contains(self.pointer) {
            self.pointer
        } else {
            bounds.center()
        };

        let Some(label) = self
            .model
            .spawn_from_palette(kind, index, position, None)
            .map(|node| node.name().to_string())
        else {
            self.set_status(format!("cannot place {kind} #{index} here"));
            return false;
        };

        self.set_status(format!("spawned {label}"));
        self.start_drag(DragMode::SpawnNew, position);
        true
    }

    /// Delete the selection (and its subtree), then save.
    pub fn delete_selected(&mut self) {
        if self.model.selected_id().is_none() {
            return;
        }
        let label = self.model.selected_label().unwrap_or_default().to_string();
        let removed = self.model.delete_selected();
        self.drag = None;
        self.context_menu = None;
        self.set_status(format!("deleted {label} ({removed} node(s))"));
        self.save();
    }

    /// Save, then hand over to the main scene.
    pub fn play(&mut self, ctx: &mut AppContext) {
        if self.save() {
            self.set_status("running composition".to_string());
            ctx.request_scene(MAIN_SCENE);
        }
    }

    fn composition_name(&self) -> String {
        let stem = self
            .export_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        stem.strip_suffix(".eei").map(str::to_string).unwrap_or(stem)
    }

    fn set_status(&mut self, message: String) {
        tracing::info!("[editor] {message}");
        self.status = message;
    }

    fn clamp_to_canvas(&self, position: Vec2) -> Vec2 {
        let bounds = self.canvas_bounds();
        position.max(bounds.min).min(bounds.max)
    }

    fn start_drag(&mut self, mode: DragMode, pointer: Vec2) {
        let Some(position) = self.model.selected_node().and_then(|n| n.position()) else {
            return;
        };
        self.drag = Some(Drag {
            mode,
            offset: position - pointer,
        });
        self.drag_to(pointer);
    }

    fn drag_to(&mut self, pointer: Vec2) {
        let Some(drag) = self.drag else {
            return;
        };
        let bounds = self.canvas_bounds();
        self.model.move_selected_within(bounds, pointer + drag.offset);
    }

    fn pointer_down(&mut self, position: Vec2, button: PointerButton) {
        self.pointer = position;
        match button {
            PointerButton::Left => self.left_click(position),
            PointerButton::Right => self.right_click(position),
            PointerButton::Middle => {}
        }
    }

    fn left_click(&mut self, position: Vec2) {
        if let Some(menu) = self.context_menu.take() {
            if menu.delete_item().contains(position) {
                self.model.select_node(Some(menu.target));
                self.delete_selected();
                return;
            }
        }

        if !self.canvas_bounds().contains(position) {
            return;
        }
        if self.model.select_at_position(position).is_some() {
            self.start_drag(DragMode::MoveExisting, position);
        }
    }

    fn right_click(&mut self, position: Vec2) {
        self.drag = None;
        self.context_menu = None;
        if !self.canvas_bounds().contains(position) {
            return;
        }
        if let Some(target) = self.model.select_at_position(position) {
            self.context_menu = Some(ContextMenu {
                anchor: position,
                target,
            });
        }
    }

    fn pointer_up(&mut self, button: PointerButton) {
        if button != PointerButton::Left {
            return;
        }
        let was_spawn = self.drag.is_some_and(|d| d.mode == DragMode::SpawnNew);
        self.drag = None;
        if was_spawn {
            self.save();
        }
    }

    fn pointer_moved(&mut self, position: Vec2) {
        self.pointer = position;
        if self.drag.is_some() {
            let clamped = self.clamp_to_canvas(position);
            self.drag_to(clamped);
        }
    }

    fn key_down(&mut self, key: Key, modifiers: Modifiers, ctx: &mut AppContext) {
        match key {
            Key::Delete | Key::Backspace => self.delete_selected(),
            Key::S if modifiers.ctrl => {
                self.save();
            }
            Key::P => self.play(ctx),
            Key::Escape => {
                if self.context_menu.take().is_none() {
                    self.model.select_node(None);
                }
            }
            Key::Digit(n @ 1..=9) => {
                let kind = if modifiers.shift {
                    PaletteKind::Environment
                } else {
                    PaletteKind::Entity
                };
                if self.begin_palette_spawn(kind, usize::from(n - 1)) {
                    // keyboard spawns have no pointer release to finish them
                    self.drag = None;
                    self.save();
                }
            }
            _ => {}
        }
    }
}

impl Scene for EditorScene {
    fn on_enter(&mut self, _ctx: &mut AppContext) {
        self.load_initial_composition();
    }

    fn on_exit(&mut self, _ctx: &mut AppContext) {
        self.drag = None;
        self.context_menu = None;
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut AppContext) {
        match *event {
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers, ctx),
            InputEvent::PointerDown { position, button } => self.pointer_down(position, button),
            InputEvent::PointerUp { button, .. } => self.pointer_up(button),
            InputEvent::PointerMoved { position } => self.pointer_moved(position),
            InputEvent::KeyUp { .. } | InputEvent::Resized { .. } => {}
        }
    }

    fn render(&self, ctx: &AppContext, draw: &mut DrawList) {
        let bounds = self.canvas_bounds();
        draw.rect(bounds.center(), bounds.size(), CANVAS_BORDER);

        for node in self.model.iter_drawable_nodes() {
            if let Some(payload) = node.payload() {
                payload.render(ctx, draw);
            }
        }

        if let Some(node) = self.model.selected_node() {
            if let Some(position) = node.position() {
                draw.circle(position, node.radius() + SELECTION_RING_PADDING, Rgba::HIGHLIGHT);
            }
        }

        if let Some(menu) = self.context_menu {
            let item = menu.delete_item();
            draw.rect(item.center(), item.size(), Rgba::BLACK);
        }
    }

    fn status_rows(&self) -> Vec<String> {
        let mut rows = vec![self.status.clone()];
        match self.model.selected_id() {
            Some(id) => {
                let label = self.model.selected_label().unwrap_or_default();
                let parent = self.model.parent_label(id).unwrap_or("-");
                rows.push(format!("selected: {label} (parent: {parent})"));
                let children = self.model.child_labels(id);
                if !children.is_empty() {
                    rows.push(format!("children: {}", children.join(", ")));
                }
            }
            None => rows.push("selected: -".to_string()),
        }
        rows.push(format!("nodes: {}", self.model.order().len()));
        rows
    }
}

//! Built-in scenes and the default director wiring.

pub mod editor_scene;
pub mod main_scene;

use std::path::PathBuf;
use std::sync::Arc;

use bevy::math::Vec2;

pub use editor_scene::EditorScene;
pub use main_scene::MainScene;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::registry::PaletteRegistry;
use crate::scene::{Scene, SceneDirector};

pub const MAIN_SCENE: &str = "main";
pub const EDITOR_SCENE: &str = "editor";

/// Director with the main and editor scenes registered, in that order.
///
/// `composition_override` replaces the configured composition candidates for
/// both scenes; the editor then also saves to it.
pub fn default_director(
    config: &AppConfig,
    registry: Arc<PaletteRegistry>,
    composition_override: Option<PathBuf>,
) -> SceneDirector {
    let [width, height] = config.editor.canvas;
    #[allow(clippy::cast_precision_loss)]
    let context = AppContext::new(Vec2::new(width as f32, height as f32));
    let mut director = SceneDirector::new(context);

    let (export_path, candidates) = match composition_override {
        Some(path) => (path.clone(), vec![path]),
        None => (
            config.compositions.export_path(),
            config.compositions.candidates(),
        ),
    };

    {
        let registry = Arc::clone(&registry);
        let candidates = candidates.clone();
        director.register(MAIN_SCENE, move || {
            Box::new(MainScene::new(Arc::clone(&registry), candidates.clone())) as Box<dyn Scene>
        });
    }

    let canvas = config.editor.canvas;
    director.register(EDITOR_SCENE, move || {
        Box::new(EditorScene::new(
            Arc::clone(&registry),
            export_path.clone(),
            candidates.clone(),
            canvas,
        )) as Box<dyn Scene>
    });

    director
}

//! Live playback tree built from a composition.
//!
//! Nodes are kept in document order. Spawn, event, update and render passes
//! walk that order front to back; despawn walks it back to front.

use std::collections::HashMap;

use bevy::math::Vec2;

use crate::composition::{COMPOSITION_VERSION, CompositionDocument, CompositionError};
use crate::context::AppContext;
use crate::draw::DrawList;
use crate::input::InputEvent;
use crate::payload::Payload;
use crate::registry::{PaletteKind, PaletteRegistry};

#[derive(Debug)]
pub struct RuntimeNode {
    pub composition_id: String,
    pub kind: PaletteKind,
    pub type_path: String,
    /// `None` for top-level nodes.
    pub parent: Option<String>,
    /// Derived from the `parent` links, in document order.
    pub children: Vec<String>,
    pub instance: Box<dyn Payload>,
}

#[derive(Debug, Default)]
pub struct CompositionRuntime {
    nodes: Vec<RuntimeNode>,
    canvas_size: Option<[u32; 2]>,
    spawned: bool,
}

impl CompositionRuntime {
    /// A runtime with no nodes, used when no composition could be loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Instantiate every node of `document`.
    ///
    /// Fails on the first invalid node; no partial runtime is returned.
    pub fn from_document(
        document: &CompositionDocument,
        registry: &PaletteRegistry,
    ) -> Result<Self, CompositionError> {
        if document.version != COMPOSITION_VERSION {
            return Err(CompositionError::UnsupportedVersion {
                found: document.version,
                expected: COMPOSITION_VERSION,
            });
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(document.nodes.len());
        for (i, entry) in document.nodes.iter().enumerate() {
            if index.insert(entry.id.as_str(), i).is_some() {
                return Err(CompositionError::DuplicateId(entry.id.clone()));
            }
        }

        for entry in &document.nodes {
            if let Some(parent) = entry.parent.as_deref()
                && !index.contains_key(parent)
            {
                return Err(CompositionError::DanglingParent {
                    id: entry.id.clone(),
                    parent: parent.to_string(),
                });
            }
        }
        check_parent_cycles(document, &index)?;

        let mut nodes = Vec::with_capacity(document.nodes.len());
        for entry in &document.nodes {
            let item = registry
                .find_type(&entry.type_path)
                .ok_or_else(|| CompositionError::UnknownType {
                    id: entry.id.clone(),
                    type_path: entry.type_path.clone(),
                })?;
            if item.kind != entry.kind {
                return Err(CompositionError::KindMismatch {
                    id: entry.id.clone(),
                    type_path: entry.type_path.clone(),
                    declared: entry.kind,
                    registered: item.kind,
                });
            }

            let transform = &entry.transform;
            let mut instance = item.instantiate(Vec2::from(transform.position));
            if let Some(rotation) = transform.rotation {
                instance.set_rotation(rotation);
            }
            if let Some(scale) = transform.scale {
                instance.set_scale(Vec2::from(scale));
            }
            for (key, value) in &entry.state {
                instance
                    .apply_state(key, value)
                    .map_err(|source| CompositionError::State {
                        id: entry.id.clone(),
                        source,
                    })?;
            }

            nodes.push(RuntimeNode {
                composition_id: entry.id.clone(),
                kind: entry.kind,
                type_path: entry.type_path.clone(),
                parent: entry.parent.clone(),
                children: Vec::new(),
                instance,
            });
        }

        for i in 0..nodes.len() {
            let Some(parent) = nodes[i].parent.clone() else {
                continue;
            };
            let child = nodes[i].composition_id.clone();
            if let Some(&p) = index.get(parent.as_str()) {
                nodes[p].children.push(child);
            }
        }

        Ok(Self {
            nodes,
            canvas_size: document.scene.canvas,
            spawned: false,
        })
    }

    pub fn nodes(&self) -> &[RuntimeNode] {
        &self.nodes
    }

    pub fn get(&self, composition_id: &str) -> Option<&RuntimeNode> {
        self.nodes.iter().find(|n| n.composition_id == composition_id)
    }

    /// Authored virtual resolution, if the document carried a valid one.
    pub fn canvas_size(&self) -> Option<[u32; 2]> {
        self.canvas_size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Run `on_spawn` for every node in document order. Only the first call
    /// has an effect.
    pub fn spawn_all(&mut self, ctx: &mut AppContext) {
        if self.spawned {
            return;
        }
        for node in &mut self.nodes {
            node.instance.on_spawn(ctx);
        }
        self.spawned = true;
    }

    /// Run `on_despawn` for every node in reverse document order.
    pub fn despawn_all(&mut self, ctx: &mut AppContext) {
        if !self.spawned {
            return;
        }
        for node in self.nodes.iter_mut().rev() {
            node.instance.on_despawn(ctx);
        }
        self.spawned = false;
    }

    /// Deliver `event` to every node. Returns true if any node consumed it.
    pub fn handle_event(&mut self, event: &InputEvent, ctx: &mut AppContext) -> bool {
        let mut consumed = false;
        for node in &mut self.nodes {
            consumed |= node.instance.handle_event(event, ctx);
        }
        consumed
    }

    pub fn update(&mut self, dt: f32, ctx: &mut AppContext) {
        for node in &mut self.nodes {
            node.instance.update(dt, ctx);
        }
    }

    pub fn render(&self, ctx: &AppContext, draw: &mut DrawList) {
        for node in &self.nodes {
            node.instance.render(ctx, draw);
        }
    }

    /// Hand the nodes over, e.g. to an editor model.
    pub fn into_nodes(self) -> Vec<RuntimeNode> {
        self.nodes
    }
}

fn check_parent_cycles(
    document: &CompositionDocument,
    index: &HashMap<&str, usize>,
) -> Result<(), CompositionError> {
    let n = document.nodes.len();
    for entry in &document.nodes {
        let mut current = entry.parent.as_deref();
        let mut steps = 0;
        while let Some(parent) = current {
            steps += 1;
            if parent == entry.id || steps > n {
                return Err(CompositionError::ParentCycle(entry.id.clone()));
            }
            current = index
                .get(parent)
                .and_then(|&i| document.nodes[i].parent.as_deref());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{Map, Value, json};

    use crate::composition::{Metadata, NodeEntry, SceneBlock, Transform};
    use crate::payload::Spawnable;
    use crate::payloads::{BlackZone, Eye, VoidEnvironment};
    use crate::state::StateError;

    /// Payload that records its lifecycle calls into a shared log.
    #[derive(Debug)]
    struct Probe {
        label: String,
        position: Vec2,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Payload for Probe {
        fn type_path(&self) -> &'static str {
            "test::Probe"
        }

        fn position(&self) -> Vec2 {
            self.position
        }

        fn set_position(&mut self, position: Vec2) {
            self.position = position;
        }

        fn state(&self) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("label".into(), json!(self.label));
            map
        }

        fn apply_state(&mut self, key: &str, value: &Value) -> Result<(), StateError> {
            match (key, value.as_str()) {
                ("label", Some(label)) => {
                    self.label = label.to_string();
                    Ok(())
                }
                _ => Err(StateError::UnknownKey(key.to_string())),
            }
        }

        fn on_spawn(&mut self, _ctx: &mut AppContext) {
            self.log.lock().push(format!("spawn {}", self.label));
        }

        fn on_despawn(&mut self, _ctx: &mut AppContext) {
            self.log.lock().push(format!("despawn {}", self.label));
        }
    }

    fn probe_registry(log: &Arc<Mutex<Vec<String>>>) -> PaletteRegistry {
        let log = Arc::clone(log);
        PaletteRegistry::builder()
            .register(PaletteKind::Environment, "Probe", "test::Probe", move |pos| {
                Box::new(Probe {
                    label: String::new(),
                    position: pos,
                    log: Arc::clone(&log),
                }) as Box<dyn Payload>
            })
            .build()
    }

    fn entry(id: &str, kind: PaletteKind, type_path: &str, parent: Option<&str>) -> NodeEntry {
        NodeEntry {
            id: id.to_string(),
            kind,
            type_path: type_path.to_string(),
            parent: parent.map(str::to_string),
            transform: Transform::default(),
            state: Map::new(),
            children: Vec::new(),
        }
    }

    fn document(nodes: Vec<NodeEntry>) -> CompositionDocument {
        CompositionDocument {
            version: COMPOSITION_VERSION,
            metadata: Metadata::default(),
            scene: SceneBlock {
                canvas: Some([320, 240]),
                origin: None,
            },
            nodes,
            interactions: Vec::new(),
        }
    }

    fn labelled(id: &str, label: &str, parent: Option<&str>) -> NodeEntry {
        let mut e = entry(id, PaletteKind::Environment, "test::Probe", parent);
        e.state.insert("label".into(), json!(label));
        e
    }

    #[test]
    fn test_spawn_and_despawn_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = probe_registry(&log);
        // c is a child of b; order follows the document, not the tree
        let doc = document(vec![
            labelled("a", "A", None),
            labelled("b", "B", None),
            labelled("c", "C", Some("b")),
        ]);

        let mut runtime = CompositionRuntime::from_document(&doc, &registry).unwrap();
        let mut ctx = AppContext::default();
        runtime.spawn_all(&mut ctx);
        runtime.spawn_all(&mut ctx);
        runtime.despawn_all(&mut ctx);
        runtime.despawn_all(&mut ctx);

        assert_eq!(runtime.get("b").unwrap().children, ["c"]);
        assert_eq!(
            *log.lock(),
            ["spawn A", "spawn B", "spawn C", "despawn C", "despawn B", "despawn A"]
        );
    }

    #[test]
    fn test_children_derived_from_parent_links() {
        let registry = PaletteRegistry::builtin();
        let mut eye = entry("ent-001", PaletteKind::Entity, Eye::TYPE_PATH, Some("env-001"));
        // declared children are ignored
        eye.children = vec!["bogus".into()];
        let doc = document(vec![
            eye,
            entry("env-001", PaletteKind::Environment, BlackZone::TYPE_PATH, None),
        ]);

        let runtime = CompositionRuntime::from_document(&doc, &registry).unwrap();
        assert_eq!(runtime.len(), 2);
        assert_eq!(runtime.canvas_size(), Some([320, 240]));
        assert_eq!(runtime.nodes()[0].composition_id, "ent-001");
        assert!(runtime.nodes()[0].children.is_empty());
        assert_eq!(runtime.get("env-001").unwrap().children, ["ent-001"]);
        assert!(runtime.get("env-001").unwrap().parent.is_none());
    }

    #[test]
    fn test_transform_and_state_applied() {
        let registry = PaletteRegistry::builtin();
        let mut e = entry("env-001", PaletteKind::Environment, VoidEnvironment::TYPE_PATH, None);
        e.transform.position = [12.0, 34.0];
        e.state.insert("radius".into(), json!(40.0));
        let doc = document(vec![e]);

        let runtime = CompositionRuntime::from_document(&doc, &registry).unwrap();
        let instance = &runtime.nodes()[0].instance;
        assert_eq!(instance.position(), Vec2::new(12.0, 34.0));
        assert!((instance.radius() - 40.0).abs() < 0.001);
    }

    #[test]
    fn test_rotation_and_scale_kept_on_instance() {
        let registry = PaletteRegistry::builtin();
        let mut zone = entry("env-001", PaletteKind::Environment, BlackZone::TYPE_PATH, None);
        zone.transform.rotation = Some(0.5);
        zone.transform.scale = Some([2.0, 3.0]);
        let eye = entry("ent-001", PaletteKind::Entity, Eye::TYPE_PATH, Some("env-001"));

        let runtime = CompositionRuntime::from_document(&document(vec![zone, eye]), &registry).unwrap();
        let zone = &runtime.nodes()[0].instance;
        assert_eq!(zone.rotation(), Some(0.5));
        assert_eq!(zone.scale(), Some(Vec2::new(2.0, 3.0)));
        let eye = &runtime.nodes()[1].instance;
        assert!(eye.rotation().is_none());
        assert!(eye.scale().is_none());
    }

    #[test]
    fn test_unknown_state_key_fails_load() {
        let registry = PaletteRegistry::builtin();
        let mut e = entry("env-001", PaletteKind::Environment, BlackZone::TYPE_PATH, None);
        e.state.insert("speed".into(), json!(3));
        let err = CompositionRuntime::from_document(&document(vec![e]), &registry).unwrap_err();
        assert!(matches!(err, CompositionError::State { id, .. } if id == "env-001"));
    }

    #[test]
    fn test_unknown_type_fails_load() {
        let registry = PaletteRegistry::builtin();
        let doc = document(vec![entry("x", PaletteKind::Entity, "entities::nope::Nope", None)]);
        let err = CompositionRuntime::from_document(&doc, &registry).unwrap_err();
        assert!(matches!(err, CompositionError::UnknownType { .. }));
    }

    #[test]
    fn test_kind_mismatch_fails_load() {
        let registry = PaletteRegistry::builtin();
        let doc = document(vec![entry("x", PaletteKind::Environment, Eye::TYPE_PATH, None)]);
        let err = CompositionRuntime::from_document(&doc, &registry).unwrap_err();
        assert!(matches!(err, CompositionError::KindMismatch { .. }));
    }

    #[test]
    fn test_structural_errors() {
        let registry = PaletteRegistry::builtin();
        let zone = |id: &str, parent: Option<&str>| {
            entry(id, PaletteKind::Environment, BlackZone::TYPE_PATH, parent)
        };

        let err = CompositionRuntime::from_document(&document(vec![zone("a", None), zone("a", None)]), &registry)
            .unwrap_err();
        assert!(matches!(err, CompositionError::DuplicateId(id) if id == "a"));

        let err = CompositionRuntime::from_document(&document(vec![zone("a", Some("ghost"))]), &registry)
            .unwrap_err();
        assert!(matches!(err, CompositionError::DanglingParent { .. }));

        let err = CompositionRuntime::from_document(
            &document(vec![zone("a", Some("b")), zone("b", Some("a"))]),
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, CompositionError::ParentCycle(_)));

        let mut doc = document(Vec::new());
        doc.version = 2;
        let err = CompositionRuntime::from_document(&doc, &registry).unwrap_err();
        assert!(matches!(err, CompositionError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn test_empty_runtime() {
        let mut runtime = CompositionRuntime::empty();
        let mut ctx = AppContext::default();
        runtime.spawn_all(&mut ctx);
        runtime.update(0.016, &mut ctx);
        let mut draw = DrawList::new();
        runtime.render(&ctx, &mut draw);
        assert!(runtime.is_empty());
        assert!(draw.is_empty());
        assert!(runtime.canvas_size().is_none());
    }
}

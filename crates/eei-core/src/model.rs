//! Authoring-time scene tree.
//!
//! `EditorModel` owns every node and its payload. Nodes refer to each other
//! by `NodeId` only. The tree always has exactly one root, and attachment
//! follows the kind rules:
//!
//! - `entity` only under `environment`
//! - `environment` under the root or under an `entity`
//!
//! Structural operations never fail loudly: invalid requests are no-ops
//! that return `None`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::math::{Rect, Vec2};

use crate::composition::{
    self, COMPOSITION_VERSION, CompositionDocument, CompositionError, ExportOptions, Metadata,
    NodeEntry, SceneBlock, Transform,
};
use crate::payload::Payload;
use crate::registry::{PaletteKind, PaletteRegistry};
use crate::runtime::CompositionRuntime;

pub type NodeId = u32;

pub const ROOT_NAME: &str = "Scene Root";
pub const ROOT_BASE_NAME: &str = "Scene";
pub const ROOT_COMPOSITION_ID: &str = "scene-root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Entity,
    Environment,
}

impl NodeKind {
    pub fn palette_kind(self) -> Option<PaletteKind> {
        match self {
            Self::Root => None,
            Self::Entity => Some(PaletteKind::Entity),
            Self::Environment => Some(PaletteKind::Environment),
        }
    }

    /// Whether a node of kind `self` may be attached under `parent`.
    pub fn can_attach_to(self, parent: NodeKind) -> bool {
        matches!(
            (self, parent),
            (Self::Entity, Self::Environment) | (Self::Environment, Self::Root | Self::Entity)
        )
    }
}

impl From<PaletteKind> for NodeKind {
    fn from(kind: PaletteKind) -> Self {
        match kind {
            PaletteKind::Entity => Self::Entity,
            PaletteKind::Environment => Self::Environment,
        }
    }
}

/// A node of the authoring tree.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    name: String,
    base_name: String,
    payload: Option<Box<dyn Payload>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    composition_id: String,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Disambiguated display label.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn payload(&self) -> Option<&dyn Payload> {
        self.payload.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }

    pub fn position(&self) -> Option<Vec2> {
        self.payload.as_ref().map(|p| p.position())
    }

    pub fn radius(&self) -> f32 {
        self.payload.as_ref().map_or(0.0, |p| p.radius())
    }
}

#[derive(Debug)]
pub struct EditorModel {
    registry: Arc<PaletteRegistry>,
    nodes: HashMap<NodeId, Node>,
    /// Non-root nodes in insertion order. Also the draw order.
    order: Vec<NodeId>,
    root_id: NodeId,
    selected: Option<NodeId>,
    next_id: NodeId,
    name_counts: HashMap<String, u32>,
    composition_counters: HashMap<PaletteKind, u32>,
}

impl EditorModel {
    pub fn new(registry: Arc<PaletteRegistry>) -> Self {
        let mut model = Self {
            registry,
            nodes: HashMap::new(),
            order: Vec::new(),
            root_id: 0,
            selected: None,
            next_id: 0,
            name_counts: HashMap::new(),
            composition_counters: HashMap::new(),
        };
        model.reset();
        model
    }

    /// Drop every node and start over with a bare root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.selected = None;
        self.name_counts.clear();
        self.composition_counters.clear();

        let root_id = self.alloc_id();
        self.root_id = root_id;
        self.nodes.insert(
            root_id,
            Node {
                id: root_id,
                kind: NodeKind::Root,
                name: ROOT_NAME.to_string(),
                base_name: ROOT_BASE_NAME.to_string(),
                payload: None,
                parent: None,
                children: Vec::new(),
                composition_id: ROOT_COMPOSITION_ID.to_string(),
            },
        );
    }

    pub fn registry(&self) -> &Arc<PaletteRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Non-root node ids in insertion order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.and_then(|id| self.nodes.get(&id))
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected_node().map(Node::name)
    }

    pub fn parent_label(&self, id: NodeId) -> Option<&str> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes.get(&parent).map(Node::name)
    }

    pub fn child_labels(&self, id: NodeId) -> Vec<&str> {
        self.nodes.get(&id).map_or_else(Vec::new, |node| {
            node.children
                .iter()
                .filter_map(|cid| self.nodes.get(cid))
                .map(Node::name)
                .collect()
        })
    }

    /// Pre-order walk from the root, yielding `(depth, node)`.
    pub fn iter_tree(&self) -> TreeIter<'_> {
        TreeIter {
            model: self,
            stack: vec![(0, self.root_id)],
        }
    }

    /// Payload-bearing nodes in insertion order.
    pub fn iter_drawable_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| node.payload.is_some())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Instantiate palette item `(kind, index)` at `position`.
    ///
    /// The parent is the first of `parent_hint`, the current selection and the
    /// root that accepts the new kind. Returns `None` when the palette item is
    /// unknown or no candidate parent accepts it.
    pub fn spawn_from_palette(
        &mut self,
        kind: PaletteKind,
        index: usize,
        position: Vec2,
        parent_hint: Option<NodeId>,
    ) -> Option<&Node> {
        let registry = Arc::clone(&self.registry);
        let item = registry.get_item(kind, index)?;
        let node_kind = NodeKind::from(kind);

        let Some(parent_id) = self.resolve_parent(node_kind, parent_hint) else {
            tracing::debug!(
                "[editor] no valid parent for {} `{}`",
                kind,
                item.name
            );
            return None;
        };

        let payload = item.instantiate(position);
        let id = self.alloc_id();
        let name = self.make_name(&item.name);
        let composition_id = self.next_composition_id(kind);

        self.nodes.insert(
            id,
            Node {
                id,
                kind: node_kind,
                name,
                base_name: item.name.clone(),
                payload: Some(payload),
                parent: Some(parent_id),
                children: Vec::new(),
                composition_id,
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(id);
        }
        self.order.push(id);
        self.selected = Some(id);

        self.nodes.get(&id)
    }

    /// Select `id`. The root, unknown ids and `None` clear the selection.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| *id != self.root_id && self.nodes.contains_key(id));
    }

    /// Select the payload whose center is closest to `point`.
    ///
    /// Ties go to the node inserted first.
    pub fn select_at_position(&mut self, point: Vec2) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for node in self.iter_drawable_nodes() {
            let Some(position) = node.position() else {
                continue;
            };
            let dist = position.distance_squared(point);
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((node.id, dist));
            }
        }

        self.selected = best.map(|(id, _)| id);
        self.selected
    }

    /// Move the selected payload toward `desired`, keeping its disc inside
    /// `bounds`.
    pub fn move_selected_within(&mut self, bounds: Rect, desired: Vec2) {
        let Some(id) = self.selected else {
            return;
        };
        let Some(payload) = self.nodes.get_mut(&id).and_then(|n| n.payload.as_mut()) else {
            return;
        };

        let r = payload.radius();
        let (left, right) = (bounds.min.x + r, bounds.max.x - r);
        let (top, bottom) = (bounds.min.y + r, bounds.max.y - r);
        let clamped = Vec2::new(desired.x.min(right).max(left), desired.y.min(bottom).max(top));
        payload.set_position(clamped);
    }

    /// Remove the selected node and its whole subtree.
    ///
    /// Returns the number of nodes removed. Afterwards the former parent is
    /// selected unless it is the root, in which case the most recently
    /// inserted remaining node is.
    pub fn delete_selected(&mut self) -> usize {
        let Some(id) = self.selected else {
            return 0;
        };
        let Some(node) = self.nodes.get(&id) else {
            self.selected = None;
            return 0;
        };
        let parent = node.parent;

        let removed = self.collect_subtree(id);
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent_node.children.retain(|cid| *cid != id);
        }
        for nid in &removed {
            self.nodes.remove(nid);
        }
        let removed_set: HashSet<NodeId> = removed.iter().copied().collect();
        self.order.retain(|nid| !removed_set.contains(nid));

        self.selected = match parent {
            Some(p) if p != self.root_id && self.nodes.contains_key(&p) => Some(p),
            _ => self.order.last().copied(),
        };

        tracing::debug!("[editor] deleted {} node(s)", removed.len());
        removed.len()
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Serialize the payload-bearing nodes into a composition document.
    pub fn build_composition(&self, options: &ExportOptions) -> CompositionDocument {
        let nodes = self
            .iter_drawable_nodes()
            .filter_map(|node| self.node_to_entry(node))
            .collect();

        CompositionDocument {
            version: COMPOSITION_VERSION,
            metadata: Metadata {
                name: options.name.clone(),
                description: options.description.clone(),
                tags: options.tags.clone(),
            },
            scene: SceneBlock {
                canvas: Some(options.canvas),
                origin: Some(options.origin),
            },
            nodes,
            interactions: Vec::new(),
        }
    }

    /// Write the composition to `path`, creating parent directories.
    pub fn save_composition(
        &self,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<PathBuf, CompositionError> {
        let document = self.build_composition(options);
        composition::write_document(path, &document)
    }

    /// Replace the tree with the nodes of a loaded runtime.
    ///
    /// Payloads are moved into the model and composition ids are kept. Nodes
    /// that break the attachment rules are skipped along with their
    /// descendants. Returns the number of imported nodes.
    pub fn load_from_runtime(&mut self, runtime: CompositionRuntime) -> usize {
        self.reset();
        let runtime_nodes = runtime.into_nodes();

        let index: HashMap<String, usize> = runtime_nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.composition_id.clone(), i))
            .collect();

        // A node is kept when its whole parent chain is kept and every link
        // satisfies the attachment rules.
        let mut accepted: Vec<Option<bool>> = vec![None; runtime_nodes.len()];
        for start in 0..runtime_nodes.len() {
            let mut chain = Vec::new();
            let mut current = start;
            let mut verdict = loop {
                if let Some(known) = accepted[current] {
                    break known;
                }
                if chain.contains(&current) {
                    break false;
                }
                chain.push(current);
                match runtime_nodes[current].parent.as_ref() {
                    None => break true,
                    Some(parent) => match index.get(parent) {
                        Some(&p) => current = p,
                        None => break false,
                    },
                }
            };
            while let Some(i) = chain.pop() {
                let node = &runtime_nodes[i];
                let parent_kind = match node.parent.as_ref() {
                    None => Some(NodeKind::Root),
                    Some(p) => index.get(p).map(|&pi| NodeKind::from(runtime_nodes[pi].kind)),
                };
                verdict = verdict
                    && parent_kind.is_some_and(|pk| NodeKind::from(node.kind).can_attach_to(pk));
                accepted[i] = Some(verdict);
            }
        }

        // Allocate ids in document order so the draw order survives, even
        // when a child is listed before its parent.
        let mut id_of: HashMap<String, NodeId> = HashMap::new();
        for (i, rn) in runtime_nodes.iter().enumerate() {
            if accepted[i] == Some(true) {
                let id = self.alloc_id();
                id_of.insert(rn.composition_id.clone(), id);
            }
        }

        let mut imported = 0;
        for (i, rn) in runtime_nodes.into_iter().enumerate() {
            if accepted[i] != Some(true) {
                tracing::warn!(
                    "[editor] skipping {} `{}` ({}): invalid attachment",
                    rn.kind,
                    rn.composition_id,
                    rn.type_path
                );
                continue;
            }
            let Some(&id) = id_of.get(&rn.composition_id) else {
                continue;
            };
            let parent_id = match rn.parent.as_ref() {
                None => self.root_id,
                Some(p) => match id_of.get(p) {
                    Some(&pid) => pid,
                    None => continue,
                },
            };

            let base_name = self
                .registry
                .find_type(&rn.type_path)
                .map_or_else(|| short_type_name(&rn.type_path), |item| item.name.clone());
            let name = self.make_name(&base_name);
            self.bump_composition_counter(rn.kind, &rn.composition_id);

            self.nodes.insert(
                id,
                Node {
                    id,
                    kind: NodeKind::from(rn.kind),
                    name,
                    base_name,
                    payload: Some(rn.instance),
                    parent: Some(parent_id),
                    children: Vec::new(),
                    composition_id: rn.composition_id,
                },
            );
            self.order.push(id);
            imported += 1;
        }

        let order = self.order.clone();
        for id in order {
            let parent = self.nodes.get(&id).and_then(Node::parent);
            if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(&p)) {
                parent_node.children.push(id);
            }
        }

        tracing::info!("[editor] imported {imported} node(s) from composition");
        imported
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn alloc_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn resolve_parent(&self, kind: NodeKind, hint: Option<NodeId>) -> Option<NodeId> {
        let mut candidates: Vec<NodeId> = Vec::with_capacity(3);
        for candidate in [hint, self.selected, Some(self.root_id)].into_iter().flatten() {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        candidates.into_iter().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|parent| kind.can_attach_to(parent.kind))
        })
    }

    fn make_name(&mut self, base: &str) -> String {
        let count = self.name_counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base.to_string()
        } else {
            format!("{base} #{count}")
        }
    }

    fn next_composition_id(&mut self, kind: PaletteKind) -> String {
        loop {
            let counter = self.composition_counters.entry(kind).or_insert(0);
            *counter += 1;
            let candidate = format!("{}-{:03}", kind.id_prefix(), *counter);
            if !self.nodes.values().any(|n| n.composition_id == candidate) {
                return candidate;
            }
        }
    }

    fn bump_composition_counter(&mut self, kind: PaletteKind, composition_id: &str) {
        let Some(number) = composition_id
            .strip_prefix(kind.id_prefix())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            return;
        };
        let counter = self.composition_counters.entry(kind).or_insert(0);
        *counter = (*counter).max(number);
    }

    /// Post-order list of `id` and all of its descendants.
    fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            if let Some(node) = self.nodes.get(&current) {
                for child in node.children.iter().rev() {
                    stack.push((*child, false));
                }
            }
        }
        out
    }

    /// Composition id of the closest payload-bearing ancestor, if any.
    fn exported_parent(&self, node: &Node) -> Option<String> {
        let mut current = node.parent;
        while let Some(id) = current {
            let ancestor = self.nodes.get(&id)?;
            if ancestor.kind == NodeKind::Root {
                return None;
            }
            if ancestor.payload.is_some() {
                return Some(ancestor.composition_id.clone());
            }
            current = ancestor.parent;
        }
        None
    }

    /// Composition ids of the nearest payload-bearing descendants.
    fn exported_children(&self, node: &Node) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(child) = self.nodes.get(&id) else {
                continue;
            };
            if child.payload.is_some() {
                out.push(child.composition_id.clone());
            } else {
                stack.extend(child.children.iter().rev().copied());
            }
        }
        out
    }

    fn node_to_entry(&self, node: &Node) -> Option<NodeEntry> {
        let payload = node.payload.as_ref()?;
        let kind = node.kind.palette_kind()?;
        let position = payload.position();

        Some(NodeEntry {
            id: node.composition_id.clone(),
            kind,
            type_path: payload.type_path().to_string(),
            parent: self.exported_parent(node),
            transform: Transform {
                position: [position.x, position.y],
                rotation: payload.rotation(),
                scale: payload.scale().map(|s| [s.x, s.y]),
            },
            state: payload.state(),
            children: self.exported_children(node),
        })
    }
}

/// Last segment of a `a::b::Type` path.
fn short_type_name(type_path: &str) -> String {
    type_path
        .rsplit("::")
        .next()
        .unwrap_or(type_path)
        .to_string()
}

/// Pre-order tree iterator returned by [`EditorModel::iter_tree`].
pub struct TreeIter<'a> {
    model: &'a EditorModel,
    stack: Vec<(usize, NodeId)>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (depth, id) = self.stack.pop()?;
            let Some(node) = self.model.nodes.get(&id) else {
                continue;
            };
            for child in node.children.iter().rev() {
                self.stack.push((depth + 1, *child));
            }
            return Some((depth, node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::load_composition;
    use crate::payload::Spawnable;
    use crate::payloads::{BlackZone, Eye, VoidEnvironment};

    const ENTITY: PaletteKind = PaletteKind::Entity;
    const ENVIRONMENT: PaletteKind = PaletteKind::Environment;

    fn model() -> EditorModel {
        EditorModel::new(Arc::new(PaletteRegistry::builtin()))
    }

    fn spawn(
        model: &mut EditorModel,
        kind: PaletteKind,
        index: usize,
        pos: Vec2,
        hint: Option<NodeId>,
    ) -> Option<NodeId> {
        model.spawn_from_palette(kind, index, pos, hint).map(Node::id)
    }

    /// Spawn with the root as parent hint.
    fn spawn_top(model: &mut EditorModel, kind: PaletteKind, index: usize, pos: Vec2) -> Option<NodeId> {
        let root = model.root_id();
        spawn(model, kind, index, pos, Some(root))
    }

    fn assert_attachment_invariant(model: &EditorModel) {
        for (_, node) in model.iter_tree() {
            match node.kind() {
                NodeKind::Root => assert!(node.parent().is_none()),
                kind => {
                    let parent = model.node(node.parent().unwrap()).unwrap();
                    assert!(kind.can_attach_to(parent.kind()), "{kind:?} under {:?}", parent.kind());
                }
            }
            for child in node.children() {
                assert!(model.node(*child).is_some(), "dangling child {child}");
            }
        }
    }

    #[test]
    fn test_new_model_has_only_root() {
        let model = model();
        assert_eq!(model.node_count(), 1);
        let root = model.node(model.root_id()).unwrap();
        assert_eq!(root.kind(), NodeKind::Root);
        assert_eq!(root.name(), ROOT_NAME);
        assert_eq!(root.composition_id(), ROOT_COMPOSITION_ID);
        assert!(model.selected_id().is_none());
    }

    #[test]
    fn test_entity_needs_environment() {
        let mut model = model();
        assert!(spawn(&mut model, ENTITY, 0, Vec2::ZERO, None).is_none());
        assert_eq!(model.node_count(), 1);
        assert!(model.selected_id().is_none());
    }

    #[test]
    fn test_spawn_under_selected_environment() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(100.0, 100.0), None).unwrap();
        assert_eq!(model.node(env).unwrap().parent(), Some(model.root_id()));
        assert_eq!(model.selected_id(), Some(env));

        let eye = spawn(&mut model, ENTITY, 0, Vec2::new(90.0, 90.0), None).unwrap();
        let node = model.node(eye).unwrap();
        assert_eq!(node.parent(), Some(env));
        assert_eq!(node.composition_id(), "ent-001");
        assert_eq!(model.node(env).unwrap().composition_id(), "env-001");
        assert_eq!(model.selected_id(), Some(eye));
    }

    #[test]
    fn test_hint_wins_over_selection() {
        let mut model = model();
        let env_a = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        let env_b = spawn(&mut model, ENVIRONMENT, 2, Vec2::ZERO, None).unwrap();
        assert_eq!(model.selected_id(), Some(env_b));

        let eye = spawn(&mut model, ENTITY, 0, Vec2::ZERO, Some(env_a)).unwrap();
        assert_eq!(model.node(eye).unwrap().parent(), Some(env_a));
    }

    #[test]
    fn test_invalid_hint_falls_back() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        let eye = spawn(&mut model, ENTITY, 0, Vec2::ZERO, None).unwrap();

        // environment under environment is not allowed; the selected entity is
        let env2 = spawn(&mut model, ENVIRONMENT, 2, Vec2::ZERO, Some(env)).unwrap();
        assert_eq!(model.node(env2).unwrap().parent(), Some(eye));
    }

    #[test]
    fn test_environment_falls_back_to_root() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        assert_eq!(model.selected_id(), Some(env));
        let env2 = spawn(&mut model, ENVIRONMENT, 1, Vec2::ZERO, None).unwrap();
        assert_eq!(model.node(env2).unwrap().parent(), Some(model.root_id()));
    }

    #[test]
    fn test_unknown_palette_index_is_noop() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        assert!(spawn(&mut model, ENTITY, 42, Vec2::ZERO, None).is_none());
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.selected_id(), Some(env));
    }

    #[test]
    fn test_attachment_invariant_for_mixed_sequence() {
        let mut model = model();
        let kinds = [ENTITY, ENVIRONMENT, ENTITY, ENTITY, ENVIRONMENT, ENVIRONMENT, ENTITY];
        for (i, kind) in kinds.iter().cycle().take(40).enumerate() {
            let hint = if i % 3 == 0 { Some(model.root_id()) } else { None };
            spawn(&mut model, *kind, i % 3, Vec2::new(i as f32, 0.0), hint);
            if i % 5 == 0 {
                let first = model.order().first().copied();
                model.select_node(first);
            }
            if i % 11 == 0 {
                model.delete_selected();
            }
            assert_attachment_invariant(&model);
        }
    }

    #[test]
    fn test_disambiguated_names() {
        let mut model = model();
        spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None);
        spawn_top(&mut model, ENVIRONMENT, 0, Vec2::ZERO);
        spawn_top(&mut model, ENVIRONMENT, 0, Vec2::ZERO);
        let names: Vec<_> = model.iter_drawable_nodes().map(Node::name).collect();
        assert_eq!(names, ["Black Zone", "Black Zone #2", "Black Zone #3"]);
    }

    #[test]
    fn test_select_node_rejects_root_and_unknown() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        model.select_node(Some(model.root_id()));
        assert!(model.selected_id().is_none());
        model.select_node(Some(env));
        assert_eq!(model.selected_id(), Some(env));
        model.select_node(Some(999));
        assert!(model.selected_id().is_none());
    }

    #[test]
    fn test_select_at_position_picks_nearest() {
        let mut model = model();
        let a = spawn(&mut model, ENVIRONMENT, 2, Vec2::new(0.0, 0.0), None).unwrap();
        spawn_top(&mut model, ENVIRONMENT, 2, Vec2::new(10.0, 0.0));
        spawn_top(&mut model, ENVIRONMENT, 2, Vec2::new(100.0, 100.0));

        assert_eq!(model.select_at_position(Vec2::new(1.0, 0.0)), Some(a));
        assert_eq!(model.selected_id(), Some(a));
    }

    #[test]
    fn test_select_at_position_tie_goes_to_first() {
        let mut model = model();
        let a = spawn(&mut model, ENVIRONMENT, 2, Vec2::new(0.0, 0.0), None).unwrap();
        spawn_top(&mut model, ENVIRONMENT, 2, Vec2::new(10.0, 0.0));
        assert_eq!(model.select_at_position(Vec2::new(5.0, 0.0)), Some(a));
    }

    #[test]
    fn test_select_at_position_on_empty_model() {
        let mut model = model();
        assert_eq!(model.select_at_position(Vec2::ZERO), None);
    }

    #[test]
    fn test_move_selected_is_clamped() {
        let registry = PaletteRegistry::builder()
            .register(ENVIRONMENT, "Dot", "test::Dot", |pos| -> Box<dyn Payload> {
                let mut dot = VoidEnvironment::spawn(pos);
                dot.state.radius = 5.0;
                Box::new(dot)
            })
            .build();
        let mut model = EditorModel::new(Arc::new(registry));
        let dot = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(10.0, 10.0), None).unwrap();
        let bounds = Rect::new(0.0, 0.0, 50.0, 50.0);

        model.move_selected_within(bounds, Vec2::new(1000.0, 1000.0));
        assert_eq!(model.node(dot).unwrap().position(), Some(Vec2::new(45.0, 45.0)));

        model.move_selected_within(bounds, Vec2::new(-5.0, 25.0));
        assert_eq!(model.node(dot).unwrap().position(), Some(Vec2::new(5.0, 25.0)));
    }

    #[test]
    fn test_move_without_selection_is_noop() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(10.0, 10.0), None).unwrap();
        model.select_node(None);
        model.move_selected_within(Rect::new(0.0, 0.0, 50.0, 50.0), Vec2::new(30.0, 30.0));
        assert_eq!(model.node(env).unwrap().position(), Some(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn test_delete_subtree() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        let eye = spawn(&mut model, ENTITY, 0, Vec2::ZERO, Some(env)).unwrap();
        let inner = spawn(&mut model, ENVIRONMENT, 2, Vec2::ZERO, Some(eye)).unwrap();
        spawn(&mut model, ENTITY, 1, Vec2::ZERO, Some(inner)).unwrap();
        let other = spawn_top(&mut model, ENVIRONMENT, 1, Vec2::ZERO).unwrap();
        assert_eq!(model.node_count(), 6);
        let order_before = model.order().len();

        model.select_node(Some(eye));
        assert_eq!(model.delete_selected(), 3);
        assert_eq!(model.node_count(), 3);
        assert_eq!(model.order().len(), order_before - 3);
        assert!(model.node(env).unwrap().children().is_empty());
        assert_attachment_invariant(&model);

        // parent is a non-root node
        assert_eq!(model.selected_id(), Some(env));
        assert!(model.node(other).is_some());
    }

    #[test]
    fn test_delete_top_level_selects_last_remaining() {
        let mut model = model();
        let a = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        let b = spawn_top(&mut model, ENVIRONMENT, 1, Vec2::ZERO).unwrap();
        model.select_node(Some(a));
        model.delete_selected();
        assert_eq!(model.selected_id(), Some(b));

        model.delete_selected();
        assert!(model.selected_id().is_none());
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.delete_selected(), 0);
    }

    #[test]
    fn test_iter_tree_preorder_depths() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        spawn(&mut model, ENTITY, 0, Vec2::ZERO, Some(env));
        spawn_top(&mut model, ENVIRONMENT, 1, Vec2::ZERO);

        let walk: Vec<_> = model.iter_tree().map(|(d, n)| (d, n.name().to_string())).collect();
        assert_eq!(
            walk,
            vec![
                (0, ROOT_NAME.to_string()),
                (1, "Black Zone".to_string()),
                (2, "Eye".to_string()),
                (1, "Music".to_string()),
            ]
        );
    }

    #[test]
    fn test_labels() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::ZERO, None).unwrap();
        let eye = spawn(&mut model, ENTITY, 0, Vec2::ZERO, None).unwrap();
        spawn(&mut model, ENTITY, 0, Vec2::ZERO, Some(env));

        assert_eq!(model.selected_label(), Some("Eye #2"));
        assert_eq!(model.parent_label(eye), Some("Black Zone"));
        assert_eq!(model.parent_label(env), Some(ROOT_NAME));
        assert_eq!(model.child_labels(env), ["Eye", "Eye #2"]);
        assert!(model.child_labels(999).is_empty());
    }

    #[test]
    fn test_build_composition() {
        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(100.0, 100.0), None).unwrap();
        spawn(&mut model, ENTITY, 0, Vec2::new(80.0, 90.0), Some(env));

        let doc = model.build_composition(&ExportOptions::default());
        assert_eq!(doc.version, COMPOSITION_VERSION);
        assert_eq!(doc.metadata.name, "editor-composition");
        assert_eq!(doc.scene.canvas, Some([640, 360]));
        assert_eq!(doc.nodes.len(), 2);

        let zone = &doc.nodes[0];
        assert_eq!(zone.id, "env-001");
        assert_eq!(zone.type_path, BlackZone::TYPE_PATH);
        assert!(zone.parent.is_none());
        assert_eq!(zone.children, ["ent-001"]);

        let eye = &doc.nodes[1];
        assert_eq!(eye.kind, ENTITY);
        assert_eq!(eye.type_path, Eye::TYPE_PATH);
        assert_eq!(eye.parent.as_deref(), Some("env-001"));
        assert_eq!(eye.transform.position, [80.0, 90.0]);
        assert!(eye.transform.rotation.is_none());
        assert!(eye.state.contains_key("blink_duration"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.eei.json");

        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(100.0, 100.0), None).unwrap();
        let eye = spawn(&mut model, ENTITY, 0, Vec2::new(80.0, 90.0), Some(env)).unwrap();
        spawn(&mut model, ENVIRONMENT, 2, Vec2::new(81.0, 91.0), Some(eye));
        spawn_top(&mut model, ENVIRONMENT, 1, Vec2::new(5.0, 5.0));

        let written = model.save_composition(&path, &ExportOptions::default()).unwrap();
        assert_eq!(written, path);

        let registry = Arc::clone(model.registry());
        let runtime = load_composition(&path, &registry).unwrap();
        assert_eq!(runtime.len(), 4);

        for (original, loaded) in model.iter_drawable_nodes().zip(runtime.nodes()) {
            assert_eq!(original.composition_id(), loaded.composition_id);
            assert_eq!(original.kind(), NodeKind::from(loaded.kind));
            assert_eq!(original.position(), Some(loaded.instance.position()));
            let expected_parent = model
                .node(original.parent().unwrap())
                .filter(|p| p.kind() != NodeKind::Root)
                .map(|p| p.composition_id().to_string());
            assert_eq!(loaded.parent, expected_parent);
        }
    }

    #[test]
    fn test_load_from_runtime_restores_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.eei.json");

        let mut model = model();
        let env = spawn(&mut model, ENVIRONMENT, 0, Vec2::new(100.0, 100.0), None).unwrap();
        spawn(&mut model, ENTITY, 0, Vec2::new(80.0, 90.0), Some(env));
        spawn(&mut model, ENTITY, 0, Vec2::new(120.0, 90.0), Some(env));
        model.save_composition(&path, &ExportOptions::default()).unwrap();

        let registry = Arc::clone(model.registry());
        let runtime = load_composition(&path, &registry).unwrap();
        let mut restored = EditorModel::new(registry);
        assert_eq!(restored.load_from_runtime(runtime), 3);

        let names: Vec<_> = restored.iter_drawable_nodes().map(Node::name).collect();
        assert_eq!(names, ["Black Zone", "Eye", "Eye #2"]);
        let zone_id = restored.order()[0];
        assert_eq!(restored.child_labels(zone_id), ["Eye", "Eye #2"]);
        assert!(restored.selected_id().is_none());

        // counters continue past imported ids
        restored.select_node(Some(zone_id));
        let fresh = restored
            .spawn_from_palette(ENTITY, 1, Vec2::ZERO, None)
            .map(|n| n.composition_id().to_string());
        assert_eq!(fresh.as_deref(), Some("ent-003"));
    }

    #[test]
    fn test_rotation_and_scale_survive_reexport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilted.eei.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "scene": { "canvas": [640, 360] },
                "nodes": [
                    {
                        "id": "env-001", "kind": "environment",
                        "type": "environments::black_zone::BlackZone",
                        "transform": { "position": [100, 100], "rotation": 0.5, "scale": [2.0, 3.0] }
                    },
                    {
                        "id": "ent-001", "kind": "entity",
                        "type": "entities::eye::Eye",
                        "parent": "env-001",
                        "transform": { "position": [90, 90] }
                    }
                ]
            }"#,
        )
        .unwrap();

        let registry = Arc::new(PaletteRegistry::builtin());
        let runtime = load_composition(&path, &registry).unwrap();
        let mut model = EditorModel::new(registry);
        model.load_from_runtime(runtime);
        model.save_composition(&path, &ExportOptions::default()).unwrap();

        let doc = crate::composition::read_document(&path).unwrap();
        assert_eq!(doc.nodes[0].transform.rotation, Some(0.5));
        assert_eq!(doc.nodes[0].transform.scale, Some([2.0, 3.0]));
        assert!(doc.nodes[1].transform.rotation.is_none());
        assert!(doc.nodes[1].transform.scale.is_none());
    }
}

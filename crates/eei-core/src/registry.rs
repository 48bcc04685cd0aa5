//! Palette registry: the catalog of instantiable payload types.
//!
//! Built once from explicit registration lists and immutable afterwards.
//! The editor indexes it by `(kind, index)`; the composition loader looks
//! types up by their type path.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::payload::{Payload, Spawnable};
use crate::payloads;

/// Category of a palette item. Also the `kind` written to compositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteKind {
    Entity,
    Environment,
}

impl PaletteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Environment => "environment",
        }
    }

    /// Prefix of composition ids issued for this kind.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Entity => "ent",
            Self::Environment => "env",
        }
    }
}

impl fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type PayloadFactory = Arc<dyn Fn(Vec2) -> Box<dyn Payload> + Send + Sync>;

/// One instantiable payload type.
#[derive(Clone)]
pub struct PaletteItem {
    pub name: String,
    pub type_path: String,
    pub kind: PaletteKind,
    factory: PayloadFactory,
}

impl PaletteItem {
    /// Build a fresh payload at `position`.
    pub fn instantiate(&self, position: Vec2) -> Box<dyn Payload> {
        (self.factory)(position)
    }
}

impl fmt::Debug for PaletteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteItem")
            .field("name", &self.name)
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct PaletteRegistry {
    entities: Vec<PaletteItem>,
    environments: Vec<PaletteItem>,
    by_type: HashMap<String, (PaletteKind, usize)>,
}

impl PaletteRegistry {
    pub fn builder() -> PaletteRegistryBuilder {
        PaletteRegistryBuilder::default()
    }

    /// Registry holding every built-in payload type.
    pub fn builtin() -> Self {
        let builder = payloads::entities::register(Self::builder());
        payloads::environments::register(builder).build()
    }

    pub fn get_item(&self, kind: PaletteKind, index: usize) -> Option<&PaletteItem> {
        self.items(kind).get(index)
    }

    pub fn items(&self, kind: PaletteKind) -> &[PaletteItem] {
        match kind {
            PaletteKind::Entity => &self.entities,
            PaletteKind::Environment => &self.environments,
        }
    }

    /// Look up an item by type path.
    pub fn find_type(&self, type_path: &str) -> Option<&PaletteItem> {
        let (kind, index) = self.by_type.get(type_path)?;
        self.get_item(*kind, *index)
    }

    pub fn len(&self) -> usize {
        self.entities.len() + self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects registrations in order. Palette indices follow registration order.
#[derive(Default)]
pub struct PaletteRegistryBuilder {
    registry: PaletteRegistry,
}

impl PaletteRegistryBuilder {
    pub fn entity<T: Spawnable>(self, name: &str) -> Self {
        self.register(PaletteKind::Entity, name, T::TYPE_PATH, |pos| -> Box<dyn Payload> {
            Box::new(T::spawn(pos))
        })
    }

    pub fn environment<T: Spawnable>(self, name: &str) -> Self {
        self.register(PaletteKind::Environment, name, T::TYPE_PATH, |pos| -> Box<dyn Payload> {
            Box::new(T::spawn(pos))
        })
    }

    /// Register an arbitrary factory. A type path that is already registered
    /// is skipped.
    pub fn register<F>(mut self, kind: PaletteKind, name: &str, type_path: &str, factory: F) -> Self
    where
        F: Fn(Vec2) -> Box<dyn Payload> + Send + Sync + 'static,
    {
        if self.registry.by_type.contains_key(type_path) {
            tracing::warn!("[palette] duplicate type path {type_path}, skipping {name}");
            return self;
        }

        let items = match kind {
            PaletteKind::Entity => &mut self.registry.entities,
            PaletteKind::Environment => &mut self.registry.environments,
        };
        self.registry
            .by_type
            .insert(type_path.to_string(), (kind, items.len()));
        items.push(PaletteItem {
            name: name.to_string(),
            type_path: type_path.to_string(),
            kind,
            factory: Arc::new(factory),
        });
        self
    }

    pub fn build(self) -> PaletteRegistry {
        self.registry
    }
}

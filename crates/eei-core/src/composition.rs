//! Composition file format (`*.eei.json`).
//!
//! A composition is a versioned JSON document listing the payload-bearing
//! nodes of a scene, each with its type path, parent link, transform and
//! state. The editor writes it; the loader turns it back into a
//! [`CompositionRuntime`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::registry::{PaletteKind, PaletteRegistry};
use crate::runtime::CompositionRuntime;
use crate::state::StateError;

/// Current document version.
pub const COMPOSITION_VERSION: u32 = 1;

pub const DEFAULT_COMPOSITION_NAME: &str = "editor-composition";
pub const DEFAULT_CANVAS: [u32; 2] = [640, 360];

#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    #[error("composition file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed composition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported composition version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("duplicate node id `{0}`")]
    DuplicateId(String),
    #[error("node `{id}` has unknown type `{type_path}`")]
    UnknownType { id: String, type_path: String },
    #[error("node `{id}` is declared as {declared} but `{type_path}` is registered as {registered}")]
    KindMismatch {
        id: String,
        type_path: String,
        declared: PaletteKind,
        registered: PaletteKind,
    },
    #[error("node `{id}` references missing parent `{parent}`")]
    DanglingParent { id: String, parent: String },
    #[error("node `{0}` is part of a parent cycle")]
    ParentCycle(String),
    #[error("node `{id}`: {source}")]
    State {
        id: String,
        #[source]
        source: StateError,
    },
}

impl CompositionError {
    /// Missing files are expected on first run and are not treated as failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionDocument {
    pub version: u32,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub scene: SceneBlock,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    /// Reserved; always written empty.
    #[serde(default)]
    pub interactions: Vec<Value>,
}

impl CompositionDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Authored canvas information. Malformed values read as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneBlock {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub canvas: Option<[u32; 2]>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub origin: Option<[i32; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    pub kind: PaletteKind,
    #[serde(rename = "type")]
    pub type_path: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub state: Map<String, Value>,
    /// Written for readers; the loader derives children from `parent`.
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 2]>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Metadata and scene values written by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub canvas: [u32; 2],
    pub origin: [i32; 2],
}

impl ExportOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_canvas(mut self, canvas: [u32; 2]) -> Self {
        self.canvas = canvas;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPOSITION_NAME.to_string(),
            description: String::new(),
            tags: Vec::new(),
            canvas: DEFAULT_CANVAS,
            origin: [0, 0],
        }
    }
}

// ============================================================================
// File access
// ============================================================================

pub fn read_document(path: &Path) -> Result<CompositionDocument, CompositionError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            CompositionError::NotFound(path.to_path_buf())
        } else {
            CompositionError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Ok(CompositionDocument::from_json(&text)?)
}

/// Write `document` as pretty JSON, creating parent directories.
pub fn write_document(
    path: &Path,
    document: &CompositionDocument,
) -> Result<PathBuf, CompositionError> {
    let io_err = |source| CompositionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = document.to_json()?;
    fs::write(path, json).map_err(io_err)?;

    tracing::info!(
        "[composition] saved {} node(s) to {}",
        document.nodes.len(),
        path.display()
    );
    Ok(path.to_path_buf())
}

/// Read and instantiate a composition. Either every node loads or none does.
pub fn load_composition(
    path: &Path,
    registry: &PaletteRegistry,
) -> Result<CompositionRuntime, CompositionError> {
    let document = read_document(path)?;
    let runtime = CompositionRuntime::from_document(&document, registry)?;
    tracing::info!(
        "[composition] loaded {} node(s) from {}",
        runtime.len(),
        path.display()
    );
    Ok(runtime)
}

/// First candidate that exists on disk.
pub fn resolve_composition_path<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|p| -> &Path { p.as_ref() })
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

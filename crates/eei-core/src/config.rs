//! Application settings loaded from `settings.toml`.
//!
//! Every table and key is optional; missing values fall back to defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::composition::DEFAULT_CANVAS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub compositions: CompositionPaths,
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub fps: u32,
    pub resizable: bool,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            title: "EEI".to_string(),
            fps: 60,
            resizable: false,
            fullscreen: false,
        }
    }
}

/// Where compositions are read from and written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionPaths {
    pub directory: PathBuf,
    /// File the editor saves to, relative to `directory`.
    pub export_file: String,
    /// Files tried, in order, when the export file does not exist yet.
    pub fallback_files: Vec<String>,
}

impl CompositionPaths {
    pub fn export_path(&self) -> PathBuf {
        self.directory.join(&self.export_file)
    }

    /// Export file first, then the fallbacks.
    pub fn candidates(&self) -> Vec<PathBuf> {
        std::iter::once(&self.export_file)
            .chain(&self.fallback_files)
            .map(|file| self.directory.join(file))
            .collect()
    }
}

impl Default for CompositionPaths {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets/compositions"),
            export_file: "editor_export.eei.json".to_string(),
            fallback_files: vec!["demo_face.eei.json".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Authored virtual resolution `[width, height]`.
    pub canvas: [u32; 2],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.window.resizable);
        assert_eq!(config.editor.canvas, [640, 360]);
    }

    #[test]
    fn test_partial_window_table() {
        let config = AppConfig::from_toml(
            r#"
            [window]
            width = 1280
            height = 720
            title = "Face"
            fullscreen = true
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.title, "Face");
        assert_eq!(config.window.fps, 60);
        assert!(config.window.fullscreen);
        assert!(!config.window.resizable);
    }

    #[test]
    fn test_composition_candidates() {
        let config = AppConfig::from_toml(
            r#"
            [compositions]
            directory = "scenes"
            export_file = "out.eei.json"
            fallback_files = ["a.eei.json", "b.eei.json"]
            "#,
        )
        .unwrap();
        let candidates = config.compositions.candidates();
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("scenes/out.eei.json"),
                PathBuf::from("scenes/a.eei.json"),
                PathBuf::from("scenes/b.eei.json"),
            ]
        );
        assert_eq!(config.compositions.export_path(), PathBuf::from("scenes/out.eei.json"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml("[window]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("settings.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}

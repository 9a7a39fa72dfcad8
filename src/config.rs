//! Configuration loading and management.
//!
//! Resolution order (first hit wins for the file, then env overrides apply):
//! 1. `PLANIT_CONFIG` (or `--config`) - explicit config file
//! 2. `.planit.yaml` in the working directory
//! 3. `<user config dir>/planit/config.yaml`
//! 4. Built-in defaults
//!
//! ## Environment Variables
//! - `PLANIT_FILE` - Project document path
//! - `PLANIT_PROJECT_NAME` - Name written into new project documents

use crate::store::{DEFAULT_PROJECT_FILE, DEFAULT_PROJECT_NAME};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".planit.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the project document lives and what it is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Path to the JSON project document.
    #[serde(default = "default_project_file")]
    pub file: PathBuf,

    /// Name stored in newly initialized documents.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            file: default_project_file(),
            name: default_project_name(),
        }
    }
}

fn default_project_file() -> PathBuf {
    PathBuf::from(DEFAULT_PROJECT_FILE)
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// Listing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    /// Columns with created/completed/cleaned dates.
    #[default]
    Table,
    /// Indented titles with descriptions underneath.
    Simple,
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub style: ListStyle,

    /// Width of the title/description column in table view.
    #[serde(default = "default_description_width")]
    pub description_width: usize,

    /// Sort siblings by status instead of insertion order.
    #[serde(default)]
    pub sort_by_status: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            style: ListStyle::default(),
            description_width: default_description_width(),
            sort_by_status: false,
        }
    }
}

fn default_description_width() -> usize {
    70
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config file, then apply environment overrides.
    ///
    /// An explicit path must exist and parse; implicit locations are skipped
    /// when missing.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PLANIT_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => Self::candidate_paths()
                .into_iter()
                .find(|p| p.is_file())
                .map(|p| {
                    debug!(path = %p.display(), "Using config file");
                    Self::load(&p)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Implicit config locations, highest priority first.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("planit").join("config.yaml"));
        }
        paths
    }

    fn apply_env(&mut self) {
        if let Ok(file) = std::env::var("PLANIT_FILE") {
            self.project.file = PathBuf::from(file);
        }
        if let Ok(name) = std::env::var("PLANIT_PROJECT_NAME") {
            self.project.name = name;
        }
    }
}

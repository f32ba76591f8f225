//! Configuration
//!
//! Layered settings: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/assetdex/config.toml`), the project file
//! (`<project>/assetdex.toml`), then `ASSETDEX__SECTION__KEY` environment
//! variables. Later layers win.

pub mod facade;
pub mod merge {
    pub mod service;
}
pub mod paths {
    pub mod xdg_root;
}
pub mod sources {
    pub mod environment;
    pub mod files;
}
pub mod workspace {
    pub mod storage_paths;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the project-level config file.
pub const PROJECT_CONFIG_FILE: &str = "assetdex.toml";

/// Corpus layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Top-level directory holding every item.
    #[serde(default = "default_corpus_root")]
    pub corpus_root: String,

    /// File or directory names skipped during enumeration.
    #[serde(default = "default_ignored_names")]
    pub ignored_names: Vec<String>,
}

fn default_corpus_root() -> String {
    "Assets".to_string()
}

fn default_ignored_names() -> Vec<String> {
    vec!["Thumbs.db".to_string(), "desktop.ini".to_string()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            corpus_root: default_corpus_root(),
            ignored_names: default_ignored_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Items larger than this are not scanned for references.
    #[serde(default = "default_max_reference_scan_bytes")]
    pub max_reference_scan_bytes: u64,
}

fn default_max_reference_scan_bytes() -> u64 {
    crate::repository::fs::DEFAULT_MAX_REFERENCE_SCAN_BYTES
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_reference_scan_bytes: default_max_reference_scan_bytes(),
        }
    }
}

/// Version-control status settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcsConfig {
    /// When false, every record is classified `none` / `unknown`.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_git_executable")]
    pub executable: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_git_executable() -> String {
    "git".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl VcsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            executable: default_git_executable(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetdexConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub vcs: VcsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AssetdexConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        let root = crate::types::normalize_logical_path(&self.project.corpus_root);
        if root.is_empty() || root.contains('/') || root == ".." {
            return Err(ApiError::ConfigError(format!(
                "project.corpus_root must be a single directory name, got '{}'",
                self.project.corpus_root
            )));
        }
        if self.vcs.enabled && self.vcs.executable.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "vcs.executable must not be empty when vcs is enabled".to_string(),
            ));
        }
        if self.vcs.timeout_ms == 0 {
            return Err(ApiError::ConfigError("vcs.timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Render as TOML, as written by `assetdex init`.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

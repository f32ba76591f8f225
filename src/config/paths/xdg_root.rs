//! XDG base directories for global config and per-project data.

use crate::error::ApiError;
use std::path::{Component, Path, PathBuf};

/// `$XDG_DATA_HOME`, or `$HOME/.local/share`.
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, or `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }
    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError("Could not determine XDG config home directory (HOME not set)".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/assetdex/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join("assetdex").join("config.toml"))
}

/// Per-project data directory: `$XDG_DATA_HOME/assetdex/<canonical project path>/`.
///
/// `/home/user/game` becomes `$XDG_DATA_HOME/assetdex/home/user/game/`.
pub fn project_data_dir(project_root: &Path) -> Result<PathBuf, ApiError> {
    let data_home = data_home().ok_or_else(|| {
        ApiError::ConfigError("Could not determine XDG data home directory (HOME not set)".to_string())
    })?;
    let canonical = dunce::canonicalize(project_root).map_err(|e| {
        ApiError::ConfigError(format!("Failed to canonicalize project path: {}", e))
    })?;

    let mut data_dir = data_home.join("assetdex");
    for component in canonical.components() {
        if let Component::Normal(name) = component {
            data_dir.push(name);
        }
    }
    Ok(data_dir)
}

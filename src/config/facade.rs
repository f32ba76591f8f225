//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::AssetdexConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the standard layers for `project_root`, then validate.
    pub fn load(project_root: &Path) -> Result<AssetdexConfig, ApiError> {
        let config = MergeService::load(project_root)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file with the environment overlay, then validate.
    pub fn load_from_file(path: &Path) -> Result<AssetdexConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default() -> AssetdexConfig {
        AssetdexConfig::default()
    }
}

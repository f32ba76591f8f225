//! StorageConfig: where the catalog lives.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_catalog_path() -> PathBuf {
    PathBuf::from(".assetdex/catalog")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Catalog database, relative to the project root unless absolute.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Keep the catalog under the XDG data directory instead of the project.
    #[serde(default)]
    pub in_data_home: bool,
}

impl StorageConfig {
    /// Filesystem location of the catalog for `project_root`.
    pub fn resolve_path(&self, project_root: &Path) -> Result<PathBuf, ApiError> {
        if self.in_data_home {
            return Ok(xdg::project_data_dir(project_root)?.join("catalog"));
        }
        if self.catalog_path.is_absolute() {
            Ok(self.catalog_path.clone())
        } else {
            Ok(project_root.join(&self.catalog_path))
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            in_data_home: false,
        }
    }
}

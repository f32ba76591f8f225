//! MergeService: stacks sources in precedence order and deserializes.

use crate::config::sources::{environment, files};
use crate::config::AssetdexConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

pub struct MergeService;

impl MergeService {
    /// Precedence: defaults -> global file -> project file -> environment.
    pub fn load(project_root: &Path) -> Result<AssetdexConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = files::add_global(builder);
        let builder = files::add_project(builder, project_root);
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Precedence: defaults -> `path` (required) -> environment.
    pub fn load_from_file(path: &Path) -> Result<AssetdexConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = files::add_required(builder, path);
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }
}

/// Builder seeded with the serialized defaults.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = serde_json::to_string(&AssetdexConfig::default())
        .map_err(|e| ConfigError::Message(format!("Failed to serialize defaults: {}", e)))?;
    Ok(Config::builder().add_source(File::from_str(&defaults, FileFormat::Json)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(crate::config::PROJECT_CONFIG_FILE),
            "[project]\ncorpus_root = \"Content\"\n\n[vcs]\ntimeout_ms = 1500\n",
        )
        .unwrap();
        let config = MergeService::load(temp_dir.path()).unwrap();
        assert_eq!(config.project.corpus_root, "Content");
        assert_eq!(config.vcs.timeout_ms, 1500);
        assert_eq!(config.vcs.executable, "git");
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = MergeService::load(temp_dir.path()).unwrap();
        assert_eq!(config.storage, crate::config::StorageConfig::default());
    }

    #[test]
    fn test_explicit_file_is_required() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(MergeService::load_from_file(&missing).is_err());
    }
}

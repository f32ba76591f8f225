//! File sources: global, project, and explicit config files.

use crate::config::{xdg, PROJECT_CONFIG_FILE};
use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::Path;
use tracing::debug;

/// `$XDG_CONFIG_HOME/assetdex/config.toml`, if it can be located.
pub fn add_global(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match xdg::global_config_path() {
        Ok(path) => builder.add_source(File::from(path).required(false)),
        Err(e) => {
            debug!(error = %e, "No global config location");
            builder
        }
    }
}

/// `<project_root>/assetdex.toml`, optional.
pub fn add_project(builder: ConfigBuilder<DefaultState>, project_root: &Path) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(project_root.join(PROJECT_CONFIG_FILE)).required(false))
}

pub fn add_required(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).required(true))
}

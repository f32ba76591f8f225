//! CLI Tooling
//!
//! Command-line front end for the catalog. Every command runs against one
//! project root and returns its rendered output as a string.

use crate::api::CatalogService;
use crate::batch::BatchOp;
use crate::catalog::{MetadataRecord, UserField};
use crate::config::{AssetdexConfig, ConfigLoader, PROJECT_CONFIG_FILE};
use crate::error::{ApiError, StorageError};
use crate::index::IndexScope;
use crate::logging::LoggingConfig;
use crate::query::FilterQuery;
use crate::tooling::format::{
    format_batch_report, format_index_report, format_record_detail, format_record_table,
    format_status_summary,
};
use crate::types::ItemId;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Assetdex - persistent asset catalog
#[derive(Parser, Debug)]
#[command(name = "assetdex")]
#[command(about = "Asset catalog with stable identities, dependency graph, and VCS status")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root directory
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// `base` with command-line overrides applied.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            if config.output == "file" {
                config.output = "file+stderr".to_string();
            }
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

/// Optional filter predicates shared by several commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Substring of name, path, or any tag
    #[arg(long)]
    pub text: Option<String>,

    /// Substring of any tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Substring of the type tag
    #[arg(long = "type")]
    pub type_tag: Option<String>,
}

impl FilterArgs {
    pub fn query(&self) -> FilterQuery {
        FilterQuery::new(self.text.as_deref(), self.tag.as_deref(), self.type_tag.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default assetdex.toml and create the catalog
    Init {
        /// Overwrite an existing assetdex.toml
        #[arg(long)]
        force: bool,
    },
    /// Re-index the corpus, or only the given sub-roots
    Index {
        /// Sub-root to index (repeatable); invalid roots fall back to the whole corpus
        #[arg(long = "scope")]
        scope: Vec<String>,
    },
    /// Re-derive selected items (by id, or everything matching the filter)
    Refresh {
        ids: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List catalog items
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Show at most this many items
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one item
    Show {
        id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Set a user field: tags, category, designer, notes. Omit the value to clear it.
    Set {
        id: String,
        field: String,
        value: Option<String>,
    },
    /// Apply one edit to many items
    Batch {
        #[command(subcommand)]
        op: BatchCommands,
        /// Target these ids instead of the filter result (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Rename an item, keeping its identity and extension
    Rename { id: String, new_name: String },
    /// Export the catalog as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the catalog with a JSON export
    Import { input: PathBuf },
    /// Summarize the catalog and version-control state
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// List items with pending working-tree changes
        #[arg(long)]
        changed: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BatchCommands {
    /// Add a tag (case-insensitive duplicates are skipped)
    AddTag { tag: String },
    RemoveTag { tag: String },
    ClearTags,
    SetCategory { category: String },
    /// Set the Designer field; omit the value to clear it
    SetDesigner { value: Option<String> },
    /// Set the Notes field; omit the value to clear it
    SetNotes { value: Option<String> },
}

impl BatchCommands {
    pub fn to_op(&self) -> BatchOp {
        match self {
            BatchCommands::AddTag { tag } => BatchOp::AddTag(tag.clone()),
            BatchCommands::RemoveTag { tag } => BatchOp::RemoveTag(tag.clone()),
            BatchCommands::ClearTags => BatchOp::ClearTags,
            BatchCommands::SetCategory { category } => BatchOp::SetCategory(category.clone()),
            BatchCommands::SetDesigner { value } => BatchOp::SetCustomField1(value.clone()),
            BatchCommands::SetNotes { value } => BatchOp::SetCustomField2(value.clone()),
        }
    }
}

/// CLI context: resolved configuration plus an open catalog service.
pub struct CliContext {
    project_root: PathBuf,
    config: AssetdexConfig,
    service: CatalogService,
}

impl CliContext {
    /// Load configuration for `project_root`, or from `config_path` when given.
    pub fn load_config(project_root: &Path, config_path: Option<&Path>) -> Result<AssetdexConfig, ApiError> {
        match config_path {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(project_root),
        }
    }

    pub fn new(project_root: PathBuf, config: AssetdexConfig) -> Result<Self, ApiError> {
        let service = CatalogService::open(&config, &project_root)?;
        Ok(Self {
            project_root,
            config,
            service,
        })
    }

    pub fn service(&self) -> &CatalogService {
        &self.service
    }

    pub fn execute(&mut self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&mut self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init { force } => self.handle_init(*force),
            Commands::Index { scope } => {
                let scope = if scope.is_empty() {
                    IndexScope::Entire
                } else {
                    IndexScope::SubRoots(scope.clone())
                };
                let report = self.service.reindex(&scope)?;
                Ok(format_index_report(&report))
            }
            Commands::Refresh { ids, filter } => {
                let ids = self.resolve_targets(ids, filter);
                let report = self.service.refresh(&ids)?;
                Ok(format_index_report(&report))
            }
            Commands::List {
                filter,
                format,
                limit,
            } => {
                let format = parse_format(format)?;
                let query = filter.query();
                let mut records = self.service.filter(&query);
                if let Some(limit) = limit {
                    records.truncate(*limit);
                }
                match format {
                    OutputFormat::Json => to_json(&records),
                    OutputFormat::Text => Ok(format_record_table(&records)),
                }
            }
            Commands::Show { id, format } => {
                let format = parse_format(format)?;
                let record = self.find(id)?;
                match format {
                    OutputFormat::Json => to_json(record),
                    OutputFormat::Text => Ok(format_record_detail(record)),
                }
            }
            Commands::Set { id, field, value } => {
                let field: UserField = field.parse()?;
                let id = self.find(id)?.id.clone();
                self.service.set_user_field(&id, field, value.as_deref())?;
                self.service.save()?;
                let shown = self
                    .service
                    .get(&id)
                    .and_then(|record| record.user_field(field))
                    .unwrap_or_else(|| "(cleared)".to_string());
                Ok(format!("{} = {}", field, shown))
            }
            Commands::Batch { op, ids, filter } => {
                let op = op.to_op();
                let targets = self.resolve_targets(ids, filter);
                let report = self.service.apply_batch(&targets, &op)?;
                Ok(format_batch_report(&op, &report))
            }
            Commands::Rename { id, new_name } => {
                let id = self.find(id)?.id.clone();
                let new_path = self.service.rename(&id, new_name)?;
                Ok(format!("Renamed to {}", new_path))
            }
            Commands::Export { output } => {
                let json = self.service.export_json()?;
                match output {
                    Some(path) => {
                        std::fs::write(path, &json).map_err(StorageError::from)?;
                        Ok(format!(
                            "Exported {} item(s) to {}",
                            self.service.records().len(),
                            path.display()
                        ))
                    }
                    None => Ok(json),
                }
            }
            Commands::Import { input } => {
                let json = std::fs::read_to_string(input).map_err(StorageError::from)?;
                let count = self.service.import_json(&json)?;
                Ok(format!("Imported {} item(s)", count))
            }
            Commands::Status { format, changed } => {
                let format = parse_format(format)?;
                let summary = self.service.status_summary();
                match (format, changed) {
                    (OutputFormat::Json, false) => to_json(&summary),
                    (OutputFormat::Json, true) => to_json(&self.service.changed_records()),
                    (OutputFormat::Text, false) => Ok(format_status_summary(&summary)),
                    (OutputFormat::Text, true) => Ok(format_record_table(&self.service.changed_records())),
                }
            }
        }
    }

    fn handle_init(&mut self, force: bool) -> Result<String, ApiError> {
        let path = self.project_root.join(PROJECT_CONFIG_FILE);
        let catalog = self.config.storage.resolve_path(&self.project_root)?;
        if path.exists() && !force {
            return Ok(format!(
                "{} already exists (use --force to overwrite)\nCatalog: {}",
                path.display(),
                catalog.display()
            ));
        }
        std::fs::write(&path, self.config.to_toml()?).map_err(StorageError::from)?;
        Ok(format!("Wrote {}\nCatalog: {}", path.display(), catalog.display()))
    }

    /// Explicit ids win; otherwise every record matching the filter.
    fn resolve_targets(&mut self, ids: &[String], filter: &FilterArgs) -> Vec<ItemId> {
        if ids.is_empty() {
            self.service.filter_ids(&filter.query())
        } else {
            ids.to_vec()
        }
    }

    /// Look up a record by full id or by a unique id prefix.
    fn find(&self, id: &str) -> Result<&MetadataRecord, ApiError> {
        if let Some(record) = self.service.get(id) {
            return Ok(record);
        }
        let mut matches = self
            .service
            .records()
            .iter()
            .filter(|record| !id.is_empty() && record.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record),
            (Some(_), Some(_)) => Err(ApiError::InvalidField(format!("id prefix '{}' is ambiguous", id))),
            _ => Err(ApiError::ItemNotFound(id.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat, ApiError> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(ApiError::InvalidField(format!(
            "format '{}' (must be 'text' or 'json')",
            other
        ))),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value).map_err(StorageError::from)?)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init { .. } => "init",
        Commands::Index { .. } => "index",
        Commands::Refresh { .. } => "refresh",
        Commands::List { .. } => "list",
        Commands::Show { .. } => "show",
        Commands::Set { .. } => "set",
        Commands::Batch { .. } => "batch",
        Commands::Rename { .. } => "rename",
        Commands::Export { .. } => "export",
        Commands::Import { .. } => "import",
        Commands::Status { .. } => "status",
    }
}

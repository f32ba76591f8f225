//! Assetdex: persistent asset catalog
//!
//! Keeps a catalog of project assets keyed by stable identities that survive
//! renames and moves. Each record combines derived facts (type, size, audio
//! duration), user-curated metadata (tags, category, custom fields), one-hop
//! dependency edges, and working-tree status from version control.

pub mod api;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod index;
pub mod logging;
pub mod query;
pub mod repository;
pub mod tooling;
pub mod types;
pub mod vcs;

pub use api::{CatalogService, StatusSummary};
pub use catalog::{CatalogStore, MetadataRecord, TagSet, UserField};
pub use error::{ApiError, RepositoryError, StorageError, VcsError};
pub use index::{IndexReport, IndexScope, Indexer};
pub use query::{filter, FilterEngine, FilterQuery};

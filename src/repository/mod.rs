//! Item Repository
//!
//! The collaborator that knows where items live: enumerates them, resolves
//! identity to path and back, reports facts and one-hop references. The indexer
//! and graph builder only ever talk to this trait.

pub mod fs;
pub mod kinds;
pub mod memory;

use crate::error::RepositoryError;
use crate::types::ItemId;

pub use fs::FsRepository;
pub use memory::MemoryRepository;

/// An enumerated item: identity plus current logical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub id: ItemId,
    pub path: String,
}

impl ItemEntry {
    pub fn new(id: impl Into<ItemId>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// Facts a repository can report about a loadable item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFacts {
    pub display_name: Option<String>,
    pub type_name: Option<String>,
}

/// Source of items for the indexer.
///
/// All paths are logical: `/`-separated and relative to the project root, with
/// the corpus root as their first segment.
pub trait ItemRepository {
    /// Logical corpus root, e.g. `Assets`.
    fn corpus_root(&self) -> &str;

    /// Every non-container item beneath `scope_roots`. Failure is fatal to a pass.
    fn enumerate_items(&self, scope_roots: &[String]) -> Result<Vec<ItemEntry>, RepositoryError>;

    /// True when `path` names a container (directory) in the corpus.
    fn is_container(&self, path: &str) -> bool;

    /// Display name and type of an item. `NotLoadable` when the type is unknown.
    fn load_facts(&self, path: &str) -> Result<ItemFacts, RepositoryError>;

    /// Size in bytes.
    fn size_of(&self, path: &str) -> Result<u64, RepositoryError>;

    /// Playback length of an audio item in seconds.
    fn audio_duration(&self, path: &str) -> Result<f64, RepositoryError>;

    /// Raw one-hop references of an item, as paths.
    fn direct_references(&self, path: &str) -> Result<Vec<String>, RepositoryError>;

    fn path_to_id(&self, path: &str) -> Option<ItemId>;

    fn id_to_path(&self, id: &str) -> Option<String>;

    /// Rename an item in place, keeping its identity. Returns the new path.
    fn rename(&self, path: &str, new_name: &str) -> Result<String, RepositoryError>;
}

/// Validate a requested item name. Shared by repository implementations.
pub(crate) fn validate_new_name(path: &str, new_name: &str) -> Result<String, RepositoryError> {
    let trimmed = new_name.trim();
    let reject = |message: &str| RepositoryError::Rename {
        path: path.to_string(),
        message: message.to_string(),
    };
    if trimmed.is_empty() {
        return Err(reject("new name is empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(reject("new name must not contain path separators"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(reject("new name is reserved"));
    }
    Ok(trimmed.to_string())
}

/// Logical path of `path` renamed to `new_name`, keeping the extension.
pub(crate) fn renamed_path(path: &str, new_name: &str) -> String {
    let ext = crate::types::extension_of(path);
    let original_ext = path
        .rsplit_once('.')
        .map(|(_, e)| e)
        .filter(|e| e.to_lowercase() == ext && !ext.is_empty());
    let file_name = match original_ext {
        Some(e) => format!("{}.{}", new_name, e),
        None => new_name.to_string(),
    };
    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, file_name),
        None => file_name,
    }
}

//! In-memory item repository.
//!
//! Holds a scripted corpus with per-item failure injection. Clones share state,
//! so a test can keep a handle and change the corpus between passes.

use crate::error::RepositoryError;
use crate::repository::{renamed_path, validate_new_name, ItemEntry, ItemFacts, ItemRepository};
use crate::types::{file_stem_of, is_within, normalize_logical_path, ItemId};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct MemoryItem {
    id: ItemId,
    path: String,
    type_name: Option<String>,
    size: Result<u64, String>,
    duration: Result<f64, String>,
    references: Result<Vec<String>, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: Vec<MemoryItem>,
    containers: BTreeSet<String>,
    enumeration_failure: Option<String>,
    rename_failure: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryRepository {
    corpus_root: String,
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryRepository {
    pub fn new(corpus_root: impl AsRef<str>) -> Self {
        Self {
            corpus_root: normalize_logical_path(corpus_root.as_ref()),
            state: Rc::new(RefCell::new(MemoryState::default())),
        }
    }

    /// Add a loadable item of `type_name`.
    pub fn with_item(self, id: &str, path: &str, type_name: &str) -> Self {
        self.insert(id, path, Some(type_name));
        self
    }

    /// Add an item whose type cannot be determined.
    pub fn with_unloadable_item(self, id: &str, path: &str) -> Self {
        self.insert(id, path, None);
        self
    }

    pub fn with_size(self, id: &str, size: u64) -> Self {
        self.update(id, |item| item.size = Ok(size));
        self
    }

    pub fn with_size_failure(self, id: &str) -> Self {
        self.update(id, |item| item.size = Err("size unavailable".to_string()));
        self
    }

    pub fn with_duration(self, id: &str, seconds: f64) -> Self {
        self.update(id, |item| item.duration = Ok(seconds));
        self
    }

    pub fn with_references(self, id: &str, paths: &[&str]) -> Self {
        self.set_references(id, paths);
        self
    }

    pub fn with_reference_failure(self, id: &str) -> Self {
        self.update(id, |item| item.references = Err("references unavailable".to_string()));
        self
    }

    /// Declare an empty container.
    pub fn with_container(self, path: &str) -> Self {
        self.state
            .borrow_mut()
            .containers
            .insert(normalize_logical_path(path));
        self
    }

    pub fn with_enumeration_failure(self, message: &str) -> Self {
        self.state.borrow_mut().enumeration_failure = Some(message.to_string());
        self
    }

    pub fn with_rename_failure(self, message: &str) -> Self {
        self.state.borrow_mut().rename_failure = Some(message.to_string());
        self
    }

    /// Add or replace an item.
    pub fn insert(&self, id: &str, path: &str, type_name: Option<&str>) {
        let item = MemoryItem {
            id: id.to_string(),
            path: normalize_logical_path(path),
            type_name: type_name.map(str::to_string),
            size: Ok(0),
            duration: Err("not audio".to_string()),
            references: Ok(Vec::new()),
        };
        let mut state = self.state.borrow_mut();
        state.items.retain(|existing| existing.id != item.id);
        state.items.push(item);
    }

    pub fn remove(&self, id: &str) {
        self.state.borrow_mut().items.retain(|item| item.id != id);
    }

    /// Move an item to a new path, keeping its identity.
    pub fn move_item(&self, id: &str, new_path: &str) {
        let new_path = normalize_logical_path(new_path);
        self.update(id, |item| item.path = new_path);
    }

    pub fn set_references(&self, id: &str, paths: &[&str]) {
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        self.update(id, |item| item.references = Ok(paths));
    }

    pub fn item_count(&self) -> usize {
        self.state.borrow().items.len()
    }

    fn update(&self, id: &str, change: impl FnOnce(&mut MemoryItem)) {
        let mut state = self.state.borrow_mut();
        if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
            change(item);
        }
    }

    fn with_path<R>(
        &self,
        path: &str,
        read: impl FnOnce(&MemoryItem) -> Result<R, String>,
    ) -> Result<R, RepositoryError> {
        let path = normalize_logical_path(path);
        let state = self.state.borrow();
        let item = state
            .items
            .iter()
            .find(|item| item.path == path)
            .ok_or_else(|| RepositoryError::NotLoadable(path.clone()))?;
        read(item).map_err(|message| RepositoryError::Probe { path, message })
    }
}

impl ItemRepository for MemoryRepository {
    fn corpus_root(&self) -> &str {
        &self.corpus_root
    }

    fn enumerate_items(&self, scope_roots: &[String]) -> Result<Vec<ItemEntry>, RepositoryError> {
        let state = self.state.borrow();
        if let Some(message) = &state.enumeration_failure {
            return Err(RepositoryError::Enumeration {
                root: scope_roots.join(", "),
                message: message.clone(),
            });
        }
        let mut entries: Vec<ItemEntry> = state
            .items
            .iter()
            .filter(|item| scope_roots.iter().any(|root| is_within(&item.path, root)))
            .map(|item| ItemEntry::new(item.id.clone(), item.path.clone()))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn is_container(&self, path: &str) -> bool {
        let path = normalize_logical_path(path);
        if !is_within(&path, &self.corpus_root) {
            return false;
        }
        if path.eq_ignore_ascii_case(&self.corpus_root) {
            return true;
        }
        let state = self.state.borrow();
        state.containers.contains(&path)
            || state
                .items
                .iter()
                .any(|item| item.path != path && is_within(&item.path, &path))
    }

    fn load_facts(&self, path: &str) -> Result<ItemFacts, RepositoryError> {
        let logical = normalize_logical_path(path);
        let state = self.state.borrow();
        match state.items.iter().find(|item| item.path == logical) {
            Some(MemoryItem {
                type_name: Some(type_name),
                ..
            }) => Ok(ItemFacts {
                display_name: Some(file_stem_of(&logical)),
                type_name: Some(type_name.clone()),
            }),
            _ => Err(RepositoryError::NotLoadable(logical)),
        }
    }

    fn size_of(&self, path: &str) -> Result<u64, RepositoryError> {
        self.with_path(path, |item| item.size.clone())
    }

    fn audio_duration(&self, path: &str) -> Result<f64, RepositoryError> {
        self.with_path(path, |item| item.duration.clone())
    }

    fn direct_references(&self, path: &str) -> Result<Vec<String>, RepositoryError> {
        self.with_path(path, |item| item.references.clone())
    }

    fn path_to_id(&self, path: &str) -> Option<ItemId> {
        let path = normalize_logical_path(path);
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.path == path)
            .map(|item| item.id.clone())
    }

    fn id_to_path(&self, id: &str) -> Option<String> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.path.clone())
    }

    fn rename(&self, path: &str, new_name: &str) -> Result<String, RepositoryError> {
        let name = validate_new_name(path, new_name)?;
        let current = normalize_logical_path(path);
        let mut state = self.state.borrow_mut();
        if let Some(message) = &state.rename_failure {
            return Err(RepositoryError::Rename {
                path: current,
                message: message.clone(),
            });
        }
        let target = renamed_path(&current, &name);
        if target != current && state.items.iter().any(|item| item.path == target) {
            return Err(RepositoryError::Rename {
                path: current,
                message: format!("{} already exists", target),
            });
        }
        let item = state
            .items
            .iter_mut()
            .find(|item| item.path == current)
            .ok_or_else(|| RepositoryError::Rename {
                path: current.clone(),
                message: "item does not exist".to_string(),
            })?;
        item.path = target.clone();
        Ok(target)
    }
}

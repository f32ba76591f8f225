//! Catalog service
//!
//! The surface a presentation layer drives: re-index, filter, read records, and
//! edit user-curated fields. Derived fields are never writable from here.
//! User-field edits stay in memory until `save`; re-index, refresh, batch, and
//! rename each persist as one unit of work.

use crate::batch::{self, BatchOp, BatchReport};
use crate::catalog::{CatalogStore, MetadataRecord, TagSet, UserField};
use crate::config::AssetdexConfig;
use crate::error::ApiError;
use crate::graph::rebuild_graph;
use crate::index::{IndexReport, IndexScope, Indexer};
use crate::query::{FilterEngine, FilterQuery};
use crate::repository::{FsRepository, ItemRepository};
use crate::types::{file_stem_of, ItemId};
use crate::vcs::{classify, GitBackend, NoBackend, StatusBackend, VcsStatus, VcsSystem};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Counts over the current record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub total_bytes: u64,
    pub untagged: usize,
    pub uncategorized: usize,
    pub edges: usize,
    pub vcs_system: Option<VcsSystem>,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub unsaved_changes: bool,
}

pub struct CatalogService {
    store: CatalogStore,
    repository: Box<dyn ItemRepository>,
    backend: Box<dyn StatusBackend>,
    project_root: PathBuf,
    engine: FilterEngine,
}

impl CatalogService {
    pub fn new(
        store: CatalogStore,
        repository: Box<dyn ItemRepository>,
        backend: Box<dyn StatusBackend>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            repository,
            backend,
            project_root: project_root.into(),
            engine: FilterEngine::new(),
        }
    }

    /// Wire up the filesystem repository, the configured status backend, and
    /// the catalog at its configured location (created if absent).
    pub fn open(config: &AssetdexConfig, project_root: &Path) -> Result<Self, ApiError> {
        let project_root = dunce::canonicalize(project_root).map_err(|e| {
            ApiError::ConfigError(format!(
                "Project root {} is not accessible: {}",
                project_root.display(),
                e
            ))
        })?;
        let repository = FsRepository::new(&project_root, &config.project.corpus_root)
            .with_ignored_names(config.project.ignored_names.clone())
            .with_max_reference_scan_bytes(config.index.max_reference_scan_bytes);
        let backend: Box<dyn StatusBackend> = if config.vcs.enabled {
            Box::new(GitBackend::new(config.vcs.executable.clone(), config.vcs.timeout()))
        } else {
            Box::new(NoBackend)
        };
        let catalog_path = config.storage.resolve_path(&project_root)?;
        let store = CatalogStore::open(&catalog_path)?;
        info!(
            project = %project_root.display(),
            corpus = %config.project.corpus_root,
            catalog = %catalog_path.display(),
            "Catalog service ready"
        );
        Ok(Self::new(store, Box::new(repository), backend, project_root))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn records(&self) -> &[MetadataRecord] {
        self.store.records()
    }

    pub fn get(&self, id: &str) -> Option<&MetadataRecord> {
        self.store.get(id)
    }

    pub fn reindex(&mut self, scope: &IndexScope) -> Result<IndexReport, ApiError> {
        let indexer = Indexer::new(self.repository.as_ref(), self.backend.as_ref(), &self.project_root);
        indexer.reindex(&mut self.store, scope)
    }

    /// Forced re-derivation of `ids` (the "reimport visible" batch).
    pub fn refresh(&mut self, ids: &[ItemId]) -> Result<IndexReport, ApiError> {
        let indexer = Indexer::new(self.repository.as_ref(), self.backend.as_ref(), &self.project_root);
        indexer.refresh(&mut self.store, ids)
    }

    pub fn filter(&mut self, query: &FilterQuery) -> Vec<&MetadataRecord> {
        self.engine.evaluate(&self.store, query)
    }

    /// Ids of the records matching `query`, in catalog order.
    pub fn filter_ids(&mut self, query: &FilterQuery) -> Vec<ItemId> {
        self.filter(query).into_iter().map(|r| r.id.clone()).collect()
    }

    /// Edit one user field in memory. Call `save` to persist.
    pub fn set_user_field(&mut self, id: &str, field: UserField, value: Option<&str>) -> Result<(), ApiError> {
        self.store.set_user_field(id, field, value)
    }

    /// Replace the tag set from comma-separated text, e.g. `"Hero, boss"`.
    pub fn set_tags_from_text(&mut self, id: &str, text: &str) -> Result<TagSet, ApiError> {
        let tags = TagSet::parse_list(text);
        let applied = tags.clone();
        self.store
            .with_record_mut(id, move |record| record.tags = tags)
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
        Ok(applied)
    }

    /// Rename an item through the repository. On failure nothing in the
    /// catalog changes; on success name and path are updated and saved.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<String, ApiError> {
        let path = self
            .store
            .get(id)
            .map(|record| record.path.clone())
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;

        let new_path = match self.repository.rename(&path, new_name) {
            Ok(new_path) => new_path,
            Err(e) => {
                warn!(id, path = %path, error = %e, "Rename rejected");
                return Err(e.into());
            }
        };

        let stored_path = new_path.clone();
        self.store.with_record_mut(id, move |record| {
            record.name = file_stem_of(&stored_path);
            record.path = stored_path;
        });
        self.store.save()?;
        info!(id, from = %path, to = %new_path, "Item renamed");
        Ok(new_path)
    }

    /// Apply `op` to `ids` and persist once.
    pub fn apply_batch(&mut self, ids: &[ItemId], op: &BatchOp) -> Result<BatchReport, ApiError> {
        let report = batch::apply(&mut self.store, ids, op);
        if report.changed > 0 {
            self.store.save()?;
        }
        info!(op = %op, targeted = report.targeted, changed = report.changed, "Batch complete");
        Ok(report)
    }

    /// Apply `op` to every record matching `query` and persist once.
    pub fn apply_batch_to_filter(&mut self, query: &FilterQuery, op: &BatchOp) -> Result<BatchReport, ApiError> {
        let ids = self.filter_ids(query);
        self.apply_batch(&ids, op)
    }

    pub fn save(&mut self) -> Result<(), ApiError> {
        Ok(self.store.save()?)
    }

    pub fn export_json(&self) -> Result<String, ApiError> {
        Ok(self.store.export_json()?)
    }

    /// Replace the catalog with an exported JSON array and persist. Edges and
    /// status are rebuilt against the repository before saving; user fields
    /// come from the import.
    pub fn import_json(&mut self, json: &str) -> Result<usize, ApiError> {
        let count = self.store.import_json(json)?;
        let mut records = self.store.records().to_vec();
        let graph = rebuild_graph(&mut records, self.repository.as_ref());
        let vcs = classify(
            &mut records,
            &self.project_root,
            self.repository.corpus_root(),
            self.backend.as_ref(),
        );
        self.store.replace_all(records)?;
        self.store.save()?;
        info!(records = count, edges = graph.edges, vcs = ?vcs, "Catalog imported");
        Ok(count)
    }

    pub fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary {
            unsaved_changes: self.store.is_dirty(),
            ..StatusSummary::default()
        };
        for record in self.store.records() {
            summary.total += 1;
            summary.total_bytes += record.size_bytes;
            summary.edges += record.direct_dependencies.len();
            if record.tags.is_empty() {
                summary.untagged += 1;
            }
            if record.category.is_none() {
                summary.uncategorized += 1;
            }
            if record.vcs_system != VcsSystem::None {
                summary.vcs_system = Some(record.vcs_system);
            }
            *summary
                .by_status
                .entry(record.vcs_status.as_str().to_string())
                .or_default() += 1;
            *summary.by_type.entry(record.type_tag.clone()).or_default() += 1;
        }
        summary
    }

    /// Records with a pending working-tree change.
    pub fn changed_records(&self) -> Vec<&MetadataRecord> {
        self.store
            .records()
            .iter()
            .filter(|r| !matches!(r.vcs_status, VcsStatus::UpToDate | VcsStatus::Unknown))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use crate::vcs::FixedBackend;

    fn service(repo: MemoryRepository) -> CatalogService {
        let store = CatalogStore::temporary().unwrap();
        CatalogService::new(store, Box::new(repo), Box::new(NoBackend), ".")
    }

    fn corpus() -> MemoryRepository {
        MemoryRepository::new("Assets")
            .with_item("a", "Assets/Chars/knight.prefab", "GameObject")
            .with_item("b", "Assets/Art/knight.png", "Texture2D")
            .with_references("a", &["Assets/Art/knight.png"])
    }

    #[test]
    fn test_rename_failure_does_not_mutate() {
        let mut svc = service(corpus().with_rename_failure("locked"));
        svc.reindex(&IndexScope::Entire).unwrap();
        let before = svc.get("a").unwrap().clone();
        assert!(svc.rename("a", "paladin").is_err());
        assert_eq!(svc.get("a").unwrap(), &before);
        assert!(!svc.store().is_dirty());
    }

    #[test]
    fn test_rename_updates_name_and_path() {
        let mut svc = service(corpus());
        svc.reindex(&IndexScope::Entire).unwrap();
        let new_path = svc.rename("a", "paladin").unwrap();
        assert_eq!(new_path, "Assets/Chars/paladin.prefab");
        let record = svc.get("a").unwrap();
        assert_eq!(record.name, "paladin");
        assert_eq!(record.path, new_path);
        assert!(!svc.store().is_dirty());
    }

    #[test]
    fn test_rename_unknown_id() {
        let mut svc = service(corpus());
        assert!(matches!(svc.rename("ghost", "x"), Err(ApiError::ItemNotFound(_))));
    }

    #[test]
    fn test_set_tags_from_text() {
        let mut svc = service(corpus());
        svc.reindex(&IndexScope::Entire).unwrap();
        let tags = svc.set_tags_from_text("a", " Hero, ,hero , Boss ").unwrap();
        assert_eq!(tags.joined(), "Hero, Boss");
        assert!(svc.store().is_dirty());
        svc.save().unwrap();
        assert!(!svc.store().is_dirty());
    }

    #[test]
    fn test_batch_over_filter_saves_once() {
        let mut svc = service(corpus());
        svc.reindex(&IndexScope::Entire).unwrap();
        let query = FilterQuery::default().text("knight");
        let report = svc.apply_batch_to_filter(&query, &BatchOp::SetCategory("Knights".into())).unwrap();
        assert_eq!(report.changed, 2);
        assert!(!svc.store().is_dirty());
        assert_eq!(svc.filter(&FilterQuery::default().text("knight")).len(), 2);
    }

    #[test]
    fn test_status_summary() {
        let store = CatalogStore::temporary().unwrap();
        let backend = FixedBackend::with_lines([" M Assets/Art/knight.png"]);
        let mut svc = CatalogService::new(store, Box::new(corpus()), Box::new(backend), ".");
        svc.reindex(&IndexScope::Entire).unwrap();
        let summary = svc.status_summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.edges, 1);
        assert_eq!(summary.vcs_system, Some(VcsSystem::Git));
        assert_eq!(summary.by_status.get("modified"), Some(&1));
        assert_eq!(summary.by_status.get("up to date"), Some(&1));
        assert_eq!(svc.changed_records().len(), 1);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut svc = service(corpus());
        svc.reindex(&IndexScope::Entire).unwrap();
        svc.set_user_field("b", UserField::CustomField1, Some("sam")).unwrap();
        let json = svc.export_json().unwrap();

        let mut other = service(MemoryRepository::new("Assets"));
        assert_eq!(other.import_json(&json).unwrap(), 2);
        assert_eq!(other.get("b").unwrap().custom_field_1.as_deref(), Some("sam"));
    }

    #[test]
    fn test_import_rebuilds_graph_from_repository() {
        let mut a = MetadataRecord::new("a", "Assets/Chars/knight.prefab");
        a.direct_dependencies = ["a".to_string(), "b".to_string()].into_iter().collect();
        a.tags = TagSet::parse_list("Hero");
        let b = MetadataRecord::new("b", "Assets/Art/knight.png");
        let json = serde_json::to_string(&vec![a, b]).unwrap();

        let mut svc = service(corpus());
        assert_eq!(svc.import_json(&json).unwrap(), 2);
        let a = svc.get("a").unwrap();
        let b = svc.get("b").unwrap();
        assert_eq!(a.direct_dependencies.iter().collect::<Vec<_>>(), vec!["b"]);
        assert!(!a.direct_dependencies.contains("a"));
        assert_eq!(b.direct_dependants.iter().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(a.tags.joined(), "Hero");
        assert_eq!(a.vcs_status, VcsStatus::Unknown);
        assert!(!svc.store().is_dirty());
    }
}

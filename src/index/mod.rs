//! Indexer
//!
//! One pass: snapshot the old catalog, enumerate the scope through the item
//! repository, derive fresh records, carry user fields forward, rebuild the
//! dependency graph, classify version-control status, then replace and persist
//! the record set. The store is untouched until the new set is complete.

pub mod merge;

use crate::catalog::{CatalogStore, MetadataRecord};
use crate::error::ApiError;
use crate::graph::{rebuild_graph, GraphReport};
use crate::repository::kinds::{audio_type_tag, is_audio_extension};
use crate::repository::{ItemEntry, ItemRepository};
use crate::types::{extension_of, is_within, normalize_logical_path, ItemId};
use crate::vcs::{classify, ClassifyOutcome, StatusBackend};
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use merge::{merge, snapshot};

/// What a pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexScope {
    Entire,
    SubRoots(Vec<String>),
}

impl IndexScope {
    pub fn sub_roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexScope::SubRoots(roots.into_iter().map(Into::into).collect())
    }
}

/// Summary of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    /// Roots actually enumerated. Empty for a refresh.
    pub scope_roots: Vec<String>,
    /// True when a scoped pass fell back to the corpus root.
    pub fell_back: bool,
    pub added: usize,
    pub kept: usize,
    pub dropped: usize,
    /// Out-of-scope records carried over untouched.
    pub carried: usize,
    /// Fields that degraded to zero because a read failed.
    pub degraded: usize,
    pub graph: GraphReport,
    pub vcs: ClassifyOutcome,
    pub elapsed_ms: u64,
}

impl IndexReport {
    pub fn total(&self) -> usize {
        self.added + self.kept + self.carried
    }

    fn log_summary(&self, operation: &str) {
        info!(
            operation,
            roots = ?self.scope_roots,
            fell_back = self.fell_back,
            added = self.added,
            kept = self.kept,
            dropped = self.dropped,
            carried = self.carried,
            degraded = self.degraded,
            edges = self.graph.edges,
            vcs = ?self.vcs,
            elapsed_ms = self.elapsed_ms,
            "Index pass complete"
        );
    }
}

/// Drives index passes against one repository and status backend.
pub struct Indexer<'a> {
    repo: &'a dyn ItemRepository,
    backend: &'a dyn StatusBackend,
    project_root: &'a Path,
}

impl<'a> Indexer<'a> {
    pub fn new(
        repo: &'a dyn ItemRepository,
        backend: &'a dyn StatusBackend,
        project_root: &'a Path,
    ) -> Self {
        Self {
            repo,
            backend,
            project_root,
        }
    }

    /// Roots to enumerate. Invalid sub-roots are discarded; if none remain the
    /// corpus root is used and the flag is set.
    pub fn resolve_scope(&self, scope: &IndexScope) -> (Vec<String>, bool) {
        let corpus_root = self.repo.corpus_root().to_string();
        let requested = match scope {
            IndexScope::Entire => return (vec![corpus_root], false),
            IndexScope::SubRoots(roots) => roots,
        };

        let mut valid: Vec<String> = Vec::new();
        for root in requested {
            let root = normalize_logical_path(root);
            if root.is_empty() || !is_within(&root, &corpus_root) || !self.repo.is_container(&root) {
                debug!(root = %root, "Discarding invalid scope root");
                continue;
            }
            if !valid.contains(&root) {
                valid.push(root);
            }
        }
        // Nested roots are covered by their ancestors.
        let covered: Vec<String> = valid
            .iter()
            .filter(|root| {
                !valid
                    .iter()
                    .any(|other| other != *root && is_within(root, other))
            })
            .cloned()
            .collect();

        if covered.is_empty() {
            info!(requested = ?requested, "No valid scope roots; indexing the entire corpus");
            return (vec![corpus_root], true);
        }
        (covered, false)
    }

    /// Re-index `scope` into `store` and persist.
    ///
    /// Only an enumeration failure is returned as an error, and it leaves the
    /// store untouched.
    pub fn reindex(&self, store: &mut CatalogStore, scope: &IndexScope) -> Result<IndexReport, ApiError> {
        let started = Instant::now();
        let old = snapshot(store.records());
        let (roots, fell_back) = self.resolve_scope(scope);
        let partial = matches!(scope, IndexScope::SubRoots(_)) && !fell_back;

        let entries = self.repo.enumerate_items(&roots)?;

        let mut degraded = 0;
        let fresh: Vec<MetadataRecord> = entries
            .iter()
            .map(|entry| self.derive(entry, &mut degraded))
            .collect();
        let added = fresh.iter().filter(|r| !old.contains_key(&r.id)).count();
        let kept = fresh.len() - added;
        let fresh_ids: HashSet<&str> = fresh.iter().map(|r| r.id.as_str()).collect();

        let mut carried = Vec::new();
        let mut dropped = 0;
        let under = |path: &str| roots.iter().any(|root| is_within(path, root));
        for record in store.records() {
            if fresh_ids.contains(record.id.as_str()) {
                continue;
            }
            if partial && !under(&record.path) {
                carried.push(record.clone());
                continue;
            }
            match self.repo.id_to_path(&record.id) {
                // Moved out of the scope: carried, but at its current location.
                Some(current) if partial && !under(&current) => {
                    debug!(id = %record.id, from = %record.path, to = %current, "Carrying moved record");
                    let mut moved = self.derive(&ItemEntry::new(record.id.clone(), current), &mut degraded);
                    moved.carry_user_fields(record);
                    carried.push(moved);
                }
                _ => {
                    debug!(id = %record.id, path = %record.path, "Dropping vanished record");
                    dropped += 1;
                }
            }
        }

        let carried_count = carried.len();
        let mut records = merge(&old, fresh);
        records.extend(carried);
        records.sort_by(|a, b| a.path.cmp(&b.path));

        let graph = rebuild_graph(&mut records, self.repo);
        let vcs = classify(&mut records, self.project_root, self.repo.corpus_root(), self.backend);

        store.replace_all(records)?;
        store.save()?;

        let report = IndexReport {
            scope_roots: roots,
            fell_back,
            added,
            kept,
            dropped,
            carried: carried_count,
            degraded,
            graph,
            vcs,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        report.log_summary("reindex");
        Ok(report)
    }

    /// Re-derive an explicit subset of records, then rebuild the graph and
    /// status over the whole set and persist once. Unknown ids are skipped.
    pub fn refresh(&self, store: &mut CatalogStore, ids: &[ItemId]) -> Result<IndexReport, ApiError> {
        let started = Instant::now();
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut records = store.records().to_vec();

        let mut degraded = 0;
        let mut refreshed = 0;
        for record in records.iter_mut() {
            if !wanted.contains(record.id.as_str()) {
                continue;
            }
            let Some(path) = self.repo.id_to_path(&record.id) else {
                warn!(id = %record.id, path = %record.path, "Item no longer resolves; left as is");
                continue;
            };
            let mut fresh = self.derive(&ItemEntry::new(record.id.clone(), path), &mut degraded);
            fresh.carry_user_fields(record);
            *record = fresh;
            refreshed += 1;
        }

        let graph = rebuild_graph(&mut records, self.repo);
        let vcs = classify(&mut records, self.project_root, self.repo.corpus_root(), self.backend);

        store.replace_all(records)?;
        store.save()?;

        let report = IndexReport {
            scope_roots: Vec::new(),
            fell_back: false,
            added: 0,
            kept: refreshed,
            dropped: 0,
            carried: 0,
            degraded,
            graph,
            vcs,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        report.log_summary("refresh");
        Ok(report)
    }

    /// Derive every repository-owned field of one item. Read failures degrade
    /// the field to zero and are counted.
    fn derive(&self, entry: &ItemEntry, degraded: &mut usize) -> MetadataRecord {
        let path = entry.path.as_str();
        let ext = extension_of(path);
        let mut record = MetadataRecord::new(entry.id.clone(), path);
        let facts = self.repo.load_facts(path);

        if is_audio_extension(&ext) {
            record.type_tag = audio_type_tag(&ext);
            record.audio_duration_seconds = match self.repo.audio_duration(path) {
                Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds,
                Ok(_) => 0.0,
                Err(e) => {
                    debug!(path, error = %e, "Audio duration unavailable");
                    *degraded += 1;
                    0.0
                }
            };
        } else {
            record.type_tag = match &facts {
                Ok(facts) => facts.type_name.clone().unwrap_or_else(|| ext.clone()),
                Err(_) => ext.clone(),
            };
        }

        if let Some(name) = facts
            .ok()
            .and_then(|facts| facts.display_name)
            .filter(|name| !name.is_empty())
        {
            record.name = name;
        }

        record.size_bytes = match self.repo.size_of(path) {
            Ok(size) => size,
            Err(e) => {
                debug!(path, error = %e, "Size unavailable");
                *degraded += 1;
                0
            }
        };
        record.last_indexed = Utc::now();
        record
    }
}

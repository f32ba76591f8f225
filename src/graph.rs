//! Dependency Graph Builder
//!
//! Rebuilds one-hop adjacency over a record set. Forward edges are computed in
//! full first; dependants are then derived as the transpose of that snapshot,
//! so the two sides are symmetric by construction.

use crate::catalog::MetadataRecord;
use crate::repository::ItemRepository;
use crate::types::{is_within, normalize_logical_path, ItemId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Forward adjacency: item → items it references.
pub type Adjacency = BTreeMap<ItemId, BTreeSet<ItemId>>;

/// Counts from one rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphReport {
    pub edges: usize,
    /// References dropped as unresolved, out of scope, or self-referencing.
    pub dropped: usize,
    /// Items whose references could not be read.
    pub failed: usize,
}

/// Recompute `direct_dependencies` and `direct_dependants` for every record.
///
/// Operates only on `records`: a reference to anything outside the set is
/// dropped. Per-item read failures yield an empty forward set for that item.
pub fn rebuild_graph(records: &mut [MetadataRecord], repo: &dyn ItemRepository) -> GraphReport {
    let mut report = GraphReport::default();
    let mut forward = forward_edges(records, repo, &mut report);
    let mut reverse = derive_dependants(&forward);

    for record in records.iter_mut() {
        record.direct_dependencies = forward.remove(&record.id).unwrap_or_default();
        record.direct_dependants = reverse.remove(&record.id).unwrap_or_default();
        report.edges += record.direct_dependencies.len();
    }

    debug!(
        records = records.len(),
        edges = report.edges,
        dropped = report.dropped,
        failed = report.failed,
        "Dependency graph rebuilt"
    );
    report
}

fn forward_edges(
    records: &[MetadataRecord],
    repo: &dyn ItemRepository,
    report: &mut GraphReport,
) -> Adjacency {
    let corpus_root = repo.corpus_root();
    let ids: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let by_path: HashMap<String, &str> = records
        .iter()
        .map(|r| (normalize_logical_path(&r.path), r.id.as_str()))
        .collect();

    let mut forward = Adjacency::new();
    for record in records {
        let references = match repo.direct_references(&record.path) {
            Ok(references) => references,
            Err(e) => {
                warn!(id = %record.id, path = %record.path, error = %e, "Could not read references");
                report.failed += 1;
                Vec::new()
            }
        };

        let mut targets = BTreeSet::new();
        for reference in references {
            let reference = normalize_logical_path(&reference);
            if !is_within(&reference, corpus_root) {
                report.dropped += 1;
                continue;
            }
            let target = match by_path.get(&reference) {
                Some(id) => Some(id.to_string()),
                None => repo
                    .path_to_id(&reference)
                    .filter(|id| ids.contains(id.as_str())),
            };
            match target {
                Some(target) if target != record.id => {
                    targets.insert(target);
                }
                _ => report.dropped += 1,
            }
        }
        forward.insert(record.id.clone(), targets);
    }
    forward
}

/// Transpose of `forward`: for every edge `a → b`, `b → {a, ..}`.
pub fn derive_dependants(forward: &Adjacency) -> Adjacency {
    let mut reverse = Adjacency::new();
    for (source, targets) in forward {
        for target in targets {
            if target != source {
                reverse
                    .entry(target.clone())
                    .or_default()
                    .insert(source.clone());
            }
        }
    }
    reverse
}

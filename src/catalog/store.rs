//! Catalog Store
//!
//! In-memory record set backed by a sled database. Records are kept in index
//! order; the order is persisted alongside the records so filtering stays
//! stable across sessions. Persistence only happens on an explicit `save`.

use crate::catalog::record::{MetadataRecord, UserField};
use crate::error::{ApiError, StorageError};
use crate::graph::{derive_dependants, Adjacency};
use crate::types::ItemId;
use sled::transaction::TransactionResult;
use sled::Transactional;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

const RECORDS_TREE: &str = "records";
const META_TREE: &str = "meta";
const ORDER_KEY: &[u8] = b"order";
const SCHEMA_KEY: &[u8] = b"schema_version";

/// Version of the persisted record layout.
pub const SCHEMA_VERSION: u32 = 1;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Owned catalog: load, mutate, then explicitly persist.
pub struct CatalogStore {
    db: sled::Db,
    records_tree: sled::Tree,
    meta_tree: sled::Tree,
    location: Option<PathBuf>,
    records: Vec<MetadataRecord>,
    positions: HashMap<ItemId, usize>,
    instance: u64,
    generation: u64,
    dirty: bool,
}

impl CatalogStore {
    /// Open the catalog at `path`, creating an empty one if absent.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path)?;
        let mut store = Self::from_db(db)?;
        store.location = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            records = store.records.len(),
            "Catalog opened"
        );
        Ok(store)
    }

    /// Open a throwaway catalog that is removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let records_tree = db.open_tree(RECORDS_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;
        let records = load_records(&records_tree, &meta_tree)?;
        let positions = position_index(&records)?;
        Ok(Self {
            db,
            records_tree,
            meta_tree,
            location: None,
            records,
            positions,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            dirty: false,
        })
    }

    /// Filesystem location of the catalog, if it is not temporary.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MetadataRecord> {
        self.positions.get(id).map(|&i| &self.records[i])
    }

    /// Token unique to this open store within the process.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Monotonic counter bumped on every in-memory mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when there are mutations that have not been saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the whole record set. Ids must be unique.
    pub fn replace_all(&mut self, records: Vec<MetadataRecord>) -> Result<(), StorageError> {
        let positions = position_index(&records)?;
        self.records = records;
        self.positions = positions;
        self.touch();
        Ok(())
    }

    /// Set a user-editable field on one record. Does not persist.
    pub fn set_user_field(
        &mut self,
        id: &str,
        field: UserField,
        value: Option<&str>,
    ) -> Result<(), ApiError> {
        self.with_record_mut(id, |record| record.set_user_field(field, value))
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))
    }

    /// Run `edit` against one record and mark the store modified.
    pub(crate) fn with_record_mut<R>(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut MetadataRecord) -> R,
    ) -> Option<R> {
        let index = *self.positions.get(id)?;
        let result = edit(&mut self.records[index]);
        self.touch();
        Some(result)
    }

    /// Apply `edit` to every listed record that exists; returns how many were
    /// visited. Unknown ids are skipped.
    pub(crate) fn update_each(
        &mut self,
        ids: &[ItemId],
        mut edit: impl FnMut(&mut MetadataRecord) -> bool,
    ) -> usize {
        let mut changed = 0;
        for id in ids {
            if let Some(&index) = self.positions.get(id) {
                if edit(&mut self.records[index]) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.dirty = true;
    }

    /// Persist the current record set in a single transaction.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let mut encoded: Vec<(&str, Vec<u8>)> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            encoded.push((record.id.as_str(), serde_json::to_vec(record)?));
        }
        let order: Vec<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        let order_bytes = serde_json::to_vec(&order)?;
        let schema_bytes = SCHEMA_VERSION.to_be_bytes();

        let live: HashSet<&[u8]> = order.iter().map(|id| id.as_bytes()).collect();
        let mut stale: Vec<sled::IVec> = Vec::new();
        for key in self.records_tree.iter().keys() {
            let key = key?;
            if !live.contains(&key[..]) {
                stale.push(key);
            }
        }

        let outcome: TransactionResult<(), ()> =
            (&self.records_tree, &self.meta_tree).transaction(|(records, meta)| {
                for key in &stale {
                    records.remove(&key[..])?;
                }
                for (id, bytes) in &encoded {
                    records.insert(id.as_bytes(), bytes.as_slice())?;
                }
                meta.insert(ORDER_KEY, order_bytes.as_slice())?;
                meta.insert(SCHEMA_KEY, &schema_bytes[..])?;
                Ok(())
            });
        outcome.map_err(|e| StorageError::Transaction(format!("{:?}", e)))?;
        self.db.flush()?;
        self.dirty = false;

        debug!(
            records = self.records.len(),
            removed = stale.len(),
            "Catalog saved"
        );
        Ok(())
    }

    /// Serialize every record as a JSON array.
    pub fn export_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Replace the record set with a JSON array produced by `export_json`.
    /// Duplicate ids resolve last-write-wins. Self edges and edges to unknown
    /// ids are dropped and dependants are rederived from dependencies. Does
    /// not persist.
    pub fn import_json(&mut self, json: &str) -> Result<usize, StorageError> {
        let incoming: Vec<MetadataRecord> = serde_json::from_str(json)?;
        let mut records = dedup_last_wins(incoming);
        let repaired = restore_edge_invariants(&mut records);
        if repaired > 0 {
            info!(repaired, "Imported dependency edges repaired");
        }
        let count = records.len();
        self.replace_all(records)?;
        Ok(count)
    }
}

fn load_records(
    records_tree: &sled::Tree,
    meta_tree: &sled::Tree,
) -> Result<Vec<MetadataRecord>, StorageError> {
    let order: Vec<ItemId> = match meta_tree.get(ORDER_KEY)? {
        Some(bytes) => serde_json::from_slice(&bytes)?,
        None => Vec::new(),
    };

    let mut by_id: BTreeMap<ItemId, MetadataRecord> = BTreeMap::new();
    for entry in records_tree.iter() {
        let (_key, value) = entry?;
        let record: MetadataRecord = serde_json::from_slice(&value)?;
        by_id.insert(record.id.clone(), record);
    }

    let mut records = Vec::with_capacity(by_id.len());
    for id in order {
        if let Some(record) = by_id.remove(&id) {
            records.push(record);
        }
    }
    // Records missing from the order list (older catalogs) go last, by id.
    records.extend(by_id.into_values());
    Ok(records)
}

fn position_index(records: &[MetadataRecord]) -> Result<HashMap<ItemId, usize>, StorageError> {
    let mut positions = HashMap::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        if positions.insert(record.id.clone(), index).is_some() {
            return Err(StorageError::DuplicateId(record.id.clone()));
        }
    }
    Ok(positions)
}

/// Keep the last record seen for each id, at the position of its first occurrence.
pub(crate) fn dedup_last_wins(records: Vec<MetadataRecord>) -> Vec<MetadataRecord> {
    let mut slots: HashMap<ItemId, usize> = HashMap::new();
    let mut out: Vec<MetadataRecord> = Vec::with_capacity(records.len());
    for record in records {
        match slots.get(&record.id) {
            Some(&slot) => out[slot] = record,
            None => {
                slots.insert(record.id.clone(), out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Make `direct_dependants` the transpose of `direct_dependencies`, with no
/// self edges and no edges leaving the set. Returns the number of records
/// whose edges changed.
pub(crate) fn restore_edge_invariants(records: &mut [MetadataRecord]) -> usize {
    let ids: HashSet<ItemId> = records.iter().map(|r| r.id.clone()).collect();
    let mut forward = Adjacency::new();
    for record in records.iter() {
        let targets = record
            .direct_dependencies
            .iter()
            .filter(|target| **target != record.id && ids.contains(*target))
            .cloned()
            .collect();
        forward.insert(record.id.clone(), targets);
    }
    let mut reverse = derive_dependants(&forward);

    let mut changed = 0;
    for record in records.iter_mut() {
        let dependencies = forward.remove(&record.id).unwrap_or_default();
        let dependants = reverse.remove(&record.id).unwrap_or_default();
        if record.direct_dependencies != dependencies || record.direct_dependants != dependants {
            record.direct_dependencies = dependencies;
            record.direct_dependants = dependants;
            changed += 1;
        }
    }
    changed
}

//! Merge of freshly derived records with the previous catalog.

use crate::catalog::MetadataRecord;
use crate::types::ItemId;
use std::collections::HashMap;

/// Snapshot keyed by id. Later duplicates replace earlier ones.
pub fn snapshot(records: &[MetadataRecord]) -> HashMap<ItemId, MetadataRecord> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        map.insert(record.id.clone(), record.clone());
    }
    map
}

/// Carry user-editable fields forward from `old` onto every fresh record with a
/// matching id. Fresh records without a prior keep empty user fields. Records in
/// `old` that are absent from `fresh` are not returned.
pub fn merge(old: &HashMap<ItemId, MetadataRecord>, fresh: Vec<MetadataRecord>) -> Vec<MetadataRecord> {
    fresh
        .into_iter()
        .map(|mut record| {
            if let Some(prior) = old.get(&record.id) {
                record.carry_user_fields(prior);
            }
            record
        })
        .collect()
}

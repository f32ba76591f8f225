//! Bulk edits of user-curated fields over a set of records.

use crate::catalog::{CatalogStore, MetadataRecord};
use crate::types::ItemId;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// One edit applied to every targeted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    AddTag(String),
    RemoveTag(String),
    ClearTags,
    SetCategory(String),
    /// `None` or blank clears the field.
    SetCustomField1(Option<String>),
    SetCustomField2(Option<String>),
}

impl BatchOp {
    /// Ops whose value is required but blank do nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            BatchOp::AddTag(value) | BatchOp::RemoveTag(value) | BatchOp::SetCategory(value) => {
                value.trim().is_empty()
            }
            _ => false,
        }
    }

    /// Apply to one record; true when the record changed.
    fn apply_to(&self, record: &mut MetadataRecord) -> bool {
        match self {
            BatchOp::AddTag(tag) => record.tags.insert(tag),
            BatchOp::RemoveTag(tag) => record.tags.remove(tag),
            BatchOp::ClearTags => {
                let had_tags = !record.tags.is_empty();
                record.tags.clear();
                had_tags
            }
            BatchOp::SetCategory(category) => set_text(&mut record.category, Some(category)),
            BatchOp::SetCustomField1(value) => set_text(&mut record.custom_field_1, value.as_ref()),
            BatchOp::SetCustomField2(value) => set_text(&mut record.custom_field_2, value.as_ref()),
        }
    }
}

fn set_text(slot: &mut Option<String>, value: Option<&String>) -> bool {
    let value = value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::AddTag(tag) => write!(f, "add tag '{}'", tag),
            BatchOp::RemoveTag(tag) => write!(f, "remove tag '{}'", tag),
            BatchOp::ClearTags => write!(f, "clear tags"),
            BatchOp::SetCategory(category) => write!(f, "set category '{}'", category),
            BatchOp::SetCustomField1(value) => write!(f, "set custom field 1 to {:?}", value),
            BatchOp::SetCustomField2(value) => write!(f, "set custom field 2 to {:?}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub targeted: usize,
    pub changed: usize,
    pub skipped: bool,
}

/// Apply `op` to every id in `ids` that exists in `store`. Does not persist.
pub fn apply(store: &mut CatalogStore, ids: &[ItemId], op: &BatchOp) -> BatchReport {
    if op.is_noop() {
        debug!(op = %op, "Blank batch value; nothing to do");
        return BatchReport {
            targeted: ids.len(),
            changed: 0,
            skipped: true,
        };
    }
    let changed = store.update_each(ids, |record| op.apply_to(record));
    debug!(op = %op, targeted = ids.len(), changed, "Batch applied");
    BatchReport {
        targeted: ids.len(),
        changed,
        skipped: false,
    }
}

//! Metadata records: one per content item.

use crate::catalog::tags::TagSet;
use crate::types::ItemId;
use crate::vcs::{VcsStatus, VcsSystem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Display label of the first custom field.
pub const CUSTOM_FIELD_1_LABEL: &str = "Designer";

/// Display label of the second custom field.
pub const CUSTOM_FIELD_2_LABEL: &str = "Notes";

/// Catalog entry for a single content item.
///
/// Field names are part of the persisted schema; renaming one is a breaking change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: ItemId,
    pub path: String,
    pub name: String,
    pub type_tag: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub audio_duration_seconds: f64,

    // User-curated
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub custom_field_1: Option<String>,
    #[serde(default)]
    pub custom_field_2: Option<String>,

    // Derived adjacency; only the graph builder writes these
    #[serde(default)]
    pub direct_dependencies: BTreeSet<ItemId>,
    #[serde(default)]
    pub direct_dependants: BTreeSet<ItemId>,

    #[serde(default)]
    pub vcs_system: VcsSystem,
    #[serde(default)]
    pub vcs_status: VcsStatus,

    pub last_indexed: DateTime<Utc>,
}

impl MetadataRecord {
    /// A freshly derived record with no user data, edges, or status.
    pub fn new(id: impl Into<ItemId>, path: impl Into<String>) -> Self {
        let path = path.into();
        let name = crate::types::file_stem_of(&path);
        Self {
            id: id.into(),
            path,
            name,
            type_tag: String::new(),
            size_bytes: 0,
            audio_duration_seconds: 0.0,
            tags: TagSet::new(),
            category: None,
            custom_field_1: None,
            custom_field_2: None,
            direct_dependencies: BTreeSet::new(),
            direct_dependants: BTreeSet::new(),
            vcs_system: VcsSystem::None,
            vcs_status: VcsStatus::Unknown,
            last_indexed: Utc::now(),
        }
    }

    /// Copy every user-editable field from `prior`.
    pub fn carry_user_fields(&mut self, prior: &MetadataRecord) {
        self.tags = prior.tags.clone();
        self.category = prior.category.clone();
        self.custom_field_1 = prior.custom_field_1.clone();
        self.custom_field_2 = prior.custom_field_2.clone();
    }

    pub fn user_field(&self, field: UserField) -> Option<String> {
        match field {
            UserField::Tags => {
                if self.tags.is_empty() {
                    None
                } else {
                    Some(self.tags.joined())
                }
            }
            UserField::Category => self.category.clone(),
            UserField::CustomField1 => self.custom_field_1.clone(),
            UserField::CustomField2 => self.custom_field_2.clone(),
        }
    }

    /// Write a user-editable field. Blank values clear the field.
    pub fn set_user_field(&mut self, field: UserField, value: Option<&str>) {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match field {
            UserField::Tags => {
                self.tags = value.map(TagSet::parse_list).unwrap_or_default();
            }
            UserField::Category => self.category = value.map(str::to_string),
            UserField::CustomField1 => self.custom_field_1 = value.map(str::to_string),
            UserField::CustomField2 => self.custom_field_2 = value.map(str::to_string),
        }
    }
}

/// Fields the presentation layer may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Tags,
    Category,
    CustomField1,
    CustomField2,
}

impl UserField {
    pub fn label(&self) -> &'static str {
        match self {
            UserField::Tags => "Tags",
            UserField::Category => "Category",
            UserField::CustomField1 => CUSTOM_FIELD_1_LABEL,
            UserField::CustomField2 => CUSTOM_FIELD_2_LABEL,
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserField {
    type Err = crate::error::ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tags" | "tag" => Ok(UserField::Tags),
            "category" => Ok(UserField::Category),
            "custom1" | "custom_field_1" | "designer" => Ok(UserField::CustomField1),
            "custom2" | "custom_field_2" | "notes" => Ok(UserField::CustomField2),
            other => Err(crate::error::ApiError::InvalidField(format!(
                "{} (expected tags, category, custom1/designer, custom2/notes)",
                other
            ))),
        }
    }
}

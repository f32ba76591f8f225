//! Tag sets: case preserved for display, case-insensitive for matching and dedup.

use serde::{Deserialize, Serialize};

/// Ordered set of non-empty tags, deduplicated case-insensitively.
///
/// The first spelling of a tag wins; later spellings that differ only in case
/// are ignored. Order is kept for display but is not significant for equality
/// of meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list ("hero, Boss ,hero" -> ["hero", "Boss"]).
    pub fn parse_list(input: &str) -> Self {
        input.split(',').collect()
    }

    /// Insert a tag. Returns false for blank tags and case-insensitive duplicates.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag, matched case-insensitively.
    pub fn remove(&mut self, tag: &str) -> bool {
        let needle = tag.trim().to_lowercase();
        let before = self.tags.len();
        self.tags.retain(|t| t.to_lowercase() != needle);
        self.tags.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        let needle = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    /// True when any tag contains `needle_lower` as a substring.
    /// `needle_lower` must already be lowercased.
    pub fn any_contains(&self, needle_lower: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle_lower))
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Display form: "a, b, c".
    pub fn joined(&self) -> String {
        self.tags.join(", ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(raw: Vec<String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.tags
    }
}

//! Query/Filter Engine
//!
//! Three optional case-insensitive substring predicates combined with AND. The
//! result is a stable subsequence of the input order.

use crate::catalog::{CatalogStore, MetadataRecord};
use crate::types::ItemId;
use serde::{Deserialize, Serialize};

/// A compound filter. Blank predicates are absent; present ones are stored
/// lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterQuery {
    text: Option<String>,
    tag: Option<String>,
    type_tag: Option<String>,
}

fn normalize(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

impl FilterQuery {
    pub fn new(text: Option<&str>, tag: Option<&str>, type_tag: Option<&str>) -> Self {
        Self {
            text: normalize(text),
            tag: normalize(tag),
            type_tag: normalize(type_tag),
        }
    }

    pub fn text(mut self, query: &str) -> Self {
        self.text = normalize(Some(query));
        self
    }

    pub fn tag(mut self, query: &str) -> Self {
        self.tag = normalize(Some(query));
        self
    }

    pub fn type_tag(mut self, query: &str) -> Self {
        self.type_tag = normalize(Some(query));
        self
    }

    /// True when no predicate is present; every record matches.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.tag.is_none() && self.type_tag.is_none()
    }

    pub fn matches(&self, record: &MetadataRecord) -> bool {
        if let Some(text) = &self.text {
            let hit = record.name.to_lowercase().contains(text.as_str())
                || record.path.to_lowercase().contains(text.as_str())
                || record.tags.any_contains(text);
            if !hit {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !record.tags.any_contains(tag) {
                return false;
            }
        }
        if let Some(type_tag) = &self.type_tag {
            if !record.type_tag.to_lowercase().contains(type_tag.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Records of `records` matching `query`, in input order.
pub fn filter<'a, I>(records: I, query: &FilterQuery) -> Vec<&'a MetadataRecord>
where
    I: IntoIterator<Item = &'a MetadataRecord>,
{
    records.into_iter().filter(|r| query.matches(r)).collect()
}

/// Filter with a one-entry cache. The cached result is reused while the store
/// instance, its generation, and the query are all unchanged.
#[derive(Debug, Default)]
pub struct FilterEngine {
    cached: Option<CachedResult>,
    evaluations: usize,
}

#[derive(Debug)]
struct CachedResult {
    store: u64,
    generation: u64,
    len: usize,
    query: FilterQuery,
    ids: Vec<ItemId>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate<'s>(&mut self, store: &'s CatalogStore, query: &FilterQuery) -> Vec<&'s MetadataRecord> {
        let fresh = match &self.cached {
            Some(cached) => {
                cached.store != store.instance()
                    || cached.generation != store.generation()
                    || cached.len != store.len()
                    || &cached.query != query
            }
            None => true,
        };

        if fresh {
            let result = filter(store.records(), query);
            self.evaluations += 1;
            self.cached = Some(CachedResult {
                store: store.instance(),
                generation: store.generation(),
                len: store.len(),
                query: query.clone(),
                ids: result.iter().map(|r| r.id.clone()).collect(),
            });
            return result;
        }

        match &self.cached {
            Some(cached) => cached.ids.iter().filter_map(|id| store.get(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Ids from the last evaluation.
    pub fn last_ids(&self) -> &[ItemId] {
        self.cached.as_ref().map(|c| c.ids.as_slice()).unwrap_or(&[])
    }

    /// Number of times the predicates actually ran.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{TagSet, UserField};
    use proptest::prelude::*;

    fn record(id: &str, path: &str, type_tag: &str, tags: &str) -> MetadataRecord {
        let mut record = MetadataRecord::new(id, path);
        record.type_tag = type_tag.to_string();
        record.tags = TagSet::parse_list(tags);
        record
    }

    fn sample() -> Vec<MetadataRecord> {
        vec![
            record("x", "Assets/Chars/knight.prefab", "GameObject", "Hero"),
            record("y", "Assets/Chars/goblin.prefab", "GameObject", "Enemy, Small"),
            record("z", "Assets/Audio/theme.wav", "WAV", ""),
        ]
    }

    fn ids(result: &[&MetadataRecord]) -> Vec<String> {
        result.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_tag_scenario() {
        let records = sample();
        assert_eq!(ids(&filter(&records, &FilterQuery::default().tag("hero"))), vec!["x"]);
        assert!(filter(&records, &FilterQuery::default().tag("villain")).is_empty());
    }

    #[test]
    fn test_text_matches_name_path_or_tags() {
        let records = sample();
        assert_eq!(ids(&filter(&records, &FilterQuery::default().text("KNIGHT"))), vec!["x"]);
        assert_eq!(ids(&filter(&records, &FilterQuery::default().text("chars/"))), vec!["x", "y"]);
        assert_eq!(ids(&filter(&records, &FilterQuery::default().text("small"))), vec!["y"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let records = sample();
        let query = FilterQuery::new(Some("chars"), Some("enemy"), Some("gameobj"));
        assert_eq!(ids(&filter(&records, &query)), vec!["y"]);
        let query = FilterQuery::new(None, Some("enemy"), Some("wav"));
        assert!(filter(&records, &query).is_empty());
    }

    #[test]
    fn test_blank_predicates_are_absent() {
        let records = sample();
        let query = FilterQuery::new(Some("  "), Some(""), None);
        assert!(query.is_empty());
        assert_eq!(filter(&records, &query).len(), 3);
    }

    #[test]
    fn test_empty_field_never_matches() {
        let records = sample();
        assert!(filter(&records[2..], &FilterQuery::default().tag("a")).is_empty());
    }

    #[test]
    fn test_engine_caches_until_store_changes() {
        let mut store = CatalogStore::temporary().unwrap();
        store.replace_all(sample()).unwrap();
        let mut engine = FilterEngine::new();
        let query = FilterQuery::default().type_tag("gameobject");

        assert_eq!(engine.evaluate(&store, &query).len(), 2);
        assert_eq!(engine.evaluate(&store, &query).len(), 2);
        assert_eq!(engine.evaluations(), 1);

        store.set_user_field("z", UserField::Tags, Some("Hero")).unwrap();
        engine.evaluate(&store, &query);
        assert_eq!(engine.evaluations(), 2);

        let other = FilterQuery::default().tag("hero");
        assert_eq!(engine.evaluate(&store, &other).len(), 2);
        assert_eq!(engine.evaluations(), 3);
        assert_eq!(engine.last_ids(), &["x".to_string(), "z".to_string()]);
    }

    #[test]
    fn test_engine_does_not_reuse_results_across_stores() {
        let mut first = CatalogStore::temporary().unwrap();
        first.replace_all(vec![record("x", "Assets/knight.prefab", "GameObject", "")]).unwrap();
        let mut second = CatalogStore::temporary().unwrap();
        second.replace_all(vec![record("y", "Assets/goblin.prefab", "GameObject", "")]).unwrap();
        assert_eq!(first.generation(), second.generation());
        assert_eq!(first.len(), second.len());

        let mut engine = FilterEngine::new();
        let query = FilterQuery::default().type_tag("gameobject");
        assert_eq!(ids(&engine.evaluate(&first, &query)), vec!["x"]);
        assert_eq!(ids(&engine.evaluate(&second, &query)), vec!["y"]);
        assert_eq!(engine.evaluations(), 2);
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            names in proptest::collection::vec("[a-cA-C]{0,4}", 0..12),
            tags in proptest::collection::vec("[a-cA-C, ]{0,6}", 0..12),
            text in proptest::option::of("[a-c]{0,2}"),
            tag in proptest::option::of("[a-c]{0,2}"),
        ) {
            let records: Vec<MetadataRecord> = names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let tag_list = tags.get(i).map(String::as_str).unwrap_or("");
                    record(&format!("id{}", i), &format!("Assets/{}.asset", name), "ScriptableObject", tag_list)
                })
                .collect();
            let query = FilterQuery::new(text.as_deref(), tag.as_deref(), None);
            let once = filter(&records, &query);
            let twice = filter(once.iter().copied(), &query);
            prop_assert_eq!(ids(&once), ids(&twice));
        }
    }
}

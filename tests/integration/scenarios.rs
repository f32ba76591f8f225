//! Catalog behavior over a scripted in-memory corpus.

use assetdex::batch::BatchOp;
use assetdex::repository::MemoryRepository;
use assetdex::vcs::{FixedBackend, NoBackend, VcsStatus, VcsSystem};
use assetdex::{CatalogService, CatalogStore, FilterQuery, IndexScope, UserField};

fn corpus() -> MemoryRepository {
    MemoryRepository::new("Assets")
        .with_item("a", "Assets/Prefabs/hero.prefab", "GameObject")
        .with_item("b", "Assets/Art/hero_diffuse.png", "Texture2D")
        .with_item("c", "Assets/Art/villain.png", "Texture2D")
        .with_references("a", &["Assets/Art/hero_diffuse.png"])
}

fn service(repo: &MemoryRepository) -> CatalogService {
    CatalogService::new(
        CatalogStore::temporary().unwrap(),
        Box::new(repo.clone()),
        Box::new(NoBackend),
        ".",
    )
}

#[test]
fn test_single_reference_produces_symmetric_edge() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();

    let a = svc.get("a").unwrap();
    let b = svc.get("b").unwrap();
    assert_eq!(a.direct_dependencies.iter().collect::<Vec<_>>(), vec!["b"]);
    assert!(a.direct_dependants.is_empty());
    assert_eq!(b.direct_dependants.iter().collect::<Vec<_>>(), vec!["a"]);
    assert!(b.direct_dependencies.is_empty());
    assert!(svc.get("c").unwrap().direct_dependants.is_empty());
}

#[test]
fn test_tag_filter_hits_and_misses() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();
    svc.set_tags_from_text("a", "Hero").unwrap();

    assert_eq!(svc.filter_ids(&FilterQuery::default().tag("hero")), vec!["a".to_string()]);
    assert!(svc.filter_ids(&FilterQuery::default().tag("villain")).is_empty());
    // Text also matches paths.
    assert_eq!(svc.filter_ids(&FilterQuery::default().text("villain")), vec!["c".to_string()]);
}

#[test]
fn test_empty_query_returns_everything_in_catalog_order() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();
    let all: Vec<String> = svc.records().iter().map(|r| r.id.clone()).collect();
    assert_eq!(svc.filter_ids(&FilterQuery::new(Some("  "), None, Some(""))), all);
}

#[test]
fn test_filters_combine_with_and() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();
    svc.set_tags_from_text("b", "Hero").unwrap();
    svc.set_tags_from_text("a", "Hero").unwrap();

    let query = FilterQuery::default().tag("HERO").type_tag("texture");
    assert_eq!(svc.filter_ids(&query), vec!["b".to_string()]);
}

#[test]
fn test_user_fields_preserved_and_derived_fields_refreshed() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();
    svc.set_tags_from_text("b", "Hero, Skin").unwrap();
    svc.set_user_field("b", UserField::Category, Some("Characters")).unwrap();
    svc.set_user_field("b", UserField::CustomField2, Some("4k source")).unwrap();
    svc.save().unwrap();
    let first = svc.get("b").unwrap().last_indexed;

    std::thread::sleep(std::time::Duration::from_millis(5));
    repo.move_item("b", "Assets/Art/Characters/hero_diffuse.png");
    repo.set_references("a", &["Assets/Art/Characters/hero_diffuse.png"]);
    svc.reindex(&IndexScope::Entire).unwrap();

    let b = svc.get("b").unwrap();
    assert_eq!(b.path, "Assets/Art/Characters/hero_diffuse.png");
    assert_eq!(b.tags.joined(), "Hero, Skin");
    assert_eq!(b.category.as_deref(), Some("Characters"));
    assert_eq!(b.custom_field_2.as_deref(), Some("4k source"));
    assert!(b.last_indexed > first);
    assert!(b.direct_dependants.contains("a"));
}

#[test]
fn test_deleted_item_leaves_no_dangling_edges() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();

    repo.remove("b");
    let report = svc.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.dropped, 1);
    assert!(svc.get("b").is_none());
    assert!(svc.get("a").unwrap().direct_dependencies.is_empty());
    assert_eq!(report.graph.dropped, 1);
}

#[test]
fn test_nonexistent_scope_falls_back_to_corpus() {
    let repo = corpus();
    let mut svc = service(&repo);
    let report = svc
        .reindex(&IndexScope::sub_roots(["Assets/Nope", "Elsewhere/Art"]))
        .unwrap();
    assert!(report.fell_back);
    assert_eq!(report.scope_roots, vec!["Assets".to_string()]);
    assert_eq!(svc.records().len(), 3);
}

#[test]
fn test_enumeration_failure_keeps_prior_catalog() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();
    let before = svc.records().to_vec();

    // Clones share state, so the service's repository now fails too.
    let _ = repo.clone().with_enumeration_failure("disk gone");
    assert!(svc.reindex(&IndexScope::Entire).is_err());
    assert_eq!(svc.records(), before.as_slice());
}

#[test]
fn test_batch_over_filtered_view() {
    let repo = corpus();
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();

    let textures = FilterQuery::default().type_tag("Texture2D");
    let report = svc
        .apply_batch_to_filter(&textures, &BatchOp::AddTag("Art".to_string()))
        .unwrap();
    assert_eq!(report.targeted, 2);
    assert_eq!(report.changed, 2);
    assert!(!svc.store().is_dirty());
    assert_eq!(svc.filter_ids(&FilterQuery::default().tag("art")).len(), 2);

    let report = svc
        .apply_batch(&["a".to_string()], &BatchOp::SetCategory("   ".to_string()))
        .unwrap();
    assert!(report.skipped);
    assert!(svc.get("a").unwrap().category.is_none());
}

#[test]
fn test_refresh_rederives_only_selected_items() {
    let repo = corpus().with_size("b", 10).with_size("c", 10);
    let mut svc = service(&repo);
    svc.reindex(&IndexScope::Entire).unwrap();

    repo.insert("b", "Assets/Art/hero_diffuse.png", Some("Sprite"));
    repo.insert("c", "Assets/Art/villain.png", Some("Sprite"));
    let report = svc.refresh(&["b".to_string(), "ghost".to_string()]).unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(svc.get("b").unwrap().type_tag, "Sprite");
    assert_eq!(svc.get("c").unwrap().type_tag, "Texture2D");
}

#[test]
fn test_status_backend_report_is_applied() {
    let repo = corpus();
    let backend = FixedBackend::with_lines([
        " M Assets/Art/hero_diffuse.png",
        "?? Assets/Prefabs/",
        " M ProjectSettings/Tags.asset",
    ]);
    let mut svc = CatalogService::new(
        CatalogStore::temporary().unwrap(),
        Box::new(repo.clone()),
        Box::new(backend),
        ".",
    );
    svc.reindex(&IndexScope::Entire).unwrap();

    assert_eq!(svc.get("b").unwrap().vcs_status, VcsStatus::Modified);
    assert_eq!(svc.get("a").unwrap().vcs_status, VcsStatus::Untracked);
    assert_eq!(svc.get("c").unwrap().vcs_status, VcsStatus::UpToDate);
    for record in svc.records() {
        assert_eq!(record.vcs_system, VcsSystem::Git);
    }
}

#[test]
fn test_failing_status_backend_does_not_fail_pass() {
    let repo = corpus();
    let mut svc = CatalogService::new(
        CatalogStore::temporary().unwrap(),
        Box::new(repo.clone()),
        Box::new(FixedBackend::failing("fatal: not a git repository")),
        ".",
    );
    svc.reindex(&IndexScope::Entire).unwrap();
    for record in svc.records() {
        assert_eq!(record.vcs_system, VcsSystem::None);
        assert_eq!(record.vcs_status, VcsStatus::Unknown);
    }
}

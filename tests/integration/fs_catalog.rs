//! End-to-end passes over an on-disk project.

use crate::support::{pcm_wav, Project, GUID_HERO, GUID_TEX};
use assetdex::catalog::UserField;
use assetdex::repository::fs::read_guid;
use assetdex::vcs::{VcsStatus, VcsSystem};
use assetdex::{FilterQuery, IndexScope};
use std::fs;

#[test]
fn test_full_pass_derives_records_and_edges() {
    let project = Project::new().with_hero_and_texture();
    project.write("Assets/Audio/theme.wav", b"not really audio", None);
    project.write("Assets/Docs/readme.txt", b"hello world", None);

    let mut service = project.open();
    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.added, 4);
    assert_eq!(report.graph.edges, 1);

    let hero = service.get(GUID_HERO).unwrap();
    assert_eq!(hero.name, "hero");
    assert_eq!(hero.type_tag, "GameObject");
    assert!(hero.direct_dependencies.contains(GUID_TEX));
    assert!(hero.direct_dependants.is_empty());

    let tex = service.get(GUID_TEX).unwrap();
    assert_eq!(tex.type_tag, "Texture2D");
    assert!(tex.direct_dependants.contains(GUID_HERO));
    assert!(tex.direct_dependencies.is_empty());

    let wav = service
        .records()
        .iter()
        .find(|r| r.path == "Assets/Audio/theme.wav")
        .unwrap();
    assert_eq!(wav.type_tag, "WAV");
    assert_eq!(wav.audio_duration_seconds, 0.0);
    assert_eq!(wav.size_bytes, 16);

    let readme = service
        .records()
        .iter()
        .find(|r| r.path == "Assets/Docs/readme.txt")
        .unwrap();
    assert_eq!(readme.type_tag, "TextAsset");
    // A sidecar is created for items that had none.
    let sidecar = project.path("Assets/Docs/readme.txt.meta");
    assert_eq!(read_guid(&sidecar).as_deref(), Some(readme.id.as_str()));

    for record in service.records() {
        assert_eq!(record.vcs_system, VcsSystem::None);
        assert_eq!(record.vcs_status, VcsStatus::Unknown);
    }
}

#[test]
fn test_wav_duration_is_read() {
    let project = Project::new();
    project.write("Assets/Audio/tone.wav", &pcm_wav(2, 8000), None);

    let mut service = project.open();
    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.degraded, 0);

    let tone = &service.records()[0];
    assert_eq!(tone.type_tag, "WAV");
    assert_eq!(tone.size_bytes, 44 + 32_000);
    assert!((tone.audio_duration_seconds - 2.0).abs() < 0.01);
}

#[test]
fn test_user_fields_survive_sessions_and_reindex() {
    let project = Project::new().with_hero_and_texture();
    {
        let mut service = project.open();
        service.reindex(&IndexScope::Entire).unwrap();
        service.set_tags_from_text(GUID_HERO, "Hero, Player").unwrap();
        service.set_user_field(GUID_HERO, UserField::Category, Some("Characters")).unwrap();
        service.set_user_field(GUID_HERO, UserField::CustomField1, Some("sam")).unwrap();
        service.set_user_field(GUID_HERO, UserField::CustomField2, Some("needs LODs")).unwrap();
        service.save().unwrap();
    }

    let mut service = project.open();
    let before = service.get(GUID_HERO).unwrap().clone();
    assert_eq!(before.tags.joined(), "Hero, Player");

    std::thread::sleep(std::time::Duration::from_millis(5));
    service.reindex(&IndexScope::Entire).unwrap();
    let after = service.get(GUID_HERO).unwrap();
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.category, before.category);
    assert_eq!(after.custom_field_1, before.custom_field_1);
    assert_eq!(after.custom_field_2, before.custom_field_2);
    assert!(after.last_indexed > before.last_indexed);
}

#[test]
fn test_deleted_item_disappears_with_its_edges() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();

    project.remove("Assets/Art/hero_diffuse.png");
    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.dropped, 1);
    assert!(service.get(GUID_TEX).is_none());
    for record in service.records() {
        assert!(!record.direct_dependencies.contains(GUID_TEX));
        assert!(!record.direct_dependants.contains(GUID_TEX));
    }
}

#[test]
fn test_moved_item_keeps_identity() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();
    service.set_user_field(GUID_TEX, UserField::Category, Some("Textures")).unwrap();
    service.save().unwrap();

    fs::create_dir_all(project.path("Assets/Textures")).unwrap();
    fs::rename(
        project.path("Assets/Art/hero_diffuse.png"),
        project.path("Assets/Textures/hero_diffuse.png"),
    )
    .unwrap();
    fs::rename(
        project.path("Assets/Art/hero_diffuse.png.meta"),
        project.path("Assets/Textures/hero_diffuse.png.meta"),
    )
    .unwrap();

    service.reindex(&IndexScope::Entire).unwrap();
    let tex = service.get(GUID_TEX).unwrap();
    assert_eq!(tex.path, "Assets/Textures/hero_diffuse.png");
    assert_eq!(tex.category.as_deref(), Some("Textures"));
    assert!(tex.direct_dependants.contains(GUID_HERO));
}

#[test]
fn test_rename_moves_file_and_keeps_identity() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();

    let new_path = service.rename(GUID_HERO, "knight").unwrap();
    assert_eq!(new_path, "Assets/Prefabs/knight.prefab");
    assert!(project.path("Assets/Prefabs/knight.prefab").is_file());
    assert!(project.path("Assets/Prefabs/knight.prefab.meta").is_file());

    service.reindex(&IndexScope::Entire).unwrap();
    let hero = service.get(GUID_HERO).unwrap();
    assert_eq!(hero.name, "knight");
    assert_eq!(service.records().len(), 2);
}

#[test]
fn test_rename_collision_leaves_catalog_unchanged() {
    let project = Project::new().with_hero_and_texture();
    project.write("Assets/Prefabs/villain.prefab", b"GameObject:\n", None);
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();
    let before = service.get(GUID_HERO).unwrap().clone();

    assert!(service.rename(GUID_HERO, "villain").is_err());
    assert_eq!(service.get(GUID_HERO).unwrap(), &before);
    assert!(project.path("Assets/Prefabs/hero.prefab").is_file());
}

#[test]
fn test_nonexistent_scope_indexes_whole_corpus() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    let report = service
        .reindex(&IndexScope::sub_roots(["Assets/DoesNotExist"]))
        .unwrap();
    assert!(report.fell_back);
    assert_eq!(service.records().len(), 2);
}

#[test]
fn test_scoped_pass_only_touches_scope() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();

    project.write("Assets/Art/new.png", b"\x89PNG\r\n\x1a\n", None);
    project.remove("Assets/Prefabs/hero.prefab");
    let report = service.reindex(&IndexScope::sub_roots(["Assets/Art"])).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.dropped, 0);
    // Outside the scope, so still present until a full pass.
    assert!(service.get(GUID_HERO).is_some());

    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.dropped, 1);
    assert!(service.get(GUID_HERO).is_none());
}

#[test]
fn test_tag_filter_scenario() {
    let project = Project::new().with_hero_and_texture();
    let mut service = project.open();
    service.reindex(&IndexScope::Entire).unwrap();
    service.set_tags_from_text(GUID_HERO, "Hero").unwrap();

    let hits = service.filter_ids(&FilterQuery::default().tag("hero"));
    assert_eq!(hits, vec![GUID_HERO.to_string()]);
    assert!(service.filter_ids(&FilterQuery::default().tag("villain")).is_empty());
}

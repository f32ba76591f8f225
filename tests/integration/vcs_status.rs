//! Version-control classification against real project directories.

use crate::support::{Project, GUID_HERO, GUID_TEX};
use assetdex::vcs::{ClassifyOutcome, VcsStatus, VcsSystem};
use assetdex::IndexScope;
use std::fs;
use std::path::Path;
use std::process::Command;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git(root: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=assetdex", "-c", "user.email=assetdex@example.com"])
        .args(args)
        .current_dir(root)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

#[test]
fn test_no_control_directory_means_no_system() {
    let project = Project::new().with_hero_and_texture();
    let mut config = project.config();
    config.vcs.enabled = true;
    let mut service = project.open_with(&config);

    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert_eq!(report.vcs, ClassifyOutcome::NotDetected);
    for record in service.records() {
        assert_eq!(record.vcs_system, VcsSystem::None);
        assert_eq!(record.vcs_status, VcsStatus::Unknown);
    }
}

#[test]
fn test_missing_executable_leaves_records_unclassified() {
    let project = Project::new().with_hero_and_texture();
    fs::create_dir_all(project.path(".git")).unwrap();
    let mut config = project.config();
    config.vcs.enabled = true;
    config.vcs.executable = "assetdex-no-such-git".to_string();
    let mut service = project.open_with(&config);

    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert!(matches!(report.vcs, ClassifyOutcome::Failed { .. }));
    assert_eq!(service.records().len(), 2);
    for record in service.records() {
        assert_eq!(record.vcs_system, VcsSystem::None);
        assert_eq!(record.vcs_status, VcsStatus::Unknown);
    }
}

#[test]
fn test_git_working_tree_statuses() {
    if !git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let project = Project::new().with_hero_and_texture();
    let root = project.root();
    git(root, &["init", "-q"]);
    git(root, &["add", "-A"]);
    git(root, &["commit", "-q", "-m", "initial"]);

    project.write("Assets/Art/hero_diffuse.png", b"\x89PNG\r\n\x1a\nchanged", None);
    project.write("Assets/Docs/readme.txt", b"new", None);

    let mut config = project.config();
    config.vcs.enabled = true;
    let mut service = project.open_with(&config);
    let report = service.reindex(&IndexScope::Entire).unwrap();
    assert!(matches!(report.vcs, ClassifyOutcome::Classified { system: VcsSystem::Git, .. }));

    assert_eq!(service.get(GUID_TEX).unwrap().vcs_status, VcsStatus::Modified);
    assert_eq!(service.get(GUID_HERO).unwrap().vcs_status, VcsStatus::UpToDate);
    let readme = service
        .records()
        .iter()
        .find(|r| r.path == "Assets/Docs/readme.txt")
        .unwrap();
    assert_eq!(readme.vcs_status, VcsStatus::Untracked);
    for record in service.records() {
        assert_eq!(record.vcs_system, VcsSystem::Git);
    }
    assert_eq!(service.changed_records().len(), 2);
}

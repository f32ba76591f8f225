//! Version-control status classification.
//!
//! Maps a backend's working-tree report onto a fixed canonical vocabulary and
//! writes it into the record set. Backend failures never fail the caller: every
//! record falls back to `none` / `unknown` and a warning is logged.

pub mod git;
pub mod porcelain;

use crate::catalog::MetadataRecord;
use crate::error::VcsError;
use crate::types::{is_within, normalize_logical_path};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub use git::GitBackend;
pub use porcelain::{parse_line, PorcelainCode, StatusEntry};

/// Version-control system governing the project root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsSystem {
    #[default]
    None,
    Git,
}

impl VcsSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsSystem::None => "none",
            VcsSystem::Git => "git",
        }
    }
}

impl fmt::Display for VcsSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical per-item status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VcsStatus {
    #[serde(rename = "untracked")]
    Untracked,
    #[serde(rename = "added")]
    Added,
    #[serde(rename = "modified")]
    Modified,
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "renamed")]
    Renamed,
    #[serde(rename = "copied")]
    Copied,
    #[serde(rename = "changed")]
    Changed,
    #[serde(rename = "up to date")]
    UpToDate,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl VcsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsStatus::Untracked => "untracked",
            VcsStatus::Added => "added",
            VcsStatus::Modified => "modified",
            VcsStatus::Deleted => "deleted",
            VcsStatus::Renamed => "renamed",
            VcsStatus::Copied => "copied",
            VcsStatus::Changed => "changed",
            VcsStatus::UpToDate => "up to date",
            VcsStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VcsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external status tool.
pub trait StatusBackend {
    /// System name written into records when the backend is in use.
    fn system(&self) -> VcsSystem;

    /// Whether this backend governs `project_root`.
    fn detect(&self, project_root: &Path) -> bool;

    /// Raw `XY <path>` lines for every changed path.
    fn status_lines(&self, project_root: &Path) -> Result<Vec<String>, VcsError>;
}

/// Backend that never detects anything; used when VCS is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

impl StatusBackend for NoBackend {
    fn system(&self) -> VcsSystem {
        VcsSystem::None
    }

    fn detect(&self, _project_root: &Path) -> bool {
        false
    }

    fn status_lines(&self, _project_root: &Path) -> Result<Vec<String>, VcsError> {
        Ok(Vec::new())
    }
}

/// Backend returning a canned report. Useful for tests and offline tooling.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    system: VcsSystem,
    report: Result<Vec<String>, String>,
}

impl FixedBackend {
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            system: VcsSystem::Git,
            report: Ok(lines.into_iter().map(Into::into).collect()),
        }
    }

    /// A detected backend whose invocation fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            system: VcsSystem::Git,
            report: Err(message.into()),
        }
    }
}

impl StatusBackend for FixedBackend {
    fn system(&self) -> VcsSystem {
        self.system
    }

    fn detect(&self, _project_root: &Path) -> bool {
        true
    }

    fn status_lines(&self, _project_root: &Path) -> Result<Vec<String>, VcsError> {
        self.report.clone().map_err(|message| VcsError::Exit {
            program: "fixed".to_string(),
            code: Some(1),
            stderr: message,
        })
    }
}

/// Outcome of one classification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyOutcome {
    /// No backend governs the project root.
    NotDetected,
    /// Backend ran; `changed` records matched a report entry.
    Classified { system: VcsSystem, changed: usize },
    /// Backend detected but failed; records left at defaults.
    Failed { system: VcsSystem, message: String },
}

/// Path → status lookup built from a backend report.
#[derive(Debug, Default)]
pub struct StatusMap {
    exact: HashMap<String, VcsStatus>,
    directories: Vec<(String, VcsStatus)>,
}

impl StatusMap {
    /// Build from raw lines, keeping only entries inside `corpus_root`.
    pub fn from_lines<S: AsRef<str>>(lines: &[S], corpus_root: &str) -> Self {
        let mut map = StatusMap::default();
        for line in lines {
            let Some(entry) = parse_line(line.as_ref()) else {
                debug!(line = line.as_ref(), "Skipping malformed status line");
                continue;
            };
            let status = entry.code.canonical();
            if entry.is_directory() {
                let dir = entry.path.trim_end_matches('/');
                if is_within(dir, corpus_root) || is_within(corpus_root, dir) {
                    map.directories.push((format!("{}/", dir), status));
                }
            } else if is_within(&entry.path, corpus_root) {
                map.exact.insert(entry.path, status);
            }
        }
        map
    }

    /// Status for a path; `None` means the path is tracked and clean.
    pub fn lookup(&self, path: &str) -> Option<VcsStatus> {
        let path = normalize_logical_path(path);
        if let Some(status) = self.exact.get(&path) {
            return Some(*status);
        }
        self.directories
            .iter()
            .find(|(dir, _)| path.starts_with(dir.as_str()))
            .map(|(_, status)| *status)
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assign `vcs_system` / `vcs_status` to every record.
pub fn classify(
    records: &mut [MetadataRecord],
    project_root: &Path,
    corpus_root: &str,
    backend: &dyn StatusBackend,
) -> ClassifyOutcome {
    for record in records.iter_mut() {
        record.vcs_system = VcsSystem::None;
        record.vcs_status = VcsStatus::Unknown;
    }

    if !backend.detect(project_root) {
        debug!(root = %project_root.display(), "No version control detected");
        return ClassifyOutcome::NotDetected;
    }

    let system = backend.system();
    let lines = match backend.status_lines(project_root) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(system = %system, error = %e, "Status backend failed; leaving records unclassified");
            return ClassifyOutcome::Failed {
                system,
                message: e.to_string(),
            };
        }
    };

    let map = StatusMap::from_lines(lines.as_slice(), corpus_root);
    let mut changed = 0;
    for record in records.iter_mut() {
        record.vcs_system = system;
        record.vcs_status = match map.lookup(&record.path) {
            Some(status) => {
                changed += 1;
                status
            }
            None => VcsStatus::UpToDate,
        };
    }

    debug!(system = %system, entries = map.len(), changed, "Records classified");
    ClassifyOutcome::Classified { system, changed }
}

//! Git status backend.

use crate::error::VcsError;
use crate::vcs::{StatusBackend, VcsSystem};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Runs `git status --porcelain` in the project root.
#[derive(Debug, Clone)]
pub struct GitBackend {
    executable: String,
    timeout: Duration,
}

impl GitBackend {
    pub fn new(executable: impl Into<String>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }
}

impl Default for GitBackend {
    fn default() -> Self {
        Self::new("git", Duration::from_secs(10))
    }
}

impl StatusBackend for GitBackend {
    fn system(&self) -> VcsSystem {
        VcsSystem::Git
    }

    /// The control directory (or worktree `.git` file) at the project root is the
    /// only signal consulted.
    fn detect(&self, project_root: &Path) -> bool {
        project_root.join(".git").exists()
    }

    fn status_lines(&self, project_root: &Path) -> Result<Vec<String>, VcsError> {
        // Captured in unlinked temp files, not pipes; read back after exit.
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;

        let mut child = Command::new(&self.executable)
            .args([
                "-c",
                "core.quotepath=off",
                "status",
                "--porcelain",
                "--untracked-files=all",
            ])
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .spawn()
            .map_err(|source| VcsError::Spawn {
                program: self.executable.clone(),
                source,
            })?;

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VcsError::Timeout {
                    program: self.executable.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let stdout = read_back(&mut stdout)?;
        let stderr = read_back(&mut stderr)?;

        if !status.success() {
            return Err(VcsError::Exit {
                program: self.executable.clone(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&stdout);
        let lines: Vec<String> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        debug!(entries = lines.len(), "git status collected");
        Ok(lines)
    }
}

fn read_back(file: &mut File) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}

//! Porcelain status parsing.
//!
//! A porcelain v1 entry is `XY <path>` where X is the staged (index) status and
//! Y is the worktree status. The two columns are read as independent signals.

use crate::types::normalize_logical_path;
use crate::vcs::VcsStatus;

/// Two-column status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PorcelainCode {
    pub staged: char,
    pub worktree: char,
}

impl PorcelainCode {
    /// Parse the first two characters of a porcelain code. Blanks become `' '`.
    pub fn parse(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let staged = chars.next()?;
        let worktree = chars.next().unwrap_or(' ');
        Some(Self { staged, worktree })
    }

    fn either(&self, c: char) -> bool {
        self.staged == c || self.worktree == c
    }

    fn is_unmerged(&self) -> bool {
        self.either('U')
            || (self.staged == 'A' && self.worktree == 'A')
            || (self.staged == 'D' && self.worktree == 'D')
    }

    /// Map to the canonical vocabulary.
    pub fn canonical(&self) -> VcsStatus {
        if self.staged == '?' && self.worktree == '?' {
            return VcsStatus::Untracked;
        }
        if self.is_unmerged() {
            return VcsStatus::Changed;
        }
        if self.either('D') {
            return VcsStatus::Deleted;
        }
        match self.staged {
            'R' => return VcsStatus::Renamed,
            'C' => return VcsStatus::Copied,
            'A' => return VcsStatus::Added,
            _ => {}
        }
        if self.either('M') || self.either('T') {
            return VcsStatus::Modified;
        }
        match self.worktree {
            'A' => VcsStatus::Added,
            'R' => VcsStatus::Renamed,
            'C' => VcsStatus::Copied,
            _ => VcsStatus::Changed,
        }
    }
}

/// One parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: PorcelainCode,
    /// Current path, normalized. Ends with `/` for directory entries.
    pub path: String,
}

impl StatusEntry {
    pub fn is_directory(&self) -> bool {
        self.path.ends_with('/')
    }
}

/// Parse a single `XY <path>` line. Returns `None` for malformed lines.
///
/// Rename and copy entries (`XY old -> new`) resolve to the new path.
pub fn parse_line(line: &str) -> Option<StatusEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
        return None;
    }
    let (code, rest) = line.split_at(2);
    if !rest.starts_with(' ') {
        return None;
    }
    let code = PorcelainCode::parse(code)?;
    let raw_path = &rest[1..];
    let raw_path = match raw_path.rfind(" -> ") {
        Some(split) if matches!(code.staged, 'R' | 'C') || matches!(code.worktree, 'R' | 'C') => {
            &raw_path[split + 4..]
        }
        _ => raw_path,
    };
    let unquoted = unquote(raw_path);
    if unquoted.is_empty() {
        return None;
    }
    let is_dir = unquoted.ends_with('/') || unquoted.ends_with('\\');
    let mut path = normalize_logical_path(&unquoted);
    if is_dir {
        path.push('/');
    }
    Some(StatusEntry { code, path })
}

/// Strip C-style quoting that git applies to unusual paths.
fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    if !(trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"')) {
        return trimmed.to_string();
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

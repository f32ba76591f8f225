//! Core types shared across the catalog.

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// ItemId: stable identity of a content item; survives renames and moves.
pub type ItemId = String;

/// Normalize a logical path: `/` separators, NFC, no leading `./` or trailing `/`.
pub fn normalize_logical_path(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let trimmed = replaced.trim_start_matches("./").trim_end_matches('/');
    trimmed.nfc().collect()
}

/// True when `path` is the corpus root itself or lies beneath it.
pub fn is_within(path: &str, root: &str) -> bool {
    if root.is_empty() {
        return true;
    }
    if path.len() < root.len() {
        return false;
    }
    let (head, tail) = path.split_at(root.len());
    head.eq_ignore_ascii_case(root) && (tail.is_empty() || tail.starts_with('/'))
}

/// Lowercase extension of a logical path, without the dot.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// File name without extension.
pub fn file_stem_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

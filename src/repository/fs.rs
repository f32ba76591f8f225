//! Filesystem-backed item repository.
//!
//! Items are regular files beneath `<project_root>/<corpus_root>`. Each item's
//! stable identity lives in a `<file>.meta` sidecar (`guid: <32 hex>`), so an
//! item keeps its id when it is moved together with its sidecar. Items reference
//! each other by writing `guid: <32 hex>` into their text content.

use crate::error::RepositoryError;
use crate::repository::kinds::{may_hold_references, type_for_extension, type_for_sniffed};
use crate::repository::{renamed_path, validate_new_name, ItemEntry, ItemFacts, ItemRepository};
use crate::types::{extension_of, file_stem_of, is_within, normalize_logical_path, ItemId};
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use walkdir::{DirEntry, WalkDir};

/// Suffix of identity sidecar files.
pub const SIDECAR_SUFFIX: &str = ".meta";

const GUID_LEN: usize = 32;
const GUID_KEY: &str = "guid:";

/// Default cap on bytes read when scanning an item for references.
pub const DEFAULT_MAX_REFERENCE_SCAN_BYTES: u64 = 8 * 1024 * 1024;

pub struct FsRepository {
    project_root: PathBuf,
    corpus_root: String,
    ignored_names: Vec<String>,
    max_reference_scan_bytes: u64,
    ids: RefCell<HashMap<ItemId, String>>,
    /// Logical (NFC) path to the name actually found on disk.
    on_disk: RefCell<HashMap<String, PathBuf>>,
    full_index_loaded: Cell<bool>,
}

impl FsRepository {
    pub fn new(project_root: impl Into<PathBuf>, corpus_root: impl AsRef<str>) -> Self {
        Self {
            project_root: project_root.into(),
            corpus_root: normalize_logical_path(corpus_root.as_ref()),
            ignored_names: Vec::new(),
            max_reference_scan_bytes: DEFAULT_MAX_REFERENCE_SCAN_BYTES,
            ids: RefCell::new(HashMap::new()),
            on_disk: RefCell::new(HashMap::new()),
            full_index_loaded: Cell::new(false),
        }
    }

    /// File or directory names skipped during enumeration (exact match).
    pub fn with_ignored_names(mut self, names: Vec<String>) -> Self {
        self.ignored_names = names;
        self
    }

    pub fn with_max_reference_scan_bytes(mut self, limit: u64) -> Self {
        self.max_reference_scan_bytes = limit;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute filesystem path of a logical path.
    ///
    /// Logical paths are NFC; names on disk may be stored in another
    /// normalization form. Each segment that does not exist verbatim is
    /// matched against its directory's entries by NFC form. Segments with no
    /// match are kept as given, so the result also names paths yet to be
    /// created.
    pub fn absolute(&self, logical: &str) -> PathBuf {
        let logical = normalize_logical_path(logical);
        let cached = self.on_disk.borrow().get(&logical).cloned();
        if let Some(path) = cached.filter(|path| path.exists()) {
            return path;
        }
        let mut path = self.project_root.clone();
        for segment in logical.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            let direct = path.join(segment);
            path = if direct.exists() {
                direct
            } else {
                find_entry(&path, segment).unwrap_or(direct)
            };
        }
        path
    }

    /// Logical path of an absolute path beneath the project root.
    pub fn logical(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.project_root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(normalize_logical_path(&parts.join("/")))
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || name.ends_with(SIDECAR_SUFFIX)
            || self.ignored_names.iter().any(|ignored| ignored == name.as_ref())
    }

    fn walk(
        &self,
        root: &str,
        mut visit: impl FnMut(&Path, String) -> Result<(), RepositoryError>,
    ) -> Result<(), RepositoryError> {
        let abs_root = self.absolute(root);
        if !abs_root.is_dir() {
            return Err(RepositoryError::Enumeration {
                root: root.to_string(),
                message: "not a directory".to_string(),
            });
        }
        let walker = WalkDir::new(&abs_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(RepositoryError::Enumeration {
                        root: root.to_string(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(root, error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(logical) = self.logical(entry.path()) else {
                continue;
            };
            self.on_disk
                .borrow_mut()
                .insert(logical.clone(), entry.path().to_path_buf());
            visit(entry.path(), logical)?;
        }
        Ok(())
    }

    /// Populate the id index from every sidecar in the corpus. Never writes.
    fn ensure_full_index(&self) {
        if self.full_index_loaded.get() {
            return;
        }
        self.full_index_loaded.set(true);
        let mut found = Vec::new();
        let result = self.walk(&self.corpus_root, |abs, logical| {
            if let Some(guid) = read_guid(&sidecar_path(abs)) {
                found.push((guid, logical));
            }
            Ok(())
        });
        if let Err(e) = result {
            warn!(error = %e, "Could not build identity index");
        }
        let mut ids = self.ids.borrow_mut();
        for (guid, logical) in found {
            ids.entry(guid).or_insert(logical);
        }
    }
}

impl ItemRepository for FsRepository {
    fn corpus_root(&self) -> &str {
        &self.corpus_root
    }

    fn enumerate_items(&self, scope_roots: &[String]) -> Result<Vec<ItemEntry>, RepositoryError> {
        let mut entries = Vec::new();
        let mut seen_ids: HashSet<ItemId> = HashSet::new();
        let mut seen_paths: HashSet<String> = HashSet::new();

        for root in scope_roots {
            self.walk(root, |abs, logical| {
                if !seen_paths.insert(logical.clone()) {
                    return Ok(());
                }
                let sidecar = sidecar_path(abs);
                let id = match read_guid(&sidecar) {
                    Some(guid) if !seen_ids.contains(&guid) => guid,
                    existing => {
                        let guid = new_guid();
                        if existing.is_some() {
                            warn!(path = %logical, "Duplicate identity; assigning a fresh one");
                        }
                        if let Err(e) = write_guid(&sidecar, &guid) {
                            warn!(path = %logical, error = %e, "Could not write identity sidecar");
                        }
                        guid
                    }
                };
                seen_ids.insert(id.clone());
                entries.push(ItemEntry::new(id, logical));
                Ok(())
            })?;
        }

        let mut ids = self.ids.borrow_mut();
        for entry in &entries {
            ids.insert(entry.id.clone(), entry.path.clone());
        }
        debug!(items = entries.len(), roots = scope_roots.len(), "Enumerated items");
        Ok(entries)
    }

    fn is_container(&self, path: &str) -> bool {
        let logical = normalize_logical_path(path);
        is_within(&logical, &self.corpus_root) && self.absolute(&logical).is_dir()
    }

    fn load_facts(&self, path: &str) -> Result<ItemFacts, RepositoryError> {
        let abs = self.absolute(path);
        if !abs.is_file() {
            return Err(RepositoryError::NotLoadable(path.to_string()));
        }
        let ext = extension_of(path);
        let type_name = match type_for_extension(&ext) {
            Some(name) => Some(name),
            None => infer::get_from_path(&abs)
                .ok()
                .flatten()
                .and_then(|kind| type_for_sniffed(&kind)),
        };
        let Some(type_name) = type_name else {
            return Err(RepositoryError::NotLoadable(path.to_string()));
        };
        Ok(ItemFacts {
            display_name: Some(file_stem_of(path)),
            type_name: Some(type_name.to_string()),
        })
    }

    fn size_of(&self, path: &str) -> Result<u64, RepositoryError> {
        std::fs::metadata(self.absolute(path))
            .map(|m| m.len())
            .map_err(|source| RepositoryError::Io {
                path: path.to_string(),
                source,
            })
    }

    fn audio_duration(&self, path: &str) -> Result<f64, RepositoryError> {
        let tagged = Probe::open(self.absolute(path))
            .and_then(|probe| probe.read())
            .map_err(|e| RepositoryError::Probe {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(tagged.properties().duration().as_secs_f64())
    }

    fn direct_references(&self, path: &str) -> Result<Vec<String>, RepositoryError> {
        if !may_hold_references(&extension_of(path)) {
            return Ok(Vec::new());
        }
        let abs = self.absolute(path);
        let io_err = |source| RepositoryError::Io {
            path: path.to_string(),
            source,
        };
        let len = std::fs::metadata(&abs).map_err(io_err)?.len();
        if len > self.max_reference_scan_bytes {
            debug!(path, bytes = len, "Item too large to scan for references");
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&abs).map_err(io_err)?;
        let text = String::from_utf8_lossy(&bytes);

        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for guid in scan_guids(&text) {
            if !seen.insert(guid.clone()) {
                continue;
            }
            match self.id_to_path(&guid) {
                Some(target) => paths.push(target),
                None => debug!(path, guid = %guid, "Unresolved reference"),
            }
        }
        Ok(paths)
    }

    fn path_to_id(&self, path: &str) -> Option<ItemId> {
        read_guid(&sidecar_path(&self.absolute(path)))
    }

    fn id_to_path(&self, id: &str) -> Option<String> {
        let cached = self.ids.borrow().get(id).cloned();
        let candidate = match cached {
            Some(path) if self.absolute(&path).is_file() => Some(path),
            _ => {
                self.ensure_full_index();
                self.ids.borrow().get(id).cloned()
            }
        };
        candidate.filter(|path| self.absolute(path).is_file())
    }

    fn rename(&self, path: &str, new_name: &str) -> Result<String, RepositoryError> {
        let name = validate_new_name(path, new_name)?;
        let current = normalize_logical_path(path);
        let target = renamed_path(&current, &name);
        if target == current {
            return Ok(current);
        }
        let fail = |message: String| RepositoryError::Rename {
            path: current.clone(),
            message,
        };

        let old_abs = self.absolute(&current);
        let new_abs = self.absolute(&target);
        if !old_abs.is_file() {
            return Err(fail("item does not exist".to_string()));
        }
        let case_only = target.eq_ignore_ascii_case(&current);
        if new_abs.exists() && !case_only {
            return Err(fail(format!("{} already exists", target)));
        }

        std::fs::rename(&old_abs, &new_abs).map_err(|e| fail(e.to_string()))?;
        let old_sidecar = sidecar_path(&old_abs);
        if old_sidecar.exists() {
            if let Err(e) = std::fs::rename(&old_sidecar, sidecar_path(&new_abs)) {
                // Keep item and identity together.
                let _ = std::fs::rename(&new_abs, &old_abs);
                return Err(fail(format!("could not move identity sidecar: {}", e)));
            }
        }

        {
            let mut on_disk = self.on_disk.borrow_mut();
            on_disk.remove(&current);
            on_disk.insert(target.clone(), new_abs.clone());
        }
        if let Some(guid) = read_guid(&sidecar_path(&new_abs)) {
            self.ids.borrow_mut().insert(guid, target.clone());
        }
        debug!(from = %current, to = %target, "Item renamed");
        Ok(target)
    }
}

/// Entry of `dir` whose name equals `segment` after NFC normalization.
fn find_entry(dir: &Path, segment: &str) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .find(|entry| entry.file_name().to_string_lossy().nfc().eq(segment.chars()))
        .map(|entry| entry.path())
}

/// Sidecar path for an item: `<file>.meta`.
pub fn sidecar_path(item: &Path) -> PathBuf {
    let mut os: OsString = item.as_os_str().to_owned();
    os.push(SIDECAR_SUFFIX);
    PathBuf::from(os)
}

fn new_guid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn is_guid(candidate: &str) -> bool {
    candidate.len() == GUID_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Read the `guid:` line of a sidecar.
pub fn read_guid(sidecar: &Path) -> Option<String> {
    let text = std::fs::read_to_string(sidecar).ok()?;
    text.lines().find_map(|line| {
        let value = line.trim().strip_prefix(GUID_KEY)?.trim();
        is_guid(value).then(|| value.to_ascii_lowercase())
    })
}

/// Write or replace the `guid:` line of a sidecar.
fn write_guid(sidecar: &Path, guid: &str) -> std::io::Result<()> {
    let existing = std::fs::read_to_string(sidecar).unwrap_or_default();
    let mut replaced = false;
    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if !replaced && line.trim().starts_with(GUID_KEY) {
                replaced = true;
                format!("{} {}", GUID_KEY, guid)
            } else {
                line.to_string()
            }
        })
        .collect();
    if !replaced {
        if lines.is_empty() {
            lines.push("fileFormatVersion: 2".to_string());
        }
        lines.push(format!("{} {}", GUID_KEY, guid));
    }
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(sidecar, content)
}

/// Every `guid: <32 hex>` token in `text`, in order of appearance.
pub fn scan_guids(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find(GUID_KEY) {
        let after = rest[at + GUID_KEY.len()..].trim_start_matches([' ', '\t']);
        let candidate: String = after.chars().take(GUID_LEN).collect();
        if is_guid(&candidate)
            && !after[candidate.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_hexdigit())
        {
            found.push(candidate.to_ascii_lowercase());
        }
        rest = &rest[at + GUID_KEY.len()..];
    }
    found
}

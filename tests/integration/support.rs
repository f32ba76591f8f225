//! Shared fixtures: on-disk projects in temp directories.

use assetdex::config::AssetdexConfig;
use assetdex::CatalogService;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GUID_HERO: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const GUID_TEX: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Silent 16-bit mono PCM WAV of the given length.
pub fn pcm_wav(seconds: u32, sample_rate: u32) -> Vec<u8> {
    let data_len = seconds * sample_rate * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Assets")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, logical: &str) -> PathBuf {
        self.root().join(logical)
    }

    /// Write an item and, when `guid` is given, its identity sidecar.
    pub fn write(&self, logical: &str, content: &[u8], guid: Option<&str>) {
        let path = self.path(logical);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        if let Some(guid) = guid {
            fs::write(
                self.path(&format!("{}.meta", logical)),
                format!("fileFormatVersion: 2\nguid: {}\n", guid),
            )
            .unwrap();
        }
    }

    pub fn remove(&self, logical: &str) {
        fs::remove_file(self.path(logical)).unwrap();
        let _ = fs::remove_file(self.path(&format!("{}.meta", logical)));
    }

    /// Hero prefab referencing a texture.
    pub fn with_hero_and_texture(self) -> Self {
        self.write("Assets/Art/hero_diffuse.png", b"\x89PNG\r\n\x1a\n....", Some(GUID_TEX));
        let prefab = format!(
            "--- !u!1 &100\nGameObject:\n  m_Name: Hero\n--- !u!23 &200\nMeshRenderer:\n  m_Materials:\n  - {{fileID: 2100000, guid: {}, type: 2}}\n",
            GUID_TEX
        );
        self.write("Assets/Prefabs/hero.prefab", prefab.as_bytes(), Some(GUID_HERO));
        self
    }

    pub fn config(&self) -> AssetdexConfig {
        let mut config = AssetdexConfig::default();
        config.vcs.enabled = false;
        config
    }

    pub fn open(&self) -> CatalogService {
        CatalogService::open(&self.config(), self.root()).unwrap()
    }

    pub fn open_with(&self, config: &AssetdexConfig) -> CatalogService {
        CatalogService::open(config, self.root()).unwrap()
    }
}

//! Durable key-value storage for session data.
//!
//! Values are strings, like browser local storage. `FileStorage` keeps the
//! whole map in one JSON file and replaces it in a single rename, so a reader
//! never sees a half-written update.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "storage.json";

pub type StorageMap = BTreeMap<String, String>;

/// Cheap change marker: modification time and length of the backing file.
pub type Revision = (SystemTime, u64);

pub trait DurableStorage: Send + Sync {
    /// Read every entry. A missing store is an empty map.
    fn load(&self) -> Result<StorageMap>;

    /// Replace every entry in one step.
    fn store(&self, entries: &StorageMap) -> Result<()>;

    /// Marker that changes whenever the stored data does. `None` means the
    /// storage cannot tell, and watchers must re-read every time.
    fn revision(&self) -> Option<Revision> {
        None
    }
}

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the standard file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DurableStorage for FileStorage {
    fn load(&self) -> Result<StorageMap> {
        if !self.path.exists() {
            return Ok(StorageMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(StorageMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn store(&self, entries: &StorageMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn revision(&self) -> Option<Revision> {
        let meta = std::fs::metadata(&self.path).ok()?;
        Some((meta.modified().ok()?, meta.len()))
    }
}

/// In-process storage, for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<StorageMap>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl DurableStorage for MemoryStorage {
    fn load(&self) -> Result<StorageMap> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        Ok(entries.clone())
    }

    fn store(&self, entries: &StorageMap) -> Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        *guard = entries.clone();
        Ok(())
    }
}

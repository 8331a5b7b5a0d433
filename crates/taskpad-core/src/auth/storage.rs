//! Durable key-value storage for session state.
//!
//! `KeyValueStore` is the local-storage equivalent the session layer writes
//! its persisted credential into. `FileStore` keeps every entry in a single
//! JSON file; `MemoryStore` lives only as long as the process and backs tests.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Written first, then renamed over `STORAGE_FILE`
const STORAGE_TMP_FILE: &str = "storage.json.tmp";

pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key has never been written or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Entries persisted as a JSON object in `<dir>/storage.json`.
///
/// A file that does not parse reads as empty and is replaced by the next
/// write.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let path = self.storage_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read storage file")?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Storage file is corrupt, ignoring it");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = self.storage_path();
        if entries.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove storage file")?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir).context("Failed to create data directory")?;
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.dir.join(STORAGE_TMP_FILE);
        std::fs::write(&tmp_path, contents).context("Failed to write storage file")?;
        std::fs::rename(&tmp_path, &path).context("Failed to replace storage file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        // Rewrite whenever the file exists so a corrupt one is dropped too
        let removed = entries.remove(key).is_some();
        if removed || self.storage_path().exists() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

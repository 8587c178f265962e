//! File-backed key-value store (single JSON object)

use super::KeyValueStore;
use crate::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "storage.json";

/// Key-value store persisted as one JSON object on disk.
///
/// The whole map is rewritten on every write through a temp file and a
/// rename, so `set_many` lands atomically.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `<data_dir>/storage.json`, starting empty if it is missing or
    /// unreadable
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORAGE_FILE);
        let values = Self::read_values(&path);

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, picking up writes from other processes
    pub fn reload(&mut self) {
        self.values = Self::read_values(&self.path);
    }

    fn read_values(path: &Path) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str(&content) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(
                    "Storage file {} is corrupt, starting empty: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, content)?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!("Flushed {} keys to {}", values.len(), self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value.to_string())])
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.values.contains_key(key) {
            return Ok(());
        }

        let mut next = self.values.clone();
        next.remove(key);
        self.flush(&next)?;
        self.values = next;
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let mut next = self.values.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), value.clone());
        }

        // Only adopt the new map once it is on disk
        self.flush(&next)?;
        self.values = next;
        Ok(())
    }
}

//! In-memory key-value store with an optional byte quota

use super::KeyValueStore;
use crate::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values would exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota_bytes: Some(bytes),
        }
    }

    pub fn set_quota(&mut self, bytes: Option<usize>) {
        self.quota_bytes = bytes;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn used_bytes(&self) -> usize {
        self.values.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Size the store would have after applying `entries`
    fn projected_bytes(&self, entries: &[(&str, String)]) -> usize {
        let mut projected = self.values.clone();
        for (key, value) in entries {
            projected.insert((*key).to_string(), value.clone());
        }
        projected.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_quota(&self, key: &str, needed: usize) -> Result<()> {
        match self.quota_bytes {
            Some(limit) if needed > limit => Err(Error::QuotaExceeded {
                key: key.to_string(),
                needed,
                limit,
            }),
            _ => Ok(()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let current = self.values.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let needed = self.used_bytes() - current + key.len() + value.len();
        self.check_quota(key, needed)?;

        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let needed = self.projected_bytes(entries);
        let key = entries.first().map(|(k, _)| *k).unwrap_or_default();
        self.check_quota(key, needed)?;

        for (key, value) in entries {
            self.values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

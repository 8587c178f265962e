//! String key-value persistence interface

use crate::Result;

/// Durable string-keyed, string-valued store.
///
/// Reads never fail: a missing or unreadable value is `None`. Writes may fail
/// (for example on a quota limit) and callers are expected to degrade rather
/// than abort.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;

    /// Write several entries. The default writes them one by one in order,
    /// so a failure part-way leaves the earlier entries applied.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        (**self).set_many(entries)
    }
}

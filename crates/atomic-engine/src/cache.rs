//! Persisted rule cache
//!
//! Generated rules and seen identifiers are stored under
//! `<key>:<version>`; `<key>` holds the active version so a version bump
//! evicts the stale entry.

use serde::{Deserialize, Serialize};

use atomic_dom::Storage;

/// String-keyed blob store
pub trait Store {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);

    fn remove(&mut self, key: &str);
}

impl Store for Storage {
    fn get(&self, key: &str) -> Option<String> {
        self.get_item(key).map(str::to_string)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.set_item(key, value);
    }

    fn remove(&mut self, key: &str) {
        self.remove_item(key);
    }
}

/// Serialized cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Generated rules in stylesheet order, one per line
    pub content: String,
    /// Identifiers already handled
    pub tracker: Vec<String>,
}

/// Cache location for one key prefix and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    key: String,
    version: String,
}

impl Cache {
    pub fn new(key: &str, version: &str) -> Self {
        Self {
            key: key.to_string(),
            version: version.to_string(),
        }
    }

    /// Key of the active version's entry
    pub fn entry_key(&self) -> String {
        format!("{}:{}", self.key, self.version)
    }

    /// Make this version active, evicting any other version's entry
    pub fn activate<T: Store + ?Sized>(&self, store: &mut T) {
        match store.get(&self.key) {
            Some(active) if active == self.version => return,
            Some(stale) => {
                store.remove(&format!("{}:{}", self.key, stale));
                tracing::info!("Evicted style cache {}:{}", self.key, stale);
            }
            None => {}
        }
        store.set(&self.key, &self.version);
    }

    /// Read the active entry; a corrupt entry is removed and reported
    pub fn load<T: Store + ?Sized>(
        &self,
        store: &mut T,
    ) -> Result<Option<CacheEntry>, serde_json::Error> {
        let key = self.entry_key();
        let Some(raw) = store.get(&key) else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(err) => {
                store.remove(&key);
                Err(err)
            }
        }
    }

    pub fn save<T: Store + ?Sized>(
        &self,
        store: &mut T,
        entry: &CacheEntry,
    ) -> Result<(), serde_json::Error> {
        let raw = serde_json::to_string(entry)?;
        store.set(&self.entry_key(), &raw);
        Ok(())
    }
}

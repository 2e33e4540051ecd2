//! Storage
//!
//! String-keyed persistent blob store, shaped like `localStorage`.

use std::collections::HashMap;

/// In-memory key/value storage area
#[derive(Debug, Clone, Default)]
pub struct Storage {
    items: HashMap<String, String>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    pub fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

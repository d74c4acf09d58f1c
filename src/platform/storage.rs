//! Durable key-value storage
//!
//! Browser builds persist to LocalStorage; everything else (tests, native)
//! uses an in-memory map.

use std::collections::BTreeMap;

/// Minimal string key-value store, shaped after the Web Storage API.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    /// Returns false if the write was refused (quota, private mode)
    fn set_item(&mut self, key: &str, value: &str) -> bool;
    fn remove_item(&mut self, key: &str);
}

/// In-memory storage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        self.items.insert(key.to_string(), value.to_string());
        true
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

/// Browser LocalStorage. Degrades to a no-op store when unavailable.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Self {
        let inner = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if inner.is_none() {
            log::warn!("LocalStorage unavailable - progress will not persist");
        }
        Self { inner }
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.as_ref()?.get_item(key).ok()?
    }

    fn set_item(&mut self, key: &str, value: &str) -> bool {
        match &self.inner {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => false,
        }
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(storage) = &self.inner {
            let _ = storage.remove_item(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert!(storage.is_empty());
        assert!(storage.set_item("a", "1"));
        assert_eq!(storage.get_item("a").as_deref(), Some("1"));
        storage.remove_item("a");
        assert_eq!(storage.get_item("a"), None);
    }
}

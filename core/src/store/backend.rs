// Storage abstraction for cross-platform persistence
//
// Values are UTF-8 text because the browser backend (localStorage) only
// holds strings. Native backends store the same text as bytes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Unified storage trait for cross-platform data persistence
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn put(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
    fn flush(&self) -> Result<(), String>;
}

/// In-memory storage useful for testing and temporary sessions
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), String> {
        self.data.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.data.write().remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub struct SledStorage {
    db: sled::Db,
}

#[cfg(not(target_arch = "wasm32"))]
impl SledStorage {
    pub fn new(path: &str) -> std::result::Result<Self, String> {
        let db = sled::open(path).map_err(|e| e.to_string())?;
        Ok(Self { db })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl StorageBackend for SledStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let value = self.db.get(key.as_bytes()).map_err(|e| e.to_string())?;
        // Non-UTF-8 bytes surface as unparsable text, i.e. a corrupted slot
        Ok(value.map(|ivec| String::from_utf8_lossy(&ivec).into_owned()))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), String> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.db.remove(key.as_bytes()).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        self.db.flush().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.put("slot", "[]").unwrap();
        assert_eq!(storage.get("slot").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.len(), 1);

        storage.remove("slot").unwrap();
        assert_eq!(storage.get("slot").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_clones_share_data() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.put("slot", "x").unwrap();
        assert_eq!(other.get("slot").unwrap().as_deref(), Some("x"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_sled_storage_non_utf8_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::new(dir.path().to_str().unwrap()).unwrap();

        storage.db.insert(b"slot", &[0xff, 0xfe, b'[']).unwrap();
        let value = storage.get("slot").unwrap().unwrap();
        assert!(value.contains('\u{FFFD}'));
        assert!(serde_json::from_str::<serde_json::Value>(&value).is_err());
    }
}

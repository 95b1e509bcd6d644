//! Process-local blob store.

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use super::{BlobStore, PersistError, PersistResult};

/// In-memory [`BlobStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a blob exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().map(|m| m.contains_key(key)).unwrap_or(false)
    }

    fn lock(&self) -> PersistResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.inner
            .lock()
            .map_err(|_| PersistError::Message("memory blob store poisoned".to_string()))
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> PersistResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

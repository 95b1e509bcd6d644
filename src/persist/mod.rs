//! Key-value blob persistence of the whole collection.

/// Process-local blob store.
pub mod memory;
/// SQLite key-value blob store.
pub mod sqlite;

use thiserror::Error;

use crate::{core::store::HikeStore, hike::HikeRecord};

/// Default key under which the collection blob is stored.
pub const HIKES_KEY: &str = "@hikes";

/// Errors raised by blob stores and blob encoding.
#[derive(Debug, Error)]
pub enum PersistError {
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Blob encode or decode failure.
    #[error("json error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other failure, already rendered.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// A key-value store holding opaque byte blobs.
pub trait BlobStore: Send {
    /// Reads the blob under `key`, `None` when absent.
    fn get(&self, key: &str) -> PersistResult<Option<Vec<u8>>>;
    /// Writes `value` under `key`, overwriting any previous blob.
    fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()>;
    /// Removes the blob under `key`; absent keys are not an error.
    fn remove(&mut self, key: &str) -> PersistResult<()>;
}

/// Serializes a newest-first collection as a JSON array.
pub fn encode_collection(records: &[HikeRecord]) -> PersistResult<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}

/// Deserializes a JSON array of records, preserving order.
pub fn decode_collection(bytes: &[u8]) -> PersistResult<Vec<HikeRecord>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads the collection under `key`, failing hard on any error.
pub fn read_collection(blobs: &dyn BlobStore, key: &str) -> PersistResult<Option<Vec<HikeRecord>>> {
    blobs
        .get(key)?
        .map(|bytes| decode_collection(&bytes))
        .transpose()
}

/// Writes a newest-first collection under `key`.
pub fn write_collection(blobs: &mut dyn BlobStore, key: &str, records: &[HikeRecord]) -> PersistResult<()> {
    let bytes = encode_collection(records)?;
    blobs.set(key, &bytes)
}

/// Loads the store from `key`.
///
/// Retrieval and decode failures are logged and yield an empty store.
pub fn load_store(blobs: &dyn BlobStore, key: &str) -> HikeStore {
    load_store_reporting(blobs, key).0
}

/// Like [`load_store`], but also hands back the failure that emptied the
/// store, if any.
pub fn load_store_reporting(blobs: &dyn BlobStore, key: &str) -> (HikeStore, Option<PersistError>) {
    match read_collection(blobs, key) {
        Ok(Some(records)) => {
            let store = HikeStore::from_records(records);
            tracing::info!(key, count = store.len(), "loaded hikes");
            (store, None)
        }
        Ok(None) => {
            tracing::debug!(key, "no persisted hikes");
            (HikeStore::new(), None)
        }
        Err(error) => {
            tracing::warn!(key, %error, "failed to load hikes, starting empty");
            (HikeStore::new(), Some(error))
        }
    }
}

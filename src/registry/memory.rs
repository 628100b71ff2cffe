//! In-memory object store using `DashMap`.
//!
//! Data is lost on process restart; used by tests and by callers embedding
//! the pipeline.

use super::ObjectStore;
use crate::Result;
use dashmap::DashMap;

/// In-memory object store keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), Vec<u8>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }

    /// Number of stored objects across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self
            .objects
            .contains_key(&(bucket.to_string(), key.to_string())))
    }
}

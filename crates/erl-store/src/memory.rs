use std::collections::HashMap;
use std::sync::RwLock;

use erl_crypto::ContentHasher;
use erl_types::ContentHandle;

use crate::error::StoreResult;
use crate::traits::{check_integrity, ContentStore};

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Content is held behind a `RwLock` for
/// safe concurrent access and cloned on read.
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<ContentHandle, Vec<u8>>>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Sorted list of all handles in the store.
    pub fn all_handles(&self) -> Vec<ContentHandle> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut handles: Vec<ContentHandle> = map.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Overwrite the bytes under a handle without rehashing.
    #[cfg(test)]
    pub(crate) fn corrupt(&self, handle: &ContentHandle, data: Vec<u8>) {
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(*handle, data);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, data: &[u8]) -> StoreResult<ContentHandle> {
        let handle = ContentHasher::DOCUMENT.hash(data);
        let mut map = self.blobs.write().expect("lock poisoned");
        map.entry(handle).or_insert_with(|| data.to_vec());
        Ok(handle)
    }

    fn get(&self, handle: &ContentHandle) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        match map.get(handle) {
            Some(data) => {
                check_integrity(handle, data)?;
                Ok(Some(data.clone()))
            }
            None => Ok(None),
        }
    }

    fn exists(&self, handle: &ContentHandle) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(handle))
    }

    fn delete(&self, handle: &ContentHandle) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(handle).is_some())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use erl_crypto::ContentHasher;
use erl_types::ContentHandle;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{check_integrity, ContentStore};

/// Directory-backed content store.
///
/// Each blob lives at `<root>/<first two hex chars>/<remaining hex>`. Writes
/// go to a temporary file in the same directory and are renamed into place,
/// so a reader never observes a partially written blob.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, handle: &ContentHandle) -> PathBuf {
        let hex = handle.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, data: &[u8]) -> StoreResult<ContentHandle> {
        let handle = ContentHasher::DOCUMENT.hash(data);
        let path = self.path_for(&handle);
        if path.exists() {
            return Ok(handle);
        }

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(handle = %handle.short_hex(), bytes = data.len(), "stored blob");
        Ok(handle)
    }

    fn get(&self, handle: &ContentHandle) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(handle)) {
            Ok(data) => {
                check_integrity(handle, &data)?;
                Ok(Some(data))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, handle: &ContentHandle) -> StoreResult<bool> {
        Ok(self.path_for(handle).is_file())
    }

    fn delete(&self, handle: &ContentHandle) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(handle)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn temp_store() -> (tempfile::TempDir, FsContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_and_get() {
        let (_dir, store) = temp_store();
        let handle = store.put(b"persisted").unwrap();
        assert_eq!(store.get(&handle).unwrap().unwrap(), b"persisted");
        assert!(store.exists(&handle).unwrap());
    }

    #[test]
    fn layout_fans_out_by_prefix() {
        let (_dir, store) = temp_store();
        let handle = store.put(b"layout").unwrap();
        let hex = handle.to_hex();
        assert!(store.root().join(&hex[..2]).join(&hex[2..]).is_file());
    }

    #[test]
    fn put_is_idempotent() {
        let (_dir, store) = temp_store();
        let h1 = store.put(b"again").unwrap();
        let h2 = store.put(b"again").unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn reopen_sees_existing_content() {
        let (dir, store) = temp_store();
        let handle = store.put(b"durable").unwrap();
        drop(store);
        let reopened = FsContentStore::open(dir.path().join("objects")).unwrap();
        assert_eq!(reopened.fetch(&handle).unwrap(), b"durable");
    }

    #[test]
    fn missing_and_delete() {
        let (_dir, store) = temp_store();
        let missing = ContentHandle::from_hash([1; 32]);
        assert!(store.get(&missing).unwrap().is_none());
        assert!(!store.delete(&missing).unwrap());

        let handle = store.put(b"gone soon").unwrap();
        assert!(store.delete(&handle).unwrap());
        assert!(!store.exists(&handle).unwrap());
    }

    #[test]
    fn tampered_file_is_detected() {
        let (_dir, store) = temp_store();
        let handle = store.put(b"genuine").unwrap();
        fs::write(store.path_for(&handle), b"forged").unwrap();
        assert!(matches!(
            store.get(&handle),
            Err(StoreError::HashMismatch { .. })
        ));
    }
}

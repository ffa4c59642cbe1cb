use erl_types::ContentHandle;

use crate::error::{StoreError, StoreResult};

/// Content-addressed byte store holding committed result documents.
///
/// All implementations must satisfy these invariants:
/// - The handle is derived from the bytes, so the same bytes always produce
///   the same handle and `put` is idempotent.
/// - `get` re-derives the handle from the bytes it returns and fails with
///   [`StoreError::HashMismatch`] rather than hand back altered content.
/// - The store never interprets the bytes.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their handle.
    fn put(&self, data: &[u8]) -> StoreResult<ContentHandle>;

    /// Fetch bytes by handle. `Ok(None)` if absent.
    fn get(&self, handle: &ContentHandle) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether content exists for a handle.
    fn exists(&self, handle: &ContentHandle) -> StoreResult<bool>;

    /// Remove content. Returns `true` if it existed.
    fn delete(&self, handle: &ContentHandle) -> StoreResult<bool>;

    /// Fetch bytes, treating absence as [`StoreError::NotFound`].
    fn fetch(&self, handle: &ContentHandle) -> StoreResult<Vec<u8>> {
        self.get(handle)?.ok_or(StoreError::NotFound(*handle))
    }
}

impl<T: ContentStore + ?Sized> ContentStore for std::sync::Arc<T> {
    fn put(&self, data: &[u8]) -> StoreResult<ContentHandle> {
        (**self).put(data)
    }

    fn get(&self, handle: &ContentHandle) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(handle)
    }

    fn exists(&self, handle: &ContentHandle) -> StoreResult<bool> {
        (**self).exists(handle)
    }

    fn delete(&self, handle: &ContentHandle) -> StoreResult<bool> {
        (**self).delete(handle)
    }
}

/// Check fetched bytes against their handle.
pub(crate) fn check_integrity(handle: &ContentHandle, data: &[u8]) -> StoreResult<()> {
    let computed = erl_crypto::ContentHasher::DOCUMENT.hash(data);
    if computed != *handle {
        return Err(StoreError::HashMismatch {
            handle: *handle,
            computed,
        });
    }
    Ok(())
}

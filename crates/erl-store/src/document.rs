use erl_crypto::CanonicalBatch;
use erl_types::{ContentHandle, Record};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Current result document format.
pub const DOCUMENT_VERSION: u32 = 1;

/// The off-chain copy of a committed batch.
///
/// Records are written in canonical order, so a document built from the
/// same batch always serializes to the same bytes and therefore the same
/// content handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub version: u32,
    pub records: Vec<Record>,
}

impl ResultDocument {
    pub fn from_batch(batch: &CanonicalBatch) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            records: batch.records().to_vec(),
        }
    }

    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        let doc: Self =
            serde_json::from_slice(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if doc.version != DOCUMENT_VERSION {
            return Err(StoreError::UnsupportedVersion(doc.version));
        }
        Ok(doc)
    }

    /// Serialize and put into `store`.
    pub fn save(&self, store: &dyn ContentStore) -> StoreResult<ContentHandle> {
        store.put(&self.to_bytes()?)
    }

    /// Fetch from `store` and decode. Absence is [`StoreError::NotFound`].
    pub fn load(store: &dyn ContentStore, handle: &ContentHandle) -> StoreResult<Self> {
        Self::from_bytes(&store.fetch(handle)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryContentStore;
    use erl_crypto::DuplicatePolicy;
    use erl_types::SubjectId;

    fn batch(records: &[Record]) -> CanonicalBatch {
        CanonicalBatch::new(records, DuplicatePolicy::Reject).unwrap()
    }

    fn rec(byte: u8, score: u64) -> Record {
        Record::new(SubjectId::repeat(byte), score)
    }

    #[test]
    fn input_order_does_not_change_handle() {
        let store = InMemoryContentStore::new();
        let a = ResultDocument::from_batch(&batch(&[rec(2, 50), rec(1, 60)]));
        let b = ResultDocument::from_batch(&batch(&[rec(1, 60), rec(2, 50)]));
        assert_eq!(a.save(&store).unwrap(), b.save(&store).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn save_and_load() {
        let store = InMemoryContentStore::new();
        let doc = ResultDocument::from_batch(&batch(&[rec(3, 70), rec(1, 90)]));
        let handle = doc.save(&store).unwrap();
        let loaded = ResultDocument::load(&store, &handle).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.records[0].subject, SubjectId::repeat(1));
    }

    #[test]
    fn load_missing_is_not_found() {
        let store = InMemoryContentStore::new();
        let handle = ContentHandle::from_hash([4; 32]);
        assert!(matches!(
            ResultDocument::load(&store, &handle),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let data = br#"{"version":2,"records":[]}"#;
        assert!(matches!(
            ResultDocument::from_bytes(data),
            Err(StoreError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ResultDocument::from_bytes(b"not json"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn wire_shape() {
        let doc = ResultDocument::from_batch(&batch(&[rec(0x11, 85)]));
        let text = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            text,
            r#"{"version":1,"records":[{"subject":"0x1111111111111111111111111111111111111111","score":85}]}"#
        );
    }
}

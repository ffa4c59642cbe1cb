use erl_crypto::HashScheme;
use erl_types::{BatchKey, ContentHandle, Hash256, SubjectId};

use crate::error::LedgerResult;
use crate::records::{BatchEntry, LedgerEvent};

/// Write boundary for batch uploads and validator confirmations.
pub trait LedgerWriter: Send + Sync {
    /// Record a new batch. Batches are immutable: an existing key is rejected.
    ///
    /// `scheme` is the hash scheme that produced `merkle_root`. It is stored
    /// with the batch so the root can be recomputed after the engine's
    /// configuration changes.
    fn record_batch(
        &self,
        key: &BatchKey,
        content_handle: ContentHandle,
        merkle_root: Hash256,
        scheme: HashScheme,
        uploader: SubjectId,
    ) -> LedgerResult<BatchEntry>;

    /// Add one validator confirmation, marking the batch validated once the
    /// threshold is reached. A validator not seen before is admitted only
    /// while the ledger is below its validator cap.
    fn confirm(&self, key: &BatchKey, validator: SubjectId) -> LedgerResult<BatchEntry>;
}

/// Read boundary for batch lookups and the event feed.
pub trait LedgerReader: Send + Sync {
    fn batch(&self, key: &BatchKey) -> LedgerResult<Option<BatchEntry>>;

    /// All batches, ordered by key.
    fn batches(&self) -> LedgerResult<Vec<BatchEntry>>;

    fn batches_by_uploader(&self, uploader: &SubjectId) -> LedgerResult<Vec<BatchEntry>>;

    /// Events with `seq > after`, in feed order.
    fn events_since(&self, after: u64) -> LedgerResult<Vec<LedgerEvent>>;

    fn batch_count(&self) -> LedgerResult<u64>;
}

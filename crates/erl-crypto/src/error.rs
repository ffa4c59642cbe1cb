use erl_types::{SubjectId, TypeError};

/// Structural errors raised before any hashing takes place.
///
/// A root that fails to match is not an error: verification returns
/// `Ok(false)` and the caller rejects the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Two records in one batch name the same subject and the configured
    /// policy is to reject.
    #[error("duplicate subject {0} in batch")]
    DuplicateSubject(SubjectId),

    /// An input row could not be normalized into a record.
    #[error("malformed record at index {index}: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: TypeError,
    },
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

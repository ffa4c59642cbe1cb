use erl_types::ContentHandle;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested content was not found.
    #[error("content not found: {0}")]
    NotFound(ContentHandle),

    /// Stored bytes no longer hash to their handle (data corruption).
    #[error("hash mismatch for {handle}: computed {computed}")]
    HashMismatch {
        handle: ContentHandle,
        computed: ContentHandle,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A result document written by an incompatible version.
    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

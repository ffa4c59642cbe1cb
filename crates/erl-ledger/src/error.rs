use erl_types::{BatchKey, SubjectId};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("batch {0} already exists")]
    BatchExists(BatchKey),

    #[error("batch {0} not found")]
    BatchNotFound(BatchKey),

    #[error("validator {validator} already confirmed batch {key}")]
    AlreadyConfirmed { key: BatchKey, validator: SubjectId },

    #[error("batch {0} is already validated")]
    AlreadyValidated(BatchKey),

    #[error("validator {validator} is not admitted: the ledger already has the maximum of {max} validators")]
    TooManyValidators { validator: SubjectId, max: u32 },

    #[error("batch {0} has a null content handle")]
    NullContentHandle(BatchKey),

    #[error("invalid ledger config: {0}")]
    InvalidConfig(String),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("ledger {0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

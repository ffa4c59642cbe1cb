use erl_types::BatchKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("batch {0} not found")]
    BatchNotFound(BatchKey),

    #[error("batch {0} is not validated yet")]
    NotValidated(BatchKey),

    #[error("engine error: {0}")]
    Engine(#[from] erl_crypto::EngineError),

    #[error("store error: {0}")]
    Store(#[from] erl_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] erl_ledger::LedgerError),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

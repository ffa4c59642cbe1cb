//! High-level API for the Exam Result Ledger.
//!
//! [`ResultRegistry`] is the entry point for applications: it publishes
//! result batches (engine + content store + ledger in one call), records
//! validator confirmations, audits stored documents against their ledger
//! roots, and serves students their records with inclusion proofs.

pub mod error;
pub mod registry;
pub mod report;

pub use error::{RegistryError, RegistryResult};
pub use registry::ResultRegistry;
pub use report::{AuditReport, PublishReceipt, StudentResult};

// Re-export key types
pub use erl_crypto::{CommitmentEngine, EngineConfig, InclusionProof};
pub use erl_ledger::{BatchEntry, BatchStatus, LedgerConfig};
pub use erl_types::{BatchKey, RawRecord, Record, SubjectId};

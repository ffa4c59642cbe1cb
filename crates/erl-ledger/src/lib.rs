//! Batch registry for the Exam Result Ledger (ERL).
//!
//! Models the on-chain side of result publication. It provides:
//! - `BatchEntry` records keyed by (session, semester, course code)
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` with snapshot persistence by event replay
//! - A pending-to-validated transition driven by distinct validator confirmations
//! - An append-only event feed and the `BatchIndex` that mirrors it
//!
//! Who may upload or confirm is decided by the caller. The ledger only
//! enforces batch immutability, the confirmation rules and a cap on how many
//! distinct validators it admits.

pub mod config;
pub mod error;
pub mod memory;
pub mod projection;
pub mod records;
mod replay;
pub mod traits;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryLedger, LedgerSnapshot};
pub use projection::{AuditIndexEntry, BatchIndex, IndexedBatch};
pub use records::{BatchEntry, BatchStatus, EventKind, LedgerEvent};
pub use traits::{LedgerReader, LedgerWriter};

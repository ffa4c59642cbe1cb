//! Foundation types for the Exam Result Ledger (ERL).
//!
//! Every other ERL crate depends on `erl-types`. Loosely shaped input is
//! normalized here, at the boundary, so the commitment engine only ever sees
//! canonical values.
//!
//! # Key Types
//!
//! - [`SubjectId`]: 20-byte account address identifying a student
//! - [`Score`] / [`Record`]: one canonical result and its packed encoding
//! - [`RawRecord`]: loosely typed input row, normalized into a [`Record`]
//! - [`Hash256`]: Merkle leaf, node, and root digests
//! - [`ContentHandle`]: content address in the off-chain object store
//! - [`BatchKey`]: (session, semester, course code) ledger key

pub mod batch;
pub mod digest;
pub mod error;
pub mod handle;
pub mod record;
pub mod subject;

pub use batch::BatchKey;
pub use digest::Hash256;
pub use error::TypeError;
pub use handle::ContentHandle;
pub use record::{RawRecord, Record, Score, RECORD_ENCODED_LEN, SCORE_WORD_LEN};
pub use subject::{SubjectId, SUBJECT_LEN};

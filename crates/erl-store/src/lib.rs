//! Off-chain content-addressed storage for the Exam Result Ledger.
//!
//! The full record set of a batch is too large to keep on-chain, so it is
//! stored here as a [`ResultDocument`] and the ledger keeps only its
//! [`ContentHandle`](erl_types::ContentHandle) plus the Merkle root.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- one file per blob under a root directory
//!
//! # Design Rules
//!
//! 1. Content is immutable once written; the handle is derived from it.
//! 2. Every read re-derives the handle and refuses altered bytes.
//! 3. Concurrent reads are always safe.
//! 4. The store never interprets content.

pub mod document;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use document::{ResultDocument, DOCUMENT_VERSION};
pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;

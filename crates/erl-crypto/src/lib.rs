//! Merkle commitment engine for the Exam Result Ledger.
//!
//! A result batch is committed on-chain as a single Keccak-256 Merkle root
//! while the full record set lives in off-chain storage. This crate builds
//! that root, verifies a record set against a published root, and issues
//! and checks per-record inclusion proofs.
//!
//! Construction:
//!
//! 1. Sort records ascending by subject bytes (see [`CanonicalBatch`]).
//! 2. `leaf = H(subject(20) || score(32, big-endian))`.
//! 3. Pair nodes left to right, `parent = H(left || right)`; an odd last
//!    node moves up unchanged.
//! 4. An empty batch commits to the all-zero digest; a single record's root
//!    is its leaf.
//!
//! All hashing wraps established libraries (`sha3`, `blake3`).

pub mod canonical;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod merkle;

pub use canonical::{CanonicalBatch, DuplicatePolicy};
pub use engine::{
    commit, prove_inclusion, verify, verify_inclusion, CommitmentEngine, EngineConfig,
    InclusionProof,
};
pub use error::{EngineError, EngineResult};
pub use hasher::{keccak256, ContentHasher, HashScheme};
pub use merkle::{MerkleProof, MerkleTree, PathStep, Side};

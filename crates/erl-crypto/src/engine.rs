use erl_types::{Hash256, RawRecord, Record, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::{CanonicalBatch, DuplicatePolicy};
use crate::error::{EngineError, EngineResult};
use crate::hasher::HashScheme;
use crate::merkle::{self, MerkleProof, MerkleTree};

/// Knobs shared by producer and verifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheme: HashScheme,
    pub duplicates: DuplicatePolicy,
}

/// Proof that one record belongs to a committed batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub subject: SubjectId,
    pub scheme: HashScheme,
    #[serde(flatten)]
    pub proof: MerkleProof,
}

/// Builds and checks Merkle commitments over result records.
///
/// Pure and synchronous: identical inputs always give identical outputs and
/// the engine holds nothing but its configuration, so one value can be shared
/// freely across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitmentEngine {
    config: EngineConfig,
}

impl CommitmentEngine {
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn scheme(&self) -> HashScheme {
        self.config.scheme
    }

    /// Leaf digest of a single record.
    pub fn leaf_hash(&self, record: &Record) -> Hash256 {
        self.config.scheme.hash_leaf(&record.encode())
    }

    /// Sort by subject and apply the duplicate policy.
    pub fn canonicalize(&self, records: &[Record]) -> EngineResult<CanonicalBatch> {
        CanonicalBatch::new(records, self.config.duplicates)
    }

    /// Normalize boundary rows, failing on the first malformed one.
    pub fn normalize(raw: &[RawRecord]) -> EngineResult<Vec<Record>> {
        raw.iter()
            .enumerate()
            .map(|(index, row)| {
                row.normalize()
                    .map_err(|source| EngineError::MalformedRecord { index, source })
            })
            .collect()
    }

    /// Root digest of a record set.
    pub fn commit(&self, records: &[Record]) -> EngineResult<Hash256> {
        let batch = self.canonicalize(records)?;
        Ok(self.commit_batch(&batch))
    }

    /// Root digest of unvalidated rows. Nothing is hashed unless every row
    /// normalizes.
    pub fn commit_raw(&self, raw: &[RawRecord]) -> EngineResult<Hash256> {
        let records = Self::normalize(raw)?;
        self.commit(&records)
    }

    /// Root digest of an already canonical batch.
    pub fn commit_batch(&self, batch: &CanonicalBatch) -> Hash256 {
        let leaves = self.leaves(batch);
        let root = merkle::compute_root(leaves, self.config.scheme);
        debug!(
            leaves = batch.len(),
            scheme = %self.config.scheme,
            root = %root.short_hex(),
            "computed batch root"
        );
        root
    }

    /// Full tree over a canonical batch, for proof generation.
    pub fn tree(&self, batch: &CanonicalBatch) -> MerkleTree {
        MerkleTree::from_leaves(self.leaves(batch), self.config.scheme)
    }

    /// Recompute the root of `records` and compare it with `claimed`.
    ///
    /// `Ok(false)` means the records do not match the claimed root.
    pub fn verify(&self, records: &[Record], claimed: &Hash256) -> EngineResult<bool> {
        let recomputed = self.commit(records)?;
        let matches = recomputed == *claimed;
        if !matches {
            debug!(
                claimed = %claimed.short_hex(),
                recomputed = %recomputed.short_hex(),
                "root mismatch"
            );
        }
        Ok(matches)
    }

    /// Inclusion proof for `subject`, or `Ok(None)` if it is not in the batch.
    pub fn prove_inclusion(
        &self,
        records: &[Record],
        subject: &SubjectId,
    ) -> EngineResult<Option<InclusionProof>> {
        let batch = self.canonicalize(records)?;
        Ok(self.prove_in_batch(&batch, subject))
    }

    /// Inclusion proof against an already canonical batch.
    pub fn prove_in_batch(
        &self,
        batch: &CanonicalBatch,
        subject: &SubjectId,
    ) -> Option<InclusionProof> {
        let index = batch.position(subject)?;
        let proof = self.tree(batch).proof(index)?;
        Some(InclusionProof {
            subject: *subject,
            scheme: self.config.scheme,
            proof,
        })
    }

    /// Check that `record` is included under `root` according to `proof`.
    pub fn verify_inclusion(&self, proof: &InclusionProof, record: &Record, root: &Hash256) -> bool {
        if proof.scheme != self.config.scheme || proof.subject != record.subject {
            return false;
        }
        proof
            .proof
            .verify(self.leaf_hash(record), root, self.config.scheme)
    }

    fn leaves(&self, batch: &CanonicalBatch) -> Vec<Hash256> {
        batch.records().iter().map(|r| self.leaf_hash(r)).collect()
    }
}

/// [`CommitmentEngine::commit`] with the default configuration.
pub fn commit(records: &[Record]) -> EngineResult<Hash256> {
    CommitmentEngine::default().commit(records)
}

/// [`CommitmentEngine::verify`] with the default configuration.
pub fn verify(records: &[Record], claimed: &Hash256) -> EngineResult<bool> {
    CommitmentEngine::default().verify(records, claimed)
}

/// [`CommitmentEngine::prove_inclusion`] with the default configuration.
pub fn prove_inclusion(
    records: &[Record],
    subject: &SubjectId,
) -> EngineResult<Option<InclusionProof>> {
    CommitmentEngine::default().prove_inclusion(records, subject)
}

/// [`CommitmentEngine::verify_inclusion`] with the default configuration.
pub fn verify_inclusion(proof: &InclusionProof, record: &Record, root: &Hash256) -> bool {
    CommitmentEngine::default().verify_inclusion(proof, record, root)
}

use erl_crypto::{HashScheme, InclusionProof};
use erl_ledger::BatchStatus;
use erl_types::{BatchKey, ContentHandle, Hash256, Record, SubjectId};
use serde::{Deserialize, Serialize};

/// Outcome of publishing a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub key: BatchKey,
    pub merkle_root: Hash256,
    pub content_handle: ContentHandle,
    pub record_count: usize,
    pub status: BatchStatus,
}

/// Result of re-deriving a batch's root from its stored document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub key: BatchKey,
    pub status: BatchStatus,
    pub uploader: SubjectId,
    pub confirmations: Vec<SubjectId>,
    pub content_handle: ContentHandle,
    pub scheme: HashScheme,
    pub ledger_root: Hash256,
    pub computed_root: Hash256,
    pub record_count: usize,
}

impl AuditReport {
    /// `true` when the stored records reproduce the root recorded on the ledger.
    pub fn root_matches(&self) -> bool {
        self.ledger_root == self.computed_root
    }
}

/// One student's record in a validated batch, with the evidence for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentResult {
    pub key: BatchKey,
    pub record: Record,
    pub proof: InclusionProof,
    pub ledger_root: Hash256,
    /// Whether `proof` takes `record` to `ledger_root`.
    pub verified: bool,
}

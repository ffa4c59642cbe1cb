use erl_crypto::{CommitmentEngine, EngineConfig};
use erl_ledger::{BatchEntry, BatchStatus, LedgerError, LedgerReader, LedgerWriter};
use erl_store::{ContentStore, ResultDocument};
use erl_types::{BatchKey, RawRecord, Record, SubjectId};
use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::report::{AuditReport, PublishReceipt, StudentResult};

/// Ties the commitment engine, the content store, and the ledger together.
///
/// Publishing stores the canonical result document first and records its
/// handle and root on the ledger second, so a ledger entry never points at
/// content that was not written.
pub struct ResultRegistry<S, L> {
    engine: CommitmentEngine,
    store: S,
    ledger: L,
}

impl<S, L> ResultRegistry<S, L>
where
    S: ContentStore,
    L: LedgerWriter + LedgerReader,
{
    /// Create a registry using the default engine configuration.
    pub fn new(store: S, ledger: L) -> Self {
        Self {
            engine: CommitmentEngine::default(),
            store,
            ledger,
        }
    }

    pub fn with_engine(mut self, engine: CommitmentEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &CommitmentEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_parts(self) -> (S, L) {
        (self.store, self.ledger)
    }

    // ---- Publication ----

    /// Canonicalize, commit, store, and record a batch.
    pub fn publish(
        &self,
        key: &BatchKey,
        records: &[Record],
        uploader: SubjectId,
    ) -> RegistryResult<PublishReceipt> {
        if self.ledger.batch(key)?.is_some() {
            return Err(LedgerError::BatchExists(key.clone()).into());
        }

        let batch = self.engine.canonicalize(records)?;
        let root = self.engine.commit_batch(&batch);
        let handle = ResultDocument::from_batch(&batch).save(&self.store)?;
        let entry = self
            .ledger
            .record_batch(key, handle, root, self.engine.scheme(), uploader)?;

        info!(
            batch = %key,
            records = batch.len(),
            root = %root.short_hex(),
            handle = %handle.short_hex(),
            "batch published"
        );
        Ok(PublishReceipt {
            key: key.clone(),
            merkle_root: root,
            content_handle: handle,
            record_count: batch.len(),
            status: entry.status(),
        })
    }

    /// [`publish`](Self::publish) for unvalidated input rows.
    pub fn publish_raw(
        &self,
        key: &BatchKey,
        rows: &[RawRecord],
        uploader: SubjectId,
    ) -> RegistryResult<PublishReceipt> {
        let records = CommitmentEngine::normalize(rows)?;
        self.publish(key, &records, uploader)
    }

    pub fn confirm(&self, key: &BatchKey, validator: SubjectId) -> RegistryResult<BatchStatus> {
        Ok(self.ledger.confirm(key, validator)?.status())
    }

    // ---- Verification ----

    /// Fetch the stored document for a batch and recompute its root under
    /// the scheme the batch was published with.
    pub fn audit(&self, key: &BatchKey) -> RegistryResult<AuditReport> {
        let entry = self.entry(key)?;
        let document = ResultDocument::load(&self.store, &entry.content_handle)?;
        let computed_root = self.engine_for(&entry).commit(&document.records)?;

        let report = AuditReport {
            key: key.clone(),
            status: entry.status(),
            uploader: entry.uploader,
            confirmations: entry.confirmations.clone(),
            content_handle: entry.content_handle,
            scheme: entry.scheme,
            ledger_root: entry.merkle_root,
            computed_root,
            record_count: document.records.len(),
        };
        if report.root_matches() {
            debug!(batch = %key, "audit passed");
        } else {
            warn!(
                batch = %key,
                ledger = %report.ledger_root.short_hex(),
                computed = %report.computed_root.short_hex(),
                "audit root mismatch"
            );
        }
        Ok(report)
    }

    /// A student's record in a validated batch together with its inclusion
    /// proof. `Ok(None)` when the student has no record in the batch.
    pub fn student_result(
        &self,
        key: &BatchKey,
        subject: &SubjectId,
    ) -> RegistryResult<Option<StudentResult>> {
        let entry = self.entry(key)?;
        if !entry.is_validated() {
            return Err(RegistryError::NotValidated(key.clone()));
        }
        self.lookup(&entry, subject)
    }

    /// Every validated batch holding a record for `subject`, in key order.
    pub fn transcript(&self, subject: &SubjectId) -> RegistryResult<Vec<StudentResult>> {
        let mut results = Vec::new();
        for entry in self.ledger.batches()? {
            if !entry.is_validated() {
                continue;
            }
            if let Some(result) = self.lookup(&entry, subject)? {
                results.push(result);
            }
        }
        Ok(results)
    }

    fn entry(&self, key: &BatchKey) -> RegistryResult<BatchEntry> {
        self.ledger
            .batch(key)?
            .ok_or_else(|| RegistryError::BatchNotFound(key.clone()))
    }

    /// Engine matching the scheme a batch's root was computed with.
    fn engine_for(&self, entry: &BatchEntry) -> CommitmentEngine {
        CommitmentEngine::new(EngineConfig {
            scheme: entry.scheme,
            ..self.engine.config()
        })
    }

    fn lookup(
        &self,
        entry: &BatchEntry,
        subject: &SubjectId,
    ) -> RegistryResult<Option<StudentResult>> {
        let engine = self.engine_for(entry);
        let document = ResultDocument::load(&self.store, &entry.content_handle)?;
        let batch = engine.canonicalize(&document.records)?;
        let Some(record) = batch.get(subject).copied() else {
            return Ok(None);
        };
        let Some(proof) = engine.prove_in_batch(&batch, subject) else {
            return Ok(None);
        };
        let verified = engine.verify_inclusion(&proof, &record, &entry.merkle_root);
        if !verified {
            warn!(batch = %entry.key, subject = %subject.short(), "inclusion proof does not match ledger root");
        }
        Ok(Some(StudentResult {
            key: entry.key.clone(),
            record,
            proof,
            ledger_root: entry.merkle_root,
            verified,
        }))
    }
}

impl<S, L> std::fmt::Debug for ResultRegistry<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRegistry")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use erl_types::{BatchKey, Hash256, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{EventKind, LedgerEvent};
use crate::traits::LedgerReader;

/// Summary row kept by the index for one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedBatch {
    pub key: BatchKey,
    pub uploader: SubjectId,
    pub merkle_root: Hash256,
    pub validators: Vec<SubjectId>,
    pub uploaded_at: DateTime<Utc>,
    pub validated: bool,
}

/// Row in a batch's audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIndexEntry {
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub summary: String,
}

/// Query-side mirror of the ledger event feed.
///
/// The index follows the feed through a cursor and can lag behind the
/// ledger. It answers listing queries cheaply but is never authoritative:
/// verification always goes back to the ledger entry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchIndex {
    cursor: u64,
    batches: BTreeMap<BatchKey, IndexedBatch>,
    trails: BTreeMap<BatchKey, Vec<AuditIndexEntry>>,
}

impl BatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the last event ingested.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Pull and ingest every event past the cursor. Returns the number ingested.
    pub fn sync<R: LedgerReader + ?Sized>(&mut self, reader: &R) -> LedgerResult<usize> {
        let events = reader.events_since(self.cursor)?;
        let count = events.len();
        for event in &events {
            self.ingest(event)?;
        }
        if count > 0 {
            debug!(ingested = count, cursor = self.cursor, "batch index synced");
        }
        Ok(count)
    }

    /// Ingest one event. Events must arrive in feed order without gaps.
    pub fn ingest(&mut self, event: &LedgerEvent) -> LedgerResult<()> {
        let expected = self.cursor + 1;
        if event.seq != expected {
            return Err(LedgerError::IntegrityViolation {
                seq: event.seq,
                reason: format!("index expected seq {expected}"),
            });
        }

        let key = event.kind.key().clone();
        let summary = match &event.kind {
            EventKind::ResultUploaded {
                uploader,
                merkle_root,
                ..
            } => {
                self.batches.insert(
                    key.clone(),
                    IndexedBatch {
                        key: key.clone(),
                        uploader: *uploader,
                        merkle_root: *merkle_root,
                        validators: Vec::new(),
                        uploaded_at: event.recorded_at,
                        validated: false,
                    },
                );
                format!("uploaded by {} with root {}", uploader, merkle_root)
            }
            EventKind::ResultValidated { validator, .. } => {
                let row = self.row_mut(&key, event.seq)?;
                row.validators.push(*validator);
                format!("confirmed by {validator}")
            }
            EventKind::BatchFullyValidated { .. } => {
                let row = self.row_mut(&key, event.seq)?;
                row.validated = true;
                "fully validated".to_string()
            }
        };

        self.trails.entry(key).or_default().push(AuditIndexEntry {
            seq: event.seq,
            recorded_at: event.recorded_at,
            summary,
        });
        self.cursor = event.seq;
        Ok(())
    }

    fn row_mut(&mut self, key: &BatchKey, seq: u64) -> LedgerResult<&mut IndexedBatch> {
        self.batches
            .get_mut(key)
            .ok_or_else(|| LedgerError::IntegrityViolation {
                seq,
                reason: format!("event for unindexed batch {key}"),
            })
    }

    pub fn get(&self, key: &BatchKey) -> Option<&IndexedBatch> {
        self.batches.get(key)
    }

    pub fn pending(&self) -> Vec<&IndexedBatch> {
        self.batches.values().filter(|b| !b.validated).collect()
    }

    pub fn validated(&self) -> Vec<&IndexedBatch> {
        self.batches.values().filter(|b| b.validated).collect()
    }

    /// Pending batches a validator has not confirmed yet.
    pub fn awaiting(&self, validator: &SubjectId) -> Vec<&IndexedBatch> {
        self.batches
            .values()
            .filter(|b| !b.validated && !b.validators.contains(validator))
            .collect()
    }

    pub fn confirmed_by(&self, validator: &SubjectId) -> Vec<&IndexedBatch> {
        self.batches
            .values()
            .filter(|b| b.validators.contains(validator))
            .collect()
    }

    pub fn audit_trail(&self, key: &BatchKey) -> &[AuditIndexEntry] {
        self.trails.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;
    use crate::traits::LedgerWriter;
    use erl_crypto::HashScheme;
    use erl_types::ContentHandle;

    fn key(course: &str) -> BatchKey {
        BatchKey::new("2023/2024", "Second", course).unwrap()
    }

    fn seeded() -> InMemoryLedger {
        let ledger = InMemoryLedger::default();
        for course in ["CSC101", "MTH201"] {
            ledger
                .record_batch(
                    &key(course),
                    ContentHandle::from_hash([3; 32]),
                    Hash256::from_bytes([4; 32]),
                    HashScheme::Legacy,
                    SubjectId::repeat(0xaa),
                )
                .unwrap();
        }
        ledger
            .confirm(&key("CSC101"), SubjectId::repeat(0xb1))
            .unwrap();
        ledger
    }

    #[test]
    fn sync_mirrors_ledger() {
        let ledger = seeded();
        let mut index = BatchIndex::new();
        assert_eq!(index.sync(&ledger).unwrap(), 3);
        assert_eq!(index.cursor(), 3);
        assert_eq!(index.pending().len(), 2);
        assert!(index.validated().is_empty());
        assert_eq!(index.get(&key("CSC101")).unwrap().validators.len(), 1);
    }

    #[test]
    fn sync_is_incremental() {
        let ledger = seeded();
        let mut index = BatchIndex::new();
        index.sync(&ledger).unwrap();
        assert_eq!(index.sync(&ledger).unwrap(), 0);

        ledger
            .confirm(&key("CSC101"), SubjectId::repeat(0xb2))
            .unwrap();
        assert_eq!(index.sync(&ledger).unwrap(), 2);
        let validated = index.validated();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].key, key("CSC101"));
    }

    #[test]
    fn validator_queries() {
        let ledger = seeded();
        let mut index = BatchIndex::new();
        index.sync(&ledger).unwrap();

        let b1 = SubjectId::repeat(0xb1);
        let awaiting: Vec<_> = index.awaiting(&b1).iter().map(|b| b.key.clone()).collect();
        assert_eq!(awaiting, [key("MTH201")]);
        assert_eq!(index.confirmed_by(&b1).len(), 1);
        assert_eq!(index.awaiting(&SubjectId::repeat(0xb2)).len(), 2);
    }

    #[test]
    fn audit_trail_per_batch() {
        let ledger = seeded();
        let mut index = BatchIndex::new();
        index.sync(&ledger).unwrap();

        let trail = index.audit_trail(&key("CSC101"));
        assert_eq!(trail.len(), 2);
        assert!(trail[0].summary.starts_with("uploaded by"));
        assert!(trail[1].summary.starts_with("confirmed by"));
        assert!(index.audit_trail(&key("NONE")).is_empty());
    }

    #[test]
    fn out_of_order_event_rejected() {
        let ledger = seeded();
        let events = ledger.events_since(0).unwrap();
        let mut index = BatchIndex::new();
        assert!(matches!(
            index.ingest(&events[1]),
            Err(LedgerError::IntegrityViolation { seq: 2, .. })
        ));
        assert_eq!(index.cursor(), 0);
    }
}

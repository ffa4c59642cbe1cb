use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use erl_types::{BatchKey, SubjectId};

use crate::error::{LedgerError, LedgerResult};
use crate::records::{BatchEntry, EventKind, LedgerEvent};

/// Batch state folded from the event feed.
///
/// Every mutation goes through [`LedgerState::apply`], which checks an event
/// completely before touching anything. A rejected event leaves the state
/// unchanged. Nothing here depends on the current [`LedgerConfig`]: batch
/// thresholds travel on the upload events, so a feed replays the same way
/// under any configuration.
///
/// [`LedgerConfig`]: crate::LedgerConfig
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) batches: BTreeMap<BatchKey, BatchEntry>,
    pub(crate) events: Vec<LedgerEvent>,
    /// Every validator that has confirmed at least one batch.
    pub(crate) validators: BTreeSet<SubjectId>,
}

impl LedgerState {
    /// Rebuild state from a complete feed, enforcing contiguous sequence
    /// numbers and the same transition rules live writes obey.
    pub(crate) fn replay(events: Vec<LedgerEvent>) -> LedgerResult<Self> {
        let mut state = Self::default();
        for event in events {
            let seq = event.seq;
            let expected = state.next_seq();
            if seq != expected {
                return Err(LedgerError::IntegrityViolation {
                    seq,
                    reason: format!("expected seq {expected}, found {seq}"),
                });
            }
            state.apply(event).map_err(|e| LedgerError::IntegrityViolation {
                seq,
                reason: e.to_string(),
            })?;
        }

        let last = state.events.len() as u64;
        if let Some(entry) = state
            .batches
            .values()
            .find(|e| !e.is_validated() && e.confirmations.len() as u32 >= e.required_confirmations)
        {
            return Err(LedgerError::IntegrityViolation {
                seq: last,
                reason: format!("batch {} reached its threshold but was never validated", entry.key),
            });
        }
        Ok(state)
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.events.len() as u64 + 1
    }

    pub(crate) fn event(&self, recorded_at: DateTime<Utc>, kind: EventKind) -> LedgerEvent {
        LedgerEvent {
            seq: self.next_seq(),
            recorded_at,
            kind,
        }
    }

    pub(crate) fn apply(&mut self, event: LedgerEvent) -> LedgerResult<()> {
        match &event.kind {
            EventKind::ResultUploaded {
                key,
                uploader,
                content_handle,
                merkle_root,
                scheme,
                required_confirmations,
            } => {
                if self.batches.contains_key(key) {
                    return Err(LedgerError::BatchExists(key.clone()));
                }
                if content_handle.is_null() {
                    return Err(LedgerError::NullContentHandle(key.clone()));
                }
                if *required_confirmations == 0 {
                    return Err(LedgerError::InvalidConfig(
                        "required_confirmations must be at least 1".into(),
                    ));
                }
                self.batches.insert(
                    key.clone(),
                    BatchEntry {
                        key: key.clone(),
                        content_handle: *content_handle,
                        merkle_root: *merkle_root,
                        scheme: *scheme,
                        uploader: *uploader,
                        required_confirmations: *required_confirmations,
                        confirmations: Vec::new(),
                        uploaded_at: event.recorded_at,
                        validated_at: None,
                    },
                );
            }
            EventKind::ResultValidated { key, validator } => {
                let entry = self
                    .batches
                    .get_mut(key)
                    .ok_or_else(|| LedgerError::BatchNotFound(key.clone()))?;
                if entry.is_validated() {
                    return Err(LedgerError::AlreadyValidated(key.clone()));
                }
                if entry.is_confirmed_by(validator) {
                    return Err(LedgerError::AlreadyConfirmed {
                        key: key.clone(),
                        validator: *validator,
                    });
                }
                entry.confirmations.push(*validator);
                self.validators.insert(*validator);
            }
            EventKind::BatchFullyValidated { key } => {
                let entry = self
                    .batches
                    .get_mut(key)
                    .ok_or_else(|| LedgerError::BatchNotFound(key.clone()))?;
                if entry.is_validated() {
                    return Err(LedgerError::AlreadyValidated(key.clone()));
                }
                if (entry.confirmations.len() as u32) < entry.required_confirmations {
                    return Err(LedgerError::IntegrityViolation {
                        seq: event.seq,
                        reason: format!(
                            "batch {key} validated with {} of {} confirmations",
                            entry.confirmations.len(),
                            entry.required_confirmations
                        ),
                    });
                }
                entry.validated_at = Some(event.recorded_at);
            }
        }
        self.events.push(event);
        Ok(())
    }
}

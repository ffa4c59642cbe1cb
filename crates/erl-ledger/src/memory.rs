use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use erl_crypto::HashScheme;
use erl_types::{BatchKey, ContentHandle, Hash256, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::records::{BatchEntry, EventKind, LedgerEvent};
use crate::replay::LedgerState;
use crate::traits::{LedgerReader, LedgerWriter};

/// Serializable form of an [`InMemoryLedger`]: its complete event feed.
///
/// Batch state is never stored directly; loading a snapshot replays the feed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub events: Vec<LedgerEvent>,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))
    }
}

/// In-memory ledger for tests, local use, and embedding.
pub struct InMemoryLedger {
    config: LedgerConfig,
    inner: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: RwLock::new(LedgerState::default()),
        })
    }

    /// Restore a ledger by replaying a snapshot's event feed.
    pub fn from_snapshot(config: LedgerConfig, snapshot: LedgerSnapshot) -> LedgerResult<Self> {
        config.validate()?;
        let state = LedgerState::replay(snapshot.events)?;
        debug!(
            batches = state.batches.len(),
            events = state.events.len(),
            "ledger restored from snapshot"
        );
        Ok(Self {
            config,
            inner: RwLock::new(state),
        })
    }

    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            events: self.read()?.events.clone(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned("read"))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned("write"))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self {
            config: LedgerConfig::default(),
            inner: RwLock::new(LedgerState::default()),
        }
    }
}

impl LedgerWriter for InMemoryLedger {
    fn record_batch(
        &self,
        key: &BatchKey,
        content_handle: ContentHandle,
        merkle_root: Hash256,
        scheme: HashScheme,
        uploader: SubjectId,
    ) -> LedgerResult<BatchEntry> {
        let mut state = self.write()?;
        let event = state.event(
            Utc::now(),
            EventKind::ResultUploaded {
                key: key.clone(),
                uploader,
                content_handle,
                merkle_root,
                scheme,
                required_confirmations: self.config.required_confirmations,
            },
        );
        state.apply(event)?;
        info!(
            batch = %key,
            uploader = %uploader.short(),
            root = %merkle_root.short_hex(),
            %scheme,
            "batch recorded"
        );
        state
            .batches
            .get(key)
            .cloned()
            .ok_or_else(|| LedgerError::BatchNotFound(key.clone()))
    }

    fn confirm(&self, key: &BatchKey, validator: SubjectId) -> LedgerResult<BatchEntry> {
        let mut state = self.write()?;
        if !state.validators.contains(&validator)
            && state.validators.len() as u32 >= self.config.max_validators
        {
            return Err(LedgerError::TooManyValidators {
                validator,
                max: self.config.max_validators,
            });
        }
        let event = state.event(
            Utc::now(),
            EventKind::ResultValidated {
                key: key.clone(),
                validator,
            },
        );
        state.apply(event)?;

        let entry = state
            .batches
            .get(key)
            .ok_or_else(|| LedgerError::BatchNotFound(key.clone()))?;
        let reached = entry.confirmations.len() as u32 >= entry.required_confirmations;
        info!(
            batch = %key,
            validator = %validator.short(),
            confirmations = entry.confirmations.len(),
            required = entry.required_confirmations,
            "batch confirmed"
        );

        if reached {
            let event = state.event(
                Utc::now(),
                EventKind::BatchFullyValidated { key: key.clone() },
            );
            state.apply(event)?;
            info!(batch = %key, "batch fully validated");
        }

        state
            .batches
            .get(key)
            .cloned()
            .ok_or_else(|| LedgerError::BatchNotFound(key.clone()))
    }
}

impl LedgerReader for InMemoryLedger {
    fn batch(&self, key: &BatchKey) -> LedgerResult<Option<BatchEntry>> {
        Ok(self.read()?.batches.get(key).cloned())
    }

    fn batches(&self) -> LedgerResult<Vec<BatchEntry>> {
        Ok(self.read()?.batches.values().cloned().collect())
    }

    fn batches_by_uploader(&self, uploader: &SubjectId) -> LedgerResult<Vec<BatchEntry>> {
        Ok(self
            .read()?
            .batches
            .values()
            .filter(|entry| entry.uploader == *uploader)
            .cloned()
            .collect())
    }

    fn events_since(&self, after: u64) -> LedgerResult<Vec<LedgerEvent>> {
        let state = self.read()?;
        let start = usize::try_from(after)
            .unwrap_or(usize::MAX)
            .min(state.events.len());
        Ok(state.events[start..].to_vec())
    }

    fn batch_count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.batches.len() as u64)
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryLedger");
        s.field("config", &self.config);
        if let Ok(state) = self.inner.read() {
            s.field("batches", &state.batches.len())
                .field("validators", &state.validators.len())
                .field("events", &state.events.len());
        }
        s.finish()
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Confirmation policy for live writes.
///
/// Neither value is re-checked when a feed is replayed: each batch keeps the
/// threshold it was uploaded with, and validators admitted under an earlier
/// cap stay admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Distinct validator confirmations needed before a new batch is validated.
    pub required_confirmations: u32,
    /// Number of distinct validators the ledger accepts confirmations from.
    #[serde(alias = "max_validators_per_batch")]
    pub max_validators: u32,
}

impl LedgerConfig {
    pub const DEFAULT_REQUIRED_CONFIRMATIONS: u32 = 2;
    pub const DEFAULT_MAX_VALIDATORS: u32 = 5;

    pub fn validate(&self) -> LedgerResult<()> {
        if self.required_confirmations == 0 {
            return Err(LedgerError::InvalidConfig(
                "required_confirmations must be at least 1".into(),
            ));
        }
        if self.required_confirmations > self.max_validators {
            return Err(LedgerError::InvalidConfig(format!(
                "required_confirmations ({}) exceeds max_validators ({})",
                self.required_confirmations, self.max_validators
            )));
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            required_confirmations: Self::DEFAULT_REQUIRED_CONFIRMATIONS,
            max_validators: Self::DEFAULT_MAX_VALIDATORS,
        }
    }
}

use chrono::{DateTime, Utc};
use erl_crypto::HashScheme;
use erl_types::{BatchKey, ContentHandle, Hash256, SubjectId};
use serde::{Deserialize, Serialize};

/// One published result batch as the ledger holds it.
///
/// The content handle, Merkle root and the scheme that produced the root are
/// fixed at upload time. Only the confirmation list grows afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub key: BatchKey,
    pub content_handle: ContentHandle,
    pub merkle_root: Hash256,
    #[serde(default)]
    pub scheme: HashScheme,
    pub uploader: SubjectId,
    pub required_confirmations: u32,
    pub confirmations: Vec<SubjectId>,
    pub uploaded_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl BatchEntry {
    pub fn status(&self) -> BatchStatus {
        if self.validated_at.is_some() {
            BatchStatus::Validated
        } else {
            BatchStatus::Pending {
                confirmations: self.confirmations.len() as u32,
                required: self.required_confirmations,
            }
        }
    }

    pub fn is_validated(&self) -> bool {
        self.validated_at.is_some()
    }

    pub fn is_confirmed_by(&self, validator: &SubjectId) -> bool {
        self.confirmations.contains(validator)
    }
}

/// Lifecycle of a batch: pending until enough distinct validators confirm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchStatus {
    Pending { confirmations: u32, required: u32 },
    Validated,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending {
                confirmations,
                required,
            } => write!(f, "pending ({confirmations}/{required})"),
            Self::Validated => f.write_str("validated"),
        }
    }
}

/// Entry in the append-only event feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// 1-based position in the feed.
    pub seq: u64,
    pub recorded_at: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ResultUploaded {
        key: BatchKey,
        uploader: SubjectId,
        content_handle: ContentHandle,
        merkle_root: Hash256,
        /// Feeds written before the scheme was recorded decode as legacy.
        #[serde(default)]
        scheme: HashScheme,
        required_confirmations: u32,
    },
    ResultValidated {
        key: BatchKey,
        validator: SubjectId,
    },
    BatchFullyValidated {
        key: BatchKey,
    },
}

impl EventKind {
    pub fn key(&self) -> &BatchKey {
        match self {
            Self::ResultUploaded { key, .. }
            | Self::ResultValidated { key, .. }
            | Self::BatchFullyValidated { key } => key,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResultUploaded { .. } => "result_uploaded",
            Self::ResultValidated { .. } => "result_validated",
            Self::BatchFullyValidated { .. } => "batch_fully_validated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> BatchEntry {
        BatchEntry {
            key: BatchKey::new("2023/2024", "First", "CSC101").unwrap(),
            content_handle: ContentHandle::from_hash([5; 32]),
            merkle_root: Hash256::from_bytes([6; 32]),
            scheme: HashScheme::Legacy,
            uploader: SubjectId::repeat(0xaa),
            required_confirmations: 2,
            confirmations: vec![SubjectId::repeat(0xbb)],
            uploaded_at: Utc::now(),
            validated_at: None,
        }
    }

    #[test]
    fn pending_status_counts_confirmations() {
        let entry = entry();
        assert_eq!(
            entry.status(),
            BatchStatus::Pending {
                confirmations: 1,
                required: 2
            }
        );
        assert_eq!(entry.status().to_string(), "pending (1/2)");
        assert!(entry.is_confirmed_by(&SubjectId::repeat(0xbb)));
        assert!(!entry.is_confirmed_by(&SubjectId::repeat(0xcc)));
    }

    #[test]
    fn validated_status() {
        let mut entry = entry();
        entry.validated_at = Some(Utc::now());
        assert_eq!(entry.status(), BatchStatus::Validated);
        assert!(entry.is_validated());
    }

    #[test]
    fn event_json_is_tagged() {
        let kind = EventKind::BatchFullyValidated {
            key: entry().key,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "batch_fully_validated");
        assert_eq!(json["key"]["course_code"], "CSC101");
        assert_eq!(kind.name(), "batch_fully_validated");
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = entry();
        let json = serde_json::to_string(&entry).unwrap();
        let back: BatchEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn upload_event_carries_scheme() {
        let kind = EventKind::ResultUploaded {
            key: entry().key,
            uploader: SubjectId::repeat(0xaa),
            content_handle: ContentHandle::from_hash([5; 32]),
            merkle_root: Hash256::from_bytes([6; 32]),
            scheme: HashScheme::DomainSeparated,
            required_confirmations: 2,
        };
        let mut json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["scheme"], "domain-separated");

        // Older feeds have no scheme field.
        json.as_object_mut().unwrap().remove("scheme");
        let old: EventKind = serde_json::from_value(json).unwrap();
        assert!(matches!(
            old,
            EventKind::ResultUploaded {
                scheme: HashScheme::Legacy,
                ..
            }
        ));
    }
}

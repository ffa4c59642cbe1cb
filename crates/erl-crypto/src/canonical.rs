use erl_types::{Record, SubjectId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// What canonicalization does when two records share a subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with [`EngineError::DuplicateSubject`].
    #[default]
    Reject,
    /// Keep the record that appeared first in the input.
    KeepFirst,
    /// Keep the record that appeared last in the input.
    KeepLast,
}

/// Records sorted ascending by subject bytes, one record per subject.
///
/// Leaf order is taken from this sequence, which makes the root independent
/// of input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalBatch {
    records: Vec<Record>,
}

impl CanonicalBatch {
    pub fn new(records: &[Record], policy: DuplicatePolicy) -> EngineResult<Self> {
        let mut sorted = records.to_vec();
        // Stable: equal subjects keep their input order for KeepFirst/KeepLast.
        sorted.sort_by(|a, b| a.subject.cmp(&b.subject));

        let before = sorted.len();
        match policy {
            DuplicatePolicy::Reject => {
                if let Some(pair) = sorted.windows(2).find(|w| w[0].subject == w[1].subject) {
                    return Err(EngineError::DuplicateSubject(pair[0].subject));
                }
            }
            DuplicatePolicy::KeepFirst => sorted.dedup_by(|later, kept| later.subject == kept.subject),
            DuplicatePolicy::KeepLast => sorted.dedup_by(|later, kept| {
                if later.subject == kept.subject {
                    *kept = *later;
                    true
                } else {
                    false
                }
            }),
        }
        if sorted.len() != before {
            warn!(
                dropped = before - sorted.len(),
                ?policy,
                "collapsed duplicate subjects"
            );
        }

        Ok(Self { records: sorted })
    }

    /// Records in canonical order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Leaf index of `subject`, if present.
    pub fn position(&self, subject: &SubjectId) -> Option<usize> {
        self.records
            .binary_search_by(|r| r.subject.cmp(subject))
            .ok()
    }

    pub fn get(&self, subject: &SubjectId) -> Option<&Record> {
        self.position(subject).map(|i| &self.records[i])
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(byte: u8, score: u64) -> Record {
        Record::new(SubjectId::repeat(byte), score)
    }

    #[test]
    fn sorts_by_subject_bytes() {
        let batch =
            CanonicalBatch::new(&[rec(0x33, 92), rec(0x11, 85), rec(0x22, 78)], DuplicatePolicy::Reject)
                .unwrap();
        let subjects: Vec<u8> = batch.records().iter().map(|r| r.subject.as_bytes()[0]).collect();
        assert_eq!(subjects, vec![0x11, 0x22, 0x33]);
    }

    #[test]
    fn empty_input() {
        let batch = CanonicalBatch::new(&[], DuplicatePolicy::Reject).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn reject_policy_names_the_duplicate() {
        let err = CanonicalBatch::new(&[rec(1, 10), rec(2, 20), rec(1, 30)], DuplicatePolicy::Reject)
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicateSubject(SubjectId::repeat(1)));
    }

    #[test]
    fn identical_duplicates_are_still_rejected() {
        assert!(CanonicalBatch::new(&[rec(1, 10), rec(1, 10)], DuplicatePolicy::Reject).is_err());
    }

    #[test]
    fn keep_first_uses_input_order() {
        let batch = CanonicalBatch::new(
            &[rec(1, 10), rec(2, 20), rec(1, 30), rec(1, 40)],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(batch.records(), &[rec(1, 10), rec(2, 20)]);
    }

    #[test]
    fn keep_last_uses_input_order() {
        let batch = CanonicalBatch::new(
            &[rec(1, 10), rec(2, 20), rec(1, 30), rec(1, 40)],
            DuplicatePolicy::KeepLast,
        )
        .unwrap();
        assert_eq!(batch.records(), &[rec(1, 40), rec(2, 20)]);
    }

    #[test]
    fn position_and_get() {
        let batch =
            CanonicalBatch::new(&[rec(9, 1), rec(3, 2), rec(6, 3)], DuplicatePolicy::Reject).unwrap();
        assert_eq!(batch.position(&SubjectId::repeat(3)), Some(0));
        assert_eq!(batch.position(&SubjectId::repeat(9)), Some(2));
        assert_eq!(batch.position(&SubjectId::repeat(4)), None);
        assert_eq!(batch.get(&SubjectId::repeat(6)), Some(&rec(6, 3)));
    }
}

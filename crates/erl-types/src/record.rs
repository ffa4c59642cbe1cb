use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::subject::{SubjectId, SUBJECT_LEN};

/// Width of the score word in the packed encoding (a 256-bit ledger word).
pub const SCORE_WORD_LEN: usize = 32;

/// Length of a packed record: `subject || score_word`.
pub const RECORD_ENCODED_LEN: usize = SUBJECT_LEN + SCORE_WORD_LEN;

/// Largest integer an IEEE-754 double represents exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// A non-negative integer result.
///
/// Domain convention bounds scores to 0..=100 but the commitment scheme does
/// not, so no bound is enforced here. Values are limited to `u64` even though
/// the encoded word is 256 bits wide; the upper 24 bytes are always zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u64);

impl Score {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian 32-byte word, matching the ledger's uint256 field.
    pub fn to_word(&self) -> [u8; SCORE_WORD_LEN] {
        let mut word = [0u8; SCORE_WORD_LEN];
        word[SCORE_WORD_LEN - 8..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl From<u64> for Score {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subject's result, in canonical form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub subject: SubjectId,
    pub score: Score,
}

impl Record {
    pub fn new(subject: SubjectId, score: impl Into<Score>) -> Self {
        Self {
            subject,
            score: score.into(),
        }
    }

    /// Packed encoding hashed into a leaf: 20 address bytes followed by the
    /// 32-byte big-endian score word.
    pub fn encode(&self) -> [u8; RECORD_ENCODED_LEN] {
        let mut out = [0u8; RECORD_ENCODED_LEN];
        out[..SUBJECT_LEN].copy_from_slice(self.subject.as_bytes());
        out[SUBJECT_LEN..].copy_from_slice(&self.score.to_word());
        out
    }
}

/// A result row as it arrives from a spreadsheet export, a form, or an
/// indexer response.
///
/// Producers disagree on the subject field name and on whether the score is
/// a number or a string. [`RawRecord::normalize`] is the single place those
/// shapes are reconciled into a [`Record`]; nothing past the boundary guesses
/// field names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "address", alias = "wallet", alias = "student")]
    pub subject: Option<String>,
    #[serde(default)]
    pub score: Option<Value>,
}

impl RawRecord {
    pub fn new(subject: impl Into<String>, score: impl Into<Value>) -> Self {
        Self {
            subject: Some(subject.into()),
            score: Some(score.into()),
        }
    }

    /// Validate and convert into a canonical [`Record`].
    pub fn normalize(&self) -> Result<Record, TypeError> {
        let subject = match self.subject.as_deref().map(str::trim) {
            None | Some("") => return Err(TypeError::MissingField("subject")),
            Some(s) => SubjectId::from_hex(s)?,
        };
        let score = match &self.score {
            None | Some(Value::Null) => return Err(TypeError::MissingField("score")),
            Some(value) => parse_score(value)?,
        };
        Ok(Record { subject, score })
    }
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        Self::new(record.subject.to_hex(), record.score.value())
    }
}

fn parse_score(value: &Value) -> Result<Score, TypeError> {
    let invalid = |reason| TypeError::InvalidScore {
        value: value.to_string(),
        reason,
    };
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(Score(v));
            }
            if n.as_i64().is_some() {
                return Err(invalid("negative"));
            }
            n.as_f64()
                .ok_or_else(|| invalid("not representable"))
                .and_then(|f| integral_float(f).map_err(invalid))
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(invalid("empty"));
            }
            if let Ok(v) = s.parse::<u64>() {
                return Ok(Score(v));
            }
            if s.starts_with('-') {
                return Err(invalid("negative"));
            }
            if s.contains(|c: char| c == 'e' || c == 'E') {
                return Err(invalid("exponent notation"));
            }
            let f: f64 = s.parse().map_err(|_| invalid("not a number"))?;
            integral_float(f).map_err(invalid)
        }
        _ => Err(invalid("not a number")),
    }
}

fn integral_float(f: f64) -> Result<Score, &'static str> {
    if !f.is_finite() {
        return Err("not finite");
    }
    if f < 0.0 {
        return Err("negative");
    }
    if f.fract() != 0.0 {
        return Err("not an integer");
    }
    if f > MAX_EXACT_FLOAT {
        return Err("out of range");
    }
    Ok(Score(f as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn score_word_is_big_endian() {
        let word = Score::new(0x0102).to_word();
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert!(word[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn encode_layout() {
        let record = Record::new(SubjectId::repeat(0x11), 85);
        let enc = record.encode();
        assert_eq!(enc.len(), 52);
        assert_eq!(&enc[..20], &[0x11; 20]);
        assert_eq!(enc[51], 85);
        assert!(enc[20..51].iter().all(|b| *b == 0));
    }

    #[test]
    fn normalize_accepts_field_aliases() {
        for field in ["subject", "address", "wallet", "student"] {
            let text = format!(r#"{{"{field}": "{ADDR}", "score": 85}}"#);
            let raw: RawRecord = serde_json::from_str(&text).unwrap();
            let record = raw.normalize().unwrap();
            assert_eq!(record.subject, SubjectId::repeat(0x11), "field {field}");
            assert_eq!(record.score, Score::new(85));
        }
    }

    #[test]
    fn normalize_ignores_unknown_fields() {
        let raw: RawRecord =
            serde_json::from_value(json!({ "address": ADDR, "name": "Ada", "score": 70 }))
                .unwrap();
        assert_eq!(raw.normalize().unwrap().score.value(), 70);
    }

    #[test]
    fn normalize_accepts_string_and_integral_float_scores() {
        for score in [json!("85"), json!(" 85 "), json!(85.0), json!("85.0")] {
            let raw = RawRecord::new(ADDR, score.clone());
            assert_eq!(raw.normalize().unwrap().score.value(), 85, "score {score}");
        }
    }

    #[test]
    fn normalize_rejects_bad_scores() {
        for score in [
            json!(-1),
            json!("-3"),
            json!(85.5),
            json!("abc"),
            json!(""),
            json!(true),
            json!([85]),
            json!(1e300),
        ] {
            let raw = RawRecord::new(ADDR, score.clone());
            assert!(
                matches!(raw.normalize(), Err(TypeError::InvalidScore { .. })),
                "score {score} should be rejected"
            );
        }
    }

    #[test]
    fn string_scores_reject_exponent_notation() {
        for score in ["1e2", "1E2", "8.5e1"] {
            let raw = RawRecord::new(ADDR, score);
            assert_eq!(
                raw.normalize(),
                Err(TypeError::InvalidScore {
                    value: format!("\"{score}\""),
                    reason: "exponent notation"
                }),
                "score {score}"
            );
        }
        // A JSON number written with an exponent is still just a number.
        let raw: RawRecord =
            serde_json::from_str(&format!(r#"{{"address": "{ADDR}", "score": 1e2}}"#)).unwrap();
        assert_eq!(raw.normalize().unwrap().score.value(), 100);
    }

    #[test]
    fn scores_beyond_exact_float_range_rejected() {
        let raw = RawRecord::new(ADDR, "100000000000000000000");
        assert!(matches!(
            raw.normalize(),
            Err(TypeError::InvalidScore {
                reason: "out of range",
                ..
            })
        ));
        assert_eq!(
            RawRecord::new(ADDR, u64::MAX).normalize().unwrap().score.value(),
            u64::MAX
        );
    }

    #[test]
    fn normalize_rejects_missing_fields() {
        let no_subject = RawRecord {
            subject: None,
            score: Some(json!(1)),
        };
        assert_eq!(
            no_subject.normalize(),
            Err(TypeError::MissingField("subject"))
        );

        let blank_subject = RawRecord::new("  ", 1);
        assert_eq!(
            blank_subject.normalize(),
            Err(TypeError::MissingField("subject"))
        );

        let null_score = RawRecord {
            subject: Some(ADDR.into()),
            score: Some(Value::Null),
        };
        assert_eq!(null_score.normalize(), Err(TypeError::MissingField("score")));
    }

    #[test]
    fn normalize_rejects_malformed_address() {
        let raw = RawRecord::new("0x12", 50);
        assert!(matches!(
            raw.normalize(),
            Err(TypeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn record_serde_shape() {
        let record = Record::new(SubjectId::repeat(0x11), 92);
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value, json!({ "subject": ADDR, "score": 92 }));
        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn raw_from_record_normalizes_back() {
        let record = Record::new(SubjectId::repeat(0x33), 7);
        assert_eq!(RawRecord::from(record).normalize().unwrap(), record);
    }
}

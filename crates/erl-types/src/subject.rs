use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{decode_fixed, TypeError};

/// Width in bytes of a subject identifier (an account address).
pub const SUBJECT_LEN: usize = 20;

/// Fixed-length binary identifier of the student a result belongs to.
///
/// Canonically a 20-byte account address. Ordering is byte-wise
/// lexicographic over the raw bytes, which is the sort key used to
/// canonicalize a batch before leaf hashing. Textual forms are accepted with
/// or without a `0x` prefix and in any letter case; the display form is
/// always lowercase and prefixed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId([u8; SUBJECT_LEN]);

impl SubjectId {
    /// Create from raw address bytes.
    pub const fn from_bytes(bytes: [u8; SUBJECT_LEN]) -> Self {
        Self(bytes)
    }

    /// A subject whose every byte is `byte`. Handy for fixtures.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; SUBJECT_LEN])
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; SUBJECT_LEN] {
        &self.0
    }

    /// Lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Abbreviated form (`0x1234...abcd`) for terminal output.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}...{}", &full[..4], &full[full.len() - 4..])
    }

    /// Parse from 40 hex characters, optionally `0x`-prefixed.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_fixed::<SUBJECT_LEN>(s).map(Self)
    }
}

impl FromStr for SubjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.short())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; SUBJECT_LEN]> for SubjectId {
    fn from(bytes: [u8; SUBJECT_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{decode_fixed, TypeError};

/// A 256-bit digest: a Merkle leaf, an internal node, or a root.
///
/// The root of a batch is the value committed on the ledger. The all-zero
/// digest is reserved as the root of an empty batch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero digest.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap a pre-computed hash.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns `true` for the all-zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex with `0x` prefix, the form the ledger displays.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// First four bytes as hex, for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse 64 hex characters, optionally `0x`-prefixed.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl FromStr for Hash256 {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.short_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Hash256> for [u8; 32] {
    fn from(h: Hash256) -> Self {
        h.0
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_all_zeros() {
        assert!(Hash256::ZERO.is_zero());
        assert_eq!(Hash256::ZERO.as_bytes(), &[0u8; 32]);
        assert_eq!(
            Hash256::ZERO.to_hex(),
            "0x0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash256::from_bytes([0xab; 32]);
        assert_eq!(Hash256::from_hex(&h.to_hex()).unwrap(), h);
        assert_eq!(Hash256::from_hex(&h.to_hex()[2..]).unwrap(), h);
    }

    #[test]
    fn display_has_prefix_and_full_width() {
        let h = Hash256::from_bytes([1; 32]);
        let shown = h.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.len(), 66);
    }

    #[test]
    fn rejects_truncated() {
        assert!(matches!(
            Hash256::from_hex("0xabcd"),
            Err(TypeError::InvalidLength { expected: 32, .. })
        ));
    }

    #[test]
    fn serde_roundtrip() {
        let h = Hash256::from_bytes([7; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.starts_with("\"0x"));
        let parsed: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, h);
    }
}

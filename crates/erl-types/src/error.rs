use thiserror::Error;

/// Errors produced by type construction and boundary normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid score {value:?}: {reason}")]
    InvalidScore { value: String, reason: &'static str },

    #[error("batch key component `{0}` must not be empty")]
    EmptyKeyComponent(&'static str),
}

/// Decode a hex string (optional `0x` prefix) into a fixed-size array.
pub(crate) fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], TypeError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != N {
        return Err(TypeError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; N];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_both_prefixes() {
        let lower: [u8; 2] = decode_fixed("0xabcd").unwrap();
        let upper: [u8; 2] = decode_fixed("0XABCD").unwrap();
        let bare: [u8; 2] = decode_fixed("abcd").unwrap();
        assert_eq!(lower, [0xab, 0xcd]);
        assert_eq!(lower, upper);
        assert_eq!(lower, bare);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_fixed::<4>("0xabcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn decode_rejects_non_hex() {
        assert!(matches!(
            decode_fixed::<2>("0xzz11"),
            Err(TypeError::InvalidHex(_))
        ));
    }
}

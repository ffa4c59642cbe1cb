use erl_types::{ContentHandle, Hash256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Prefix of a leaf preimage under [`HashScheme::DomainSeparated`].
pub const LEAF_TAG: u8 = 0x00;
/// Prefix of an internal-node preimage under [`HashScheme::DomainSeparated`].
pub const NODE_TAG: u8 = 0x01;

/// How leaves and internal nodes are hashed.
///
/// Both schemes use Keccak-256. Producer and verifier must agree on the
/// scheme; roots produced under one never verify under the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashScheme {
    /// `leaf = H(subject || score)`, `node = H(left || right)`.
    ///
    /// Matches the roots already published on-chain. Leaf preimages are 52
    /// bytes and node preimages 64, so the two cannot be confused for this
    /// record encoding.
    #[default]
    Legacy,
    /// `leaf = H(0x00 || subject || score)`, `node = H(0x01 || left || right)`.
    DomainSeparated,
}

impl HashScheme {
    /// Hash the packed encoding of one record into a leaf digest.
    pub fn hash_leaf(&self, encoded: &[u8]) -> Hash256 {
        let mut hasher = Keccak256::new();
        if *self == Self::DomainSeparated {
            hasher.update([LEAF_TAG]);
        }
        hasher.update(encoded);
        Hash256::from_bytes(hasher.finalize().into())
    }

    /// Hash an ordered pair of child digests. Not commutative.
    pub fn hash_pair(&self, left: &Hash256, right: &Hash256) -> Hash256 {
        let mut hasher = Keccak256::new();
        if *self == Self::DomainSeparated {
            hasher.update([NODE_TAG]);
        }
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Hash256::from_bytes(hasher.finalize().into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::DomainSeparated => "domain-separated",
        }
    }
}

impl std::fmt::Display for HashScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Plain Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash256 {
    Hash256::from_bytes(Keccak256::digest(data).into())
}

/// Domain-separated BLAKE3 hasher deriving [`ContentHandle`]s.
///
/// The domain tag is prepended to every computation, so a result document
/// and any other blob with identical bytes hash differently.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for stored result documents.
    pub const DOCUMENT: Self = Self {
        domain: "erl-document-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ContentHandle {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ContentHandle::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected handle.
    pub fn verify(&self, data: &[u8], expected: &ContentHandle) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

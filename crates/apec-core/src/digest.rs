//! # Digests
//!
//! Two digest shapes circulate through the ledger:
//!
//! - [`Digest32`]: a bare 32-byte value. Merkle roots, sibling hashes in
//!   inclusion proofs, and record keys are all 32 bytes with no algorithm
//!   tag, because the algorithm is fixed by the construction that produced
//!   them.
//! - [`ContentDigest`]: a self-describing digest of `CanonicalBytes`, used
//!   for transaction ids and anything else that is content-addressed.
//!
//! Both serialize as lowercase hex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CryptoError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content-addressed digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: Digest32,
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.to_hex()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, so every content digest in the system is
/// computed over the JCS form of its input.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest {
        algorithm: DigestAlgorithm::Sha256,
        bytes: Digest32(bytes),
    }
}

// ---------------------------------------------------------------------------
// Digest32
// ---------------------------------------------------------------------------

/// A raw 32-byte digest.
///
/// Ordered bytewise, which is the order the Merkle construction uses when it
/// sorts sibling pairs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// The all-zero digest.
    pub const ZERO: Digest32 = Digest32([0u8; 32]);

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as 64 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// Parse from 64 hex chars (case-insensitive, surrounding whitespace ignored).
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        decode_hex_32(hex).map(Self)
    }
}

impl AsRef<[u8]> for Digest32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest32({}...)", &self.to_hex()[..16])
    }
}

impl std::fmt::Display for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Digest32 {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

/// Encode bytes as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode an even-length hex string into bytes.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, CryptoError> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return Err(CryptoError::DigestError(format!(
            "hex string has odd length {}",
            hex.len()
        )));
    }
    hex.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, chunk)| {
            let s = std::str::from_utf8(chunk)
                .map_err(|e| CryptoError::DigestError(format!("invalid hex: {e}")))?;
            u8::from_str_radix(s, 16)
                .map_err(|e| CryptoError::DigestError(format!("invalid hex at {i}: {e}")))
        })
        .collect()
}

/// Decode exactly 64 hex chars into 32 bytes.
pub fn decode_hex_32(hex: &str) -> Result<[u8; 32], CryptoError> {
    let hex = hex.trim();
    if hex.len() != 64 {
        return Err(CryptoError::DigestError(format!(
            "expected 64 hex chars, got {}",
            hex.len()
        )));
    }
    let bytes = decode_hex(hex)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

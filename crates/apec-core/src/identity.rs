//! # Identity Newtypes
//!
//! Provider and course ids are caller-chosen `u64`s; addresses are 32-byte
//! account identifiers (Ed25519 public keys). Keeping them as distinct types
//! prevents a course id being used to derive a provider key or vice versa.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{decode_hex_32, encode_hex};
use crate::error::CryptoError;

/// Globally unique provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub u64);

/// Course identifier, unique within one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(pub u64);

impl ProviderId {
    /// Little-endian encoding used in key derivation.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl CourseId {
    /// Little-endian encoding used in key derivation.
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "provider:{}", self.0)
    }
}

impl std::fmt::Display for CourseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "course:{}", self.0)
    }
}

/// A 32-byte ledger account address.
///
/// Addresses double as Ed25519 verifying keys: a transaction signed by the
/// matching private key proves the signer controls the address. As Merkle
/// leaves, the raw 32 bytes are what gets hashed.
///
/// Serializes as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
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

    /// Parse from 64 hex chars.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        decode_hex_32(hex)
            .map(Self)
            .map_err(|e| CryptoError::KeyError(format!("invalid address: {e}")))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..12])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

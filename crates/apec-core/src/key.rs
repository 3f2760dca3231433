//! # Deterministic Record Keys
//!
//! Every record on the ledger is stored at a key computed purely from its
//! identity tuple. "Key already occupied" is the uniqueness check: there is
//! no registry or counter to consult, and two writers racing on the same
//! identity contend on exactly one key.
//!
//! ## Derivation
//!
//! ```text
//! key = SHA256( u8(len(seed)) || seed || Σ ( u8(len(part)) || part ) )
//! ```
//!
//! Each component carries a one-byte length prefix, so no two distinct
//! tuples serialize to the same preimage. Ids are encoded as little-endian
//! `u64`; parent keys and addresses as their raw 32 bytes.
//!
//! | Record | Seed | Parts |
//! |---|---|---|
//! | Provider | `provider` | provider id |
//! | Course | `course` | provider key, course id |
//! | CommitmentRecord | `commitment` | provider key, course key |
//! | ClaimReceipt | `claim` | commitment key, claimant address |

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::digest::Digest32;
use crate::identity::{Address, CourseId, ProviderId};

/// Seed for provider keys.
pub const PROVIDER_SEED: &[u8] = b"provider";
/// Seed for course keys.
pub const COURSE_SEED: &[u8] = b"course";
/// Seed for commitment record keys.
pub const COMMITMENT_SEED: &[u8] = b"commitment";
/// Seed for claim receipt keys.
pub const CLAIM_SEED: &[u8] = b"claim";

/// A storage key derived from a record's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub Digest32);

impl RecordKey {
    /// Derive a key from a seed and an ordered list of identity parts.
    ///
    /// Components longer than 255 bytes are not used by any record kind;
    /// their length prefix saturates.
    pub fn derive(seed: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([len_prefix(seed)]);
        hasher.update(seed);
        for part in parts {
            hasher.update([len_prefix(part)]);
            hasher.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(Digest32(out))
    }

    /// Key of the provider with the given id.
    pub fn provider(id: ProviderId) -> Self {
        Self::derive(PROVIDER_SEED, &[id.to_le_bytes().as_slice()])
    }

    /// Key of a course under a provider.
    pub fn course(provider: &RecordKey, id: CourseId) -> Self {
        Self::derive(
            COURSE_SEED,
            &[provider.as_bytes().as_slice(), id.to_le_bytes().as_slice()],
        )
    }

    /// Key of the (single) commitment record for a course.
    pub fn commitment(provider: &RecordKey, course: &RecordKey) -> Self {
        Self::derive(
            COMMITMENT_SEED,
            &[provider.as_bytes().as_slice(), course.as_bytes().as_slice()],
        )
    }

    /// Key of the claim receipt for one claimant against one commitment.
    pub fn claim(commitment: &RecordKey, claimant: &Address) -> Self {
        Self::derive(
            CLAIM_SEED,
            &[commitment.as_bytes().as_slice(), claimant.as_bytes().as_slice()],
        )
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Render as 64 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Parse from 64 hex chars.
    pub fn from_hex(hex: &str) -> Result<Self, crate::error::CryptoError> {
        Digest32::from_hex(hex).map(Self)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for RecordKey {
    type Err = crate::error::CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

fn len_prefix(part: &[u8]) -> u8 {
    u8::try_from(part.len()).unwrap_or(u8::MAX)
}

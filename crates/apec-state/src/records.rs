//! # Ledger Records
//!
//! Four record kinds live in the store, each at a key derived from its own
//! fields (see `apec_core::key`):
//!
//! ```text
//! Provider ──< Course ──1 CommitmentRecord ──< ClaimReceipt
//! ```
//!
//! Records are written once and never mutated. There is no update path for
//! any of them; a commitment root in particular is fixed for the life of the
//! course.

use serde::{Deserialize, Serialize};

use apec_core::{Address, CourseId, Digest32, ProviderId, RecordKey, Timestamp};

// ─── Credential Tier ─────────────────────────────────────────────────

/// Which of the two credential kinds a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialTier {
    /// Open tier; any caller may obtain any number.
    Enrollment,
    /// Gated tier; one per allowlisted claimant per commitment.
    Certified,
}

impl CredentialTier {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrollment => "enrollment",
            Self::Certified => "certified",
        }
    }
}

impl std::fmt::Display for CredentialTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle to a credential token minted by the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHandle(pub u64);

impl std::fmt::Display for TokenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// An education provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Caller-chosen, globally unique id.
    pub id: ProviderId,
    /// Short display name.
    pub short_name: String,
    /// Address allowed to create courses and publish commitments.
    pub authority: Address,
    /// When the provider was registered.
    pub created_at: Timestamp,
}

impl Provider {
    /// Storage key of this provider.
    pub fn key(&self) -> RecordKey {
        RecordKey::provider(self.id)
    }
}

/// A course offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Id, unique within the owning provider.
    pub id: CourseId,
    /// Short display name.
    pub short_name: String,
    /// Key of the owning provider.
    pub provider: RecordKey,
    /// Address that created the course.
    pub authority: Address,
    /// When the course was created.
    pub created_at: Timestamp,
}

impl Course {
    /// Storage key of this course.
    pub fn key(&self) -> RecordKey {
        RecordKey::course(&self.provider, self.id)
    }
}

/// The published allowlist commitment for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    /// Key of the provider.
    pub provider: RecordKey,
    /// Key of the course.
    pub course: RecordKey,
    /// Merkle root over the eligible claimant addresses.
    pub root: Digest32,
    /// Size of the committed set as reported by the publisher. Not checked.
    pub member_count: u64,
    /// When the commitment was published.
    pub created_at: Timestamp,
}

impl CommitmentRecord {
    /// Storage key of this commitment.
    pub fn key(&self) -> RecordKey {
        RecordKey::commitment(&self.provider, &self.course)
    }
}

/// Proof that a claimant has redeemed their certified credential.
///
/// The receipt's existence is what blocks a second claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Key of the commitment claimed against.
    pub commitment: RecordKey,
    /// The allowlisted address.
    pub claimant: Address,
    /// The certified token issued to the claimant.
    pub token: TokenHandle,
    /// When the claim succeeded.
    pub claimed_at: Timestamp,
}

impl ClaimReceipt {
    /// Storage key of this receipt.
    pub fn key(&self) -> RecordKey {
        RecordKey::claim(&self.commitment, &self.claimant)
    }
}

// ─── Record Envelope ─────────────────────────────────────────────────

/// Discriminant of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// [`Provider`].
    Provider,
    /// [`Course`].
    Course,
    /// [`CommitmentRecord`].
    Commitment,
    /// [`ClaimReceipt`].
    ClaimReceipt,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Provider => "provider",
            Self::Course => "course",
            Self::Commitment => "commitment",
            Self::ClaimReceipt => "claim_receipt",
        };
        f.write_str(s)
    }
}

/// Any record the store can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A provider.
    Provider(Provider),
    /// A course.
    Course(Course),
    /// A commitment.
    Commitment(CommitmentRecord),
    /// A claim receipt.
    ClaimReceipt(ClaimReceipt),
}

impl Record {
    /// The record's discriminant.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Provider(_) => RecordKind::Provider,
            Self::Course(_) => RecordKind::Course,
            Self::Commitment(_) => RecordKind::Commitment,
            Self::ClaimReceipt(_) => RecordKind::ClaimReceipt,
        }
    }

    /// The key this record is stored under.
    pub fn key(&self) -> RecordKey {
        match self {
            Self::Provider(r) => r.key(),
            Self::Course(r) => r.key(),
            Self::Commitment(r) => r.key(),
            Self::ClaimReceipt(r) => r.key(),
        }
    }
}

macro_rules! impl_record_variant {
    ($variant:ident, $ty:ty, $as_fn:ident) => {
        impl From<$ty> for Record {
            fn from(r: $ty) -> Self {
                Record::$variant(r)
            }
        }

        impl Record {
            #[doc = concat!("Borrow as a [`", stringify!($ty), "`] if the kind matches.")]
            pub fn $as_fn(&self) -> Option<&$ty> {
                match self {
                    Record::$variant(r) => Some(r),
                    _ => None,
                }
            }
        }
    };
}

impl_record_variant!(Provider, Provider, as_provider);
impl_record_variant!(Course, Course, as_course);
impl_record_variant!(Commitment, CommitmentRecord, as_commitment);
impl_record_variant!(ClaimReceipt, ClaimReceipt, as_claim_receipt);

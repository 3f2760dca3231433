//! # Program Errors
//!
//! Every rejected operation returns one of these. All are terminal for the
//! call and leave the store unchanged.

use thiserror::Error;

use apec_core::{Address, CanonicalizationError, CryptoError, RecordKey};
use apec_state::ClaimError;

use crate::issuer::IssuanceError;
use crate::store::CreateError;

/// Errors from [`crate::CertProgram`] operations.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// A provider already exists at this key.
    #[error("provider already registered at {0}")]
    DuplicateProvider(RecordKey),

    /// A course already exists at this key.
    #[error("course already exists at {0}")]
    DuplicateCourse(RecordKey),

    /// The caller is not the authority for this operation.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// Who called.
        caller: Address,
        /// What they attempted.
        action: &'static str,
    },

    /// The course already has a published commitment.
    #[error("commitment already published at {0}")]
    CommitmentAlreadySet(RecordKey),

    /// No commitment record at this key.
    #[error("no commitment at {0}")]
    CommitmentNotFound(RecordKey),

    /// The membership proof does not reproduce the committed root.
    #[error("membership proof for {claimant} does not match commitment {commitment}")]
    InvalidProof {
        /// Commitment claimed against.
        commitment: RecordKey,
        /// The claimant whose proof failed.
        claimant: Address,
    },

    /// The claimant already holds a certified credential for this commitment.
    #[error(transparent)]
    AlreadyClaimed(#[from] ClaimError),

    /// No provider at this key.
    #[error("no provider at {0}")]
    ProviderNotFound(RecordKey),

    /// No course at this key.
    #[error("no course at {0}")]
    CourseNotFound(RecordKey),

    /// The course is not owned by the given provider.
    #[error("course {course} does not belong to provider {provider}")]
    ProviderMismatch {
        /// Provider key supplied.
        provider: RecordKey,
        /// Course key supplied.
        course: RecordKey,
    },

    /// A short name exceeds its configured cap.
    #[error("{field} is {len} bytes, limit is {max}")]
    NameTooLong {
        /// Which name.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A commitment must cover at least one member.
    #[error("commitment must cover at least one member")]
    EmptyCommitment,

    /// A proof longer than any tree the program accepts.
    #[error("proof has {len} siblings, limit is {max}")]
    ProofTooLong {
        /// Siblings supplied.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The token issuer refused or failed.
    #[error("credential issuance failed: {0}")]
    Issuance(#[from] IssuanceError),

    /// A transaction signature did not verify.
    #[error("invalid transaction signature: {0}")]
    InvalidSignature(#[from] CryptoError),

    /// A transaction body could not be canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A stored record under a derived key has the wrong kind.
    #[error("record at {0} has unexpected kind")]
    CorruptRecord(RecordKey),
}

impl ProgramError {
    /// Stable label for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateProvider(_) => "duplicate_provider",
            Self::DuplicateCourse(_) => "duplicate_course",
            Self::Unauthorized { .. } => "unauthorized",
            Self::CommitmentAlreadySet(_) => "commitment_already_set",
            Self::CommitmentNotFound(_) => "commitment_not_found",
            Self::InvalidProof { .. } => "invalid_proof",
            Self::AlreadyClaimed(_) => "already_claimed",
            Self::ProviderNotFound(_) => "provider_not_found",
            Self::CourseNotFound(_) => "course_not_found",
            Self::ProviderMismatch { .. } => "provider_mismatch",
            Self::NameTooLong { .. } => "name_too_long",
            Self::EmptyCommitment => "empty_commitment",
            Self::ProofTooLong { .. } => "proof_too_long",
            Self::Issuance(_) => "issuance_failed",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::Canonicalization(_) => "canonicalization_failed",
            Self::CorruptRecord(_) => "corrupt_record",
        }
    }

    /// Map a store create failure, turning an occupied key into the
    /// operation-specific duplicate error.
    pub(crate) fn from_create(
        err: CreateError<ProgramError>,
        occupied: impl FnOnce(RecordKey) -> ProgramError,
    ) -> Self {
        match err {
            CreateError::Occupied(key) => occupied(key),
            CreateError::Build(e) => e,
        }
    }
}

//! # Signed Instructions
//!
//! Every program operation can be submitted as a [`Transaction`]: an
//! [`Instruction`] plus the signer's address and an Ed25519 signature over
//! the canonical bytes of `{instruction, signer}`. The verified signer is
//! the caller (the payer, for claims).
//!
//! Transaction ids are the SHA-256 content digest of the signed message, so
//! the same instruction from the same signer always has the same id.

use serde::{Deserialize, Serialize};

use apec_core::{
    sha256_digest, Address, CanonicalBytes, CanonicalizationError, ContentDigest, CourseId,
    Digest32, ProviderId, RecordKey,
};
use apec_crypto::{verify_signature, Ed25519KeyPair, Ed25519Signature};
use apec_state::{ClaimReceipt, TokenHandle};

use crate::error::ProgramError;
use crate::issuer::TokenIssuer;
use crate::program::CertProgram;
use crate::store::RecordStore;

/// A program operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum Instruction {
    /// See [`CertProgram::init_provider`].
    InitProvider {
        id: ProviderId,
        short_name: String,
    },
    /// See [`CertProgram::create_course`].
    CreateCourse {
        provider: RecordKey,
        id: CourseId,
        short_name: String,
    },
    /// See [`CertProgram::enroll`].
    Enroll {
        course: RecordKey,
        display_name: String,
        symbol: String,
        uri: String,
    },
    /// See [`CertProgram::create_commitment`].
    CreateCommitment {
        provider: RecordKey,
        course: RecordKey,
        root: Digest32,
        member_count: u64,
    },
    /// See [`CertProgram::claim_certified`].
    ClaimCertified {
        commitment: RecordKey,
        claimant: Address,
        proof: Vec<Digest32>,
        display_name: String,
        uri: String,
    },
}

impl Instruction {
    /// Stable instruction name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitProvider { .. } => "init_provider",
            Self::CreateCourse { .. } => "create_course",
            Self::Enroll { .. } => "enroll",
            Self::CreateCommitment { .. } => "create_commitment",
            Self::ClaimCertified { .. } => "claim_certified",
        }
    }
}

/// The portion of a transaction covered by the signature.
#[derive(Serialize)]
struct SignedMessage<'a> {
    instruction: &'a Instruction,
    signer: &'a Address,
}

/// A signed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// What to do.
    pub instruction: Instruction,
    /// Who is doing it.
    pub signer: Address,
    /// Signature by `signer` over the canonical message.
    pub signature: Ed25519Signature,
}

impl Transaction {
    /// Sign `instruction` with `keypair`.
    pub fn sign(
        instruction: Instruction,
        keypair: &Ed25519KeyPair,
    ) -> Result<Self, CanonicalizationError> {
        let signer = keypair.address();
        let message = signed_message(&instruction, &signer)?;
        let signature = keypair.sign(&message);
        Ok(Self {
            instruction,
            signer,
            signature,
        })
    }

    /// Canonical bytes the signature covers.
    pub fn message(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        signed_message(&self.instruction, &self.signer)
    }

    /// Check the signature against `signer`.
    pub fn verify(&self) -> Result<(), ProgramError> {
        let message = self.message()?;
        verify_signature(&self.signer, &message, &self.signature)?;
        Ok(())
    }

    /// Content id of the signed message.
    pub fn id(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&self.message()?))
    }
}

fn signed_message(
    instruction: &Instruction,
    signer: &Address,
) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&SignedMessage {
        instruction,
        signer,
    })
}

/// What a successful transaction produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A provider was registered.
    ProviderCreated { key: RecordKey },
    /// A course was created.
    CourseCreated { key: RecordKey },
    /// An enrollment credential was minted.
    Enrolled { token: TokenHandle },
    /// A commitment was published.
    CommitmentCreated { key: RecordKey },
    /// A certified credential was claimed.
    Claimed { receipt: ClaimReceipt },
}

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Verify `tx` and run its instruction with the signer as caller.
    pub fn execute(&self, tx: &Transaction) -> Result<Outcome, ProgramError> {
        if let Err(e) = tx.verify() {
            tracing::warn!(
                instruction = tx.instruction.name(),
                signer = %tx.signer,
                error = %e,
                "transaction signature rejected"
            );
            return Err(e);
        }
        let caller = &tx.signer;

        match &tx.instruction {
            Instruction::InitProvider { id, short_name } => self
                .init_provider(caller, *id, short_name)
                .map(|key| Outcome::ProviderCreated { key }),
            Instruction::CreateCourse {
                provider,
                id,
                short_name,
            } => self
                .create_course(caller, provider, *id, short_name)
                .map(|key| Outcome::CourseCreated { key }),
            Instruction::Enroll {
                course,
                display_name,
                symbol,
                uri,
            } => self
                .enroll(caller, course, display_name, symbol, uri)
                .map(|token| Outcome::Enrolled { token }),
            Instruction::CreateCommitment {
                provider,
                course,
                root,
                member_count,
            } => self
                .create_commitment(caller, provider, course, *root, *member_count)
                .map(|key| Outcome::CommitmentCreated { key }),
            Instruction::ClaimCertified {
                commitment,
                claimant,
                proof,
                display_name,
                uri,
            } => self
                .claim_certified(caller, commitment, claimant, proof, display_name, uri)
                .map(|receipt| Outcome::Claimed { receipt }),
        }
    }
}

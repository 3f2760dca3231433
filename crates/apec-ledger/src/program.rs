//! # Certification Program
//!
//! [`CertProgram`] owns a record store, a token issuer, and the program
//! limits. The operations themselves live beside the records they touch:
//!
//! | Operation | Module |
//! |---|---|
//! | `init_provider`, `create_course` | [`crate::registry`] |
//! | `enroll` | [`crate::enrollment`] |
//! | `create_commitment` | [`crate::commitment`] |
//! | `claim_certified` | [`crate::claim`] |
//!
//! Operations take `&self` and may be called from many threads at once.
//! Consistency comes from the store's create-if-vacant primitive, not from
//! any lock held by the program.

use apec_core::{Address, RecordKey};
use apec_state::{ClaimReceipt, ClaimState, CommitmentRecord, Course, Provider};

use crate::config::ProgramConfig;
use crate::error::ProgramError;
use crate::issuer::{MemoryTokenIssuer, TokenIssuer};
use crate::store::{MemoryStore, RecordStore};

/// The certification program over a store `S` and issuer `I`.
#[derive(Debug)]
pub struct CertProgram<S = MemoryStore, I = MemoryTokenIssuer> {
    pub(crate) store: S,
    pub(crate) issuer: I,
    pub(crate) config: ProgramConfig,
}

impl CertProgram<MemoryStore, MemoryTokenIssuer> {
    /// Empty in-memory ledger with default limits.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), MemoryTokenIssuer::new(), ProgramConfig::default())
    }
}

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Assemble a program.
    pub fn new(store: S, issuer: I, config: ProgramConfig) -> Self {
        Self {
            store,
            issuer,
            config,
        }
    }

    /// The record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The token issuer.
    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    /// Active limits.
    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Load the provider at `key`.
    pub fn provider(&self, key: &RecordKey) -> Result<Provider, ProgramError> {
        let record = self
            .store
            .load(key)
            .ok_or(ProgramError::ProviderNotFound(*key))?;
        record
            .as_provider()
            .cloned()
            .ok_or(ProgramError::CorruptRecord(*key))
    }

    /// Load the course at `key`.
    pub fn course(&self, key: &RecordKey) -> Result<Course, ProgramError> {
        let record = self
            .store
            .load(key)
            .ok_or(ProgramError::CourseNotFound(*key))?;
        record
            .as_course()
            .cloned()
            .ok_or(ProgramError::CorruptRecord(*key))
    }

    /// Load the commitment at `key`.
    pub fn commitment(&self, key: &RecordKey) -> Result<CommitmentRecord, ProgramError> {
        let record = self
            .store
            .load(key)
            .ok_or(ProgramError::CommitmentNotFound(*key))?;
        record
            .as_commitment()
            .cloned()
            .ok_or(ProgramError::CorruptRecord(*key))
    }

    /// The claim receipt for `claimant` under `commitment`, if any.
    pub fn claim_receipt(&self, commitment: &RecordKey, claimant: &Address) -> Option<ClaimReceipt> {
        self.store
            .load(&RecordKey::claim(commitment, claimant))
            .and_then(|r| r.as_claim_receipt().cloned())
    }

    /// Whether `claimant` has claimed under `commitment`.
    pub fn claim_state(&self, commitment: &RecordKey, claimant: &Address) -> ClaimState {
        ClaimState::from_receipt(self.claim_receipt(commitment, claimant).as_ref())
    }

    pub(crate) fn check_name(
        field: &'static str,
        value: &str,
        max: usize,
    ) -> Result<(), ProgramError> {
        if value.len() > max {
            return Err(ProgramError::NameTooLong {
                field,
                len: value.len(),
                max,
            });
        }
        Ok(())
    }
}

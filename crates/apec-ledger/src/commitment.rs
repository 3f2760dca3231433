//! # Commitment Publication
//!
//! The provider or course authority computes a Merkle root over the
//! certified claimant set off-ledger and publishes it here, once. The root
//! and member count are written together and are never replaced. Whether
//! the root actually covers the intended set is the publisher's
//! responsibility; the ledger cannot check it.

use apec_core::{Address, Digest32, RecordKey, Timestamp};
use apec_state::{CommitmentRecord, Record};

use crate::error::ProgramError;
use crate::issuer::TokenIssuer;
use crate::program::CertProgram;
use crate::store::RecordStore;
use crate::telemetry;

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Publish the allowlist root for the course at `course_key`.
    ///
    /// `caller` must be the provider authority or the course authority, and
    /// the course must belong to the provider at `provider_key`.
    pub fn create_commitment(
        &self,
        caller: &Address,
        provider_key: &RecordKey,
        course_key: &RecordKey,
        root: Digest32,
        member_count: u64,
    ) -> Result<RecordKey, ProgramError> {
        let result =
            self.try_create_commitment(caller, provider_key, course_key, root, member_count);
        telemetry::observe("create_commitment", &result);
        result
    }

    fn try_create_commitment(
        &self,
        caller: &Address,
        provider_key: &RecordKey,
        course_key: &RecordKey,
        root: Digest32,
        member_count: u64,
    ) -> Result<RecordKey, ProgramError> {
        let provider = self.provider(provider_key)?;
        let course = self.course(course_key)?;
        if course.provider != *provider_key {
            return Err(ProgramError::ProviderMismatch {
                provider: *provider_key,
                course: *course_key,
            });
        }
        if *caller != provider.authority && *caller != course.authority {
            return Err(ProgramError::Unauthorized {
                caller: *caller,
                action: "publish a commitment",
            });
        }
        if member_count == 0 {
            return Err(ProgramError::EmptyCommitment);
        }

        let key = RecordKey::commitment(provider_key, course_key);
        tracing::debug!(%key, course = %course_key, "derived commitment key");

        let record = CommitmentRecord {
            provider: *provider_key,
            course: *course_key,
            root,
            member_count,
            created_at: Timestamp::now(),
        };
        self.store
            .create_with(key, || Ok::<_, ProgramError>(Record::from(record)))
            .map_err(|e| ProgramError::from_create(e, ProgramError::CommitmentAlreadySet))?;

        tracing::info!(%key, course = %course_key, %root, member_count, "commitment published");
        Ok(key)
    }
}

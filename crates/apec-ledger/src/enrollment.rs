//! # Open Enrollment
//!
//! Anyone may enroll in an existing course, any number of times. Each call
//! mints an independent enrollment credential to the caller under the
//! course's mint authority. Nothing is written to the record store.

use apec_core::{Address, RecordKey};
use apec_state::{CredentialTier, TokenHandle};

use crate::error::ProgramError;
use crate::issuer::{IssuanceRequest, TokenIssuer};
use crate::program::CertProgram;
use crate::store::RecordStore;
use crate::telemetry;

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Mint an enrollment credential for `caller` in the course at
    /// `course_key`.
    pub fn enroll(
        &self,
        caller: &Address,
        course_key: &RecordKey,
        display_name: &str,
        symbol: &str,
        uri: &str,
    ) -> Result<TokenHandle, ProgramError> {
        let result = self.try_enroll(caller, course_key, display_name, symbol, uri);
        telemetry::observe("enroll", &result);
        result
    }

    fn try_enroll(
        &self,
        caller: &Address,
        course_key: &RecordKey,
        display_name: &str,
        symbol: &str,
        uri: &str,
    ) -> Result<TokenHandle, ProgramError> {
        self.course(course_key)?;

        let request = IssuanceRequest {
            tier: CredentialTier::Enrollment,
            recipient: *caller,
            mint_authority: *course_key,
            display_name: display_name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
        };
        let token = self.issuer.issue(&request)?;
        telemetry::credential_issued(CredentialTier::Enrollment);

        tracing::info!(course = %course_key, user = %caller, %token, "enrollment credential issued");
        Ok(token)
    }
}

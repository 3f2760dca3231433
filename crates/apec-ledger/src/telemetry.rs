//! Counters and outcome logging shared by every program operation.
//!
//! Metrics go through the `metrics` facade; with no recorder installed the
//! calls are no-ops.

use apec_state::CredentialTier;

use crate::error::ProgramError;

/// Counter of operations by instruction and outcome.
pub const INSTRUCTIONS_TOTAL: &str = "apec_instructions_total";

/// Counter of credentials minted by tier.
pub const CREDENTIALS_ISSUED_TOTAL: &str = "apec_credentials_issued_total";

/// Count an operation result and log rejections.
pub(crate) fn observe<T>(instruction: &'static str, result: &Result<T, ProgramError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(instruction, code = e.code(), error = %e, "instruction rejected");
            e.code()
        }
    };
    metrics::counter!(INSTRUCTIONS_TOTAL, "instruction" => instruction, "outcome" => outcome)
        .increment(1);
}

/// Count a minted credential.
pub(crate) fn credential_issued(tier: CredentialTier) {
    metrics::counter!(CREDENTIALS_ISSUED_TOTAL, "tier" => tier.as_str()).increment(1);
}

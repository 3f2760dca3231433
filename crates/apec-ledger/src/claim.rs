//! # Certified Claims
//!
//! A claimant proves membership in a published commitment and receives the
//! certified credential, once.
//!
//! ## Sequence
//!
//! 1. Load the commitment.
//! 2. Verify the membership proof against its root. Proof checking is pure
//!    and happens before any key is reserved.
//! 3. Reserve the claim receipt key. If it is occupied the claimant has
//!    already claimed and nothing is issued.
//! 4. While the key is held, ask the issuer for the certified token. Only
//!    if that succeeds is the receipt written.
//!
//! ## Security Invariant
//!
//! Issuance and the receipt write are one unit. Concurrent claims for the
//! same claimant contend on one key and at most one reaches the issuer.
//! Claims for different claimants share no state.

use apec_core::{Address, Digest32, RecordKey, Timestamp};
use apec_crypto::merkle;
use apec_state::{Claim, ClaimError, ClaimReceipt, CredentialTier, Record};

use crate::error::ProgramError;
use crate::issuer::{IssuanceRequest, TokenIssuer};
use crate::program::CertProgram;
use crate::store::{CreateError, RecordStore};
use crate::telemetry;

impl<S: RecordStore, I: TokenIssuer> CertProgram<S, I> {
    /// Claim the certified credential for `claimant` under the commitment at
    /// `commitment_key`.
    ///
    /// `payer` submits the claim and may differ from `claimant`; the
    /// credential always goes to `claimant`.
    pub fn claim_certified(
        &self,
        payer: &Address,
        commitment_key: &RecordKey,
        claimant: &Address,
        proof: &[Digest32],
        display_name: &str,
        uri: &str,
    ) -> Result<ClaimReceipt, ProgramError> {
        let result =
            self.try_claim_certified(payer, commitment_key, claimant, proof, display_name, uri);
        telemetry::observe("claim_certified", &result);
        result
    }

    fn try_claim_certified(
        &self,
        payer: &Address,
        commitment_key: &RecordKey,
        claimant: &Address,
        proof: &[Digest32],
        display_name: &str,
        uri: &str,
    ) -> Result<ClaimReceipt, ProgramError> {
        if proof.len() > self.config.max_proof_len {
            return Err(ProgramError::ProofTooLong {
                len: proof.len(),
                max: self.config.max_proof_len,
            });
        }

        let commitment = self.commitment(commitment_key)?;
        if !merkle::verify(claimant.as_bytes(), proof, &commitment.root) {
            return Err(ProgramError::InvalidProof {
                commitment: *commitment_key,
                claimant: *claimant,
            });
        }

        let claim = Claim::new(*commitment_key, *claimant);
        let key = claim.receipt_key();
        tracing::debug!(%key, commitment = %commitment_key, %claimant, "derived claim key");

        let request = IssuanceRequest {
            tier: CredentialTier::Certified,
            recipient: *claimant,
            mint_authority: commitment.provider,
            display_name: display_name.to_string(),
            symbol: self.config.certified_symbol.clone(),
            uri: uri.to_string(),
        };

        let stored = self
            .store
            .create_with(key, || {
                let token = self.issuer.issue(&request)?;
                let receipt = claim.redeem(token, Timestamp::now()).into_receipt();
                Ok::<_, ProgramError>(Record::from(receipt))
            })
            .map_err(|e| match e {
                CreateError::Occupied(_) => ProgramError::AlreadyClaimed(ClaimError::AlreadyClaimed {
                    commitment: *commitment_key,
                    claimant: *claimant,
                }),
                CreateError::Build(e) => e,
            })?;
        let receipt = stored
            .as_claim_receipt()
            .cloned()
            .ok_or(ProgramError::CorruptRecord(key))?;
        telemetry::credential_issued(CredentialTier::Certified);

        tracing::info!(
            commitment = %commitment_key,
            %claimant,
            %payer,
            token = %receipt.token,
            "certified credential issued"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apec_core::{CourseId, ProviderId};
    use apec_state::ClaimState;

    use crate::issuer::{IssuanceError, MemoryTokenIssuer};
    use crate::store::MemoryStore;
    use crate::ProgramConfig;

    fn member(i: u8) -> Address {
        Address([i; 32])
    }

    fn members() -> Vec<Address> {
        (1..=4).map(member).collect()
    }

    fn publish<I: TokenIssuer>(program: &CertProgram<MemoryStore, I>) -> RecordKey {
        let owner = Address([0xee; 32]);
        let p = program.init_provider(&owner, ProviderId(1), "APEC").unwrap();
        let c = program
            .create_course(&owner, &p, CourseId(1), "Rust")
            .unwrap();
        let root = merkle::build_root(&members()).unwrap();
        program
            .create_commitment(&owner, &p, &c, root, members().len() as u64)
            .unwrap()
    }

    fn proof_for(who: &Address) -> Vec<Digest32> {
        merkle::build_proof(&members(), who.as_bytes()).unwrap()
    }

    #[test]
    fn member_claims_once() {
        let program = CertProgram::in_memory();
        let commitment = publish(&program);
        let who = member(2);

        let receipt = program
            .claim_certified(&who, &commitment, &who, &proof_for(&who), "Rust Cert", "u")
            .unwrap();
        assert_eq!(receipt.claimant, who);
        assert_eq!(program.claim_state(&commitment, &who), ClaimState::Claimed);

        let token = program.issuer().get(receipt.token).unwrap();
        assert_eq!(token.tier, CredentialTier::Certified);
        assert_eq!(token.symbol, "APECERT");
        assert_eq!(token.mint_authority, RecordKey::provider(ProviderId(1)));

        let err = program
            .claim_certified(&who, &commitment, &who, &proof_for(&who), "Rust Cert", "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::AlreadyClaimed(_)));
        assert_eq!(program.issuer().count(Some(CredentialTier::Certified)), 1);
    }

    #[test]
    fn outsider_rejected_with_borrowed_proof() {
        let program = CertProgram::in_memory();
        let commitment = publish(&program);
        let outsider = member(9);
        let err = program
            .claim_certified(&outsider, &commitment, &outsider, &proof_for(&member(1)), "C", "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::InvalidProof { .. }));
        assert_eq!(program.claim_state(&commitment, &outsider), ClaimState::Unclaimed);
        assert_eq!(program.issuer().count(None), 0);
    }

    #[test]
    fn payer_may_differ_from_claimant() {
        let program = CertProgram::in_memory();
        let commitment = publish(&program);
        let who = member(3);
        let payer = Address([0x77; 32]);
        let receipt = program
            .claim_certified(&payer, &commitment, &who, &proof_for(&who), "C", "u")
            .unwrap();
        assert_eq!(program.issuer().get(receipt.token).unwrap().owner, who);
        assert!(program.issuer().tokens_of(&payer).is_empty());
    }

    #[test]
    fn missing_commitment() {
        let program = CertProgram::in_memory();
        let ghost = RecordKey::provider(ProviderId(404));
        let err = program
            .claim_certified(&member(1), &ghost, &member(1), &[], "C", "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::CommitmentNotFound(_)));
    }

    #[test]
    fn oversized_proof_rejected_before_lookup() {
        let program = CertProgram::in_memory();
        let ghost = RecordKey::provider(ProviderId(404));
        let proof = vec![Digest32::ZERO; 65];
        let err = program
            .claim_certified(&member(1), &ghost, &member(1), &proof, "C", "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::ProofTooLong { len: 65, max: 64 }));
    }

    struct RefusingIssuer;

    impl TokenIssuer for RefusingIssuer {
        fn issue(&self, _: &IssuanceRequest) -> Result<apec_state::TokenHandle, IssuanceError> {
            Err(IssuanceError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn failed_issuance_leaves_claimant_unclaimed() {
        let store = MemoryStore::new();
        let failing = CertProgram::new(store.clone(), RefusingIssuer, ProgramConfig::default());
        let commitment = publish(&failing);
        let who = member(1);

        let err = failing
            .claim_certified(&who, &commitment, &who, &proof_for(&who), "C", "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::Issuance(_)));
        assert_eq!(failing.claim_state(&commitment, &who), ClaimState::Unclaimed);

        // Same ledger, working issuer: the claim now goes through.
        let working =
            CertProgram::new(store, MemoryTokenIssuer::new(), ProgramConfig::default());
        assert!(working
            .claim_certified(&who, &commitment, &who, &proof_for(&who), "C", "u")
            .is_ok());
    }

    #[test]
    fn certified_name_too_long_for_issuer_is_issuance_error() {
        let program = CertProgram::in_memory();
        let commitment = publish(&program);
        let who = member(4);
        let err = program
            .claim_certified(&who, &commitment, &who, &proof_for(&who), &"n".repeat(33), "u")
            .unwrap_err();
        assert!(matches!(err, ProgramError::Issuance(IssuanceError::Rejected(_))));
        assert_eq!(program.claim_state(&commitment, &who), ClaimState::Unclaimed);
    }
}

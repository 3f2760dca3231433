//! # Certified Claim Lifecycle
//!
//! Each (commitment, claimant) pair moves through exactly one transition:
//!
//! ```text
//! Unclaimed ──redeem(token)──▶ Claimed (terminal)
//! ```
//!
//! The typestate form, [`Claim<Unclaimed>`] / [`Claim<Claimed>`], is what the
//! ledger drives while holding the receipt key: `redeem()` consumes the
//! unclaimed value and is the only way to produce a [`ClaimReceipt`] from a
//! proof-checked claim. The receipt lives inside the `Claimed` state, and
//! there is no method leaving it.
//!
//! [`ClaimState`] is the runtime view used when inspecting the store, where
//! "a receipt exists at the derived key" means `Claimed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use apec_core::{Address, RecordKey, Timestamp};

use crate::records::{ClaimReceipt, TokenHandle};

// ─── States ──────────────────────────────────────────────────────────

/// No receipt exists for the pair.
#[derive(Debug)]
pub struct Unclaimed;

/// A receipt exists; the certified credential has been issued.
#[derive(Debug)]
pub struct Claimed {
    receipt: ClaimReceipt,
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Unclaimed {}
    impl Sealed for super::Claimed {}
}

/// Marker trait for claim states. Sealed.
pub trait ClaimPhase: private::Sealed + std::fmt::Debug {
    /// Name of the state.
    const NAME: &'static str;
}

impl ClaimPhase for Unclaimed {
    const NAME: &'static str = "UNCLAIMED";
}

impl ClaimPhase for Claimed {
    const NAME: &'static str = "CLAIMED";
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Claim lifecycle violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// A receipt already exists for this claimant under this commitment.
    #[error("{claimant} has already claimed against commitment {commitment}")]
    AlreadyClaimed {
        /// Commitment key.
        commitment: RecordKey,
        /// Claimant address.
        claimant: Address,
    },
}

// ─── Typestate Claim ─────────────────────────────────────────────────

/// A claim by one claimant against one commitment.
#[derive(Debug)]
pub struct Claim<S: ClaimPhase> {
    commitment: RecordKey,
    claimant: Address,
    state: S,
}

impl<S: ClaimPhase> Claim<S> {
    /// Current state name.
    pub fn state_name(&self) -> &'static str {
        S::NAME
    }

    /// Commitment being claimed against.
    pub fn commitment(&self) -> &RecordKey {
        &self.commitment
    }

    /// The claimant.
    pub fn claimant(&self) -> &Address {
        &self.claimant
    }

    /// Key at which the receipt is (or will be) stored.
    pub fn receipt_key(&self) -> RecordKey {
        RecordKey::claim(&self.commitment, &self.claimant)
    }
}

impl Claim<Unclaimed> {
    /// Start a claim. Callers construct this only after the claimant's
    /// membership proof has verified against the commitment root.
    pub fn new(commitment: RecordKey, claimant: Address) -> Self {
        Self {
            commitment,
            claimant,
            state: Unclaimed,
        }
    }

    /// Record issuance of the certified token.
    pub fn redeem(self, token: TokenHandle, at: Timestamp) -> Claim<Claimed> {
        let receipt = ClaimReceipt {
            commitment: self.commitment,
            claimant: self.claimant,
            token,
            claimed_at: at,
        };
        Claim {
            commitment: self.commitment,
            claimant: self.claimant,
            state: Claimed { receipt },
        }
    }
}

impl Claim<Claimed> {
    /// Rebuild from a stored receipt.
    pub fn from_receipt(receipt: ClaimReceipt) -> Self {
        Self {
            commitment: receipt.commitment,
            claimant: receipt.claimant,
            state: Claimed { receipt },
        }
    }

    /// The token issued to the claimant.
    pub fn token(&self) -> TokenHandle {
        self.state.receipt.token
    }

    /// Borrow the receipt.
    pub fn receipt(&self) -> &ClaimReceipt {
        &self.state.receipt
    }

    /// Take the receipt to persist.
    pub fn into_receipt(self) -> ClaimReceipt {
        self.state.receipt
    }
}

// ─── Runtime State ───────────────────────────────────────────────────

/// Runtime view of a pair's claim state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    /// No receipt.
    Unclaimed,
    /// Receipt present (terminal).
    Claimed,
}

impl ClaimState {
    /// State implied by the presence of a receipt.
    pub fn from_receipt(receipt: Option<&ClaimReceipt>) -> Self {
        match receipt {
            Some(_) => Self::Claimed,
            None => Self::Unclaimed,
        }
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed)
    }

    /// Fail with [`ClaimError::AlreadyClaimed`] unless unclaimed.
    pub fn require_unclaimed(
        &self,
        commitment: &RecordKey,
        claimant: &Address,
    ) -> Result<(), ClaimError> {
        match self {
            Self::Unclaimed => Ok(()),
            Self::Claimed => Err(ClaimError::AlreadyClaimed {
                commitment: *commitment,
                claimant: *claimant,
            }),
        }
    }
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unclaimed => Unclaimed::NAME,
            Self::Claimed => Claimed::NAME,
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apec_core::{CourseId, ProviderId};

    fn commitment_key() -> RecordKey {
        let p = RecordKey::provider(ProviderId(1));
        let c = RecordKey::course(&p, CourseId(1));
        RecordKey::commitment(&p, &c)
    }

    fn at() -> Timestamp {
        Timestamp::parse("2026-05-20T10:00:00Z").unwrap()
    }

    #[test]
    fn redeem_produces_receipt_at_derived_key() {
        let claimant = Address([4; 32]);
        let claim = Claim::new(commitment_key(), claimant);
        assert_eq!(claim.state_name(), "UNCLAIMED");
        let expected_key = claim.receipt_key();

        let claimed = claim.redeem(TokenHandle(11), at());
        assert_eq!(claimed.state_name(), "CLAIMED");
        assert_eq!(claimed.token(), TokenHandle(11));

        let receipt = claimed.into_receipt();
        assert_eq!(receipt.key(), expected_key);
        assert_eq!(receipt.claimant, claimant);
        assert_eq!(receipt.claimed_at, at());
    }

    #[test]
    fn from_receipt_preserves_fields() {
        let receipt = ClaimReceipt {
            commitment: commitment_key(),
            claimant: Address([1; 32]),
            token: TokenHandle(3),
            claimed_at: at(),
        };
        let claim = Claim::from_receipt(receipt.clone());
        assert_eq!(claim.claimant(), &receipt.claimant);
        assert_eq!(claim.commitment(), &receipt.commitment);
        assert_eq!(claim.receipt(), &receipt);
        assert_eq!(claim.into_receipt(), receipt);
    }

    #[test]
    fn runtime_state_from_receipt() {
        assert_eq!(ClaimState::from_receipt(None), ClaimState::Unclaimed);
        let receipt = ClaimReceipt {
            commitment: commitment_key(),
            claimant: Address([1; 32]),
            token: TokenHandle(0),
            claimed_at: at(),
        };
        let state = ClaimState::from_receipt(Some(&receipt));
        assert_eq!(state, ClaimState::Claimed);
        assert!(state.is_terminal());
        assert_eq!(state.to_string(), "CLAIMED");
    }

    #[test]
    fn require_unclaimed_rejects_claimed() {
        let key = commitment_key();
        let who = Address([2; 32]);
        assert!(ClaimState::Unclaimed.require_unclaimed(&key, &who).is_ok());
        let err = ClaimState::Claimed.require_unclaimed(&key, &who).unwrap_err();
        assert_eq!(
            err,
            ClaimError::AlreadyClaimed {
                commitment: key,
                claimant: who
            }
        );
        assert!(err.to_string().contains("already claimed"));
    }
}

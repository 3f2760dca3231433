//! # apec-state: Ledger Records and Claim Lifecycle
//!
//! - **Records** (`records.rs`): `Provider`, `Course`, `CommitmentRecord`,
//!   `ClaimReceipt`, and the tagged `Record` envelope the store holds. Every
//!   record knows its own derived key.
//!
//! - **Claim** (`claim.rs`): `Unclaimed → Claimed`, as a typestate pair for
//!   the write path and as `ClaimState` for inspection.
//!
//! Nothing here touches storage. The ledger crate decides when a
//! transition happens; this crate decides what the result looks like.

pub mod claim;
pub mod records;

pub use claim::{Claim, ClaimError, ClaimPhase, ClaimState, Claimed, Unclaimed};
pub use records::{
    ClaimReceipt, CommitmentRecord, Course, CredentialTier, Provider, Record, RecordKind,
    TokenHandle,
};

//! # apec-core: Foundational Types for the Certification Ledger
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate speaks in: identifiers, fixed-size digests, canonical
//! bytes, and the deterministic record keys that make "create at most once"
//! a storage property rather than a counter.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `ProviderId`, `CourseId`, and `Address`
//!    are distinct types. A course id cannot be passed where a provider id is
//!    expected.
//!
//! 2. **`RecordKey` is derived, never allocated.** Every record lives at a
//!    key computed from its identity tuple (see [`key`]). Anyone can recompute
//!    the key and check existence without a directory.
//!
//! 3. **`CanonicalBytes` for anything signed or content-addressed.**
//!    Transactions are signed over canonical JCS bytes so that the same
//!    instruction always produces the same message.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is truncated to seconds with a
//!    `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apec-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod key;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, Digest32, DigestAlgorithm};
pub use error::{ApecError, CanonicalizationError, CryptoError};
pub use identity::{Address, CourseId, ProviderId};
pub use key::{RecordKey, CLAIM_SEED, COMMITMENT_SEED, COURSE_SEED, PROVIDER_SEED};
pub use temporal::Timestamp;

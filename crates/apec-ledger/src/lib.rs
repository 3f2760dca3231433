//! # apec-ledger: The Certification Program
//!
//! Runs the five program operations over a record store and a token
//! issuer:
//!
//! ```text
//! init_provider ─▶ create_course ─┬─▶ enroll                 (open, unlimited)
//!                                 └─▶ create_commitment ─▶ claim_certified
//!                                                         (allowlisted, once)
//! ```
//!
//! ## Seams
//!
//! - [`RecordStore`]: create-if-vacant storage keyed by derived
//!   [`apec_core::RecordKey`]s. [`MemoryStore`] shards over `dashmap`.
//! - [`TokenIssuer`]: mints credential tokens. [`MemoryTokenIssuer`] keeps
//!   them in process.
//!
//! ## Observability
//!
//! Every operation logs through `tracing` and increments
//! `apec_instructions_total{instruction,outcome}`; every mint increments
//! `apec_credentials_issued_total{tier}`.

pub mod claim;
pub mod commitment;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod instruction;
pub mod issuer;
pub mod program;
pub mod registry;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, ProgramConfig};
pub use error::ProgramError;
pub use instruction::{Instruction, Outcome, Transaction};
pub use issuer::{IssuanceError, IssuanceRequest, IssuedToken, MemoryTokenIssuer, TokenIssuer};
pub use program::CertProgram;
pub use store::{CreateError, MemoryStore, RecordStore, SnapshotError};

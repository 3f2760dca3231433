//! # apec-crypto: Cryptographic Primitives
//!
//! - **Merkle commitments** over claimant allowlists: a 32-byte root is
//!   published per course, and each claimant proves membership with a
//!   sibling path. See [`merkle`].
//! - **Ed25519** key pairs and signature verification for ledger
//!   transactions. See [`ed25519`].
//!
//! ## Crate Policy
//!
//! - Depends only on `apec-core` internally.
//! - Tests use real SHA-256 and real Ed25519; nothing is mocked.

pub mod ed25519;
pub mod merkle;

pub use ed25519::{verify_signature, Ed25519KeyPair, Ed25519Signature};
pub use merkle::{build_proof, build_root, leaf_hash, node_hash, verify, MerkleError, MerkleTree};

//! # Error Types
//!
//! Errors shared by every crate in the workspace. All use `thiserror`.
//! Domain errors (program rejections, claim transitions) live next to the
//! code that raises them; this module only holds the cross-cutting ones.

use thiserror::Error;

/// Top-level error for core primitives.
#[derive(Error, Debug)]
pub enum ApecError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A hex or fixed-width encoding could not be decoded.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A timestamp could not be parsed or was not UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Digest parsing or computation failed.
    #[error("digest error: {0}")]
    DigestError(String),
}

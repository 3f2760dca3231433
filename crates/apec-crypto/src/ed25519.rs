//! # Ed25519 Transaction Signing
//!
//! Ledger accounts are Ed25519 key pairs; an [`Address`] is the 32-byte
//! verifying key. A transaction is authorized by a signature over the
//! canonical bytes of its body, checked against the signer's address.
//!
//! ## Security Invariant
//!
//! - Signing input is `&CanonicalBytes`. Raw byte slices cannot be signed,
//!   so two encoders of the same instruction always produce the same
//!   message.
//! - `Ed25519KeyPair` does not implement `Serialize`. The only way to
//!   persist a secret is [`Ed25519KeyPair::seed_hex`], called explicitly by
//!   key-file tooling.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use apec_core::digest::{decode_hex, decode_hex_32, encode_hex};
use apec_core::{Address, CanonicalBytes, CryptoError};

/// An Ed25519 signature (64 bytes). Serializes as 128 hex chars.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

/// An Ed25519 key pair controlling one ledger address.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as lowercase hex.
    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    /// Parse from a 128-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(hex)?;
        let arr: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::VerificationFailed(format!(
                "signature must be 64 bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", encode_hex(&self.0[..4]))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Rebuild a key pair from its 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Rebuild a key pair from a hex-encoded secret seed.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let seed = decode_hex_32(hex)
            .map_err(|e| CryptoError::KeyError(format!("invalid secret seed: {e}")))?;
        Ok(Self::from_seed(&seed))
    }

    /// Hex-encoded secret seed, for writing key files.
    pub fn seed_hex(&self) -> String {
        encode_hex(self.signing_key.as_bytes())
    }

    /// The ledger address this key pair controls.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair({:?})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify that `signature` over `data` was produced by the key behind
/// `signer`.
pub fn verify_signature(
    signer: &Address,
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
) -> Result<(), CryptoError> {
    let vk = ed25519_dalek::VerifyingKey::from_bytes(signer.as_bytes())
        .map_err(|e| CryptoError::KeyError(format!("address is not a valid public key: {e}")))?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(format!("Ed25519 verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(v: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(&v).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"instruction": "claim", "course": 1}));
        let sig = kp.sign(&data);
        verify_signature(&kp.address(), &data, &sig).expect("valid signature should verify");
    }

    #[test]
    fn test_verify_wrong_signer_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"x": 1}));
        let sig = kp1.sign(&data);
        assert!(matches!(
            verify_signature(&kp2.address(), &data, &sig),
            Err(CryptoError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_verify_tampered_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&canonical(serde_json::json!({"course": 1})));
        let tampered = canonical(serde_json::json!({"course": 2}));
        assert!(verify_signature(&kp.address(), &tampered, &sig).is_err());
    }

    #[test]
    fn test_deterministic_from_seed() {
        let kp1 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        let kp2 = Ed25519KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(kp1.address(), kp2.address());
        let data = canonical(serde_json::json!({"a": "b"}));
        assert_eq!(kp1.sign(&data), kp2.sign(&data));
    }

    #[test]
    fn test_seed_hex_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let restored = Ed25519KeyPair::from_seed_hex(&kp.seed_hex()).unwrap();
        assert_eq!(restored.address(), kp.address());
    }

    #[test]
    fn test_seed_hex_rejects_garbage() {
        assert!(Ed25519KeyPair::from_seed_hex("abcd").is_err());
        assert!(Ed25519KeyPair::from_seed_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_signature_serde_hex() {
        let kp = Ed25519KeyPair::from_seed(&[1u8; 32]);
        let sig = kp.sign(&canonical(serde_json::json!({})));
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let back: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_signature_from_hex_wrong_length() {
        assert!(Ed25519Signature::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let dbg = format!("{kp:?}");
        assert!(!dbg.contains(&kp.seed_hex()));
    }
}

//! # Credential Issuance
//!
//! The program never mints tokens itself. It hands an [`IssuanceRequest`]
//! to a [`TokenIssuer`] and records the returned handle; it never reads a
//! token back.
//!
//! Every credential is a non-fungible token: zero decimals, supply of one,
//! and mint authority relinquished immediately after the single mint, so
//! no further supply can ever be created under it.
//!
//! [`MemoryTokenIssuer`] is the in-process implementation used by the CLI
//! and tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use apec_core::{Address, RecordKey, Timestamp};
use apec_state::{CredentialTier, TokenHandle};

/// Token metadata limits enforced by [`MemoryTokenIssuer`].
pub const MAX_TOKEN_NAME_LEN: usize = 32;
/// Maximum symbol length.
pub const MAX_TOKEN_SYMBOL_LEN: usize = 10;
/// Maximum metadata URI length.
pub const MAX_TOKEN_URI_LEN: usize = 200;

/// Issuer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    /// The request's metadata was refused.
    #[error("issuance rejected: {0}")]
    Rejected(String),

    /// The issuer could not be reached or failed internally.
    #[error("issuer unavailable: {0}")]
    Unavailable(String),
}

/// What to mint and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    /// Credential tier.
    pub tier: CredentialTier,
    /// Owner of the minted token.
    pub recipient: Address,
    /// Record the token is minted under: the course for enrollment, the
    /// provider for certified credentials.
    pub mint_authority: RecordKey,
    /// Token display name.
    pub display_name: String,
    /// Token symbol.
    pub symbol: String,
    /// Off-ledger metadata URI.
    pub uri: String,
}

/// Capability to mint credential tokens.
pub trait TokenIssuer: Send + Sync {
    /// Mint one token for `request.recipient`.
    fn issue(&self, request: &IssuanceRequest) -> Result<TokenHandle, IssuanceError>;
}

impl<T: TokenIssuer + ?Sized> TokenIssuer for Arc<T> {
    fn issue(&self, request: &IssuanceRequest) -> Result<TokenHandle, IssuanceError> {
        (**self).issue(request)
    }
}

/// A token as held by [`MemoryTokenIssuer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Handle returned to the program.
    pub handle: TokenHandle,
    /// Credential tier.
    pub tier: CredentialTier,
    /// Token owner.
    pub owner: Address,
    /// Record the token was minted under.
    pub mint_authority: RecordKey,
    /// Display name.
    pub display_name: String,
    /// Symbol.
    pub symbol: String,
    /// Metadata URI.
    pub uri: String,
    /// Always 0.
    pub decimals: u8,
    /// Always 1.
    pub supply: u64,
    /// Whether further minting is disabled. Always true once issued.
    pub mint_closed: bool,
    /// When the token was minted.
    pub issued_at: Timestamp,
}

/// In-memory issuer with sequential handles.
#[derive(Clone, Default)]
pub struct MemoryTokenIssuer {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next: AtomicU64,
    tokens: DashMap<TokenHandle, IssuedToken>,
}

impl MemoryTokenIssuer {
    /// An empty issuer. The first handle is `token:0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from previously issued tokens. New handles continue after
    /// the highest one present.
    pub fn from_tokens(tokens: Vec<IssuedToken>) -> Self {
        let next = tokens
            .iter()
            .map(|t| t.handle.0 + 1)
            .max()
            .unwrap_or(0);
        let map = DashMap::with_capacity(tokens.len());
        for token in tokens {
            map.insert(token.handle, token);
        }
        Self {
            inner: Arc::new(Inner {
                next: AtomicU64::new(next),
                tokens: map,
            }),
        }
    }

    /// Look up a token.
    pub fn get(&self, handle: TokenHandle) -> Option<IssuedToken> {
        self.inner.tokens.get(&handle).map(|t| t.value().clone())
    }

    /// All tokens owned by `owner`, ordered by handle.
    pub fn tokens_of(&self, owner: &Address) -> Vec<IssuedToken> {
        let mut out: Vec<IssuedToken> = self
            .inner
            .tokens
            .iter()
            .filter(|t| t.owner == *owner)
            .map(|t| t.value().clone())
            .collect();
        out.sort_by_key(|t| t.handle);
        out
    }

    /// Number of tokens issued, optionally filtered by tier.
    pub fn count(&self, tier: Option<CredentialTier>) -> usize {
        match tier {
            None => self.inner.tokens.len(),
            Some(tier) => self.inner.tokens.iter().filter(|t| t.tier == tier).count(),
        }
    }

    /// Every issued token, ordered by handle.
    pub fn snapshot(&self) -> Vec<IssuedToken> {
        let mut out: Vec<IssuedToken> =
            self.inner.tokens.iter().map(|t| t.value().clone()).collect();
        out.sort_by_key(|t| t.handle);
        out
    }
}

impl std::fmt::Debug for MemoryTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTokenIssuer")
            .field("tokens", &self.inner.tokens.len())
            .finish()
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), IssuanceError> {
    if value.len() > max {
        return Err(IssuanceError::Rejected(format!(
            "{field} is {} bytes, limit is {max}",
            value.len()
        )));
    }
    Ok(())
}

impl TokenIssuer for MemoryTokenIssuer {
    fn issue(&self, request: &IssuanceRequest) -> Result<TokenHandle, IssuanceError> {
        check_len("name", &request.display_name, MAX_TOKEN_NAME_LEN)?;
        check_len("symbol", &request.symbol, MAX_TOKEN_SYMBOL_LEN)?;
        check_len("uri", &request.uri, MAX_TOKEN_URI_LEN)?;

        let handle = TokenHandle(self.inner.next.fetch_add(1, Ordering::SeqCst));
        self.inner.tokens.insert(
            handle,
            IssuedToken {
                handle,
                tier: request.tier,
                owner: request.recipient,
                mint_authority: request.mint_authority,
                display_name: request.display_name.clone(),
                symbol: request.symbol.clone(),
                uri: request.uri.clone(),
                decimals: 0,
                supply: 1,
                mint_closed: true,
                issued_at: Timestamp::now(),
            },
        );
        Ok(handle)
    }
}

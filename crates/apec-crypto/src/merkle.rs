//! # Allowlist Merkle Commitment
//!
//! Commits to a set of claimant addresses with a single 32-byte root, and
//! proves membership of one address with the list of sibling digests on its
//! path to the root. The full set never needs to be published.
//!
//! ## Construction
//!
//! The same procedure must be used by the authority that builds the root
//! off-ledger and by anyone producing proofs against it:
//!
//! 1. Leaf digest: `SHA256(0x00 || leaf_bytes)`.
//! 2. Level 0 is the leaf digests sorted ascending (bytewise). The root is
//!    therefore independent of the order the allowlist was written in.
//! 3. Parent: `SHA256(0x01 || min(a, b) || max(a, b))`. Pairing is
//!    commutative, so proofs carry no left/right flags.
//! 4. An unpaired last node on a level is promoted unchanged.
//! 5. A proof lists the sibling at every level where the path node has one.
//!
//! ## Security Invariant
//!
//! Leaves and internal nodes are hashed under different one-byte tags. An
//! internal node `SHA256(0x01 || a || b)` can never equal a leaf digest
//! `SHA256(0x00 || x)` for any `x`, so presenting the 64-byte concatenation
//! `a || b` as a "leaf" one level down does not verify.

use sha2::{Digest, Sha256};
use thiserror::Error;

use apec_core::Digest32;

/// Domain tag prepended to leaf preimages.
pub const LEAF_PREFIX: u8 = 0x00;

/// Domain tag prepended to internal node preimages.
pub const NODE_PREFIX: u8 = 0x01;

/// Errors from building a commitment or a proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A commitment over zero leaves has no root.
    #[error("cannot build a merkle commitment over an empty leaf set")]
    EmptyTree,

    /// The requested leaf is not part of the committed set.
    #[error("leaf is not a member of the committed set")]
    LeafNotFound,
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Digest of a raw leaf: `SHA256(0x00 || raw)`.
pub fn leaf_hash(raw: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(raw);
    finalize(hasher)
}

/// Digest of an internal node over two children, in sorted order:
/// `SHA256(0x01 || min || max)`.
pub fn node_hash(a: &Digest32, b: &Digest32) -> Digest32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    finalize(hasher)
}

fn finalize(hasher: Sha256) -> Digest32 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Digest32(out)
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A fully materialized commitment tree.
///
/// `levels[0]` holds the sorted leaf digests; the last level holds the root.
/// Kept in memory by whoever owns the allowlist (the provider authority, or
/// a claimant tool that was handed the list); the ledger itself only ever
/// sees the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest32>>,
}

impl MerkleTree {
    /// Build a tree over raw leaves.
    ///
    /// Duplicate leaves are kept; the tree commits to a multiset.
    pub fn from_leaves<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Self, MerkleError> {
        let hashes = leaves.iter().map(|l| leaf_hash(l.as_ref())).collect();
        Self::from_leaf_hashes(hashes)
    }

    /// Build a tree over already-computed leaf digests.
    pub fn from_leaf_hashes(mut hashes: Vec<Digest32>) -> Result<Self, MerkleError> {
        if hashes.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        hashes.sort_unstable();

        let mut levels = vec![hashes];
        while let Some(level) = levels.last() {
            if level.len() <= 1 {
                break;
            }
            let next = level
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => node_hash(a, b),
                    _ => pair[0],
                })
                .collect();
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// The commitment root.
    pub fn root(&self) -> Digest32 {
        // `from_leaf_hashes` guarantees at least one non-empty level.
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Digest32::ZERO)
    }

    /// Number of leaves committed.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    /// Whether `raw` is one of the committed leaves.
    pub fn contains(&self, raw: &[u8]) -> bool {
        self.levels[0].binary_search(&leaf_hash(raw)).is_ok()
    }

    /// Inclusion proof for `raw`.
    pub fn proof(&self, raw: &[u8]) -> Result<Vec<Digest32>, MerkleError> {
        let index = self.levels[0]
            .binary_search(&leaf_hash(raw))
            .map_err(|_| MerkleError::LeafNotFound)?;
        Ok(self.proof_at(index))
    }

    fn proof_at(&self, mut index: usize) -> Vec<Digest32> {
        let mut path = Vec::with_capacity(self.height());
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(index ^ 1) {
                path.push(*sibling);
            }
            index /= 2;
        }
        path
    }
}

// ---------------------------------------------------------------------------
// Free-function interface
// ---------------------------------------------------------------------------

/// Commitment root over a set of raw leaves.
pub fn build_root<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Digest32, MerkleError> {
    MerkleTree::from_leaves(leaves).map(|t| t.root())
}

/// Inclusion proof for `target` within `leaves`.
pub fn build_proof<L: AsRef<[u8]>>(
    leaves: &[L],
    target: &[u8],
) -> Result<Vec<Digest32>, MerkleError> {
    MerkleTree::from_leaves(leaves)?.proof(target)
}

/// Verify that `leaf_raw` is committed under `root`.
///
/// Never errors: a malformed or foreign proof simply does not reproduce the
/// root.
pub fn verify(leaf_raw: &[u8], proof: &[Digest32], root: &Digest32) -> bool {
    let computed = proof
        .iter()
        .fold(leaf_hash(leaf_raw), |cur, sibling| node_hash(&cur, sibling));
    computed == *root
}

//! # Merkle Subcommand
//!
//! Off-ledger allowlist tooling. An allowlist file holds one hex address
//! per line; blank lines and lines starting with `#` are ignored. An address
//! may appear only once, so the member count published with a root is the
//! number of distinct graduates. Proofs are written as a JSON array of hex
//! sibling digests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use apec_core::{Address, Digest32};
use apec_crypto::merkle::{self, MerkleTree};

/// Arguments for `apec merkle`.
#[derive(Args, Debug)]
pub struct MerkleArgs {
    #[command(subcommand)]
    pub command: MerkleCommand,
}

/// Merkle subcommands.
#[derive(Subcommand, Debug)]
pub enum MerkleCommand {
    /// Print the commitment root and member count of an allowlist.
    Root {
        /// Allowlist file.
        #[arg(value_name = "ALLOWLIST")]
        allowlist: PathBuf,
    },

    /// Build the inclusion proof for one address.
    Proof {
        /// Allowlist file.
        #[arg(value_name = "ALLOWLIST")]
        allowlist: PathBuf,
        /// Address to prove.
        #[arg(long)]
        address: Address,
        /// Write the proof here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check a proof against a root. Exits 1 if it does not verify.
    Verify {
        /// Claimed member.
        #[arg(long)]
        address: Address,
        /// Commitment root (hex).
        #[arg(long)]
        root: Digest32,
        /// Proof file (JSON array of hex digests).
        #[arg(long)]
        proof: PathBuf,
    },
}

/// Execute `apec merkle`.
pub fn run_merkle(args: &MerkleArgs) -> Result<u8> {
    match &args.command {
        MerkleCommand::Root { allowlist } => cmd_root(allowlist),
        MerkleCommand::Proof {
            allowlist,
            address,
            out,
        } => cmd_proof(allowlist, address, out.as_deref()),
        MerkleCommand::Verify {
            address,
            root,
            proof,
        } => cmd_verify(address, root, proof),
    }
}

fn cmd_root(allowlist: &Path) -> Result<u8> {
    let members = read_allowlist(allowlist)?;
    let tree = MerkleTree::from_leaves(&members).context("failed to build commitment")?;
    println!("root:    {}", tree.root());
    println!("members: {}", tree.leaf_count());
    Ok(0)
}

fn cmd_proof(allowlist: &Path, address: &Address, out: Option<&Path>) -> Result<u8> {
    let members = read_allowlist(allowlist)?;
    let proof = merkle::build_proof(&members, address.as_bytes())
        .with_context(|| format!("cannot prove {address}"))?;
    let json = serde_json::to_string_pretty(&proof)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write proof: {}", path.display()))?;
            println!("OK: wrote {} siblings to {}", proof.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(0)
}

fn cmd_verify(address: &Address, root: &Digest32, proof_path: &Path) -> Result<u8> {
    let proof = read_proof(proof_path)?;
    if merkle::verify(address.as_bytes(), &proof, root) {
        println!("OK: {address} is committed under {root}");
        Ok(0)
    } else {
        println!("FAIL: proof does not reproduce {root}");
        Ok(1)
    }
}

/// Parse an allowlist file.
pub fn read_allowlist(path: &Path) -> Result<Vec<Address>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read allowlist: {}", path.display()))?;
    let members = parse_allowlist(&text)
        .with_context(|| format!("invalid allowlist: {}", path.display()))?;
    if members.is_empty() {
        bail!("allowlist is empty: {}", path.display());
    }
    Ok(members)
}

fn parse_allowlist(text: &str) -> Result<Vec<Address>> {
    let mut seen: HashMap<Address, usize> = HashMap::new();
    let mut members = Vec::new();
    for (n, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let address = line
            .parse::<Address>()
            .with_context(|| format!("line {n}: {line:?}"))?;
        if let Some(first) = seen.insert(address, n) {
            bail!("line {n}: {address} already listed on line {first}");
        }
        members.push(address);
    }
    Ok(members)
}

/// Read a proof file.
pub fn read_proof(path: &Path) -> Result<Vec<Digest32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read proof: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid proof: {}", path.display()))
}

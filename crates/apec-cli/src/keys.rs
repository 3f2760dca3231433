//! # Key Files
//!
//! `apec keygen` writes two files: `<prefix>.key` holding the hex secret
//! seed, and `<prefix>.pub` holding the hex address. Every `apec ledger`
//! command signs with a `.key` file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use apec_crypto::Ed25519KeyPair;

/// Arguments for `apec keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,

    /// Prefix for the key filenames.
    #[arg(long, default_value = "apec")]
    pub prefix: String,
}

/// Execute `apec keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    std::fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "failed to create output directory: {}",
            args.output.display()
        )
    })?;

    let keypair = Ed25519KeyPair::generate();
    let key_path = args.output.join(format!("{}.key", args.prefix));
    let pub_path = args.output.join(format!("{}.pub", args.prefix));

    if key_path.exists() {
        bail!("refusing to overwrite existing key: {}", key_path.display());
    }

    std::fs::write(&key_path, keypair.seed_hex())
        .with_context(|| format!("failed to write secret key: {}", key_path.display()))?;
    std::fs::write(&pub_path, keypair.address().to_hex())
        .with_context(|| format!("failed to write address: {}", pub_path.display()))?;

    println!("OK: generated Ed25519 key pair");
    println!("  Secret key: {}", key_path.display());
    println!("  Address:    {}", keypair.address());
    Ok(0)
}

/// Read a `.key` file.
pub fn load_keypair(path: &Path) -> Result<Ed25519KeyPair> {
    let hex = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file: {}", path.display()))?;
    Ed25519KeyPair::from_seed_hex(hex.trim())
        .with_context(|| format!("invalid key file: {}", path.display()))
}

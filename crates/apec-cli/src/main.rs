//! # apec CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apec_cli::keys::{run_keygen, KeygenArgs};
use apec_cli::ledger::{run_ledger, LedgerArgs};
use apec_cli::merkle::{run_merkle, MerkleArgs};

/// APEC certification ledger toolkit.
///
/// Generates account keys, builds allowlist commitments and membership
/// proofs, and submits signed program instructions to a file-backed ledger.
#[derive(Parser, Debug)]
#[command(name = "apec", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Program configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an Ed25519 account key pair.
    Keygen(KeygenArgs),

    /// Allowlist commitments: root, proof, verify.
    Merkle(MerkleArgs),

    /// Submit program instructions against a ledger state file.
    Ledger(LedgerArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!("apec CLI starting");

    let result = match cli.command {
        Commands::Keygen(args) => run_keygen(&args),
        Commands::Merkle(args) => run_merkle(&args),
        Commands::Ledger(args) => apec_cli::load_config(cli.config.as_deref())
            .and_then(|config| run_ledger(&args, config)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

//! # Ledger Subcommand
//!
//! Each mutating command signs one instruction with the given key, then
//! loads the state file, executes it, and saves the state back while holding
//! the state lock. The outcome is printed as JSON. A rejected instruction
//! leaves the file untouched.
//!
//! Providers and courses are addressed by numeric id; their record keys
//! are derived the same way the program derives them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use apec_core::{Address, CourseId, ProviderId, RecordKey};
use apec_crypto::merkle;
use apec_ledger::{Instruction, ProgramConfig, Transaction};

use crate::keys::load_keypair;
use crate::merkle::{read_allowlist, read_proof};
use crate::state::LedgerState;

/// Arguments for `apec ledger`.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Ledger state file.
    #[arg(long, default_value = "apec-ledger.json")]
    pub state: PathBuf,

    #[command(subcommand)]
    pub command: LedgerCommand,
}

/// Ledger subcommands.
#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Register a provider; the signer becomes its authority.
    InitProvider {
        /// Signer key file.
        #[arg(long)]
        key: PathBuf,
        /// Provider id.
        #[arg(long)]
        id: u64,
        /// Short name.
        #[arg(long)]
        name: String,
    },

    /// Create a course under a provider.
    CreateCourse {
        /// Signer key file (provider authority).
        #[arg(long)]
        key: PathBuf,
        /// Owning provider id.
        #[arg(long)]
        provider_id: u64,
        /// Course id.
        #[arg(long)]
        id: u64,
        /// Short name.
        #[arg(long)]
        name: String,
    },

    /// Mint an enrollment credential to the signer.
    Enroll {
        /// Signer key file.
        #[arg(long)]
        key: PathBuf,
        /// Provider id.
        #[arg(long)]
        provider_id: u64,
        /// Course id.
        #[arg(long)]
        course_id: u64,
        /// Token display name.
        #[arg(long)]
        name: String,
        /// Token symbol.
        #[arg(long)]
        symbol: String,
        /// Metadata URI.
        #[arg(long)]
        uri: String,
    },

    /// Publish the allowlist commitment for a course.
    Publish {
        /// Signer key file (provider or course authority).
        #[arg(long)]
        key: PathBuf,
        /// Provider id.
        #[arg(long)]
        provider_id: u64,
        /// Course id.
        #[arg(long)]
        course_id: u64,
        /// Allowlist file to commit to.
        #[arg(long)]
        allowlist: PathBuf,
    },

    /// Claim a certified credential.
    Claim {
        /// Signer key file (pays for the claim).
        #[arg(long)]
        key: PathBuf,
        /// Provider id.
        #[arg(long)]
        provider_id: u64,
        /// Course id.
        #[arg(long)]
        course_id: u64,
        /// Claimant address; defaults to the signer.
        #[arg(long)]
        claimant: Option<Address>,
        /// Proof file from `apec merkle proof`.
        #[arg(long, conflicts_with = "allowlist")]
        proof: Option<PathBuf>,
        /// Allowlist to build the proof from.
        #[arg(long)]
        allowlist: Option<PathBuf>,
        /// Token display name.
        #[arg(long)]
        name: String,
        /// Metadata URI.
        #[arg(long)]
        uri: String,
    },

    /// Print stored records for a provider, course, or claim.
    Show {
        /// Provider id.
        #[arg(long)]
        provider_id: u64,
        /// Course id.
        #[arg(long)]
        course_id: Option<u64>,
        /// Claimant address (requires a course).
        #[arg(long, requires = "course_id")]
        claimant: Option<Address>,
    },
}

fn provider_key(id: u64) -> RecordKey {
    RecordKey::provider(ProviderId(id))
}

fn course_key(provider_id: u64, course_id: u64) -> RecordKey {
    RecordKey::course(&provider_key(provider_id), CourseId(course_id))
}

fn commitment_key(provider_id: u64, course_id: u64) -> RecordKey {
    RecordKey::commitment(
        &provider_key(provider_id),
        &course_key(provider_id, course_id),
    )
}

/// Execute `apec ledger`.
pub fn run_ledger(args: &LedgerArgs, config: ProgramConfig) -> Result<u8> {
    match &args.command {
        LedgerCommand::InitProvider { key, id, name } => submit(
            &args.state,
            config,
            key,
            Instruction::InitProvider {
                id: ProviderId(*id),
                short_name: name.clone(),
            },
        ),
        LedgerCommand::CreateCourse {
            key,
            provider_id,
            id,
            name,
        } => submit(
            &args.state,
            config,
            key,
            Instruction::CreateCourse {
                provider: provider_key(*provider_id),
                id: CourseId(*id),
                short_name: name.clone(),
            },
        ),
        LedgerCommand::Enroll {
            key,
            provider_id,
            course_id,
            name,
            symbol,
            uri,
        } => submit(
            &args.state,
            config,
            key,
            Instruction::Enroll {
                course: course_key(*provider_id, *course_id),
                display_name: name.clone(),
                symbol: symbol.clone(),
                uri: uri.clone(),
            },
        ),
        LedgerCommand::Publish {
            key,
            provider_id,
            course_id,
            allowlist,
        } => {
            let members = read_allowlist(allowlist)?;
            let root = merkle::build_root(&members).context("failed to build commitment")?;
            submit(
                &args.state,
                config,
                key,
                Instruction::CreateCommitment {
                    provider: provider_key(*provider_id),
                    course: course_key(*provider_id, *course_id),
                    root,
                    member_count: members.len() as u64,
                },
            )
        }
        LedgerCommand::Claim {
            key,
            provider_id,
            course_id,
            claimant,
            proof,
            allowlist,
            name,
            uri,
        } => {
            let keypair = load_keypair(key)?;
            let claimant = claimant.unwrap_or_else(|| keypair.address());
            let proof = match (proof, allowlist) {
                (Some(path), _) => read_proof(path)?,
                (None, Some(path)) => {
                    let members = read_allowlist(path)?;
                    merkle::build_proof(&members, claimant.as_bytes())
                        .with_context(|| format!("{claimant} is not on the allowlist"))?
                }
                (None, None) => bail!("claim needs --proof or --allowlist"),
            };
            let instruction = Instruction::ClaimCertified {
                commitment: commitment_key(*provider_id, *course_id),
                claimant,
                proof,
                display_name: name.clone(),
                uri: uri.clone(),
            };
            submit_signed(&args.state, config, &keypair, instruction)
        }
        LedgerCommand::Show {
            provider_id,
            course_id,
            claimant,
        } => show(&args.state, config, *provider_id, *course_id, claimant.as_ref()),
    }
}

fn submit(
    state_path: &Path,
    config: ProgramConfig,
    key: &Path,
    instruction: Instruction,
) -> Result<u8> {
    let keypair = load_keypair(key)?;
    submit_signed(state_path, config, &keypair, instruction)
}

fn submit_signed(
    state_path: &Path,
    config: ProgramConfig,
    keypair: &apec_crypto::Ed25519KeyPair,
    instruction: Instruction,
) -> Result<u8> {
    let name = instruction.name();
    let tx = Transaction::sign(instruction, keypair).context("failed to sign transaction")?;
    let tx_id = tx.id().context("failed to compute transaction id")?;
    tracing::info!(instruction = name, %tx_id, signer = %tx.signer, "submitting transaction");

    let outcome = LedgerState::update(state_path, config, |program| {
        program
            .execute(&tx)
            .with_context(|| format!("{name} rejected"))
    })?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(0)
}

fn show(
    state_path: &Path,
    config: ProgramConfig,
    provider_id: u64,
    course_id: Option<u64>,
    claimant: Option<&Address>,
) -> Result<u8> {
    let out = LedgerState::read(state_path, config, |program| {
        let mut out = serde_json::Map::new();

        let provider = program.provider(&provider_key(provider_id))?;
        out.insert("provider".into(), serde_json::to_value(&provider)?);

        if let Some(course_id) = course_id {
            let course = program.course(&course_key(provider_id, course_id))?;
            out.insert("course".into(), serde_json::to_value(&course)?);

            let commitment = commitment_key(provider_id, course_id);
            if let Ok(record) = program.commitment(&commitment) {
                out.insert("commitment".into(), serde_json::to_value(&record)?);
            }
            if let Some(who) = claimant {
                out.insert(
                    "claim_state".into(),
                    serde_json::to_value(program.claim_state(&commitment, who))?,
                );
                if let Some(receipt) = program.claim_receipt(&commitment, who) {
                    out.insert("receipt".into(), serde_json::to_value(&receipt)?);
                }
            }
        }
        Ok(out)
    })?;

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(0)
}

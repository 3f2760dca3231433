//! # apec-cli: Command-Line Tool for the Certification Ledger
//!
//! ## Subcommands
//!
//! - `apec keygen`: Ed25519 key pair for a ledger account.
//! - `apec merkle root|proof|verify`: allowlist commitments, off-ledger.
//! - `apec ledger ...`: signed program instructions against a JSON state
//!   file.
//!
//! ```bash
//! apec keygen --prefix authority
//! apec merkle root graduates.txt
//! apec ledger init-provider --key authority.key --id 1 --name APEC
//! apec ledger publish --key authority.key --provider-id 1 --course-id 1 --allowlist graduates.txt
//! apec ledger claim --key student.key --provider-id 1 --course-id 1 --allowlist graduates.txt
//! ```

pub mod keys;
pub mod ledger;
pub mod merkle;
pub mod state;

use std::path::Path;

use anyhow::{Context, Result};

use apec_ledger::ProgramConfig;

/// Load program limits from `path`, or the defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<ProgramConfig> {
    match path {
        Some(p) => ProgramConfig::load(p)
            .with_context(|| format!("failed to load config: {}", p.display())),
        None => Ok(ProgramConfig::default()),
    }
}

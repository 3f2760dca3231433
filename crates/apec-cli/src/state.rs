//! # Ledger State File
//!
//! The CLI keeps the whole ledger in one JSON document: every record keyed
//! by its hex key, plus every token the issuer has minted. A missing file
//! is an empty ledger.
//!
//! Every command goes through [`LedgerState::update`] or
//! [`LedgerState::read`], which hold a lock on a sibling `.lock` file for the
//! whole load, execute, save cycle. Concurrent `apec` processes on the same
//! state file run one after another and never overwrite each other's
//! records.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use apec_core::RecordKey;
use apec_ledger::{CertProgram, IssuedToken, MemoryStore, MemoryTokenIssuer, ProgramConfig};
use apec_state::Record;

/// Serialized ledger contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Records by key.
    pub records: BTreeMap<RecordKey, Record>,
    /// Issued tokens, ordered by handle.
    pub tokens: Vec<IssuedToken>,
}

impl LedgerState {
    /// Run `apply` against the ledger at `path` and save the result.
    ///
    /// Holds the exclusive state lock throughout. If `apply` fails the file
    /// is left untouched.
    pub fn update<T>(
        path: &Path,
        config: ProgramConfig,
        apply: impl FnOnce(&CertProgram) -> Result<T>,
    ) -> Result<T> {
        let _lock = StateLock::exclusive(path)?;
        let program = Self::load(path)?.into_program(config)?;
        let out = apply(&program)?;
        Self::capture(&program).save(path)?;
        Ok(out)
    }

    /// Run `inspect` against the ledger at `path` under a shared lock.
    pub fn read<T>(
        path: &Path,
        config: ProgramConfig,
        inspect: impl FnOnce(&CertProgram) -> Result<T>,
    ) -> Result<T> {
        let _lock = StateLock::shared(path)?;
        let program = Self::load(path)?.into_program(config)?;
        inspect(&program)
    }

    /// Read `path`, or an empty state if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse state: {}", path.display()))
    }

    /// Write to `path`, replacing it atomically via a sibling temp file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write state: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace state: {}", path.display()))?;
        Ok(())
    }

    /// Rebuild a running program.
    pub fn into_program(self, config: ProgramConfig) -> Result<CertProgram> {
        let store = MemoryStore::from_snapshot(self.records).context("corrupt state file")?;
        let issuer = MemoryTokenIssuer::from_tokens(self.tokens);
        Ok(CertProgram::new(store, issuer, config))
    }

    /// Capture a program's current contents.
    pub fn capture(program: &CertProgram) -> Self {
        Self {
            records: program.store().snapshot(),
            tokens: program.issuer().snapshot(),
        }
    }
}

/// Advisory lock on `<state>.lock`, released on drop.
///
/// The state file itself is replaced by rename on save, so the lock lives on
/// a file that is never replaced.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Block until no other process holds any lock on `state`.
    pub fn exclusive(state: &Path) -> Result<Self> {
        let lock = Self::open(state)?;
        lock.file
            .lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock.path.display()))?;
        Ok(lock)
    }

    /// Block until no other process holds the exclusive lock on `state`.
    pub fn shared(state: &Path) -> Result<Self> {
        let lock = Self::open(state)?;
        lock.file
            .lock_shared()
            .with_context(|| format!("failed to lock {}", lock.path.display()))?;
        Ok(lock)
    }

    fn open(state: &Path) -> Result<Self> {
        let path = lock_path(state);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing::trace!(path = %path.display(), "opened state lock");
        Ok(Self { file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release state lock");
        }
    }
}

fn lock_path(state: &Path) -> PathBuf {
    let mut name = OsString::from(state.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apec_core::{Address, ProviderId};

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = LedgerState::load(&dir.path().join("ledger.json")).unwrap();
        assert!(state.records.is_empty());
        assert!(state.tokens.is_empty());
    }

    #[test]
    fn save_load_roundtrip_through_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let program = LedgerState::default()
            .into_program(ProgramConfig::default())
            .unwrap();
        program
            .init_provider(&Address([1; 32]), ProviderId(1), "APEC")
            .unwrap();
        LedgerState::capture(&program).save(&path).unwrap();

        let reloaded = LedgerState::load(&path)
            .unwrap()
            .into_program(ProgramConfig::default())
            .unwrap();
        assert!(reloaded
            .provider(&RecordKey::provider(ProviderId(1)))
            .is_ok());
    }

    #[test]
    fn lock_file_sits_beside_state() {
        assert_eq!(
            lock_path(Path::new("/tmp/apec-ledger.json")),
            PathBuf::from("/tmp/apec-ledger.json.lock")
        );
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        LedgerState::update(&path, ProgramConfig::default(), |program| {
            program.init_provider(&Address([1; 32]), ProviderId(1), "APEC")?;
            Ok(())
        })
        .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = LedgerState::update(&path, ProgramConfig::default(), |program| -> Result<()> {
            program.init_provider(&Address([2; 32]), ProviderId(2), "NEXT")?;
            anyhow::bail!("abort")
        });
        assert!(err.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(LedgerState::load(&path).is_err());
    }
}

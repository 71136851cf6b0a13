//! JSON file ledger with atomic replace-on-write.

use super::LedgerStore;
use crate::config::Settings;
use crate::types::Ledger;
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Ledger persisted as a pretty-printed JSON file.
///
/// Every read goes back to disk. Each write goes to its own sibling temporary
/// file which is synced and then renamed over the ledger, so readers only ever
/// observe a complete file. Concurrent writers may lose updates but never
/// corrupt the ledger.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the ledger JSON file
    path: PathBuf,
    /// Cash for a ledger created on first access
    initial_cash: Decimal,
}

impl JsonFileStore {
    /// Create a store for the given path.
    pub fn new(path: impl Into<PathBuf>, initial_cash: Decimal) -> Self {
        Self {
            path: path.into(),
            initial_cash,
        }
    }

    /// Create a store from the configured path and initial cash.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.ledger_path.clone(), settings.initial_cash)
    }

    /// Get the ledger path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the ledger file exists, creating it if needed.
    pub fn ensure_initialized(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Write the serialized ledger to a fresh temporary file next to the
    /// ledger and sync it. Each call gets its own file, so concurrent writers
    /// never share one.
    pub(crate) fn stage(&self, ledger: &Ledger) -> Result<NamedTempFile> {
        let content = serde_json::to_string_pretty(ledger)?;
        self.stage_bytes(content.as_bytes())
            .map_err(|source| self.persistence(source))
    }

    fn stage_bytes(&self, bytes: &[u8]) -> io::Result<NamedTempFile> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent)?;

        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(parent)?;

        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        Ok(temp)
    }

    /// Atomically swap a staged file into place. The temporary file is removed
    /// when the swap fails.
    pub(crate) fn commit(&self, temp: NamedTempFile) -> Result<()> {
        temp.persist(&self.path).map_err(|e| self.persistence(e.error))?;
        self.sync_parent();
        Ok(())
    }

    /// Publish the first ledger without clobbering one another writer created
    /// in the meantime. Returns the ledger that ended up on disk.
    fn initialize(&self) -> Result<Ledger> {
        let ledger = Ledger::with_cash(self.initial_cash);
        let temp = self.stage(&ledger)?;

        match temp.persist_noclobber(&self.path) {
            Ok(_) => {
                self.sync_parent();
                tracing::info!(
                    path = %self.path.display(),
                    cash = %self.initial_cash,
                    "Initialized ledger"
                );
                Ok(ledger)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %self.path.display(), "Ledger created concurrently");
                self.load()
            }
            // Filesystems without no-clobber renames fall back to a plain atomic write
            Err(_) => {
                self.write(&ledger)?;
                tracing::info!(path = %self.path.display(), "Initialized ledger");
                Ok(ledger)
            }
        }
    }

    fn load(&self) -> Result<Ledger> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    #[cfg(unix)]
    fn sync_parent(&self) {
        if let Ok(dir) = File::open(self.parent_dir()) {
            let _ = dir.sync_all();
        }
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) {}

    fn persistence(&self, source: io::Error) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl LedgerStore for JsonFileStore {
    fn read(&self) -> Result<Ledger> {
        match self.load() {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => self.initialize(),
            other => other,
        }
    }

    fn write(&self, ledger: &Ledger) -> Result<()> {
        let temp = self.stage(ledger)?;
        self.commit(temp)?;
        tracing::debug!(
            path = %self.path.display(),
            transactions = ledger.transactions.len(),
            "Wrote ledger"
        );
        Ok(())
    }
}

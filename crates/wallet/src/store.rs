//! Wallet persistence: a single JSON file.

use std::path::{Path, PathBuf};

use sw_domain::Wallet;

use crate::error::WalletError;

pub struct WalletStore {
    path: PathBuf,
}

impl WalletStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored wallet, or `None` if no wallet has been created yet.
    pub fn load(&self) -> Result<Option<Wallet>, WalletError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let wallet = serde_json::from_str(&raw)?;
        Ok(Some(wallet))
    }

    /// Persist `wallet`, replacing any previous state. Writes a sibling
    /// temp file first and renames it over the target, so a crash mid-write
    /// cannot leave a torn wallet behind.
    pub fn save(&self, wallet: &Wallet) -> Result<(), WalletError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let raw = serde_json::to_string_pretty(wallet)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "wallet saved");
        Ok(())
    }
}

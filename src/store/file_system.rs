//! Persistence collaborator
//!
//! The vault core never touches the filesystem directly; it talks to a
//! [`VaultFile`], which the host process provides. [`FsVaultFile`] is the
//! standard implementation over a single file path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::VaultConfig;
use crate::crypto::envelope::Envelope;
use crate::error::StorageError;

/// Abstract storage for the serialized envelope.
pub trait VaultFile: Send + Sync {
    fn exists(&self) -> bool;

    /// Read the persisted envelope bytes, `None` when no store exists yet.
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Copy the current store to `destination`.
    fn backup(&self, destination: &Path) -> Result<(), StorageError>;

    /// Replace the store with the file at `source`.
    ///
    /// The source must contain the four required envelope fields; an
    /// existing store is backed up first under an ISO-8601-timestamped name.
    fn restore(&self, source: &Path) -> Result<(), StorageError>;

    /// Delete the store, backing it up first under a name distinct from
    /// restore backups.
    fn reset(&self) -> Result<(), StorageError>;
}

/// Filesystem-backed store file.
pub struct FsVaultFile {
    path: PathBuf,
}

impl FsVaultFile {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            path: config.vault_path(),
        }
    }

    /// Point at an explicit file path (for testing).
    pub fn new_with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path like `wallets.enc.restore-backup.2024-05-01T12-30-00.000Z`.
    fn timestamped_sibling(&self, tag: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wallets.enc".to_string());
        self.path
            .with_file_name(format!("{file_name}.{tag}.{timestamp}"))
    }
}

impl VaultFile for FsVaultFile {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&self.path)?))
    }

    fn write(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn backup(&self, destination: &Path) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Err(StorageError::FileNotFound(self.path.display().to_string()));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.path, destination)?;
        log::info!("Vault backed up to {:?}", destination);
        Ok(())
    }

    fn restore(&self, source: &Path) -> Result<(), StorageError> {
        let bytes = fs::read(source)
            .map_err(|_| StorageError::FileNotFound(source.display().to_string()))?;

        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| StorageError::InvalidBackup(source.display().to_string()))?;
        if !Envelope::json_has_required_fields(&value) {
            return Err(StorageError::InvalidBackup(source.display().to_string()));
        }

        if self.path.exists() {
            let backup_path = self.timestamped_sibling("restore-backup");
            fs::copy(&self.path, &backup_path)?;
            log::info!("Existing vault backed up to {:?} before restore", backup_path);
        }

        self.write(&bytes)
    }

    fn reset(&self) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        let backup_path = self.timestamped_sibling("reset-backup");
        fs::copy(&self.path, &backup_path)?;
        log::warn!("Resetting vault {:?}, backup at {:?}", self.path, backup_path);
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

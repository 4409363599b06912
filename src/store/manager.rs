//! Vault manager
//!
//! Orchestrates the persistence collaborator, the session key cache and the
//! crypto engine. Every mutation is a full decrypt -> modify -> re-encrypt
//! round trip, and all mutations for one vault are serialized through a
//! single-writer gate so that concurrent callers cannot overwrite each
//! other's changes.

use std::path::Path;
use std::time::Duration;

use tokio::sync::Mutex;

use super::export::VaultSnapshot;
use super::file_system::{FsVaultFile, VaultFile};
use super::models::{AddressBookEntry, LedgerNetwork, WalletRecord, WalletStore};
use crate::config::VaultConfig;
use crate::crypto::envelope::{Envelope, EnvelopeFormat, SALT_LEN};
use crate::crypto::kdf::{self, KdfParams, MasterKey};
use crate::crypto::{cipher, legacy};
use crate::error::VaultError;
use crate::session::SessionKeyCache;

/// Minimum master password length for newly created vaults.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Provenance tag stamped on wallets merged in by a legacy import.
const LEGACY_PROVENANCE: &str = "legacy-store";

/// Outcome of a legacy import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyImport {
    pub wallets: usize,
    pub contacts: usize,
}

pub struct VaultManager {
    file: Box<dyn VaultFile>,
    session: SessionKeyCache,
    kdf: KdfParams,
    kdf_timeout: Duration,
    write_gate: Mutex<()>,
}

impl VaultManager {
    pub fn new(config: &VaultConfig) -> Self {
        Self::new_with_file(
            Box::new(FsVaultFile::new(config)),
            KdfParams::default(),
            Duration::from_secs(config.kdf_timeout_secs),
        )
    }

    /// Build a manager over an explicit collaborator (for testing, or for a
    /// host that persists somewhere other than the local filesystem).
    pub fn new_with_file(
        file: Box<dyn VaultFile>,
        kdf: KdfParams,
        kdf_timeout: Duration,
    ) -> Self {
        Self {
            file,
            session: SessionKeyCache::new(kdf.clone()),
            kdf,
            kdf_timeout,
            write_gate: Mutex::new(()),
        }
    }

    /// The session key cache for this vault.
    pub fn session(&self) -> &SessionKeyCache {
        &self.session
    }

    /// Unlock the vault: verify the password against the persisted envelope
    /// (or create a fresh store when none exists) and cache the derived key
    /// for the session.
    pub async fn unlock(&self, password: &str) -> Result<WalletStore, VaultError> {
        match self.read_envelope()? {
            Some(envelope) => {
                let (store, key, salt) = self.decrypt_envelope(password, &envelope).await?;
                self.session.store(key, salt);
                log::info!("Vault unlocked ({} wallets)", store.wallets.len());
                Ok(store)
            }
            None => {
                if password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(VaultError::PasswordTooShort(MIN_PASSWORD_LEN));
                }
                let salt = cipher::generate_salt();
                let key = self.derive(password, &salt).await?;
                self.session.store(key.clone(), salt);

                let store = WalletStore::default();
                let bytes = self.encrypt_store(&key, &salt, &store)?;
                self.file.write(&bytes)?;
                log::info!("Created new vault");
                Ok(store)
            }
        }
    }

    /// Drop the session key. Must be called on logout and app exit.
    pub fn lock(&self) {
        self.session.clear();
    }

    /// Decrypt and return the whole store. An absent file is an empty store.
    pub async fn load(&self, password: &str) -> Result<WalletStore, VaultError> {
        match self.read_envelope()? {
            Some(envelope) => {
                let (store, _, _) = self.decrypt_envelope(password, &envelope).await?;
                Ok(store)
            }
            None => Ok(WalletStore::default()),
        }
    }

    /// Encrypt and persist `store`, always in the current format.
    ///
    /// Reuses the session key and salt when unlocked, otherwise derives a
    /// fresh key under a fresh salt.
    pub async fn save(&self, password: &str, store: &WalletStore) -> Result<(), VaultError> {
        let _gate = self.write_gate.lock().await;
        let (key, salt) = match (self.session.key(), self.session.salt()) {
            (Some(key), Some(salt)) => (key, salt),
            _ => {
                let salt = cipher::generate_salt();
                let key = self.derive(password, &salt).await?;
                (key, salt)
            }
        };
        let bytes = self.encrypt_store(&key, &salt, store)?;
        self.file.write(&bytes)?;
        Ok(())
    }

    pub async fn add_wallet(&self, record: WalletRecord) -> Result<(), VaultError> {
        let name = record.name.clone();
        self.mutate(move |store| store.add_wallet(record)).await?;
        log::info!("Added wallet '{}'", name);
        Ok(())
    }

    pub async fn remove_wallet(&self, name: &str) -> Result<WalletRecord, VaultError> {
        let name = name.to_string();
        let record = self
            .mutate(move |store| store.remove_wallet(&name))
            .await?;
        log::info!("Removed wallet '{}'", record.name);
        Ok(record)
    }

    pub async fn set_active_wallet(&self, name: Option<&str>) -> Result<(), VaultError> {
        let name = name.map(str::to_string);
        self.mutate(move |store| store.set_active_wallet(name.as_deref()))
            .await
    }

    pub async fn rename_wallet(&self, old: &str, new: &str) -> Result<(), VaultError> {
        let (old, new) = (old.to_string(), new.to_string());
        self.mutate(move |store| store.rename_wallet(&old, &new))
            .await
    }

    pub async fn update_wallet_balance(
        &self,
        name: &str,
        balance: &str,
    ) -> Result<(), VaultError> {
        let (name, balance) = (name.to_string(), balance.to_string());
        self.mutate(move |store| store.update_balance(&name, &balance))
            .await
    }

    pub async fn update_wallet_network(
        &self,
        name: &str,
        network: LedgerNetwork,
    ) -> Result<(), VaultError> {
        let name = name.to_string();
        self.mutate(move |store| store.update_network(&name, network))
            .await
    }

    pub async fn add_address_book_entry(
        &self,
        entry: AddressBookEntry,
    ) -> Result<(), VaultError> {
        self.mutate(move |store| {
            store.upsert_contact(entry);
            Ok(())
        })
        .await
    }

    /// Returns whether an entry with the label existed.
    pub async fn remove_address_book_entry(&self, label: &str) -> Result<bool, VaultError> {
        let label = label.to_string();
        self.mutate(move |store| Ok(store.remove_contact(&label)))
            .await
    }

    /// Decrypted copy of the store with an export timestamp.
    pub async fn export_snapshot(&self, password: &str) -> Result<VaultSnapshot, VaultError> {
        Ok(VaultSnapshot::new(self.load(password).await?))
    }

    /// Merge wallets and contacts from a legacy plaintext export into the
    /// store and persist the result in the current format.
    pub async fn import_legacy(
        &self,
        password: &str,
        legacy_json: &str,
    ) -> Result<LegacyImport, VaultError> {
        let _gate = self.write_gate.lock().await;

        let (mut store, key, salt) = match self.read_envelope()? {
            Some(envelope) => self.decrypt_envelope(password, &envelope).await?,
            None => {
                let salt = cipher::generate_salt();
                let key = self.derive(password, &salt).await?;
                (WalletStore::default(), key, salt)
            }
        };

        let legacy_store = WalletStore::from_legacy_json(legacy_json)?;
        let (wallets, contacts) = store.merge_legacy(legacy_store, LEGACY_PROVENANCE);

        let bytes = self.encrypt_store(&key, &salt, &store)?;
        self.file.write(&bytes)?;

        log::info!(
            "Imported {} wallets and {} contacts from legacy data",
            wallets,
            contacts
        );
        Ok(LegacyImport { wallets, contacts })
    }

    /// Try to decrypt the store with `password`. Authentication failures
    /// come back as `false`; anything else (I/O, malformed store) is
    /// re-raised.
    pub async fn verify_password(&self, password: &str) -> Result<bool, VaultError> {
        match self.load(password).await {
            Ok(_) => Ok(true),
            Err(VaultError::InvalidPasswordOrCorruptedData)
            | Err(VaultError::InvalidPasswordOrIncompatibleFormat) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete the persisted envelope (the collaborator backs it up first)
    /// and lock the session.
    pub async fn reset(&self) -> Result<(), VaultError> {
        let _gate = self.write_gate.lock().await;
        self.file.reset()?;
        self.session.clear();
        Ok(())
    }

    /// Replace the store from a backup file and lock the session; the new
    /// envelope may be keyed under a different password.
    pub async fn restore_from(&self, source: &Path) -> Result<(), VaultError> {
        let _gate = self.write_gate.lock().await;
        self.file.restore(source)?;
        self.session.clear();
        Ok(())
    }

    // ---- internals -------------------------------------------------------

    fn read_envelope(&self) -> Result<Option<Envelope>, VaultError> {
        match self.file.read()? {
            Some(bytes) => Ok(Some(Envelope::from_json(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decrypt an envelope under `password`, dispatching on its version
    /// tag, and hand back the key and salt so callers can reuse them.
    async fn decrypt_envelope(
        &self,
        password: &str,
        envelope: &Envelope,
    ) -> Result<(WalletStore, MasterKey, [u8; SALT_LEN]), VaultError> {
        let salt = envelope.decode_fields()?.salt;
        let key = self.resolve_key(password, &salt).await?;

        let store = match envelope.format() {
            EnvelopeFormat::Current => {
                let plaintext = cipher::decrypt_with_key(&key, envelope)?;
                WalletStore::from_json(&plaintext)?
            }
            EnvelopeFormat::Legacy => {
                let plaintext = legacy::decrypt_with_key(&key, envelope)?;
                log::info!("Loaded legacy-format vault; next save rewrites it in the current format");
                WalletStore::from_legacy_json(&plaintext)?
            }
        };
        Ok((store, key, salt))
    }

    /// Load-modify-save round trip under the write gate, keyed by the
    /// session. Fails with `MissingMasterPassword` when locked.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut WalletStore) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let _gate = self.write_gate.lock().await;

        let key = self.session.key().ok_or(VaultError::MissingMasterPassword)?;
        let salt = self.session.salt().ok_or(VaultError::MissingMasterPassword)?;

        let mut store = match self.read_envelope()? {
            Some(envelope) => match envelope.format() {
                EnvelopeFormat::Current => {
                    WalletStore::from_json(&cipher::decrypt_with_key(&key, &envelope)?)?
                }
                EnvelopeFormat::Legacy => {
                    WalletStore::from_legacy_json(&legacy::decrypt_with_key(&key, &envelope)?)?
                }
            },
            None => WalletStore::default(),
        };

        let result = op(&mut store)?;

        let bytes = self.encrypt_store(&key, &salt, &store)?;
        self.file.write(&bytes)?;
        Ok(result)
    }

    fn encrypt_store(
        &self,
        key: &MasterKey,
        salt: &[u8; SALT_LEN],
        store: &WalletStore,
    ) -> Result<Vec<u8>, VaultError> {
        let plaintext = store.to_json()?;
        let envelope = cipher::encrypt_with_key(key, salt, &plaintext)?;
        envelope.to_json()
    }

    /// Off-thread derivation with a bounded timeout; falls back to the
    /// blocking path as a last resort so interactive flows fail loudly but
    /// batch callers still complete.
    async fn derive(
        &self,
        password: &str,
        salt: &[u8; SALT_LEN],
    ) -> Result<MasterKey, VaultError> {
        match kdf::derive_key_off_thread(password, salt, &self.kdf, self.kdf_timeout).await {
            Ok(key) => Ok(key),
            Err(VaultError::KeyDerivationTimeout(secs)) => {
                log::warn!(
                    "Key derivation did not finish within {}s, falling back to the blocking path",
                    secs
                );
                kdf::derive_key(password, salt, &self.kdf)
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_key(
        &self,
        password: &str,
        salt: &[u8; SALT_LEN],
    ) -> Result<MasterKey, VaultError> {
        if let Some(key) = self.session.key_for_salt(salt) {
            return Ok(key);
        }
        self.derive(password, salt).await
    }
}

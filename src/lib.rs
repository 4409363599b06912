//! xrp-vault: encrypted multi-wallet storage for the XRP wallet manager
//!
//! This crate implements the wallet vault that the desktop shell persists to
//! disk: an authenticated-encryption envelope around a JSON wallet store,
//! password-based key derivation with a per-session key cache, and a
//! compatibility decoder for envelopes written by the previous generation of
//! the app.
//!
//! # Architecture
//!
//! - **Envelope**: versioned `{salt, nonce, ciphertext, mac}` record, hex
//!   encoded, persisted as JSON
//! - **Crypto engine**: PBKDF2-HMAC-SHA256 key derivation, AES-256-CTR with a
//!   per-message stream key, HMAC-SHA256 authentication (Encrypt-then-MAC)
//! - **Session cache**: derived key held in memory for the unlocked session,
//!   zeroized on lock
//! - **Wallet store**: wallets map, active-wallet pointer and address book,
//!   mutated through full load-modify-save round trips
//!
//! # Example
//!
//! ```ignore
//! use xrp_vault::{VaultConfig, VaultManager};
//!
//! let manager = VaultManager::new(&VaultConfig::from_env());
//! let store = manager.unlock("correct horse battery staple").await?;
//! println!("{} wallets", store.wallets.len());
//! ```

// Public modules
pub mod config;
pub mod crypto;
pub mod error;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use config::VaultConfig;
pub use crypto::envelope::{Envelope, EnvelopeFormat};
pub use crypto::kdf::{KdfParams, MasterKey};
pub use error::{StorageError, VaultError};
pub use session::SessionKeyCache;
pub use store::{
    wallet_info_json, wallet_secrets_json, AddressBookEntry, FsVaultFile, LedgerNetwork,
    LegacyImport, SecretType, VaultFile, VaultManager, VaultSnapshot, WalletRecord, WalletStore,
    SECRET_EXPORT_WARNING,
};

// Common result type
pub type Result<T> = std::result::Result<T, VaultError>;

//! Wallet store and persistence layer
//!
//! - Domain data models (wallets, active-wallet pointer, address book)
//! - Persistence collaborator trait and its filesystem implementation
//! - Vault manager orchestrating decrypt -> mutate -> encrypt round trips
//! - Caller-facing plaintext exports

mod export;
mod file_system;
mod manager;
mod models;

pub use export::{
    wallet_info_json, wallet_secrets_json, VaultSnapshot, SECRET_EXPORT_WARNING,
};
pub use file_system::{FsVaultFile, VaultFile};
pub use manager::{LegacyImport, VaultManager, MIN_PASSWORD_LEN};
pub use models::{AddressBookEntry, LedgerNetwork, SecretType, WalletRecord, WalletStore};

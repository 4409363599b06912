//! Caller-facing plaintext exports
//!
//! These leave the crate unencrypted by design: the host shows or saves them
//! on explicit user request. None of them is ever written to the vault file.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{LedgerNetwork, SecretType, WalletRecord, WalletStore};
use crate::error::VaultError;

/// Warning embedded in every secrets export.
pub const SECRET_EXPORT_WARNING: &str = "WARNING: This file contains unencrypted wallet \
secrets. Anyone who can read it can spend the funds. Store it offline and delete it after use.";

/// Decrypted copy of the whole store, stamped for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct VaultSnapshot {
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub store: WalletStore,
}

impl VaultSnapshot {
    pub fn new(store: WalletStore) -> Self {
        Self {
            exported_at: Utc::now(),
            store,
        }
    }

    pub fn to_json(&self) -> Result<String, VaultError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("snapshot export: {e}")))
    }
}

#[derive(Serialize)]
struct WalletInfoExport<'a> {
    name: &'a str,
    network: LedgerNetwork,
    address: &'a str,
    public_key: &'a str,
    algorithm: &'a str,
    balance: &'a str,
    created_at: DateTime<Utc>,
    exported_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct WalletSecretsExport<'a> {
    warning: &'static str,
    name: &'a str,
    network: LedgerNetwork,
    address: &'a str,
    secret: &'a str,
    secret_type: SecretType,
    public_key: &'a str,
    algorithm: &'a str,
    balance: &'a str,
    created_at: DateTime<Utc>,
    exported_at: DateTime<Utc>,
}

/// Export a wallet without its secret material.
pub fn wallet_info_json(record: &WalletRecord) -> Result<String, VaultError> {
    let export = WalletInfoExport {
        name: &record.name,
        network: record.network,
        address: &record.address,
        public_key: &record.public_key,
        algorithm: &record.algorithm,
        balance: &record.balance,
        created_at: record.created_at,
        exported_at: Utc::now(),
    };
    serde_json::to_string_pretty(&export)
        .map_err(|e| VaultError::InvalidWalletFormat(format!("wallet export: {e}")))
}

/// Export a wallet including its secret, prefixed with a prominent warning.
pub fn wallet_secrets_json(record: &WalletRecord) -> Result<String, VaultError> {
    let export = WalletSecretsExport {
        warning: SECRET_EXPORT_WARNING,
        name: &record.name,
        network: record.network,
        address: &record.address,
        secret: &record.secret,
        secret_type: record.secret_type,
        public_key: &record.public_key,
        algorithm: &record.algorithm,
        balance: &record.balance,
        created_at: record.created_at,
        exported_at: Utc::now(),
    };
    serde_json::to_string_pretty(&export)
        .map_err(|e| VaultError::InvalidWalletFormat(format!("wallet export: {e}")))
}

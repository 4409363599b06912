//! Data models for the wallet store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// How a wallet's secret is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// Family seed (base58, "s...")
    Seed,
    /// Raw private key, hex
    PrivateKey,
}

/// XRP Ledger network a wallet talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerNetwork {
    Mainnet,
    Testnet,
    Devnet,
}

impl LedgerNetwork {
    /// Parse a network name, defaulting to testnet for anything unknown
    /// (matches how records written by earlier versions are interpreted).
    pub fn from_str_lossy(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "mainnet" => Self::Mainnet,
            "devnet" => Self::Devnet,
            _ => Self::Testnet,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Unique wallet name, the primary key within the store
    pub name: String,
    pub network: LedgerNetwork,
    /// Classic address, derived from the secret at creation time
    pub address: String,
    /// Seed or raw private key, depending on `secret_type`
    pub secret: String,
    pub secret_type: SecretType,
    #[serde(default)]
    pub public_key: String,
    /// Signing algorithm name ("ed25519" or "secp256k1")
    #[serde(default)]
    pub algorithm: String,
    /// XRP balance as a decimal string, refreshed by the host
    #[serde(default = "default_balance")]
    pub balance: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Set on records merged in by a legacy import, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_from: Option<String>,
}

fn default_balance() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookEntry {
    /// Unique label, the secondary key of the address book
    pub label: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// The plaintext payload inside the envelope.
///
/// Invariant: a non-null `active_wallet` always keys an existing entry in
/// `wallets`; every mutation below maintains that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletStore {
    #[serde(default)]
    pub wallets: BTreeMap<String, WalletRecord>,
    #[serde(default)]
    pub active_wallet: Option<String>,
    #[serde(default)]
    pub address_book: Vec<AddressBookEntry>,
}

impl WalletStore {
    /// Parse the current-format payload.
    pub fn from_json(plaintext: &str) -> Result<Self, VaultError> {
        serde_json::from_str(plaintext)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("wallet payload: {e}")))
    }

    pub fn to_json(&self) -> Result<String, VaultError> {
        serde_json::to_string(self)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("wallet payload: {e}")))
    }

    /// Parse a payload written by the previous generation of the app.
    ///
    /// Lenient by design: wallets without a secret are skipped with a log
    /// line, missing fields fall back to defaults, unknown networks become
    /// testnet. Nothing here fails the whole load over one bad record.
    pub fn from_legacy_json(plaintext: &str) -> Result<Self, VaultError> {
        let value: serde_json::Value = serde_json::from_str(plaintext)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("legacy payload: {e}")))?;

        let mut store = WalletStore::default();

        if let Some(wallets) = value.get("wallets").and_then(|w| w.as_object()) {
            for (name, record) in wallets {
                let secret = match record.get("secret").and_then(|s| s.as_str()) {
                    Some(secret) if !secret.is_empty() => secret.to_string(),
                    _ => {
                        log::warn!("Skipping wallet '{}': no secret in legacy record", name);
                        continue;
                    }
                };

                let str_field = |key: &str| {
                    record
                        .get(key)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };

                let secret_type = match record.get("secret_type").and_then(|v| v.as_str()) {
                    Some("private_key") => SecretType::PrivateKey,
                    _ => SecretType::Seed,
                };

                store.wallets.insert(
                    name.clone(),
                    WalletRecord {
                        name: name.clone(),
                        network: LedgerNetwork::from_str_lossy(
                            record.get("network").and_then(|v| v.as_str()).unwrap_or(""),
                        ),
                        address: str_field("address"),
                        secret,
                        secret_type,
                        public_key: str_field("public_key"),
                        algorithm: str_field("algorithm"),
                        balance: record
                            .get("balance")
                            .and_then(|v| v.as_str())
                            .unwrap_or("0")
                            .to_string(),
                        created_at: Utc::now(),
                        last_updated: None,
                        imported_from: None,
                    },
                );
            }
        }

        store.active_wallet = value
            .get("active_wallet")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .filter(|name| store.wallets.contains_key(name));

        if let Some(entries) = value.get("address_book").and_then(|v| v.as_array()) {
            for entry in entries {
                let label = entry
                    .get("label")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let address = entry
                    .get("address")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                if label.is_empty() || address.is_empty() {
                    continue;
                }
                store.address_book.push(AddressBookEntry {
                    label: label.to_string(),
                    address: address.to_string(),
                    destination_tag: entry
                        .get("destination_tag")
                        .and_then(|v| v.as_str())
                        .filter(|tag| !tag.is_empty())
                        .map(str::to_string),
                    notes: entry
                        .get("notes")
                        .and_then(|v| v.as_str())
                        .filter(|notes| !notes.is_empty())
                        .map(str::to_string),
                    created_at: Utc::now(),
                });
            }
        }

        Ok(store)
    }

    /// Insert a new wallet. The first wallet in the store becomes active.
    pub fn add_wallet(&mut self, record: WalletRecord) -> Result<(), VaultError> {
        if self.wallets.contains_key(&record.name) {
            return Err(VaultError::WalletExists(record.name));
        }
        let name = record.name.clone();
        self.wallets.insert(name.clone(), record);
        if self.active_wallet.is_none() {
            self.active_wallet = Some(name);
        }
        Ok(())
    }

    /// Delete a wallet. If it was active, the pointer moves to some
    /// remaining wallet, or to `None` when the store is now empty.
    pub fn remove_wallet(&mut self, name: &str) -> Result<WalletRecord, VaultError> {
        let record = self
            .wallets
            .remove(name)
            .ok_or_else(|| VaultError::WalletNotFound(name.to_string()))?;

        if self.active_wallet.as_deref() == Some(name) {
            self.active_wallet = self.wallets.keys().next().cloned();
        }
        Ok(record)
    }

    pub fn set_active_wallet(&mut self, name: Option<&str>) -> Result<(), VaultError> {
        match name {
            Some(name) if !self.wallets.contains_key(name) => {
                Err(VaultError::WalletNotFound(name.to_string()))
            }
            _ => {
                self.active_wallet = name.map(str::to_string);
                Ok(())
            }
        }
    }

    /// Re-key a wallet, following the active pointer if needed.
    pub fn rename_wallet(&mut self, old: &str, new: &str) -> Result<(), VaultError> {
        if self.wallets.contains_key(new) {
            return Err(VaultError::WalletExists(new.to_string()));
        }
        let mut record = self
            .wallets
            .remove(old)
            .ok_or_else(|| VaultError::WalletNotFound(old.to_string()))?;
        record.name = new.to_string();
        self.wallets.insert(new.to_string(), record);

        if self.active_wallet.as_deref() == Some(old) {
            self.active_wallet = Some(new.to_string());
        }
        Ok(())
    }

    pub fn update_balance(&mut self, name: &str, balance: &str) -> Result<(), VaultError> {
        let record = self
            .wallets
            .get_mut(name)
            .ok_or_else(|| VaultError::WalletNotFound(name.to_string()))?;
        record.balance = balance.to_string();
        record.last_updated = Some(Utc::now());
        Ok(())
    }

    pub fn update_network(&mut self, name: &str, network: LedgerNetwork) -> Result<(), VaultError> {
        let record = self
            .wallets
            .get_mut(name)
            .ok_or_else(|| VaultError::WalletNotFound(name.to_string()))?;
        record.network = network;
        record.last_updated = Some(Utc::now());
        Ok(())
    }

    /// Add a contact. An existing entry with the same label is removed
    /// first and the new entry appended (delete + insert, not an in-place
    /// update).
    pub fn upsert_contact(&mut self, entry: AddressBookEntry) {
        self.address_book.retain(|existing| existing.label != entry.label);
        self.address_book.push(entry);
    }

    /// Remove a contact by label. Returns whether anything was removed.
    pub fn remove_contact(&mut self, label: &str) -> bool {
        let before = self.address_book.len();
        self.address_book.retain(|entry| entry.label != label);
        self.address_book.len() != before
    }

    /// Merge another store (decoded from a legacy export) into this one.
    ///
    /// Colliding wallet names get a `-legacy` suffix; imported records are
    /// tagged with their provenance. Colliding address-book labels keep the
    /// current entry and drop the incoming one.
    pub fn merge_legacy(&mut self, legacy: WalletStore, provenance: &str) -> (usize, usize) {
        let mut wallets_added = 0;
        for (_, mut record) in legacy.wallets {
            let name = self.free_name(&record.name);
            record.name = name.clone();
            record.imported_from = Some(provenance.to_string());
            self.wallets.insert(name.clone(), record);
            if self.active_wallet.is_none() {
                self.active_wallet = Some(name);
            }
            wallets_added += 1;
        }

        let mut contacts_added = 0;
        for entry in legacy.address_book {
            if self.address_book.iter().any(|e| e.label == entry.label) {
                log::info!("Keeping existing contact '{}', dropping imported duplicate", entry.label);
                continue;
            }
            self.address_book.push(entry);
            contacts_added += 1;
        }

        (wallets_added, contacts_added)
    }

    fn free_name(&self, wanted: &str) -> String {
        if !self.wallets.contains_key(wanted) {
            return wanted.to_string();
        }
        let base = format!("{wanted}-legacy");
        if !self.wallets.contains_key(&base) {
            return base;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{base}-{counter}");
            if !self.wallets.contains_key(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> WalletRecord {
        WalletRecord {
            name: name.to_string(),
            network: LedgerNetwork::Testnet,
            address: format!("r{}Address", name),
            secret: "sEdTM1uX8pu2do5XvTnutH6HsouMaM2".to_string(),
            secret_type: SecretType::Seed,
            public_key: "ED01".to_string(),
            algorithm: "ed25519".to_string(),
            balance: "0".to_string(),
            created_at: Utc::now(),
            last_updated: None,
            imported_from: None,
        }
    }

    #[test]
    fn test_first_wallet_becomes_active() {
        let mut store = WalletStore::default();
        store.add_wallet(record("W1")).unwrap();
        assert_eq!(store.active_wallet.as_deref(), Some("W1"));

        store.add_wallet(record("W2")).unwrap();
        assert_eq!(store.active_wallet.as_deref(), Some("W1"));
    }

    #[test]
    fn test_duplicate_wallet_rejected() {
        let mut store = WalletStore::default();
        store.add_wallet(record("W1")).unwrap();
        assert!(matches!(
            store.add_wallet(record("W1")),
            Err(VaultError::WalletExists(_))
        ));
    }

    #[test]
    fn test_remove_active_reassigns_pointer() {
        let mut store = WalletStore::default();
        store.add_wallet(record("A")).unwrap();
        store.add_wallet(record("B")).unwrap();
        assert_eq!(store.active_wallet.as_deref(), Some("A"));

        store.remove_wallet("A").unwrap();
        assert_eq!(store.active_wallet.as_deref(), Some("B"));

        store.remove_wallet("B").unwrap();
        assert_eq!(store.active_wallet, None);
    }

    #[test]
    fn test_remove_missing_wallet() {
        let mut store = WalletStore::default();
        assert!(matches!(
            store.remove_wallet("ghost"),
            Err(VaultError::WalletNotFound(_))
        ));
    }

    #[test]
    fn test_rename_follows_active_pointer() {
        let mut store = WalletStore::default();
        store.add_wallet(record("old")).unwrap();
        store.rename_wallet("old", "new").unwrap();

        assert!(store.wallets.contains_key("new"));
        assert_eq!(store.wallets["new"].name, "new");
        assert_eq!(store.active_wallet.as_deref(), Some("new"));
    }

    #[test]
    fn test_rename_collision_keeps_store_intact() {
        let mut store = WalletStore::default();
        store.add_wallet(record("a")).unwrap();
        store.add_wallet(record("b")).unwrap();

        assert!(matches!(
            store.rename_wallet("a", "b"),
            Err(VaultError::WalletExists(_))
        ));
        assert!(store.wallets.contains_key("a"));
        assert!(store.wallets.contains_key("b"));
    }

    #[test]
    fn test_set_active_requires_existing() {
        let mut store = WalletStore::default();
        store.add_wallet(record("W1")).unwrap();

        assert!(matches!(
            store.set_active_wallet(Some("ghost")),
            Err(VaultError::WalletNotFound(_))
        ));
        store.set_active_wallet(None).unwrap();
        assert_eq!(store.active_wallet, None);
        store.set_active_wallet(Some("W1")).unwrap();
        assert_eq!(store.active_wallet.as_deref(), Some("W1"));
    }

    #[test]
    fn test_balance_update_stamps_time() {
        let mut store = WalletStore::default();
        store.add_wallet(record("W1")).unwrap();

        store.update_balance("W1", "125.5").unwrap();
        let wallet = &store.wallets["W1"];
        assert_eq!(wallet.balance, "125.5");
        assert!(wallet.last_updated.is_some());
    }

    #[test]
    fn test_contact_replace_is_delete_plus_append() {
        let mut store = WalletStore::default();
        let entry = |label: &str, address: &str| AddressBookEntry {
            label: label.to_string(),
            address: address.to_string(),
            destination_tag: None,
            notes: None,
            created_at: Utc::now(),
        };

        store.upsert_contact(entry("exchange", "rOne"));
        store.upsert_contact(entry("friend", "rTwo"));
        store.upsert_contact(entry("exchange", "rThree"));

        assert_eq!(store.address_book.len(), 2);
        // Replaced entry moved to the end
        assert_eq!(store.address_book[0].label, "friend");
        assert_eq!(store.address_book[1].label, "exchange");
        assert_eq!(store.address_book[1].address, "rThree");

        assert!(store.remove_contact("friend"));
        assert!(!store.remove_contact("friend"));
        assert_eq!(store.address_book.len(), 1);
    }

    #[test]
    fn test_legacy_payload_parsing() {
        let legacy = r#"{
            "wallets": {
                "main": {"secret": "sEdT...", "network": "mainnet", "address": "rMain",
                         "secret_type": "seed", "public_key": "ED99", "algorithm": "ed25519",
                         "balance": "42"},
                "broken": {"network": "testnet"}
            },
            "active_wallet": "main",
            "address_book": [
                {"label": "exchange", "address": "rExch", "destination_tag": "1234"},
                {"label": "", "address": "rBad"}
            ]
        }"#;

        let store = WalletStore::from_legacy_json(legacy).unwrap();
        assert_eq!(store.wallets.len(), 1);
        assert_eq!(store.wallets["main"].network, LedgerNetwork::Mainnet);
        assert_eq!(store.wallets["main"].balance, "42");
        assert_eq!(store.active_wallet.as_deref(), Some("main"));
        assert_eq!(store.address_book.len(), 1);
        assert_eq!(store.address_book[0].destination_tag.as_deref(), Some("1234"));
    }

    #[test]
    fn test_merge_legacy_suffixes_collisions() {
        let mut store = WalletStore::default();
        store.add_wallet(record("main")).unwrap();

        let mut legacy = WalletStore::default();
        legacy.add_wallet(record("main")).unwrap();
        legacy.add_wallet(record("other")).unwrap();

        let (wallets, _) = store.merge_legacy(legacy, "legacy-store");
        assert_eq!(wallets, 2);
        assert!(store.wallets.contains_key("main"));
        assert!(store.wallets.contains_key("main-legacy"));
        assert!(store.wallets.contains_key("other"));
        assert_eq!(
            store.wallets["main-legacy"].imported_from.as_deref(),
            Some("legacy-store")
        );
        assert!(store.wallets["main"].imported_from.is_none());
    }
}

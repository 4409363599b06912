/// Common test utilities for vault integration tests
///
/// - Temp-dir backed vault environment with automatic cleanup
/// - Reduced-iteration KDF parameters so tests stay fast
/// - Builders for sample wallet records and legacy-format envelopes
use std::path::PathBuf;
use std::time::Duration;

use aes::Aes256;
use chrono::Utc;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tempfile::TempDir;

use xrp_vault::{
    FsVaultFile, KdfParams, LedgerNetwork, SecretType, VaultManager, WalletRecord,
};

/// Production-count PBKDF2 would dominate test wall time
pub const TEST_ITERATIONS: u32 = 1_000;

pub const PASSWORD: &str = "correct horse battery staple";
pub const WRONG_PASSWORD: &str = "incorrect zebra battery staple";

/// Test environment with automatic cleanup (TempDir removes the vault and
/// any backups on drop)
pub struct TestVault {
    pub temp_dir: TempDir,
    pub manager: VaultManager,
}

impl TestVault {
    pub fn new() -> anyhow::Result<Self> {
        init_logging();
        let temp_dir = TempDir::new()?;
        let manager = manager_at(temp_dir.path().join("wallets.enc"));
        Ok(Self { temp_dir, manager })
    }

    pub fn vault_path(&self) -> PathBuf {
        self.temp_dir.path().join("wallets.enc")
    }

    /// A fresh manager over the same file, simulating an app restart with
    /// an empty session.
    pub fn reopen(&self) -> VaultManager {
        manager_at(self.vault_path())
    }
}

fn manager_at(path: PathBuf) -> VaultManager {
    VaultManager::new_with_file(
        Box::new(FsVaultFile::new_with_path(path)),
        KdfParams::new(TEST_ITERATIONS),
        Duration::from_secs(30),
    )
}

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn sample_wallet(name: &str) -> WalletRecord {
    WalletRecord {
        name: name.to_string(),
        network: LedgerNetwork::Testnet,
        address: format!("r{}TestAddress", name),
        secret: "sEdTM1uX8pu2do5XvTnutH6HsouMaM2".to_string(),
        secret_type: SecretType::Seed,
        public_key: "EDA4B1C2".to_string(),
        algorithm: "ed25519".to_string(),
        balance: "0".to_string(),
        created_at: Utc::now(),
        last_updated: None,
        imported_from: None,
    }
}

type HmacSha256 = Hmac<Sha256>;
type Aes256Ctr32 = ctr::Ctr32BE<Aes256>;

/// Build an envelope exactly the way the old Python producer did: PBKDF2
/// key, raw-byte MAC input (salt || nonce || ciphertext), stream key from
/// the raw nonce, and no version field.
pub fn legacy_envelope_json(password: &str, plaintext: &str) -> String {
    let salt = [0x5Au8; 32];
    let nonce = [0xC3u8; 12];

    let mut key = [0u8; 32];
    pbkdf2::pbkdf2::<HmacSha256>(password.as_bytes(), &salt, TEST_ITERATIONS, &mut key)
        .expect("PBKDF2");

    let mut stream_key_mac = HmacSha256::new_from_slice(&key).expect("HMAC key");
    stream_key_mac.update(&nonce);
    let stream_key: [u8; 32] = stream_key_mac.finalize().into_bytes().into();

    let mut block = [0u8; 16];
    block[..12].copy_from_slice(&nonce);
    let mut ciphertext = plaintext.as_bytes().to_vec();
    let mut cipher = Aes256Ctr32::new((&stream_key).into(), (&block).into());
    cipher.apply_keystream(&mut ciphertext);

    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC key");
    mac.update(&salt);
    mac.update(&nonce);
    mac.update(&ciphertext);
    let tag = mac.finalize().into_bytes();

    serde_json::json!({
        "salt": hex::encode(salt),
        "nonce": hex::encode(nonce),
        "ciphertext": hex::encode(&ciphertext),
        "mac": hex::encode(tag),
    })
    .to_string()
}

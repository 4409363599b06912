/// Vault configuration from environment variables
///
/// Controls where the encrypted store lives and how long the asynchronous
/// key derivation may run before it is considered hung. The PBKDF2 iteration
/// count is intentionally not configurable: release builds always derive at
/// the production count (see `crypto::kdf`).
use std::env;
use std::path::PathBuf;

/// Default directory for the encrypted store, relative to the working
/// directory of the host process.
const DEFAULT_DATA_DIR: &str = "./data";

/// Default file name of the encrypted store.
const DEFAULT_VAULT_FILE: &str = "wallets.enc";

/// Default bound on asynchronous key derivation, in seconds.
const DEFAULT_KDF_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct VaultConfig {
    /// Directory holding the encrypted store and its backups
    pub data_dir: PathBuf,
    /// File name of the encrypted store inside `data_dir`
    pub vault_file_name: String,
    /// Upper bound for off-thread key derivation before the operation fails
    pub kdf_timeout_secs: u64,
}

impl VaultConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `VAULT_DATA_DIR`: directory for the encrypted store (default "./data")
    /// - `VAULT_FILE`: store file name (default "wallets.enc")
    /// - `VAULT_KDF_TIMEOUT_SECS`: key derivation timeout in seconds (default 10)
    pub fn from_env() -> Self {
        let data_dir = env::var("VAULT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let vault_file_name =
            env::var("VAULT_FILE").unwrap_or_else(|_| DEFAULT_VAULT_FILE.to_string());

        let kdf_timeout_secs = match env::var("VAULT_KDF_TIMEOUT_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    log::warn!(
                        "Invalid VAULT_KDF_TIMEOUT_SECS '{}', using {}s",
                        raw,
                        DEFAULT_KDF_TIMEOUT_SECS
                    );
                    DEFAULT_KDF_TIMEOUT_SECS
                }
            },
            Err(_) => DEFAULT_KDF_TIMEOUT_SECS,
        };

        log::info!(
            "Vault storage: {:?} (KDF timeout {}s)",
            data_dir.join(&vault_file_name),
            kdf_timeout_secs
        );

        Self {
            data_dir,
            vault_file_name,
            kdf_timeout_secs,
        }
    }

    /// Full path of the encrypted store file
    pub fn vault_path(&self) -> PathBuf {
        self.data_dir.join(&self.vault_file_name)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            vault_file_name: DEFAULT_VAULT_FILE.to_string(),
            kdf_timeout_secs: DEFAULT_KDF_TIMEOUT_SECS,
        }
    }
}

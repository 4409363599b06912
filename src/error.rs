use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    /// MAC verification failed. A wrong password and a tampered envelope are
    /// deliberately indistinguishable here.
    #[error("Invalid password or corrupted wallet data")]
    InvalidPasswordOrCorruptedData,

    /// The legacy decode path failed as well.
    #[error("Invalid password or incompatible wallet format")]
    InvalidPasswordOrIncompatibleFormat,

    #[error("Invalid wallet format: {0}")]
    InvalidWalletFormat(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Wallet already exists: {0}")]
    WalletExists(String),

    /// An operation that needs an unlocked session was called on a locked
    /// vault.
    #[error("Vault is locked: no master password available")]
    MissingMasterPassword,

    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),

    #[error("Key derivation timed out after {0} seconds")]
    KeyDerivationTimeout(u64),

    #[error("Crypto failure: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not a wallet envelope: {0}")]
    InvalidBackup(String),
}

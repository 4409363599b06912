//! PBKDF2 key derivation
//!
//! Password + salt -> 256-bit master key via PBKDF2-HMAC-SHA256. Derivation
//! at the production count takes a noticeable fraction of a second, so
//! interactive callers go through [`derive_key_off_thread`], which runs the
//! work on a blocking thread under a bounded timeout.

use std::time::Duration;

use hmac::Hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::envelope::SALT_LEN;
use crate::error::VaultError;

/// Master key length in bytes.
pub const KEY_LEN: usize = 32;

/// Production iteration count. The previous generation of the app shipped
/// with this value and existing envelopes were derived under it, so it is a
/// compatibility constant as much as a security parameter.
pub const PBKDF2_ITERATIONS: u32 = 390_000;

/// Derivation parameters.
///
/// `Default` is the production count. Reduced counts exist only for test
/// code that constructs `KdfParams` explicitly; nothing reads them from the
/// environment or configuration, so a release build cannot be talked into a
/// weak derivation.
#[derive(Clone, Debug)]
pub struct KdfParams {
    pub iterations: u32,
}

impl KdfParams {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// 256-bit master key derived from the password. Zeroed on drop.
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Constant-time equality, for comparing a re-derived key against a
    /// cached one without leaking where they diverge.
    pub fn ct_eq(&self, other: &MasterKey) -> bool {
        bool::from(self.0.as_slice().ct_eq(other.0.as_slice()))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.write_str("MasterKey(..)")
    }
}

/// Derive the master key from a password and salt.
///
/// Deterministic: identical inputs always yield the identical key.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<MasterKey, VaultError> {
    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, params.iterations, &mut *output)
        .map_err(|e| VaultError::Crypto(format!("PBKDF2 derivation failed: {e}")))?;
    Ok(MasterKey(output))
}

/// Derive the master key on a blocking worker thread, bounded by `timeout`.
///
/// The future is cancellable by dropping it. On timeout the operation fails
/// with [`VaultError::KeyDerivationTimeout`] rather than hanging; the caller
/// may fall back to [`derive_key`] as a last resort. A timed-out worker is
/// detached and finishes (or is dropped) on its own.
pub async fn derive_key_off_thread(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
    timeout: Duration,
) -> Result<MasterKey, VaultError> {
    let password = Zeroizing::new(password.to_string());
    let salt = *salt;
    let params = params.clone();

    let task = tokio::task::spawn_blocking(move || derive_key(password.as_str(), &salt, &params));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(VaultError::Crypto(format!(
            "key derivation task failed: {join_err}"
        ))),
        Err(_) => Err(VaultError::KeyDerivationTimeout(timeout.as_secs())),
    }
}

//! Legacy envelope decoder
//!
//! The previous generation of the app wrote the same JSON envelope shape but
//! fed raw bytes to both HMACs: the MAC input is `salt || nonce || ciphertext`
//! as bytes, and the stream key is derived from the raw nonce. This decoder
//! exists purely for one-time migration; anything it decodes is re-encrypted
//! in the current format on the next save.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::cipher::{apply_ctr, hmac_sha256};
use super::envelope::Envelope;
use super::kdf::{self, KdfParams, MasterKey};
use crate::error::VaultError;

type HmacSha256 = Hmac<Sha256>;

/// Decrypt a legacy envelope under a password.
pub fn decrypt(
    password: &str,
    envelope: &Envelope,
    params: &KdfParams,
) -> Result<String, VaultError> {
    let parts = envelope.decode_fields()?;
    let key = kdf::derive_key(password, &parts.salt, params)?;
    decrypt_with_key(&key, envelope)
}

/// Decrypt a legacy envelope under an already-derived master key.
///
/// Both a wrong password and data this decoder was never meant for surface
/// as [`VaultError::InvalidPasswordOrIncompatibleFormat`].
pub fn decrypt_with_key(key: &MasterKey, envelope: &Envelope) -> Result<String, VaultError> {
    let parts = envelope.decode_fields()?;

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(format!("HMAC key init failed: {e}")))?;
    mac.update(&parts.salt);
    mac.update(&parts.nonce);
    mac.update(&parts.ciphertext);
    mac.verify_slice(&parts.mac)
        .map_err(|_| VaultError::InvalidPasswordOrIncompatibleFormat)?;

    let stream_key = hmac_sha256(key.as_bytes(), &parts.nonce)?;
    let mut buf = parts.ciphertext;
    apply_ctr(&stream_key, &parts.nonce, &mut buf);

    String::from_utf8(buf).map_err(|_| VaultError::InvalidPasswordOrIncompatibleFormat)
}

//! Current-format envelope engine
//!
//! Encrypt-then-MAC over AES-256-CTR:
//!
//! 1. fresh random 12-byte nonce per message, always, even when the key and
//!    salt are reused across an unlocked session (the freshness is what
//!    makes key reuse safe under CTR)
//! 2. per-message stream key `HMAC-SHA256(master_key, hex(nonce))`
//! 3. AES-256-CTR with the nonce in the high bytes of the counter block
//! 4. `mac = HMAC-SHA256(master_key, hex(salt) || hex(nonce) || hex(ciphertext))`
//!
//! The MAC is keyed by the master key, not the stream key, binding it to the
//! same key that is needed to decrypt.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use super::envelope::{Envelope, ENVELOPE_VERSION, MAC_LEN, NONCE_LEN, SALT_LEN};
use super::kdf::{self, KdfParams, MasterKey};
use crate::error::VaultError;

type HmacSha256 = Hmac<Sha256>;

/// AES-256 in CTR mode with a 32-bit big-endian block counter: the 12-byte
/// nonce fills the high bytes of the counter block, the counter starts at 0.
type Aes256Ctr32 = ctr::Ctr32BE<Aes256>;

/// Generate a random 32-byte salt from OS entropy.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Generate a random 12-byte nonce from OS entropy.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; MAC_LEN], VaultError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| VaultError::Crypto(format!("HMAC key init failed: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

pub(crate) fn apply_ctr(stream_key: &[u8; MAC_LEN], nonce: &[u8; NONCE_LEN], buf: &mut [u8]) {
    let mut block = [0u8; 16];
    block[..NONCE_LEN].copy_from_slice(nonce);
    let mut cipher = Aes256Ctr32::new(stream_key.into(), (&block).into());
    cipher.apply_keystream(buf);
}

/// Encrypt `plaintext` under a password, deriving a key from a fresh salt.
///
/// Session-aware callers that already hold a derived key should use
/// [`encrypt_with_key`] instead and skip the derivation.
pub fn encrypt(
    password: &str,
    plaintext: &str,
    params: &KdfParams,
) -> Result<Envelope, VaultError> {
    let salt = generate_salt();
    let key = kdf::derive_key(password, &salt, params)?;
    encrypt_with_key(&key, &salt, plaintext)
}

/// Encrypt `plaintext` under an already-derived master key and its salt.
pub fn encrypt_with_key(
    key: &MasterKey,
    salt: &[u8; SALT_LEN],
    plaintext: &str,
) -> Result<Envelope, VaultError> {
    let nonce = generate_nonce();
    let salt_hex = hex::encode(salt);
    let nonce_hex = hex::encode(nonce);

    let stream_key = hmac_sha256(key.as_bytes(), nonce_hex.as_bytes())?;
    let mut buf = plaintext.as_bytes().to_vec();
    apply_ctr(&stream_key, &nonce, &mut buf);
    let ciphertext_hex = hex::encode(&buf);

    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(format!("HMAC key init failed: {e}")))?;
    mac.update(salt_hex.as_bytes());
    mac.update(nonce_hex.as_bytes());
    mac.update(ciphertext_hex.as_bytes());
    let tag = mac.finalize().into_bytes();

    Ok(Envelope {
        salt: salt_hex,
        nonce: nonce_hex,
        ciphertext: ciphertext_hex,
        mac: hex::encode(tag),
        version: Some(ENVELOPE_VERSION),
    })
}

/// Decrypt a current-format envelope under a password.
pub fn decrypt(
    password: &str,
    envelope: &Envelope,
    params: &KdfParams,
) -> Result<String, VaultError> {
    let parts = envelope.decode_fields()?;
    let key = kdf::derive_key(password, &parts.salt, params)?;
    decrypt_with_key(&key, envelope)
}

/// Decrypt a current-format envelope under an already-derived master key.
///
/// The MAC is verified in constant time before any decryption happens; a
/// mismatch means a wrong password or a tampered envelope, and the error
/// does not say which.
pub fn decrypt_with_key(key: &MasterKey, envelope: &Envelope) -> Result<String, VaultError> {
    let parts = envelope.decode_fields()?;

    // Recompute over the stored hex fields, verbatim
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Crypto(format!("HMAC key init failed: {e}")))?;
    mac.update(envelope.salt.as_bytes());
    mac.update(envelope.nonce.as_bytes());
    mac.update(envelope.ciphertext.as_bytes());
    mac.verify_slice(&parts.mac)
        .map_err(|_| VaultError::InvalidPasswordOrCorruptedData)?;

    let stream_key = hmac_sha256(key.as_bytes(), envelope.nonce.as_bytes())?;
    let mut buf = parts.ciphertext;
    apply_ctr(&stream_key, &parts.nonce, &mut buf);

    String::from_utf8(buf).map_err(|_| VaultError::InvalidPasswordOrCorruptedData)
}

//! On-disk envelope format
//!
//! The only persisted representation of the wallet store. All binary fields
//! are lowercase hex; the JSON shape is fixed:
//! `{"salt":"<64 hex>","nonce":"<24 hex>","ciphertext":"<hex>","mac":"<64 hex>","version":1}`.
//! Envelopes without a `version` field, or with a value other than the
//! current one, were written by the previous generation of the app and route
//! through the legacy decoder.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Salt length in bytes (hex-encoded to 64 chars).
pub const SALT_LEN: usize = 32;

/// Nonce length in bytes (hex-encoded to 24 chars).
pub const NONCE_LEN: usize = 12;

/// MAC length in bytes (HMAC-SHA256 output).
pub const MAC_LEN: usize = 32;

/// Version written by the current format.
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Decode strategy selected up front from the version tag, instead of trying
/// the current decoder and falling back on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFormat {
    Current,
    Legacy,
}

/// Raw byte fields of a structurally valid envelope.
pub(crate) struct EnvelopeParts {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub mac: [u8; MAC_LEN],
}

impl Envelope {
    /// Parse an envelope from persisted JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, VaultError> {
        serde_json::from_slice(bytes)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("envelope is not valid JSON: {e}")))
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<Vec<u8>, VaultError> {
        serde_json::to_vec(self)
            .map_err(|e| VaultError::InvalidWalletFormat(format!("envelope serialization: {e}")))
    }

    /// Which decoder this envelope requires.
    pub fn format(&self) -> EnvelopeFormat {
        match self.version {
            Some(ENVELOPE_VERSION) => EnvelopeFormat::Current,
            _ => EnvelopeFormat::Legacy,
        }
    }

    /// Check that a parsed JSON value carries the four required envelope
    /// fields. Used to validate backup files before they overwrite the store.
    pub fn json_has_required_fields(value: &serde_json::Value) -> bool {
        ["salt", "nonce", "ciphertext", "mac"]
            .iter()
            .all(|field| value.get(field).map(|v| v.is_string()).unwrap_or(false))
    }

    /// Decode and length-check the hex fields.
    pub(crate) fn decode_fields(&self) -> Result<EnvelopeParts, VaultError> {
        let salt: [u8; SALT_LEN] = decode_fixed(&self.salt, "salt")?;
        let nonce: [u8; NONCE_LEN] = decode_fixed(&self.nonce, "nonce")?;
        let mac: [u8; MAC_LEN] = decode_fixed(&self.mac, "mac")?;
        let ciphertext = hex::decode(&self.ciphertext)
            .map_err(|_| VaultError::InvalidWalletFormat("ciphertext is not valid hex".into()))?;

        Ok(EnvelopeParts {
            salt,
            nonce,
            ciphertext,
            mac,
        })
    }
}

fn decode_fixed<const N: usize>(field: &str, name: &str) -> Result<[u8; N], VaultError> {
    let bytes = hex::decode(field)
        .map_err(|_| VaultError::InvalidWalletFormat(format!("{name} is not valid hex")))?;
    bytes.try_into().map_err(|_| {
        VaultError::InvalidWalletFormat(format!("{name} has wrong length, expected {} bytes", N))
    })
}

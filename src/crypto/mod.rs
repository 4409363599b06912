//! Envelope encryption for the wallet store
//!
//! - Envelope format and version dispatch
//! - PBKDF2 key derivation (sync and worker-offloaded)
//! - AES-256-CTR + HMAC-SHA256 engine for the current format
//! - Compatibility decoder for legacy envelopes

pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod legacy;

pub use envelope::{Envelope, EnvelopeFormat};
pub use kdf::{KdfParams, MasterKey};

//! Session key cache
//!
//! Holds the derived master key and its salt for the lifetime of an unlocked
//! session, so repeated store operations do not pay the PBKDF2 cost again.
//! This is an explicit object owned by the vault manager and passed by
//! reference, not process-global state. `clear()` is called on lock, logout
//! and teardown; the key bytes are zeroed when the entry is dropped.

use std::sync::Mutex;

use crate::crypto::envelope::SALT_LEN;
use crate::crypto::kdf::{self, KdfParams, MasterKey};
use crate::error::VaultError;

struct SessionKey {
    key: MasterKey,
    salt: [u8; SALT_LEN],
}

pub struct SessionKeyCache {
    params: KdfParams,
    inner: Mutex<Option<SessionKey>>,
}

impl SessionKeyCache {
    pub fn new(params: KdfParams) -> Self {
        Self {
            params,
            inner: Mutex::new(None),
        }
    }

    /// Derive a key for `password` under `salt`, store it for the session
    /// and return a copy.
    ///
    /// Interactive callers should derive off-thread first and hand the
    /// result to [`SessionKeyCache::store`]; this synchronous form is the
    /// last-resort path.
    pub fn cache(&self, password: &str, salt: [u8; SALT_LEN]) -> Result<MasterKey, VaultError> {
        let key = kdf::derive_key(password, &salt, &self.params)?;
        self.store(key.clone(), salt);
        Ok(key)
    }

    /// Store an already-derived key and its salt for the session.
    pub fn store(&self, key: MasterKey, salt: [u8; SALT_LEN]) {
        let mut guard = self.inner.lock().expect("session cache poisoned");
        *guard = Some(SessionKey { key, salt });
    }

    /// The cached key, if the session is unlocked.
    pub fn key(&self) -> Option<MasterKey> {
        let guard = self.inner.lock().expect("session cache poisoned");
        guard.as_ref().map(|entry| entry.key.clone())
    }

    /// The salt the cached key was derived under.
    pub fn salt(&self) -> Option<[u8; SALT_LEN]> {
        let guard = self.inner.lock().expect("session cache poisoned");
        guard.as_ref().map(|entry| entry.salt)
    }

    /// The cached key, but only when it was derived under `salt`. Used to
    /// decide between key reuse and a fresh derivation when decrypting an
    /// envelope.
    pub fn key_for_salt(&self, salt: &[u8; SALT_LEN]) -> Option<MasterKey> {
        let guard = self.inner.lock().expect("session cache poisoned");
        guard
            .as_ref()
            .filter(|entry| &entry.salt == salt)
            .map(|entry| entry.key.clone())
    }

    pub fn is_unlocked(&self) -> bool {
        let guard = self.inner.lock().expect("session cache poisoned");
        guard.is_some()
    }

    /// Drop the cached key material. Key bytes are zeroed on drop; no
    /// operation can read stale material afterwards.
    pub fn clear(&self) {
        let mut guard = self.inner.lock().expect("session cache poisoned");
        *guard = None;
    }

    /// Re-derive with the cached salt and compare against the cached key in
    /// constant time. A locked session verifies nothing.
    pub fn verify(&self, password: &str) -> Result<bool, VaultError> {
        let (key, salt) = {
            let guard = self.inner.lock().expect("session cache poisoned");
            match guard.as_ref() {
                Some(entry) => (entry.key.clone(), entry.salt),
                None => return Ok(false),
            }
        };
        let candidate = kdf::derive_key(password, &salt, &self.params)?;
        Ok(candidate.ct_eq(&key))
    }
}

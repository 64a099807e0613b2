//! Platform credential store backend.
//!
//! Uses the `keyring` crate; the key is stored base64-encoded as the
//! entry's password under the [`SERVICE_NAME`] service.

use base64::{Engine, engine::general_purpose::STANDARD};
use keyring::Entry;
use zeroize::Zeroizing;

use super::{KeyStore, StoreKey};
use crate::crypto::KEY_LEN;
use crate::error::{CryptoError, CryptoResult};

/// Service name used for platform keyring entries
pub const SERVICE_NAME: &str = "backpack";

#[derive(Debug, Clone)]
pub struct OsKeyStore {
    service: String,
}

impl Default for OsKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OsKeyStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, alias: &str) -> CryptoResult<Entry> {
        Entry::new(&self.service, alias)
            .map_err(|e| CryptoError::KeyStore(format!("keychain entry creation: {e}")))
    }
}

fn decode_key(encoded: &str, alias: &str) -> CryptoResult<StoreKey> {
    let raw = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::KeyStore(format!("key '{alias}' is not valid base64")))?,
    );
    let bytes: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
        CryptoError::KeyStore(format!(
            "key '{alias}' has {} bytes, expected {KEY_LEN}",
            raw.len()
        ))
    })?;
    Ok(StoreKey::from_bytes(bytes))
}

impl KeyStore for OsKeyStore {
    fn get_or_create_key(&self, alias: &str) -> CryptoResult<StoreKey> {
        let entry = self.entry(alias)?;

        match entry.get_password() {
            Ok(encoded) => {
                let encoded = Zeroizing::new(encoded);
                return decode_key(&encoded, alias);
            }
            Err(keyring::Error::NoEntry) => {}
            Err(e) => {
                return Err(CryptoError::KeyStore(format!(
                    "keychain get for '{alias}': {e}"
                )));
            }
        }

        let key = StoreKey::generate()?;
        let encoded = Zeroizing::new(STANDARD.encode(key.expose()));
        entry
            .set_password(&encoded)
            .map_err(|e| CryptoError::KeyStore(format!("keychain store for '{alias}': {e}")))?;
        tracing::debug!(alias, service = %self.service, "created key in platform keychain");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_key_decodes() {
        let encoded = STANDARD.encode([9u8; KEY_LEN]);
        let key = decode_key(&encoded, "a").unwrap();
        assert_eq!(key.expose(), &[9u8; KEY_LEN]);
    }

    #[test]
    fn wrong_length_is_key_store_error() {
        let encoded = STANDARD.encode([9u8; 16]);
        assert!(matches!(
            decode_key(&encoded, "a"),
            Err(CryptoError::KeyStore(_))
        ));
    }

    #[test]
    fn garbage_is_key_store_error() {
        assert!(matches!(
            decode_key("not base64!", "a"),
            Err(CryptoError::KeyStore(_))
        ));
    }
}

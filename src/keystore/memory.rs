use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyStore, StoreKey};
use crate::error::{CryptoError, CryptoResult};

/// Keys held in process memory only; lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    keys: Mutex<HashMap<String, StoreKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.keys
            .lock()
            .map(|keys| keys.contains_key(alias))
            .unwrap_or(false)
    }
}

impl KeyStore for MemoryKeyStore {
    fn get_or_create_key(&self, alias: &str) -> CryptoResult<StoreKey> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| CryptoError::KeyStore("memory key store lock poisoned".to_string()))?;

        if let Some(key) = keys.get(alias) {
            return Ok(key.clone());
        }

        let key = StoreKey::generate()?;
        keys.insert(alias.to_string(), key.clone());
        tracing::debug!(alias, "created key in memory key store");
        Ok(key)
    }
}

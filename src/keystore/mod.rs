//! Key store backends holding the long-lived container key.
//!
//! # Available Backends
//!
//! - **os**: the platform credential store (macOS Keychain, Windows Credential
//!   Manager, Linux kernel keyring)
//! - **memory**: process-local keys for tests and embedders that manage
//!   persistence themselves

mod memory;
mod os;

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

pub use memory::MemoryKeyStore;
pub use os::OsKeyStore;

use crate::crypto::{KEY_LEN, random::secure_random};
use crate::error::CryptoResult;

/// Release and debug builds use separate aliases so their keys never collide.
pub fn default_alias() -> &'static str {
    if cfg!(debug_assertions) {
        "iamsecuredebug"
    } else {
        "iamsecure"
    }
}

/// Source of the 256-bit key used when no passphrase is given.
pub trait KeyStore: Send + Sync {
    /// Returns the key stored under `alias`, creating and persisting a new
    /// random one first if none exists.
    fn get_or_create_key(&self, alias: &str) -> CryptoResult<StoreKey>;
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    fn get_or_create_key(&self, alias: &str) -> CryptoResult<StoreKey> {
        (**self).get_or_create_key(alias)
    }
}

/// A 256-bit AES key handed out by a [`KeyStore`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey([u8; KEY_LEN]);

impl StoreKey {
    pub(crate) fn generate() -> CryptoResult<Self> {
        let mut key = StoreKey([0u8; KEY_LEN]);
        secure_random(&mut key.0)?;
        Ok(key)
    }

    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        StoreKey(bytes)
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreKey(<redacted>)")
    }
}

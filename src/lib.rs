//! Encrypted containers for opaque payloads.
//!
//! A container is sealed with AES-256-GCM under either a key held by a
//! [`KeyStore`] or a key derived from a passphrase. Passphrase containers
//! stay readable whether they were sealed with the Argon2id key or the older
//! iterated SHA-512 key.

mod config;
mod container;
pub mod crypto;
mod error;
mod fallback;
mod hash;
mod keystore;
mod storage;
mod stored_set;

use std::io::{Read, Write};

use zeroize::Zeroizing;

pub use crate::config::CryptoConfig;
pub use crate::container::{Container, ContainerMode};
pub use crate::crypto::{Argon2Params, KdfAlgorithm, KdfConfig};
pub use crate::error::{CryptoError, CryptoResult, EnDecryptionError};
pub use crate::hash::{Hash, fingerprint, fingerprint_bytes};
pub use crate::keystore::{KeyStore, MemoryKeyStore, OsKeyStore, StoreKey, default_alias};
pub use crate::storage::Storage;

use crate::crypto::{SALT_LEN, generate_associated_data, seal};

/// Encrypts and decrypts containers with an explicit configuration and key
/// store. Holds no key material between calls.
#[derive(Debug)]
pub struct Backpack<K: KeyStore = OsKeyStore> {
    config: CryptoConfig,
    key_store: K,
}

impl Backpack<OsKeyStore> {
    /// A backpack using the platform keychain.
    pub fn platform(config: CryptoConfig) -> Self {
        Self::new(config, OsKeyStore::new())
    }
}

impl<K: KeyStore> Backpack<K> {
    pub fn new(config: CryptoConfig, key_store: K) -> Self {
        Self { config, key_store }
    }

    pub fn config(&self) -> &CryptoConfig {
        &self.config
    }

    pub fn key_store(&self) -> &K {
        &self.key_store
    }

    /// Encrypts `payload` under the key store key and writes the container to
    /// `destination`. Returns the raw ciphertext (with tag, without framing).
    pub fn encrypt<W: Write>(
        &self,
        payload: &[u8],
        destination: &mut W,
    ) -> Result<Vec<u8>, EnDecryptionError> {
        let key = self.key_store.get_or_create_key(&self.config.alias)?;
        let container = seal_container(key.expose(), None, payload)?;
        container.write_to(destination)?;
        Ok(container.into_ciphertext())
    }

    /// Encrypts `payload` with the first 32 bytes of `hash` as key; the hash
    /// salt is stored in the container.
    pub fn encrypt_with_hash<W: Write>(
        &self,
        payload: &[u8],
        destination: &mut W,
        hash: &Hash,
    ) -> Result<Vec<u8>, EnDecryptionError> {
        let key = hash.key_material().ok_or_else(|| {
            CryptoError::InvalidParameter("hash value shorter than 32 bytes".to_string())
        })?;
        let container = seal_container(key, Some(*hash.salt()), payload)?;
        container.write_to(destination)?;
        Ok(container.into_ciphertext())
    }

    /// Derives a fresh Argon2id hash of `passphrase` and encrypts with it.
    pub fn encrypt_with_passphrase<W: Write>(
        &self,
        payload: &[u8],
        destination: &mut W,
        passphrase: &str,
    ) -> Result<Vec<u8>, EnDecryptionError> {
        let hash = self.argon2_hash(passphrase)?;
        self.encrypt_with_hash(payload, destination, &hash)
    }

    /// Decrypts a key store container read from `source`.
    pub fn decrypt<R: Read>(&self, source: &mut R) -> Result<Zeroizing<Vec<u8>>, EnDecryptionError> {
        let container = Container::read_from(source, ContainerMode::KeyStore)?;
        let key = self.key_store.get_or_create_key(&self.config.alias)?;
        Ok(fallback::open_with_store_key(&container, &key)?)
    }

    /// Decrypts a passphrase container, trying the Argon2id key first and
    /// the legacy SHA-512 key second.
    ///
    /// # Errors
    ///
    /// [`CryptoError::AuthenticationFailed`] if neither key authenticates.
    pub fn decrypt_with_passphrase<R: Read>(
        &self,
        source: &mut R,
        passphrase: &str,
    ) -> Result<Zeroizing<Vec<u8>>, EnDecryptionError> {
        let container = Container::read_from(source, ContainerMode::Passphrase)?;
        Ok(fallback::open_with_passphrase(
            &container,
            passphrase,
            &self.config.kdf,
        )?)
    }

    pub fn argon2_hash(&self, text: &str) -> Result<Hash, EnDecryptionError> {
        Ok(hash::argon2_hash(text, self.config.kdf.argon2)?)
    }

    pub fn sha_hash(&self, text: &str) -> Result<Hash, EnDecryptionError> {
        self.sha_hash_with_rounds(text, self.config.kdf.sha_rounds)
    }

    pub fn sha_hash_with_rounds(&self, text: &str, rounds: u32) -> Result<Hash, EnDecryptionError> {
        Ok(hash::sha_hash(text, rounds)?)
    }
}

fn seal_container(
    key: &[u8],
    salt: Option<[u8; SALT_LEN]>,
    payload: &[u8],
) -> CryptoResult<Container> {
    let associated_data = generate_associated_data()?;
    let (nonce, ciphertext) = seal(key, &associated_data, payload)?;
    Ok(Container::new(nonce, associated_data, salt, ciphertext))
}

#[cfg(test)]
pub(crate) fn test_backpack() -> Backpack<MemoryKeyStore> {
    let kdf = crypto::kdf::test_config();
    let config = CryptoConfig::default()
        .with_alias("tests")
        .with_argon2(kdf.argon2)
        .with_sha_rounds(kdf.sha_rounds);
    Backpack::new(config, MemoryKeyStore::new())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;

    struct LockedKeyStore;

    impl KeyStore for LockedKeyStore {
        fn get_or_create_key(&self, alias: &str) -> CryptoResult<StoreKey> {
            Err(CryptoError::KeyStore(format!("'{alias}' is locked")))
        }
    }

    #[test]
    fn key_store_failure_is_fatal() {
        let locked = Backpack::new(test_backpack().config().clone(), LockedKeyStore);
        let mut file = Vec::new();

        let err = locked.encrypt(b"secret data", &mut file).unwrap_err();
        assert!(matches!(err.kind(), CryptoError::KeyStore(_)));
        assert_eq!(err.message(), "The KeyStore access failed.");
        assert!(file.is_empty());

        let backpack = test_backpack();
        backpack.encrypt(b"secret data", &mut file).unwrap();
        let err = locked.decrypt(&mut Cursor::new(file)).unwrap_err();
        assert!(matches!(err.kind(), CryptoError::KeyStore(_)));
    }

    #[test]
    fn key_store_roundtrip() {
        let backpack = test_backpack();
        let mut file = Vec::new();
        let ciphertext = backpack.encrypt(b"secret data", &mut file).unwrap();

        assert_eq!(ciphertext.len(), b"secret data".len() + 16);
        assert_eq!(file.len(), 12 + 16 + ciphertext.len());
        assert_eq!(&file[28..], &ciphertext[..]);

        let plaintext = backpack.decrypt(&mut Cursor::new(file)).unwrap();
        assert_eq!(&plaintext[..], b"secret data");
    }

    #[test]
    fn passphrase_roundtrip() {
        let backpack = test_backpack();
        let hash = backpack.argon2_hash("correct").unwrap();
        let mut file = Vec::new();
        backpack.encrypt_with_hash(b"secret data", &mut file, &hash).unwrap();

        assert_eq!(&file[28..60], hash.salt());

        let plaintext = backpack
            .decrypt_with_passphrase(&mut Cursor::new(file), "correct")
            .unwrap();
        assert_eq!(&plaintext[..], b"secret data");
    }

    #[test]
    fn legacy_sha_container_still_decrypts() {
        let backpack = test_backpack();
        let hash = backpack.sha_hash("correct").unwrap();
        let mut file = Vec::new();
        backpack.encrypt_with_hash(b"old data", &mut file, &hash).unwrap();

        let plaintext = backpack
            .decrypt_with_passphrase(&mut Cursor::new(file), "correct")
            .unwrap();
        assert_eq!(&plaintext[..], b"old data");
    }

    #[test]
    fn wrong_passphrase_is_authentication_failure() {
        let backpack = test_backpack();
        let mut file = Vec::new();
        backpack
            .encrypt_with_passphrase(b"secret data", &mut file, "correct")
            .unwrap();

        let err = backpack
            .decrypt_with_passphrase(&mut Cursor::new(file), "wrong")
            .unwrap_err();
        assert!(err.is_authentication_failure());
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn empty_payload_is_not_a_failure() {
        let backpack = test_backpack();
        let mut file = Vec::new();
        backpack.encrypt_with_passphrase(b"", &mut file, "pw").unwrap();

        let plaintext = backpack
            .decrypt_with_passphrase(&mut Cursor::new(file), "pw")
            .unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn same_payload_gets_fresh_nonce_and_ciphertext() {
        let backpack = test_backpack();
        let mut first = Vec::new();
        let mut second = Vec::new();
        let c1 = backpack.encrypt(b"same", &mut first).unwrap();
        let c2 = backpack.encrypt(b"same", &mut second).unwrap();

        assert_ne!(&first[..12], &second[..12]);
        assert_ne!(&first[12..28], &second[12..28]);
        assert_ne!(c1, c2);
    }

    #[test]
    fn other_key_store_cannot_decrypt() {
        let backpack = test_backpack();
        let mut file = Vec::new();
        backpack.encrypt(b"secret", &mut file).unwrap();

        let stranger = Backpack::new(backpack.config().clone(), MemoryKeyStore::new());
        let err = stranger.decrypt(&mut Cursor::new(file)).unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn tampered_associated_data_fails() {
        let backpack = test_backpack();
        let mut file = Vec::new();
        backpack.encrypt(b"secret", &mut file).unwrap();
        file[12] ^= 0x01;

        assert!(backpack.decrypt(&mut Cursor::new(file)).is_err());
    }

    #[test]
    fn truncated_container_is_reported() {
        let backpack = test_backpack();
        let err = backpack.decrypt(&mut Cursor::new(vec![0u8; 20])).unwrap_err();
        assert!(matches!(err.kind(), CryptoError::Truncated { .. }));
    }

    #[test]
    fn short_hash_cannot_be_a_key() {
        let backpack = test_backpack();
        let hash = Hash::new(vec![1u8; 16], [0u8; 32]);
        let mut file = Vec::new();
        let err = backpack
            .encrypt_with_hash(b"x", &mut file, &hash)
            .unwrap_err();
        assert!(matches!(err.kind(), CryptoError::InvalidParameter(_)));
        assert!(file.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn key_store_roundtrip_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let backpack = test_backpack();
            let mut file = Vec::new();
            backpack.encrypt(&data, &mut file).unwrap();
            let plaintext = backpack.decrypt(&mut Cursor::new(file)).unwrap();
            prop_assert_eq!(&plaintext[..], &data[..]);
        }
    }
}

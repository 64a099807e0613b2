//! Content hashing: a fast xxh3-128 fingerprint for identification, and
//! salted slow hashes for passphrase verification.

use std::fmt;

use xxhash_rust::xxh3::xxh3_128;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{
    KEY_LEN, SALT_LEN,
    kdf::{Argon2Params, argon2_raw, sha512_stretch},
    random::generate_salt,
};
use crate::error::CryptoResult;

/// A hash value together with the salt it was computed with.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Hash {
    value: Vec<u8>,
    salt: [u8; SALT_LEN],
}

impl Hash {
    pub fn new(value: Vec<u8>, salt: [u8; SALT_LEN]) -> Self {
        Self { value, salt }
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// The first 256 bits of the value, used directly as an AES key.
    pub(crate) fn key_material(&self) -> Option<&[u8]> {
        self.value.get(..KEY_LEN)
    }

    /// Recomputes the Argon2id hash of `text` with this salt and compares.
    pub fn verify_argon2(&self, text: &str, params: Argon2Params) -> CryptoResult<bool> {
        let candidate = argon2_raw(text, &self.salt, params)?;
        Ok(constant_time_eq(&self.value, &candidate[..]))
    }

    /// Recomputes the SHA-512 stretch of `text` with this salt and compares.
    pub fn verify_sha(&self, text: &str, rounds: u32) -> CryptoResult<bool> {
        let candidate = sha512_stretch(text, &self.salt, rounds)?;
        Ok(constant_time_eq(&self.value, &candidate[..]))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hash")
            .field("value_len", &self.value.len())
            .field("salt", &hex(&self.salt))
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Argon2id hash of `text` under a fresh 32-byte salt.
pub fn argon2_hash(text: &str, params: Argon2Params) -> CryptoResult<Hash> {
    let salt = generate_salt()?;
    let value = argon2_raw(text, &salt, params)?;
    Ok(Hash::new(value.to_vec(), salt))
}

/// Iterated SHA-512 hash of `text` under a fresh 32-byte salt. The value is
/// the full 64-byte digest.
pub fn sha_hash(text: &str, rounds: u32) -> CryptoResult<Hash> {
    let salt = generate_salt()?;
    let value = sha512_stretch(text, &salt, rounds)?;
    Ok(Hash::new(value.to_vec(), salt))
}

/// xxh3-128 of `text` as 32 lowercase hex characters.
pub fn fingerprint(text: &str) -> String {
    fingerprint_bytes(text.as_bytes())
}

pub fn fingerprint_bytes(data: &[u8]) -> String {
    format!("{:032x}", xxh3_128(data))
}

//! Candidate-key decryption.
//!
//! A passphrase container may have been sealed with a key from either
//! derivation. Every candidate in [`KdfAlgorithm::FALLBACK_ORDER`] is derived
//! before the first cipher attempt, so the derivation cost does not depend on
//! which candidate opens the container. A rejected tag moves on to the next
//! candidate, any other failure aborts.

use zeroize::Zeroizing;

use crate::container::Container;
use crate::crypto::{Attempt, KdfAlgorithm, KdfConfig, derive_key, open};
use crate::error::{CryptoError, CryptoResult};
use crate::keystore::StoreKey;

pub(crate) fn open_with_store_key(
    container: &Container,
    key: &StoreKey,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    match open(
        key.expose(),
        container.nonce(),
        container.associated_data(),
        container.ciphertext(),
    )? {
        Attempt::Opened(plaintext) => Ok(plaintext),
        Attempt::Rejected => Err(CryptoError::AuthenticationFailed),
    }
}

pub(crate) fn open_with_passphrase(
    container: &Container,
    passphrase: &str,
    kdf: &KdfConfig,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let salt = container.salt().ok_or_else(|| {
        CryptoError::InvalidParameter("passphrase container without salt".to_string())
    })?;

    let candidates = KdfAlgorithm::FALLBACK_ORDER
        .into_iter()
        .map(|algorithm| Ok((algorithm, derive_key(passphrase, salt, algorithm, kdf)?)))
        .collect::<CryptoResult<Vec<_>>>()?;

    for (algorithm, key) in &candidates {
        tracing::debug!(algorithm = algorithm.name(), "decrypting with derived key");

        match open(
            &key[..],
            container.nonce(),
            container.associated_data(),
            container.ciphertext(),
        )? {
            Attempt::Opened(plaintext) => return Ok(plaintext),
            Attempt::Rejected => continue,
        }
    }

    tracing::warn!("available key derivations exhausted");
    Err(CryptoError::AuthenticationFailed)
}

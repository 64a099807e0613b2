use super::{NONCE_LEN, generate_nonce};
use crate::error::{CryptoError, CryptoResult};
use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, Payload},
};
use zeroize::Zeroizing;

/// Outcome of one authenticate-and-decrypt attempt.
pub enum Attempt {
    Opened(Zeroizing<Vec<u8>>),
    /// The tag did not verify under this key.
    Rejected,
}

fn cipher(key: &[u8]) -> CryptoResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| CryptoError::UnsupportedAlgorithm(format!("AES-256-GCM with {}-byte key", key.len())))
}

/// Encrypt plaintext under a fresh nonce, binding `aad` into the tag
pub fn seal(key: &[u8], aad: &[u8], plaintext: &[u8]) -> CryptoResult<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = cipher(key)?;
    let nonce = generate_nonce()?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::UnsupportedAlgorithm("AES-256-GCM encryption failed".to_string()))?;

    Ok((nonce, ciphertext))
}

/// Decrypt ciphertext; a failed tag check is reported as [`Attempt::Rejected`]
pub fn open(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> CryptoResult<Attempt> {
    let cipher = cipher(key)?;

    let attempt = match cipher.decrypt(
        Nonce::from_slice(nonce),
        Payload {
            msg: ciphertext,
            aad,
        },
    ) {
        Ok(plaintext) => Attempt::Opened(Zeroizing::new(plaintext)),
        Err(_) => Attempt::Rejected,
    };
    Ok(attempt)
}

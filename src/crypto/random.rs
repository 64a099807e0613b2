use super::{AAD_LEN, NONCE_LEN, SALT_LEN};
use crate::error::{CryptoError, CryptoResult};
use getrandom::fill;

/// Fill buffer with cryptographically secure random bytes
pub fn secure_random(buf: &mut [u8]) -> CryptoResult<()> {
    fill(buf).map_err(|_| CryptoError::Random)
}

fn random_array<const N: usize>() -> CryptoResult<[u8; N]> {
    let mut buf = [0u8; N];
    secure_random(&mut buf)?;
    Ok(buf)
}

/// Generate salt
pub fn generate_salt() -> CryptoResult<[u8; SALT_LEN]> {
    random_array()
}

/// Generate AES-GCM nonce
pub fn generate_nonce() -> CryptoResult<[u8; NONCE_LEN]> {
    random_array()
}

/// Generate associated data for a new container
pub fn generate_associated_data() -> CryptoResult<[u8; AAD_LEN]> {
    random_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salts_are_fresh_per_call() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn nonces_and_aad_have_expected_sizes() {
        assert_eq!(generate_nonce().unwrap().len(), 12);
        assert_eq!(generate_associated_data().unwrap().len(), 16);
    }
}

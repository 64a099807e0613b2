use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::{
    Digest, Sha512,
    digest::generic_array::GenericArray,
};
use zeroize::Zeroizing;

use super::{KEY_LEN, SHA512_LEN};
use crate::error::{CryptoError, CryptoResult};

/// Default number of SHA-512 stretch rounds for the legacy derivation.
pub const DEFAULT_SHA_ROUNDS: u32 = 250_000;

/// Passphrase derivation algorithms, in the order decryption tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfAlgorithm {
    /// Argon2id, used for every new encryption.
    Primary,
    /// Iterated SHA-512, kept so older containers stay readable.
    Legacy,
}

impl KdfAlgorithm {
    pub const FALLBACK_ORDER: [KdfAlgorithm; 2] = [KdfAlgorithm::Primary, KdfAlgorithm::Legacy];

    pub fn name(self) -> &'static str {
        match self {
            KdfAlgorithm::Primary => "argon2id",
            KdfAlgorithm::Legacy => "sha512-stretch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            mem_cost_kib: 64 * 1024, // 64 MiB
            time_cost: 10,
            parallelism: 1,
        }
    }
}

impl Argon2Params {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> CryptoResult<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn validate(&self) -> CryptoResult<()> {
        let invalid = |msg: &str| Err(CryptoError::InvalidParameter(msg.to_string()));
        if self.time_cost < 1 {
            return invalid("argon2 time cost must be >= 1");
        }
        if self.parallelism < 1 {
            return invalid("argon2 parallelism must be >= 1");
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return invalid("argon2 memory cost must be at least 8 * parallelism");
        }
        Ok(())
    }
}

/// Parameters for both passphrase derivations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfConfig {
    #[serde(default)]
    pub argon2: Argon2Params,
    #[serde(default = "default_sha_rounds")]
    pub sha_rounds: u32,
}

fn default_sha_rounds() -> u32 {
    DEFAULT_SHA_ROUNDS
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            argon2: Argon2Params::default(),
            sha_rounds: DEFAULT_SHA_ROUNDS,
        }
    }
}

/// Derive a 256-bit key from a passphrase and salt with the given algorithm.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8],
    algorithm: KdfAlgorithm,
    config: &KdfConfig,
) -> CryptoResult<Zeroizing<[u8; KEY_LEN]>> {
    match algorithm {
        KdfAlgorithm::Primary => argon2_raw(passphrase, salt, config.argon2),
        KdfAlgorithm::Legacy => {
            let digest = sha512_stretch(passphrase, salt, config.sha_rounds)?;
            let mut key = Zeroizing::new([0u8; KEY_LEN]);
            key.copy_from_slice(&digest[..KEY_LEN]);
            Ok(key)
        }
    }
}

/// Argon2id v0x13 with a 32-byte output.
pub fn argon2_raw(
    passphrase: &str,
    salt: &[u8],
    kdf: Argon2Params,
) -> CryptoResult<Zeroizing<[u8; KEY_LEN]>> {
    kdf.validate()?;

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CryptoError::InvalidParameter(format!("argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .map_err(|e| CryptoError::InvalidParameter(format!("argon2 key derivation: {e}")))?;

    Ok(key)
}

/// Iterated SHA-512: the first round hashes `salt || passphrase`, every
/// following round hashes the previous digest alone.
pub fn sha512_stretch(
    passphrase: &str,
    salt: &[u8],
    rounds: u32,
) -> CryptoResult<Zeroizing<[u8; SHA512_LEN]>> {
    if rounds == 0 {
        return Err(CryptoError::InvalidParameter(
            "sha512 stretch needs at least one round".to_string(),
        ));
    }

    let mut digest = Zeroizing::new([0u8; SHA512_LEN]);
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(passphrase.as_bytes());
    hasher.finalize_into_reset(GenericArray::from_mut_slice(&mut digest[..]));

    for _ in 1..rounds {
        hasher.update(&digest[..]);
        hasher.finalize_into_reset(GenericArray::from_mut_slice(&mut digest[..]));
    }

    Ok(digest)
}

#[cfg(test)]
pub(crate) fn test_config() -> KdfConfig {
    KdfConfig {
        argon2: Argon2Params::new(1024, 1, 1).unwrap(),
        sha_rounds: 1_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn default_params_match_container_format() {
        let kdf = KdfConfig::default();
        assert_eq!(kdf.argon2.mem_cost_kib(), 65_536);
        assert_eq!(kdf.argon2.time_cost(), 10);
        assert_eq!(kdf.argon2.parallelism(), 1);
        assert_eq!(kdf.sha_rounds, 250_000);
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 32];
        let kdf = test_config();

        let k1 = derive_key("password", &salt, KdfAlgorithm::Primary, &kdf).unwrap();
        let k2 = derive_key("password", &salt, KdfAlgorithm::Primary, &kdf).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn one_bit_salt_change_changes_whole_key() {
        let salt = [42u8; 32];
        let mut flipped = salt;
        flipped[0] ^= 1;
        let kdf = test_config();

        let k1 = derive_key("password", &salt, KdfAlgorithm::Primary, &kdf).unwrap();
        let k2 = derive_key("password", &flipped, KdfAlgorithm::Primary, &kdf).unwrap();

        let differing_bits: u32 = k1
            .iter()
            .zip(k2.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        assert!(differing_bits > 64, "only {differing_bits} bits differ");
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 32];

        let k1 = argon2_raw("pw", &salt, Argon2Params::new(1024, 1, 1).unwrap()).unwrap();
        let k2 = argon2_raw("pw", &salt, Argon2Params::new(2048, 1, 1).unwrap()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn primary_and_legacy_disagree() {
        let salt = [7u8; 32];
        let kdf = test_config();

        let primary = derive_key("pw", &salt, KdfAlgorithm::Primary, &kdf).unwrap();
        let legacy = derive_key("pw", &salt, KdfAlgorithm::Legacy, &kdf).unwrap();

        assert_ne!(*primary, *legacy);
    }

    #[test]
    fn sha512_stretch_single_round_hashes_salt_then_passphrase() {
        let digest = sha512_stretch("pw", &[7u8; 32], 1).unwrap();
        assert_eq!(
            hex(&digest[..]),
            "49807fcbacba202bb830b8721914612c0d14cc42efded55a89cd6c4977ee51b6\
             4f5375cda3b16f27a9da28d0c91df38b5be097dea39160c3baa526e32ef4ebd7"
        );
    }

    #[test]
    fn legacy_key_is_digest_prefix() {
        let kdf = KdfConfig {
            sha_rounds: 3,
            ..test_config()
        };
        let key = derive_key("pw", &[7u8; 32], KdfAlgorithm::Legacy, &kdf).unwrap();
        assert_eq!(
            hex(&key[..]),
            "04bbf62cffc2a771b828f349fd00330d262382eb4408a26b480911158d64c5e6"
        );
    }

    #[test]
    fn zero_rounds_rejected() {
        assert!(matches!(
            sha512_stretch("pw", &[0u8; 32], 0),
            Err(CryptoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(Argon2Params::new(0, 0, 0).is_err());
        assert!(Argon2Params::new(8, 1, 2).is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let kdf: KdfConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(kdf, KdfConfig::default());
    }
}

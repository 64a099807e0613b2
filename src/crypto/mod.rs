//! Cryptographic primitives for backpack containers.
//!
//! Provides secure randomness, passphrase key derivation and the AES-GCM
//! primitive the container codec is built on.

pub mod aead;
pub mod kdf;
pub mod random;

pub use aead::{Attempt, open, seal};
pub use kdf::{Argon2Params, KdfAlgorithm, KdfConfig, derive_key};
pub use random::{generate_associated_data, generate_nonce, generate_salt};

/// Length of the salt (32 bytes).
pub const SALT_LEN: usize = 32;
/// Length of the nonce (12 bytes for AES-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the random associated data bound into the tag (16 bytes).
pub const AAD_LEN: usize = 16;
/// Length of the GCM authentication tag (16 bytes / 128 bits).
pub const TAG_LEN: usize = 16;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of a SHA-512 digest.
pub const SHA512_LEN: usize = 64;

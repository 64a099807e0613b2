//! On-disk container layout.
//!
//! ```text
//! NONCE (12) | ASSOCIATED DATA (16) | SALT (32, passphrase mode only) | CIPHERTEXT + TAG
//! ```
//!
//! The layout carries no mode marker: whether a salt follows the associated
//! data is decided by the caller, from whether a passphrase was supplied.

use std::io::{Read, Write};

use crate::crypto::{AAD_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{CryptoError, CryptoResult};

/// How the container key was obtained, and so whether a salt is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMode {
    KeyStore,
    Passphrase,
}

impl ContainerMode {
    pub const fn header_len(self) -> usize {
        match self {
            ContainerMode::KeyStore => NONCE_LEN + AAD_LEN,
            ContainerMode::Passphrase => NONCE_LEN + AAD_LEN + SALT_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    nonce: [u8; NONCE_LEN],
    associated_data: [u8; AAD_LEN],
    salt: Option<[u8; SALT_LEN]>,
    ciphertext: Vec<u8>,
}

impl Container {
    pub fn new(
        nonce: [u8; NONCE_LEN],
        associated_data: [u8; AAD_LEN],
        salt: Option<[u8; SALT_LEN]>,
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            nonce,
            associated_data,
            salt,
            ciphertext,
        }
    }

    pub fn mode(&self) -> ContainerMode {
        if self.salt.is_some() {
            ContainerMode::Passphrase
        } else {
            ContainerMode::KeyStore
        }
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn associated_data(&self) -> &[u8; AAD_LEN] {
        &self.associated_data
    }

    pub fn salt(&self) -> Option<&[u8; SALT_LEN]> {
        self.salt.as_ref()
    }

    /// Encrypted payload followed by the 16-byte tag.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn into_ciphertext(self) -> Vec<u8> {
        self.ciphertext
    }

    pub fn encoded_len(&self) -> usize {
        self.mode().header_len() + self.ciphertext.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());

        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.associated_data);
        if let Some(salt) = &self.salt {
            buf.extend_from_slice(salt);
        }
        buf.extend_from_slice(&self.ciphertext);

        buf
    }

    /// Writes the whole container with a single `write_all`.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> CryptoResult<()> {
        sink.write_all(&self.to_bytes())?;
        sink.flush()?;
        Ok(())
    }

    pub fn parse(data: &[u8], mode: ContainerMode) -> CryptoResult<Self> {
        let min_len = mode.header_len() + TAG_LEN;
        if data.len() < min_len {
            return Err(CryptoError::Truncated {
                expected: min_len,
                actual: data.len(),
            });
        }

        let (nonce, rest) = data.split_at(NONCE_LEN);
        let (associated_data, rest) = rest.split_at(AAD_LEN);
        let (salt, ciphertext) = match mode {
            ContainerMode::KeyStore => (None, rest),
            ContainerMode::Passphrase => {
                let (salt, ciphertext) = rest.split_at(SALT_LEN);
                (Some(to_array(salt)?), ciphertext)
            }
        };

        Ok(Self {
            nonce: to_array(nonce)?,
            associated_data: to_array(associated_data)?,
            salt,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Reads a container from the current position to the end of `source`.
    pub fn read_from<R: Read>(source: &mut R, mode: ContainerMode) -> CryptoResult<Self> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Self::parse(&data, mode)
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> CryptoResult<[u8; N]> {
    bytes.try_into().map_err(|_| CryptoError::Truncated {
        expected: N,
        actual: bytes.len(),
    })
}

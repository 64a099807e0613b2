//! Error types for key handling, container parsing and en/decryption.

use std::backtrace::Backtrace;
use std::fmt;

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The secure key facility is unavailable or the alias lookup/creation failed.
    #[error("key store failure: {0}")]
    KeyStore(String),

    /// The cipher rejected its configuration (key length, transform).
    #[error("unsupported cipher configuration: {0}")]
    UnsupportedAlgorithm(String),

    /// No candidate key authenticated the ciphertext.
    #[error("Invalid password or corrupted data")]
    AuthenticationFailed,

    #[error("container truncated: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("OS random generator unavailable")]
    Random,

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    fn headline(&self) -> String {
        match self {
            CryptoError::KeyStore(_) => "The KeyStore access failed.".to_string(),
            CryptoError::UnsupportedAlgorithm(_) => {
                "The requested algorithm AES/GCM/NoPadding is not supported.".to_string()
            }
            CryptoError::AuthenticationFailed => {
                "Decryption failed: wrong passphrase or corrupted data.".to_string()
            }
            CryptoError::Truncated { .. } => "The encrypted data is incomplete.".to_string(),
            CryptoError::InvalidParameter(_) => "Invalid key derivation parameters.".to_string(),
            CryptoError::Random => "No secure random source available.".to_string(),
            CryptoError::Serialization(_) => "The decrypted data could not be read.".to_string(),
            CryptoError::Io(_) => "Reading or writing the encrypted data failed.".to_string(),
        }
    }
}

/// User-facing wrapper carrying a readable message and a diagnostic trace.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EnDecryptionError {
    message: String,
    trace: String,
    #[source]
    source: CryptoError,
}

impl EnDecryptionError {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error chain followed by the backtrace captured at conversion time.
    pub fn trace(&self) -> &str {
        &self.trace
    }

    pub fn kind(&self) -> &CryptoError {
        &self.source
    }

    pub fn is_authentication_failure(&self) -> bool {
        matches!(self.source, CryptoError::AuthenticationFailed)
    }
}

impl From<CryptoError> for EnDecryptionError {
    fn from(source: CryptoError) -> Self {
        let trace = format!("{}\n{}", Chain(&source), Backtrace::capture());
        Self {
            message: source.headline(),
            trace,
            source,
        }
    }
}

struct Chain<'a>(&'a (dyn std::error::Error + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut cause = self.0.source();
        while let Some(err) = cause {
            write!(f, "\ncaused by: {err}")?;
            cause = err.source();
        }
        Ok(())
    }
}

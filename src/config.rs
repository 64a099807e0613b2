//! Explicit configuration for a [`Backpack`](crate::Backpack) instance.

use serde::{Deserialize, Serialize};

use crate::crypto::{Argon2Params, KdfConfig};
use crate::keystore::default_alias;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Key store alias of the key used when no passphrase is given.
    #[serde(default = "alias_for_build")]
    pub alias: String,
    #[serde(default)]
    pub kdf: KdfConfig,
}

fn alias_for_build() -> String {
    default_alias().to_string()
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            alias: alias_for_build(),
            kdf: KdfConfig::default(),
        }
    }
}

impl CryptoConfig {
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_argon2(mut self, params: Argon2Params) -> Self {
        self.kdf.argon2 = params;
        self
    }

    pub fn with_sha_rounds(mut self, rounds: u32) -> Self {
        self.kdf.sha_rounds = rounds;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

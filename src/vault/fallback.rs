//! Locally keyed fallback encryption
//!
//! Used only when the OS keyring cannot be reached. The key is derived from a
//! passphrase embedded in the binary, so this obscures the credential on disk
//! but is not a security boundary.

use std::sync::OnceLock;

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroizing;

use super::crypto::{self, KEY_LEN};
use crate::error::VaultError;

const PASSPHRASE: &[u8] = b"kbsync/local-vault/v1";
const SALT: &[u8] = b"kbsync-fallback-salt";

type Result<T> = std::result::Result<T, VaultError>;

/// AES-256-GCM cipher keyed by Argon2id over a fixed passphrase and salt.
///
/// The key is derived on first use and cached for the lifetime of the cipher.
pub struct FallbackCipher {
    params: Params,
    key: OnceLock<Zeroizing<[u8; KEY_LEN]>>,
}

impl Default for FallbackCipher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

impl FallbackCipher {
    /// Cipher with explicit Argon2 cost parameters.
    ///
    /// Files are only readable by a cipher built with the same parameters.
    pub fn with_params(params: Params) -> Self {
        Self {
            params,
            key: OnceLock::new(),
        }
    }

    fn key(&self) -> Result<&[u8; KEY_LEN]> {
        if let Some(key) = self.key.get() {
            let key: &[u8; KEY_LEN] = key;
            return Ok(key);
        }

        let mut derived = Zeroizing::new([0u8; KEY_LEN]);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password_into(PASSPHRASE, SALT, &mut derived[..])
            .map_err(|e| VaultError::Crypto(format!("key derivation failed: {}", e)))?;

        let key: &[u8; KEY_LEN] = self.key.get_or_init(|| derived);
        Ok(key)
    }

    pub fn seal(&self, secret: &str) -> Result<Vec<u8>> {
        crypto::seal(self.key()?, secret.as_bytes())
    }

    pub fn open(&self, data: &[u8]) -> Result<String> {
        let plaintext = Zeroizing::new(crypto::open(self.key()?, data)?);
        String::from_utf8(plaintext.to_vec())
            .map_err(|_| VaultError::Crypto("credential is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_cipher() -> FallbackCipher {
    FallbackCipher::with_params(Params::new(8, 1, 1, Some(KEY_LEN)).unwrap())
}

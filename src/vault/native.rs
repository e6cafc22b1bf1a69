//! OS keyring-backed native protector

use std::path::Path;

use aes_gcm::aead::OsRng;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use keyring::Entry;
use keyring::credential::CredentialPersistence;
use log::debug;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::NativeProtector;
use super::crypto::{self, KEY_LEN};
use crate::error::VaultError;

const SERVICE: &str = "kbsync";

type Result<T> = std::result::Result<T, VaultError>;

/// Stable per-installation account name derived from the data directory.
pub fn installation_id(data_dir: &Path) -> String {
    let digest = Sha256::digest(data_dir.to_string_lossy().as_bytes());
    let hex = format!("{:x}", digest);
    format!("installation-{}", &hex[..16])
}

/// Whether the platform's default keyring store survives logout and reboot.
pub fn store_persists() -> bool {
    matches!(
        keyring::default::default_credential_builder().persistence(),
        CredentialPersistence::UntilDelete
    )
}

/// Keeps a random data key in the OS keyring and seals the credential with it.
///
/// The keyring only ever holds the data key; the sealed credential lives in
/// the vault directory like the fallback artifact does.
pub struct KeyringProtector {
    entry: Option<Entry>,
    available: bool,
}

impl KeyringProtector {
    /// Probe the keyring for the given account.
    ///
    /// A store that forgets its entries on reboot is reported unavailable, so
    /// the vault never seals a credential with a key it is about to lose.
    pub fn new(account: &str) -> Self {
        if !store_persists() {
            debug!("OS keyring does not persist across reboots, not using it");
            return Self {
                entry: None,
                available: false,
            };
        }

        let entry = match Entry::new(SERVICE, account) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("OS keyring entry could not be created: {}", e);
                None
            }
        };

        let available = entry.as_ref().is_some_and(|entry| match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => true,
            Err(e) => {
                debug!("OS keyring unavailable: {}", e);
                false
            }
        });

        Self { entry, available }
    }

    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self::new(&installation_id(data_dir))
    }

    fn entry(&self) -> Result<&Entry> {
        self.entry
            .as_ref()
            .ok_or_else(|| VaultError::Native("keyring entry unavailable".to_string()))
    }

    fn decode_key(encoded: &str) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded)
                .map_err(|e| VaultError::Native(format!("stored data key is malformed: {}", e)))?,
        );
        if bytes.len() != KEY_LEN {
            return Err(VaultError::Native(
                "stored data key has the wrong length".to_string(),
            ));
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    fn data_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let encoded = Zeroizing::new(
            self.entry()?
                .get_password()
                .map_err(|e| VaultError::Native(e.to_string()))?,
        );
        Self::decode_key(&encoded)
    }

    fn data_key_or_create(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(encoded) => Self::decode_key(&Zeroizing::new(encoded)),
            Err(keyring::Error::NoEntry) => {
                let mut key = Zeroizing::new([0u8; KEY_LEN]);
                OsRng.fill_bytes(&mut key[..]);
                let encoded = Zeroizing::new(STANDARD.encode(&key[..]));
                entry
                    .set_password(&encoded)
                    .map_err(|e| VaultError::Native(e.to_string()))?;
                debug!("Created vault data key in OS keyring");
                Ok(key)
            }
            Err(e) => Err(VaultError::Native(e.to_string())),
        }
    }
}

impl NativeProtector for KeyringProtector {
    fn is_available(&self) -> bool {
        self.available
    }

    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
        let key = self.data_key_or_create()?;
        crypto::seal(&key, plaintext.as_bytes())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<String> {
        let key = self.data_key()?;
        let plaintext = Zeroizing::new(crypto::open(&key, ciphertext)?);
        String::from_utf8(plaintext.to_vec())
            .map_err(|_| VaultError::Crypto("credential is not valid UTF-8".to_string()))
    }
}

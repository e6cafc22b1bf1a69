//! AES-256-GCM sealing shared by the native and fallback vault paths
//!
//! Sealed layout: `nonce (12) || tag (16) || ciphertext`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::VaultError;

pub(crate) const NONCE_LEN: usize = 12;
pub(crate) const TAG_LEN: usize = 16;
pub(crate) const KEY_LEN: usize = 32;

type Result<T> = std::result::Result<T, VaultError>;

fn cipher(key: &[u8; KEY_LEN]) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::Crypto(format!("invalid key length: {:?}", e)))
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub(crate) fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut sealed = cipher(key)?
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::Crypto(format!("encryption failed: {}", e)))?;

    // aes-gcm appends the tag; the file format stores it ahead of the ciphertext
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    let mut out = Vec::with_capacity(NONCE_LEN + TAG_LEN + sealed.len());
    out.extend_from_slice(nonce.as_slice());
    out.extend_from_slice(&tag);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt and authenticate data produced by [`seal`].
pub(crate) fn open(key: &[u8; KEY_LEN], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::Crypto("sealed data is truncated".to_string()));
    }

    let (nonce, rest) = data.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut joined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    joined.extend_from_slice(ciphertext);
    joined.extend_from_slice(tag);

    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), joined.as_ref())
        .map_err(|_| VaultError::Crypto("authentication failed".to_string()))
}

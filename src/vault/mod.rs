//! Credential vault
//!
//! Persists a single API key under the private data directory. The OS keyring
//! is the primary path; when it is unavailable the key is sealed with a
//! locally derived key instead. Exactly one artifact is authoritative at a
//! time: every save removes the artifact of the other path.

mod crypto;
pub mod fallback;
pub mod native;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::VaultError;

pub use fallback::FallbackCipher;
pub use native::KeyringProtector;

/// Artifact written by the native path
pub const SECURE_FILE: &str = "api-key.enc";

/// Artifact written by the fallback path
pub const FALLBACK_FILE: &str = "api-key-fallback.enc";

type Result<T> = std::result::Result<T, VaultError>;

/// Platform-native secret protection (OS keyring, DPAPI, Keychain, ...)
pub trait NativeProtector: Send + Sync {
    /// Whether the facility can be used on this machine right now.
    fn is_available(&self) -> bool;

    fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8]) -> Result<String>;
}

/// Which path a save goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultBackend {
    Native,
    Fallback,
}

impl std::fmt::Display for VaultBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultBackend::Native => write!(f, "OS keyring"),
            VaultBackend::Fallback => write!(f, "local encryption"),
        }
    }
}

/// Single-credential store with native and fallback encryption paths
pub struct Vault {
    dir: PathBuf,
    native: Option<Box<dyn NativeProtector>>,
    fallback: FallbackCipher,
}

impl Vault {
    /// Vault in `dir` using `native` when it reports itself available.
    pub fn new(dir: impl Into<PathBuf>, native: Option<Box<dyn NativeProtector>>) -> Self {
        Self {
            dir: dir.into(),
            native,
            fallback: FallbackCipher::default(),
        }
    }

    /// Vault that never touches the OS keyring.
    pub fn fallback_only(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, None)
    }

    /// Replace the fallback cipher (cost parameters).
    pub fn with_fallback(mut self, fallback: FallbackCipher) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn secure_path(&self) -> PathBuf {
        self.dir.join(SECURE_FILE)
    }

    fn fallback_path(&self) -> PathBuf {
        self.dir.join(FALLBACK_FILE)
    }

    fn available_native(&self) -> Option<&dyn NativeProtector> {
        self.native.as_deref().filter(|n| n.is_available())
    }

    /// Path the next save will use.
    pub fn backend(&self) -> VaultBackend {
        if self.available_native().is_some() {
            VaultBackend::Native
        } else {
            VaultBackend::Fallback
        }
    }

    /// Encrypt and persist `secret`, replacing any previous credential.
    pub fn save(&self, secret: &str) -> Result<VaultBackend> {
        fs::create_dir_all(&self.dir).map_err(|e| VaultError::io(&self.dir, e))?;

        if let Some(native) = self.available_native() {
            match native.encrypt(secret) {
                Ok(sealed) => {
                    write_private(&self.secure_path(), &sealed)?;
                    remove_if_exists(&self.fallback_path())?;
                    info!("Saved API key via {}", VaultBackend::Native);
                    return Ok(VaultBackend::Native);
                }
                Err(e) => warn!("Native encryption failed, using local fallback: {}", e),
            }
        } else {
            debug!("Native secure storage unavailable, using local fallback");
        }

        let sealed = self.fallback.seal(secret)?;
        write_private(&self.fallback_path(), &sealed)?;
        remove_if_exists(&self.secure_path())?;
        info!("Saved API key via {}", VaultBackend::Fallback);
        Ok(VaultBackend::Fallback)
    }

    /// Load the saved credential; `None` when nothing has been saved.
    pub fn load(&self) -> Result<Option<String>> {
        let secure_path = self.secure_path();

        if let Some(native) = self.available_native()
            && secure_path.exists()
        {
            let sealed = fs::read(&secure_path).map_err(|e| VaultError::io(&secure_path, e))?;
            match native.decrypt(&sealed) {
                Ok(secret) => return Ok(Some(secret)),
                Err(e) => {
                    warn!("Failed to decrypt with native store, trying local fallback: {}", e);
                }
            }
        }

        self.load_fallback()
    }

    fn load_fallback(&self) -> Result<Option<String>> {
        let path = self.fallback_path();
        let sealed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::io(&path, e)),
        };
        debug!("Loading API key from local fallback");
        self.fallback.open(&sealed).map(Some)
    }

    /// Whether any credential artifact is present (without decrypting it).
    pub fn has_credential(&self) -> bool {
        self.fallback_path().exists()
            || (self.available_native().is_some() && self.secure_path().exists())
    }

    /// Delete both artifacts.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.secure_path())?;
        remove_if_exists(&self.fallback_path())
    }
}

/// Write atomically (temp file + rename) with owner-only permissions.
fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).map_err(|e| VaultError::io(&tmp, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
            .map_err(|e| VaultError::io(&tmp, e))?;
    }

    fs::rename(&tmp, path).map_err(|e| VaultError::io(path, e))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale vault artifact {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VaultError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Reversible stand-in for the OS facility with switchable failure modes.
    #[derive(Clone, Default)]
    struct FakeNative {
        unavailable: Arc<AtomicBool>,
        fail_encrypt: Arc<AtomicBool>,
        fail_decrypt: Arc<AtomicBool>,
    }

    impl NativeProtector for FakeNative {
        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>> {
            if self.fail_encrypt.load(Ordering::SeqCst) {
                return Err(VaultError::Native("encrypt refused".into()));
            }
            let mut out = b"NATIVE:".to_vec();
            out.extend(plaintext.bytes().map(|b| b ^ 0x5a));
            Ok(out)
        }

        fn decrypt(&self, ciphertext: &[u8]) -> Result<String> {
            if self.fail_decrypt.load(Ordering::SeqCst) {
                return Err(VaultError::Native("decrypt refused".into()));
            }
            let body = ciphertext
                .strip_prefix(b"NATIVE:")
                .ok_or_else(|| VaultError::Native("not ours".into()))?;
            String::from_utf8(body.iter().map(|b| b ^ 0x5a).collect())
                .map_err(|e| VaultError::Native(e.to_string()))
        }
    }

    fn vault_with(native: &FakeNative) -> (Vault, TempDir) {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path().join("vault"), Some(Box::new(native.clone())))
            .with_fallback(fallback::test_cipher());
        (vault, dir)
    }

    fn artifacts(vault: &Vault) -> (bool, bool) {
        (vault.secure_path().exists(), vault.fallback_path().exists())
    }

    #[test]
    fn test_load_without_save_is_absent() {
        let (vault, _dir) = vault_with(&FakeNative::default());
        assert_eq!(vault.load().unwrap(), None);
        assert!(!vault.has_credential());
    }

    #[test]
    fn test_native_round_trip() {
        let native = FakeNative::default();
        let (vault, _dir) = vault_with(&native);

        assert_eq!(vault.save("native-secret").unwrap(), VaultBackend::Native);
        assert_eq!(vault.load().unwrap().as_deref(), Some("native-secret"));
        assert_eq!(artifacts(&vault), (true, false));
    }

    #[test]
    fn test_fallback_round_trip() {
        let native = FakeNative::default();
        native.unavailable.store(true, Ordering::SeqCst);
        let (vault, _dir) = vault_with(&native);

        assert_eq!(vault.backend(), VaultBackend::Fallback);
        assert_eq!(vault.save("fallback-secret").unwrap(), VaultBackend::Fallback);
        assert_eq!(vault.load().unwrap().as_deref(), Some("fallback-secret"));
        assert_eq!(artifacts(&vault), (false, true));
    }

    #[test]
    fn test_fallback_file_is_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::fallback_only(dir.path()).with_fallback(fallback::test_cipher());
        vault.save("plain-looking-key").unwrap();

        let bytes = fs::read(dir.path().join(FALLBACK_FILE)).unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains("plain-looking-key"));
    }

    #[test]
    fn test_save_switching_paths_keeps_one_artifact() {
        let native = FakeNative::default();
        let (vault, _dir) = vault_with(&native);

        vault.save("first").unwrap();
        assert_eq!(artifacts(&vault), (true, false));

        native.unavailable.store(true, Ordering::SeqCst);
        vault.save("second").unwrap();
        assert_eq!(artifacts(&vault), (false, true));
        assert_eq!(vault.load().unwrap().as_deref(), Some("second"));

        native.unavailable.store(false, Ordering::SeqCst);
        vault.save("third").unwrap();
        assert_eq!(artifacts(&vault), (true, false));
        assert_eq!(vault.load().unwrap().as_deref(), Some("third"));
    }

    #[test]
    fn test_native_encrypt_failure_degrades_to_fallback() {
        let native = FakeNative::default();
        native.fail_encrypt.store(true, Ordering::SeqCst);
        let (vault, _dir) = vault_with(&native);

        assert_eq!(vault.save("degraded").unwrap(), VaultBackend::Fallback);
        assert_eq!(artifacts(&vault), (false, true));
        assert_eq!(vault.load().unwrap().as_deref(), Some("degraded"));
    }

    #[test]
    fn test_native_decrypt_failure_falls_back() {
        let native = FakeNative::default();
        native.unavailable.store(true, Ordering::SeqCst);
        let (vault, _dir) = vault_with(&native);
        vault.save("saved-via-fallback").unwrap();

        // A stale native artifact appears and the facility cannot read it
        fs::write(vault.secure_path(), b"garbage").unwrap();
        native.unavailable.store(false, Ordering::SeqCst);
        native.fail_decrypt.store(true, Ordering::SeqCst);

        assert_eq!(vault.load().unwrap().as_deref(), Some("saved-via-fallback"));
    }

    #[test]
    fn test_native_decrypt_failure_without_fallback_is_absent() {
        let native = FakeNative::default();
        let (vault, _dir) = vault_with(&native);
        vault.save("native-only").unwrap();

        native.fail_decrypt.store(true, Ordering::SeqCst);
        assert_eq!(vault.load().unwrap(), None);
    }

    #[test]
    fn test_overwrite_returns_latest() {
        let (vault, _dir) = vault_with(&FakeNative::default());
        vault.save("old").unwrap();
        vault.save("new").unwrap();
        assert_eq!(vault.load().unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_clear_removes_artifacts() {
        let (vault, _dir) = vault_with(&FakeNative::default());
        vault.save("temporary").unwrap();
        assert!(vault.has_credential());

        vault.clear().unwrap();
        assert!(!vault.has_credential());
        assert_eq!(vault.load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_fallback_is_an_error() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::fallback_only(dir.path()).with_fallback(fallback::test_cipher());
        fs::write(dir.path().join(FALLBACK_FILE), b"not a sealed credential at all").unwrap();

        assert!(matches!(vault.load(), Err(VaultError::Crypto(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_artifact_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let vault = Vault::fallback_only(dir.path()).with_fallback(fallback::test_cipher());
        vault.save("private").unwrap();

        let mode = fs::metadata(dir.path().join(FALLBACK_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

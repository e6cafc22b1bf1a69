//! Configuration management for kbsync

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default remote knowledge-base API root
pub const DEFAULT_API_BASE: &str = "https://support.stedwards.edu/TDWebApi/api/96";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Private data directory for the vault and cache (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Remote API endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// Outbound call quota
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Synchronization pacing
    #[serde(default)]
    pub sync: SyncConfig,

    /// Credential vault options
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Remote API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `https://host/TDWebApi/api/96`
    pub base_url: String,
    /// Search endpoint (POST with a JSON filter)
    pub search_path: String,
    /// Detail endpoint prefix; the article ID is appended
    pub detail_path: String,
    /// Lightweight endpoint used to check the API key
    pub validate_path: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            search_path: "/knowledgebase/search".to_string(),
            detail_path: "/knowledgebase".to_string(),
            validate_path: "/auth/getuser".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    fn join(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn search_url(&self) -> String {
        self.join(&self.search_path)
    }

    pub fn detail_url(&self, id: i64) -> String {
        format!("{}/{}", self.join(self.detail_path.trim_end_matches('/')), id)
    }

    pub fn validate_url(&self) -> String {
        self.join(&self.validate_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Admission strategy for outbound calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleStrategy {
    /// Exact rolling window over recent admission timestamps
    #[default]
    SlidingWindow,
    /// Continuously refilled token bucket
    TokenBucket,
}

/// Outbound call quota: at most `max_calls` per `window_ms`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub strategy: ThrottleStrategy,
    pub max_calls: u32,
    pub window_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            strategy: ThrottleStrategy::SlidingWindow,
            max_calls: 60,
            window_ms: 60_000,
        }
    }
}

impl ThrottleConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Synchronization pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum delay between consecutive detail calls, on top of throttle admission
    pub detail_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            detail_delay_ms: 1000,
        }
    }
}

impl SyncConfig {
    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }
}

/// Credential vault options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Probe the OS keyring before falling back to local encryption
    pub native: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { native: true }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoHome)?;
        Ok(base.join("kbsync").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete config path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file does not exist
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Resolved private data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let base = dirs::data_local_dir().ok_or(ConfigError::NoHome)?;
                Ok(base.join("kbsync"))
            }
        }
    }

    /// Reject configurations the core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.throttle.max_calls == 0 {
            return Err(ConfigError::Invalid("throttle.max_calls must be at least 1".into()).into());
        }
        if self.throttle.window_ms == 0 {
            return Err(ConfigError::Invalid("throttle.window_ms must be at least 1".into()).into());
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".into()).into());
        }
        Ok(())
    }
}

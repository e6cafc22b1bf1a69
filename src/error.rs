//! Error types for kbsync

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for kbsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Article {0} is not in the local cache. Run `kbsync sync` first.")]
    NotCached(i64),

    #[error("A sync is already in progress")]
    SyncBusy,

    #[error("Sync cancelled")]
    Cancelled,
}

impl Error {
    /// True when the caller should prompt for a (new) API key.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_auth())
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Remote catalog errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No API key saved. Run `kbsync auth set` to store one.")]
    MissingCredential,

    #[error("API key rejected. Run `kbsync auth set` to store a new one.")]
    Unauthorized,

    #[error("Access denied. The API key lacks permission for this resource.")]
    Forbidden,

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Credential absent or rejected by the remote service.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::MissingCredential | ApiError::Unauthorized)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::RateLimit(_) => Some(429),
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Local cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cached payload for article {id} is unreadable: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Credential vault errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Vault encryption error: {0}")]
    Crypto(String),

    #[error("Native secure store error: {0}")]
    Native(String),
}

impl VaultError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VaultError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Could not determine a configuration or data directory")]
    NoHome,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

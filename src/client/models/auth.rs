//! Credential check result

use serde::Serialize;

/// Outcome of checking the saved API key against the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CredentialStatus {
    /// The service accepted the key
    Valid,
    /// The service rejected the key (401/403)
    Rejected,
    /// The service could not be reached or answered unexpectedly
    Unreachable(String),
    /// No key is saved
    Missing,
}

impl CredentialStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, CredentialStatus::Valid)
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStatus::Valid => write!(f, "valid"),
            CredentialStatus::Rejected => write!(f, "rejected by the server"),
            CredentialStatus::Unreachable(reason) => write!(f, "could not be checked ({})", reason),
            CredentialStatus::Missing => write!(f, "not saved"),
        }
    }
}

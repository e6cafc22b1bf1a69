//! Remote knowledge-base API client

use async_trait::async_trait;

use crate::error::Result;

pub mod catalog;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;

pub use catalog::CatalogClient;
#[cfg(test)]
pub use mock::MockCatalogClient;
pub use models::{Article, ArticleSummary, CredentialStatus, SearchFilter};
pub use rate_limit::{SlidingWindow, Throttle, TokenBucket, build_throttle};

/// Remote catalog operations.
///
/// Every call is authenticated with the vault-held API key and admitted by
/// the shared throttle. Implementations never write to the local cache.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search the catalog. Non-success statuses are returned as errors, not retried.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ArticleSummary>>;

    /// Fetch one full article; each call consumes one admission.
    async fn fetch_detail(&self, id: i64) -> Result<Article>;

    /// Replace an article on the server and return the server's copy.
    async fn update_article(&self, article: &Article) -> Result<Article>;

    /// Check the saved API key.
    ///
    /// Network failures are reported as [`CredentialStatus::Unreachable`];
    /// only local vault failures are returned as errors.
    async fn validate_credential(&self) -> Result<CredentialStatus>;
}

//! Mock catalog client for testing
//!
//! Provides an in-memory implementation of [`CatalogApi`] for unit testing
//! the sync engine without making real API calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::CatalogApi;
use super::models::{Article, ArticleSummary, CredentialStatus, SearchFilter};
use crate::error::{ApiError, Result};

/// Failure injected for a specific article ID.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    Network,
    Unauthorized,
    Status(u16),
}

impl MockFailure {
    fn to_error(self) -> ApiError {
        match self {
            MockFailure::Network => ApiError::Network("connection reset".to_string()),
            MockFailure::Unauthorized => ApiError::Unauthorized,
            MockFailure::Status(code) => ApiError::Status {
                code,
                message: "injected".to_string(),
            },
        }
    }
}

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockCatalogClient::new()
///     .with_articles(vec![Article::new(1, "VPN", "2024-01-01T00:00:00Z")])
///     .await
///     .failing_detail(2, MockFailure::Network)
///     .await;
/// ```
#[derive(Default)]
pub struct MockCatalogClient {
    /// Summaries returned from search, in order
    summaries: Arc<Mutex<Vec<ArticleSummary>>>,
    /// Full records returned from fetch_detail
    details: Arc<Mutex<HashMap<i64, Article>>>,
    /// Per-ID failures for fetch_detail and update_article
    failures: Arc<Mutex<HashMap<i64, MockFailure>>>,
    /// Failure for search (if any)
    search_failure: Arc<Mutex<Option<MockFailure>>>,
    /// Result of validate_credential
    credential: Arc<Mutex<Option<CredentialStatus>>>,
    /// Every call in order, e.g. `search`, `detail:3`, `update:3`
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these articles: search returns their summaries, detail returns the records.
    pub async fn with_articles(self, articles: Vec<Article>) -> Self {
        *self.summaries.lock().await = articles
            .iter()
            .map(|a| ArticleSummary {
                id: a.id,
                subject: Some(a.subject.clone()),
                modified_date: Some(a.modified_date.clone()),
                extra: Default::default(),
            })
            .collect();
        *self.details.lock().await = articles.into_iter().map(|a| (a.id, a)).collect();
        self
    }

    /// Override the search result independently of the served details.
    pub async fn with_summaries(self, summaries: Vec<ArticleSummary>) -> Self {
        *self.summaries.lock().await = summaries;
        self
    }

    pub async fn failing_detail(self, id: i64, failure: MockFailure) -> Self {
        self.failures.lock().await.insert(id, failure);
        self
    }

    pub async fn failing_search(self, failure: MockFailure) -> Self {
        *self.search_failure.lock().await = Some(failure);
        self
    }

    pub async fn with_credential_status(self, status: CredentialStatus) -> Self {
        *self.credential.lock().await = Some(status);
        self
    }

    /// Calls made so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }

    async fn injected(&self, id: i64) -> Option<ApiError> {
        self.failures.lock().await.get(&id).map(|f| f.to_error())
    }
}

#[async_trait]
impl CatalogApi for MockCatalogClient {
    async fn search(&self, _filter: &SearchFilter) -> Result<Vec<ArticleSummary>> {
        self.record("search".to_string()).await;
        if let Some(failure) = *self.search_failure.lock().await {
            return Err(failure.to_error().into());
        }
        Ok(self.summaries.lock().await.clone())
    }

    async fn fetch_detail(&self, id: i64) -> Result<Article> {
        self.record(format!("detail:{}", id)).await;
        if let Some(err) = self.injected(id).await {
            return Err(err.into());
        }
        self.details.lock().await.get(&id).cloned().ok_or_else(|| {
            ApiError::Status {
                code: 404,
                message: format!("article {} not found", id),
            }
            .into()
        })
    }

    async fn update_article(&self, article: &Article) -> Result<Article> {
        self.record(format!("update:{}", article.id)).await;
        if let Some(err) = self.injected(article.id).await {
            return Err(err.into());
        }
        let mut stored = article.clone();
        stored.modified_date = "2030-01-01T00:00:00Z".to_string();
        self.details.lock().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn validate_credential(&self) -> Result<CredentialStatus> {
        self.record("validate".to_string()).await;
        Ok(self
            .credential
            .lock()
            .await
            .clone()
            .unwrap_or(CredentialStatus::Valid))
    }
}

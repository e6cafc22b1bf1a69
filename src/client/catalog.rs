//! HTTP implementation of the catalog API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::models::{Article, ArticleSummary, CredentialStatus, SearchFilter};
use super::rate_limit::Throttle;
use super::CatalogApi;
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::vault::Vault;

/// Knowledge-base API client
pub struct CatalogClient {
    http: HttpClient,
    api: ApiConfig,
    vault: Arc<Vault>,
    throttle: Arc<dyn Throttle>,
}

impl CatalogClient {
    pub fn new(api: ApiConfig, vault: Arc<Vault>, throttle: Arc<dyn Throttle>) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api,
            vault,
            throttle,
        })
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    fn credential(&self) -> Result<Zeroizing<String>> {
        match self.vault.load()? {
            Some(key) => Ok(Zeroizing::new(key)),
            None => Err(ApiError::MissingCredential.into()),
        }
    }

    /// Authenticate, wait for admission, send, and map error statuses.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        // A missing key must not consume an admission
        let key = self.credential()?;

        self.throttle.acquire().await;

        let response = request
            .bearer_auth(key.as_str())
            .send()
            .await
            .map_err(ApiError::from)?;

        check_status(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let data = response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(data)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized.into()),
        StatusCode::FORBIDDEN => Err(ApiError::Forbidden.into()),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            Err(ApiError::RateLimit(Duration::from_secs(retry_after)).into())
        }
        _ => {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("no body").to_string());
            Err(ApiError::Status {
                code: status.as_u16(),
                message,
            }
            .into())
        }
    }
}

fn expect_id(article: Article, id: i64) -> Result<Article> {
    if article.id != id {
        return Err(ApiError::InvalidResponse(format!(
            "requested article {} but received {}",
            id, article.id
        ))
        .into());
    }
    Ok(article)
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ArticleSummary>> {
        let url = self.api.search_url();
        debug!("POST {}", url);

        let response = self.execute(self.http.post(&url).json(filter)).await?;
        Self::parse(response).await
    }

    async fn fetch_detail(&self, id: i64) -> Result<Article> {
        let url = self.api.detail_url(id);
        debug!("GET {}", url);

        let response = self.execute(self.http.get(&url)).await?;
        expect_id(Self::parse(response).await?, id)
    }

    async fn update_article(&self, article: &Article) -> Result<Article> {
        let url = self.api.detail_url(article.id);
        debug!("PUT {}", url);

        let response = self.execute(self.http.put(&url).json(article)).await?;
        expect_id(Self::parse(response).await?, article.id)
    }

    async fn validate_credential(&self) -> Result<CredentialStatus> {
        let Some(key) = self.vault.load()?.map(Zeroizing::new) else {
            return Ok(CredentialStatus::Missing);
        };

        self.throttle.acquire().await;

        let url = self.api.validate_url();
        debug!("GET {}", url);

        let response = match self.http.get(&url).bearer_auth(key.as_str()).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = ApiError::from(e).to_string();
                warn!("Credential check failed: {}", reason);
                return Ok(CredentialStatus::Unreachable(reason));
            }
        };

        let status = response.status();
        Ok(match status {
            s if s.is_success() => CredentialStatus::Valid,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CredentialStatus::Rejected,
            s => CredentialStatus::Unreachable(format!("unexpected status {}", s.as_u16())),
        })
    }
}

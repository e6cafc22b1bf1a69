//! Application context
//!
//! Builds the vault, throttle, client, cache and sync engine once from a
//! [`Config`] and hands out the operations a front end needs. Every instance
//! is independent, so tests can run several side by side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStore, CachedSummary};
use crate::client::{Article, CatalogApi, CatalogClient, CredentialStatus, SearchFilter, build_throttle};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::sync::{PushReport, SyncEngine, SyncPhase, SyncReport};
use crate::vault::{KeyringProtector, NativeProtector, Vault, VaultBackend};

/// Snapshot of local state for status displays
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub data_dir: PathBuf,
    pub cache_path: PathBuf,
    pub api_base: String,
    pub vault_backend: String,
    pub has_credential: bool,
    pub cached_articles: usize,
    pub throttle: String,
    pub phase: SyncPhase,
}

/// Wired-up core components
pub struct AppContext {
    config: Config,
    data_dir: PathBuf,
    vault: Arc<Vault>,
    cache: Arc<CacheStore>,
    client: Arc<CatalogClient>,
    engine: SyncEngine,
}

impl AppContext {
    /// Build a context, probing the OS keyring when `vault.native` is set.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let data_dir = config.data_dir()?;

        let native: Option<Box<dyn NativeProtector>> = if config.vault.native {
            Some(Box::new(KeyringProtector::for_data_dir(&data_dir)))
        } else {
            debug!("Native secure storage disabled by configuration");
            None
        };

        Self::with_vault(config, Vault::new(&data_dir, native))
    }

    /// Build a context around an already constructed vault.
    pub fn with_vault(config: Config, vault: Vault) -> Result<Self> {
        config.validate()?;
        let data_dir = config.data_dir()?;

        let vault = Arc::new(vault);
        let throttle = build_throttle(&config.throttle)?;
        let client = Arc::new(CatalogClient::new(
            config.api.clone(),
            vault.clone(),
            throttle,
        )?);
        let cache = Arc::new(CacheStore::open_at(&data_dir)?);
        let engine = SyncEngine::new(client.clone(), cache.clone(), config.sync.detail_delay());

        debug!("Context ready, data dir {}", data_dir.display());

        Ok(Self {
            config,
            data_dir,
            vault,
            cache,
            client,
            engine,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub async fn sync(&self, filter: &SearchFilter) -> Result<SyncReport> {
        self.engine.sync(filter).await
    }

    pub async fn sync_with_cancel(
        &self,
        filter: &SearchFilter,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        self.engine.sync_with_cancel(filter, cancel).await
    }

    pub fn list_cached(&self) -> Result<Vec<CachedSummary>> {
        Ok(self.cache.list_summaries()?)
    }

    pub fn get_cached(&self, id: i64) -> Result<Option<Article>> {
        Ok(self.cache.get_full(id)?)
    }

    /// Store a new API key, replacing any previous one.
    pub fn save_credential(&self, secret: &str) -> Result<VaultBackend> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::Invalid("API key must not be empty".to_string()).into());
        }
        let backend = self.vault.save(secret)?;
        info!("API key saved ({})", backend);
        Ok(backend)
    }

    pub fn clear_credential(&self) -> Result<()> {
        Ok(self.vault.clear()?)
    }

    pub fn has_credential(&self) -> bool {
        self.vault.has_credential()
    }

    pub async fn validate_credential(&self) -> Result<CredentialStatus> {
        self.client.validate_credential().await
    }

    pub async fn push_edits(&self, articles: &[Article]) -> Result<PushReport> {
        self.engine.push_edits(articles).await
    }

    pub fn status(&self) -> Result<Status> {
        let throttle = &self.config.throttle;
        Ok(Status {
            data_dir: self.data_dir.clone(),
            cache_path: self.cache.path().to_path_buf(),
            api_base: self.config.api.base_url.clone(),
            vault_backend: self.vault.backend().to_string(),
            has_credential: self.vault.has_credential(),
            cached_articles: self.cache.count()?,
            throttle: format!(
                "{:?}, {} calls per {:?}",
                throttle.strategy,
                throttle.max_calls,
                throttle.window()
            ),
            phase: self.engine.phase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::vault::fallback::test_cipher;
    use mockito::Matcher;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_context(dir: &TempDir, base_url: &str) -> AppContext {
        let mut config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        config.api.base_url = base_url.to_string();
        config.sync.detail_delay_ms = 0;
        config.vault.native = false;

        let vault = Vault::fallback_only(dir.path()).with_fallback(test_cipher());
        AppContext::with_vault(config, vault).unwrap()
    }

    #[test]
    fn test_fresh_context() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(&dir, "http://localhost:9");

        assert!(!ctx.has_credential());
        assert!(ctx.list_cached().unwrap().is_empty());
        assert_eq!(ctx.get_cached(1).unwrap(), None);

        let status = ctx.status().unwrap();
        assert_eq!(status.cached_articles, 0);
        assert!(!status.has_credential);
        assert_eq!(status.phase, SyncPhase::Idle);
        assert_eq!(status.vault_backend, "local encryption");
    }

    #[test]
    fn test_save_credential() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(&dir, "http://localhost:9");

        assert!(ctx.save_credential("  ").is_err());
        assert_eq!(ctx.save_credential(" key-1 ").unwrap(), VaultBackend::Fallback);
        assert!(ctx.has_credential());

        ctx.clear_credential().unwrap();
        assert!(!ctx.has_credential());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        config.throttle.max_calls = 0;

        let result = AppContext::with_vault(config, Vault::fallback_only(dir.path()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_sync_without_key_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let ctx = test_context(&dir, "http://localhost:9");

        let err = ctx.sync(&SearchFilter::new()).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(
            ctx.validate_credential().await.unwrap(),
            CredentialStatus::Missing
        );
    }

    #[tokio::test]
    async fn test_sync_over_http_caches_successful_details() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("POST", "/knowledgebase/search")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(json!([{"ID": 1, "Subject": "VPN"}, {"ID": 2}]).to_string())
            .create_async()
            .await;
        let detail_ok = server
            .mock("GET", "/knowledgebase/1")
            .with_status(200)
            .with_body(
                json!({
                    "ID": 1,
                    "Subject": "VPN",
                    "ModifiedDate": "2024-01-01T00:00:00Z",
                    "Body": "<p>hi</p>"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let detail_fail = server
            .mock("GET", Matcher::Exact("/knowledgebase/2".to_string()))
            .with_status(500)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let ctx = test_context(&dir, &server.url());
        ctx.save_credential("secret").unwrap();

        let report = ctx.sync(&SearchFilter::new()).await.unwrap();

        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.cached, vec![1]);
        assert_eq!(report.failures[0].id, 2);

        let cached = ctx.list_cached().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].title, "VPN");
        assert_eq!(
            ctx.get_cached(1).unwrap().unwrap().text_field("Body"),
            Some("<p>hi</p>")
        );

        search.assert_async().await;
        detail_ok.assert_async().await;
        detail_fail.assert_async().await;
    }
}

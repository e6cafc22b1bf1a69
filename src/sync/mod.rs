//! Synchronization orchestrator
//!
//! One cycle: search the catalog, fetch every returned article's full record
//! one at a time, then write all successful records to the cache in a single
//! batch. A failed detail fetch is recorded and skipped; a failed search ends
//! the cycle before anything is written.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::cache::CacheStore;
use crate::client::{Article, ArticleSummary, CatalogApi, SearchFilter};
use crate::error::{Error, Result};

/// Where the current cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    FetchingSummaries,
    /// `index` is 1-based
    FetchingDetails { index: usize, total: usize },
    /// Pushing edited records; `index` is 1-based
    Pushing { index: usize, total: usize },
    Failed,
}

/// A record that could not be fetched or pushed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub id: i64,
    pub reason: String,
}

/// Outcome of a completed sync cycle
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// The search result, in server order, whether or not each detail fetch succeeded
    pub summaries: Vec<ArticleSummary>,
    /// IDs written to the cache, in fetch order
    pub cached: Vec<i64>,
    pub failures: Vec<FetchFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a batch push
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    /// IDs accepted by the server and re-cached
    pub pushed: Vec<i64>,
    pub failures: Vec<FetchFailure>,
}

/// Clears the busy flag when the cycle ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives sync cycles and edit pushes against one catalog and one cache.
pub struct SyncEngine {
    api: Arc<dyn CatalogApi>,
    cache: Arc<CacheStore>,
    pace: Duration,
    busy: AtomicBool,
    phase: watch::Sender<SyncPhase>,
}

impl SyncEngine {
    /// `pace` is the minimum delay between consecutive remote calls in a cycle,
    /// applied on top of throttle admission.
    pub fn new(api: Arc<dyn CatalogApi>, cache: Arc<CacheStore>, pace: Duration) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self {
            api,
            cache,
            pace,
            busy: AtomicBool::new(false),
            phase,
        }
    }

    /// Observe phase changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }

    fn begin(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::SyncBusy);
        }
        Ok(BusyGuard(&self.busy))
    }

    /// Run a full cycle.
    pub async fn sync(&self, filter: &SearchFilter) -> Result<SyncReport> {
        self.sync_with_cancel(filter, &CancellationToken::new()).await
    }

    /// Run a full cycle, aborting without touching the cache if `cancel` fires.
    pub async fn sync_with_cancel(
        &self,
        filter: &SearchFilter,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let _busy = self.begin()?;
        let result = self.run_sync(filter, cancel).await;
        self.finish(&result);
        result
    }

    async fn run_sync(&self, filter: &SearchFilter, cancel: &CancellationToken) -> Result<SyncReport> {
        self.set_phase(SyncPhase::FetchingSummaries);
        let summaries = cancellable(cancel, self.api.search(filter)).await?;
        info!("Search returned {} articles", summaries.len());

        let total = summaries.len();
        let mut fetched: Vec<Article> = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (i, summary) in summaries.iter().enumerate() {
            if i > 0 {
                self.pause(cancel).await?;
            }
            self.set_phase(SyncPhase::FetchingDetails {
                index: i + 1,
                total,
            });

            match cancellable(cancel, self.api.fetch_detail(summary.id)).await {
                Ok(article) => fetched.push(article),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!("Skipping article {}: {}", summary.id, e);
                    failures.push(FetchFailure {
                        id: summary.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.cache.upsert_many(&fetched)?;
        let cached: Vec<i64> = fetched.iter().map(|a| a.id).collect();
        info!(
            "Cached {} of {} articles ({} failed)",
            cached.len(),
            total,
            failures.len()
        );

        Ok(SyncReport {
            summaries,
            cached,
            failures,
        })
    }

    /// Push edited records one at a time and re-cache the server's copies.
    pub async fn push_edits(&self, articles: &[Article]) -> Result<PushReport> {
        self.push_edits_with_cancel(articles, &CancellationToken::new())
            .await
    }

    pub async fn push_edits_with_cancel(
        &self,
        articles: &[Article],
        cancel: &CancellationToken,
    ) -> Result<PushReport> {
        let _busy = self.begin()?;
        let result = self.run_push(articles, cancel).await;
        self.finish(&result);
        result
    }

    async fn run_push(&self, articles: &[Article], cancel: &CancellationToken) -> Result<PushReport> {
        let total = articles.len();
        let mut confirmed: Vec<Article> = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (i, article) in articles.iter().enumerate() {
            if i > 0 {
                self.pause(cancel).await?;
            }
            self.set_phase(SyncPhase::Pushing {
                index: i + 1,
                total,
            });

            match cancellable(cancel, self.api.update_article(article)).await {
                Ok(updated) => confirmed.push(updated),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!("Failed to push article {}: {}", article.id, e);
                    failures.push(FetchFailure {
                        id: article.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.cache.upsert_many(&confirmed)?;
        Ok(PushReport {
            pushed: confirmed.iter().map(|a| a.id).collect(),
            failures,
        })
    }

    async fn pause(&self, cancel: &CancellationToken) -> Result<()> {
        if self.pace.is_zero() {
            return Ok(());
        }
        debug!("Pacing {:?} before next call", self.pace);
        cancellable(cancel, async {
            tokio::time::sleep(self.pace).await;
            Ok(())
        })
        .await
    }

    fn finish<T>(&self, result: &Result<T>) {
        match result {
            Ok(_) | Err(Error::Cancelled) => self.set_phase(SyncPhase::Idle),
            Err(e) => {
                warn!("Cycle failed: {}", e);
                self.set_phase(SyncPhase::Failed);
            }
        }
    }
}

/// Errors that end the cycle instead of being counted against one record:
/// cancellation, local storage failures, and credential problems.
fn is_fatal(err: &Error) -> bool {
    matches!(err, Error::Cancelled | Error::Vault(_) | Error::Cache(_)) || err.is_auth()
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCatalogClient;
    use crate::client::mock::MockFailure;
    use crate::error::ApiError;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::time::Instant;

    fn article(id: i64) -> Article {
        Article::new(id, format!("Article {}", id), format!("2024-01-0{}T00:00:00Z", id))
            .with_field("Body", json!(format!("body {}", id)))
    }

    struct Fixture {
        engine: SyncEngine,
        mock: Arc<MockCatalogClient>,
        cache: Arc<CacheStore>,
        _dir: TempDir,
    }

    fn fixture(mock: MockCatalogClient, pace: Duration) -> Fixture {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(CacheStore::open_at(dir.path()).unwrap());
        let mock = Arc::new(mock);
        let engine = SyncEngine::new(mock.clone(), cache.clone(), pace);
        Fixture {
            engine,
            mock,
            cache,
            _dir: dir,
        }
    }

    fn cached_ids(cache: &CacheStore) -> Vec<i64> {
        let mut ids: Vec<i64> = cache.list_summaries().unwrap().iter().map(|s| s.id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_one_failed_detail_is_isolated() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2), article(3)])
            .await
            .failing_detail(2, MockFailure::Network)
            .await;
        let f = fixture(mock, Duration::ZERO);

        let report = f.engine.sync(&SearchFilter::new()).await.unwrap();

        assert_eq!(report.summaries.len(), 3);
        assert_eq!(report.cached, vec![1, 3]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, 2);
        assert!(!report.is_complete());
        assert_eq!(cached_ids(&f.cache), vec![1, 3]);
        assert_eq!(f.cache.get_full(3).unwrap(), Some(article(3)));
        assert_eq!(f.engine.phase(), SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_transport_error_on_second_of_two() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2)])
            .await
            .failing_detail(2, MockFailure::Status(500))
            .await;
        let f = fixture(mock, Duration::ZERO);

        let report = f.engine.sync(&SearchFilter::new()).await.unwrap();

        let ids: Vec<i64> = report.summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(cached_ids(&f.cache), vec![1]);
    }

    #[tokio::test]
    async fn test_details_fetched_in_search_order() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(3), article(1), article(2)])
            .await;
        let f = fixture(mock, Duration::ZERO);

        f.engine.sync(&SearchFilter::new()).await.unwrap();

        assert_eq!(
            f.mock.calls().await,
            vec!["search", "detail:3", "detail:1", "detail:2"]
        );
    }

    #[tokio::test]
    async fn test_search_failure_leaves_cache_untouched() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1)])
            .await
            .failing_search(MockFailure::Status(503))
            .await;
        let f = fixture(mock, Duration::ZERO);
        f.cache.upsert(&article(7)).unwrap();

        let err = f.engine.sync(&SearchFilter::new()).await.unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::Status { code: 503, .. })));
        assert_eq!(cached_ids(&f.cache), vec![7]);
        assert_eq!(f.mock.calls().await, vec!["search"]);
        assert_eq!(f.engine.phase(), SyncPhase::Failed);
    }

    #[tokio::test]
    async fn test_rejected_key_aborts_cycle() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2), article(3)])
            .await
            .failing_detail(2, MockFailure::Unauthorized)
            .await;
        let f = fixture(mock, Duration::ZERO);

        let err = f.engine.sync(&SearchFilter::new()).await.unwrap_err();

        assert!(err.is_auth());
        assert_eq!(f.cache.count().unwrap(), 0);
        assert!(!f.mock.calls().await.contains(&"detail:3".to_string()));
    }

    #[tokio::test]
    async fn test_empty_search_is_a_successful_cycle() {
        let f = fixture(MockCatalogClient::new(), Duration::ZERO);

        let report = f.engine.sync(&SearchFilter::new()).await.unwrap();

        assert!(report.summaries.is_empty());
        assert!(report.is_complete());
        assert_eq!(f.cache.count().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_fetches_are_paced() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2), article(3)])
            .await;
        let f = fixture(mock, Duration::from_millis(1000));
        let start = Instant::now();

        f.engine.sync(&SearchFilter::new()).await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000), "took {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(3000), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_cycle_is_rejected_while_busy() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2)])
            .await;
        let f = fixture(mock, Duration::from_millis(1000));
        let filter = SearchFilter::new();

        let (first, second) = tokio::join!(f.engine.sync(&filter), async {
            tokio::task::yield_now().await;
            f.engine.sync(&filter).await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::SyncBusy)));
        assert!(!f.engine.is_busy());

        // The guard is released once the first cycle finishes
        assert!(f.engine.sync(&filter).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pacing_writes_nothing() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2), article(3)])
            .await;
        let f = fixture(mock, Duration::from_millis(1000));
        let cancel = CancellationToken::new();
        let filter = SearchFilter::new();

        let (result, _) = tokio::join!(
            f.engine.sync_with_cancel(&filter, &cancel),
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel();
            }
        );

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(f.cache.count().unwrap(), 0);
        assert_eq!(f.mock.calls().await, vec!["search", "detail:1"]);
        assert_eq!(f.engine.phase(), SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mock = MockCatalogClient::new().with_articles(vec![article(1)]).await;
        let f = fixture(mock, Duration::ZERO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = f.engine.sync_with_cancel(&SearchFilter::new(), &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(f.mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_phase_is_observable() {
        let mock = MockCatalogClient::new().with_articles(vec![article(1)]).await;
        let f = fixture(mock, Duration::ZERO);
        let mut rx = f.engine.subscribe();

        f.engine.sync(&SearchFilter::new()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SyncPhase::Idle);
    }

    #[tokio::test]
    async fn test_push_edits_recaches_server_copies() {
        let mock = MockCatalogClient::new()
            .with_articles(vec![article(1), article(2)])
            .await
            .failing_detail(2, MockFailure::Status(409))
            .await;
        let f = fixture(mock, Duration::ZERO);

        let mut edited = article(1);
        edited.set_tags(vec!["vpn".to_string()]);
        let report = f
            .engine
            .push_edits(&[edited, article(2)])
            .await
            .unwrap();

        assert_eq!(report.pushed, vec![1]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, 2);

        let cached = f.cache.get_full(1).unwrap().unwrap();
        assert_eq!(cached.tags(), vec!["vpn"]);
        assert_eq!(cached.modified_date, "2030-01-01T00:00:00Z");
        assert_eq!(f.cache.get_full(2).unwrap(), None);
        assert_eq!(f.mock.calls().await, vec!["update:1", "update:2"]);
    }
}

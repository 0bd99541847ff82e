//! The aggregation loop.
//!
//! Each tick picks the one feed that has waited longest, marks it fetched,
//! fetches it and stores its new items. Ticks never overlap and errors from
//! a tick are logged and dropped so one broken feed cannot stop the loop.

use std::future::Future;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{FeedStore, PostStore};
use crate::error::{GatorError, Result};
use crate::rss::fetcher::FeedFetcher;
use crate::rss::ingest::{ingest_items, IngestStats};

/// Outcome of a tick that found a feed to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub feed_id: Uuid,
    pub feed_name: String,
    /// Items in the fetched document.
    pub items: usize,
    pub stats: IngestStats,
}

/// Polls feeds one at a time.
pub struct Aggregator<S, F> {
    store: S,
    fetcher: F,
}

impl<S, F> Aggregator<S, F>
where
    S: FeedStore + PostStore,
    F: FeedFetcher,
{
    pub fn new(store: S, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    /// Run one polling cycle.
    ///
    /// Returns `Ok(None)` when there are no feeds. The feed is marked
    /// fetched before the request goes out, so a feed that always fails is
    /// retried at most once per tick interval.
    pub async fn tick(&self) -> Result<Option<TickReport>> {
        let Some(feed) = self.store.next_feed_to_fetch().await? else {
            info!("No feeds to fetch");
            return Ok(None);
        };

        self.store.mark_fetched(feed.id, Utc::now()).await?;
        debug!("Fetching feed {} ({})", feed.name, feed.url);

        let document = self.fetcher.fetch(&feed.url).await?;
        let stats = ingest_items(&self.store, feed.id, &document.items).await?;

        info!(
            "Feed {}: {} item(s), {} new post(s)",
            feed.name,
            document.items.len(),
            stats.inserted
        );

        Ok(Some(TickReport {
            feed_id: feed.id,
            feed_name: feed.name,
            items: document.items.len(),
            stats,
        }))
    }

    /// Tick every `period` until `shutdown` completes.
    ///
    /// The first tick runs immediately. `shutdown` is only observed between
    /// ticks; a tick in progress always finishes. A tick that overruns the
    /// period delays the next one.
    pub async fn run<C>(&self, period: Duration, shutdown: C) -> Result<()>
    where
        C: Future<Output = ()>,
    {
        if period.is_zero() {
            return Err(GatorError::Validation(
                "polling interval must be greater than zero".to_string(),
            ));
        }

        info!("Collecting feeds every {:?}", period);

        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Aggregator stopping");
                    return Ok(());
                }
                _ = timer.tick() => {}
            }

            if let Err(e) = self.tick().await {
                warn!("Tick failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserStore;
    use crate::rss::types::{NewFeed, RssDocument, RssItem};
    use crate::rss::PostRepository;
    use crate::Database;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned documents by URL; unknown URLs fail like a dead host.
    #[derive(Default)]
    struct StubFetcher {
        documents: Mutex<HashMap<String, RssDocument>>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn with(url: &str, document: RssDocument) -> Self {
            let stub = Self::default();
            stub.documents
                .lock()
                .unwrap()
                .insert(url.to_string(), document);
            stub
        }
    }

    impl FeedFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<RssDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.documents
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| GatorError::Network(format!("connection refused: {url}")))
        }
    }

    fn hello_document() -> RssDocument {
        RssDocument {
            items: vec![RssItem::new(
                "Hello",
                "https://example.test/1",
                "",
                "Mon, 02 Jan 2006 15:04:05 -0700",
            )],
            ..Default::default()
        }
    }

    async fn setup_db_with_feed(url: &str) -> (Database, Uuid) {
        let db = Database::open_in_memory().await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed(&NewFeed::new("Example", url, user.id))
            .await
            .unwrap();
        (db, feed.id)
    }

    #[tokio::test]
    async fn test_tick_without_feeds() {
        let db = Database::open_in_memory().await.unwrap();
        let aggregator = Aggregator::new(db, StubFetcher::default());

        assert!(aggregator.tick().await.unwrap().is_none());
        assert_eq!(aggregator.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_ingests_and_second_tick_adds_nothing() {
        let url = "https://example.test/rss";
        let (db, feed_id) = setup_db_with_feed(url).await;
        let aggregator = Aggregator::new(db.clone(), StubFetcher::with(url, hello_document()));

        let report = aggregator.tick().await.unwrap().unwrap();
        assert_eq!(report.feed_id, feed_id);
        assert_eq!(report.stats.inserted, 1);

        let feed = db.get_feed_by_url(url).await.unwrap();
        assert!(feed.last_fetched_at.is_some());

        let posts = PostRepository::new(db.pool())
            .list_by_feed(feed_id)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hello");
        assert!(posts[0].description.is_none());
        assert_eq!(
            posts[0].published_at,
            Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap()
        );

        let report = aggregator.tick().await.unwrap().unwrap();
        assert_eq!(report.stats.inserted, 0);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(
            PostRepository::new(db.pool())
                .list_by_feed(feed_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_still_marks_fetched() {
        let url = "https://down.test/rss";
        let (db, feed_id) = setup_db_with_feed(url).await;
        let aggregator = Aggregator::new(db.clone(), StubFetcher::default());

        let result = aggregator.tick().await;
        assert!(matches!(result, Err(GatorError::Network(_))));

        let feed = db.get_feed_by_url(url).await.unwrap();
        assert!(feed.last_fetched_at.is_some());
        assert!(PostRepository::new(db.pool())
            .list_by_feed(feed_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_ticks_rotate_through_feeds() {
        let db = Database::open_in_memory().await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let urls = ["https://a.test/rss", "https://b.test/rss", "https://c.test/rss"];
        for (i, url) in urls.iter().enumerate() {
            db.create_feed(&NewFeed::new(format!("Feed {i}"), *url, user.id))
                .await
                .unwrap();
        }

        let fetcher = StubFetcher::default();
        for url in urls {
            fetcher
                .documents
                .lock()
                .unwrap()
                .insert(url.to_string(), RssDocument::default());
        }
        let aggregator = Aggregator::new(db, fetcher);

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(aggregator.tick().await.unwrap().unwrap().feed_name);
        }
        assert_eq!(seen, vec!["Feed 0", "Feed 1", "Feed 2", "Feed 0"]);
    }

    #[tokio::test]
    async fn test_run_rejects_zero_interval() {
        let db = Database::open_in_memory().await.unwrap();
        let aggregator = Aggregator::new(db, StubFetcher::default());

        let result = aggregator
            .run(Duration::ZERO, std::future::pending::<()>())
            .await;
        assert!(matches!(result, Err(GatorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_run_stops_before_first_tick_when_already_cancelled() {
        let url = "https://example.test/rss";
        let (db, _) = setup_db_with_feed(url).await;
        let aggregator = Aggregator::new(db, StubFetcher::with(url, hello_document()));

        aggregator
            .run(Duration::from_secs(60), std::future::ready(()))
            .await
            .unwrap();
        assert_eq!(aggregator.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_ticks_until_shutdown() {
        let url = "https://example.test/rss";
        let (db, feed_id) = setup_db_with_feed(url).await;
        let aggregator = Aggregator::new(db.clone(), StubFetcher::with(url, hello_document()));

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let shutdown = async {
            let _ = rx.await;
        };
        let stopper = async {
            // Let the immediate first tick and a few more run
            tokio::time::sleep(Duration::from_millis(120)).await;
            let _ = tx.send(());
        };

        let (result, _) = tokio::join!(aggregator.run(Duration::from_millis(20), shutdown), stopper);
        result.unwrap();

        assert!(aggregator.fetcher.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(
            PostRepository::new(db.pool())
                .list_by_feed(feed_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_run_survives_failing_feed() {
        let db = Database::open_in_memory().await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        db.create_feed(&NewFeed::new("Broken", "https://down.test/rss", user.id))
            .await
            .unwrap();
        let good = db
            .create_feed(&NewFeed::new("Good", "https://example.test/rss", user.id))
            .await
            .unwrap();

        let aggregator = Aggregator::new(
            db.clone(),
            StubFetcher::with("https://example.test/rss", hello_document()),
        );

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        aggregator
            .run(Duration::from_millis(10), shutdown)
            .await
            .unwrap();

        assert_eq!(
            PostRepository::new(db.pool())
                .list_by_feed(good.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}

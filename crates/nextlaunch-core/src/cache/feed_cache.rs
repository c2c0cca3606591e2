use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::feed::{parse_timeline, FeedError, FeedSource, HttpFeedSource};
use crate::models::LaunchEvent;
use crate::utils::age_display;

/// Minimum spacing between real fetch attempts.
/// Protects the upstream calendar host regardless of selector cadence.
pub const MIN_TIME_BETWEEN_UPDATES: Duration = Duration::from_secs(15 * 60);

/// True when enough time has passed since `last_attempt` to fetch again.
pub fn throttle_elapsed(last_attempt: Option<Instant>, now: Instant, min_interval: Duration) -> bool {
    match last_attempt {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= min_interval,
    }
}

#[derive(Debug, Clone)]
struct Published {
    events: Arc<Vec<LaunchEvent>>,
    fetched_at: DateTime<Utc>,
}

/// Shared view of the remote feed. One per process, referenced by every selector.
pub struct FeedCache {
    url: String,
    source: Arc<dyn FeedSource>,
    min_interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
    timeline: RwLock<Option<Published>>,
}

impl FeedCache {
    /// Cache backed by the HTTP source.
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        Ok(Self::with_source(url, Arc::new(HttpFeedSource::new()?)))
    }

    pub fn with_source(url: impl Into<String>, source: Arc<dyn FeedSource>) -> Self {
        Self {
            url: url.into(),
            source,
            min_interval: MIN_TIME_BETWEEN_UPDATES,
            last_attempt: Mutex::new(None),
            timeline: RwLock::new(None),
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the feed unless the throttle window is still open.
    ///
    /// The throttle lock is held until the new timeline is published, so
    /// callers arriving during a fetch wait for it and then read its result.
    ///
    /// Never fails: transport and parse errors are logged and the current
    /// timeline is kept as is.
    pub async fn refresh(&self) {
        let mut last_attempt = self.last_attempt.lock().await;
        let now = Instant::now();
        if !throttle_elapsed(*last_attempt, now, self.min_interval) {
            debug!(url = %self.url, "Feed refresh throttled");
            return;
        }
        *last_attempt = Some(now);

        debug!(url = %self.url, "Get the latest data from the feed");

        let events = match self.fetch_and_parse().await {
            Ok(events) => events,
            Err(e) if e.is_transport() => {
                error!(url = %self.url, error = %e, "Unable to get calendar feed");
                return;
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Unable to parse calendar feed");
                return;
            }
        };

        let count = events.len();
        let mut timeline = self.timeline.write().await;
        if let Some(previous) = timeline.as_ref() {
            debug!(age = %age_display(previous.fetched_at, Utc::now()), "Replacing cached timeline");
        }
        *timeline = Some(Published {
            events: Arc::new(events),
            fetched_at: Utc::now(),
        });
        info!(url = %self.url, events = count, "Calendar feed updated");
    }

    /// The last successfully parsed timeline, or `None` before the first success.
    pub async fn timeline(&self) -> Option<Arc<Vec<LaunchEvent>>> {
        self.timeline.read().await.as_ref().map(|p| Arc::clone(&p.events))
    }

    /// Wall-clock time of the last successful refresh.
    pub async fn last_success(&self) -> Option<DateTime<Utc>> {
        self.timeline.read().await.as_ref().map(|p| p.fetched_at)
    }

    async fn fetch_and_parse(&self) -> Result<Vec<LaunchEvent>, FeedError> {
        let body = self.source.fetch(&self.url).await?;
        parse_timeline(&body)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::StatusCode;

    const URL: &str = "https://example.test/0.ics";

    /// Replays canned responses and counts fetches.
    pub(crate) struct ScriptedSource {
        responses: std::sync::Mutex<VecDeque<Result<String, FeedError>>>,
        fetches: AtomicUsize,
        latency: Duration,
    }

    impl ScriptedSource {
        pub(crate) fn new(responses: Vec<Result<String, FeedError>>) -> Arc<Self> {
            Self::with_latency(responses, Duration::ZERO)
        }

        /// Each fetch sleeps for `latency` before answering.
        pub(crate) fn with_latency(
            responses: Vec<Result<String, FeedError>>,
            latency: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses.into()),
                fetches: AtomicUsize::new(0),
                latency,
            })
        }

        pub(crate) fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        async fn fetch(&self, url: &str) -> Result<String, FeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(FeedError::from_status(StatusCode::NOT_FOUND, url)))
        }
    }

    pub(crate) fn ics(events: &[(&str, &str)]) -> String {
        let mut doc = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//EN\r\n");
        for (summary, dtstart) in events {
            doc.push_str(&format!(
                "BEGIN:VEVENT\r\nDTSTART:{}\r\nSUMMARY:{}\r\nEND:VEVENT\r\n",
                dtstart, summary
            ));
        }
        doc.push_str("END:VCALENDAR\r\n");
        doc
    }

    async fn refresh_and_read(cache: &FeedCache) -> Option<Arc<Vec<LaunchEvent>>> {
        cache.refresh().await;
        cache.timeline().await
    }

    fn names(timeline: &[LaunchEvent]) -> Vec<&str> {
        timeline.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_throttle_elapsed() {
        let now = Instant::now();
        let window = Duration::from_secs(900);
        assert!(throttle_elapsed(None, now, window));
        assert!(!throttle_elapsed(Some(now), now, window));
        assert!(!throttle_elapsed(Some(now), now + Duration::from_secs(899), window));
        assert!(throttle_elapsed(Some(now), now + window, window));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeline_empty_before_first_refresh() {
        let source = ScriptedSource::new(vec![]);
        let cache = FeedCache::with_source(URL, source.clone());
        assert!(cache.timeline().await.is_none());
        assert!(cache.last_success().await.is_none());
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_publishes_timeline() {
        let source = ScriptedSource::new(vec![Ok(ics(&[("Falcon 9", "20300101T000000Z")]))]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;

        let timeline = cache.timeline().await.expect("timeline");
        assert_eq!(names(&timeline), vec!["Falcon 9"]);
        assert!(cache.last_success().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_within_window_is_noop() {
        let source = ScriptedSource::new(vec![
            Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
            Ok(ics(&[("Electron", "20300102T000000Z")])),
        ]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;
        let first = cache.timeline().await.expect("timeline");

        tokio::time::advance(Duration::from_secs(14 * 60)).await;
        cache.refresh().await;

        assert_eq!(source.fetches(), 1);
        let second = cache.timeline().await.expect("timeline");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_window_replaces_timeline() {
        let source = ScriptedSource::new(vec![
            Ok(ics(&[("Falcon 9", "20300101T000000Z"), ("Soyuz", "20300103T000000Z")])),
            Ok(ics(&[("Electron", "20300102T000000Z")])),
        ]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;
        tokio::time::advance(MIN_TIME_BETWEEN_UPDATES).await;
        cache.refresh().await;

        assert_eq!(source.fetches(), 2);
        let timeline = cache.timeline().await.expect("timeline");
        assert_eq!(names(&timeline), vec!["Electron"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_status_keeps_timeline() {
        let source = ScriptedSource::new(vec![
            Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
            Err(FeedError::from_status(StatusCode::SERVICE_UNAVAILABLE, URL)),
        ]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;
        let before = cache.timeline().await.expect("timeline");

        tokio::time::advance(MIN_TIME_BETWEEN_UPDATES).await;
        cache.refresh().await;

        assert_eq!(source.fetches(), 2);
        let after = cache.timeline().await.expect("timeline");
        assert_eq!(*before, *after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_failure_keeps_timeline() {
        let source = ScriptedSource::new(vec![
            Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
            Ok("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:soon\r\nSUMMARY:Bad date\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n".to_string()),
            Ok(format!("{}{}", ics(&[]), ics(&[]))),
        ]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;
        let before = cache.timeline().await.expect("timeline");

        // Malformed event
        tokio::time::advance(MIN_TIME_BETWEEN_UPDATES).await;
        cache.refresh().await;
        assert_eq!(*cache.timeline().await.expect("timeline"), *before);

        // Unsupported document feature
        tokio::time::advance(MIN_TIME_BETWEEN_UPDATES).await;
        cache.refresh().await;
        assert_eq!(*cache.timeline().await.expect("timeline"), *before);

        assert_eq!(source.fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempt_still_throttles() {
        let source = ScriptedSource::new(vec![
            Err(FeedError::from_status(StatusCode::BAD_GATEWAY, URL)),
            Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
        ]);
        let cache = FeedCache::with_source(URL, source.clone());

        cache.refresh().await;
        cache.refresh().await;
        assert_eq!(source.fetches(), 1);
        assert!(cache.timeline().await.is_none());

        tokio::time::advance(MIN_TIME_BETWEEN_UPDATES).await;
        cache.refresh().await;
        assert_eq!(source.fetches(), 2);
        assert!(cache.timeline().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refresh_fetches_once() {
        let source = ScriptedSource::with_latency(
            vec![
                Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
                Ok(ics(&[("Electron", "20300102T000000Z")])),
            ],
            Duration::from_millis(200),
        );
        let cache = Arc::new(FeedCache::with_source(URL, source.clone()));

        let (a, b, c) = tokio::join!(
            refresh_and_read(&cache),
            refresh_and_read(&cache),
            refresh_and_read(&cache)
        );

        assert_eq!(source.fetches(), 1);
        for seen in [a, b, c] {
            let timeline = seen.expect("every caller sees the fetched timeline");
            assert_eq!(names(&timeline), vec!["Falcon 9"]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_min_interval() {
        let source = ScriptedSource::new(vec![
            Ok(ics(&[("Falcon 9", "20300101T000000Z")])),
            Ok(ics(&[("Electron", "20300102T000000Z")])),
        ]);
        let cache = FeedCache::with_source(URL, source.clone())
            .with_min_interval(Duration::from_secs(60));

        cache.refresh().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.refresh().await;

        assert_eq!(source.fetches(), 2);
        assert_eq!(cache.url(), URL);
    }
}

//! Window Scheduler
//!
//! Drives one replication cycle per tick. Cycles run strictly one after
//! another on a single task. When a cycle overruns the tick period the missed
//! ticks are dropped (`MissedTickBehavior::Skip`); the following window then
//! starts at the cursor and covers the whole overrun, so nothing is skipped
//! or queried twice.
//!
//! The cursor moves to the end of each window whatever the cycle outcome, so
//! the interval of a failed cycle is not retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bridge_core::{BridgeError, Clock, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::forwarder::{ForwardReport, WriteForwarder};
use crate::metrics::ReplicatorMetrics;
use crate::reader::{ReadQuery, RemoteReadClient};
use crate::selector::Selector;
use crate::window::{Window, WindowCursor};

/// What happened during one cycle, published for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub window: Window,
    pub succeeded: bool,
    pub groups: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub series: usize,
    pub samples: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub error_code: Option<&'static str>,
    pub completed_at: DateTime<Utc>,
}

impl CycleSummary {
    fn new(window: Window, outcome: &Result<ForwardReport>, duration: Duration) -> Self {
        let (report, error) = match outcome {
            Ok(report) => (report.clone(), report.first_error().cloned()),
            Err(e) => (ForwardReport::default(), Some(e.clone())),
        };

        Self {
            window,
            succeeded: error.is_none(),
            groups: report.groups,
            batches_sent: report.batches_sent,
            batches_failed: report.batches_failed,
            series: report.series,
            samples: report.samples,
            duration_ms: duration.as_millis() as u64,
            error_code: error.as_ref().map(BridgeError::error_code),
            error: error.map(|e| e.to_string()),
            completed_at: Utc::now(),
        }
    }
}

pub type LastCycle = Arc<RwLock<Option<CycleSummary>>>;

pub struct Scheduler {
    selector: Selector,
    reader: RemoteReadClient,
    forwarder: WriteForwarder,
    clock: Arc<dyn Clock>,
    cursor: WindowCursor,
    period: Duration,
    metrics: ReplicatorMetrics,
    last_cycle: LastCycle,
}

impl Scheduler {
    /// The cursor starts at the clock's current time
    pub fn new(
        selector: Selector,
        reader: RemoteReadClient,
        forwarder: WriteForwarder,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        let cursor = WindowCursor::new(clock.now_millis());
        let metrics = ReplicatorMetrics::new();
        metrics.cursor_ms.set(cursor.position_ms().max(0) as u64);

        Self {
            selector,
            reader,
            forwarder,
            clock,
            cursor,
            period,
            metrics,
            last_cycle: Arc::new(RwLock::new(None)),
        }
    }

    pub fn cursor(&self) -> WindowCursor {
        self.cursor
    }

    pub fn metrics(&self) -> ReplicatorMetrics {
        self.metrics.clone()
    }

    pub fn last_cycle(&self) -> LastCycle {
        self.last_cycle.clone()
    }

    /// Tick forever; the first window ends one period after start
    pub async fn run(&mut self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval() completes its first tick immediately
        ticker.tick().await;

        info!(
            selector = %self.selector,
            period_ms = self.period.as_millis() as u64,
            cursor_ms = self.cursor.position_ms(),
            "Replication scheduler started"
        );

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Run a single cycle for the window ending now
    pub async fn tick(&mut self) -> Option<CycleSummary> {
        let now_ms = self.clock.now_millis();

        let Some(window) = self.cursor.next_window(now_ms) else {
            self.metrics.cycles_skipped.inc();
            debug!(
                cursor_ms = self.cursor.position_ms(),
                now_ms, "Clock has not passed the cursor, skipping tick"
            );
            return None;
        };

        let started = Instant::now();
        let outcome = self.replicate(window).await;
        let elapsed = started.elapsed();

        self.cursor.advance(window);

        let summary = CycleSummary::new(window, &outcome, elapsed);
        self.record(&summary, &outcome);
        *self.last_cycle.write() = Some(summary.clone());

        Some(summary)
    }

    async fn replicate(&self, window: Window) -> Result<ForwardReport> {
        let query = ReadQuery::new(window, &self.selector);
        let result = self.reader.read(&query).await?;
        Ok(self.forwarder.forward(result).await)
    }

    fn record(&self, summary: &CycleSummary, outcome: &Result<ForwardReport>) {
        let m = &self.metrics;
        m.cycles_total.inc();
        m.cursor_ms.set(self.cursor.position_ms().max(0) as u64);
        m.cycle_duration_ms.record(summary.duration_ms as f64);
        m.write_batches_total
            .add((summary.batches_sent + summary.batches_failed) as u64);
        m.write_batches_failed.add(summary.batches_failed as u64);
        m.series_forwarded.add(summary.series as u64);
        m.samples_forwarded.add(summary.samples as u64);

        if !summary.succeeded {
            m.cycles_failed.inc();
        }

        match outcome {
            Ok(report) if report.is_success() => info!(
                window = %summary.window,
                groups = summary.groups,
                series = summary.series,
                samples = summary.samples,
                duration_ms = summary.duration_ms,
                "Replication cycle complete"
            ),
            Ok(report) => warn!(
                window = %summary.window,
                groups = summary.groups,
                batches_failed = report.batches_failed,
                duration_ms = summary.duration_ms,
                "Replication cycle completed with failed writes"
            ),
            Err(e) => error!(
                window = %summary.window,
                error = %e,
                code = e.error_code(),
                retryable = e.is_retryable(),
                duration_ms = summary.duration_ms,
                "Replication cycle failed, window dropped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{sample_series, MockRemote};
    use axum::http::StatusCode;
    use bridge_core::{MockClock, SystemClock};
    use bridge_proto::QueryResult;

    fn scheduler(remote: &MockRemote, clock: Arc<MockClock>) -> Scheduler {
        let client = crate::client::build_client(Duration::from_secs(1)).unwrap();
        let timeout = Duration::from_secs(5);
        Scheduler::new(
            Selector::compile(r#"{__name__="up"}"#).unwrap(),
            RemoteReadClient::new(client.clone(), remote.read_url(), timeout),
            WriteForwarder::new(client, remote.write_url(), timeout),
            clock,
            Duration::from_secs(3),
        )
    }

    #[tokio::test]
    async fn test_cursor_starts_at_clock_time() {
        let remote = MockRemote::start().await;
        let clock = Arc::new(MockClock::from_millis(1_000));

        let s = scheduler(&remote, clock);

        assert_eq!(s.cursor().position_ms(), 1_000);
        assert_eq!(s.metrics().cursor_ms.get(), 1_000);
    }

    #[tokio::test]
    async fn test_consecutive_cycles_tile_the_timeline() {
        let remote = MockRemote::start().await;
        let clock = Arc::new(MockClock::from_millis(1_000));
        let mut s = scheduler(&remote, clock.clone());

        for step in [3_000, 3_000, 4_500, 1] {
            clock.advance_millis(step);
            s.tick().await.unwrap();
        }

        let bounds: Vec<(i64, i64)> = remote
            .reads()
            .iter()
            .map(|r| (r.queries[0].start_timestamp_ms, r.queries[0].end_timestamp_ms))
            .collect();
        assert_eq!(
            bounds,
            vec![(1_000, 4_000), (4_000, 7_000), (7_000, 11_500), (11_500, 11_501)]
        );
        for (start, end) in &bounds {
            assert!(end > start);
        }
        assert_eq!(s.cursor().position_ms(), 11_501);
    }

    #[tokio::test]
    async fn test_failed_read_still_advances_cursor() {
        let remote = MockRemote::start().await;
        remote.set_read_status(StatusCode::INTERNAL_SERVER_ERROR);
        let clock = Arc::new(MockClock::from_millis(1_000));
        let mut s = scheduler(&remote, clock.clone());

        clock.advance_millis(3_000);
        let summary = s.tick().await.unwrap();

        assert!(!summary.succeeded);
        assert_eq!(summary.error_code, Some("PROTOCOL_ERROR"));
        assert_eq!(s.cursor().position_ms(), 4_000);
        assert!(remote.writes().is_empty());

        // The next cycle continues from the dropped window's end
        remote.set_read_status(StatusCode::OK);
        clock.advance_millis(3_000);
        let summary = s.tick().await.unwrap();

        assert!(summary.succeeded);
        assert_eq!(summary.window, Window::new(4_000, 7_000).unwrap());

        let metrics = s.metrics();
        assert_eq!(metrics.cycles_total.get(), 2);
        assert_eq!(metrics.cycles_failed.get(), 1);
    }

    #[tokio::test]
    async fn test_tick_without_clock_progress_is_skipped() {
        let remote = MockRemote::start().await;
        let clock = Arc::new(MockClock::from_millis(1_000));
        let mut s = scheduler(&remote, clock.clone());

        assert!(s.tick().await.is_none());
        clock.advance_millis(-10);
        assert!(s.tick().await.is_none());

        assert_eq!(s.cursor().position_ms(), 1_000);
        assert!(remote.reads().is_empty());
        assert_eq!(s.metrics().cycles_skipped.get(), 2);
        assert_eq!(s.metrics().cycles_total.get(), 0);
    }

    #[tokio::test]
    async fn test_summary_is_published_with_counts() {
        let remote = MockRemote::start().await;
        remote.set_read_response(vec![
            QueryResult {
                timeseries: vec![sample_series("up", 4)],
            },
            QueryResult {
                timeseries: vec![sample_series("up", 1), sample_series("up", 1)],
            },
        ]);
        let clock = Arc::new(MockClock::from_millis(0));
        let mut s = scheduler(&remote, clock.clone());
        let published = s.last_cycle();

        clock.advance_millis(3_000);
        s.tick().await.unwrap();

        let summary = published.read().clone().unwrap();
        assert!(summary.succeeded);
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.batches_sent, 2);
        assert_eq!(summary.series, 3);
        assert_eq!(summary.samples, 6);
        assert_eq!(s.metrics().series_forwarded.get(), 3);
        assert_eq!(s.metrics().cursor_ms.get(), 3_000);
    }

    #[tokio::test]
    async fn test_run_loop_drops_missed_ticks_and_keeps_tiling() {
        let remote = MockRemote::start().await;
        // Every cycle overruns the period
        remote.set_read_delay(Duration::from_millis(120));

        let client = crate::client::build_client(Duration::from_secs(1)).unwrap();
        let timeout = Duration::from_secs(5);
        let period = Duration::from_millis(50);
        let mut s = Scheduler::new(
            Selector::compile("up").unwrap(),
            RemoteReadClient::new(client.clone(), remote.read_url(), timeout),
            WriteForwarder::new(client, remote.write_url(), timeout),
            Arc::new(SystemClock),
            period,
        );
        let origin = s.cursor().position_ms();
        let elapsed = Duration::from_millis(800);

        let _ = tokio::time::timeout(elapsed, s.run()).await;

        let bounds: Vec<(i64, i64)> = remote
            .reads()
            .iter()
            .map(|r| (r.queries[0].start_timestamp_ms, r.queries[0].end_timestamp_ms))
            .collect();

        assert!(bounds.len() >= 2, "{bounds:?}");
        assert!(
            bounds.len() < (elapsed.as_millis() / period.as_millis()) as usize,
            "missed ticks were replayed: {bounds:?}"
        );

        // No cycle for the interval's immediate first tick
        assert_eq!(bounds[0].0, origin);
        assert!(bounds[0].1 - bounds[0].0 >= 40, "{bounds:?}");

        for pair in bounds.windows(2) {
            assert_eq!(pair[1].0, pair[0].1, "{bounds:?}");
        }
        for (start, end) in &bounds {
            assert!(end > start);
        }
    }
}

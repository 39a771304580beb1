//! Buffered alert dispatch, decoupled from evaluation.
//!
//! Evaluation submits alerts into a bounded queue; a dispatcher task
//! drains it, retrying each delivery against a budget. A slow or failing
//! sink backpressures the queue instead of losing alerts, and anything
//! still queued at shutdown is delivered by `close()` before it returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use fleetalert_core::AlertEvent;

use crate::traits::{AlertSink, SinkError};

/// Delivery counters returned when the dispatcher drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    /// Alerts whose retry budget was exhausted.
    pub failed: u64,
}

/// Cloneable submission handle for concurrent evaluation workers.
#[derive(Clone)]
pub struct AlertSubmitter {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertSubmitter {
    /// Queue one alert for delivery. Waits when the queue is full.
    pub async fn submit(&self, alert: AlertEvent) -> Result<(), SinkError> {
        self.tx.send(alert).await.map_err(|_| SinkError::Closed)
    }
}

/// Owns the dispatch task and the sending side of the queue.
pub struct SinkDispatcher {
    tx: mpsc::Sender<AlertEvent>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<DispatchStats>,
}

impl SinkDispatcher {
    /// Spawn the dispatch task over `sink`.
    ///
    /// `retry_budget` is the total attempts per alert (minimum 1);
    /// `backoff` is the pause between attempts.
    pub fn spawn(
        sink: Arc<dyn AlertSink>,
        queue_capacity: usize,
        retry_budget: u32,
        backoff: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<AlertEvent>(queue_capacity.max(1));
        let (shutdown, shutdown_rx) = oneshot::channel();
        let budget = retry_budget.max(1);

        let task = tokio::spawn(run_dispatch(sink, rx, shutdown_rx, budget, backoff));

        Self { tx, shutdown, task }
    }

    /// Queue one alert for delivery. Waits when the queue is full.
    pub async fn submit(&self, alert: AlertEvent) -> Result<(), SinkError> {
        self.tx.send(alert).await.map_err(|_| SinkError::Closed)
    }

    /// Extra submission handle for a concurrent worker.
    pub fn submitter(&self) -> AlertSubmitter {
        AlertSubmitter {
            tx: self.tx.clone(),
        }
    }

    /// Stop accepting alerts, flush everything queued, and return the
    /// delivery counters. Outstanding [`AlertSubmitter`] handles get
    /// [`SinkError::Closed`] from then on.
    pub async fn close(self) -> DispatchStats {
        let _ = self.shutdown.send(());
        drop(self.tx);
        self.task.await.unwrap_or_default()
    }
}

async fn run_dispatch(
    sink: Arc<dyn AlertSink>,
    mut rx: mpsc::Receiver<AlertEvent>,
    mut shutdown: oneshot::Receiver<()>,
    budget: u32,
    backoff: Duration,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    let mut draining = false;

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(alert) => deliver_with_retries(&*sink, &alert, budget, backoff, &mut stats).await,
                None => break,
            },
            _ = &mut shutdown, if !draining => {
                // Reject new submissions but keep draining what's queued.
                draining = true;
                rx.close();
            }
        }
    }

    stats
}

async fn deliver_with_retries(
    sink: &dyn AlertSink,
    alert: &AlertEvent,
    budget: u32,
    backoff: Duration,
    stats: &mut DispatchStats,
) {
    let mut attempt = 1;
    loop {
        match sink.deliver(alert).await {
            Ok(()) => {
                stats.delivered += 1;
                return;
            }
            Err(e) if attempt < budget => {
                warn!(
                    sink = sink.sink_name(),
                    device_id = %alert.device_id,
                    rule = %alert.rule_name,
                    attempt,
                    error = %e,
                    "alert delivery failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                error!(
                    sink = sink.sink_name(),
                    device_id = %alert.device_id,
                    rule = %alert.rule_name,
                    attempts = budget,
                    error = %e,
                    "alert delivery failed, retry budget exhausted"
                );
                stats.failed += 1;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use fleetalert_core::{OperatingState, Severity};

    fn sample_alert(device: &str) -> AlertEvent {
        AlertEvent {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap(),
            device_id: device.to_string(),
            state: OperatingState::Run,
            severity: Severity::Critical,
            score: 0.2,
            confidence: 1.0,
            root_cause: "Repeated anomalies".to_string(),
            route: "operations".to_string(),
            rule_name: "burst_rule".to_string(),
            tag: String::new(),
            families: Vec::new(),
            top_features: Vec::new(),
        }
    }

    /// Fails the first `fail_first` deliveries, then succeeds.
    struct FlakySink {
        fail_first: usize,
        attempts: AtomicUsize,
        delivered: Mutex<Vec<String>>,
    }

    impl FlakySink {
        fn new(fail_first: usize) -> Self {
            Self {
                fail_first,
                attempts: AtomicUsize::new(0),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl AlertSink for FlakySink {
        async fn deliver(&self, alert: &AlertEvent) -> Result<(), SinkError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(SinkError::Delivery("mock failure".to_string()));
            }
            self.delivered.lock().await.push(alert.device_id.clone());
            Ok(())
        }

        fn sink_name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn delivers_queued_alerts_in_order() {
        let sink = Arc::new(FlakySink::new(0));
        let dispatcher =
            SinkDispatcher::spawn(sink.clone(), 16, 1, Duration::from_millis(1));

        dispatcher.submit(sample_alert("DEV-001")).await.unwrap();
        dispatcher.submit(sample_alert("DEV-002")).await.unwrap();
        let stats = dispatcher.close().await;

        assert_eq!(stats, DispatchStats { delivered: 2, failed: 0 });
        assert_eq!(*sink.delivered.lock().await, vec!["DEV-001", "DEV-002"]);
    }

    #[tokio::test]
    async fn retries_within_budget() {
        let sink = Arc::new(FlakySink::new(2));
        let dispatcher =
            SinkDispatcher::spawn(sink.clone(), 16, 3, Duration::from_millis(1));

        dispatcher.submit(sample_alert("DEV-001")).await.unwrap();
        let stats = dispatcher.close().await;

        assert_eq!(stats, DispatchStats { delivered: 1, failed: 0 });
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_counts_failure() {
        let sink = Arc::new(FlakySink::new(2));
        let dispatcher =
            SinkDispatcher::spawn(sink.clone(), 16, 2, Duration::from_millis(1));

        dispatcher.submit(sample_alert("DEV-001")).await.unwrap();
        let stats = dispatcher.close().await;

        assert_eq!(stats, DispatchStats { delivered: 0, failed: 1 });
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn later_alert_survives_earlier_failure() {
        let sink = Arc::new(FlakySink::new(1));
        let dispatcher =
            SinkDispatcher::spawn(sink.clone(), 16, 1, Duration::from_millis(1));

        dispatcher.submit(sample_alert("DEV-001")).await.unwrap();
        dispatcher.submit(sample_alert("DEV-002")).await.unwrap();
        let stats = dispatcher.close().await;

        assert_eq!(stats, DispatchStats { delivered: 1, failed: 1 });
        assert_eq!(*sink.delivered.lock().await, vec!["DEV-002"]);
    }

    #[tokio::test]
    async fn submit_after_close_reports_closed() {
        let sink = Arc::new(FlakySink::new(0));
        let dispatcher =
            SinkDispatcher::spawn(sink, 16, 1, Duration::from_millis(1));
        let submitter = dispatcher.submitter();

        dispatcher.close().await;

        let err = submitter.submit(sample_alert("DEV-001")).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[tokio::test]
    async fn close_flushes_everything_queued() {
        let sink = Arc::new(FlakySink::new(0));
        let dispatcher =
            SinkDispatcher::spawn(sink.clone(), 64, 1, Duration::from_millis(1));

        for i in 0..50 {
            dispatcher.submit(sample_alert(&format!("DEV-{i:03}"))).await.unwrap();
        }
        let stats = dispatcher.close().await;

        assert_eq!(stats.delivered, 50);
        assert_eq!(sink.delivered.lock().await.len(), 50);
    }
}

//! The run pipeline: event stream -> evaluator shards -> sink dispatcher.
//!
//! Evaluation is a single logical pass over the ordered stream. With
//! more than one worker, events are partitioned by device hash; each
//! worker owns its devices' burst state exclusively, so shards need no
//! coordination. Delivery runs behind a bounded queue and never blocks
//! evaluation beyond backpressure.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use fleetalert_core::{EventRecord, ScoredEvent};
use fleetalert_rules::evaluator::{shard_for_device, EvaluatorStats, RuleEvaluator};
use fleetalert_rules::schema::RuleCatalog;
use fleetalert_sink::{AlertSink, JsonlSink, SinkDispatcher, WebhookSink};

pub struct RunOptions {
    pub events: String,
    pub out: String,
    pub workers: usize,
    pub min_score: f64,
    pub webhook: Option<String>,
    pub retry_budget: u32,
    pub retry_backoff_ms: u64,
    pub queue_capacity: usize,
}

pub async fn run(catalog: Arc<RuleCatalog>, options: RunOptions) -> anyhow::Result<()> {
    let sink = build_sink(&options).await?;
    let dispatcher = SinkDispatcher::spawn(
        sink,
        options.queue_capacity,
        options.retry_budget,
        Duration::from_millis(options.retry_backoff_ms),
    );

    let reader = open_events(&options.events).await?;
    let mut lines = BufReader::new(reader).lines();

    let mut malformed: u64 = 0;
    let mut stats = EvaluatorStats::default();

    if options.workers <= 1 {
        let mut evaluator = RuleEvaluator::new(catalog, options.min_score);

        while let Some(line) = lines.next_line().await? {
            let Some(event) = parse_line(&line, &mut malformed) else {
                continue;
            };
            for alert in evaluator.evaluate(&event) {
                dispatcher.submit(alert).await?;
            }
        }

        stats = evaluator.stats();
    } else {
        let mut senders = Vec::with_capacity(options.workers);
        let mut handles = Vec::with_capacity(options.workers);

        for shard in 0..options.workers {
            let (tx, mut rx) = mpsc::channel::<ScoredEvent>(options.queue_capacity);
            let catalog = Arc::clone(&catalog);
            let submitter = dispatcher.submitter();
            let min_score = options.min_score;

            handles.push(tokio::spawn(async move {
                let mut evaluator = RuleEvaluator::new(catalog, min_score);
                while let Some(event) = rx.recv().await {
                    for alert in evaluator.evaluate(&event) {
                        if let Err(e) = submitter.submit(alert).await {
                            error!(shard, error = %e, "dispatcher rejected alert");
                            return evaluator.stats();
                        }
                    }
                }
                evaluator.stats()
            }));
            senders.push(tx);
        }

        while let Some(line) = lines.next_line().await? {
            let Some(event) = parse_line(&line, &mut malformed) else {
                continue;
            };
            let shard = shard_for_device(&event.device_id, options.workers);
            if senders[shard].send(event).await.is_err() {
                anyhow::bail!("evaluation worker {shard} terminated early");
            }
        }

        drop(senders);
        for handle in handles {
            stats += handle.await?;
        }
    }

    let delivery = dispatcher.close().await;

    info!(
        events_seen = stats.events_seen,
        events_skipped = stats.events_skipped + malformed,
        alerts_emitted = stats.alerts_emitted,
        bursts_emitted = stats.bursts_emitted,
        delivered = delivery.delivered,
        failed = delivery.failed,
        "run complete"
    );

    if delivery.failed > 0 {
        error!(
            failed = delivery.failed,
            "some alerts exhausted their delivery retry budget"
        );
    }

    Ok(())
}

async fn build_sink(options: &RunOptions) -> anyhow::Result<Arc<dyn AlertSink>> {
    if let Some(url) = &options.webhook {
        return Ok(Arc::new(WebhookSink::new(url.clone())));
    }
    if options.out == "-" {
        return Ok(Arc::new(JsonlSink::stdout()));
    }
    let sink = JsonlSink::create(std::path::Path::new(&options.out)).await?;
    Ok(Arc::new(sink))
}

async fn open_events(events: &str) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
    if events == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(events).await?;
    Ok(Box::new(file))
}

/// Parse one JSONL line into a scored event. Malformed lines are
/// skipped with a diagnostic; they never abort the stream.
fn parse_line(line: &str, malformed: &mut u64) -> Option<ScoredEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let record: EventRecord = match serde_json::from_str(trimmed) {
        Ok(record) => record,
        Err(e) => {
            *malformed += 1;
            warn!(error = %e, "skipping unparseable event line");
            return None;
        }
    };

    match ScoredEvent::try_from(record) {
        Ok(event) => Some(event),
        Err(e) => {
            *malformed += 1;
            warn!(error = %e, "skipping malformed event record");
            None
        }
    }
}

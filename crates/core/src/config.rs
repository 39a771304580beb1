use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub sink: SinkConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            engine: EngineConfig::from_env(),
            sink: SinkConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  engine:  rules={}, workers={}, min_score={}",
            self.engine.rules_path.display(),
            self.engine.workers,
            self.engine.min_score,
        );
        tracing::info!(
            "  sink:    webhook={}, retry_budget={}, queue_capacity={}",
            self.sink.webhook_url.as_deref().unwrap_or("(none)"),
            self.sink.retry_budget,
            self.sink.queue_capacity,
        );
    }
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the declarative alert rule file.
    pub rules_path: PathBuf,
    /// Number of device-sharded evaluation workers.
    pub workers: u32,
    /// Scoring threshold below which events do not count toward bursts.
    pub min_score: f64,
}

impl EngineConfig {
    fn from_env() -> Self {
        Self {
            rules_path: PathBuf::from(env_or("FLEETALERT_RULES", "configs/alert_rules.yaml")),
            workers: env_u32("FLEETALERT_WORKERS", 1).max(1),
            min_score: env_f64("FLEETALERT_MIN_SCORE", 0.0),
        }
    }
}

// ── Sink ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Optional webhook endpoint alerts are POSTed to.
    pub webhook_url: Option<String>,
    /// Delivery attempts per alert before it is surfaced as failed.
    pub retry_budget: u32,
    /// Delay between delivery attempts, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Bound on the in-flight alert queue between evaluation and delivery.
    pub queue_capacity: u32,
}

impl SinkConfig {
    fn from_env() -> Self {
        Self {
            webhook_url: env_opt("FLEETALERT_WEBHOOK"),
            retry_budget: env_u32("FLEETALERT_RETRY_BUDGET", 3).max(1),
            retry_backoff_ms: env_u64("FLEETALERT_RETRY_BACKOFF_MS", 500),
            queue_capacity: env_u32("FLEETALERT_QUEUE_CAPACITY", 1024).max(1),
        }
    }
}

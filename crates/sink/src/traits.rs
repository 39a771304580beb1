//! Sink trait definition and shared error types.

use fleetalert_core::AlertEvent;

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize alert: {0}")]
    Serialize(String),

    #[error("delivery rejected: {0}")]
    Delivery(String),

    #[error("dispatcher is closed")]
    Closed,
}

/// Trait for alert delivery implementations.
#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert. An `Err` return means the alert was not
    /// acknowledged and the dispatcher may retry it.
    async fn deliver(&self, alert: &AlertEvent) -> Result<(), SinkError>;

    /// Human-readable name for this sink (e.g., "jsonl", "webhook").
    fn sink_name(&self) -> &str;
}

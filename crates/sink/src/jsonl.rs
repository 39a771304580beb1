//! Line-delimited JSON sink writing to a file or stdout.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use fleetalert_core::AlertEvent;

use crate::traits::{AlertSink, SinkError};

/// Appends one JSON object per alert, newline-delimited.
pub struct JsonlSink {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonlSink {
    /// Write alerts to a file, created (truncated) at open.
    pub async fn create(path: &Path) -> Result<Self, SinkError> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self {
            writer: Mutex::new(Box::new(file)),
        })
    }

    /// Write alerts to stdout.
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(tokio::io::stdout())),
        }
    }
}

#[async_trait::async_trait]
impl AlertSink for JsonlSink {
    async fn deliver(&self, alert: &AlertEvent) -> Result<(), SinkError> {
        let mut line =
            serde_json::to_string(alert).map_err(|e| SinkError::Serialize(e.to_string()))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "jsonl"
    }
}

//! HTTP webhook sink.
//!
//! Delivers alerts as JSON payloads to a configured endpoint. A non-2xx
//! response is a delivery failure so the dispatcher's retry budget
//! applies to it.

use fleetalert_core::AlertEvent;

use crate::traits::{AlertSink, SinkError};

/// POSTs each alert as JSON to one endpoint.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSink for WebhookSink {
    async fn deliver(&self, alert: &AlertEvent) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(alert).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body,
                "webhook returned non-2xx status"
            );
            return Err(SinkError::Delivery(format!(
                "webhook returned {status}: {body}"
            )));
        }

        tracing::debug!(
            url = %self.url,
            device_id = %alert.device_id,
            rule = %alert.rule_name,
            "alert delivered to webhook"
        );

        Ok(())
    }

    fn sink_name(&self) -> &str {
        "webhook"
    }
}

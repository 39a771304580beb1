//! Downstream alert delivery.
//!
//! Evaluation never blocks on delivery: alerts flow through a bounded
//! queue into a dispatcher task that retries each delivery against a
//! configured budget. Exhausted budgets are surfaced via logging and
//! counters, never silently dropped.

pub mod dispatcher;
pub mod jsonl;
pub mod traits;
pub mod webhook;

pub use dispatcher::{AlertSubmitter, DispatchStats, SinkDispatcher};
pub use jsonl::JsonlSink;
pub use traits::{AlertSink, SinkError};
pub use webhook::WebhookSink;

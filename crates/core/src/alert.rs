//! Operator alert value types emitted by the rule engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::OperatingState;

/// Alert severity. Ordering is INFO < WARNING < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity: '{}' (expected INFO, WARNING, or CRITICAL)",
                other
            )),
        }
    }
}

/// One operator-ready alert, immutable once emitted.
///
/// Event-derived fields (`timestamp`, `device_id`, `state`, `score`,
/// `families`, `top_features`, `tag`) are copied from the triggering
/// event; the rest comes from the single rule that matched. `families`
/// is the event's attribution snapshot sorted descending by percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub state: OperatingState,
    pub severity: Severity,
    pub score: f64,
    /// How strongly the rule's conditions were exceeded, in [0, 1].
    pub confidence: f64,
    pub root_cause: String,
    /// Responsible team or queue.
    pub route: String,
    pub rule_name: String,
    /// Normalized fault tag; empty when the event carried none.
    pub tag: String,
    pub families: Vec<(String, f64)>,
    pub top_features: Vec<(String, f64)>,
}

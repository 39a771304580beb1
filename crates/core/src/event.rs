//! Scored event value types and the lenient wire form they are parsed from.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Operating state reported by the device at observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingState {
    Run,
    Idle,
    Maint,
}

impl std::fmt::Display for OperatingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingState::Run => write!(f, "RUN"),
            OperatingState::Idle => write!(f, "IDLE"),
            OperatingState::Maint => write!(f, "MAINT"),
        }
    }
}

impl std::str::FromStr for OperatingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUN" => Ok(OperatingState::Run),
            "IDLE" => Ok(OperatingState::Idle),
            "MAINT" => Ok(OperatingState::Maint),
            other => Err(format!("unknown operating state: '{}'", other)),
        }
    }
}

/// One anomaly-scored observation, as consumed by the rule engine.
///
/// Produced by the upstream scoring/explainability collaborator and never
/// mutated after construction. `families` preserves the attribution order
/// the explainer emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvent {
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub state: OperatingState,
    pub score: f64,
    /// Normalized fault tag, when the upstream tagged this observation.
    pub tag: Option<String>,
    /// Sensor family -> contribution percentage (nominally summing to ~100).
    pub families: IndexMap<String, f64>,
    /// Per-feature attribution, strongest first, carried through unchanged.
    pub top_features: Vec<(String, f64)>,
}

/// Raw wire record as it arrives on the event stream.
///
/// Deliberately permissive: every field the engine needs is validated in
/// the [`TryFrom`] conversion so malformed records can be skipped and
/// counted instead of aborting the stream. Attribution values that are
/// not finite numbers degrade to 0 contribution.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub families: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub top_features: Vec<(String, f64)>,
}

/// Parse an event timestamp. Accepts RFC 3339 as well as the plain
/// `YYYY-MM-DD HH:MM:SS` form the upstream exporters emit (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(RecordError::InvalidTimestamp(raw.to_string()))
}

impl TryFrom<EventRecord> for ScoredEvent {
    type Error = RecordError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let device_id = record
            .device_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or(RecordError::MissingDeviceId)?;

        let raw_ts = record
            .timestamp
            .filter(|t| !t.trim().is_empty())
            .ok_or(RecordError::MissingTimestamp)?;
        let timestamp = parse_timestamp(&raw_ts)?;

        let state = match record.state {
            Some(raw) => raw
                .parse::<OperatingState>()
                .map_err(RecordError::InvalidState)?,
            None => OperatingState::Run,
        };

        // Non-numeric or non-finite attribution degrades to 0 contribution.
        let families = record
            .families
            .into_iter()
            .map(|(name, value)| {
                let pct = value.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0);
                (name, pct)
            })
            .collect();

        let tag = record
            .tag
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(ScoredEvent {
            timestamp,
            device_id,
            state,
            score: if record.score.is_finite() { record.score } else { 0.0 },
            tag,
            families,
            top_features: record.top_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rfc3339_timestamp() {
        let ts = parse_timestamp("2026-01-01T10:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-01T10:00:00+00:00");
    }

    #[test]
    fn parse_plain_timestamp_as_utc() {
        let ts = parse_timestamp("2026-01-01 10:00:00").unwrap();
        assert_eq!(ts, parse_timestamp("2026-01-01T10:00:00Z").unwrap());
    }

    #[test]
    fn parse_garbage_timestamp_fails() {
        assert!(parse_timestamp("not-a-time").is_err());
    }

    #[test]
    fn record_to_event_happy_path() {
        let json = r#"{
            "timestamp": "2026-01-01 10:00:00",
            "device_id": "DEV-001",
            "state": "RUN",
            "score": 0.15,
            "tag": "bearing_wear",
            "families": {"Voltage": 47.0, "Temperature": 25.0},
            "top_features": [["voltage_rms", 22.5]]
        }"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        let event = ScoredEvent::try_from(record).unwrap();

        assert_eq!(event.device_id, "DEV-001");
        assert_eq!(event.state, OperatingState::Run);
        assert_eq!(event.tag.as_deref(), Some("bearing_wear"));
        assert_eq!(event.families["Voltage"], 47.0);
        assert_eq!(event.top_features[0].0, "voltage_rms");
    }

    #[test]
    fn record_without_device_id_is_rejected() {
        let record: EventRecord =
            serde_json::from_str(r#"{"timestamp": "2026-01-01 10:00:00"}"#).unwrap();
        assert!(matches!(
            ScoredEvent::try_from(record),
            Err(RecordError::MissingDeviceId)
        ));
    }

    #[test]
    fn record_with_blank_device_id_is_rejected() {
        let record: EventRecord = serde_json::from_str(
            r#"{"timestamp": "2026-01-01 10:00:00", "device_id": "   "}"#,
        )
        .unwrap();
        assert!(matches!(
            ScoredEvent::try_from(record),
            Err(RecordError::MissingDeviceId)
        ));
    }

    #[test]
    fn record_without_timestamp_is_rejected() {
        let record: EventRecord = serde_json::from_str(r#"{"device_id": "DEV-001"}"#).unwrap();
        assert!(matches!(
            ScoredEvent::try_from(record),
            Err(RecordError::MissingTimestamp)
        ));
    }

    #[test]
    fn malformed_attribution_degrades_to_zero() {
        let json = r#"{
            "timestamp": "2026-01-01 10:00:00",
            "device_id": "DEV-001",
            "families": {"Voltage": "garbage", "Temperature": null, "Current": 20.0}
        }"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        let event = ScoredEvent::try_from(record).unwrap();

        assert_eq!(event.families["Voltage"], 0.0);
        assert_eq!(event.families["Temperature"], 0.0);
        assert_eq!(event.families["Current"], 20.0);
    }

    #[test]
    fn empty_tag_normalizes_to_none() {
        let json = r#"{"timestamp": "2026-01-01 10:00:00", "device_id": "D", "tag": "  "}"#;
        let record: EventRecord = serde_json::from_str(json).unwrap();
        let event = ScoredEvent::try_from(record).unwrap();
        assert!(event.tag.is_none());
    }
}

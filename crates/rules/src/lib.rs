//! Declarative alert rule engine for anomaly-scored telemetry.
//!
//! This crate provides:
//! - YAML-based rule definition with serde deserialization
//! - Startup loader with exhaustive (collect-all) validation
//! - The three matchers: burst detection, dominant-family matching,
//!   and tag routing
//! - A per-event evaluator that resolves multi-match precedence and
//!   emits at most one alert per event plus independent burst alerts

pub mod evaluator;
pub mod loader;
pub mod matchers;
pub mod schema;
pub mod validation;

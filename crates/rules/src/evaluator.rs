//! Per-event rule evaluation and multi-match precedence.
//!
//! For each scored event the evaluator:
//! 1. feeds the burst detector and emits every burst alert immediately
//!    (bursts are a temporal signal, never suppressed by other kinds),
//! 2. collects dominant-family matches and the tag-route candidate,
//! 3. emits at most one alert from those: highest confidence wins,
//!    ties break by declaration order in the config file.
//!
//! Only the burst detector carries state; everything else is a pure
//! function of (event, catalogue), so identical input against an
//! unchanged catalogue reproduces identical output.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fleetalert_core::{AlertEvent, ScoredEvent, Severity};

use crate::matchers::tag_route::{
    self, FALLBACK_CAUSE, FALLBACK_ROUTE, FALLBACK_RULE_NAME,
};
use crate::matchers::{dominant, BurstDetector, TagDecision};
use crate::schema::RuleCatalog;

/// Counters surfaced at end of run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EvaluatorStats {
    pub events_seen: u64,
    pub events_skipped: u64,
    pub alerts_emitted: u64,
    pub bursts_emitted: u64,
}

impl std::ops::AddAssign for EvaluatorStats {
    fn add_assign(&mut self, other: Self) {
        self.events_seen += other.events_seen;
        self.events_skipped += other.events_skipped;
        self.alerts_emitted += other.alerts_emitted;
        self.bursts_emitted += other.bursts_emitted;
    }
}

/// One candidate from the single-alert path (dominant family or tag).
struct Candidate<'a> {
    confidence: f64,
    /// Position in the config file; the fallback gets `usize::MAX` so it
    /// loses every tie.
    decl_index: usize,
    severity: Severity,
    cause: &'a str,
    route: &'a str,
    rule_name: &'a str,
}

/// Stateful per-stream evaluator. One instance owns the burst windows
/// for the devices it sees; shard streams by device to run several.
pub struct RuleEvaluator {
    catalog: Arc<RuleCatalog>,
    burst: BurstDetector,
    stats: EvaluatorStats,
}

impl RuleEvaluator {
    pub fn new(catalog: Arc<RuleCatalog>, min_score: f64) -> Self {
        let burst = BurstDetector::new(catalog.burst_rules().to_vec(), min_score);
        Self {
            catalog,
            burst,
            stats: EvaluatorStats::default(),
        }
    }

    pub fn stats(&self) -> EvaluatorStats {
        self.stats
    }

    /// Evaluate one event, in arrival order, returning every alert it
    /// produced: zero or more burst alerts plus at most one
    /// dominant-family/tag alert.
    pub fn evaluate(&mut self, event: &ScoredEvent) -> Vec<AlertEvent> {
        self.stats.events_seen += 1;

        if event.device_id.trim().is_empty() {
            self.stats.events_skipped += 1;
            warn!(timestamp = %event.timestamp, "skipping event without device_id");
            return Vec::new();
        }

        let mut alerts = Vec::new();

        for fire in self
            .burst
            .observe(&event.device_id, event.timestamp, event.score)
        {
            let rule = self.burst.rule(fire.rule_idx);
            info!(
                device_id = %event.device_id,
                rule = %rule.name,
                count = fire.count,
                window_minutes = rule.window_minutes,
                window_start = %fire.window_start,
                "burst alert"
            );
            alerts.push(build_alert(
                event,
                1.0,
                rule.severity,
                &rule.cause,
                &rule.route,
                &rule.name,
            ));
            self.stats.bursts_emitted += 1;
        }

        if let Some(winner) = self.select_candidate(event) {
            debug!(
                device_id = %event.device_id,
                rule = %winner.rule_name,
                confidence = winner.confidence,
                "rule matched"
            );
            alerts.push(build_alert(
                event,
                winner.confidence,
                winner.severity,
                winner.cause,
                winner.route,
                winner.rule_name,
            ));
        }

        self.stats.alerts_emitted += alerts.len() as u64;
        alerts
    }

    /// Highest confidence wins; exact ties go to the earlier-declared
    /// rule so outcomes are auditable from the config file alone.
    fn select_candidate(&self, event: &ScoredEvent) -> Option<Candidate<'_>> {
        let mut best: Option<Candidate<'_>> = None;

        let dominant_rules = self.catalog.dominant_rules();
        for m in dominant::evaluate(dominant_rules, &event.families) {
            let rule = &dominant_rules[m.rule_idx];
            consider(
                &mut best,
                Candidate {
                    confidence: m.confidence,
                    decl_index: rule.decl_index,
                    severity: rule.severity,
                    cause: &rule.cause,
                    route: &rule.route,
                    rule_name: &rule.name,
                },
            );
        }

        match tag_route::resolve(&self.catalog, event.tag.as_deref()) {
            Some(TagDecision::Route(rule)) => consider(
                &mut best,
                Candidate {
                    confidence: 1.0,
                    decl_index: rule.decl_index,
                    severity: rule.severity,
                    cause: &rule.cause,
                    route: &rule.route,
                    rule_name: &rule.name,
                },
            ),
            Some(TagDecision::Fallback) => consider(
                &mut best,
                Candidate {
                    confidence: 0.0,
                    decl_index: usize::MAX,
                    severity: Severity::Info,
                    cause: FALLBACK_CAUSE,
                    route: FALLBACK_ROUTE,
                    rule_name: FALLBACK_RULE_NAME,
                },
            ),
            None => {}
        }

        best
    }
}

fn consider<'a>(best: &mut Option<Candidate<'a>>, candidate: Candidate<'a>) {
    let replace = match best {
        None => true,
        Some(current) => {
            candidate.confidence > current.confidence
                || (candidate.confidence == current.confidence
                    && candidate.decl_index < current.decl_index)
        }
    };
    if replace {
        *best = Some(candidate);
    }
}

/// Build an alert: event-derived fields copied through, rule-derived
/// fields from the winning rule, families sorted descending for output.
fn build_alert(
    event: &ScoredEvent,
    confidence: f64,
    severity: Severity,
    cause: &str,
    route: &str,
    rule_name: &str,
) -> AlertEvent {
    let mut families: Vec<(String, f64)> = event
        .families
        .iter()
        .map(|(name, &pct)| (name.clone(), if pct.is_finite() { pct } else { 0.0 }))
        .collect();
    families.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    AlertEvent {
        timestamp: event.timestamp,
        device_id: event.device_id.clone(),
        state: event.state,
        severity,
        score: event.score,
        confidence: confidence.clamp(0.0, 1.0),
        root_cause: cause.to_string(),
        route: route.to_string(),
        rule_name: rule_name.to_string(),
        tag: event
            .tag
            .as_deref()
            .map(tag_route::normalize_tag)
            .unwrap_or_default(),
        families,
        top_features: event.top_features.clone(),
    }
}

/// Stable device -> shard partition for concurrent evaluation.
///
/// Each shard owns its devices' burst windows exclusively, so workers
/// need no coordination.
pub fn shard_for_device(device_id: &str, shards: usize) -> usize {
    if shards <= 1 {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    device_id.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

//! Per-device sliding-window burst detection.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::schema::BurstRule;

/// A burst rule that fired for one device at one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstFire {
    /// Index into the detector's rule slice.
    pub rule_idx: usize,
    /// Events in the window at fire time, including the trigger.
    pub count: usize,
    /// Oldest timestamp that contributed to the burst.
    pub window_start: DateTime<Utc>,
}

/// Detects N-or-more qualifying events per device within a rolling window.
///
/// State is an arena of device-keyed timestamp queues, one per burst
/// rule. Devices never interact; the detector can be sharded by
/// device_id with no coordination. Window boundaries are inclusive: an
/// event exactly `window_minutes` before the trigger still counts.
#[derive(Debug)]
pub struct BurstDetector {
    rules: Vec<BurstRule>,
    /// Scoring threshold below which events do not count toward bursts.
    min_score: f64,
    /// Parallel to `rules`: device_id -> unconsumed event timestamps.
    windows: Vec<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl BurstDetector {
    pub fn new(rules: Vec<BurstRule>, min_score: f64) -> Self {
        let windows = rules.iter().map(|_| HashMap::new()).collect();
        Self {
            rules,
            min_score,
            windows,
        }
    }

    pub fn rules(&self) -> &[BurstRule] {
        &self.rules
    }

    pub fn rule(&self, idx: usize) -> &BurstRule {
        &self.rules[idx]
    }

    /// Record a qualifying event and report every burst rule that fired.
    ///
    /// Once a rule fires for a device, that device's queue is cleared
    /// except for the triggering timestamp, so a new burst needs a fresh
    /// accumulation (window grouping: one alert per incident cluster).
    pub fn observe(
        &mut self,
        device_id: &str,
        at: DateTime<Utc>,
        score: f64,
    ) -> Vec<BurstFire> {
        if score.is_nan() || score < self.min_score {
            return Vec::new();
        }

        let mut fires = Vec::new();

        for (idx, rule) in self.rules.iter().enumerate() {
            let queue = self.windows[idx]
                .entry(device_id.to_string())
                .or_default();

            // Inclusive boundary: keep timestamps at exactly the cutoff.
            let cutoff = at - Duration::minutes(i64::from(rule.window_minutes));
            while queue.front().is_some_and(|&ts| ts < cutoff) {
                queue.pop_front();
            }

            queue.push_back(at);

            if queue.len() >= rule.min_anomalies as usize {
                fires.push(BurstFire {
                    rule_idx: idx,
                    count: queue.len(),
                    window_start: *queue.front().unwrap_or(&at),
                });
                queue.clear();
                queue.push_back(at);
            }
        }

        fires
    }
}

//! Weighted dominant-family matching with graded confidence.

use indexmap::IndexMap;

use crate::schema::DominantFamilyRule;

/// One dominant-family rule that matched an event.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantMatch {
    /// Index into the evaluated rule slice.
    pub rule_idx: usize,
    pub confidence: f64,
}

/// Combined attribution share of the rule's family set.
///
/// Missing families and non-finite values contribute 0, so malformed
/// attribution can never produce a match by itself.
pub fn family_share(families: &[String], attribution: &IndexMap<String, f64>) -> f64 {
    families
        .iter()
        .map(|f| {
            attribution
                .get(f)
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        })
        .sum()
}

/// Confidence for an actual share against a threshold.
///
/// 0 at exactly the threshold, rising linearly to 1 at total (100%)
/// attribution. A threshold of 100 only matches total attribution, at
/// confidence 1.
pub fn confidence(actual: f64, min_percent: f64) -> f64 {
    if min_percent >= 100.0 {
        return if actual >= 100.0 { 1.0 } else { 0.0 };
    }
    ((actual - min_percent) / (100.0 - min_percent)).clamp(0.0, 1.0)
}

/// Evaluate every rule against one event's attribution snapshot.
///
/// Returns all matches with their confidences, uncombined; precedence
/// between them is the evaluator's concern.
pub fn evaluate(
    rules: &[DominantFamilyRule],
    attribution: &IndexMap<String, f64>,
) -> Vec<DominantMatch> {
    let mut matches = Vec::new();
    for (rule_idx, rule) in rules.iter().enumerate() {
        let actual = family_share(&rule.families, attribution);
        if actual >= rule.min_percent {
            matches.push(DominantMatch {
                rule_idx,
                confidence: confidence(actual, rule.min_percent),
            });
        }
    }
    matches
}

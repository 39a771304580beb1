//! Categorical fault-tag routing.

use crate::schema::{RuleCatalog, TagRouteRule};

/// Route assigned to tagged events no rule claims.
pub const FALLBACK_ROUTE: &str = "unclassified";
/// Root cause attached to the fallback.
pub const FALLBACK_CAUSE: &str = "untagged anomaly";
/// Rule name recorded on fallback alerts.
pub const FALLBACK_RULE_NAME: &str = "tag_fallback";

/// Normalize a fault tag for table lookup: trim and case-fold.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Outcome of routing one event's tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagDecision<'a> {
    /// The tag matched a configured route.
    Route(&'a TagRouteRule),
    /// The event carried a tag no rule claims; the fallback applies.
    Fallback,
}

/// Resolve an event's tag against the catalogue.
///
/// An untagged event yields `None` (no candidate at all); a tagged event
/// always yields a candidate, at worst the fallback. The fallback never
/// suppresses other matchers: it carries confidence 0.
pub fn resolve<'a>(catalog: &'a RuleCatalog, tag: Option<&str>) -> Option<TagDecision<'a>> {
    let raw = tag?;
    let normalized = normalize_tag(raw);
    if normalized.is_empty() {
        return None;
    }
    match catalog.tag_route(&normalized) {
        Some(rule) => Some(TagDecision::Route(rule)),
        None => Some(TagDecision::Fallback),
    }
}

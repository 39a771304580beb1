//! Typed alert rules produced by validation.

use fleetalert_core::Severity;

/// Supported rule kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Burst,
    DominantFamily,
    TagRoute,
}

/// Config spellings of the valid kinds, for diagnostics.
pub const VALID_KINDS: &[&str] = &["burst", "dominant_family", "tag_route"];

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleKind::Burst => write!(f, "burst"),
            RuleKind::DominantFamily => write!(f, "dominant_family"),
            RuleKind::TagRoute => write!(f, "tag_route"),
        }
    }
}

impl std::str::FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "burst" => Ok(RuleKind::Burst),
            "dominant_family" => Ok(RuleKind::DominantFamily),
            "tag_route" => Ok(RuleKind::TagRoute),
            other => Err(format!(
                "unknown rule kind: '{}' (valid kinds: {})",
                other,
                VALID_KINDS.join(", ")
            )),
        }
    }
}

/// N-or-more anomalies on one device within a rolling window.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstRule {
    pub name: String,
    /// Position in the config file, for deterministic tie-breaking.
    pub decl_index: usize,
    pub window_minutes: u32,
    pub min_anomalies: u32,
    pub severity: Severity,
    pub cause: String,
    pub route: String,
}

/// A family set accounting for a disproportionate share of attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct DominantFamilyRule {
    pub name: String,
    pub decl_index: usize,
    pub families: Vec<String>,
    /// Combined attribution share required to match, in (0, 100].
    pub min_percent: f64,
    pub severity: Severity,
    pub cause: String,
    pub route: String,
}

/// A normalized fault tag routed to a responsible team.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRouteRule {
    pub name: String,
    pub decl_index: usize,
    /// Already normalized (trimmed, case-folded).
    pub tag: String,
    pub route: String,
    pub severity: Severity,
    pub cause: String,
}

/// A fully validated rule of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertRule {
    Burst(BurstRule),
    DominantFamily(DominantFamilyRule),
    TagRoute(TagRouteRule),
}

impl AlertRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            AlertRule::Burst(_) => RuleKind::Burst,
            AlertRule::DominantFamily(_) => RuleKind::DominantFamily,
            AlertRule::TagRoute(_) => RuleKind::TagRoute,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AlertRule::Burst(r) => &r.name,
            AlertRule::DominantFamily(r) => &r.name,
            AlertRule::TagRoute(r) => &r.name,
        }
    }

    pub fn decl_index(&self) -> usize {
        match self {
            AlertRule::Burst(r) => r.decl_index,
            AlertRule::DominantFamily(r) => r.decl_index,
            AlertRule::TagRoute(r) => r.decl_index,
        }
    }
}

//! Exhaustive rule validation with structured errors.
//!
//! Validation is collect-all, not first-error-wins: every violation
//! across every rule is reported together so an operator can fix a
//! config file in one pass. A catalogue is only produced when the whole
//! file is clean; there is no partial result.

use std::collections::HashMap;

use fleetalert_core::Severity;
use serde::{Deserialize, Serialize};

use crate::matchers::tag_route::normalize_tag;
use crate::schema::{
    AlertRule, BurstRule, DominantFamilyRule, RuleCatalog, RuleKind, RuleSpec, TagRouteRule,
    VALID_KINDS,
};

/// Route assigned when a rule does not configure one.
pub const DEFAULT_ROUTE: &str = "unclassified";

// ── Result types ────────────────────────────────────────────────────

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Config-path-like location, e.g. `"rules[2].min_percent"`.
    pub path: String,
    pub message: String,
}

/// The complete set of violations found in one validation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", e.path, e.message)?;
        }
        Ok(())
    }
}

// ── Compilation ─────────────────────────────────────────────────────

/// Validate every spec and, only if all are clean, build the catalogue.
pub fn compile(specs: &[RuleSpec]) -> Result<RuleCatalog, ValidationResult> {
    let mut result = ValidationResult::default();
    let mut rules = Vec::with_capacity(specs.len());

    for (index, spec) in specs.iter().enumerate() {
        if let Some(rule) = compile_rule(spec, index, &mut result) {
            rules.push(rule);
        }
    }

    check_duplicate_tags(&rules, &mut result);

    if result.is_valid() {
        Ok(RuleCatalog::from_rules(rules))
    } else {
        Err(result)
    }
}

/// Validate one spec, recording violations. Returns the typed rule only
/// when this spec contributed no errors.
fn compile_rule(spec: &RuleSpec, index: usize, result: &mut ValidationResult) -> Option<AlertRule> {
    let path = |field: &str| format!("rules[{}].{}", index, field);

    let kind = match spec.kind.parse::<RuleKind>() {
        Ok(kind) => Some(kind),
        Err(_) => {
            result.error(
                path("type"),
                format!(
                    "rule '{}' has unknown kind '{}' (valid kinds: {})",
                    spec.display_name(index),
                    spec.kind,
                    VALID_KINDS.join(", ")
                ),
            );
            None
        }
    };

    let name = spec.display_name(index);

    let severity = match &spec.severity {
        Some(raw) => match raw.parse::<Severity>() {
            Ok(sev) => Some(sev),
            Err(msg) => {
                result.error(path("severity"), msg);
                None
            }
        },
        None => {
            result.error(path("severity"), "severity is required");
            None
        }
    };

    let cause = match spec.cause.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => Some(c.to_string()),
        _ => {
            result.error(path("cause"), "cause is required");
            None
        }
    };

    let route = spec
        .route
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let rule = match kind? {
        RuleKind::Burst => {
            let window_minutes = match spec.device_window_minutes {
                Some(w) if w > 0 && w <= i64::from(u32::MAX) => Some(w as u32),
                Some(w) => {
                    result.error(
                        path("device_window_minutes"),
                        format!("device_window_minutes must be > 0, got {}", w),
                    );
                    None
                }
                None => {
                    result.error(path("device_window_minutes"), "device_window_minutes is required");
                    None
                }
            };
            let min_anomalies = match spec.min_anomalies {
                Some(n) if n >= 2 && n <= i64::from(u32::MAX) => Some(n as u32),
                Some(n) => {
                    result.error(
                        path("min_anomalies"),
                        format!("min_anomalies must be >= 2, got {}", n),
                    );
                    None
                }
                None => {
                    result.error(path("min_anomalies"), "min_anomalies is required");
                    None
                }
            };
            AlertRule::Burst(BurstRule {
                name,
                decl_index: index,
                window_minutes: window_minutes?,
                min_anomalies: min_anomalies?,
                severity: severity?,
                cause: cause?,
                route: route.unwrap_or_else(|| DEFAULT_ROUTE.to_string()),
            })
        }
        RuleKind::DominantFamily => {
            let families = match spec.family.clone().map(FamilyListExt::into_clean_vec) {
                Some(fams) if !fams.is_empty() => Some(fams),
                Some(_) => {
                    result.error(path("family"), "family set must not be empty");
                    None
                }
                None => {
                    result.error(path("family"), "family is required");
                    None
                }
            };
            let min_percent = match spec.min_percent {
                Some(p) if p.is_finite() && p > 0.0 && p <= 100.0 => Some(p),
                Some(p) => {
                    result.error(
                        path("min_percent"),
                        format!("min_percent must be in (0, 100], got {}", p),
                    );
                    None
                }
                None => {
                    result.error(path("min_percent"), "min_percent is required");
                    None
                }
            };
            AlertRule::DominantFamily(DominantFamilyRule {
                name,
                decl_index: index,
                families: families?,
                min_percent: min_percent?,
                severity: severity?,
                cause: cause?,
                route: route.unwrap_or_else(|| DEFAULT_ROUTE.to_string()),
            })
        }
        RuleKind::TagRoute => {
            let tag = match spec.tag.as_deref().map(normalize_tag) {
                Some(t) if !t.is_empty() => Some(t),
                _ => {
                    result.error(path("tag"), "tag is required and must not be empty");
                    None
                }
            };
            let route = match route {
                Some(r) => Some(r),
                None => {
                    result.error(path("route"), "route is required");
                    None
                }
            };
            AlertRule::TagRoute(TagRouteRule {
                name,
                decl_index: index,
                tag: tag?,
                route: route?,
                severity: severity?,
                cause: cause?,
            })
        }
    };

    Some(rule)
}

/// Two tag_route rules with the same normalized tag would make lookups
/// ambiguous and leave one rule dead; reject the config.
fn check_duplicate_tags(rules: &[AlertRule], result: &mut ValidationResult) {
    let mut seen: HashMap<&str, &TagRouteRule> = HashMap::new();
    for rule in rules {
        if let AlertRule::TagRoute(tr) = rule {
            if let Some(first) = seen.get(tr.tag.as_str()) {
                result.error(
                    format!("rules[{}].tag", tr.decl_index),
                    format!(
                        "duplicate tag '{}' (already routed by rule '{}')",
                        tr.tag, first.name
                    ),
                );
            } else {
                seen.insert(&tr.tag, tr);
            }
        }
    }
}

trait FamilyListExt {
    fn into_clean_vec(self) -> Vec<String>;
}

impl FamilyListExt for crate::schema::FamilyList {
    fn into_clean_vec(self) -> Vec<String> {
        self.into_vec()
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }
}

//! Immutable, kind-grouped rule catalogue.

use std::collections::HashMap;

use super::{AlertRule, BurstRule, DominantFamilyRule, TagRouteRule};

/// The validated rule set for one process lifetime.
///
/// Rules are grouped by kind, each group in declaration order, and every
/// rule keeps its position in the config file so multi-match ties stay
/// auditable from the file alone. Reloading requires a restart; nothing
/// here is mutable after construction.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    burst: Vec<BurstRule>,
    dominant: Vec<DominantFamilyRule>,
    tag_routes: Vec<TagRouteRule>,
    /// Normalized tag -> index into `tag_routes`.
    tags: HashMap<String, usize>,
}

impl RuleCatalog {
    /// Group already-validated rules. Duplicate tags must have been
    /// rejected by validation before this point.
    pub(crate) fn from_rules(rules: Vec<AlertRule>) -> Self {
        let mut burst = Vec::new();
        let mut dominant = Vec::new();
        let mut tag_routes: Vec<TagRouteRule> = Vec::new();

        for rule in rules {
            match rule {
                AlertRule::Burst(r) => burst.push(r),
                AlertRule::DominantFamily(r) => dominant.push(r),
                AlertRule::TagRoute(r) => tag_routes.push(r),
            }
        }

        let tags = tag_routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.tag.clone(), i))
            .collect();

        Self {
            burst,
            dominant,
            tag_routes,
            tags,
        }
    }

    pub fn burst_rules(&self) -> &[BurstRule] {
        &self.burst
    }

    pub fn dominant_rules(&self) -> &[DominantFamilyRule] {
        &self.dominant
    }

    pub fn tag_routes(&self) -> &[TagRouteRule] {
        &self.tag_routes
    }

    /// Look up a tag route by its normalized tag.
    pub fn tag_route(&self, normalized_tag: &str) -> Option<&TagRouteRule> {
        self.tags
            .get(normalized_tag)
            .map(|&i| &self.tag_routes[i])
    }

    pub fn len(&self) -> usize {
        self.burst.len() + self.dominant.len() + self.tag_routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

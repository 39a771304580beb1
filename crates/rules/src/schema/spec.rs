//! Permissive first-pass deserialization of rule config files.

use serde::{Deserialize, Serialize};

/// Top-level rule file shape: either a bare list of rules or a
/// `rules:` mapping wrapping one. Both forms are part of the operator
/// data contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleFile {
    Wrapped { rules: Vec<RuleSpec> },
    List(Vec<RuleSpec>),
}

impl RuleFile {
    pub fn into_specs(self) -> Vec<RuleSpec> {
        match self {
            RuleFile::Wrapped { rules } => rules,
            RuleFile::List(rules) => rules,
        }
    }
}

/// One rule as written in config.
///
/// Every kind-specific key is optional here; requiredness is enforced by
/// validation so that all violations across the whole file can be
/// reported in one pass instead of failing on the first serde error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,

    // burst
    #[serde(default)]
    pub device_window_minutes: Option<i64>,
    #[serde(default)]
    pub min_anomalies: Option<i64>,

    // dominant_family
    #[serde(default, alias = "families")]
    pub family: Option<FamilyList>,
    #[serde(default)]
    pub min_percent: Option<f64>,

    // tag_route
    #[serde(default)]
    pub tag: Option<String>,

    // shared
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

impl RuleSpec {
    /// Best display name for diagnostics: configured name, else kind + position.
    pub fn display_name(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("{}-{}", self.kind, index),
        }
    }
}

/// A family set written either as a single string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FamilyList {
    One(String),
    Many(Vec<String>),
}

impl FamilyList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            FamilyList::One(f) => vec![f],
            FamilyList::Many(fs) => fs,
        }
    }
}

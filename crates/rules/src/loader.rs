//! Startup rule loading: file -> raw specs -> validated catalogue.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::schema::{RuleCatalog, RuleFile};
use crate::validation::{self, ValidationResult};

/// Errors that can occur while loading the rule configuration.
///
/// All of these are fatal at startup: the engine never runs against a
/// partial or invalid catalogue.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more rules failed validation; every violation is included.
    #[error("invalid rule configuration:\n{0}")]
    Invalid(ValidationResult),
}

/// Result alias for rule loading operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Load and validate a rule file, producing the immutable catalogue.
pub fn load_rules_file(path: &Path) -> Result<RuleCatalog> {
    let contents = fs::read_to_string(path)?;
    let catalog = load_rules_str(&contents)?;
    info!(
        path = %path.display(),
        burst = catalog.burst_rules().len(),
        dominant_family = catalog.dominant_rules().len(),
        tag_route = catalog.tag_routes().len(),
        "loaded alert rule catalogue"
    );
    Ok(catalog)
}

/// Parse and validate rule YAML. Accepts both a bare rule list and the
/// `rules: [...]` wrapper form.
pub fn load_rules_str(yaml: &str) -> Result<RuleCatalog> {
    let file: RuleFile = serde_yaml::from_str(yaml)?;
    let specs = file.into_specs();

    let catalog = validation::compile(&specs).map_err(RuleError::Invalid)?;

    for rule in catalog.burst_rules() {
        info!(rule = %rule.name, kind = "burst", window_minutes = rule.window_minutes, min_anomalies = rule.min_anomalies, "loaded rule");
    }
    for rule in catalog.dominant_rules() {
        info!(rule = %rule.name, kind = "dominant_family", min_percent = rule.min_percent, "loaded rule");
    }
    for rule in catalog.tag_routes() {
        info!(rule = %rule.name, kind = "tag_route", tag = %rule.tag, route = %rule.route, "loaded rule");
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const GOOD_YAML: &str = r#"
rules:
  - name: burst_rule
    type: burst
    device_window_minutes: 10
    min_anomalies: 3
    severity: critical
    cause: Repeated anomalies
  - name: voltage_rule
    type: dominant_family
    family: Voltage
    min_percent: 45
    severity: warning
    cause: Power instability
  - name: bearing_route
    type: tag_route
    tag: bearing_wear
    route: maintenance
    severity: warning
    cause: Tagged bearing wear
"#;

    #[test]
    fn load_wrapped_rule_list() {
        let catalog = load_rules_str(GOOD_YAML).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.burst_rules()[0].name, "burst_rule");
        assert_eq!(catalog.dominant_rules()[0].families, vec!["Voltage"]);
        assert!(catalog.tag_route("bearing_wear").is_some());
    }

    #[test]
    fn load_bare_rule_list() {
        let yaml = r#"
- name: voltage_rule
  type: dominant_family
  family: [Voltage, Current]
  min_percent: 40
  severity: info
  cause: Power instability
"#;
        let catalog = load_rules_str(yaml).unwrap();
        assert_eq!(catalog.dominant_rules().len(), 1);
        assert_eq!(
            catalog.dominant_rules()[0].families,
            vec!["Voltage", "Current"]
        );
    }

    #[test]
    fn invalid_rules_report_every_violation() {
        let yaml = r#"
rules:
  - name: bad_burst
    type: burst
    device_window_minutes: 0
    min_anomalies: 1
    severity: urgent
    cause: ""
  - name: bad_dominant
    type: dominant_family
    family: []
    min_percent: 150
    severity: warning
    cause: whatever
"#;
        let err = load_rules_str(yaml).unwrap_err();
        let RuleError::Invalid(result) = err else {
            panic!("expected validation failure, got: {err:?}");
        };
        // 4 violations on the burst rule + 2 on the dominant rule.
        assert_eq!(result.errors.len(), 6);
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"rules[0].device_window_minutes"));
        assert!(paths.contains(&"rules[0].min_anomalies"));
        assert!(paths.contains(&"rules[0].severity"));
        assert!(paths.contains(&"rules[0].cause"));
        assert!(paths.contains(&"rules[1].family"));
        assert!(paths.contains(&"rules[1].min_percent"));
    }

    #[test]
    fn unknown_kind_names_rule_and_valid_kinds() {
        let yaml = r#"
rules:
  - name: mystery
    type: definitely_not_real
    severity: info
    cause: whatever
"#;
        let err = load_rules_str(yaml).unwrap_err();
        let RuleError::Invalid(result) = err else {
            panic!("expected validation failure, got: {err:?}");
        };
        assert_eq!(result.errors.len(), 1);
        let msg = &result.errors[0].message;
        assert!(msg.contains("mystery"));
        assert!(msg.contains("definitely_not_real"));
        assert!(msg.contains("burst, dominant_family, tag_route"));
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let yaml = r#"
rules:
  - type: tag_route
    tag: bearing_wear
    route: maintenance
    severity: warning
    cause: first
  - type: tag_route
    tag: "  Bearing_Wear "
    route: thermal
    severity: info
    cause: second
"#;
        let err = load_rules_str(yaml).unwrap_err();
        let RuleError::Invalid(result) = err else {
            panic!("expected validation failure, got: {err:?}");
        };
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("duplicate tag 'bearing_wear'"));
    }

    #[test]
    fn unnamed_rules_get_positional_names() {
        let yaml = r#"
rules:
  - type: dominant_family
    family: Temperature
    min_percent: 28
    severity: warning
    cause: Thermal overload
"#;
        let catalog = load_rules_str(yaml).unwrap();
        assert_eq!(catalog.dominant_rules()[0].name, "dominant_family-0");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(GOOD_YAML.as_bytes()).unwrap();
        let catalog = load_rules_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_rules_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, RuleError::Io(_)));
    }
}

//! Schema deserialization tests for the raw config forms.

use super::*;

#[test]
fn spec_parses_single_family_string() {
    let spec: RuleSpec = serde_yaml::from_str(
        r#"
name: thermal
type: dominant_family
family: Temperature
min_percent: 28
severity: warning
cause: Thermal overload
"#,
    )
    .unwrap();

    assert_eq!(spec.kind, "dominant_family");
    assert_eq!(
        spec.family.unwrap().into_vec(),
        vec!["Temperature".to_string()]
    );
}

#[test]
fn spec_parses_family_list() {
    let spec: RuleSpec = serde_yaml::from_str(
        r#"
type: dominant_family
family: [Voltage, Current]
min_percent: 38
severity: warning
cause: Power instability
"#,
    )
    .unwrap();

    assert_eq!(
        spec.family.unwrap().into_vec(),
        vec!["Voltage".to_string(), "Current".to_string()]
    );
}

#[test]
fn spec_accepts_families_alias() {
    let spec: RuleSpec = serde_yaml::from_str(
        r#"
type: dominant_family
families: [Vibration, RPM]
min_percent: 30
severity: warning
cause: Mechanical wear
"#,
    )
    .unwrap();

    assert_eq!(
        spec.family.unwrap().into_vec(),
        vec!["Vibration".to_string(), "RPM".to_string()]
    );
}

#[test]
fn spec_keeps_unset_keys_as_none() {
    let spec: RuleSpec = serde_yaml::from_str(
        r#"
type: tag_route
tag: bearing_wear
route: maintenance
severity: warning
cause: Tagged bearing wear
"#,
    )
    .unwrap();

    assert!(spec.name.is_none());
    assert!(spec.device_window_minutes.is_none());
    assert!(spec.min_anomalies.is_none());
    assert!(spec.family.is_none());
    assert!(spec.min_percent.is_none());
}

#[test]
fn display_name_prefers_configured_name() {
    let spec: RuleSpec = serde_yaml::from_str("{type: burst, name: my_rule}").unwrap();
    assert_eq!(spec.display_name(3), "my_rule");

    let unnamed: RuleSpec = serde_yaml::from_str("{type: burst}").unwrap();
    assert_eq!(unnamed.display_name(3), "burst-3");
}

#[test]
fn rule_kind_round_trips() {
    for (kind, spelled) in [
        (RuleKind::Burst, "burst"),
        (RuleKind::DominantFamily, "dominant_family"),
        (RuleKind::TagRoute, "tag_route"),
    ] {
        assert_eq!(kind.to_string(), spelled);
        assert_eq!(spelled.parse::<RuleKind>().unwrap(), kind);
    }
    assert!("spike".parse::<RuleKind>().is_err());
}

#[test]
fn rule_file_wrapped_and_bare_forms() {
    let wrapped: RuleFile = serde_yaml::from_str(
        "rules:\n  - {type: burst, device_window_minutes: 10, min_anomalies: 3, severity: info, cause: c}\n",
    )
    .unwrap();
    assert_eq!(wrapped.into_specs().len(), 1);

    let bare: RuleFile = serde_yaml::from_str(
        "- {type: burst, device_window_minutes: 10, min_anomalies: 3, severity: info, cause: c}\n",
    )
    .unwrap();
    assert_eq!(bare.into_specs().len(), 1);
}

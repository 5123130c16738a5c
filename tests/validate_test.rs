//! Offline configuration validators, exercised through the public API.

use std::collections::BTreeMap;
use std::io::Write;

use serde_json::json;

use reliability_infra::error::Error;
use reliability_infra::validate::*;

fn map(value: serde_json::Value) -> ConfigMap {
    serde_json::from_value(value).unwrap()
}

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn populated_cluster_config_passes() {
    let report = validate_cluster_config(&map(json!({
        "cluster_name": "test-cluster",
        "location": "westeurope",
        "node_count": 3,
        "vm_size": "Standard_D2_v3",
    })));
    assert!(report.is_ok(), "{:?}", report.outcomes);
}

#[test]
fn blank_required_field_fails() {
    let report = validate_cluster_config(&map(json!({
        "cluster_name": "",
        "location": "westeurope",
        "node_count": 3,
        "vm_size": "Standard_D2_v3",
    })));
    let failed: Vec<_> = report.failures().map(|o| o.check.as_str()).collect();
    assert_eq!(failed, ["required:cluster_name"]);
}

#[test]
fn missing_required_field_fails() {
    let report = require_fields(&map(json!({ "location": "westeurope" })), &["location", "vm_size"]);
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.message, "vm_size is missing");
}

#[test]
fn autoscaling_reference_bounds_pass() {
    let report = validate_autoscaling(&AutoscalingConfig {
        min_nodes: 1,
        max_nodes: 10,
        initial: 3,
    });
    assert!(report.is_ok());
}

#[test]
fn autoscaling_initial_above_max_fails() {
    let report = validate_autoscaling(&AutoscalingConfig {
        min_nodes: 1,
        max_nodes: 10,
        initial: 15,
    });
    let failed: Vec<_> = report.failures().map(|o| o.check.as_str()).collect();
    assert_eq!(failed, ["autoscaling:initial"]);
}

#[test]
fn autoscaling_inverted_bounds_fail() {
    let report = validate_autoscaling(&AutoscalingConfig {
        min_nodes: 5,
        max_nodes: 2,
        initial: 3,
    });
    assert_eq!(report.failures().count(), 2);
}

#[test]
fn names_over_63_characters_are_invalid() {
    assert!(validate_name(&"a".repeat(63)).is_ok());
    assert!(!validate_name(&"a".repeat(64)).is_ok());
    assert!(!validate_name("").is_ok());

    let report = validate_names(["test-cluster", "prod-aks-001", "dev-environment"]);
    assert!(report.is_ok());
}

#[test]
fn tags_with_values_pass() {
    let report = validate_tags(&tags(&[("Environment", "Test"), ("ManagedBy", "Terraform")]));
    assert!(report.is_ok());
}

#[test]
fn tag_with_empty_value_fails() {
    let report = validate_tags(&tags(&[("Environment", "Test"), ("Owner", "")]));
    let failed: Vec<_> = report.failures().map(|o| o.check.as_str()).collect();
    assert_eq!(failed, ["tag:Owner"]);
}

#[test]
fn three_of_four_monitoring_features_meet_threshold() {
    let flags = BTreeMap::from([
        ("metrics_enabled".to_string(), true),
        ("logging_enabled".to_string(), true),
        ("alerts_configured".to_string(), true),
        ("dashboard_created".to_string(), false),
    ]);
    let report = validate_monitoring(&flags, DEFAULT_MONITORING_THRESHOLD);
    assert!(report.is_ok());
    assert_eq!(
        report.outcomes[0].message,
        "3 out of 4 monitoring features enabled (minimum 2)"
    );

    assert!(!validate_monitoring(&flags, 4).is_ok());
}

#[test]
fn network_cidrs_are_parsed() {
    assert!(validate_network(&map(json!({
        "vnet_cidr": "10.0.0.0/16",
        "subnet_cidr": "10.0.1.0/24",
    })))
    .is_ok());

    let report = validate_network(&map(json!({ "vnet_cidr": "10.0.0.0/33" })));
    let failed: Vec<_> = report.failures().map(|o| o.check.as_str()).collect();
    assert_eq!(failed, ["cidr:vnet_cidr"]);
}

#[test]
fn numeric_vnet_cidr_is_rejected() {
    let report = validate_network(&map(json!({ "vnet_cidr": 10 })));
    assert!(!report.is_ok());
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.check, "cidr:vnet_cidr");
    assert_eq!(failure.message, "vnet_cidr = 10 is not a CIDR string");

    // A blank optional subnet is still skipped.
    assert!(validate_network(&map(json!({
        "vnet_cidr": "10.0.0.0/16",
        "subnet_cidr": "",
    })))
    .is_ok());
}

#[test]
fn unknown_module_is_flagged() {
    let report = validate_module_structure(&["aks".to_string(), "dns".to_string()]);
    let failed: Vec<_> = report.failures().map(|o| o.check.as_str()).collect();
    assert_eq!(failed, ["module:dns"]);
}

#[test]
fn reference_configuration_passes_every_check() {
    validate_all(&ValidationInput::default()).into_result().unwrap();
}

#[test]
fn yaml_file_overrides_sections() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "autoscaling:\n  min_nodes: 1\n  max_nodes: 10\n  initial: 15\nmonitoringThreshold: 3\n"
    )
    .unwrap();

    let input = ValidationInput::from_file(file.path()).unwrap();
    assert_eq!(input.autoscaling.initial, 15);
    assert_eq!(input.monitoring_threshold, 3);
    assert_eq!(input.modules, ValidationInput::default().modules);

    match validate_all(&input).into_result() {
        Err(Error::Validation(msg)) => assert!(msg.contains("autoscaling:initial"), "{msg}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn malformed_yaml_is_an_error() {
    assert!(matches!(
        ValidationInput::from_yaml("autoscaling: [1, 2"),
        Err(Error::Yaml(_))
    ));
}

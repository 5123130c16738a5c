//! Naming and precondition helpers.

use std::collections::HashSet;

use reliability_infra::error::Error;
use reliability_infra::helpers::*;
use reliability_infra::validate::validate_name;

#[test]
fn unique_ids_differ_between_runs() {
    let ids: HashSet<String> = (0..50).map(|_| unique_id()).collect();
    assert!(ids.len() > 1);
}

#[test]
fn generated_names_are_valid_resource_names() {
    let id = unique_id();
    for name in [
        resource_group_name(&id),
        cluster_name(&id),
        module_resource_group_name(&id),
        module_cluster_name(&id),
    ] {
        assert!(name.ends_with(&id));
        assert!(validate_name(&name).is_ok(), "{name}");
    }
}

#[test]
fn empty_input_names_the_field() {
    match require_non_empty("", "kube_config output") {
        Err(Error::Validation(msg)) => assert_eq!(msg, "kube_config output should not be empty"),
        other => panic!("expected validation error, got {other:?}"),
    }
    require_non_empty("apiVersion: v1", "kube_config output").unwrap();
}

#[test]
fn resource_limits_need_cpu_and_memory() {
    verify_resource_limits("500m", "512Mi").unwrap();

    let err = verify_resource_limits("500m", "").unwrap_err();
    assert_eq!(err.to_string(), "Validation error: Memory limit should not be empty");
    assert!(verify_resource_limits("", "512Mi").is_err());
}

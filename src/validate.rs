//! In-process configuration validators.
//!
//! Nothing here touches Terraform or a cluster: each validator inspects a
//! literal map and returns a [`ValidationReport`].  Defaults for
//! [`ValidationInput`] describe the stack's reference configuration, and a
//! YAML file with the same shape can override any section.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::helpers::MAX_NAME_LEN;

/// A flat map of configuration values, as handed to Terraform.
pub type ConfigMap = BTreeMap<String, Value>;

/// Minimum number of monitoring features that must be switched on.
pub const DEFAULT_MONITORING_THRESHOLD: usize = 2;

/// Terraform modules the repository ships.
pub const KNOWN_MODULES: [&str; 3] = ["aks", "argocd", "test-setup"];

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check: String,
    pub passed: bool,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&mut self, check: &str, message: impl Into<String>) {
        let message = message.into();
        info!(%check, %message, "check passed");
        self.outcomes.push(CheckOutcome {
            check: check.to_string(),
            passed: true,
            message,
        });
    }

    pub fn fail(&mut self, check: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(%check, %message, "check failed");
        self.outcomes.push(CheckOutcome {
            check: check.to_string(),
            passed: false,
            message,
        });
    }

    pub fn record(&mut self, check: &str, ok: bool, message: impl Into<String>) {
        if ok {
            self.pass(check, message);
        } else {
            self.fail(check, message);
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn is_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn into_result(self) -> Result<()> {
        let failures: Vec<String> = self
            .failures()
            .map(|o| format!("{}: {}", o.check, o.message))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(failures.join("; ")))
        }
    }
}

// ── Validators ────────────────────────────────────────────────────────────────

/// Null, blank strings and empty collections count as empty.  Numbers and
/// booleans are always populated.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Each of `keys` is present in `map` with a non-empty value.
pub fn require_fields(map: &ConfigMap, keys: &[&str]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for key in keys {
        let check = format!("required:{key}");
        match map.get(*key) {
            Some(v) if !is_empty_value(v) => report.pass(&check, format!("{key} = {v}")),
            Some(_) => report.fail(&check, format!("{key} should not be empty")),
            None => report.fail(&check, format!("{key} is missing")),
        }
    }
    report
}

/// Cluster-level settings: required keys populated and at least one node.
pub fn validate_cluster_config(map: &ConfigMap) -> ValidationReport {
    if let Ok(rendered) = serde_json::to_string_pretty(map) {
        info!("validating cluster configuration:\n{rendered}");
    }

    let mut report = require_fields(map, &["cluster_name", "location", "node_count", "vm_size"]);
    match map.get("node_count").and_then(Value::as_i64) {
        Some(n) => report.record("node_count", n >= 1, format!("node count {n} (minimum 1)")),
        None => report.fail("node_count", "node count should be an integer"),
    }
    report
}

/// Autoscaler bounds for a node pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscalingConfig {
    pub min_nodes: i64,
    pub max_nodes: i64,
    pub initial: i64,
}

impl Default for AutoscalingConfig {
    fn default() -> Self {
        Self {
            min_nodes: 1,
            max_nodes: 10,
            initial: 3,
        }
    }
}

/// `min <= max` and `min <= initial <= max`.
pub fn validate_autoscaling(config: &AutoscalingConfig) -> ValidationReport {
    let AutoscalingConfig {
        min_nodes,
        max_nodes,
        initial,
    } = *config;
    info!(min_nodes, max_nodes, initial, "validating autoscaling configuration");

    let mut report = ValidationReport::new();
    report.record(
        "autoscaling:bounds",
        min_nodes <= max_nodes,
        format!("min nodes {min_nodes}, max nodes {max_nodes}"),
    );
    report.record(
        "autoscaling:initial",
        (min_nodes..=max_nodes).contains(&initial),
        format!("initial node count {initial} must be between {min_nodes} and {max_nodes}"),
    );
    report
}

/// Non-empty and at most 63 characters.
pub fn validate_name(name: &str) -> ValidationReport {
    let mut report = ValidationReport::new();
    let check = format!("name:{name}");
    let len = name.chars().count();
    if name.is_empty() {
        report.fail(&check, "name should not be empty");
    } else {
        report.record(
            &check,
            len <= MAX_NAME_LEN,
            format!("{len} characters (maximum {MAX_NAME_LEN})"),
        );
    }
    report
}

pub fn validate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> ValidationReport {
    let mut report = ValidationReport::new();
    for name in names {
        report.merge(validate_name(name));
    }
    report
}

/// Every tag key and value is non-empty.
pub fn validate_tags(tags: &BTreeMap<String, String>) -> ValidationReport {
    let mut report = ValidationReport::new();
    for (key, value) in tags {
        report.record(
            &format!("tag:{key}"),
            !key.trim().is_empty() && !value.trim().is_empty(),
            format!("{key} = {value}"),
        );
    }
    info!(count = tags.len(), "validated tags");
    report
}

/// Parse `a.b.c.d/nn` (or an IPv6 equivalent) into address and prefix.
pub fn parse_cidr(cidr: &str) -> Option<(IpAddr, u8)> {
    let (addr, prefix) = cidr.split_once('/')?;
    let addr: IpAddr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    (prefix <= max).then_some((addr, prefix))
}

/// `vnet_cidr` is required and well-formed; `subnet_cidr` is checked when set.
pub fn validate_network(map: &ConfigMap) -> ValidationReport {
    info!(config = ?map, "validating network configuration");
    let mut report = require_fields(map, &["vnet_cidr"]);
    for key in ["vnet_cidr", "subnet_cidr"] {
        let check = format!("cidr:{key}");
        match map.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(cidr)) if cidr.trim().is_empty() => {}
            Some(Value::String(cidr)) => {
                report.record(&check, parse_cidr(cidr).is_some(), format!("{key} = {cidr}"))
            }
            Some(other) => report.fail(&check, format!("{key} = {other} is not a CIDR string")),
        }
    }
    report
}

/// At least `threshold` monitoring features enabled.
pub fn validate_monitoring(flags: &BTreeMap<String, bool>, threshold: usize) -> ValidationReport {
    for (feature, enabled) in flags {
        info!(%feature, enabled, "monitoring feature");
    }
    let enabled = flags.values().filter(|on| **on).count();

    let mut report = ValidationReport::new();
    report.record(
        "monitoring:enabled",
        enabled >= threshold,
        format!(
            "{enabled} out of {} monitoring features enabled (minimum {threshold})",
            flags.len()
        ),
    );
    report
}

/// Security settings are listed for the record; there is nothing to assert.
pub fn validate_security(settings: &[String]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for setting in settings {
        report.pass("security", setting.clone());
    }
    info!(count = settings.len(), "listed security settings");
    report
}

/// Every referenced module is one the repository ships.
pub fn validate_module_structure(modules: &[String]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for module in modules {
        report.record(
            &format!("module:{module}"),
            KNOWN_MODULES.contains(&module.as_str()),
            format!("module {module} configuration"),
        );
    }
    report
}

// ── Input document ────────────────────────────────────────────────────────────

/// Everything the validators look at, loadable from YAML.  Missing sections
/// fall back to the reference configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationInput {
    pub modules: Vec<String>,
    pub cluster: ConfigMap,
    pub names: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub network: ConfigMap,
    pub autoscaling: AutoscalingConfig,
    pub security: Vec<String>,
    pub monitoring: BTreeMap<String, bool>,
    pub monitoring_threshold: usize,
}

fn object(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => ConfigMap::new(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ValidationInput {
    fn default() -> Self {
        Self {
            modules: strings(&KNOWN_MODULES),
            cluster: object(json!({
                "cluster_name": "test-cluster",
                "location": "westeurope",
                "node_count": 3,
                "vm_size": "Standard_D2_v3",
            })),
            names: strings(&["test-cluster", "prod-aks-001", "dev-environment"]),
            tags: BTreeMap::from([
                ("Environment".to_string(), "Test".to_string()),
                ("ManagedBy".to_string(), "Terraform".to_string()),
                ("Purpose".to_string(), "UnitTest".to_string()),
                ("Team".to_string(), "DevOps".to_string()),
            ]),
            network: object(json!({
                "vnet_cidr": "10.0.0.0/16",
                "subnet_cidr": "10.0.1.0/24",
                "dns_prefix": "test-cluster",
                "network_mode": "transparent",
            })),
            autoscaling: AutoscalingConfig::default(),
            security: strings(&[
                "RBAC enabled",
                "Network policies configured",
                "Pod security policies active",
                "Secrets encryption enabled",
            ]),
            monitoring: BTreeMap::from([
                ("metrics_enabled".to_string(), true),
                ("logging_enabled".to_string(), true),
                ("alerts_configured".to_string(), true),
                ("dashboard_created".to_string(), false),
            ]),
            monitoring_threshold: DEFAULT_MONITORING_THRESHOLD,
        }
    }
}

impl ValidationInput {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

/// Run every validator over `input`.
pub fn validate_all(input: &ValidationInput) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.merge(validate_module_structure(&input.modules));
    report.merge(validate_cluster_config(&input.cluster));
    report.merge(validate_names(input.names.iter().map(String::as_str)));
    report.merge(validate_tags(&input.tags));
    report.merge(validate_network(&input.network));
    report.merge(validate_autoscaling(&input.autoscaling));
    report.merge(validate_security(&input.security));
    report.merge(validate_monitoring(
        &input.monitoring,
        input.monitoring_threshold,
    ));

    let failed = report.failures().count();
    info!(
        checks = report.outcomes.len(),
        failed, "configuration validation finished"
    );
    report
}

use rand::Rng;
use tracing::info;

use crate::error::{Error, Result};

/// Length of the random suffix embedded in every provisioned resource name.
pub const UNIQUE_ID_LEN: usize = 6;

/// Maximum length of an Azure / Kubernetes resource name.
pub const MAX_NAME_LEN: usize = 63;

/// Symbols a unique id is drawn from, each with equal weight.
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// ── Unique naming ─────────────────────────────────────────────────────────────

/// Generate a short random identifier used to isolate parallel runs that share
/// one cloud subscription.  Lowercase only, since Azure resource group and AKS
/// names end up in DNS labels.
pub fn unique_id() -> String {
    let mut rng = rand::thread_rng();
    (0..UNIQUE_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// `rg-test-<id>`: resource group for the full-stack scenario.
pub fn resource_group_name(id: &str) -> String {
    format!("rg-test-{id}")
}

/// `aks-test-<id>`: cluster name for the full-stack scenario.
pub fn cluster_name(id: &str) -> String {
    format!("aks-test-{id}")
}

/// `rg-aks-test-<id>`: resource group for the AKS-module scenario.
pub fn module_resource_group_name(id: &str) -> String {
    format!("rg-aks-test-{id}")
}

/// `aks-<id>`: cluster name for the AKS-module scenario.
pub fn module_cluster_name(id: &str) -> String {
    format!("aks-{id}")
}

// ── Assertion helpers ─────────────────────────────────────────────────────────

/// Fail with a validation error when `input` is empty or whitespace.
pub fn require_non_empty(input: &str, description: &str) -> Result<()> {
    if input.trim().is_empty() {
        return Err(Error::validation(format!("{description} should not be empty")));
    }
    Ok(())
}

/// Check that both a CPU and a memory limit were specified.
pub fn verify_resource_limits(expected_cpu: &str, expected_memory: &str) -> Result<()> {
    info!(cpu = %expected_cpu, memory = %expected_memory, "checking resource limits");
    require_non_empty(expected_cpu, "CPU limit")?;
    require_non_empty(expected_memory, "Memory limit")?;
    Ok(())
}

/// Informational log line, tagged so it stands out among kube/terraform noise.
pub fn log_test_info(message: &str) {
    info!(target: "reliability_infra::test_info", "Test Info: {message}");
}

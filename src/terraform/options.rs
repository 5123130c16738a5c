use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

/// Stderr fragments of transient provider / registry / network failures that
/// are worth re-running a Terraform command for.
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    "timeout while waiting for plugin to start",
    "timeout while waiting for state to become",
    "Failed to load state",
    "Failed to load backend",
    "could not query provider registry",
    "Error installing provider",
    "Failed to query available provider packages",
    "TLS handshake timeout",
    "connection reset by peer",
    "Client.Timeout exceeded while awaiting headers",
    "429 Too Many Requests",
    "net/http: request canceled",
];

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIME_BETWEEN_RETRIES: Duration = Duration::from_secs(5);

/// A provisioning request: everything Terraform needs for one working
/// directory.  Passed wholesale to every invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct TerraformOptions {
    pub terraform_dir: PathBuf,
    pub vars: BTreeMap<String, Value>,
    pub env_vars: BTreeMap<String, String>,
    pub plan_file_path: Option<PathBuf>,
    pub retryable_errors: Vec<String>,
    pub max_retries: u32,
    pub time_between_retries: Duration,
}

impl TerraformOptions {
    /// Options with no variables and no retries.
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            vars: BTreeMap::new(),
            env_vars: BTreeMap::new(),
            plan_file_path: None,
            retryable_errors: Vec::new(),
            max_retries: 0,
            time_between_retries: Duration::ZERO,
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_var(name, value);
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    pub fn plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file_path = Some(path.into());
        self
    }

    /// Install the stock table of transient errors, 3 retries 5 seconds apart.
    pub fn with_default_retryable_errors(mut self) -> Self {
        self.retryable_errors = DEFAULT_RETRYABLE_ERRORS
            .iter()
            .map(|s| s.to_string())
            .collect();
        self.max_retries = DEFAULT_MAX_RETRIES;
        self.time_between_retries = DEFAULT_TIME_BETWEEN_RETRIES;
        self
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn dir(&self) -> &Path {
        &self.terraform_dir
    }

    /// The retryable pattern matched by `stderr`, if any.
    pub fn retryable_match(&self, stderr: &str) -> Option<&str> {
        self.retryable_errors
            .iter()
            .map(String::as_str)
            .find(|pattern| stderr.contains(pattern))
    }

    /// `-var name=value` pairs in stable (sorted) order.
    pub fn var_args(&self) -> Vec<String> {
        self.vars
            .iter()
            .flat_map(|(name, value)| ["-var".to_string(), format!("{name}={}", hcl_value(value))])
            .collect()
    }
}

/// Render a variable value for the command line.  Scalars are written bare;
/// maps and lists are written as JSON, which Terraform parses as HCL.
pub fn hcl_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

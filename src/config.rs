//! Stack settings shared by the CLI and the live test suite.  Every field
//! can come from a flag or an environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::expectations::{ArgoCdBudgets, WaitBudget, SCALED_NODE_COUNT};
use crate::scaling::ConvergencePolicy;

pub const DEFAULT_LOCATION: &str = "westeurope";
pub const DEFAULT_KUBERNETES_VERSION: &str = "1.28.3";
pub const DEFAULT_NODE_VM_SIZE: &str = "Standard_B2s";
pub const DEFAULT_ARGOCD_CHART_VERSION: &str = "5.51.6";
pub const DEFAULT_GIT_REPO_URL: &str = "https://github.com/sixeyed/ps-sre3-demo2";
pub const DEFAULT_GIT_TARGET_REVISION: &str = "main";
pub const DEFAULT_ARGOCD_TEST_NAMESPACE: &str = "argocd-test";

#[derive(clap::Args, Clone, Debug, PartialEq)]
pub struct StackSettings {
    /// Root Terraform configuration for the full stack.
    #[arg(long, global = true, default_value = "terraform", env = "STACK_TERRAFORM_DIR")]
    pub stack_dir: PathBuf,

    /// Standalone AKS module.
    #[arg(long, global = true, default_value = "modules/aks", env = "AKS_MODULE_DIR")]
    pub aks_module_dir: PathBuf,

    /// Standalone ArgoCD module.
    #[arg(long, global = true, default_value = "modules/argocd", env = "ARGOCD_MODULE_DIR")]
    pub argocd_module_dir: PathBuf,

    /// Azure region for every provisioned resource.
    #[arg(long, global = true, default_value = DEFAULT_LOCATION, env = "AZURE_LOCATION")]
    pub location: String,

    #[arg(long, global = true, default_value = DEFAULT_KUBERNETES_VERSION, env = "KUBERNETES_VERSION")]
    pub kubernetes_version: String,

    #[arg(long, global = true, default_value = DEFAULT_NODE_VM_SIZE, env = "NODE_VM_SIZE")]
    pub node_vm_size: String,

    #[arg(long, global = true, default_value = DEFAULT_ARGOCD_CHART_VERSION, env = "ARGOCD_CHART_VERSION")]
    pub argocd_chart_version: String,

    /// Repository ArgoCD syncs from.
    #[arg(long, global = true, default_value = DEFAULT_GIT_REPO_URL, env = "GITOPS_REPO_URL")]
    pub git_repo_url: String,

    #[arg(long, global = true, default_value = DEFAULT_GIT_TARGET_REVISION, env = "GITOPS_TARGET_REVISION")]
    pub git_target_revision: String,

    /// Namespace the ArgoCD module is planned into.
    #[arg(long, global = true, default_value = DEFAULT_ARGOCD_TEST_NAMESPACE, env = "ARGOCD_TEST_NAMESPACE")]
    pub argocd_test_namespace: String,

    /// `node_count` requested by the scaling check.
    #[arg(long, global = true, default_value_t = SCALED_NODE_COUNT, env = "SCALED_NODE_COUNT")]
    pub scaled_node_count: i64,

    /// Seconds to wait for scaled nodes to register.
    #[arg(long, global = true, default_value_t = 60, env = "SCALE_TIMEOUT_SECS")]
    pub scale_timeout_secs: u64,

    /// Seconds between node-count polls while scaling.
    #[arg(long, global = true, default_value_t = 5, env = "SCALE_POLL_SECS")]
    pub scale_poll_secs: u64,

    /// Seconds between deployment availability polls.
    #[arg(long, global = true, default_value_t = 30, env = "DEPLOYMENT_POLL_SECS")]
    pub deployment_poll_secs: u64,
}

/// Wrapper so the settings can be read from the environment alone.
#[derive(Parser)]
struct EnvOnly {
    #[command(flatten)]
    settings: StackSettings,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            stack_dir: PathBuf::from("terraform"),
            aks_module_dir: PathBuf::from("modules/aks"),
            argocd_module_dir: PathBuf::from("modules/argocd"),
            location: DEFAULT_LOCATION.into(),
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.into(),
            node_vm_size: DEFAULT_NODE_VM_SIZE.into(),
            argocd_chart_version: DEFAULT_ARGOCD_CHART_VERSION.into(),
            git_repo_url: DEFAULT_GIT_REPO_URL.into(),
            git_target_revision: DEFAULT_GIT_TARGET_REVISION.into(),
            argocd_test_namespace: DEFAULT_ARGOCD_TEST_NAMESPACE.into(),
            scaled_node_count: SCALED_NODE_COUNT,
            scale_timeout_secs: 60,
            scale_poll_secs: 5,
            deployment_poll_secs: 30,
        }
    }
}

impl StackSettings {
    /// Defaults overridden by whichever environment variables are set.
    pub fn from_env() -> Self {
        EnvOnly::parse_from(["reliability-infra"]).settings
    }

    pub fn convergence(&self) -> ConvergencePolicy {
        ConvergencePolicy {
            timeout: Duration::from_secs(self.scale_timeout_secs),
            interval: Duration::from_secs(self.scale_poll_secs),
        }
    }

    pub fn argocd_budgets(&self) -> ArgoCdBudgets {
        let interval = Duration::from_secs(self.deployment_poll_secs);
        let defaults = ArgoCdBudgets::default();
        ArgoCdBudgets {
            server: WaitBudget::new(defaults.server.retries, interval),
            controllers: WaitBudget::new(defaults.controllers.retries, interval),
        }
    }
}

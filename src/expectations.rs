//! The expected topology of a healthy stack.

use std::time::Duration;

/// Namespaces the GitOps bootstrap must create.
pub const EXPECTED_NAMESPACES: [&str; 3] = ["reliability-demo", "argocd", "monitoring"];

/// Phase every expected namespace must report.
pub const NAMESPACE_ACTIVE: &str = "Active";

pub const ARGOCD_NAMESPACE: &str = "argocd";
pub const ARGOCD_SERVER: &str = "argocd-server";
pub const ARGOCD_APPLICATIONSET_CONTROLLER: &str = "argocd-applicationset-controller";
pub const ARGOCD_REPO_SERVER: &str = "argocd-repo-server";

/// The root application that fans out to every other ArgoCD application.
pub const APP_OF_APPS: &str = "app-of-apps";

pub const MIN_ARGOCD_SERVER_REPLICAS: i32 = 2;

/// Node count the cluster must report straight after the first apply.
pub const MIN_INITIAL_NODES: usize = 1;

/// `node_count` requested by the scaling check.
pub const SCALED_NODE_COUNT: i64 = 2;

/// A fixed-interval wait: `retries` attempts, `interval` apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitBudget {
    pub retries: u32,
    pub interval: Duration,
}

impl WaitBudget {
    pub const fn new(retries: u32, interval: Duration) -> Self {
        Self { retries, interval }
    }

    /// Worst-case wall time of the wait.
    pub fn total(&self) -> Duration {
        self.interval * self.retries.saturating_sub(1)
    }
}

/// How long to wait for each ArgoCD deployment to become available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgoCdBudgets {
    pub server: WaitBudget,
    pub controllers: WaitBudget,
}

impl Default for ArgoCdBudgets {
    fn default() -> Self {
        Self {
            server: WaitBudget::new(20, Duration::from_secs(30)),
            controllers: WaitBudget::new(10, Duration::from_secs(30)),
        }
    }
}

//! Cluster assertion layer.
//!
//! Mismatches against the expectation set are collected in an
//! [`AssertionReport`] so one run surfaces every problem at once.  Anything
//! that makes further checks meaningless (an object that cannot be fetched,
//! a deployment that never becomes available) is returned as an error
//! instead.

use std::fmt::{Debug, Display};

use tracing::{info, warn};

use crate::cluster::{wait_until_deployment_available, ClusterQuery};
use crate::error::{Error, Result};
use crate::expectations::{
    ArgoCdBudgets, APP_OF_APPS, ARGOCD_APPLICATIONSET_CONTROLLER, ARGOCD_NAMESPACE,
    ARGOCD_REPO_SERVER, ARGOCD_SERVER, EXPECTED_NAMESPACES, MIN_ARGOCD_SERVER_REPLICAS,
    NAMESPACE_ACTIVE,
};
use crate::helpers::verify_resource_limits;

/// Accumulates assertion outcomes for one scenario.
#[derive(Debug, Default)]
pub struct AssertionReport {
    checks: usize,
    failures: Vec<String>,
}

impl AssertionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check; `describe` is only evaluated on failure.
    pub fn check(&mut self, ok: bool, describe: impl FnOnce() -> String) -> bool {
        self.checks += 1;
        if !ok {
            let msg = describe();
            warn!(failure = %msg, "assertion failed");
            self.failures.push(msg);
        }
        ok
    }

    pub fn equal<T: PartialEq + Debug>(&mut self, what: &str, expected: T, actual: T) -> bool {
        let ok = expected == actual;
        self.check(ok, || {
            format!("{what}: expected {expected:?}, got {actual:?}")
        })
    }

    pub fn at_least<T: PartialOrd + Display>(&mut self, what: &str, actual: T, min: T) -> bool {
        let ok = actual >= min;
        self.check(ok, || format!("{what}: expected at least {min}, got {actual}"))
    }

    pub fn fail(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.check(false, || msg);
    }

    pub fn checks(&self) -> usize {
        self.checks
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            info!(checks = self.checks, "all assertions passed");
            Ok(())
        } else {
            Err(Error::Assertions(self.failures))
        }
    }
}

/// Every expected namespace exists under its own name and is `Active`.
pub async fn verify_namespaces<Q: ClusterQuery + ?Sized>(
    query: &Q,
    report: &mut AssertionReport,
) -> Result<()> {
    for expected in EXPECTED_NAMESPACES {
        let ns = query.get_namespace(expected).await?;
        let name = ns.metadata.name.as_deref().unwrap_or_default();
        let phase = ns
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or_default();

        report.equal(&format!("namespace {expected} name"), expected, name);
        report.equal(&format!("namespace {expected} phase"), NAMESPACE_ACTIVE, phase);
        info!(namespace = %expected, %phase, "namespace checked");
    }
    Ok(())
}

/// ArgoCD server is available, replicated and resource-bounded; the
/// applicationset controller and repo server are available.
pub async fn verify_argocd_deployment<Q: ClusterQuery + ?Sized>(
    query: &Q,
    report: &mut AssertionReport,
    budgets: &ArgoCdBudgets,
) -> Result<()> {
    info!(
        server_budget_secs = budgets.server.total().as_secs(),
        controller_budget_secs = budgets.controllers.total().as_secs(),
        "checking ArgoCD deployments"
    );
    let server = wait_until_deployment_available(
        query,
        ARGOCD_NAMESPACE,
        ARGOCD_SERVER,
        budgets.server.retries,
        budgets.server.interval,
    )
    .await?;

    let spec = server.spec.as_ref();
    let replicas = spec.and_then(|s| s.replicas).unwrap_or(1);
    report.at_least(
        "argocd-server replicas",
        replicas,
        MIN_ARGOCD_SERVER_REPLICAS,
    );

    let container = spec
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|pod| pod.containers.first());
    match container {
        Some(c) => {
            let resources = c.resources.as_ref();
            let limits = resources.and_then(|r| r.limits.as_ref());
            let requests = resources.and_then(|r| r.requests.as_ref());
            report.check(limits.is_some(), || {
                format!("argocd-server container {} has no resource limits", c.name)
            });
            report.check(requests.is_some(), || {
                format!("argocd-server container {} has no resource requests", c.name)
            });

            if let Some(limits) = limits {
                let cpu = limits.get("cpu").map(|q| q.0.as_str()).unwrap_or_default();
                let memory = limits.get("memory").map(|q| q.0.as_str()).unwrap_or_default();
                if let Err(e) = verify_resource_limits(cpu, memory) {
                    warn!(container = %c.name, %e, "incomplete resource limits");
                }
            }
        }
        None => report.fail("argocd-server pod template has no containers"),
    }

    for name in [ARGOCD_APPLICATIONSET_CONTROLLER, ARGOCD_REPO_SERVER] {
        wait_until_deployment_available(
            query,
            ARGOCD_NAMESPACE,
            name,
            budgets.controllers.retries,
            budgets.controllers.interval,
        )
        .await?;
    }
    Ok(())
}

/// If the root `app-of-apps` application can be read, it must be the one we
/// asked for.  Its absence is tolerated: the bootstrap may not have synced
/// it yet.
pub async fn verify_argocd_applications<Q: ClusterQuery + ?Sized>(
    query: &Q,
    report: &mut AssertionReport,
) -> Result<()> {
    match query.get_application(ARGOCD_NAMESPACE, APP_OF_APPS).await {
        Ok(app) => {
            let name = app.metadata.name.as_deref().unwrap_or_default();
            report.equal("root application name", APP_OF_APPS, name);
            info!(
                application = %name,
                sync = %app.sync_status(),
                health = %app.health_status(),
                "root application found"
            );
        }
        Err(e) => info!(application = APP_OF_APPS, %e, "root application not readable, skipping"),
    }
    Ok(())
}

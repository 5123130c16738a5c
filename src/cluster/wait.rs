use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::poll::retry_fixed;

use super::ClusterQuery;

/// A Deployment is available when its `Available` condition is `True`.  If
/// the controller has not posted conditions yet, fall back to comparing
/// ready replicas with the desired count.
pub fn deployment_available(deployment: &Deployment) -> bool {
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };

    if let Some(cond) = status
        .conditions
        .iter()
        .flatten()
        .find(|c| c.type_ == "Available")
    {
        return cond.status == "True";
    }

    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    status.ready_replicas.unwrap_or(0) >= desired
}

/// Poll a Deployment `retries` times, `interval` apart, until it is
/// available.  Lookup errors (not created yet, API hiccup) count as "not yet".
pub async fn wait_until_deployment_available<Q: ClusterQuery + ?Sized>(
    query: &Q,
    namespace: &str,
    name: &str,
    retries: u32,
    interval: Duration,
) -> Result<Deployment> {
    info!(%namespace, %name, retries, interval_secs = interval.as_secs(), "waiting for deployment");

    let found = retry_fixed(retries, interval, |attempt| async move {
        match query.get_deployment(namespace, name).await {
            Ok(d) if deployment_available(&d) => Some(d),
            Ok(_) => {
                debug!(%namespace, %name, attempt, "deployment not yet available");
                None
            }
            Err(e) => {
                debug!(%namespace, %name, attempt, %e, "deployment lookup failed");
                None
            }
        }
    })
    .await;

    found.ok_or_else(|| {
        Error::timeout(format!(
            "deployment {namespace}/{name} not available after {retries} retries"
        ))
    })
}

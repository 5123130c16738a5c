//! Node scaling verification: bump `node_count`, re-apply, and poll the
//! cluster until the new nodes have registered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::assertions::AssertionReport;
use crate::cluster::ClusterQuery;
use crate::error::{Error, Result};
use crate::expectations::MIN_INITIAL_NODES;
use crate::poll::wait_for;
use crate::terraform::{TerraformOptions, TerraformRunner};

/// How long to wait for a scale-up to show in the node list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvergencePolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(5),
        }
    }
}

/// Record the node count, apply `options` with `node_count = target`, then
/// poll until at least `target` nodes are listed or the policy's budget runs
/// out.  A budget overrun is an assertion failure, not an error.  A target
/// that would not grow the cluster is rejected before anything is applied.
///
/// Returns the request as applied, with the new `node_count`.
pub async fn verify_node_scaling<R, Q>(
    runner: &R,
    query: &Q,
    options: &TerraformOptions,
    target: i64,
    policy: ConvergencePolicy,
    report: &mut AssertionReport,
) -> Result<TerraformOptions>
where
    R: TerraformRunner + ?Sized,
    Q: ClusterQuery + ?Sized,
{
    let initial = query.list_nodes().await?.len();
    info!(nodes = initial, "initial node count");
    report.at_least("initial node count", initial, MIN_INITIAL_NODES);

    let wanted = match usize::try_from(target) {
        Ok(wanted) if wanted >= 1 && wanted > initial => wanted,
        _ => {
            return Err(Error::config(format!(
                "scale-up target {target} must be at least 1 and above the current {initial} nodes"
            )))
        }
    };

    let mut scaled = options.clone();
    scaled.set_var("node_count", target);
    runner.apply(&scaled).await?;

    let last_seen = AtomicUsize::new(initial);
    let converged = wait_for(policy.timeout, policy.interval, || {
        let last_seen = &last_seen;
        async move {
            match query.list_nodes().await {
                Ok(nodes) => {
                    last_seen.store(nodes.len(), Ordering::SeqCst);
                    nodes.len() >= wanted
                }
                Err(e) => {
                    warn!(%e, "listing nodes failed while waiting for scale-up");
                    false
                }
            }
        }
    })
    .await;

    let observed = last_seen.load(Ordering::SeqCst);
    info!(nodes = observed, target, converged, "node count after scale-up");
    report.at_least("node count after scale-up", observed, wanted);

    Ok(scaled)
}

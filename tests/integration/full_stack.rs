use reliability_infra::scenarios::full_stack;

use crate::common::live;

/// Cluster plus ArgoCD bootstrap: namespaces, ArgoCD server, root
/// application and a node scale-up, then destroy.
#[tokio::test]
#[ignore = "provisions a real AKS cluster"]
async fn full_stack_comes_up_healthy_and_scales() {
    let run = live();
    full_stack(&run.terraform, &run.commands, &run.settings, &run.id)
        .await
        .unwrap();
}

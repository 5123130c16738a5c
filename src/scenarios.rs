//! End-to-end scenarios: build a provisioning request, apply it, assert on
//! what came up, tear it down.

use serde_json::json;
use tracing::{info, warn};

use crate::assertions::{
    verify_argocd_applications, verify_argocd_deployment, verify_namespaces, AssertionReport,
};
use crate::azure::{create_resource_group, delete_resource_group};
use crate::cluster::{run_kubectl, ClusterHandle, ClusterQuery};
use crate::command::CommandRunner;
use crate::config::StackSettings;
use crate::error::Result;
use crate::helpers::{
    cluster_name, log_test_info, module_cluster_name, module_resource_group_name,
    require_non_empty, resource_group_name,
};
use crate::scaling::verify_node_scaling;
use crate::terraform::{init_and_apply, init_and_plan, with_teardown, TerraformOptions, TerraformRunner};

pub const KUBE_CONFIG_OUTPUT: &str = "kube_config";
pub const CLUSTER_ID_OUTPUT: &str = "cluster_id";
pub const CLUSTER_NAME_OUTPUT: &str = "cluster_name";
pub const PLAN_FILE: &str = "terraform.tfplan";

// ── Provisioning requests ────────────────────────────────────────────────────

/// Whole stack: AKS cluster plus the ArgoCD bootstrap, on one small node.
pub fn full_stack_options(settings: &StackSettings, id: &str) -> TerraformOptions {
    TerraformOptions::new(&settings.stack_dir)
        .var("resource_group_name", resource_group_name(id))
        .var("cluster_name", cluster_name(id))
        .var("location", settings.location.as_str())
        .var("kubernetes_version", settings.kubernetes_version.as_str())
        .var("node_count", 1)
        .var("min_node_count", 1)
        .var("max_node_count", 3)
        .var("node_vm_size", settings.node_vm_size.as_str())
        .var(
            "tags",
            json!({
                "Environment": "Test",
                "TestID": id,
                "ManagedBy": "Terratest",
            }),
        )
        .env("ARM_SKIP_PROVIDER_REGISTRATION", "true")
        .with_default_retryable_errors()
}

/// AKS module on its own, autoscaling off.  The resource group is created
/// outside Terraform.
pub fn aks_module_options(settings: &StackSettings, id: &str) -> TerraformOptions {
    TerraformOptions::new(&settings.aks_module_dir)
        .var("cluster_name", module_cluster_name(id))
        .var("resource_group_name", module_resource_group_name(id))
        .var("location", settings.location.as_str())
        .var("kubernetes_version", settings.kubernetes_version.as_str())
        .var("node_count", 1)
        .var("node_vm_size", settings.node_vm_size.as_str())
        .var("enable_auto_scaling", false)
        .var("tags", json!({ "TestID": id }))
        .with_default_retryable_errors()
}

/// ArgoCD module, planned only: there is no cluster to install into.
pub fn argocd_plan_options(settings: &StackSettings) -> TerraformOptions {
    TerraformOptions::new(&settings.argocd_module_dir)
        .var("namespace", settings.argocd_test_namespace.as_str())
        .var("argocd_chart_version", settings.argocd_chart_version.as_str())
        .var("git_repo_url", settings.git_repo_url.as_str())
        .var("git_target_revision", settings.git_target_revision.as_str())
        .plan_file(PLAN_FILE)
        .with_default_retryable_errors()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

/// Assertions run against a provisioned stack.  Returns the request as last
/// applied (scaled).
pub async fn verify_stack<R, Q>(
    runner: &R,
    query: &Q,
    options: &TerraformOptions,
    settings: &StackSettings,
    report: &mut AssertionReport,
) -> Result<TerraformOptions>
where
    R: TerraformRunner + ?Sized,
    Q: ClusterQuery + ?Sized,
{
    let version = query.server_version().await?;
    info!(%version, "cluster reachable");

    verify_namespaces(query, report).await?;
    verify_argocd_deployment(query, report, &settings.argocd_budgets()).await?;
    verify_argocd_applications(query, report).await?;
    verify_node_scaling(
        runner,
        query,
        options,
        settings.scaled_node_count,
        settings.convergence(),
        report,
    )
    .await
}

/// Provision the full stack, verify it, destroy it.
pub async fn full_stack<R, C>(
    runner: &R,
    commands: &C,
    settings: &StackSettings,
    id: &str,
) -> Result<()>
where
    R: TerraformRunner + ?Sized,
    C: CommandRunner + ?Sized,
{
    let options = full_stack_options(settings, id);
    log_test_info(&format!("full stack {id} in {}", options.dir().display()));

    with_teardown(runner, &options, async {
        init_and_apply(runner, &options).await?;

        let kubeconfig = runner.output(&options, KUBE_CONFIG_OUTPUT).await?;
        require_non_empty(&kubeconfig, "kube_config output")?;
        let cluster = ClusterHandle::from_kubeconfig(&kubeconfig).await?;
        run_kubectl(commands, &cluster.kubectl_options("default"), &["cluster-info"]).await?;

        let mut report = AssertionReport::new();
        verify_stack(runner, &cluster, &options, settings, &mut report).await?;
        report.into_result()
    })
    .await
}

/// Apply the AKS module into a pre-created resource group and check its
/// outputs.  The resource group is deleted after Terraform teardown.
pub async fn aks_module_only<R, C>(
    runner: &R,
    commands: &C,
    settings: &StackSettings,
    id: &str,
) -> Result<()>
where
    R: TerraformRunner + ?Sized,
    C: CommandRunner + ?Sized,
{
    let options = aks_module_options(settings, id);
    let resource_group = module_resource_group_name(id);
    let expected_name = module_cluster_name(id);
    log_test_info(&format!("AKS module {id} in {}", options.dir().display()));

    let outcome = with_teardown(runner, &options, async {
        create_resource_group(commands, &resource_group, &settings.location).await?;
        init_and_apply(runner, &options).await?;

        let mut report = AssertionReport::new();
        let cluster_id = runner.output(&options, CLUSTER_ID_OUTPUT).await?;
        report.check(!cluster_id.is_empty(), || "cluster_id output is empty".into());
        let name = runner.output(&options, CLUSTER_NAME_OUTPUT).await?;
        report.equal("cluster_name output", expected_name.as_str(), name.as_str());
        report.into_result()
    })
    .await;

    if let Err(e) = delete_resource_group(commands, &resource_group).await {
        warn!(%resource_group, %e, "resource group cleanup failed");
    }
    outcome
}

/// Init and plan the ArgoCD module; success means the plan was written.
pub async fn argocd_module_plan<R>(runner: &R, settings: &StackSettings) -> Result<()>
where
    R: TerraformRunner + ?Sized,
{
    let options = argocd_plan_options(settings);
    log_test_info(&format!("ArgoCD module plan in {}", options.dir().display()));
    init_and_plan(runner, &options).await
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{Namespace, NamespaceStatus, Node};
    use kube::api::ObjectMeta;
    use mockall::predicate::{always, eq, function};
    use mockall::Sequence;

    use super::*;
    use crate::cluster::MockClusterQuery;
    use crate::command::{CommandOutput, CommandSpec, MockCommandRunner};
    use crate::error::Error;
    use crate::terraform::MockTerraformRunner;

    fn settings() -> StackSettings {
        StackSettings {
            scale_timeout_secs: 10,
            scale_poll_secs: 1,
            deployment_poll_secs: 1,
            ..Default::default()
        }
    }

    fn ok_output() -> CommandOutput {
        CommandOutput {
            success: true,
            ..Default::default()
        }
    }

    #[test]
    fn full_stack_request_embeds_unique_names() {
        let opts = full_stack_options(&settings(), "abc123");
        assert_eq!(opts.vars["resource_group_name"], json!("rg-test-abc123"));
        assert_eq!(opts.vars["cluster_name"], json!("aks-test-abc123"));
        assert_eq!(opts.vars["node_count"], json!(1));
        assert_eq!(opts.vars["tags"]["TestID"], json!("abc123"));
        assert_eq!(opts.env_vars["ARM_SKIP_PROVIDER_REGISTRATION"], "true");
        assert_eq!(opts.max_retries, 3);
    }

    #[test]
    fn argocd_plan_request_writes_plan_file() {
        let opts = argocd_plan_options(&settings());
        assert_eq!(opts.plan_file_path.as_deref(), Some(std::path::Path::new(PLAN_FILE)));
        assert_eq!(opts.vars["namespace"], json!("argocd-test"));
        assert_eq!(opts.vars["argocd_chart_version"], json!("5.51.6"));
    }

    #[tokio::test]
    async fn aks_module_checks_outputs_then_cleans_up() {
        let mut seq = Sequence::new();
        let mut tf = MockTerraformRunner::new();
        let mut az = MockCommandRunner::new();

        az.expect_run()
            .with(function(|s: &CommandSpec| s.args.get(1).map(String::as_str) == Some("create")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_output()));
        tf.expect_init().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        tf.expect_apply().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        tf.expect_output()
            .with(always(), eq(CLUSTER_ID_OUTPUT))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("/subscriptions/1/aks-xyz".into()));
        tf.expect_output()
            .with(always(), eq(CLUSTER_NAME_OUTPUT))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("aks-xyz".into()));
        tf.expect_destroy().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        az.expect_run()
            .with(function(|s: &CommandSpec| s.args.get(1).map(String::as_str) == Some("delete")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_output()));

        aks_module_only(&tf, &az, &settings(), "xyz").await.unwrap();
    }

    #[tokio::test]
    async fn aks_module_wrong_cluster_name_fails_but_still_tears_down() {
        let mut tf = MockTerraformRunner::new();
        let mut az = MockCommandRunner::new();
        az.expect_run().times(2).returning(|_| Ok(ok_output()));
        tf.expect_init().returning(|_| Ok(()));
        tf.expect_apply().returning(|_| Ok(()));
        tf.expect_output().returning(|_, name| {
            Ok(match name {
                CLUSTER_ID_OUTPUT => "/subscriptions/1/aks-other".into(),
                _ => "aks-other".into(),
            })
        });
        tf.expect_destroy().times(1).returning(|_| Ok(()));

        let err = aks_module_only(&tf, &az, &settings(), "xyz").await.unwrap_err();
        match err {
            Error::Assertions(failures) => {
                assert_eq!(
                    failures,
                    [r#"cluster_name output: expected "aks-xyz", got "aks-other""#]
                );
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[tokio::test]
    async fn full_stack_destroys_when_apply_fails() {
        let mut tf = MockTerraformRunner::new();
        let az = MockCommandRunner::new();
        tf.expect_init().returning(|_| Ok(()));
        tf.expect_apply().returning(|_| {
            Err(Error::Terraform {
                command: "apply".into(),
                stderr: "AuthorizationFailed".into(),
            })
        });
        tf.expect_output().never();
        tf.expect_destroy().times(1).returning(|_| Ok(()));

        let err = full_stack(&tf, &az, &settings(), "abc").await.unwrap_err();
        assert!(err.to_string().contains("AuthorizationFailed"));
    }

    #[tokio::test]
    async fn full_stack_empty_kubeconfig_is_hard_failure() {
        let mut tf = MockTerraformRunner::new();
        let az = MockCommandRunner::new();
        tf.expect_init().returning(|_| Ok(()));
        tf.expect_apply().returning(|_| Ok(()));
        tf.expect_output()
            .with(always(), eq(KUBE_CONFIG_OUTPUT))
            .returning(|_, _| Ok(String::new()));
        tf.expect_destroy().times(1).returning(|_| Ok(()));

        let err = full_stack(&tf, &az, &settings(), "abc").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn argocd_plan_runs_init_then_plan() {
        let mut seq = Sequence::new();
        let mut tf = MockTerraformRunner::new();
        tf.expect_init().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
        tf.expect_plan()
            .with(function(|o: &TerraformOptions| o.plan_file_path.is_some()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        tf.expect_destroy().never();

        argocd_module_plan(&tf, &settings()).await.unwrap();
    }

    fn healthy_deployment() -> Deployment {
        Deployment {
            spec: Some(DeploymentSpec {
                replicas: Some(2),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                ready_replicas: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn verify_stack_collects_failures_across_checks() {
        let mut tf = MockTerraformRunner::new();
        tf.expect_apply().times(1).returning(|_| Ok(()));

        let mut query = MockClusterQuery::new();
        query
            .expect_server_version()
            .returning(|| Ok("v1.28.3".into()));
        query.expect_get_namespace().returning(|name| {
            Ok(Namespace {
                metadata: ObjectMeta {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
                status: Some(NamespaceStatus {
                    phase: Some("Active".into()),
                    ..Default::default()
                }),
                ..Default::default()
            })
        });
        // No pod template: the container check fails, replicas pass.
        query
            .expect_get_deployment()
            .returning(|_, _| Ok(healthy_deployment()));
        query
            .expect_get_application()
            .returning(|ns, name| Err(Error::NotFound(format!("application {ns}/{name}"))));
        // Scale-up never lands.
        query
            .expect_list_nodes()
            .returning(|| Ok(vec![Node::default()]));

        let mut report = AssertionReport::new();
        let opts = full_stack_options(&settings(), "abc");
        let scaled = verify_stack(&tf, &query, &opts, &settings(), &mut report)
            .await
            .unwrap();

        assert_eq!(scaled.vars["node_count"], json!(2));
        assert_eq!(
            report.failures(),
            [
                "argocd-server pod template has no containers",
                "node count after scale-up: expected at least 2, got 1",
            ]
        );
    }
}

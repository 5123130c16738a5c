//! reliability-infra: provision, verify and tear down the AKS + ArgoCD
//! reliability stack, or validate its configuration offline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use reliability_infra::assertions::{
    verify_argocd_applications, verify_argocd_deployment, verify_namespaces, AssertionReport,
};
use reliability_infra::cluster::{ClusterHandle, ClusterQuery};
use reliability_infra::command::ProcessRunner;
use reliability_infra::config::StackSettings;
use reliability_infra::helpers::unique_id;
use reliability_infra::scenarios;
use reliability_infra::terraform::TerraformCli;
use reliability_infra::validate::{validate_all, ValidationInput};

#[derive(Parser, Debug)]
#[command(
    name = "reliability-infra",
    about = "Provisioning and verification harness for the AKS + ArgoCD stack"
)]
struct Args {
    #[command(flatten)]
    settings: StackSettings,

    /// Log format: "text" for human-readable, "json" for structured.
    #[arg(long, default_value = "text", env = "LOG_FORMAT", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the configuration validators over a YAML file, or over the
    /// built-in fixtures when no file is given.
    Validate {
        #[arg(long)]
        file: Option<PathBuf>,

        /// Print every check outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run the cluster assertions against an already provisioned stack.
    Verify {
        #[arg(long, env = "KUBECONFIG_PATH")]
        kubeconfig: PathBuf,
    },
    /// Provision the full stack, verify it, destroy it.
    FullStack,
    /// Apply the standalone AKS module and check its outputs.
    AksModule,
    /// Init and plan the standalone ArgoCD module.
    ArgocdPlan,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,kube=warn,hyper=warn,tower=warn".into());

    if args.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let settings = args.settings;
    let terraform = TerraformCli::new();
    let commands = ProcessRunner;

    match args.command {
        Command::Validate { file, json } => {
            let input = match &file {
                Some(path) => ValidationInput::from_file(path)?,
                None => ValidationInput::default(),
            };
            let report = validate_all(&input);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            report.into_result()?;
        }
        Command::Verify { kubeconfig } => {
            let text = tokio::fs::read_to_string(&kubeconfig).await?;
            let cluster = ClusterHandle::from_kubeconfig(&text).await?;
            let version = cluster.server_version().await?;
            info!(%version, path = %kubeconfig.display(), "verifying existing cluster");

            let mut report = AssertionReport::new();
            verify_namespaces(&cluster, &mut report).await?;
            verify_argocd_deployment(&cluster, &mut report, &settings.argocd_budgets()).await?;
            verify_argocd_applications(&cluster, &mut report).await?;
            info!(checks = report.checks(), failed = report.failures().len(), "verification finished");
            report.into_result()?;
        }
        Command::FullStack => {
            let id = unique_id();
            info!(%id, "starting full stack run");
            scenarios::full_stack(&terraform, &commands, &settings, &id).await?;
        }
        Command::AksModule => {
            let id = unique_id();
            info!(%id, "starting AKS module run");
            scenarios::aks_module_only(&terraform, &commands, &settings, &id).await?;
        }
        Command::ArgocdPlan => {
            scenarios::argocd_module_plan(&terraform, &settings).await?;
        }
    }

    Ok(())
}

use std::path::PathBuf;

use crate::command::{CommandRunner, CommandSpec};
use crate::error::Result;

/// Where `kubectl` should point: an optional context, kubeconfig file and
/// namespace.  All unset means kubectl's own defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KubectlOptions {
    pub context: Option<String>,
    pub config_path: Option<PathBuf>,
    pub namespace: Option<String>,
}

impl KubectlOptions {
    pub fn new(
        context: Option<String>,
        config_path: Option<PathBuf>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            context,
            config_path,
            namespace,
        }
    }

    pub fn with_namespace(&self, namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..self.clone()
        }
    }

    fn spec(&self, args: &[&str]) -> CommandSpec {
        let mut spec = CommandSpec::new("kubectl");
        if let Some(context) = &self.context {
            spec = spec.arg("--context").arg(context);
        }
        if let Some(path) = &self.config_path {
            spec = spec.arg("--kubeconfig").arg(path.display().to_string());
        }
        if let Some(ns) = &self.namespace {
            spec = spec.arg("--namespace").arg(ns);
        }
        spec.args(args.iter().copied())
    }
}

/// Run kubectl and return trimmed stdout; a non-zero exit is an error
/// carrying kubectl's stderr.
pub async fn run_kubectl_and_get_output<C: CommandRunner + ?Sized>(
    runner: &C,
    options: &KubectlOptions,
    args: &[&str],
) -> Result<String> {
    let spec = options.spec(args);
    let stdout = runner.run(&spec).await?.into_result(&spec)?;
    Ok(stdout.trim().to_string())
}

pub async fn run_kubectl<C: CommandRunner + ?Sized>(
    runner: &C,
    options: &KubectlOptions,
    args: &[&str],
) -> Result<()> {
    run_kubectl_and_get_output(runner, options, args)
        .await
        .map(drop)
}

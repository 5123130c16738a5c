use async_trait::async_trait;
use tracing::{info, warn};

use crate::command::{CommandRunner, CommandSpec, ProcessRunner};
use crate::error::{Error, Result};

use super::{TerraformOptions, TerraformRunner};

/// [`TerraformRunner`] that shells out to the `terraform` binary.
pub struct TerraformCli<C: CommandRunner = ProcessRunner> {
    runner: C,
    binary: String,
}

impl TerraformCli<ProcessRunner> {
    pub fn new() -> Self {
        Self::with_runner(ProcessRunner)
    }
}

impl Default for TerraformCli<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CommandRunner> TerraformCli<C> {
    pub fn with_runner(runner: C) -> Self {
        Self {
            runner,
            binary: "terraform".to_string(),
        }
    }

    /// Use a differently named binary (e.g. `tofu`).
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    fn spec(&self, options: &TerraformOptions, args: Vec<String>) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .args(args)
            .cwd(options.dir())
            .envs(&options.env_vars)
    }

    /// Run one subcommand, re-running it while stderr matches a retryable
    /// pattern and the retry budget lasts.  Returns stdout.
    async fn run(&self, options: &TerraformOptions, args: Vec<String>) -> Result<String> {
        let command = args.first().cloned().unwrap_or_default();
        let spec = self.spec(options, args);
        let mut attempt = 0u32;

        loop {
            info!(command = %spec.display(), dir = %options.dir().display(), attempt, "running terraform");
            let output = self.runner.run(&spec).await?;
            if output.success {
                return Ok(output.stdout);
            }

            match options.retryable_match(&output.stderr) {
                Some(pattern) if attempt < options.max_retries => {
                    attempt += 1;
                    warn!(
                        %command,
                        %pattern,
                        attempt,
                        max_retries = options.max_retries,
                        "retryable terraform error, retrying"
                    );
                    tokio::time::sleep(options.time_between_retries).await;
                }
                _ => {
                    return Err(Error::Terraform {
                        command,
                        stderr: output.stderr,
                    })
                }
            }
        }
    }
}

fn base_args(command: &str, extra: &[&str]) -> Vec<String> {
    std::iter::once(command)
        .chain(extra.iter().copied())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl<C: CommandRunner> TerraformRunner for TerraformCli<C> {
    async fn init(&self, options: &TerraformOptions) -> Result<()> {
        let args = base_args("init", &["-input=false", "-no-color", "-upgrade=false"]);
        self.run(options, args).await.map(drop)
    }

    async fn apply(&self, options: &TerraformOptions) -> Result<()> {
        let mut args = base_args("apply", &["-input=false", "-auto-approve", "-no-color"]);
        args.extend(options.var_args());
        self.run(options, args).await.map(drop)
    }

    async fn plan(&self, options: &TerraformOptions) -> Result<()> {
        let mut args = base_args("plan", &["-input=false", "-lock=false", "-no-color"]);
        args.extend(options.var_args());
        if let Some(path) = &options.plan_file_path {
            args.push(format!("-out={}", path.display()));
        }
        self.run(options, args).await.map(drop)
    }

    async fn destroy(&self, options: &TerraformOptions) -> Result<()> {
        let mut args = base_args("destroy", &["-input=false", "-auto-approve", "-no-color"]);
        args.extend(options.var_args());
        self.run(options, args).await.map(drop)
    }

    async fn output(&self, options: &TerraformOptions, name: &str) -> Result<String> {
        let args = base_args("output", &["-no-color", "-raw", name]);
        let stdout = self.run(options, args).await?;
        Ok(stdout.trim().to_string())
    }
}

//! Provisioning driver.
//!
//! [`TerraformRunner`] is the seam between scenario code and the Terraform
//! CLI.  [`TerraformCli`] shells out; tests use the generated mock.
//! [`with_teardown`] guarantees `destroy` is attempted once a scenario body
//! finishes, whether it returned an error or panicked.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

use crate::error::Result;

mod cli;
mod options;

pub use cli::TerraformCli;
pub use options::{
    hcl_value, TerraformOptions, DEFAULT_MAX_RETRIES, DEFAULT_RETRYABLE_ERRORS,
    DEFAULT_TIME_BETWEEN_RETRIES,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TerraformRunner: Send + Sync {
    async fn init(&self, options: &TerraformOptions) -> Result<()>;

    async fn apply(&self, options: &TerraformOptions) -> Result<()>;

    async fn plan(&self, options: &TerraformOptions) -> Result<()>;

    async fn destroy(&self, options: &TerraformOptions) -> Result<()>;

    /// Value of a named output, trimmed.  May be empty.
    async fn output(&self, options: &TerraformOptions, name: &str) -> Result<String>;
}

pub async fn init_and_apply<R: TerraformRunner + ?Sized>(
    runner: &R,
    options: &TerraformOptions,
) -> Result<()> {
    runner.init(options).await?;
    runner.apply(options).await
}

pub async fn init_and_plan<R: TerraformRunner + ?Sized>(
    runner: &R,
    options: &TerraformOptions,
) -> Result<()> {
    runner.init(options).await?;
    runner.plan(options).await
}

/// Run `body`, then always run `destroy` for `options`.
///
/// A destroy failure is logged and does not replace the body's result.  If
/// the body panicked (a failed `assert!` in a test), the panic is resumed
/// after teardown.
pub async fn with_teardown<R, Fut, T>(
    runner: &R,
    options: &TerraformOptions,
    body: Fut,
) -> Result<T>
where
    R: TerraformRunner + ?Sized,
    Fut: Future<Output = Result<T>>,
{
    let outcome = AssertUnwindSafe(body).catch_unwind().await;

    info!(dir = %options.dir().display(), "tearing down");
    if let Err(e) = runner.destroy(options).await {
        warn!(dir = %options.dir().display(), %e, "terraform destroy failed; resources may leak");
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

//! Shared setup for the live suite.
//!
//! Runs can overlap with other runs in the same subscription; isolation
//! relies on the random id each test embeds in its resource names.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

use reliability_infra::command::ProcessRunner;
use reliability_infra::config::StackSettings;
use reliability_infra::helpers::unique_id;
use reliability_infra::terraform::TerraformCli;

static TRACING: Once = Once::new();

/// Everything a scenario needs to run against the real tools.
pub struct Live {
    pub id: String,
    pub settings: StackSettings,
    pub terraform: TerraformCli,
    pub commands: ProcessRunner,
}

/// Initialise logging once per test binary and build a fresh run context.
pub fn live() -> Live {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn,reliability_infra=info")),
            )
            .with_test_writer()
            .try_init();
    });

    Live {
        id: unique_id(),
        settings: StackSettings::from_env(),
        terraform: TerraformCli::new(),
        commands: ProcessRunner,
    }
}

//! Azure resource group management for scenarios whose Terraform module
//! expects the group to exist already.

use tracing::info;

use crate::command::{CommandRunner, CommandSpec};
use crate::error::Result;

pub fn create_resource_group_command(name: &str, location: &str) -> CommandSpec {
    CommandSpec::new("az").args(["group", "create", "--name", name, "--location", location])
}

/// Deletion is fire-and-forget on the Azure side (`--no-wait`).
pub fn delete_resource_group_command(name: &str) -> CommandSpec {
    CommandSpec::new("az").args(["group", "delete", "--name", name, "--yes", "--no-wait"])
}

pub async fn create_resource_group<C: CommandRunner + ?Sized>(
    runner: &C,
    name: &str,
    location: &str,
) -> Result<()> {
    let spec = create_resource_group_command(name, location);
    runner.run(&spec).await?.into_result(&spec)?;
    info!(resource_group = %name, %location, "created resource group");
    Ok(())
}

pub async fn delete_resource_group<C: CommandRunner + ?Sized>(runner: &C, name: &str) -> Result<()> {
    let spec = delete_resource_group_command(name);
    runner.run(&spec).await?.into_result(&spec)?;
    info!(resource_group = %name, "requested resource group deletion");
    Ok(())
}

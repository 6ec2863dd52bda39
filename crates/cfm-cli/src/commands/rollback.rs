//! Rollback command implementation

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, RollbackArgs};
use crate::context::RuntimeContext;

/// Execute the rollback command
pub async fn execute(args: &RollbackArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let migrator = ctx.migrator(global)?;

    let reverted = migrator
        .rollback(args.steps)
        .await
        .context("Rollback failed")?;

    let version = migrator.current_version().await?;
    println!("Reverted {reverted} migration(s), now at version {version}");
    Ok(())
}

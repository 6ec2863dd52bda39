//! Up command implementation

use anyhow::{Context, Result};

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the up command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let migrator = ctx.migrator(global)?;

    let applied = migrator
        .up_to_latest()
        .await
        .context("Migration run failed")?;

    if applied == 0 {
        println!("Database is up to date");
    } else {
        let version = migrator.current_version().await?;
        println!("Applied {applied} migration(s), now at version {version}");
    }
    Ok(())
}

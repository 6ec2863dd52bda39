//! Version command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the version command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let migrator = ctx.migrator(global)?;
    println!("{}", migrator.current_version().await?);
    Ok(())
}

//! New command implementation

use anyhow::{bail, Context, Result};
use cfm_core::parse_source_name;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;

use crate::cli::{GlobalArgs, NewArgs};
use crate::context::RuntimeContext;

const TEMPLATE: &str = "-- migrate:up\n\n\n-- migrate:down\n\n";

/// Execute the new command
pub async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let extension = ctx.config.extension();

    let version = Utc::now().format("%Y%m%d%H%M%S");
    let file_name = format!("{version}_{}.{extension}", args.name);
    if let Err(e) = parse_source_name(&file_name, extension) {
        bail!("Invalid migration name '{}': {e}", args.name);
    }

    let dir = ctx.migrations_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(&file_name);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(TEMPLATE.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    Ok(())
}

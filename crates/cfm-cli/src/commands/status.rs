//! Status command implementation

use anyhow::{Context, Result};
use cfm_migrate::MigrationStatus;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::context::RuntimeContext;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let migrator = ctx.migrator(global)?;
    let entries = migrator
        .status()
        .await
        .context("Failed to read migration status")?;

    match args.output {
        StatusOutput::Table => print_table(&entries),
        StatusOutput::Json => print_json(&entries)?,
    }
    Ok(())
}

/// Migration state for JSON output
#[derive(Debug, serde::Serialize)]
struct StatusRow<'a> {
    version: u64,
    name: &'a str,
    script: &'a str,
    state: &'static str,
}

fn state_label(applied: bool) -> &'static str {
    if applied {
        "applied"
    } else {
        "pending"
    }
}

fn print_table(entries: &[MigrationStatus]) {
    if entries.is_empty() {
        println!("No migrations found");
        return;
    }

    let version_width = entries
        .iter()
        .map(|e| e.version.to_string().len())
        .max()
        .unwrap_or(7)
        .max(7);
    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<version_width$}  {:<name_width$}  STATE",
        "VERSION", "NAME"
    );
    println!("{:-<version_width$}  {:-<name_width$}  {:-<7}", "", "", "");

    for entry in entries {
        println!(
            "{:<version_width$}  {:<name_width$}  {}",
            entry.version.to_string(),
            entry.name,
            state_label(entry.applied)
        );
    }

    let applied = entries.iter().filter(|e| e.applied).count();
    println!();
    println!(
        "{} migration(s): {} applied, {} pending",
        entries.len(),
        applied,
        entries.len() - applied
    );
}

fn print_json(entries: &[MigrationStatus]) -> Result<()> {
    let rows: Vec<StatusRow<'_>> = entries
        .iter()
        .map(|e| StatusRow {
            version: e.version.get(),
            name: &e.name,
            script: &e.script,
            state: state_label(e.applied),
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows).context("Failed to serialize status")?;
    println!("{json}");
    Ok(())
}

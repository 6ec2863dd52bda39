//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// cfmigrate - versioned schema migrations with a per-version ledger
#[derive(Parser, Debug)]
#[command(name = "cfm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from the config's `targets` section
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Override the database path (takes precedence over --target)
    #[arg(short = 'd', long, global = true, env = "CFM_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending migration
    Up,

    /// Revert the most recent migrations
    Rollback(RollbackArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),

    /// Print the highest applied version
    Version,

    /// Create a new, empty migration file
    New(NewArgs),
}

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Number of migrations to revert
    #[arg(short, long, default_value_t = 1)]
    pub steps: usize,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Descriptive snake_case name, e.g. `create_users`
    pub name: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

/// CLI interface and commands.

/// Common functions for CLI.
pub mod common;

/// Create an account.
pub mod create;

/// Update password, lock state or username.
pub mod update;

/// Delete an account.
pub mod delete;

/// List or show accounts.
pub mod search;

/// Run the health check script.
pub mod test;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "krbscript")]
#[command(about = "Provision and query Kerberos accounts through the realm admin script")]
pub struct Cli {
    /// Config file, defaults to the user config dir (krbscript/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account, optionally locked
    Create(create::CreateCommand),
    /// Change password, lock state or username of an account
    Update(update::UpdateCommand),
    /// Delete an account
    Delete(delete::DeleteCommand),
    /// List all accounts or show one
    Search(search::SearchCommand),
    /// Check that the configured scripts run
    Test(test::TestCommand),
}

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::account::AccountRecord;
use crate::connector::Connector;
use crate::runner::ScriptRunner;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Yaml,
}

#[derive(Args, Clone, Debug)]
pub struct SearchCommand {
    /// Show only this account, otherwise list all
    pub username: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl SearchCommand {
    pub async fn execute<R: ScriptRunner>(&self, connector: &Connector<R>) -> Result<()> {
        let mut records: Vec<AccountRecord> = Vec::new();
        connector
            .search(self.username.as_deref(), |record| {
                records.push(record);
                true
            })
            .await?;

        match self.format {
            OutputFormat::Text => print_records(&records),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&records)?),
        }

        Ok(())
    }
}

fn print_records(records: &[AccountRecord]) {
    if records.is_empty() {
        println!("📝 No accounts found");
        return;
    }

    println!("\n👤 Accounts ({})", records.len());
    println!("{}", "─".repeat(50));

    for record in records {
        let state = if record.locked { "🔒" } else { "🔓" };
        println!("  {} {}", state, record);
    }

    println!("{}", "─".repeat(50));
}

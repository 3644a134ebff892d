use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use log::{error, LevelFilter};

use krbscript::cli::{Cli, Commands};
use krbscript::config::Config;
use krbscript::connector::Connector;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // init logger
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Warn))
        .init();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    let config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    let connector = match Connector::new(config.connector)
        .with_context(|| format!("Invalid connector configuration in {}", config_path.display()))
    {
        Ok(connector) => connector,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Create(cmd) => cmd.execute(&connector).await.context("Create command failed"),
        Commands::Update(cmd) => cmd.execute(&connector).await.context("Update command failed"),
        Commands::Delete(cmd) => cmd.execute(&connector).await.context("Delete command failed"),
        Commands::Search(cmd) => cmd.execute(&connector).await.context("Search command failed"),
        Commands::Test(cmd) => cmd.execute(&connector).await.context("Test command failed"),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

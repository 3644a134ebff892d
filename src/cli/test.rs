use anyhow::Result;
use clap::Args;

use crate::connector::Connector;
use crate::runner::ScriptRunner;

#[derive(Args, Clone, Debug)]
pub struct TestCommand {}

impl TestCommand {
    pub async fn execute<R: ScriptRunner>(&self, connector: &Connector<R>) -> Result<()> {
        connector.test().await?;
        println!("✅ Script configuration OK");

        Ok(())
    }
}

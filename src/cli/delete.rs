use anyhow::Result;
use clap::Args;

use crate::connector::Connector;
use crate::runner::ScriptRunner;

#[derive(Args, Clone, Debug)]
pub struct DeleteCommand {
    /// Username of the account to delete
    pub uid: String,
}

impl DeleteCommand {
    pub async fn execute<R: ScriptRunner>(&self, connector: &Connector<R>) -> Result<()> {
        connector.delete(&self.uid).await?;
        println!("✅ {} - Deleted", self.uid);

        Ok(())
    }
}

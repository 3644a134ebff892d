use anyhow::Result;
use clap::Args;

use crate::cli::common::AccountOptions;
use crate::connector::{Connector, CreateOutcome, CreateRequest};
use crate::runner::ScriptRunner;
use crate::utils::display_error;

#[derive(Args, Clone, Debug)]
pub struct CreateCommand {
    /// Username, a configured domain suffix is removed
    pub username: String,

    #[command(flatten)]
    pub options: AccountOptions,
}

impl CreateCommand {
    pub async fn execute<R: ScriptRunner>(&self, connector: &Connector<R>) -> Result<()> {
        let request = CreateRequest {
            username: self.username.clone(),
            password: self.options.password()?,
            lock: self.options.lock_state(connector.config()),
        };

        match connector.create(&request).await? {
            CreateOutcome::Created { uid } => {
                println!("✅ {} - Created", uid);
            }
            CreateOutcome::PartiallyCreated { uid, secondary } => {
                println!("⚠️  {} - Created, but lock failed", uid);
                println!("   {}", display_error(&secondary, 3));
            }
        }

        Ok(())
    }
}

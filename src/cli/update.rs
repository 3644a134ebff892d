use anyhow::{anyhow, Result};
use clap::Args;

use crate::account::LockState;
use crate::cli::common::AccountOptions;
use crate::connector::{Connector, UpdateRequest};
use crate::runner::ScriptRunner;

#[derive(Args, Clone, Debug)]
pub struct UpdateCommand {
    /// Current username of the account
    pub uid: String,

    #[command(flatten)]
    pub options: AccountOptions,

    /// Rename the account (requires update_username = true)
    #[arg(long)]
    pub new_username: Option<String>,
}

impl UpdateCommand {
    pub async fn execute<R: ScriptRunner>(&self, connector: &Connector<R>) -> Result<()> {
        let request = UpdateRequest {
            password: self.options.password()?,
            lock: self.options.lock_state(connector.config()),
            new_username: self.new_username.clone(),
        };

        if request.password.is_none()
            && request.lock == LockState::Unchanged
            && request.new_username.is_none()
        {
            return Err(anyhow!(
                "Nothing to update. Use --password, --ask-password, --locked or --new-username."
            ));
        }

        let uid = connector.update(&self.uid, &request).await?;
        println!("✅ {} - Updated", uid);

        Ok(())
    }
}

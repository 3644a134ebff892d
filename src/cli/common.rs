/// Common functions for CLI.
use anyhow::{anyhow, Context, Result};
use clap::Args;

use crate::account::{LockState, Secret};
use crate::config::ConnectorConfig;

/// Password and lock options shared by create and update.
#[derive(Args, Clone, Debug, Default)]
pub struct AccountOptions {
    /// Password for the account
    #[arg(long, conflicts_with = "ask_password")]
    pub password: Option<String>,

    /// Read the password from the terminal without echo
    #[arg(long)]
    pub ask_password: bool,

    /// Lock state, matched against the configured locked/unlocked values
    #[arg(long)]
    pub locked: Option<String>,
}

impl AccountOptions {
    pub fn password(&self) -> Result<Option<Secret>> {
        if let Some(password) = &self.password {
            return Ok(Some(Secret::new(password.clone())));
        }

        if self.ask_password {
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;
            if password.is_empty() {
                return Err(anyhow!("Password cannot be empty"));
            }
            return Ok(Some(Secret::new(password)));
        }

        Ok(None)
    }

    pub fn lock_state(&self, config: &ConnectorConfig) -> LockState {
        match &self.locked {
            Some(value) => {
                let state =
                    LockState::from_value(value, &config.user_locked_value, &config.user_unlocked_value);
                if state == LockState::Unchanged {
                    log::warn!(
                        "Lock value '{}' matches neither '{}' nor '{}', leaving lock state alone",
                        value,
                        config.user_locked_value,
                        config.user_unlocked_value
                    );
                }
                state
            }
            None => LockState::Unchanged,
        }
    }
}

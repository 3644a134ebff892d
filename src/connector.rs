/// Account operations built on top of script invocations.
///
/// Every operation is one or more sequential script runs; nothing is retried and
/// nothing is shared between calls except the configuration.
use crate::account::{AccountRecord, LockState, Secret};
use crate::collector::{self, ExecutionResult};
use crate::command::{CommandBuilder, ScriptInvocation};
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::parser;
use crate::runner::{LocalRunner, ScriptRunner};
use crate::status::{self, Classification};

/// Input for [`Connector::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub username: String,
    pub password: Option<Secret>,
    pub lock: LockState,
}

/// Input for [`Connector::update`]. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub password: Option<Secret>,
    pub lock: LockState,
    pub new_username: Option<String>,
}

/// Result of a create.
#[derive(Debug)]
pub enum CreateOutcome {
    Created { uid: String },
    /// The account exists but the follow-up lock did not go through.
    /// The account is not rolled back.
    PartiallyCreated { uid: String, secondary: Error },
}

impl CreateOutcome {
    pub fn uid(&self) -> &str {
        match self {
            CreateOutcome::Created { uid } => uid,
            CreateOutcome::PartiallyCreated { uid, .. } => uid,
        }
    }
}

pub struct Connector<R: ScriptRunner = LocalRunner> {
    config: ConnectorConfig,
    builder: CommandBuilder,
    runner: R,
}

impl Connector<LocalRunner> {
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        Self::with_runner(config, LocalRunner)
    }
}

impl<R: ScriptRunner> Connector<R> {
    pub fn with_runner(config: ConnectorConfig, runner: R) -> Result<Self> {
        config.validate()?;
        let builder = CommandBuilder::from_config(&config)?;

        Ok(Self {
            config,
            builder,
            runner,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    /// Run one invocation to completion. The invocation, and any password file it
    /// staged, is dropped only after its output has been collected.
    async fn execute(&self, invocation: ScriptInvocation) -> Result<ExecutionResult> {
        let handle = self.runner.run(&invocation)?;
        let result = collector::collect(handle, self.config.collect_timeout()).await?;
        drop(invocation);
        Ok(result)
    }

    async fn execute_checked(&self, invocation: ScriptInvocation) -> Result<ExecutionResult> {
        let result = self.execute(invocation).await?;
        status::interpret(&result).into_result(&result)?;
        Ok(result)
    }

    pub async fn create(&self, request: &CreateRequest) -> Result<CreateOutcome> {
        let name = request.username.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "No name provided in the attributes".to_string(),
            ));
        }
        let password = request.password.as_ref().ok_or_else(|| {
            Error::InvalidArgument("No password provided in the attributes".to_string())
        })?;

        let uid = self.builder.format_username(name);
        log::info!("Executing creation for {}", uid);

        self.execute_checked(self.builder.create(name, password)?)
            .await
            .map_err(|e| {
                log::error!("Add user didn't return success for [{}]", uid);
                e.with_context(&format!("Failure while creating user {}", uid))
            })?;

        if request.lock == LockState::Locked {
            let locked = match self.builder.lock(name) {
                Ok(invocation) => self.execute_checked(invocation).await,
                Err(e) => Err(e),
            };

            if let Err(e) = locked {
                log::error!("Lock after create didn't return success for [{}]: {}", uid, e);
                return Ok(CreateOutcome::PartiallyCreated {
                    uid,
                    secondary: e.with_context("lock after create"),
                });
            }
        }

        Ok(CreateOutcome::Created { uid })
    }

    /// Apply password, lock state and rename in that order; the first failure stops the rest.
    /// Returns the uid the account has afterwards.
    pub async fn update(&self, uid: &str, request: &UpdateRequest) -> Result<String> {
        let current = self.builder.format_username(uid);
        if current.is_empty() {
            return Err(Error::InvalidArgument("uid must not be blank".to_string()));
        }
        log::info!("Executing the update for {}", current);

        if let Some(password) = &request.password {
            log::debug!("Updating password for {}", current);
            self.execute_checked(self.builder.change_password(&current, password)?)
                .await
                .map_err(|e| {
                    e.with_context(&format!("Update password didn't return success for {}", current))
                })?;
        }

        let lock = match request.lock {
            LockState::Locked => Some(self.builder.lock(&current)?),
            LockState::Unlocked => Some(self.builder.unlock(&current)?),
            LockState::Unchanged => None,
        };
        if let Some(invocation) = lock {
            log::debug!("Updating lock state for {} to {:?}", current, request.lock);
            self.execute_checked(invocation).await.map_err(|e| {
                e.with_context(&format!("Update lock state didn't return success for {}", current))
            })?;
        }

        let requested = request
            .new_username
            .as_deref()
            .map(|name| self.builder.format_username(name))
            .filter(|name| !name.is_empty() && *name != current);

        match requested {
            Some(new) if self.config.update_username => {
                log::debug!("Renaming {} to {}", current, new);
                self.execute_checked(self.builder.rename(&current, &new)?)
                    .await
                    .map_err(|e| {
                        e.with_context(&format!("Update username didn't return success for {}", current))
                    })?;
                Ok(new)
            }
            Some(new) => {
                log::warn!(
                    "Ignoring rename of {} to {}: username updates are disabled",
                    current,
                    new
                );
                Ok(current)
            }
            None => Ok(current),
        }
    }

    pub async fn delete(&self, uid: &str) -> Result<()> {
        let username = self.builder.format_username(uid);
        log::info!("Executing deletion for {}", username);

        self.execute_checked(self.builder.delete(uid)?)
            .await
            .map_err(|e| e.with_context(&format!("Failure while deleting user {}", username)))?;

        Ok(())
    }

    /// List every account, or show the one matching `filter`, handing each record to
    /// `sink` in output order. Delivery stops early when `sink` returns `false`.
    ///
    /// Returns the number of records delivered.
    pub async fn search<F>(&self, filter: Option<&str>, mut sink: F) -> Result<usize>
    where
        F: FnMut(AccountRecord) -> bool,
    {
        let invocation = match filter {
            Some(name) => {
                log::info!("Search with filter {} ...", name);
                self.builder.show(name)?
            }
            None => {
                log::info!("Full search (no filter) ...");
                self.builder.list_all()?
            }
        };

        let result = self.execute(invocation).await?;
        let verdict = status::interpret(&result);
        if !verdict.success {
            if let (Some(name), Classification::UserNotExist) = (filter, verdict.classification) {
                return Err(Error::NotFound(format!("No such account: {}", name)));
            }
            verdict.into_result(&result)?;
        }

        log::info!("Processing script output ...");
        let records = match filter {
            Some(_) => vec![parser::parse_single(&result.stdout)?],
            None => parser::parse_list(&result.stdout),
        };

        let mut delivered = 0;
        for record in records {
            log::debug!("Handle search result item {}", record.username);
            delivered += 1;
            if !sink(record) {
                break;
            }
        }

        Ok(delivered)
    }

    /// Run the health check script. Any failure means the configuration is unusable.
    pub async fn test(&self) -> Result<()> {
        let invocation = self.builder.health_check()?;
        log::info!("Executing test on {}", invocation);

        self.execute_checked(invocation).await.map_err(|e| {
            Error::ConfigurationFailure(format!(
                "Script process did not return a successful code: {}",
                e
            ))
        })?;

        log::info!("Test completed successfully");
        Ok(())
    }
}

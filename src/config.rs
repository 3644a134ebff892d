/// Configuration serialization and deserialization.
use std::{
    collections::HashMap,
    fs::{self},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default per-stream deadline for draining script output after the process exits.
pub const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub connector: ConnectorConfig,
}

impl Config {
    /// Load from TOML, or YAML when the file extension says so.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)?,
            _ => toml::from_str(&contents)?,
        };

        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/krbscript/config.toml`, or `config.toml` when no config dir exists.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("krbscript").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

// config like:
// [connector]
// admin_principal = "admin/admin@EXAMPLE.COM"
// keytab_path = "/etc/krb5.keytab"
// script_cmd_path = "/opt/krb/kadmin.pl"
// script_cmd_type = "perl"
// test_cmd_path = "/opt/krb/test.sh"
// domain_to_remove = "@EXAMPLE\\.COM"
// redirect_error_output = true
// script_error_response = "ERROR"
//
// [connector.env]
// KRB5_CONFIG = "/etc/krb5.conf"
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectorConfig {
    pub admin_principal: String,
    pub keytab_path: String,
    pub script_cmd_path: String,

    // interpreter placed in front of the script, e.g. "perl" or "perl -w"
    #[serde(default)]
    pub script_cmd_type: Option<String>,
    #[serde(default)]
    pub test_cmd_path: Option<String>,

    // regex removed from usernames before they reach the script
    #[serde(default)]
    pub domain_to_remove: Option<String>,

    #[serde(default)]
    pub redirect_error_output: bool,
    #[serde(default = "default_error_response")]
    pub script_error_response: String,

    #[serde(default)]
    pub update_username: bool,
    #[serde(default)]
    pub password_via_file: bool,

    #[serde(default = "default_locked_value")]
    pub user_locked_value: String,
    #[serde(default = "default_unlocked_value")]
    pub user_unlocked_value: String,

    #[serde(default = "default_collect_timeout")]
    pub collect_timeout_secs: u64,

    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
}

fn default_error_response() -> String {
    "ERROR".to_string()
}

fn default_locked_value() -> String {
    "true".to_string()
}

fn default_unlocked_value() -> String {
    "false".to_string()
}

fn default_collect_timeout() -> u64 {
    DEFAULT_COLLECT_TIMEOUT_SECS
}

impl ConnectorConfig {
    /// Minimal configuration; everything optional takes its default.
    pub fn new<S: Into<String>>(admin_principal: S, keytab_path: S, script_cmd_path: S) -> Self {
        Self {
            admin_principal: admin_principal.into(),
            keytab_path: keytab_path.into(),
            script_cmd_path: script_cmd_path.into(),
            script_cmd_type: None,
            test_cmd_path: None,
            domain_to_remove: None,
            redirect_error_output: false,
            script_error_response: default_error_response(),
            update_username: false,
            password_via_file: false,
            user_locked_value: default_locked_value(),
            user_unlocked_value: default_unlocked_value(),
            collect_timeout_secs: DEFAULT_COLLECT_TIMEOUT_SECS,
            env: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.script_cmd_path.trim().is_empty() {
            return Err(Error::ConfigurationFailure(
                "Script path must not be blank".to_string(),
            ));
        }
        if self.admin_principal.trim().is_empty() {
            return Err(Error::ConfigurationFailure(
                "Admin principal must not be blank".to_string(),
            ));
        }
        if self.keytab_path.trim().is_empty() {
            return Err(Error::ConfigurationFailure(
                "Keytab path must not be blank".to_string(),
            ));
        }
        if let Some(pattern) = self.domain_pattern() {
            regex::Regex::new(pattern).map_err(|e| {
                Error::ConfigurationFailure(format!("Invalid domain pattern '{}': {}", pattern, e))
            })?;
        }
        if let Some(interpreter) = &self.script_cmd_type {
            shell_words::split(interpreter).map_err(|e| {
                Error::ConfigurationFailure(format!(
                    "Invalid script command type '{}': {}",
                    interpreter, e
                ))
            })?;
        }

        Ok(())
    }

    /// Domain pattern, ignoring a blank entry.
    pub fn domain_pattern(&self) -> Option<&str> {
        self.domain_to_remove
            .as_deref()
            .filter(|pattern| !pattern.trim().is_empty())
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(self.collect_timeout_secs)
    }

    /// Extra environment as ordered pairs.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .env
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

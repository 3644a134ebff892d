/// Command line construction for the administrative script.
///
/// The script takes its arguments positionally:
/// `[interpreter] <script> -p <principal> -k <keytab> <operation flag> <operation args...>`.
use std::fmt;
use std::io::Write;

use regex::Regex;
use tempfile::NamedTempFile;

use crate::account::Secret;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};

pub const PRINCIPAL_FLAG: &str = "-p";
pub const KEYTAB_FLAG: &str = "-k";
pub const PASSWORD_FILE_FLAG: &str = "-w";

const REDACTED: &str = "********";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationFlag {
    Create,
    Delete,
    Lock,
    Unlock,
    ChangePassword,
    ListAll,
    ShowDetails,
    Rename,
}

impl OperationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationFlag::Create => "-a",
            OperationFlag::Delete => "-d",
            OperationFlag::Lock => "-f",
            OperationFlag::Unlock => "-t",
            OperationFlag::ChangePassword => "-c",
            OperationFlag::ListAll => "-l",
            OperationFlag::ShowDetails => "-s",
            OperationFlag::Rename => "-r",
        }
    }
}

impl fmt::Display for OperationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal and keytab used to authenticate every script call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    principal: String,
    keytab_path: String,
}

impl AdminCredentials {
    pub fn new<S: Into<String>>(principal: S, keytab_path: S) -> Result<Self> {
        let principal = principal.into();
        let keytab_path = keytab_path.into();

        if principal.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "admin principal must not be blank".to_string(),
            ));
        }
        if keytab_path.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "keytab path must not be blank".to_string(),
            ));
        }

        Ok(Self {
            principal,
            keytab_path,
        })
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn keytab_path(&self) -> &str {
        &self.keytab_path
    }
}

/// Removes the configured domain pattern from usernames and trims whitespace.
#[derive(Debug, Clone, Default)]
pub struct UsernameFormatter {
    domain: Option<Regex>,
}

impl UsernameFormatter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let domain = match pattern.filter(|p| !p.trim().is_empty()) {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                Error::InvalidArgument(format!("invalid domain pattern '{}': {}", pattern, e))
            })?),
            None => None,
        };

        Ok(Self { domain })
    }

    /// Strip every match of the domain pattern, then trim.
    ///
    /// Repeats until nothing changes so that applying it twice gives the same result.
    pub fn format(&self, raw: &str) -> String {
        let mut current = raw.trim().to_string();

        if let Some(domain) = &self.domain {
            loop {
                let next = domain.replace_all(&current, "").trim().to_string();
                if next == current {
                    break;
                }
                current = next;
            }
        }

        current
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Argument {
    Plain(String),
    Secret(Secret),
}

impl Argument {
    pub fn value(&self) -> &str {
        match self {
            Argument::Plain(value) => value,
            Argument::Secret(secret) => secret.expose(),
        }
    }

    fn display_value(&self) -> &str {
        match self {
            Argument::Plain(value) => value,
            Argument::Secret(_) => REDACTED,
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.display_value())
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Plain(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Plain(value)
    }
}

/// A fully built script call. Never changed once built.
#[derive(Debug)]
pub struct ScriptInvocation {
    args: Vec<Argument>,
    env: Vec<(String, String)>,
    redirect_error_output: bool,
    error_marker: String,
    // keeps the staged password file alive until the invocation is dropped
    password_file: Option<NamedTempFile>,
}

impl ScriptInvocation {
    /// Executable to launch: the interpreter when present, otherwise the script.
    pub fn program(&self) -> &str {
        self.args.first().map(Argument::value).unwrap_or_default()
    }

    /// Everything after the program.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().skip(1).map(Argument::value)
    }

    /// Full argument vector including the program, secrets in clear.
    pub fn argv(&self) -> Vec<&str> {
        self.args.iter().map(Argument::value).collect()
    }

    /// Argument vector with secrets replaced, for logs and audit.
    pub fn redacted_argv(&self) -> Vec<&str> {
        self.args.iter().map(Argument::display_value).collect()
    }

    /// Shell-quoted, redacted command line.
    pub fn redacted(&self) -> String {
        shell_words::join(self.redacted_argv())
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn redirect_error_output(&self) -> bool {
        self.redirect_error_output
    }

    pub fn error_marker(&self) -> &str {
        &self.error_marker
    }

    pub fn password_file(&self) -> Option<&std::path::Path> {
        self.password_file.as_ref().map(|file| file.path())
    }
}

impl fmt::Display for ScriptInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// Builds invocations for each script operation from the connector configuration.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    credentials: AdminCredentials,
    interpreter: Vec<String>,
    script_path: String,
    test_path: Option<String>,
    formatter: UsernameFormatter,
    env: Vec<(String, String)>,
    redirect_error_output: bool,
    error_marker: String,
    password_via_file: bool,
}

impl CommandBuilder {
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        let credentials =
            AdminCredentials::new(config.admin_principal.as_str(), config.keytab_path.as_str())?;

        if config.script_cmd_path.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "script path must not be blank".to_string(),
            ));
        }

        let interpreter = match config.script_cmd_type.as_deref() {
            Some(kind) if !kind.trim().is_empty() => shell_words::split(kind).map_err(|e| {
                Error::InvalidArgument(format!("invalid script command type '{}': {}", kind, e))
            })?,
            _ => vec![],
        };

        Ok(Self {
            credentials,
            interpreter,
            script_path: config.script_cmd_path.clone(),
            test_path: config
                .test_cmd_path
                .clone()
                .filter(|path| !path.trim().is_empty()),
            formatter: UsernameFormatter::new(config.domain_pattern())?,
            env: config.env_pairs(),
            redirect_error_output: config.redirect_error_output,
            error_marker: config.script_error_response.clone(),
            password_via_file: config.password_via_file,
        })
    }

    pub fn credentials(&self) -> &AdminCredentials {
        &self.credentials
    }

    pub fn format_username(&self, raw: &str) -> String {
        self.formatter.format(raw)
    }

    /// Assemble a call to `script`: interpreter, script, credentials, then `operation` verbatim.
    pub fn build(&self, script: &str, operation: Vec<Argument>) -> Result<ScriptInvocation> {
        self.build_with_file(script, operation, None)
    }

    fn build_with_file(
        &self,
        script: &str,
        operation: Vec<Argument>,
        password_file: Option<NamedTempFile>,
    ) -> Result<ScriptInvocation> {
        if script.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "script path must not be blank".to_string(),
            ));
        }

        let mut args: Vec<Argument> = self
            .interpreter
            .iter()
            .map(|part| Argument::Plain(part.clone()))
            .collect();
        args.push(script.into());
        args.push(PRINCIPAL_FLAG.into());
        args.push(self.credentials.principal().into());
        args.push(KEYTAB_FLAG.into());
        args.push(self.credentials.keytab_path().into());
        args.extend(operation);

        let invocation = ScriptInvocation {
            args,
            env: self.env.clone(),
            redirect_error_output: self.redirect_error_output,
            error_marker: self.error_marker.clone(),
            password_file,
        };
        log::debug!("Built script command: {}", invocation.redacted());

        Ok(invocation)
    }

    fn username_arg(&self, raw: &str) -> Result<Argument> {
        let username = self.format_username(raw);
        if username.is_empty() {
            return Err(Error::InvalidArgument(
                "username must not be blank".to_string(),
            ));
        }
        Ok(Argument::Plain(username))
    }

    fn operation(&self, flag: OperationFlag, username: &str) -> Result<Vec<Argument>> {
        Ok(vec![flag.as_str().into(), self.username_arg(username)?])
    }

    /// Append the password positionally, or stage it in a private file behind `-w`.
    fn with_password(
        &self,
        mut operation: Vec<Argument>,
        password: &Secret,
    ) -> Result<ScriptInvocation> {
        if !self.password_via_file {
            operation.push(Argument::Secret(password.clone()));
            return self.build(&self.script_path, operation);
        }

        let mut file = NamedTempFile::new()?;
        file.write_all(password.expose().as_bytes())?;
        file.flush()?;

        operation.push(PASSWORD_FILE_FLAG.into());
        operation.push(Argument::Plain(file.path().to_string_lossy().into_owned()));
        self.build_with_file(&self.script_path, operation, Some(file))
    }

    pub fn create(&self, username: &str, password: &Secret) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::Create, username)?;
        self.with_password(operation, password)
    }

    pub fn change_password(&self, username: &str, password: &Secret) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::ChangePassword, username)?;
        self.with_password(operation, password)
    }

    pub fn delete(&self, username: &str) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::Delete, username)?;
        self.build(&self.script_path, operation)
    }

    pub fn lock(&self, username: &str) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::Lock, username)?;
        self.build(&self.script_path, operation)
    }

    pub fn unlock(&self, username: &str) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::Unlock, username)?;
        self.build(&self.script_path, operation)
    }

    pub fn rename(&self, current: &str, new: &str) -> Result<ScriptInvocation> {
        let mut operation = self.operation(OperationFlag::Rename, current)?;
        operation.push(self.username_arg(new)?);
        self.build(&self.script_path, operation)
    }

    pub fn list_all(&self) -> Result<ScriptInvocation> {
        let operation = vec![
            OperationFlag::ListAll.as_str().into(),
            OperationFlag::ShowDetails.as_str().into(),
        ];
        self.build(&self.script_path, operation)
    }

    pub fn show(&self, username: &str) -> Result<ScriptInvocation> {
        let operation = self.operation(OperationFlag::ShowDetails, username)?;
        self.build(&self.script_path, operation)
    }

    /// Health check script with credentials and no operation arguments.
    pub fn health_check(&self) -> Result<ScriptInvocation> {
        let test_path = self.test_path.as_deref().ok_or_else(|| {
            Error::ConfigurationFailure("test script path is not configured".to_string())
        })?;
        self.build(test_path, vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConnectorConfig {
        ConnectorConfig::new("admin/admin@EXAMPLE.COM", "/etc/admin.keytab", "/opt/kadm.pl")
    }

    fn builder() -> CommandBuilder {
        CommandBuilder::from_config(&config()).unwrap()
    }

    #[test]
    fn create_places_credentials_before_operation() {
        let invocation = builder()
            .create("alice", &Secret::new("s3cret"))
            .unwrap();

        assert_eq!(
            invocation.argv(),
            vec![
                "/opt/kadm.pl",
                "-p",
                "admin/admin@EXAMPLE.COM",
                "-k",
                "/etc/admin.keytab",
                "-a",
                "alice",
                "s3cret"
            ]
        );
        assert_eq!(invocation.program(), "/opt/kadm.pl");
    }

    #[test]
    fn interpreter_prefix_is_split() {
        let mut config = config();
        config.script_cmd_type = Some("perl -w".to_string());
        let invocation = CommandBuilder::from_config(&config)
            .unwrap()
            .delete("bob")
            .unwrap();

        assert_eq!(invocation.program(), "perl");
        assert_eq!(
            invocation.args().collect::<Vec<_>>(),
            vec![
                "-w",
                "/opt/kadm.pl",
                "-p",
                "admin/admin@EXAMPLE.COM",
                "-k",
                "/etc/admin.keytab",
                "-d",
                "bob"
            ]
        );
    }

    #[test]
    fn redacted_form_hides_password() {
        let invocation = builder()
            .change_password("alice", &Secret::new("s3cret pass"))
            .unwrap();

        let redacted = invocation.redacted();
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.ends_with("-c alice '********'"));
        assert!(!format!("{:?}", invocation).contains("s3cret"));
        assert_eq!(invocation.argv().last(), Some(&"s3cret pass"));
    }

    #[test]
    fn usernames_are_stripped_of_domain() {
        let mut config = config();
        config.domain_to_remove = Some("@EXAMPLE\\.COM".to_string());
        let builder = CommandBuilder::from_config(&config).unwrap();

        let invocation = builder.lock("  alice@EXAMPLE.COM ").unwrap();
        assert_eq!(invocation.argv()[5..], ["-f", "alice"]);

        let invocation = builder.rename("alice@EXAMPLE.COM", "alicia@EXAMPLE.COM").unwrap();
        assert_eq!(invocation.argv()[5..], ["-r", "alice", "alicia"]);
    }

    #[test]
    fn format_username_is_idempotent() {
        let formatter = UsernameFormatter::new(Some("@EXAMPLE\\.COM")).unwrap();
        for raw in [
            "alice@EXAMPLE.COM",
            " bob @EXAMPLE.COM ",
            "carol@EXAMPLE.COM@EXAMPLE.COM",
            "dave@EX@EXAMPLE.COMAMPLE.COM",
            "plain",
        ] {
            let once = formatter.format(raw);
            assert_eq!(formatter.format(&once), once, "input {raw:?}");
            assert!(!once.contains("@EXAMPLE.COM"));
        }
        assert_eq!(formatter.format(" bob @EXAMPLE.COM "), "bob");
    }

    #[test]
    fn blank_inputs_are_rejected() {
        assert!(matches!(
            AdminCredentials::new(" ", "/k"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            CommandBuilder::from_config(&ConnectorConfig::new("a", "/k", "")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            builder().delete("   "),
            Err(Error::InvalidArgument(_))
        ));

        let mut config = config();
        config.domain_to_remove = Some("@EXAMPLE\\.COM".to_string());
        let builder = CommandBuilder::from_config(&config).unwrap();
        assert!(builder.show("@EXAMPLE.COM").is_err());
    }

    #[test]
    fn search_commands() {
        let builder = builder();
        assert_eq!(builder.list_all().unwrap().argv()[5..], ["-l", "-s"]);
        assert_eq!(builder.show("alice").unwrap().argv()[5..], ["-s", "alice"]);
    }

    #[test]
    fn health_check_requires_test_path() {
        assert!(matches!(
            builder().health_check(),
            Err(Error::ConfigurationFailure(_))
        ));

        let mut config = config();
        config.test_cmd_path = Some("/opt/test.sh".to_string());
        let invocation = CommandBuilder::from_config(&config)
            .unwrap()
            .health_check()
            .unwrap();
        assert_eq!(
            invocation.argv(),
            vec!["/opt/test.sh", "-p", "admin/admin@EXAMPLE.COM", "-k", "/etc/admin.keytab"]
        );
    }

    #[test]
    fn password_file_replaces_positional_password() {
        let mut config = config();
        config.password_via_file = true;
        let invocation = CommandBuilder::from_config(&config)
            .unwrap()
            .create("alice", &Secret::new("s3cret"))
            .unwrap();

        let argv = invocation.argv();
        assert!(!argv.contains(&"s3cret"));
        assert_eq!(argv[5..8], ["-a", "alice", "-w"]);

        let path = invocation.password_file().unwrap().to_path_buf();
        assert_eq!(argv[8], path.to_string_lossy());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "s3cret");

        drop(invocation);
        assert!(!path.exists());
    }

    #[test]
    fn invocation_carries_redirect_settings_and_env() {
        let mut config = config();
        config.redirect_error_output = true;
        config.script_error_response = "FAILED".to_string();
        config.env = Some([("KRB5_CONFIG".to_string(), "/etc/krb5.conf".to_string())].into());

        let invocation = CommandBuilder::from_config(&config).unwrap().list_all().unwrap();
        assert!(invocation.redirect_error_output());
        assert_eq!(invocation.error_marker(), "FAILED");
        assert_eq!(
            invocation.env(),
            &[("KRB5_CONFIG".to_string(), "/etc/krb5.conf".to_string())]
        );
    }
}

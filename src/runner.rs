/// Child process launching for script invocations.
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::command::ScriptInvocation;
use crate::error::{Error, Result};

/// Starts one child process per invocation.
///
/// Orchestrators hold a runner value; implementations carry no per-call state.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, invocation: &ScriptInvocation) -> Result<ProcessHandle>;
}

/// Runs scripts on the local machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner;

impl ScriptRunner for LocalRunner {
    fn run(&self, invocation: &ScriptInvocation) -> Result<ProcessHandle> {
        log::info!("Executing script {}", invocation);

        let program = invocation.program().to_string();
        if program.is_empty() {
            return Err(Error::InvalidArgument(
                "script invocation has no program".to_string(),
            ));
        }

        let mut command = Command::new(&program);
        command
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in invocation.env() {
            command.env(key, value);
        }

        let mut child = command
            .spawn()
            .map_err(|source| Error::ProcessStartFailure {
                program: program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(ProcessHandle {
            program,
            child,
            stdout,
            stderr,
            merge_stderr: invocation.redirect_error_output(),
            error_marker: invocation
                .redirect_error_output()
                .then(|| invocation.error_marker().to_string())
                .filter(|marker| !marker.is_empty()),
        })
    }
}

/// A running script. Standard input is already closed.
#[derive(Debug)]
pub struct ProcessHandle {
    program: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    merge_stderr: bool,
    error_marker: Option<String>,
}

impl ProcessHandle {
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Whether error output is read as part of standard output.
    pub fn merge_stderr(&self) -> bool {
        self.merge_stderr
    }

    /// Marker searched for in standard output, set only when error output is redirected.
    pub fn error_marker(&self) -> Option<&str> {
        self.error_marker.as_deref()
    }

    /// Block until the child exits and reap it.
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        Ok(self.child.wait().await?)
    }
}

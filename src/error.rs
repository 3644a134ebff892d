/// Error taxonomy for script invocations and account operations.
use std::io;

use thiserror::Error;

use crate::status::Classification;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Required input was missing or blank. Raised before any process is spawned.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to start '{program}': {source}")]
    ProcessStartFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The script ran but its exit status or output reported a failure.
    #[error("script failed with {classification} (exit code {code}): {message}")]
    ScriptFailure {
        code: i32,
        classification: Classification,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration failure: {0}")]
    ConfigurationFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Exit code of the failed script run, if this error came from one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ScriptFailure { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Add the operation context to a script failure message, leave other errors untouched.
    pub(crate) fn with_context(self, context: &str) -> Self {
        match self {
            Error::ScriptFailure {
                code,
                classification,
                message,
            } => Error::ScriptFailure {
                code,
                classification,
                message: if message.is_empty() {
                    context.to_string()
                } else {
                    format!("{}: {}", context, message)
                },
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_script_failure_message() {
        let err = Error::ScriptFailure {
            code: 201,
            classification: Classification::UserNotExist,
            message: "no such principal".to_string(),
        }
        .with_context("delete alice");

        assert_eq!(err.exit_code(), Some(201));
        assert_eq!(
            err.to_string(),
            "script failed with USER_NOT_EXIST (exit code 201): delete alice: no such principal"
        );
    }

    #[test]
    fn context_leaves_other_errors_alone() {
        let err = Error::NotFound("bob".to_string()).with_context("search");
        assert_eq!(err.to_string(), "not found: bob");
        assert_eq!(err.exit_code(), None);
    }
}

/// Exit status interpretation for the administrative script.
use std::fmt;

use crate::collector::ExecutionResult;
use crate::error::Error;

/// Named outcome of a script run, looked up from its exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Error,
    SpoolFileError,
    UserNotExist,
    UserAlreadyExists,
    InvalidPassword,
    CannotReusePassword,
    NotEnoughCharClasses,
    PasswordTooShort,
    Unknown(i32),
}

impl Classification {
    /// Look up an exit code in the script's status table.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Classification::Success,
            1 => Classification::Error,
            200 => Classification::SpoolFileError,
            201 | 43787532 => Classification::UserNotExist,
            202 | 43787527 => Classification::UserAlreadyExists,
            203 => Classification::InvalidPassword,
            43787545 => Classification::CannotReusePassword,
            43787543 => Classification::NotEnoughCharClasses,
            43787542 => Classification::PasswordTooShort,
            other => Classification::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Success => "SUCCESS",
            Classification::Error => "ERROR",
            Classification::SpoolFileError => "SPOOL_FILE_ERROR",
            Classification::UserNotExist => "USER_NOT_EXIST",
            Classification::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Classification::InvalidPassword => "INVALID_PASSWORD",
            Classification::CannotReusePassword => "CANNOT_REUSE_PASSWORD",
            Classification::NotEnoughCharClasses => "NOT_ENOUGH_CHAR_CLASSES",
            Classification::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Classification::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Unknown(code) => write!(f, "UNKNOWN({})", code),
            known => f.write_str(known.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub classification: Classification,
}

impl Verdict {
    /// Turn a failed verdict into a `ScriptFailure` carrying the collected status message.
    pub fn into_result(self, result: &ExecutionResult) -> Result<(), Error> {
        if self.success {
            return Ok(());
        }

        Err(Error::ScriptFailure {
            code: result.exit_code,
            classification: self.classification,
            message: result.status_message.trim().to_string(),
        })
    }
}

/// Read an already collected result and decide whether the run succeeded.
///
/// Exit code 0 only counts as success when no error text was collected; a script
/// that printed diagnostics is treated as failed with `ERROR` even if it exited 0.
pub fn interpret(result: &ExecutionResult) -> Verdict {
    let verdict = if result.exit_code == 0 {
        if result.status_message.trim().is_empty() {
            Verdict {
                success: true,
                classification: Classification::Success,
            }
        } else {
            Verdict {
                success: false,
                classification: Classification::Error,
            }
        }
    } else {
        Verdict {
            success: false,
            classification: Classification::from_code(result.exit_code),
        }
    };

    log::debug!(
        "Process ended with status [{}] and code {}",
        verdict.classification,
        result.exit_code
    );
    if !verdict.success {
        log::error!(
            "Script ended with a non successful status of [{}] and code {}",
            verdict.classification,
            result.exit_code
        );
    }

    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(code: i32, message: &str) -> ExecutionResult {
        ExecutionResult {
            exit_code: code,
            stdout: vec![],
            stderr: vec![],
            status_message: message.to_string(),
        }
    }

    #[test]
    fn zero_exit_without_message_is_success() {
        let verdict = interpret(&result(0, ""));
        assert!(verdict.success);
        assert_eq!(verdict.classification, Classification::Success);
    }

    #[test]
    fn zero_exit_with_error_text_is_forced_to_failure() {
        let verdict = interpret(&result(0, "ERROR: kadmin refused "));
        assert!(!verdict.success);
        assert_eq!(verdict.classification, Classification::Error);
    }

    #[test]
    fn known_codes_are_classified() {
        assert_eq!(
            interpret(&result(201, "")).classification,
            Classification::UserNotExist
        );
        assert_eq!(
            Classification::from_code(43787527),
            Classification::UserAlreadyExists
        );
        assert_eq!(
            Classification::from_code(43787542).to_string(),
            "PASSWORD_TOO_SHORT"
        );
        assert_eq!(Classification::from_code(200).to_string(), "SPOOL_FILE_ERROR");
    }

    #[test]
    fn unknown_code_carries_raw_value() {
        let verdict = interpret(&result(77, ""));
        assert!(!verdict.success);
        assert_eq!(verdict.classification, Classification::Unknown(77));
        assert_eq!(verdict.classification.to_string(), "UNKNOWN(77)");
    }

    #[test]
    fn failed_verdict_becomes_script_failure() {
        let collected = result(202, "principal exists ");
        let err = interpret(&collected).into_result(&collected).unwrap_err();
        match err {
            Error::ScriptFailure {
                code,
                classification,
                message,
            } => {
                assert_eq!(code, 202);
                assert_eq!(classification, Classification::UserAlreadyExists);
                assert_eq!(message, "principal exists");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

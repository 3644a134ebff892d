/// Account records and the values the host hands in.
use std::fmt;

use serde::Serialize;

/// Attribute name carrying the username.
pub const USER_NAME_ATTRIBUTE: &str = "user_name";
/// Attribute name carrying the raw flag text.
pub const USER_FLAGS_ATTRIBUTE: &str = "user_flags";
/// Attribute name carrying the derived lock state.
pub const USER_LOCKED_ATTRIBUTE: &str = "user_locked";

/// Flag token the script prints for a principal that may not obtain tickets.
pub const DISABLED_FLAG: &str = "KRB5_KDB_DISALLOW_ALL_TIX";

/// One account parsed from script output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    #[serde(rename = "user_name")]
    pub username: String,
    #[serde(rename = "user_flags", skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
    #[serde(rename = "user_locked")]
    pub locked: bool,
}

impl AccountRecord {
    /// The username doubles as uid and display name.
    pub fn uid(&self) -> &str {
        &self.username
    }
}

impl fmt::Display for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}={} {}={}",
            self.username,
            USER_LOCKED_ATTRIBUTE,
            self.locked,
            USER_FLAGS_ATTRIBUTE,
            self.flags.as_deref().unwrap_or("")
        )
    }
}

/// Password value that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

/// Requested lock state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    Locked,
    Unlocked,
    #[default]
    Unchanged,
}

impl LockState {
    /// Map a host supplied value against the configured locked/unlocked spellings.
    ///
    /// Comparison ignores case. Anything matching neither spelling leaves the state alone.
    pub fn from_value(value: &str, locked_value: &str, unlocked_value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(locked_value) {
            LockState::Locked
        } else if value.eq_ignore_ascii_case(unlocked_value) {
            LockState::Unlocked
        } else {
            LockState::Unchanged
        }
    }
}

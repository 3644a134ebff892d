/// Parsing of the script's account listings.
///
/// Listing output carries one `username=flags` entry per line. Detail output starts
/// with [`SINGLE_RESULT_HEADER`], spreads the flags over several lines and also
/// prints the attribute bitmask as a hex token right after the username.
use crate::account::{AccountRecord, DISABLED_FLAG};
use crate::error::{Error, Result};

/// Literal text in front of the username in detail output.
pub const SINGLE_RESULT_HEADER: &str = "Attributes for ";

/// Parse listing output, one account per line. Lines that hold no entry are skipped.
pub fn parse_list<S: AsRef<str>>(lines: &[S]) -> Vec<AccountRecord> {
    lines
        .iter()
        .filter_map(|line| {
            let record = parse_entry(line.as_ref());
            if record.is_none() && !line.as_ref().trim().is_empty() {
                log::debug!("Skipping unparsable result line {:?}", line.as_ref());
            }
            record
        })
        .collect()
}

/// Parse detail output into the one account it describes.
pub fn parse_single<S: AsRef<str>>(lines: &[S]) -> Result<AccountRecord> {
    let joined = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return Err(Error::NotFound("No results found".to_string()));
    }

    let details = match joined.find(SINGLE_RESULT_HEADER) {
        Some(pos) => &joined[pos + SINGLE_RESULT_HEADER.len()..],
        None => {
            return Err(Error::NotFound(format!(
                "No account details in script output: {}",
                joined
            )))
        }
    };

    let mut tokens = details.split_whitespace();
    let username = match tokens.next() {
        Some(token) => token.trim_end_matches(':'),
        None => return Err(Error::NotFound("No results found".to_string())),
    };

    let mut tokens = tokens.peekable();
    if tokens.peek().is_some_and(|token| is_hex_token(token)) {
        tokens.next();
    }
    let flags = tokens.collect::<Vec<_>>().join(" ");

    parse_entry(&format!("{} {}", username, flags))
        .ok_or_else(|| Error::NotFound("No results found".to_string()))
}

/// Parse one `key=value`, `key:value` or `key value` entry into a record.
fn parse_entry(line: &str) -> Option<AccountRecord> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }

    let key_end = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let (username, rest) = line.split_at(key_end);
    if username.trim().is_empty() {
        return None;
    }

    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    let flags = rest.trim();

    Some(AccountRecord {
        username: username.to_string(),
        locked: flags.contains(DISABLED_FLAG),
        flags: (!flags.is_empty()).then(|| flags.to_string()),
    })
}

fn is_hex_token(token: &str) -> bool {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_mode_yields_one_record_per_line() {
        let records = parse_list(&["alice=KRB5_KDB_DISALLOW_ALL_TIX", "bob="]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username, "alice");
        assert!(records[0].locked);
        assert_eq!(records[0].flags.as_deref(), Some("KRB5_KDB_DISALLOW_ALL_TIX"));
        assert_eq!(records[1].username, "bob");
        assert!(!records[1].locked);
        assert_eq!(records[1].flags, None);
    }

    #[test]
    fn list_mode_skips_empty_and_malformed_lines() {
        let records = parse_list(&[
            "",
            "   ",
            "=orphan flags",
            "# comment",
            "carol=KRB5_KDB_REQUIRES_PRE_AUTH,KRB5_KDB_DISALLOW_ALL_TIX",
        ]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].username, "carol");
        assert!(records[0].locked);
        assert_eq!(
            records[0].flags.as_deref(),
            Some("KRB5_KDB_REQUIRES_PRE_AUTH,KRB5_KDB_DISALLOW_ALL_TIX")
        );
    }

    #[test]
    fn list_mode_keeps_flag_text_verbatim() {
        let records = parse_list(&["dave = KRB5_KDB_REQUIRES_PRE_AUTH KRB5_KDB_DISALLOW_SVR"]);
        assert_eq!(records[0].username, "dave");
        assert!(!records[0].locked);
        assert_eq!(
            records[0].flags.as_deref(),
            Some("KRB5_KDB_REQUIRES_PRE_AUTH KRB5_KDB_DISALLOW_SVR")
        );
    }

    #[test]
    fn single_mode_discards_header_and_hex_token() {
        let record = parse_single(&["Attributes for alice 00a1 KRB5_KDB_DISALLOW_ALL_TIX"]).unwrap();

        assert_eq!(record.username, "alice");
        assert!(record.locked);
        assert_eq!(record.flags.as_deref(), Some("KRB5_KDB_DISALLOW_ALL_TIX"));
    }

    #[test]
    fn single_mode_reassembles_multiline_output() {
        let record = parse_single(&[
            "Attributes for bob",
            "0080",
            "KRB5_KDB_REQUIRES_PRE_AUTH",
            "",
            "KRB5_KDB_DISALLOW_SVR",
        ])
        .unwrap();

        assert_eq!(record.username, "bob");
        assert!(!record.locked);
        assert_eq!(
            record.flags.as_deref(),
            Some("KRB5_KDB_REQUIRES_PRE_AUTH KRB5_KDB_DISALLOW_SVR")
        );
    }

    #[test]
    fn single_mode_without_flags() {
        let record = parse_single(&["Attributes for erin:"]).unwrap();
        assert_eq!(record.username, "erin");
        assert_eq!(record.flags, None);
        assert!(!record.locked);
    }

    #[test]
    fn single_mode_empty_output_is_not_found() {
        let empty: [&str; 0] = [];
        assert!(matches!(parse_single(&empty), Err(Error::NotFound(_))));
        assert!(matches!(parse_single(&["", "  "]), Err(Error::NotFound(_))));
        assert!(matches!(parse_single(&["Attributes for "]), Err(Error::NotFound(_))));
    }

    #[test]
    fn single_mode_without_header_is_not_found() {
        assert!(matches!(
            parse_single(&["Principal does not exist"]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn hex_tokens() {
        assert!(is_hex_token("00a1"));
        assert!(is_hex_token("0x0080"));
        assert!(!is_hex_token("KRB5_KDB_DISALLOW_ALL_TIX"));
        assert!(!is_hex_token("0x"));
    }
}

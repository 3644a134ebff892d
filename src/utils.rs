/// Truncate error message to a reasonable number of lines for display
pub fn truncate_error_message(message: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= max_lines {
        message.to_string()
    } else {
        let truncated_lines = &lines[..max_lines];
        format!(
            "{}\n... (truncated {} more lines)",
            truncated_lines.join("\n"),
            lines.len() - max_lines
        )
    }
}

/// Render an error for terminal output, keeping at most `max_lines` lines.
pub fn display_error(err: &crate::error::Error, max_lines: usize) -> String {
    truncate_error_message(&err.to_string(), max_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::status::Classification;

    #[test]
    fn short_messages_are_untouched() {
        assert_eq!(truncate_error_message("one\ntwo", 3), "one\ntwo");
    }

    #[test]
    fn long_messages_are_truncated() {
        assert_eq!(
            truncate_error_message("a\nb\nc\nd\ne", 2),
            "a\nb\n... (truncated 3 more lines)"
        );
    }

    #[test]
    fn script_failures_are_truncated() {
        let err = Error::ScriptFailure {
            code: 1,
            classification: Classification::Error,
            message: "line one\nline two\nline three".to_string(),
        };
        assert_eq!(
            display_error(&err, 2),
            "script failed with ERROR (exit code 1): line one\nline two\n... (truncated 1 more lines)"
        );
    }
}

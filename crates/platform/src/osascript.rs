#![forbid(unsafe_code)]

use crate::error::Error;
use std::process::{Command, Output};
use tracing::trace;

const OSASCRIPT: &str = "osascript";

/// Runs `script` to completion and returns its trimmed standard output.
pub fn run(script: &str) -> Result<String, Error> {
    trace!(script, "running AppleScript");
    let output = Command::new(OSASCRIPT)
        .args(["-e", script])
        .output()
        .map_err(|source| Error::Spawn {
            program: OSASCRIPT,
            source,
        })?;
    into_reply(output)
}

/// Async variant of [`run`]. The script is killed when the future is dropped.
pub async fn run_async(script: &str) -> Result<String, Error> {
    trace!(script, "running AppleScript");
    let output = tokio::process::Command::new(OSASCRIPT)
        .args(["-e", script])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| Error::Spawn {
            program: OSASCRIPT,
            source,
        })?;
    into_reply(output)
}

fn into_reply(output: Output) -> Result<String, Error> {
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned());
    }
    let message = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    Err(Error::Script {
        status: output.status,
        number: error_number(&message),
        message,
    })
}

/// Extracts the trailing `(-1743)` style error number from an osascript
/// error message.
pub fn error_number(message: &str) -> Option<i32> {
    let inner = message.trim_end().strip_suffix(')')?;
    let start = inner.rfind('(')?;
    inner[start + 1..].parse().ok()
}

/// Renders `value` as an AppleScript string literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Renders `values` as an AppleScript list of strings.
pub fn quote_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<String> = values.into_iter().map(quote).collect();
    format!("{{{}}}", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_number_from_execution_error() {
        let message = "36:60: execution error: Not authorized to send Apple events to System Events. (-1743)";
        assert_eq!(error_number(message), Some(-1743));
    }

    #[test]
    fn error_number_absent() {
        assert_eq!(error_number("syntax error: Expected end of line"), None);
        assert_eq!(error_number("something (went) wrong"), None);
        assert_eq!(error_number(""), None);
    }

    #[test]
    fn quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn quote_list_joins_items() {
        assert_eq!(quote_list(["Open", "Later"]), r#"{"Open", "Later"}"#);
        assert_eq!(quote_list(std::iter::empty::<&str>()), "{}");
    }
}

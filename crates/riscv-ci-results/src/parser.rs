//! Test log parser.
//!
//! A log is line-oriented text. Two lines matter:
//!
//! ```text
//! Target: <identifier>
//! Result: pass|fail|not_applicable|exception
//! ```
//!
//! Everything else is ignored. When a marker appears more than once the
//! last occurrence wins, so the whole file is always scanned.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{ResultsError, ResultsResult};
use crate::result::{LogRecord, ResultKind};

fn target_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Target: (\S+)$").unwrap())
}

fn result_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Result: (\S+)$").unwrap())
}

/// Value of a marker line, or None if the line is not one.
///
/// `\S` only excludes ASCII whitespace, so values containing any other
/// Unicode whitespace are treated as non-matching lines too.
fn marker_value<'t>(re: &Regex, line: &'t str) -> Option<&'t str> {
    let value = re.captures(line)?.get(1)?.as_str();
    if value.chars().any(char::is_whitespace) {
        return None;
    }
    Some(value)
}

/// Fail unless `path` exists and is a regular file.
pub fn check_file_exists(path: &Path) -> ResultsResult<()> {
    if !path.exists() {
        return Err(ResultsError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ResultsError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Read and parse the log at `path`.
pub fn parse_log(path: &Path) -> ResultsResult<LogRecord> {
    check_file_exists(path)?;
    let bytes = fs::read(path).map_err(|e| ResultsError::io(path, e))?;
    let text = std::str::from_utf8(&bytes).map_err(|e| ResultsError::InvalidEncoding {
        path: path.to_path_buf(),
        offset: e.valid_up_to(),
    })?;
    parse_log_text(path, text)
}

/// Parse log content that was read from `path`.
///
/// `path` is only used for the record and for error messages.
pub fn parse_log_text(path: &Path, text: &str) -> ResultsResult<LogRecord> {
    let mut target: Option<&str> = None;
    let mut result: Option<ResultKind> = None;

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(value) = marker_value(target_re(), line) {
            target = Some(value);
        }

        if let Some(token) = marker_value(result_re(), line) {
            let kind = token
                .parse::<ResultKind>()
                .map_err(|_| ResultsError::InvalidResultKind {
                    token: token.to_string(),
                    expected: ResultKind::known_tokens(),
                    path: path.to_path_buf(),
                })?;
            result = Some(kind);
        }
    }

    let target = target.ok_or_else(|| ResultsError::MissingTargetField {
        path: path.to_path_buf(),
    })?;
    let result = result.ok_or_else(|| ResultsError::MissingResultField {
        path: path.to_path_buf(),
    })?;

    Ok(LogRecord::new(path, target, result))
}

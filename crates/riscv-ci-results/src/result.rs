//! Test outcome vocabulary and parsed log records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Outcome of one debug test, as written on the `Result:` line of its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Pass,
    NotApplicable,
    Fail,
    Exception,
}

impl ResultKind {
    /// All kinds in report display order.
    pub const ALL: [ResultKind; 4] = [
        ResultKind::Pass,
        ResultKind::NotApplicable,
        ResultKind::Fail,
        ResultKind::Exception,
    ];

    /// Token as it appears in logs; also the bucket directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Pass => "pass",
            ResultKind::NotApplicable => "not_applicable",
            ResultKind::Fail => "fail",
            ResultKind::Exception => "exception",
        }
    }

    /// Section heading used in the grouped listing.
    pub fn caption(&self) -> &'static str {
        match self {
            ResultKind::Pass => "Passed tests",
            ResultKind::NotApplicable => "Not applicable tests",
            ResultKind::Fail => "Failed tests",
            ResultKind::Exception => "Tests ended with exception",
        }
    }

    /// Whether this outcome makes the run fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, ResultKind::Fail | ResultKind::Exception)
    }

    /// Accepted tokens, in the order they are listed in error messages.
    pub fn known_tokens() -> Vec<&'static str> {
        vec!["pass", "fail", "not_applicable", "exception"]
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a token outside the result vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown test result: {0}")]
pub struct UnknownResultKind(pub String);

impl FromStr for ResultKind {
    type Err = UnknownResultKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(ResultKind::Pass),
            "fail" => Ok(ResultKind::Fail),
            "not_applicable" => Ok(ResultKind::NotApplicable),
            "exception" => Ok(ResultKind::Exception),
            other => Err(UnknownResultKind(other.to_string())),
        }
    }
}

/// One parsed test log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Path of the original log file
    pub source_path: PathBuf,

    /// Device/configuration the test ran against
    pub target: String,

    /// Test outcome
    pub result: ResultKind,
}

impl LogRecord {
    pub fn new(source_path: impl Into<PathBuf>, target: impl Into<String>, result: ResultKind) -> Self {
        Self {
            source_path: source_path.into(),
            target: target.into(),
            result,
        }
    }

    /// File name without directory and extension, e.g. `a` for `/logs/a.log`.
    pub fn test_name(&self) -> String {
        test_name_of(&self.source_path)
    }
}

pub(crate) fn test_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

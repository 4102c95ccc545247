//! Error taxonomy for log processing.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code used for every fatal error of the results pipeline.
///
/// Kept distinct from the verdict codes (0 = all passed, 1 = some failed)
/// so callers never confuse a broken run with failing tests.
pub const FATAL_EXIT_CODE: i32 = 2;

/// Errors raised while locating, parsing, archiving or aggregating logs.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("Directory does not exist: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("File does not exist: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Not a file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error(
        "Unknown test result '{token}' in file {}. Expected one of: {}",
        path.display(),
        expected.join(", ")
    )]
    InvalidResultKind {
        token: String,
        expected: Vec<&'static str>,
        path: PathBuf,
    },

    #[error("Log file {} is not valid UTF-8 (invalid byte at offset {offset})", path.display())]
    InvalidEncoding { path: PathBuf, offset: usize },

    #[error("Could not find target name in log file {}", path.display())]
    MissingTargetField { path: PathBuf },

    #[error("Could not find test result in log file {}", path.display())]
    MissingResultField { path: PathBuf },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Internal consistency failure; indicates a bug, not bad input.
    #[error("count mismatch for {scope}: expected {expected}, got {actual}")]
    Reconciliation {
        scope: String,
        expected: usize,
        actual: usize,
    },
}

impl ResultsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ResultsError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by malformed or missing input, as opposed to
    /// I/O trouble or internal bugs.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ResultsError::DirectoryNotFound { .. }
                | ResultsError::NotADirectory { .. }
                | ResultsError::FileNotFound { .. }
                | ResultsError::NotAFile { .. }
                | ResultsError::InvalidResultKind { .. }
                | ResultsError::InvalidEncoding { .. }
                | ResultsError::MissingTargetField { .. }
                | ResultsError::MissingResultField { .. }
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}

/// Result type for log processing operations
pub type ResultsResult<T> = Result<T, ResultsError>;

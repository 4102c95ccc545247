//! Classification and aggregation of RISC-V debug test logs.
//!
//! Each log written by the debug test suite names a target and a result.
//! This crate locates the logs of a run, parses them, copies each one into
//! a bucket directory named after its result, and produces a summary with
//! a pass/fail verdict.

mod aggregate;
mod archive;
mod error;
mod locate;
mod parser;
mod report;
mod result;

pub use aggregate::{OutcomeCounts, Summary, Verdict};
pub use archive::{archive_log, bucket_dir};
pub use error::{ResultsError, ResultsResult, FATAL_EXIT_CODE};
pub use locate::{check_dir_exists, locate_logs, LOG_EXTENSION};
pub use parser::{check_file_exists, parse_log, parse_log_text};
pub use report::{
    box_lines, render_grouped_listing, render_report, render_summary_table, EMPTY_SECTION,
    TOTAL_LABEL,
};
pub use result::{LogRecord, ResultKind, UnknownResultKind};

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

/// Outcome of processing one log directory.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedRun {
    /// Parsed records in locate order
    pub records: Vec<LogRecord>,

    /// Per-target and overall tallies
    pub summary: Summary,

    /// Aggregated verdict
    pub verdict: Verdict,
}

impl ProcessedRun {
    /// Aggregate already parsed records.
    pub fn from_records(records: Vec<LogRecord>) -> ResultsResult<Self> {
        let summary = Summary::from_records(&records)?;
        let verdict = summary.verdict();
        Ok(Self {
            records,
            summary,
            verdict,
        })
    }

    /// Text report for stdout.
    pub fn render(&self) -> String {
        render_report(self)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON form to `path`.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}

/// Parse every log in `log_dir`, archive it under `output_dir`, and
/// aggregate the results.
///
/// Stops at the first error; no summary is produced for a partial run.
pub fn process_test_logs(log_dir: &Path, output_dir: &Path) -> ResultsResult<ProcessedRun> {
    check_dir_exists(log_dir)?;
    fs::create_dir_all(output_dir).map_err(|e| ResultsError::io(output_dir, e))?;

    let logs = locate_logs(log_dir)?;
    info!(
        log_dir = %log_dir.display(),
        output_dir = %output_dir.display(),
        count = logs.len(),
        "processing test logs"
    );

    let mut records = Vec::with_capacity(logs.len());
    for path in &logs {
        let record = parse_log(path)?;
        debug!(
            log = %path.display(),
            target = %record.target,
            result = %record.result,
            "parsed log"
        );
        archive_log(&record, output_dir)?;
        records.push(record);
    }

    let run = ProcessedRun::from_records(records)?;
    info!(
        total = run.summary.totals.total,
        failed = run.summary.totals.fail,
        exceptions = run.summary.totals.exception,
        verdict = ?run.verdict,
        "aggregated test results"
    );
    Ok(run)
}

//! Shared fixtures for the CLI tests.
//!
//! - `debug_run/`: logs of a mixed debug-test run plus the report the
//!   `process-results` subcommand must print for them

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Directory holding the mixed-run logs
pub fn debug_run_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/debug_run")
}

/// Golden report for `debug_run/`
pub fn expected_report() -> String {
    fs::read_to_string(debug_run_dir().join("expected_report.txt")).unwrap()
}

/// Run the `riscv-ci` binary with `args`.
pub fn riscv_ci(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riscv-ci"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// Write a minimal log with the two markers.
pub fn write_log(dir: &Path, name: &str, target: &str, result: &str) {
    fs::write(
        dir.join(name),
        format!("Target: {}\nResult: {}\n", target, result),
    )
    .unwrap();
}

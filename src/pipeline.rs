//! CI entry points behind the `riscv-ci` subcommands.
//!
//! - `process_results`: classify debug-test logs and compute the verdict
//! - `build`: build and smoke-test OpenOCD or Spike from source
//! - `revision`: report the checked-out commit of a source tree

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use riscv_ci_results::{process_test_logs, ProcessedRun, ResultsError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::build::{build_tool, check_tool_runs, BuildError, BuildOptions, Tool};
use crate::config::{ConfigError, EffectiveConfig};
use crate::git::{revision_info, GitError, RevisionInfo};
use crate::timing::{measure, MeasureTime};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Results(#[from] ResultsError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Git(#[from] GitError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PipelineError {
    /// Exit code for this error; never 0 or 1, which carry the test verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Results(e) => e.exit_code(),
            PipelineError::Build(e) => e.exit_code(),
            PipelineError::Git(_) => 4,
            PipelineError::Io(_) => 2,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Resolve `path` against the current directory.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Inputs of `process-results`.
#[derive(Debug, Clone)]
pub struct ProcessResultsRequest {
    pub log_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Also write the run as JSON here
    pub json_summary: Option<PathBuf>,
}

/// Classify all logs and return the processed run.
///
/// The caller prints the report and exits with `run.verdict.exit_code()`.
pub fn process_results(req: &ProcessResultsRequest) -> PipelineResult<ProcessedRun> {
    let log_dir = absolutize(&req.log_dir)?;
    let output_dir = absolutize(&req.output_dir)?;

    let run = measure("Processing of test results", || process_test_logs(&log_dir, &output_dir))
        .map_err(|e| {
            if !e.is_input_error() {
                warn!("log processing stopped by a non-input error: {}", e);
            }
            e
        })?;
    if let Some(path) = &req.json_summary {
        run.write_json(path)?;
        debug!(path = %path.display(), "wrote JSON summary");
    }
    Ok(run)
}

/// Inputs of `build-openocd` / `build-spike`.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub tool: Tool,
    pub src_dir: PathBuf,
    pub install_dir: PathBuf,
    pub coverage: bool,
    pub config_path: Option<PathBuf>,
    /// CLI overrides merged on top of the config file
    pub overrides: Value,
}

/// Print the source revision, build, install and smoke-test a tool.
pub fn build(req: &BuildRequest) -> PipelineResult<PathBuf> {
    let timer = MeasureTime::start(format!("Build of {}", req.tool));

    let config = EffectiveConfig::build(req.config_path.as_deref(), Some(req.overrides.clone()))?;
    if let Ok(json) = config.to_json() {
        debug!("effective config: {}", json);
    }
    let settings = config.settings()?;

    let src_dir = absolutize(&req.src_dir)?;
    let install_dir = absolutize(&req.install_dir)?;
    let mut opts = BuildOptions::from_settings(req.tool, src_dir, install_dir, req.coverage, &settings);
    if let Some(patch) = opts.patch_file.take() {
        opts.patch_file = Some(absolutize(&patch)?);
    }

    if !opts.src_dir.is_dir() {
        return Err(BuildError::SourceDirNotFound(opts.src_dir).into());
    }
    // Only OpenOCD builds require a git checkout.
    match revision_info(&opts.src_dir) {
        Ok(rev) => rev.log(&format!("{} revision", req.tool)),
        Err(e) if req.tool == Tool::OpenOcd => return Err(e.into()),
        Err(e) => debug!("no revision info for {}: {}", req.tool, e),
    }

    build_tool(req.tool, &opts)?;
    let binary = check_tool_runs(req.tool, &opts.install_dir, opts.timeout)?;

    timer.complete();
    Ok(binary)
}

/// Revision metadata of `repo_dir`.
pub fn revision(repo_dir: &Path) -> PipelineResult<RevisionInfo> {
    Ok(revision_info(&absolutize(repo_dir)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riscv_ci_results::FATAL_EXIT_CODE;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes_never_collide_with_verdict() {
        let errors: Vec<PipelineError> = vec![
            ConfigError::ValidationError("x".to_string()).into(),
            ResultsError::MissingTargetField { path: PathBuf::from("a.log") }.into(),
            BuildError::SourceDirNotFound(PathBuf::from("/x")).into(),
            GitError::NotARepository(PathBuf::from("/x")).into(),
        ];
        for err in errors {
            assert!(err.exit_code() >= 2, "{} -> {}", err, err.exit_code());
        }
    }

    #[test]
    fn test_results_error_keeps_message() {
        let err: PipelineError = ResultsError::MissingResultField { path: PathBuf::from("/l/a.log") }.into();
        assert_eq!(err.exit_code(), FATAL_EXIT_CODE);
        assert_eq!(err.to_string(), "Could not find test result in log file /l/a.log");
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize(Path::new("/a/b")).unwrap(), PathBuf::from("/a/b"));
        let rel = absolutize(Path::new("logs")).unwrap();
        assert!(rel.is_absolute());
        assert!(rel.ends_with("logs"));
    }

    #[test]
    fn test_process_results_writes_json() {
        let logs = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::write(logs.path().join("a.log"), "Target: X\nResult: pass\n").unwrap();
        let json = out.path().join("summary.json");

        let run = process_results(&ProcessResultsRequest {
            log_dir: logs.path().to_path_buf(),
            output_dir: out.path().join("buckets"),
            json_summary: Some(json.clone()),
        })
        .unwrap();

        assert_eq!(run.verdict.exit_code(), 0);
        assert!(json.is_file());
        assert!(out.path().join("buckets/pass/a.log").is_file());
    }

    #[test]
    fn test_build_missing_source_dir() {
        let dir = TempDir::new().unwrap();
        let err = build(&BuildRequest {
            tool: Tool::Spike,
            src_dir: dir.path().join("missing"),
            install_dir: dir.path().join("install"),
            coverage: false,
            config_path: None,
            overrides: serde_json::json!({}),
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

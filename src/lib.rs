//! RISC-V debug CI harness
//!
//! Builds OpenOCD and Spike from source and turns the logs of a RISC-V
//! debug test run into a summary with a pass/fail verdict. Log processing
//! lives in the `riscv-ci-results` crate; this crate adds configuration,
//! subprocess plumbing, build steps and git metadata around it.

pub mod build;
pub mod config;
pub mod git;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod timeout;
pub mod timing;

pub use build::{build_tool, check_tool_runs, BuildError, BuildOptions, BuildPlan, Tool};
pub use config::{CiSettings, ConfigError, EffectiveConfig};
pub use git::{revision_info, GitError, RevisionInfo};
pub use pipeline::{PipelineError, PipelineResult};
pub use riscv_ci_results::{ProcessedRun, ResultKind, ResultsError, Verdict};

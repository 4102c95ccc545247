//! Source builds of OpenOCD and Spike
//!
//! Both tools use the autotools flow:
//! - `./bootstrap` (OpenOCD only)
//! - `./configure <flags> --prefix=<install_dir>`
//! - optional coverage patch
//! - `make clean`, `make -j<N>`, `make install`
//!
//! A build is first turned into a [`BuildPlan`], a list of steps, and then
//! executed. Every command runs with the source directory as its explicit
//! working directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::CiSettings;
use crate::git::{apply_patch, GitError};
use crate::logging::info_box;
use crate::process::{require_in_path, run_cmd, CommandSpec, ProcessError};

/// Compiler and linker flags for gcov instrumentation.
pub const COVERAGE_FLAGS: &[&str] = &[
    "CFLAGS=-O0 --coverage -fprofile-arcs -ftest-coverage",
    "CXXFLAGS=-O0 --coverage -fprofile-arcs -ftest-coverage",
    "LDFLAGS=-fprofile-arcs -lgcov",
];

/// A tool this harness knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// OpenOCD debug-probe controller
    OpenOcd,
    /// Spike RISC-V ISA simulator
    Spike,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::OpenOcd => "OpenOCD",
            Tool::Spike => "Spike",
        }
    }

    /// File name of the installed executable under `<prefix>/bin`.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::OpenOcd => "openocd",
            Tool::Spike => "spike",
        }
    }

    /// Installed executable for `install_dir`.
    pub fn installed_binary(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("bin").join(self.binary_name())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Everything needed to build one tool.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub src_dir: PathBuf,
    pub install_dir: PathBuf,
    pub jobs: usize,
    pub bootstrap: bool,
    pub configure_flags: Vec<String>,
    /// Build with gcov instrumentation
    pub coverage: bool,
    /// Applied after configure when `coverage` is set
    pub patch_file: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl BuildOptions {
    /// Options for `tool` taken from merged settings.
    pub fn from_settings(
        tool: Tool,
        src_dir: PathBuf,
        install_dir: PathBuf,
        coverage: bool,
        settings: &CiSettings,
    ) -> Self {
        let tool_settings = match tool {
            Tool::OpenOcd => &settings.openocd,
            Tool::Spike => &settings.spike,
        };
        Self {
            src_dir,
            install_dir,
            jobs: settings.jobs.max(1),
            bootstrap: tool_settings.bootstrap,
            configure_flags: tool_settings.configure_flags.clone(),
            coverage,
            patch_file: tool_settings.gcov_patch.clone(),
            timeout: settings.timeout().as_duration(),
        }
    }

    /// Arguments passed to `./configure`.
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = self.configure_flags.clone();
        args.push(format!("--prefix={}", self.install_dir.display()));
        if self.coverage {
            args.extend(COVERAGE_FLAGS.iter().map(|s| s.to_string()));
        }
        args
    }
}

/// One action of a build.
#[derive(Debug, Clone)]
pub enum BuildAction {
    Run(CommandSpec),
    ApplyPatch(PathBuf),
}

/// An action with the headline logged before it.
#[derive(Debug, Clone)]
pub struct BuildStep {
    pub headline: Option<String>,
    pub action: BuildAction,
}

/// Ordered steps for building one tool.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub tool: Tool,
    pub steps: Vec<BuildStep>,
}

impl BuildPlan {
    pub fn new(tool: Tool, opts: &BuildOptions) -> Self {
        let name = tool.display_name();
        let cmd = |program: &str| CommandSpec::new(program, &opts.src_dir).with_timeout(opts.timeout);
        let mut steps = Vec::new();

        if opts.bootstrap {
            steps.push(BuildStep {
                headline: Some(format!("Bootstrapping {} ...", name)),
                action: BuildAction::Run(cmd("bash").arg("./bootstrap")),
            });
        }
        steps.push(BuildStep {
            headline: Some(format!("Configuring {} ...", name)),
            action: BuildAction::Run(cmd("bash").arg("./configure").args(opts.configure_args())),
        });
        if opts.coverage {
            if let Some(patch) = &opts.patch_file {
                steps.push(BuildStep {
                    headline: None,
                    action: BuildAction::ApplyPatch(patch.clone()),
                });
            }
        }
        steps.push(BuildStep {
            headline: Some(format!("Building {} ...", name)),
            action: BuildAction::Run(cmd("make").arg("clean")),
        });
        steps.push(BuildStep {
            headline: None,
            action: BuildAction::Run(cmd("make").arg(format!("-j{}", opts.jobs))),
        });
        steps.push(BuildStep {
            headline: Some(format!("Installing {} ...", name)),
            action: BuildAction::Run(cmd("make").arg("install")),
        });

        Self { tool, steps }
    }

    /// Commands of the plan as display strings.
    pub fn command_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| match &s.action {
                BuildAction::Run(spec) => spec.to_string(),
                BuildAction::ApplyPatch(p) => format!("git apply {}", p.display()),
            })
            .collect()
    }
}

/// Build errors
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory does not exist: {}", .0.display())]
    SourceDirNotFound(PathBuf),

    #[error("build step failed: {0}")]
    Step(#[from] ProcessError),

    #[error("patching failed: {0}")]
    Patch(#[from] GitError),

    #[error("{tool} binary not found after install: {}", path.display())]
    BinaryMissing { tool: Tool, path: PathBuf },
}

impl BuildError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::SourceDirNotFound(_) => 2,
            BuildError::Step(_) => 3,
            BuildError::Patch(_) => 3,
            BuildError::BinaryMissing { .. } => 3,
        }
    }
}

/// Build and install `tool`, returning the installed binary path.
pub fn build_tool(tool: Tool, opts: &BuildOptions) -> Result<PathBuf, BuildError> {
    if !opts.src_dir.is_dir() {
        return Err(BuildError::SourceDirNotFound(opts.src_dir.clone()));
    }
    require_in_path("make")?;

    let plan = BuildPlan::new(tool, opts);
    debug!(commands = ?plan.command_lines(), "{} build plan", tool);
    for step in &plan.steps {
        if let Some(headline) = &step.headline {
            info_box(headline);
        }
        match &step.action {
            BuildAction::Run(spec) => {
                run_cmd(spec)?;
            }
            BuildAction::ApplyPatch(patch) => {
                info!("Applying patch {}", patch.display());
                apply_patch(patch, &opts.src_dir)?;
            }
        }
    }
    info_box(&format!("Finished build of {}.", tool));

    Ok(tool.installed_binary(&opts.install_dir))
}

/// Check that the installed binary exists and runs `--version`.
pub fn check_tool_runs(tool: Tool, install_dir: &Path, timeout: Option<Duration>) -> Result<PathBuf, BuildError> {
    let binary = tool.installed_binary(install_dir);
    if !binary.is_file() {
        return Err(BuildError::BinaryMissing { tool, path: binary });
    }
    info!("Checking that {} runs ...", tool);
    let spec = CommandSpec::new(binary.to_string_lossy(), install_dir)
        .arg("--version")
        .with_timeout(timeout);
    run_cmd(&spec)?;
    Ok(binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveConfig;

    fn options(tool: Tool, coverage: bool) -> BuildOptions {
        let settings = EffectiveConfig::build(None, Some(serde_json::json!({"jobs": 4})))
            .unwrap()
            .settings()
            .unwrap();
        BuildOptions::from_settings(
            tool,
            PathBuf::from("/src/tool"),
            PathBuf::from("/opt/tool"),
            coverage,
            &settings,
        )
    }

    #[test]
    fn test_openocd_plan() {
        let plan = BuildPlan::new(Tool::OpenOcd, &options(Tool::OpenOcd, false));
        assert_eq!(
            plan.command_lines(),
            vec![
                "bash ./bootstrap",
                "bash ./configure --enable-remote-bitbang --enable-jtag_vpi --enable-ftdi --prefix=/opt/tool",
                "make clean",
                "make -j4",
                "make install",
            ]
        );
        for step in &plan.steps {
            if let BuildAction::Run(spec) = &step.action {
                assert_eq!(spec.cwd, PathBuf::from("/src/tool"));
            }
        }
    }

    #[test]
    fn test_openocd_coverage_plan() {
        let plan = BuildPlan::new(Tool::OpenOcd, &options(Tool::OpenOcd, true));
        let lines = plan.command_lines();
        assert!(lines[1].ends_with("LDFLAGS=-fprofile-arcs -lgcov"));
        assert!(lines[1].contains("CFLAGS=-O0 --coverage"));
        assert_eq!(lines[2], "git apply patches/openocd_gcov_flush.patch");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_spike_plan_has_no_bootstrap() {
        let plan = BuildPlan::new(Tool::Spike, &options(Tool::Spike, false));
        assert_eq!(
            plan.command_lines(),
            vec![
                "bash ./configure --prefix=/opt/tool",
                "make clean",
                "make -j4",
                "make install",
            ]
        );
    }

    #[test]
    fn test_spike_coverage_without_patch() {
        let plan = BuildPlan::new(Tool::Spike, &options(Tool::Spike, true));
        assert!(plan
            .steps
            .iter()
            .all(|s| !matches!(s.action, BuildAction::ApplyPatch(_))));
    }

    #[test]
    fn test_installed_binary() {
        assert_eq!(
            Tool::Spike.installed_binary(Path::new("/opt/x")),
            PathBuf::from("/opt/x/bin/spike")
        );
    }

    #[test]
    fn test_missing_source_dir() {
        let err = build_tool(Tool::OpenOcd, &options(Tool::OpenOcd, false)).unwrap_err();
        assert!(matches!(err, BuildError::SourceDirNotFound(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_check_tool_runs_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = check_tool_runs(Tool::OpenOcd, dir.path(), None).unwrap_err();
        assert!(matches!(err, BuildError::BinaryMissing { .. }));
    }
}

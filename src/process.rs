//! Subprocess execution for build and git steps.
//!
//! Every command carries its own working directory; the process-wide
//! current directory is never changed.

use std::env;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::timeout::TimeoutEnforcer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where a command's stdout goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StdoutMode {
    /// Inherit the parent's stdout
    #[default]
    Display,
    /// Collect into [`CmdOutput::stdout`]
    Capture,
    /// Write to a file (truncated first)
    File(PathBuf),
    /// Drop
    Discard,
}

/// A fully described external command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
    pub stdout: StdoutMode,
    pub display_stderr: bool,
    /// Skip the "Running cmd" log lines
    pub quiet: bool,
}

impl CommandSpec {
    /// Command run in `cwd` with stdout displayed and no timeout.
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout: None,
            stdout: StdoutMode::Display,
            display_stderr: true,
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stdout(mut self, mode: StdoutMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn hide_stderr(mut self) -> Self {
        self.display_stderr = false;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    /// Captured stdout; empty unless [`StdoutMode::Capture`] was used
    pub stdout: String,
}

/// Subprocess errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}` in {}: {source}", cwd.display())]
    Spawn {
        command: String,
        cwd: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {}", describe_status(*code))]
    NonZeroExit { command: String, code: Option<i32> },

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("IO error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Did not find '{0}' in your system PATH.")]
    NotInPath(String),
}

fn describe_status(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "a signal".to_string(),
    }
}

/// Run `spec` to completion; any non-zero exit is an error.
pub fn run_cmd(spec: &CommandSpec) -> Result<CmdOutput, ProcessError> {
    let command_line = spec.to_string();
    if !spec.quiet {
        info!("Running cmd: {}", command_line);
        info!("  cwd: {}", spec.cwd.display());
        if let StdoutMode::File(path) = &spec.stdout {
            info!("  log file: {}", path.display());
        }
    }

    let io_err = |source: io::Error| ProcessError::Io {
        command: command_line.clone(),
        source,
    };

    let stdout = match &spec.stdout {
        StdoutMode::Display => Stdio::inherit(),
        StdoutMode::Capture => Stdio::piped(),
        StdoutMode::File(path) => Stdio::from(File::create(path).map_err(io_err)?),
        StdoutMode::Discard => Stdio::null(),
    };
    let stderr = if spec.display_stderr {
        Stdio::inherit()
    } else {
        Stdio::null()
    };

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            command: command_line.clone(),
            cwd: spec.cwd.clone(),
            source,
        })?;

    let reader = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = String::new();
            out.read_to_string(&mut buf).map(|_| buf)
        })
    });

    let status = wait_with_timeout(&mut child, spec.timeout, &command_line)?;

    let captured = match reader {
        Some(handle) => match handle.join() {
            Ok(result) => result.map_err(io_err)?,
            Err(_) => String::new(),
        },
        None => String::new(),
    };

    if !status.success() {
        return Err(ProcessError::NonZeroExit {
            command: command_line,
            code: status.code(),
        });
    }

    debug!(command = %command_line, "command finished");
    Ok(CmdOutput { stdout: captured })
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    command_line: &str,
) -> Result<ExitStatus, ProcessError> {
    let io_err = |source: io::Error| ProcessError::Io {
        command: command_line.to_string(),
        source,
    };

    if timeout.is_none() {
        return child.wait().map_err(io_err);
    }

    let enforcer = TimeoutEnforcer::new(timeout);
    loop {
        if let Some(status) = child.try_wait().map_err(io_err)? {
            return Ok(status);
        }
        if enforcer.check().is_timeout() {
            warn!(command = %command_line, "command timed out, killing it");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Timeout {
                command: command_line.to_string(),
                seconds: timeout.map(|t| t.as_secs()).unwrap_or_default(),
            });
        }
        let nap = enforcer
            .remaining()
            .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));
        thread::sleep(nap);
    }
}

/// Locate `tool` on `PATH`.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

/// Fail unless `tool` is on `PATH`.
pub fn require_in_path(tool: &str) -> Result<PathBuf, ProcessError> {
    find_in_path(tool).ok_or_else(|| ProcessError::NotInPath(tool.to_string()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

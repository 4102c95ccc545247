//! Logging setup and boxed CI headlines.

use std::io;

use riscv_ci_results::box_lines;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// with `verbose`. Stdout stays reserved for reports.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Log a boxed headline for a CI step.
pub fn info_box(title: &str) {
    for line in box_lines(title) {
        info!("{}", line);
    }
}

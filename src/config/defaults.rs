//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};
use std::thread;

/// Configure flags every OpenOCD build needs for the debug test suite.
pub const OPENOCD_CONFIGURE_FLAGS: &[&str] = &[
    "--enable-remote-bitbang",
    "--enable-jtag_vpi",
    "--enable-ftdi",
];

/// Patch that makes a signalled OpenOCD still flush gcov data.
pub const DEFAULT_GCOV_PATCH: &str = "patches/openocd_gcov_flush.patch";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Parallel make jobs (default: available CPUs)
    pub jobs: usize,

    /// Per-command timeout (default: none)
    pub command_timeout_seconds: Option<u64>,

    pub openocd_configure_flags: Vec<String>,

    pub openocd_gcov_patch: String,

    pub spike_configure_flags: Vec<String>,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            jobs: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            command_timeout_seconds: None,
            openocd_configure_flags: OPENOCD_CONFIGURE_FLAGS.iter().map(|s| s.to_string()).collect(),
            openocd_gcov_patch: DEFAULT_GCOV_PATCH.to_string(),
            spike_configure_flags: Vec::new(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "jobs": self.jobs,
            "command_timeout_seconds": self.command_timeout_seconds,
            "openocd": {
                "bootstrap": true,
                "configure_flags": self.openocd_configure_flags,
                "gcov_patch": self.openocd_gcov_patch
            },
            "spike": {
                "bootstrap": false,
                "configure_flags": self.spike_configure_flags
            }
        })
    }
}

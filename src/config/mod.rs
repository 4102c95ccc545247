//! Layered build configuration
//!
//! Settings are merged from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::{BuiltinDefaults, DEFAULT_GCOV_PATCH, OPENOCD_CONFIGURE_FLAGS};
pub use effective::{CiSettings, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, ToolSettings};
pub use merge::{deep_merge, merge_layers};

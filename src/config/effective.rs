//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each layer came from, so a
//! CI log shows exactly which file (by digest) shaped a build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::timeout::TimeoutConfig;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "riscv-ci/effective_config@1";

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Per-tool build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Run `./bootstrap` before `./configure`
    pub bootstrap: bool,
    /// Extra `./configure` arguments, before `--prefix`
    pub configure_flags: Vec<String>,
    /// Patch applied after configure in coverage builds
    pub gcov_patch: Option<PathBuf>,
}

/// Typed view of the merged configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CiSettings {
    pub jobs: usize,
    #[serde(default)]
    pub command_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub openocd: ToolSettings,
    #[serde(default)]
    pub spike: ToolSettings,
}

impl CiSettings {
    pub fn timeout(&self) -> TimeoutConfig {
        TimeoutConfig {
            command_seconds: self.command_timeout_seconds,
        }
    }
}

/// Merged configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,

    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Merge defaults, the optional TOML file and CLI overrides.
    ///
    /// A `config_path` that is given but missing is an error.
    pub fn build(config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = config_path {
            let (value, digest) = Self::load_toml_file(path)?;
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        Self::validate_config(&merged)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            config: merged,
            sources,
        })
    }

    /// Load a TOML file, returning its JSON value and SHA-256 digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let text = std::str::from_utf8(&bytes)
            .map_err(|e| ConfigError::ParseError(format!("{} is not UTF-8: {}", path.display(), e)))?;
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        let value = serde_json::to_value(table)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok((value, digest))
    }

    fn validate_config(config: &Value) -> Result<(), ConfigError> {
        match config.get("jobs").and_then(|v| v.as_u64()) {
            Some(0) | None => {
                return Err(ConfigError::ValidationError(
                    "jobs must be a positive integer".to_string(),
                ))
            }
            Some(_) => {}
        }

        match config.get("command_timeout_seconds") {
            None | Some(Value::Null) => {}
            Some(v) => {
                let secs = v.as_u64().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "command_timeout_seconds must be a non-negative integer".to_string(),
                    )
                })?;
                TimeoutConfig::seconds(secs)
                    .validate()
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
            }
        }

        Ok(())
    }

    /// Typed settings from the merged value.
    pub fn settings(&self) -> Result<CiSettings, ConfigError> {
        serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);
        assert!(settings.jobs >= 1);
        assert_eq!(settings.command_timeout_seconds, None);
        assert!(settings.openocd.bootstrap);
        assert!(!settings.spike.bootstrap);
        assert_eq!(
            settings.openocd.gcov_patch,
            Some(PathBuf::from("patches/openocd_gcov_flush.patch"))
        );
    }

    #[test]
    fn test_file_then_cli() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "jobs = 3").unwrap();
        writeln!(temp, "command_timeout_seconds = 7200").unwrap();
        writeln!(temp, "[spike]").unwrap();
        writeln!(temp, "configure_flags = [\"--with-boost=no\"]").unwrap();

        let cli = serde_json::json!({"jobs": 16});
        let config = EffectiveConfig::build(Some(temp.path()), Some(cli)).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.jobs, 16);
        assert_eq!(settings.command_timeout_seconds, Some(7200));
        assert_eq!(settings.spike.configure_flags, vec!["--with-boost=no"]);
        assert_eq!(settings.openocd.configure_flags.len(), 3);
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[1].origin, ConfigOrigin::File);
        assert_eq!(config.sources[1].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = EffectiveConfig::build(Some(Path::new("/no/such/riscv-ci.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_bad_toml() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "jobs = = 3").unwrap();
        let err = EffectiveConfig::build(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let err = EffectiveConfig::build(None, Some(serde_json::json!({"jobs": 0}))).unwrap_err();
        assert!(err.to_string().contains("jobs"));
    }

    #[test]
    fn test_timeout_bounds() {
        let err = EffectiveConfig::build(None, Some(serde_json::json!({"command_timeout_seconds": 0})))
            .unwrap_err();
        assert!(err.to_string().contains("command_timeout_seconds"));

        let ok = EffectiveConfig::build(None, Some(serde_json::json!({"command_timeout_seconds": 60})))
            .unwrap();
        assert_eq!(ok.settings().unwrap().timeout(), TimeoutConfig::seconds(60));
    }
}

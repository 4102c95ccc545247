//! Wall-clock limits for external commands.
//!
//! Build steps may run for a long time; an optional per-command limit lets
//! CI kill a hung `make` instead of waiting for the job runner to give up.
//! The enforcer only reports expiry. Killing the child is the caller's job.

use std::time::{Duration, Instant};

/// Upper bound accepted for a per-command timeout (one day).
pub const MAX_TIMEOUT_SECONDS: u64 = 86400;

/// Timeout configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum wall-clock time per command; None means unlimited
    pub command_seconds: Option<u64>,
}

impl TimeoutConfig {
    pub fn seconds(secs: u64) -> Self {
        Self {
            command_seconds: Some(secs),
        }
    }

    /// `command_seconds`, when set, must be in (0, 86400].
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        match self.command_seconds {
            Some(value) if value == 0 || value > MAX_TIMEOUT_SECONDS => {
                Err(TimeoutValidationError::OutOfBounds { value })
            }
            _ => Ok(()),
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        self.command_seconds.map(Duration::from_secs)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("command_timeout_seconds must be in (0, 86400], got {value}")]
    OutOfBounds { value: u64 },
}

/// Timeout check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStatus {
    Ok,
    Expired,
}

impl TimeoutStatus {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeoutStatus::Expired)
    }
}

/// Tracks elapsed time of one command against its limit.
#[derive(Debug)]
pub struct TimeoutEnforcer {
    limit: Option<Duration>,
    start_time: Instant,
}

impl TimeoutEnforcer {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            start_time: Instant::now(),
        }
    }

    pub fn check(&self) -> TimeoutStatus {
        match self.limit {
            Some(limit) if self.elapsed() > limit => TimeoutStatus::Expired,
            _ => TimeoutStatus::Ok,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Time left before expiry; None when unlimited.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|l| l.saturating_sub(self.elapsed()))
    }
}

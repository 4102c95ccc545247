//! Elapsed-time logging for CI steps.

use std::time::Instant;

use chrono::Duration;
use tracing::info;

/// Logs "<description> completed|FAILED, duration: H:MM:SS" when dropped.
///
/// The step counts as failed unless [`MeasureTime::complete`] was called,
/// so early returns through `?` are reported as failures.
#[derive(Debug)]
pub struct MeasureTime {
    description: String,
    start: Instant,
    completed: bool,
}

impl MeasureTime {
    pub fn start(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            start: Instant::now(),
            completed: false,
        }
    }

    /// Mark the step successful.
    pub fn complete(mut self) {
        self.completed = true;
    }

    fn elapsed(&self) -> Duration {
        Duration::seconds(self.start.elapsed().as_secs() as i64)
    }
}

impl Drop for MeasureTime {
    fn drop(&mut self) {
        let result = if self.completed { "completed" } else { "FAILED" };
        info!(
            "{} {}, duration: {}",
            self.description,
            result,
            format_duration(self.elapsed())
        );
    }
}

/// Run `f`, logging its duration and whether it returned `Ok`.
pub fn measure<T, E>(description: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let timer = MeasureTime::start(description);
    let result = f();
    if result.is_ok() {
        timer.complete();
    }
    result
}

/// Whole-second duration as `H:MM:SS`, with a day prefix past 24 hours.
pub fn format_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let days = total / 86400;
    let rem = total % 86400;
    let hms = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => hms,
        1 => format!("1 day, {}", hms),
        n => format!("{} days, {}", n, hms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_duration(Duration::seconds(65)), "0:01:05");
        assert_eq!(format_duration(Duration::seconds(3600 * 5 + 7)), "5:00:07");
        assert_eq!(format_duration(Duration::seconds(86400 + 61)), "1 day, 0:01:01");
        assert_eq!(format_duration(Duration::seconds(2 * 86400)), "2 days, 0:00:00");
    }

    #[test]
    fn test_measure_passes_result_through() {
        let ok: Result<u32, String> = measure("step", || Ok(7));
        assert_eq!(ok, Ok(7));
        let err: Result<u32, String> = measure("step", || Err("boom".to_string()));
        assert_eq!(err, Err("boom".to_string()));
    }
}

//! Per-target and overall tallies, and the run verdict.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ResultsError, ResultsResult};
use crate::result::{LogRecord, ResultKind};

/// Outcome counts for one target (or for all targets).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub total: usize,
    pub pass: usize,
    pub not_applicable: usize,
    pub fail: usize,
    pub exception: usize,
}

impl OutcomeCounts {
    /// Count one outcome.
    pub fn add(&mut self, kind: ResultKind) {
        self.total += 1;
        match kind {
            ResultKind::Pass => self.pass += 1,
            ResultKind::NotApplicable => self.not_applicable += 1,
            ResultKind::Fail => self.fail += 1,
            ResultKind::Exception => self.exception += 1,
        }
    }

    /// Count for a single kind.
    pub fn get(&self, kind: ResultKind) -> usize {
        match kind {
            ResultKind::Pass => self.pass,
            ResultKind::NotApplicable => self.not_applicable,
            ResultKind::Fail => self.fail,
            ResultKind::Exception => self.exception,
        }
    }

    /// Sum of the four outcome columns.
    pub fn outcome_sum(&self) -> usize {
        self.pass + self.not_applicable + self.fail + self.exception
    }

    fn accumulate(&mut self, other: &OutcomeCounts) {
        self.total += other.total;
        self.pass += other.pass;
        self.not_applicable += other.not_applicable;
        self.fail += other.fail;
        self.exception += other.exception;
    }
}

/// Aggregated result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No test failed or raised an exception
    Success,
    /// At least one `fail` or `exception`
    Failure,
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failure)
    }

    /// Process exit code: 0 for success, 1 for failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Success => 0,
            Verdict::Failure => 1,
        }
    }
}

/// Tallies for one run, keyed by target in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub targets: BTreeMap<String, OutcomeCounts>,
    pub totals: OutcomeCounts,
}

impl Summary {
    /// Tally `records` and check that every count reconciles.
    pub fn from_records(records: &[LogRecord]) -> ResultsResult<Self> {
        let mut targets: BTreeMap<String, OutcomeCounts> = BTreeMap::new();
        for record in records {
            targets
                .entry(record.target.clone())
                .or_default()
                .add(record.result);
        }

        let mut totals = OutcomeCounts::default();
        for counts in targets.values() {
            totals.accumulate(counts);
        }

        let summary = Self { targets, totals };
        summary.reconcile(records.len())?;
        Ok(summary)
    }

    /// Verify per-target and overall counts against `record_count`.
    pub fn reconcile(&self, record_count: usize) -> ResultsResult<()> {
        for (target, counts) in &self.targets {
            if counts.total != counts.outcome_sum() {
                return Err(ResultsError::Reconciliation {
                    scope: format!("target {}", target),
                    expected: counts.total,
                    actual: counts.outcome_sum(),
                });
            }
        }

        let target_total: usize = self.targets.values().map(|c| c.total).sum();
        if target_total != record_count {
            return Err(ResultsError::Reconciliation {
                scope: "sum over targets".to_string(),
                expected: record_count,
                actual: target_total,
            });
        }
        if self.totals.outcome_sum() != record_count || self.totals.total != record_count {
            return Err(ResultsError::Reconciliation {
                scope: "all targets".to_string(),
                expected: record_count,
                actual: self.totals.outcome_sum(),
            });
        }
        Ok(())
    }

    pub fn verdict(&self) -> Verdict {
        if self.totals.fail + self.totals.exception > 0 {
            Verdict::Failure
        } else {
            Verdict::Success
        }
    }

    pub fn record_count(&self) -> usize {
        self.totals.total
    }
}

//! Typed run records and derived status.
//!
//! A [`RunRecord`] tracks one scheduled generation run for a composition and
//! the set of sub-runs declared available within it. Records carry no notion
//! of real job progress; status is derived purely from elapsed wall-clock
//! time since scheduling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// The initial sub-run present after scheduling.
pub const INITIAL_SUB_RUN: &str = "0";

/// One scheduled generation run for a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Nominal composition this run belongs to.
    pub composition: String,
    /// Run identifier, decimal-integer-valued, unique per composition.
    pub run_id: String,
    /// Sub-run identifiers, decimal-integer-valued, unique, kept sorted by
    /// numeric value (never lexically).
    pub sub_runs: Vec<String>,
    /// When the run was scheduled.
    pub scheduled_at: DateTime<Utc>,
    /// When augmentation sub-runs were scheduled, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_runs_scheduled_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Creates a freshly scheduled record containing sub-run "0".
    #[must_use]
    pub fn scheduled(composition: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            composition: composition.into(),
            run_id: run_id.into(),
            sub_runs: vec![INITIAL_SUB_RUN.to_string()],
            scheduled_at: Utc::now(),
            sub_runs_scheduled_at: None,
        }
    }

    /// Returns true iff `sub_run` is declared available in this record.
    #[must_use]
    pub fn contains_sub_run(&self, sub_run: &str) -> bool {
        self.sub_runs.iter().any(|s| s == sub_run)
    }

    /// Unions `additional` into the sub-run set, keeping numeric order and
    /// uniqueness. Idempotent: adding already-present sub-runs is a no-op.
    pub fn add_sub_runs<I>(&mut self, additional: I)
    where
        I: IntoIterator<Item = String>,
    {
        for sub_run in additional {
            if !self.contains_sub_run(&sub_run) {
                self.sub_runs.push(sub_run);
            }
        }
        self.sort_sub_runs();
    }

    /// Re-sorts sub-runs by numeric value. Non-numeric entries are sorted
    /// last by string order; [`Self::validate`] rejects them on load.
    pub fn sort_sub_runs(&mut self) {
        self.sub_runs
            .sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            });
    }

    /// Validates the record invariants: non-empty composition, numeric
    /// run id, numeric and unique sub-runs.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.composition.trim().is_empty() {
            return Err(DataError::validation("composition must not be empty"));
        }
        if self.run_id.parse::<u64>().is_err() {
            return Err(DataError::validation(format!(
                "run_id must be a decimal integer: {:?}",
                self.run_id
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for sub_run in &self.sub_runs {
            if sub_run.parse::<u64>().is_err() {
                return Err(DataError::validation(format!(
                    "sub_run must be a decimal integer: {sub_run:?} (run {})",
                    self.run_id
                )));
            }
            if !seen.insert(sub_run.as_str()) {
                return Err(DataError::validation(format!(
                    "duplicate sub_run {sub_run:?} in run {}",
                    self.run_id
                )));
            }
        }
        Ok(())
    }

    /// Derives the synthetic status of this run at `now`.
    ///
    /// A phase is DONE once more than `threshold` has elapsed since its
    /// scheduling timestamp, RUNNING before that. This is a deliberately
    /// fake progress simulator with no relationship to real job completion.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>, threshold: Duration) -> StatusReport {
        StatusReport {
            run_status: phase_status(self.scheduled_at, now, threshold),
            sub_runs_status: self
                .sub_runs_scheduled_at
                .map(|at| phase_status(at, now, threshold)),
        }
    }
}

fn phase_status(scheduled_at: DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> JobStatus {
    if now.signed_duration_since(scheduled_at) > threshold {
        JobStatus::Done
    } else {
        JobStatus::Running
    }
}

/// Synthetic job status derived from elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// The threshold has not elapsed yet.
    Running,
    /// The threshold has elapsed.
    Done,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "RUNNING",
            Self::Done => "DONE",
        };
        write!(f, "{s}")
    }
}

/// Derived status for a run and, when augmentation was scheduled, its
/// sub-runs. Never stored; computed per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Status of the initial run.
    pub run_status: JobStatus,
    /// Status of the augmentation sub-runs, if scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_runs_status: Option<JobStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_record_contains_sub_run_zero() {
        let record = RunRecord::scheduled("ZrCuAl", "1");
        assert_eq!(record.sub_runs, vec!["0"]);
        assert!(record.contains_sub_run("0"));
        assert!(!record.contains_sub_run("1"));
        assert!(record.sub_runs_scheduled_at.is_none());
    }

    #[test]
    fn test_add_sub_runs_is_idempotent_union() {
        let mut record = RunRecord::scheduled("ZrCuAl", "1");
        record.add_sub_runs((1..=14).map(|n| n.to_string()));
        let first = record.sub_runs.clone();
        record.add_sub_runs((1..=14).map(|n| n.to_string()));
        assert_eq!(record.sub_runs, first);
        assert_eq!(record.sub_runs.len(), 15);
    }

    #[test]
    fn test_sub_runs_sorted_numerically_not_lexically() {
        let mut record = RunRecord::scheduled("ZrCuAl", "1");
        record.add_sub_runs(["10", "2", "14", "1"].map(str::to_string));
        assert_eq!(record.sub_runs, vec!["0", "1", "2", "10", "14"]);
    }

    #[test]
    fn test_full_augment_ordering() {
        let mut record = RunRecord::scheduled("ZrCuAl", "1");
        record.add_sub_runs((1..=14).map(|n| n.to_string()));
        let expected: Vec<String> = (0..=14).map(|n| n.to_string()).collect();
        assert_eq!(record.sub_runs, expected);
    }

    #[test]
    fn test_status_running_before_threshold_done_after() {
        let record = RunRecord::scheduled("ZrCuAl", "1");
        let threshold = Duration::seconds(300);

        let before = record.scheduled_at + Duration::seconds(299);
        assert_eq!(
            record.status_at(before, threshold).run_status,
            JobStatus::Running
        );

        let after = record.scheduled_at + Duration::seconds(301);
        assert_eq!(
            record.status_at(after, threshold).run_status,
            JobStatus::Done
        );
    }

    #[test]
    fn test_sub_runs_status_only_after_augment() {
        let mut record = RunRecord::scheduled("ZrCuAl", "1");
        let threshold = Duration::seconds(300);
        let now = record.scheduled_at + Duration::seconds(10);
        assert!(record.status_at(now, threshold).sub_runs_status.is_none());

        record.sub_runs_scheduled_at = Some(record.scheduled_at + Duration::seconds(5));
        let report = record.status_at(now, threshold);
        assert_eq!(report.sub_runs_status, Some(JobStatus::Running));

        let later = record.scheduled_at + Duration::seconds(400);
        let report = record.status_at(later, threshold);
        assert_eq!(report.run_status, JobStatus::Done);
        assert_eq!(report.sub_runs_status, Some(JobStatus::Done));
    }

    #[test]
    fn test_validate_rejects_non_numeric_ids() {
        let mut record = RunRecord::scheduled("ZrCuAl", "one");
        assert!(record.validate().is_err());

        record.run_id = "1".to_string();
        assert!(record.validate().is_ok());

        record.sub_runs.push("x".to_string());
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut record = RunRecord::scheduled("ZrCuAl", "1");
        record.sub_runs.push("0".to_string());
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Running).unwrap(),
            "\"RUNNING\""
        );
        assert_eq!(serde_json::to_string(&JobStatus::Done).unwrap(), "\"DONE\"");
    }
}

use crate::models::{FileOutcome, FileReport};
use crate::services::format_run::{RunMode, RunResult};
use camino::Utf8PathBuf;
use std::fmt;

/// Aggregate counts over one or more runs.
///
/// `changed_count + unchanged_count + excluded_count + failed_count` equals the
/// number of reports summarized; cancelled files are counted separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub changed_count: usize,
    pub unchanged_count: usize,
    pub excluded_count: usize,
    pub failed_count: usize,
    pub cancelled_count: usize,
    /// Path and rendered error for every failed file, in report order.
    pub failures: Vec<(Utf8PathBuf, String)>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.changed_count + self.unchanged_count + self.excluded_count + self.failed_count
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: Summary) {
        self.changed_count += other.changed_count;
        self.unchanged_count += other.unchanged_count;
        self.excluded_count += other.excluded_count;
        self.failed_count += other.failed_count;
        self.cancelled_count += other.cancelled_count;
        self.failures.extend(other.failures);
    }

    /// Whether the outcome should be reported as unsuccessful.
    ///
    /// Failures and cancellations always count. In check mode a file that
    /// would change counts too.
    pub fn is_failure(&self, mode: RunMode) -> bool {
        self.failed_count > 0
            || self.cancelled_count > 0
            || (mode == RunMode::Check && self.changed_count > 0)
    }

    pub fn log(&self) {
        tracing::info!("{}", self);
        for (path, message) in &self.failures {
            tracing::warn!("  {}: {}", path, message);
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changed, {} unchanged, {} excluded, {} failed",
            self.changed_count, self.unchanged_count, self.excluded_count, self.failed_count
        )?;
        if self.cancelled_count > 0 {
            write!(f, ", {} cancelled", self.cancelled_count)?;
        }
        Ok(())
    }
}

/// Count outcomes per category. Pure; order of `reports` only affects the
/// order of `failures`.
pub fn summarize(reports: &[FileReport]) -> Summary {
    let mut summary = Summary::default();
    for report in reports {
        match &report.outcome {
            FileOutcome::Changed { .. } => summary.changed_count += 1,
            FileOutcome::Unchanged => summary.unchanged_count += 1,
            FileOutcome::Excluded => summary.excluded_count += 1,
            FileOutcome::Failed(error) => {
                summary.failed_count += 1;
                summary
                    .failures
                    .push((report.path.clone(), error.to_string()));
            }
        }
    }
    summary
}

/// [`summarize`] plus the files a cancelled run never started.
pub fn summarize_run(result: &RunResult) -> Summary {
    let mut summary = summarize(&result.reports);
    summary.cancelled_count = result.cancelled.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FileError, StepFailure};

    fn reports() -> Vec<FileReport> {
        vec![
            FileReport::new(
                "a.md",
                FileOutcome::Changed {
                    new_content: "x".to_string(),
                },
            ),
            FileReport::new("b.md", FileOutcome::Unchanged),
            FileReport::new("c.md", FileOutcome::Excluded),
            FileReport::new("d.md", FileOutcome::Excluded),
            FileReport::new(
                "e.md",
                FileOutcome::Failed(FileError::Step(StepFailure::new(0, "boom", "no"))),
            ),
        ]
    }

    #[test]
    fn test_summarize_counts_each_category() {
        let summary = summarize(&reports());

        assert_eq!(summary.changed_count, 1);
        assert_eq!(summary.unchanged_count, 1);
        assert_eq!(summary.excluded_count, 2);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].0, Utf8PathBuf::from("e.md"));
        assert!(summary.failures[0].1.contains("boom"));
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn test_summarize_run_counts_cancelled() {
        let result = RunResult {
            reports: reports(),
            cancelled: vec!["f.md".into(), "g.md".into()],
        };

        let summary = summarize_run(&result);

        assert_eq!(summary.cancelled_count, 2);
        assert_eq!(summary.total(), 5);
    }

    #[test]
    fn test_merge() {
        let mut summary = summarize(&reports());
        summary.merge(summarize(&reports()));

        assert_eq!(summary.excluded_count, 4);
        assert_eq!(summary.failures.len(), 2);
    }

    #[test]
    fn test_is_failure() {
        let clean = Summary {
            unchanged_count: 3,
            excluded_count: 1,
            ..Default::default()
        };
        assert!(!clean.is_failure(RunMode::Apply));
        assert!(!clean.is_failure(RunMode::Check));

        let would_change = Summary {
            changed_count: 1,
            ..Default::default()
        };
        assert!(!would_change.is_failure(RunMode::Apply));
        assert!(would_change.is_failure(RunMode::Check));

        let cancelled = Summary {
            cancelled_count: 1,
            ..Default::default()
        };
        assert!(cancelled.is_failure(RunMode::Apply));
    }

    #[test]
    fn test_display() {
        let summary = summarize(&reports());
        assert_eq!(
            summary.to_string(),
            "1 changed, 1 unchanged, 2 excluded, 1 failed"
        );
    }
}

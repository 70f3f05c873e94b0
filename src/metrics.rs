// Performance metrics module
//
// Lightweight counters for monitoring formatting runs

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Run metrics
///
/// Atomic counters, safe to share across workers without locks. Logged on
/// completion by the CLI.
#[derive(Debug)]
pub struct Metrics {
    /// Files whose content changed (or would change in check mode)
    pub files_changed: AtomicUsize,

    /// Files left as they were by the step chain
    pub files_unchanged: AtomicUsize,

    /// Files skipped because their content matched a marker
    pub files_excluded: AtomicUsize,

    /// Files that failed (step or I/O)
    pub files_failed: AtomicUsize,

    /// Bytes written back to disk
    pub bytes_written: AtomicU64,

    /// Total time spent in step chains, in microseconds
    pub total_step_time_us: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            files_changed: AtomicUsize::new(0),
            files_unchanged: AtomicUsize::new(0),
            files_excluded: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            bytes_written: AtomicU64::new(0),
            total_step_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an outcome by its label
    pub fn record_outcome(&self, status: &str) {
        let counter = match status {
            "changed" => &self.files_changed,
            "unchanged" => &self.files_unchanged,
            "excluded" => &self.files_excluded,
            "failed" => &self.files_failed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_written(&self, bytes: usize) {
        self.bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_step_time(&self, duration: Duration) {
        self.total_step_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Files that went through the step chain
    pub fn files_formatted(&self) -> usize {
        self.files_changed.load(Ordering::Relaxed)
            + self.files_unchanged.load(Ordering::Relaxed)
            + self.files_failed.load(Ordering::Relaxed)
    }

    /// Average step chain time per formatted file in milliseconds
    pub fn avg_step_time_ms(&self) -> f64 {
        let total = self.total_step_time_us.load(Ordering::Relaxed);
        let count = self.files_formatted();
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Files: {} changed, {} unchanged, {} excluded, {} failed",
            self.files_changed.load(Ordering::Relaxed),
            self.files_unchanged.load(Ordering::Relaxed),
            self.files_excluded.load(Ordering::Relaxed),
            self.files_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Wrote {} bytes in {:.2}s (avg step chain: {:.3}ms per file)",
            self.bytes_written.load(Ordering::Relaxed),
            self.uptime().as_secs_f64(),
            self.avg_step_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

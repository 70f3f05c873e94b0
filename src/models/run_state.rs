use camino::{Utf8Path, Utf8PathBuf};

/// Live view of a formatting run.
///
/// Wrapped in `Arc<RwLock<RunState>>` by [`crate::state::StateManager`]; mutate it only
/// through the manager so change events are emitted. Holds counters only, so
/// its size does not grow with the number of files; per-file results live in
/// the run's reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunState {
    // Runtime state
    pub is_running: bool,
    pub was_cancelled: bool,
    pub format_name: Option<String>,
    pub current_file: Option<Utf8PathBuf>,

    // Progress state
    pub progress: usize,
    pub total_files: usize,

    // Results
    pub changed_count: usize,
    pub unchanged_count: usize,
    pub excluded_count: usize,
    pub failed_count: usize,
}

impl RunState {
    /// Record one file's outcome and advance progress.
    ///
    /// `status` is an outcome label: "changed", "unchanged", "excluded" or "failed".
    pub fn add_result(&mut self, path: &Utf8Path, status: &str) {
        let counter = match status {
            "changed" => &mut self.changed_count,
            "unchanged" => &mut self.unchanged_count,
            "excluded" => &mut self.excluded_count,
            "failed" => &mut self.failed_count,
            other => {
                tracing::warn!("Unknown outcome status {:?} for {}", other, path);
                return;
            }
        };
        *counter += 1;
        self.progress += 1;
    }

    pub fn processed_count(&self) -> usize {
        self.changed_count + self.unchanged_count + self.excluded_count + self.failed_count
    }

    /// Progress as a fraction in `0.0..=1.0`.
    pub fn progress_fraction(&self) -> f32 {
        if self.total_files == 0 {
            0.0
        } else {
            self.progress as f32 / self.total_files as f32
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

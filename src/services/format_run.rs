use crate::error::{ConfigError, FileError};
use crate::metrics::Metrics;
use crate::models::{CandidateFile, FileOutcome, FileReport};
use crate::services::diff::render_unified_diff;
use crate::services::resolver::Resolution;
use crate::services::steps::StepChain;
use crate::services::writer::{AtomicFileSink, FileSink};
use crate::state::StateManager;
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Semaphore, watch};

/// Whether changed content is written back or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    Check,
}

/// Reports for every file that reached an outcome, plus files skipped by cancellation.
#[derive(Debug, Default)]
pub struct RunResult {
    pub reports: Vec<FileReport>,
    pub cancelled: Vec<Utf8PathBuf>,
}

/// Per-file transform, compare and conditional write.
///
/// Cheap to clone; every worker task gets its own copy.
#[derive(Clone)]
struct FileWorker {
    chain: StepChain,
    mode: RunMode,
    sink: Arc<dyn FileSink>,
    metrics: Option<Arc<Metrics>>,
}

impl FileWorker {
    fn process(&self, candidate: CandidateFile) -> FileReport {
        let CandidateFile { path, content } = candidate;

        let started = Instant::now();
        let result = self.chain.apply(&content);
        if let Some(metrics) = &self.metrics {
            metrics.record_step_time(started.elapsed());
        }

        let new_content = match result {
            Ok(new_content) => new_content,
            Err(failure) => {
                tracing::error!("{}: {}", path, failure);
                return FileReport::new(path, FileOutcome::Failed(failure.into()));
            }
        };

        if new_content == content {
            tracing::debug!("{} is already formatted", path);
            return FileReport::new(path, FileOutcome::Unchanged);
        }

        match self.mode {
            RunMode::Check => {
                let diff = render_unified_diff(&path, &content, &new_content);
                FileReport::new(path, FileOutcome::Changed { new_content }).with_diff(diff)
            }
            RunMode::Apply => {
                if let Err(source) = self.sink.write(&path, &new_content) {
                    tracing::error!("Failed to write {}: {}", path, source);
                    let error = FileError::Write {
                        path: path.clone(),
                        source,
                    };
                    return FileReport::new(path, FileOutcome::Failed(error));
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_bytes_written(new_content.len());
                }
                tracing::info!("Formatted {}", path);
                FileReport::new(path, FileOutcome::Changed { new_content })
            }
        }
    }
}

/// Runs a [`StepChain`] over included candidates on a bounded worker pool.
///
/// Files are independent: one file's failure never stops the others. A
/// cancellation request is honoured before each file starts; a file whose
/// write has begun always completes (the sink swaps it in atomically).
pub struct FormatRun {
    worker: FileWorker,
    workers: usize,
    state: Option<StateManager>,
}

impl FormatRun {
    pub fn new(chain: StepChain) -> Self {
        Self {
            worker: FileWorker {
                chain,
                mode: RunMode::default(),
                sink: Arc::new(AtomicFileSink),
                metrics: None,
            },
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            state: None,
        }
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.worker.mode = mode;
        self
    }

    /// Maximum number of files processed at once.
    pub fn workers(mut self, workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn sink(mut self, sink: Arc<dyn FileSink>) -> Self {
        self.worker.sink = sink;
        self
    }

    pub fn state(mut self, state: StateManager) -> Self {
        self.state = Some(state);
        self
    }

    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.worker.metrics = Some(metrics);
        self
    }

    /// Process one candidate synchronously.
    pub fn process(&self, candidate: CandidateFile) -> FileReport {
        self.worker.process(candidate)
    }

    /// Run over included candidates without a way to cancel.
    pub async fn run(&self, included: Vec<CandidateFile>) -> RunResult {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with_cancel(included, cancel_rx).await
    }

    /// Run over a whole resolution: excluded and unreadable files get their
    /// outcomes directly, included files go through the step chain.
    pub async fn execute(
        &self,
        format_name: Option<String>,
        resolution: Resolution,
        cancel_rx: watch::Receiver<bool>,
    ) -> RunResult {
        let Resolution {
            included,
            excluded_paths,
            unreadable,
        } = resolution;

        if let Some(state) = &self.state {
            state.start_run(
                format_name,
                included.len() + excluded_paths.len() + unreadable.len(),
            );
        }

        let mut reports = Vec::with_capacity(excluded_paths.len() + unreadable.len());
        for path in excluded_paths {
            reports.push(FileReport::new(path, FileOutcome::Excluded));
        }
        for (path, error) in unreadable {
            reports.push(FileReport::new(path, FileOutcome::Failed(error)));
        }
        for report in &reports {
            self.record(report);
        }

        let mut result = self.run_inner(included, cancel_rx).await;
        result.reports.append(&mut reports);
        result.reports.sort_by(|a, b| a.path.cmp(&b.path));

        if let Some(state) = &self.state {
            state.finish_run();
        }
        result
    }

    /// Run over included candidates, stopping before new files once `cancel_rx` reads `true`.
    pub async fn run_with_cancel(
        &self,
        included: Vec<CandidateFile>,
        cancel_rx: watch::Receiver<bool>,
    ) -> RunResult {
        if let Some(state) = &self.state {
            state.start_run(None, included.len());
        }
        let result = self.run_inner(included, cancel_rx).await;
        if let Some(state) = &self.state {
            state.finish_run();
        }
        result
    }

    async fn run_inner(
        &self,
        included: Vec<CandidateFile>,
        cancel_rx: watch::Receiver<bool>,
    ) -> RunResult {
        tracing::info!(
            "Formatting {} files with {} workers ({:?} mode, steps: {:?})",
            included.len(),
            self.workers,
            self.worker.mode,
            self.worker.chain.names()
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = Vec::with_capacity(included.len());

        for candidate in included {
            let path = candidate.path.clone();
            let worker = self.worker.clone();
            let semaphore = semaphore.clone();
            let state = self.state.clone();
            let mut cancel_rx = cancel_rx.clone();

            let task = tokio::spawn(async move {
                // Cancellation point: before the file starts
                let _permit = tokio::select! {
                    biased;
                    permit = semaphore.acquire_owned() => permit.ok()?,
                    _ = cancellation(&mut cancel_rx) => return None,
                };
                if *cancel_rx.borrow() {
                    return None;
                }

                if let Some(state) = &state {
                    state.update_progress(candidate.path.clone());
                }

                let worker_path = candidate.path.clone();
                let report = tokio::task::spawn_blocking(move || worker.process(candidate))
                    .await
                    .unwrap_or_else(|e| {
                        let error = FileError::Worker {
                            path: worker_path.clone(),
                            message: e.to_string(),
                        };
                        FileReport::new(worker_path, FileOutcome::Failed(error))
                    });
                Some(report)
            });

            tasks.push((path, task));
        }

        let mut result = RunResult::default();
        for (path, task) in tasks {
            match task.await {
                Ok(Some(report)) => {
                    self.record(&report);
                    result.reports.push(report);
                }
                Ok(None) => {
                    tracing::warn!("Cancelled before starting {}", path);
                    result.cancelled.push(path);
                }
                Err(e) => {
                    tracing::error!("Task for {} failed to join: {}", path, e);
                    let error = FileError::Worker {
                        path: path.clone(),
                        message: e.to_string(),
                    };
                    let report = FileReport::new(path, FileOutcome::Failed(error));
                    self.record(&report);
                    result.reports.push(report);
                }
            }
        }

        if !result.cancelled.is_empty() {
            if let Some(state) = &self.state {
                state.cancel_run();
            }
        }

        result.reports.sort_by(|a, b| a.path.cmp(&b.path));
        result.cancelled.sort();
        result
    }

    fn record(&self, report: &FileReport) {
        let status = report.outcome.label();
        if let Some(metrics) = &self.worker.metrics {
            metrics.record_outcome(status);
        }
        if let Some(state) = &self.state {
            state.add_file_result(report.path.clone(), status);
        }
    }
}

/// Resolves once cancellation is requested; never resolves if the sender is
/// dropped without requesting it.
async fn cancellation(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

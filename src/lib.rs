// formatgate - content-gated formatting pipeline
//
// This is the library crate containing the core pipeline and data structures.
// The binary crate (main.rs) provides the CLI entry point.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use error::{ConfigError, FileError, StepFailure};
pub use metrics::Metrics;
pub use models::{
    CandidateFile, ExclusionMarkers, FileOutcome, FileReport, FormatConfig, Marker, PathPattern,
    ProjectConfig, Settings, StepConfig,
};
pub use services::{
    ContentPredicate, FormatRun, FormatStep, RunMode, RunResult, StepChain, Summary,
    TargetResolver, summarize, summarize_run,
};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Everything one run needs: where, which files, which markers, which steps.
#[derive(Debug, Clone)]
pub struct FormatRequest {
    pub root: Utf8PathBuf,
    pub pattern: PathPattern,
    /// `None` disables content-based exclusion.
    pub markers: Option<ExclusionMarkers>,
    pub chain: StepChain,
    pub mode: RunMode,
    /// `None` uses the available parallelism.
    pub workers: Option<usize>,
    pub respect_ignore_files: bool,
}

impl FormatRequest {
    pub fn new(root: impl Into<Utf8PathBuf>, pattern: PathPattern, chain: StepChain) -> Self {
        Self {
            root: root.into(),
            pattern,
            markers: None,
            chain,
            mode: RunMode::default(),
            workers: None,
            respect_ignore_files: false,
        }
    }

    /// Build a request from one configured format.
    pub fn from_config(
        root: impl Into<Utf8PathBuf>,
        format: &FormatConfig,
    ) -> Result<Self, ConfigError> {
        let mut request = Self::new(
            root,
            format.path_pattern()?,
            StepChain::from_configs(&format.steps)?,
        );
        request.markers = format.exclusion_markers()?;
        Ok(request)
    }

    pub fn markers(mut self, markers: ExclusionMarkers) -> Self {
        self.markers = Some(markers);
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn respect_ignore_files(mut self, yes: bool) -> Self {
        self.respect_ignore_files = yes;
        self
    }

    /// Validate, resolve and run. Configuration problems are returned before
    /// any file is read.
    pub async fn run(
        self,
        format_name: Option<String>,
        cancel_rx: watch::Receiver<bool>,
        state: Option<StateManager>,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<RunResult, ConfigError> {
        let resolver =
            TargetResolver::new(&self.root)?.respect_ignore_files(self.respect_ignore_files);

        let mut run = FormatRun::new(self.chain).mode(self.mode);
        if let Some(workers) = self.workers {
            run = run.workers(workers)?;
        }
        if let Some(state) = state {
            run = run.state(state);
        }
        if let Some(metrics) = metrics {
            run = run.metrics(metrics);
        }

        let predicate = self.markers.map(ContentPredicate::new);
        let resolution = resolver.resolve(&self.pattern, predicate.as_ref());

        Ok(run.execute(format_name, resolution, cancel_rx).await)
    }
}

/// Run one request to completion and summarize it.
///
/// Stateless: the outcome depends only on the request and the files under
/// its root.
pub async fn format_target(request: FormatRequest) -> Result<Summary, ConfigError> {
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let result = request.run(None, cancel_rx, None, None).await?;
    Ok(summarize_run(&result))
}

//! Services module - the formatting pipeline.
//!
//! Everything here is independent of the CLI and can be driven directly by
//! library callers or tests.
//!
//! # Components
//!
//! - [`resolver`]: walks the root directory, applies the target pattern and the
//!   content predicate, and splits files into included and excluded sets
//! - [`predicate`]: decides whether a file's content contains an exclusion marker
//! - [`steps`]: the [`FormatStep`] trait, built-in steps and [`StepChain`]
//! - [`format_run`]: runs a step chain over included files on a bounded
//!   worker pool, with cancellation
//! - [`writer`]: atomic write-back of changed content
//! - [`diff`]: unified diffs for check mode
//! - [`report`]: aggregate counts over per-file outcomes
//!
//! # Usage Example
//!
//! ```ignore
//! use formatgate::services::{ContentPredicate, FormatRun, StepChain, TargetResolver};
//!
//! let resolver = TargetResolver::new(root)?;
//! let resolution = resolver.resolve(&pattern, Some(&ContentPredicate::new(markers)));
//! let run = FormatRun::new(StepChain::from_configs(&format.steps)?);
//! let result = run.execute(None, resolution, cancel_rx).await;
//! let summary = summarize_run(&result);
//! ```

pub mod diff;
pub mod format_run;
pub mod predicate;
pub mod report;
pub mod resolver;
pub mod steps;
pub mod writer;

pub use diff::render_unified_diff;
pub use format_run::{FormatRun, RunMode, RunResult};
pub use predicate::{ContentPredicate, is_excluded};
pub use report::{Summary, summarize, summarize_run};
pub use resolver::{Resolution, TargetResolver};
pub use steps::{
    EndWithNewlineStep, FnStep, FormatStep, LicenseHeaderStep, LowercaseStep, ReplaceRegexStep,
    StepChain, TrimTrailingWhitespaceStep,
};
pub use writer::{AtomicFileSink, FileSink};

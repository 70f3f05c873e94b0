//! Data models for formatgate.
//!
//! - [`ExclusionMarkers`] / [`Marker`]: content markers that exclude a file from formatting
//! - [`PathPattern`]: include/exclude globs relative to a root directory
//! - [`CandidateFile`], [`FileOutcome`], [`FileReport`]: per-file data flowing through a run
//! - [`ProjectConfig`], [`FormatConfig`], [`StepConfig`]: the `formatgate.yaml` surface
//! - [`Settings`]: runtime settings (workers, logging)
//! - [`RunState`]: live progress and per-file results of the current run

pub mod config;
pub mod markers;
pub mod outcome;
pub mod pattern;
pub mod run_state;

pub use config::{FormatConfig, MarkerList, ProjectConfig, Settings, StepConfig};
pub use markers::{ExclusionMarkers, Marker};
pub use outcome::{CandidateFile, FileOutcome, FileReport};
pub use pattern::PathPattern;
pub use run_state::RunState;

//! Error taxonomy for formatting runs.
//!
//! - [`ConfigError`]: invalid configuration, fatal before any file is touched
//! - [`StepFailure`]: one step failed on one file's content
//! - [`FileError`]: everything that can fail for a single file (steps or I/O)

use camino::Utf8PathBuf;
use thiserror::Error;

/// Configuration problems detected before a run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Exclusion is enabled but no markers were given")]
    EmptyMarkers,

    #[error("Marker #{0} is empty")]
    EmptyMarker(usize),

    #[error("Invalid marker regex {pattern:?}: {source}")]
    InvalidMarkerRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Target pattern list is empty")]
    EmptyPattern,

    #[error("Target pattern {0:?} escapes the root directory")]
    EscapingPattern(String),

    #[error("Invalid glob {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Root directory {0} does not exist or is not a directory")]
    InvalidRoot(Utf8PathBuf),

    #[error("Invalid step {step:?}: {message}")]
    InvalidStep { step: String, message: String },

    #[error("Unknown format {0:?}")]
    UnknownFormat(String),

    #[error("Worker count must be at least 1")]
    ZeroWorkers,
}

/// A single step failed while transforming one file's content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Step #{index} ({name}) failed: {message}")]
pub struct StepFailure {
    pub index: usize,
    pub name: String,
    pub message: String,
}

impl StepFailure {
    pub fn new(index: usize, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Per-file failure. Never crosses file boundaries; recorded in the file's outcome.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Step(#[from] StepFailure),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: Utf8PathBuf },

    #[error("Failed to walk {path}: {message}")]
    Walk { path: Utf8PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker for {path} panicked: {message}")]
    Worker { path: Utf8PathBuf, message: String },
}

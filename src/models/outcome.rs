use crate::error::FileError;
use camino::Utf8PathBuf;

/// A resolved path plus its content snapshot at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: Utf8PathBuf,
    pub content: String,
}

impl CandidateFile {
    pub fn new(path: impl Into<Utf8PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Terminal classification of one file after a run.
#[derive(Debug)]
pub enum FileOutcome {
    Unchanged,
    /// In check mode the new content was computed but not written.
    Changed { new_content: String },
    Excluded,
    Failed(FileError),
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Unchanged => "unchanged",
            FileOutcome::Changed { .. } => "changed",
            FileOutcome::Excluded => "excluded",
            FileOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed(_))
    }
}

/// One file's outcome, tagged with its path.
#[derive(Debug)]
pub struct FileReport {
    pub path: Utf8PathBuf,
    pub outcome: FileOutcome,
    /// Unified diff, rendered for changed files in check mode.
    pub diff: Option<String>,
}

impl FileReport {
    pub fn new(path: impl Into<Utf8PathBuf>, outcome: FileOutcome) -> Self {
        Self {
            path: path.into(),
            outcome,
            diff: None,
        }
    }

    pub fn with_diff(mut self, diff: String) -> Self {
        self.diff = Some(diff);
        self
    }
}

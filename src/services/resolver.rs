use crate::error::{ConfigError, FileError};
use crate::models::{CandidateFile, PathPattern};
use crate::services::predicate::ContentPredicate;
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use std::fs;

/// Candidates partitioned by the content predicate.
///
/// Excluded paths carry no content: once excluded, a file is never read,
/// compared or written again during the run.
#[derive(Debug, Default)]
pub struct Resolution {
    pub included: Vec<CandidateFile>,
    pub excluded_paths: Vec<Utf8PathBuf>,
    /// Candidates that could not be read; they surface as failed outcomes.
    pub unreadable: Vec<(Utf8PathBuf, FileError)>,
}

impl Resolution {
    pub fn candidate_count(&self) -> usize {
        self.included.len() + self.excluded_paths.len() + self.unreadable.len()
    }
}

/// Expands a [`PathPattern`] under a root and partitions the matches.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    root: Utf8PathBuf,
    respect_ignore_files: bool,
}

impl TargetResolver {
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> Result<Self, ConfigError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root.to_path_buf()));
        }
        let root = root
            .canonicalize_utf8()
            .map_err(|_| ConfigError::InvalidRoot(root.to_path_buf()))?;
        Ok(Self {
            root,
            respect_ignore_files: false,
        })
    }

    /// Honour .gitignore and .ignore files while walking.
    pub fn respect_ignore_files(mut self, yes: bool) -> Self {
        self.respect_ignore_files = yes;
        self
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Sorted list of files under the root matching `pattern`.
    ///
    /// Entries the walker cannot read are logged and left out; [`resolve`]
    /// reports them as unreadable instead.
    ///
    /// [`resolve`]: TargetResolver::resolve
    pub fn discover(&self, pattern: &PathPattern) -> Vec<Utf8PathBuf> {
        let (paths, errors) = self.walk(pattern);
        for (_, e) in &errors {
            tracing::warn!("{}", e);
        }
        paths
    }

    fn walk(&self, pattern: &PathPattern) -> (Vec<Utf8PathBuf>, Vec<(Utf8PathBuf, FileError)>) {
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .git_ignore(self.respect_ignore_files)
            .git_global(self.respect_ignore_files)
            .git_exclude(self.respect_ignore_files)
            .ignore(self.respect_ignore_files)
            .require_git(false)
            .follow_links(false)
            .build();

        let mut paths = Vec::new();
        let mut errors = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(walk_error(&self.root, &e));
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(path) = Utf8PathBuf::try_from(entry.into_path()) else {
                tracing::warn!("Skipping non UTF-8 path under {}", self.root);
                continue;
            };
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if pattern.matches(relative) {
                paths.push(path);
            }
        }

        paths.sort();
        errors.sort_by(|a, b| a.0.cmp(&b.0));
        (paths, errors)
    }

    /// Discover candidates, read each once and route it by `predicate`.
    ///
    /// With no predicate every readable candidate is included.
    pub fn resolve(
        &self,
        pattern: &PathPattern,
        predicate: Option<&ContentPredicate>,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        let (paths, walk_errors) = self.walk(pattern);

        for (path, e) in walk_errors {
            tracing::warn!("{}", e);
            resolution.unreadable.push((path, e));
        }

        for path in paths {
            let content = match read_content(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("{}", e);
                    resolution.unreadable.push((path, e));
                    continue;
                }
            };

            if let Some(predicate) = predicate {
                if let Some(marker) = predicate.matching_marker(&content) {
                    tracing::debug!("Excluding {} (contains {:?})", path, marker);
                    resolution.excluded_paths.push(path);
                    continue;
                }
            }

            tracing::debug!("Including {}", path);
            resolution.included.push(CandidateFile::new(path, content));
        }

        tracing::info!(
            "Resolved {} candidates under {}: {} included, {} excluded, {} unreadable",
            resolution.candidate_count(),
            self.root,
            resolution.included.len(),
            resolution.excluded_paths.len(),
            resolution.unreadable.len()
        );

        resolution
    }
}

fn read_content(path: &Utf8Path) -> Result<String, FileError> {
    let bytes = fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| FileError::NotUtf8 {
        path: path.to_path_buf(),
    })
}

/// The innermost path an [`ignore::Error`] refers to, if any.
fn error_path(error: &ignore::Error) -> Option<&std::path::Path> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

fn walk_error(root: &Utf8Path, error: &ignore::Error) -> (Utf8PathBuf, FileError) {
    let path = error_path(error)
        .and_then(|p| Utf8PathBuf::try_from(p.to_path_buf()).ok())
        .unwrap_or_else(|| root.to_path_buf());
    let error = FileError::Walk {
        path: path.clone(),
        message: error.to_string(),
    };
    (path, error)
}

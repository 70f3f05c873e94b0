use crate::error::ConfigError;
use camino::{Utf8Component, Utf8Path};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Ordered set of glob include expressions (plus optional excludes), relative to a root.
///
/// Absolute globs and globs with `..` components are rejected so that every
/// resolved path stays within the root.
#[derive(Debug, Clone)]
pub struct PathPattern {
    includes: Vec<String>,
    excludes: Vec<String>,
    include_set: GlobSet,
    exclude_set: GlobSet,
}

impl PathPattern {
    pub fn new<I, S>(includes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_excludes(includes, Vec::<String>::new())
    }

    pub fn with_excludes<I, S, E, T>(includes: I, excludes: E) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let includes: Vec<String> = includes.into_iter().map(Into::into).collect();
        let excludes: Vec<String> = excludes.into_iter().map(Into::into).collect();

        if includes.is_empty() {
            return Err(ConfigError::EmptyPattern);
        }

        let include_set = build_set(&includes)?;
        let exclude_set = build_set(&excludes)?;

        Ok(Self {
            includes,
            excludes,
            include_set,
            exclude_set,
        })
    }

    /// Match a path relative to the root.
    pub fn matches(&self, relative: &Utf8Path) -> bool {
        self.include_set.is_match(relative) && !self.exclude_set.is_match(relative)
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }
}

fn build_set(globs: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        check_stays_in_root(pattern)?;
        let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidGlob {
        pattern: globs.join(", "),
        source,
    })
}

fn check_stays_in_root(pattern: &str) -> Result<(), ConfigError> {
    let escapes = Utf8Path::new(pattern).components().any(|c| {
        matches!(
            c,
            Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ConfigError::EscapingPattern(pattern.to_string()));
    }
    Ok(())
}

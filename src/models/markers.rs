use crate::error::ConfigError;
use regex::Regex;

/// A single exclusion marker.
///
/// Literals are case-sensitive substrings. Regex markers must be requested
/// explicitly; nothing is auto-detected from the fragment's text.
#[derive(Debug, Clone)]
pub enum Marker {
    Literal(String),
    Regex(Regex),
}

impl Marker {
    pub fn literal(fragment: impl Into<String>) -> Self {
        Marker::Literal(fragment.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Marker::Regex)
            .map_err(|source| ConfigError::InvalidMarkerRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Containment test against the whole content (not line by line).
    pub fn is_contained_in(&self, content: &str) -> bool {
        match self {
            Marker::Literal(fragment) => content.contains(fragment.as_str()),
            Marker::Regex(re) => re.is_match(content),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Marker::Literal(fragment) => fragment,
            Marker::Regex(re) => re.as_str(),
        }
    }

    fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// Ordered, non-empty set of markers combined with logical OR.
#[derive(Debug, Clone)]
pub struct ExclusionMarkers {
    markers: Vec<Marker>,
}

impl ExclusionMarkers {
    /// Build a marker set. Fails on an empty list or an empty fragment, since
    /// an empty fragment would match every file.
    pub fn new(markers: Vec<Marker>) -> Result<Self, ConfigError> {
        if markers.is_empty() {
            return Err(ConfigError::EmptyMarkers);
        }
        if let Some(index) = markers.iter().position(Marker::is_empty) {
            return Err(ConfigError::EmptyMarker(index));
        }
        Ok(Self { markers })
    }

    /// Convenience for an already-split list of literal fragments.
    pub fn literals<I, S>(fragments: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(fragments.into_iter().map(Marker::literal).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

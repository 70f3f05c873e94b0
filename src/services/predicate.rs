use crate::models::ExclusionMarkers;

/// Returns true iff `content` contains at least one marker.
///
/// The whole content is scanned; markers may sit on any line and regex
/// markers may span lines.
pub fn is_excluded(content: &str, markers: &ExclusionMarkers) -> bool {
    markers.iter().any(|marker| marker.is_contained_in(content))
}

/// Exclusion predicate bound to a marker set.
#[derive(Debug, Clone)]
pub struct ContentPredicate {
    markers: ExclusionMarkers,
}

impl ContentPredicate {
    pub fn new(markers: ExclusionMarkers) -> Self {
        Self { markers }
    }

    pub fn is_excluded(&self, content: &str) -> bool {
        is_excluded(content, &self.markers)
    }

    /// The first marker found in `content`, for logging.
    pub fn matching_marker(&self, content: &str) -> Option<&str> {
        self.markers
            .iter()
            .find(|marker| marker.is_contained_in(content))
            .map(|marker| marker.as_str())
    }

    pub fn markers(&self) -> &ExclusionMarkers {
        &self.markers
    }
}

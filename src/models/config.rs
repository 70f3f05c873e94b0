use crate::error::ConfigError;
use crate::models::{ExclusionMarkers, Marker, PathPattern};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Delimiter used when several literal markers are packed into one string.
pub const MARKER_DELIMITER: char = '|';

/// Project configuration from formatgate.yaml
///
/// Contains the named formats, in the order they run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub formats: IndexMap<String, FormatConfig>,
}

/// One named format: which files, which markers exclude them, which steps run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    pub target: Vec<String>,

    #[serde(default)]
    pub target_exclude: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_if_content_contains: Option<MarkerList>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_if_content_matches: Vec<String>,

    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Literal markers, either as one `|`-delimited string or as a list.
///
/// List entries are taken verbatim, so a marker containing `|` must be
/// written in list form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerList {
    Delimited(String),
    List(Vec<String>),
}

impl MarkerList {
    /// Individual fragments. Only the delimited form is split.
    pub fn fragments(&self) -> Vec<String> {
        match self {
            MarkerList::Delimited(s) => s.split(MARKER_DELIMITER).map(str::to_string).collect(),
            MarkerList::List(items) => items.clone(),
        }
    }
}

/// Declarative form of a formatting step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepConfig {
    Lowercase,
    TrimTrailingWhitespace,
    EndWithNewline,
    LicenseHeader {
        header: String,
        delimiter: String,
    },
    ReplaceRegex {
        name: String,
        find: String,
        replace: String,
    },
}

impl FormatConfig {
    pub fn path_pattern(&self) -> Result<PathPattern, ConfigError> {
        PathPattern::with_excludes(self.target.iter().cloned(), self.target_exclude.iter().cloned())
    }

    /// Markers for this format, or `None` when content exclusion is disabled.
    ///
    /// Literal fragments come first, then regex markers, each in configured order.
    pub fn exclusion_markers(&self) -> Result<Option<ExclusionMarkers>, ConfigError> {
        let literal = self.exclude_if_content_contains.as_ref();
        if literal.is_none() && self.exclude_if_content_matches.is_empty() {
            return Ok(None);
        }

        let mut markers: Vec<Marker> = literal
            .map(MarkerList::fragments)
            .unwrap_or_default()
            .into_iter()
            .map(Marker::literal)
            .collect();

        for pattern in &self.exclude_if_content_matches {
            markers.push(Marker::regex(pattern)?);
        }

        ExclusionMarkers::new(markers).map(Some)
    }
}

impl ProjectConfig {
    pub fn format(&self, name: &str) -> Result<&FormatConfig, ConfigError> {
        self.formats
            .get(name)
            .ok_or_else(|| ConfigError::UnknownFormat(name.to_string()))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Runtime settings, layered from defaults, an optional settings file and
/// `FORMATGATE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_dir: Option<String>,

    /// Honour .gitignore/.ignore files during discovery
    #[serde(default)]
    pub respect_ignore_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            log_level: default_log_level(),
            log_dir: None,
            respect_ignore_files: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_with(contains: Option<MarkerList>, matches: Vec<String>) -> FormatConfig {
        FormatConfig {
            target: vec!["**/*.md".to_string()],
            target_exclude: Vec::new(),
            exclude_if_content_contains: contains,
            exclude_if_content_matches: matches,
            steps: vec![StepConfig::Lowercase],
        }
    }

    #[test]
    fn test_delimited_markers_split() {
        let list = MarkerList::Delimited(
            "// Generated by Mr. Roboto|// Generated by Mrs. Call".to_string(),
        );
        assert_eq!(
            list.fragments(),
            vec!["// Generated by Mr. Roboto", "// Generated by Mrs. Call"]
        );
    }

    #[test]
    fn test_list_entries_are_not_split() {
        let list = MarkerList::List(vec![
            "a|b".to_string(),
            "// Generated by Mrs. Call".to_string(),
        ]);
        assert_eq!(list.fragments(), vec!["a|b", "// Generated by Mrs. Call"]);

        let format = format_with(Some(list), Vec::new());
        let markers = format.exclusion_markers().unwrap().unwrap();
        assert_eq!(markers.len(), 2);
    }

    #[test]
    fn test_no_markers_means_disabled() {
        let format = format_with(None, Vec::new());
        assert!(format.exclusion_markers().unwrap().is_none());
    }

    #[test]
    fn test_trailing_delimiter_is_config_error() {
        let format = format_with(Some(MarkerList::Delimited("a|".to_string())), Vec::new());
        assert!(matches!(
            format.exclusion_markers(),
            Err(ConfigError::EmptyMarker(1))
        ));
    }

    #[test]
    fn test_literals_then_regexes() {
        let format = format_with(
            Some(MarkerList::List(vec!["a".to_string()])),
            vec!["b+".to_string()],
        );
        let markers = format.exclusion_markers().unwrap().unwrap();
        let kinds: Vec<bool> = markers
            .iter()
            .map(|m| matches!(m, Marker::Regex(_)))
            .collect();
        assert_eq!(kinds, vec![false, true]);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert!(settings.workers >= 1);
        assert_eq!(settings.log_level, "info");
        assert!(!settings.respect_ignore_files);
    }

    #[test]
    fn test_step_config_yaml_shape() {
        let yaml = r#"
- type: lowercase
- type: license_header
  header: "// My CopyRights header"
  delimiter: "--"
"#;
        let steps: Vec<StepConfig> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(steps[0], StepConfig::Lowercase);
        assert_eq!(
            steps[1],
            StepConfig::LicenseHeader {
                header: "// My CopyRights header".to_string(),
                delimiter: "--".to_string(),
            }
        );
    }
}

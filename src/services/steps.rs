use crate::error::{ConfigError, StepFailure};
use crate::models::StepConfig;
use anyhow::{Result, bail};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A named, pure content-to-content transformation.
///
/// Implementations must be deterministic and must not touch the filesystem;
/// [`StepChain`] only ever hands them in-memory content.
#[cfg_attr(test, mockall::automock)]
pub trait FormatStep: Send + Sync {
    fn name(&self) -> String;

    fn apply(&self, content: &str) -> Result<String>;
}

/// Ordered, immutable sequence of steps. Step N receives the output of step N-1.
#[derive(Clone, Default)]
pub struct StepChain {
    steps: Vec<Arc<dyn FormatStep>>,
}

impl StepChain {
    pub fn new(steps: Vec<Arc<dyn FormatStep>>) -> Self {
        Self { steps }
    }

    /// Build a chain from its declarative form, compiling regexes up front.
    pub fn from_configs(configs: &[StepConfig]) -> Result<Self, ConfigError> {
        let steps = configs
            .iter()
            .map(build_step)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    /// Apply every step in order. The first failure aborts the chain; no
    /// partially transformed content is returned.
    pub fn apply(&self, content: &str) -> Result<String, StepFailure> {
        let mut current = content.to_string();
        for (index, step) in self.steps.iter().enumerate() {
            current = step
                .apply(&current)
                .map_err(|e| StepFailure::new(index, step.name(), format!("{e:#}")))?;
        }
        Ok(current)
    }

    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for StepChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepChain")
            .field("steps", &self.names())
            .finish()
    }
}

fn build_step(config: &StepConfig) -> Result<Arc<dyn FormatStep>, ConfigError> {
    let step: Arc<dyn FormatStep> = match config {
        StepConfig::Lowercase => Arc::new(LowercaseStep),
        StepConfig::TrimTrailingWhitespace => Arc::new(TrimTrailingWhitespaceStep),
        StepConfig::EndWithNewline => Arc::new(EndWithNewlineStep),
        StepConfig::LicenseHeader { header, delimiter } => {
            Arc::new(LicenseHeaderStep::new(header, delimiter)?)
        }
        StepConfig::ReplaceRegex {
            name,
            find,
            replace,
        } => Arc::new(ReplaceRegexStep::new(name, find, replace)?),
    };
    Ok(step)
}

/// Lower-cases the whole content.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseStep;

impl FormatStep for LowercaseStep {
    fn name(&self) -> String {
        "lowercase".to_string()
    }

    fn apply(&self, content: &str) -> Result<String> {
        Ok(content.to_lowercase())
    }
}

/// Strips spaces and tabs at the end of every line, keeping line endings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimTrailingWhitespaceStep;

impl FormatStep for TrimTrailingWhitespaceStep {
    fn name(&self) -> String {
        "trim_trailing_whitespace".to_string()
    }

    fn apply(&self, content: &str) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        for line in content.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            out.push_str(body.trim_end_matches([' ', '\t']));
            out.push_str(ending);
        }
        Ok(out)
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Ensures non-empty content ends with exactly one newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndWithNewlineStep;

impl FormatStep for EndWithNewlineStep {
    fn name(&self) -> String {
        "end_with_newline".to_string()
    }

    fn apply(&self, content: &str) -> Result<String> {
        if content.is_empty() {
            return Ok(String::new());
        }
        let mut out = content.trim_end().to_string();
        out.push('\n');
        Ok(out)
    }
}

/// Replaces everything above the first delimiter line with a fixed header.
///
/// The delimiter is a regex anchored at the start of a line. Content with no
/// delimiter line fails rather than silently gaining a header.
#[derive(Debug, Clone)]
pub struct LicenseHeaderStep {
    header: String,
    delimiter: Regex,
}

impl LicenseHeaderStep {
    pub fn new(header: &str, delimiter: &str) -> Result<Self, ConfigError> {
        let delimiter = Regex::new(&format!("(?m)^(?:{delimiter})")).map_err(|e| {
            ConfigError::InvalidStep {
                step: "license_header".to_string(),
                message: format!("invalid delimiter {delimiter:?}: {e}"),
            }
        })?;
        let mut header = header.to_string();
        if !header.ends_with('\n') {
            header.push('\n');
        }
        Ok(Self { header, delimiter })
    }
}

impl FormatStep for LicenseHeaderStep {
    fn name(&self) -> String {
        "license_header".to_string()
    }

    fn apply(&self, content: &str) -> Result<String> {
        let Some(found) = self.delimiter.find(content) else {
            bail!(
                "unable to find delimiter regex {:?}",
                self.delimiter.as_str()
            );
        };
        let body = &content[found.start()..];
        if content[..found.start()] == *self.header {
            return Ok(content.to_string());
        }
        let mut out = String::with_capacity(self.header.len() + body.len());
        out.push_str(&self.header);
        out.push_str(body);
        Ok(out)
    }
}

/// Regex find-and-replace over the whole content.
#[derive(Debug, Clone)]
pub struct ReplaceRegexStep {
    name: String,
    find: Regex,
    replace: String,
}

impl ReplaceRegexStep {
    pub fn new(name: &str, find: &str, replace: &str) -> Result<Self, ConfigError> {
        let find = Regex::new(find).map_err(|e| ConfigError::InvalidStep {
            step: name.to_string(),
            message: format!("invalid pattern {find:?}: {e}"),
        })?;
        Ok(Self {
            name: name.to_string(),
            find,
            replace: replace.to_string(),
        })
    }
}

impl FormatStep for ReplaceRegexStep {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, content: &str) -> Result<String> {
        Ok(self
            .find
            .replace_all(content, self.replace.as_str())
            .into_owned())
    }
}

/// Wraps a closure as a step, for library callers with ad-hoc transformations.
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> FormatStep for FnStep<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn apply(&self, content: &str) -> Result<String> {
        (self.f)(content)
    }
}

use crate::models::{ProjectConfig, Settings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File};
use std::fs;

/// Name of the project file looked up at the root.
pub const PROJECT_CONFIG_FILE: &str = "formatgate.yaml";

/// Base name of the optional settings file (`formatgate.toml`, `formatgate.yaml`, ...).
pub const SETTINGS_FILE_STEM: &str = "formatgate-settings";

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "FORMATGATE";

/// Configuration manager for the project file and runtime settings.
///
/// Manages two sources:
/// - Project config (`formatgate.yaml`): named formats, their targets, markers and steps
/// - Settings (`formatgate-settings.{toml,yaml,json}` plus `FORMATGATE_*` env vars): workers, logging
#[derive(Debug, Clone)]
pub struct ConfigManager {
    root: Utf8PathBuf,
    project_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for a project root.
    ///
    /// The project file defaults to `<root>/formatgate.yaml`.
    pub fn new<P: AsRef<Utf8Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            project_config_path: root.join(PROJECT_CONFIG_FILE),
            root,
        }
    }

    /// Use a project file other than `<root>/formatgate.yaml`.
    pub fn with_project_config<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_config_path = path.as_ref().to_path_buf();
        self
    }

    /// Load the project configuration file.
    ///
    /// # Returns
    /// The loaded ProjectConfig, or an empty one if the file doesn't exist
    pub fn load_project_config(&self) -> Result<ProjectConfig> {
        if !self.project_config_path.exists() {
            tracing::warn!(
                "Project config file not found at {}, no formats configured",
                self.project_config_path
            );
            return Ok(ProjectConfig::default());
        }

        let file_contents = fs::read_to_string(&self.project_config_path).with_context(|| {
            format!("Failed to read project config: {}", self.project_config_path)
        })?;

        let config: ProjectConfig = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse project config: {}", self.project_config_path)
        })?;

        tracing::info!(
            "Loaded {} format(s) from {}",
            config.formats.len(),
            self.project_config_path
        );
        Ok(config)
    }

    /// Save the project configuration file.
    pub fn save_project_config(&self, config: &ProjectConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize project config to YAML")?;

        fs::write(&self.project_config_path, yaml_string).with_context(|| {
            format!("Failed to write project config: {}", self.project_config_path)
        })?;

        tracing::info!("Saved project config to {}", self.project_config_path);
        Ok(())
    }

    /// Load runtime settings.
    ///
    /// Layers, lowest precedence first: built-in defaults, the optional
    /// settings file at the root, `FORMATGATE_*` environment variables.
    pub fn load_settings(&self) -> Result<Settings> {
        self.build_settings(Environment::with_prefix(ENV_PREFIX))
    }

    fn build_settings(&self, env: Environment) -> Result<Settings> {
        let settings_file = self.root.join(SETTINGS_FILE_STEM);

        let settings = Config::builder()
            .add_source(File::with_name(settings_file.as_str()).required(false))
            .add_source(env.try_parsing(true))
            .build()
            .with_context(|| format!("Failed to load settings from {}", self.root))?
            .try_deserialize::<Settings>()
            .context("Failed to parse settings")?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn project_config_path(&self) -> &Utf8Path {
        &self.project_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormatConfig, MarkerList, StepConfig};
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (ConfigManager::new(&root), temp_dir)
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_missing_project_config_is_empty() {
        let (manager, _temp_dir) = create_test_config_manager();

        let config = manager.load_project_config().unwrap();
        assert!(config.formats.is_empty());
    }

    #[test]
    fn test_load_save_project_config() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut formats = IndexMap::new();
        formats.insert(
            "toLower".to_string(),
            FormatConfig {
                target: vec!["**/*.md".to_string()],
                target_exclude: vec![],
                exclude_if_content_contains: Some(MarkerList::Delimited(
                    "// Generated by Mr. Roboto|// Generated by Mrs. Call".to_string(),
                )),
                exclude_if_content_matches: vec![],
                steps: vec![StepConfig::Lowercase],
            },
        );
        manager
            .save_project_config(&ProjectConfig { formats })
            .unwrap();

        let loaded = manager.load_project_config().unwrap();
        let format = loaded.format("toLower").unwrap();
        assert_eq!(format.steps, vec![StepConfig::Lowercase]);
        assert_eq!(
            format
                .exclude_if_content_contains
                .as_ref()
                .unwrap()
                .fragments()
                .len(),
            2
        );
    }

    #[test]
    fn test_load_project_config_invalid_yaml() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.project_config_path(), "formats: [not, a, map").unwrap();

        let err = manager.load_project_config().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse project config"));
    }

    #[test]
    fn test_custom_project_config_path() {
        let (manager, temp_dir) = create_test_config_manager();
        let custom = Utf8PathBuf::try_from(temp_dir.path().join("other.yaml")).unwrap();
        fs::write(
            &custom,
            "formats:\n  trim:\n    target: ['*.txt']\n    steps:\n      - type: trim_trailing_whitespace\n",
        )
        .unwrap();

        let loaded = manager
            .with_project_config(&custom)
            .load_project_config()
            .unwrap();
        assert!(loaded.formats.contains_key("trim"));
    }

    #[test]
    fn test_settings_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let settings = manager.build_settings(env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_file_layer() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.root().join("formatgate-settings.toml"),
            "workers = 3\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let settings = manager.build_settings(env(&[])).unwrap();
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.log_level, "debug");
        assert!(!settings.respect_ignore_files);
    }

    #[test]
    fn test_env_overrides_settings_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.root().join("formatgate-settings.toml"),
            "workers = 3\n",
        )
        .unwrap();

        let settings = manager
            .build_settings(env(&[
                ("FORMATGATE_WORKERS", "7"),
                ("FORMATGATE_RESPECT_IGNORE_FILES", "true"),
            ]))
            .unwrap();
        assert_eq!(settings.workers, 7);
        assert!(settings.respect_ignore_files);
    }
}

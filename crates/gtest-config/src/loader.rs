//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{LoggingConfig, ProjectConfig, ReportFormat, ReporterConfig};
use crate::ConfigResult;
use std::env;
use std::path::{Path, PathBuf};

/// File name searched for when walking up from the start directory
pub const PROJECT_CONFIG_FILE: &str = "gtest.toml";

/// Filter used when neither RUST_LOG nor the configuration set one
pub const DEFAULT_LOG_FILTER: &str = "gtest=info";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.gtest/config.toml) - lowest priority
/// 2. Project config (./gtest.toml) - overrides global
/// 3. Environment variables (GTEST_*) - overrides project
/// 4. Caller overrides - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, with environment overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where gtest.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific file as the global configuration instead of ~/.gtest/config.toml
    pub fn with_global_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find gtest.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config), or the default config with no
    /// root when the filesystem root is reached.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            self.global_config_path = GlobalConfig::global_config_path().ok();
        }

        match &self.global_config_path {
            Some(path) if path.exists() => GlobalConfig::load_from_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: GTEST_VERBOSE, GTEST_NO_COLOR (or NO_COLOR), GTEST_FORMAT,
    /// GTEST_LOG, GTEST_LOG_EVENTS.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        let mut reporter = ReporterConfig::default();
        let mut logging = LoggingConfig::default();

        if let Ok(verbose) = env::var("GTEST_VERBOSE") {
            reporter.verbose = Some(parse_flag(&verbose));
        }

        if env::var("GTEST_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok() {
            reporter.no_color = Some(true);
        }

        if let Ok(format) = env::var("GTEST_FORMAT") {
            reporter.format = Some(format.parse::<ReportFormat>()?);
        }

        if let Ok(filter) = env::var("GTEST_LOG") {
            logging.filter = Some(filter);
            logging.validate()?;
        }

        if let Ok(events) = env::var("GTEST_LOG_EVENTS") {
            logging.events = Some(parse_flag(&events));
        }

        config.merge(&ProjectConfig {
            reporter: Some(reporter),
            logging: Some(logging),
        });
        Ok(config)
    }

    /// Get the global configuration directory (~/.gtest)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let path = GlobalConfig::global_config_path()?;
        Ok(path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".gtest")))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl Config {
    fn reporter_value<T>(&self, pick: impl Fn(&ReporterConfig) -> Option<T>) -> Option<T> {
        self.project
            .reporter
            .as_ref()
            .and_then(&pick)
            .or_else(|| self.global.reporter.as_ref().and_then(&pick))
    }

    fn logging_value<T>(&self, pick: impl Fn(&LoggingConfig) -> Option<T>) -> Option<T> {
        self.project
            .logging
            .as_ref()
            .and_then(&pick)
            .or_else(|| self.global.logging.as_ref().and_then(&pick))
    }

    /// Effective verbosity (project > global > false)
    pub fn verbose(&self) -> bool {
        self.reporter_value(|r| r.verbose).unwrap_or(false)
    }

    /// Whether colored output is disabled
    pub fn no_color(&self) -> bool {
        self.reporter_value(|r| r.no_color).unwrap_or(false)
    }

    /// Effective report format
    pub fn format(&self) -> ReportFormat {
        self.reporter_value(|r| r.format).unwrap_or_default()
    }

    /// Effective tracing filter directive
    pub fn log_filter(&self) -> String {
        self.logging_value(|l| l.filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    /// Whether lifecycle events are mirrored into the log
    pub fn log_events(&self) -> bool {
        self.logging_value(|l| l.events).unwrap_or(false)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a gtest.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[reporter]
verbose = true
"#,
        );

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert!(config.verbose());
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_format() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[reporter]
format = "human"
"#,
        );

        env::set_var("GTEST_FORMAT", "json");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();
        env::remove_var("GTEST_FORMAT");

        assert_eq!(config.format(), ReportFormat::Json);
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_format() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("GTEST_FORMAT", "tap");
        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());
        env::remove_var("GTEST_FORMAT");

        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert!(!config.verbose());
        assert!(!config.no_color());
        assert_eq!(config.format(), ReportFormat::Human);
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert!(!config.log_events());
        assert!(!config.is_project());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }
}

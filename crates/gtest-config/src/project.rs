//! Project Configuration (gtest.toml)
//!
//! Handles project-level configuration stored in `gtest.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Project configuration from gtest.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Result reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter: Option<ReporterConfig>,

    /// Diagnostic logging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// `[reporter]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Print one line per test instead of dots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Disable colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_color: Option<bool>,

    /// Output format ("human" or "json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// tracing filter directive used when RUST_LOG is unset (e.g. "gtest=debug")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Mirror every lifecycle event into the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<bool>,
}

/// How results are rendered at the end of a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(ReportFormat::Human),
            "json" => Ok(ReportFormat::Json),
            other => Err(ConfigError::InvalidValue {
                field: "reporter.format".to_string(),
                reason: format!("must be 'human' or 'json', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Human => write!(f, "human"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        Ok(())
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if let Some(reporter) = &other.reporter {
            self.reporter
                .get_or_insert_with(Default::default)
                .merge(reporter);
        }
        if let Some(logging) = &other.logging {
            self.logging
                .get_or_insert_with(Default::default)
                .merge(logging);
        }
    }
}

impl ReporterConfig {
    pub fn merge(&mut self, other: &ReporterConfig) {
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.no_color.is_some() {
            self.no_color = other.no_color;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: &LoggingConfig) {
        if other.filter.is_some() {
            self.filter = other.filter.clone();
        }
        if other.events.is_some() {
            self.events = other.events;
        }
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if let Some(filter) = &self.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "logging.filter".to_string(),
                    reason: "filter cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

//! gtest Configuration System
//!
//! Provides configuration for test runs:
//! - Project configuration (gtest.toml)
//! - Global user configuration (~/.gtest/config.toml)
//! - Environment overrides (GTEST_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.gtest/config.toml)
//! 2. Project config (./gtest.toml)
//! 3. Environment variables (GTEST_*)
//! 4. Values set by the caller
//!
//! # Example
//!
//! ```no_run
//! use gtest_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("verbose: {}", config.verbose());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("could not read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid TOML in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{LoggingConfig, ProjectConfig, ReportFormat, ReporterConfig};

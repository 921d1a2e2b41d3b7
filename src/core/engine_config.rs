//! Engine configuration
//!
//! User-level defaults read from `config.toml` in the config directory:
//! build tool, parallelism, the runnable-environment override and the
//! default output root. A missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::defaults::DEFAULT_CMAKE;
use crate::infra::dirs::RecipekitDirs;

/// Engine configuration error types
#[derive(Error, Debug)]
pub enum EngineConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub test: TestConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// `[build]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Parallel jobs; defaults to the CPU count
    pub jobs: Option<usize>,

    /// Build tool executable name or path
    pub cmake: Option<String>,

    /// CMake generator (`-G`)
    pub generator: Option<String>,
}

/// `[test]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Force the runnable-environment check on or off
    pub can_run: Option<bool>,
}

/// `[paths]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Default output root; relative paths resolve against the recipe dir
    pub output: Option<PathBuf>,
}

impl EngineConfig {
    /// Load from the config directory
    pub fn load(dirs: &RecipekitDirs) -> Result<Self, EngineConfigError> {
        Self::load_from_path(&dirs.config_path())
    }

    /// Load from a specific path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self, EngineConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| EngineConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| EngineConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    #[must_use]
    pub fn jobs(&self) -> usize {
        self.build.jobs.unwrap_or_else(num_cpus::get).max(1)
    }

    #[must_use]
    pub fn cmake(&self) -> &str {
        self.build.cmake.as_deref().unwrap_or(DEFAULT_CMAKE)
    }
}

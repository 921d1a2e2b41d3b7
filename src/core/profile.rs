//! Build profiles
//!
//! A profile (`--profile file.toml`) pins settings and supplies option
//! values for a run:
//!
//! ```toml
//! [settings]
//! os = "Linux"
//! arch = "x86_64"
//! build_type = "Release"
//! compiler = "gcc"
//! compiler_version = "13"
//! cppstd = "20"
//!
//! [options]
//! shared = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::options::OptionValue;
use crate::core::settings::Settings;
use crate::error::{ConfigurationError, RecipeError};
use crate::infra::filesystem;

/// Settings section of a profile; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub build_type: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub cppstd: Option<String>,
}

/// A parsed profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub settings: ProfileSettings,

    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = filesystem::read_file(path)?;
        let profile = Self::from_toml(&content).map_err(|e| ConfigurationError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::debug!("loaded profile {}", path.display());
        Ok(profile)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay the profile's settings on `base`
    pub fn apply(&self, base: Settings) -> Result<Settings, ConfigurationError> {
        let s = &self.settings;
        [
            ("os", &s.os),
            ("arch", &s.arch),
            ("build_type", &s.build_type),
            ("compiler", &s.compiler),
            ("compiler.version", &s.compiler_version),
            ("compiler.cppstd", &s.cppstd),
        ]
        .into_iter()
        .try_fold(base, |settings, (key, value)| match value {
            Some(value) => settings.with_override(key, value),
            None => Ok(settings),
        })
    }
}

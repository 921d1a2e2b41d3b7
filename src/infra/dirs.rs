//! Platform-specific directory management
//!
//! Locates the recipekit config directory following platform conventions
//! (XDG on Linux, Library on macOS). `RECIPEKIT_CONFIG_DIR` overrides it.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "RECIPEKIT_CONFIG_DIR";

const APP_NAME: &str = "recipekit";
const CONFIG_FILE: &str = "config.toml";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct RecipekitDirs {
    config_dir: PathBuf,
}

impl RecipekitDirs {
    /// Resolve directories from the environment, then platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Directories rooted at an explicit config dir
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Config directory
    /// - Linux: `$XDG_CONFIG_HOME/recipekit` or `~/.config/recipekit`
    /// - macOS: `~/Library/Application Support/recipekit`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// `config.toml` in the config directory
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for RecipekitDirs {
    fn default() -> Self {
        Self::new()
    }
}

//! CLI command implementations
//!
//! Each command is implemented in its own submodule. Shared run setup
//! (settings, options, output root, engine configuration) lives here.

pub mod build;
pub mod create;
pub mod export;
pub mod inspect;
pub mod plan;

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::config::defaults::DEFAULT_OUTPUT_DIR;
use crate::core::engine_config::EngineConfig;
use crate::core::lifecycle::RunContext;
use crate::core::options::{parse_assignment, OptionAssignment};
use crate::core::profile::Profile;
use crate::core::recipe::recipe_file;
use crate::core::settings::{Compiler, Settings};
use crate::infra::detect::detect_host_settings;
use crate::infra::dirs::RecipekitDirs;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full lifecycle for one recipe
    Build {
        /// Recipe directory or recipe.toml
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Export sources, then run the recipe and every recipe it nests
    Create {
        /// Recipe directory or recipe.toml
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Resolve options, requirements and layout without building
    Plan {
        /// Recipe directory or recipe.toml
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the recipe declaration
    Inspect {
        /// Recipe directory or recipe.toml
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Copy the recipe's exported sources
    Export {
        /// Recipe directory or recipe.toml
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Destination directory
        #[arg(long)]
        to: PathBuf,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        match self {
            Self::Build { path } => build::execute(global, &path),
            Self::Create { path } => create::execute(global, &path),
            Self::Plan { path } => plan::execute(global, &path),
            Self::Inspect { path } => inspect::execute(&path),
            Self::Export { path, to } => export::execute(&path, &to),
        }
    }
}

/// Directory holding the recipe at `path`
pub fn recipe_dir(path: &Path) -> PathBuf {
    recipe_file(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Engine configuration from the platform config dir
pub fn load_engine_config() -> Result<EngineConfig> {
    EngineConfig::load(&RecipekitDirs::new()).context("Failed to load engine configuration")
}

/// Settings from profile (or host detection) plus `-s` overrides
pub fn resolve_settings(global: &GlobalArgs, profile: Option<&Profile>) -> Result<Settings> {
    let base = match profile.and_then(|p| p.settings.compiler.as_deref()) {
        Some(name) => Settings::host(Compiler::new(name, "")),
        None => detect_host_settings(),
    };
    let settings = match profile {
        Some(profile) => profile.apply(base).context("Invalid profile settings")?,
        None => base,
    };
    global.settings.iter().try_fold(settings, |settings, assignment| {
        let (key, value) = assignment
            .split_once('=')
            .with_context(|| format!("Invalid setting '{assignment}': expected key=value"))?;
        settings
            .with_override(key.trim(), value.trim())
            .with_context(|| format!("Invalid setting '{assignment}'"))
    })
}

/// Build the run template shared by every recipe of a command
pub fn run_template(global: &GlobalArgs, recipe_dir: &Path, config: &EngineConfig) -> Result<RunContext> {
    let profile = global
        .profile
        .as_deref()
        .map(Profile::load)
        .transpose()
        .context("Failed to load profile")?;
    let settings = resolve_settings(global, profile.as_ref())?;

    let output_root = match (&global.output, &config.paths.output) {
        (Some(output), _) => output.clone(),
        (None, Some(output)) => recipe_dir.join(output),
        (None, None) => recipe_dir.join(DEFAULT_OUTPUT_DIR),
    };

    let mut context = RunContext::new(recipe_dir.to_path_buf(), output_root, settings).with_jobs(config.jobs());
    context.can_run = config.test.can_run;
    if let Some(profile) = profile {
        context.profile_options = profile.options;
    }
    for raw in &global.options {
        match parse_assignment(raw)? {
            OptionAssignment::Recipe { name, value } => {
                context.cli_options.insert(name, value);
            }
            OptionAssignment::Dependency { dependency, name, value } => {
                context
                    .cli_dependency_options
                    .entry(dependency)
                    .or_default()
                    .insert(name, value);
            }
        }
    }
    tracing::debug!("settings: {:?}", context.settings);
    Ok(context)
}

//! Build command implementation
//!
//! Implements `recipekit build` to run one recipe's full lifecycle from its
//! local sources.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{self, phase_spinner, OutputConfig};
use crate::cli::GlobalArgs;
use crate::core::lifecycle::Lifecycle;
use crate::core::recipe::Recipe;
use crate::infra::cmake::CMakeTool;

use super::{load_engine_config, recipe_dir, run_template};

/// Execute the build command
pub fn execute(global: &GlobalArgs, path: &Path) -> Result<()> {
    let recipe = Recipe::load(path).context("Failed to load recipe")?;
    let config = load_engine_config()?;
    let context = run_template(global, &recipe_dir(path), &config)?;
    let mut tool = CMakeTool::locate(config.cmake(), config.build.generator.clone())
        .context("CMake is required to build recipes")?;

    tracing::info!("Building recipe: {}", recipe.name());
    let spinner = phase_spinner(&format!("Building {}", recipe.name()));
    let result = Lifecycle::new(&recipe, context, &mut tool)
        .on_phase(|name, phase| spinner.set_message(format!("{name}: {phase}")))
        .run();
    spinner.finish_and_clear();
    let report = result?;

    if OutputConfig::global().json {
        output::print_json(&report)?;
    } else if !OutputConfig::global().quiet {
        print!("{}", output::format_report(&report));
    }
    Ok(())
}

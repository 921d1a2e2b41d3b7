//! Create command implementation
//!
//! Implements `recipekit create`: exports the root recipe's sources next to
//! its build output, then runs the root and every nested recipe in order.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{self, phase_spinner, OutputConfig};
use crate::cli::GlobalArgs;
use crate::config::defaults::EXPORT_SUBDIR;
use crate::core::composition::Composition;
use crate::infra::cmake::CMakeTool;
use crate::infra::export::export_sources;

use super::{load_engine_config, recipe_dir, run_template};

/// Execute the create command
pub fn execute(global: &GlobalArgs, path: &Path) -> Result<()> {
    let composition = Composition::load(path).context("Failed to load recipe tree")?;
    let root = composition.root();
    let config = load_engine_config()?;
    let template = run_template(global, &recipe_dir(path), &config)?;

    let export_dir = template.output_root.join(root.recipe.name()).join(EXPORT_SUBDIR);
    let exported = export_sources(&root.dir, &root.recipe.recipe.exports_sources, &export_dir)
        .context("Failed to export sources")?;
    tracing::info!("exported {} files for {}", exported.len(), root.recipe.name());

    let mut tool = CMakeTool::locate(config.cmake(), config.build.generator.clone())
        .context("CMake is required to create packages")?;

    let spinner = phase_spinner(&format!("Creating {}", root.recipe.name()));
    let result = composition.run(&template, &mut tool, |name, phase| {
        spinner.set_message(format!("{name}: {phase}"));
    });
    spinner.finish_and_clear();
    let reports = result?;

    if OutputConfig::global().json {
        output::print_json(&reports)?;
    } else if !OutputConfig::global().quiet {
        for report in &reports {
            print!("{}", output::format_report(report));
        }
    }
    Ok(())
}

//! Plan command implementation
//!
//! Implements `recipekit plan`: resolves a recipe up to its layout and
//! prints the result. Nothing is written to disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::cli::output::{self, OutputConfig};
use crate::cli::GlobalArgs;
use crate::core::composition::{Composition, PlannedRun};
use crate::core::lifecycle::{self, LifecycleReport};

use super::{load_engine_config, recipe_dir, run_template};

#[derive(Serialize)]
struct Plan<'a> {
    #[serde(flatten)]
    report: &'a LifecycleReport,
    /// Composed runs; only the root is resolved in detail
    runs: &'a [PlannedRun],
}

/// Execute the plan command
pub fn execute(global: &GlobalArgs, path: &Path) -> Result<()> {
    let composition = Composition::load(path).context("Failed to load recipe tree")?;
    let runs = composition.plan()?;
    let config = load_engine_config()?;
    let context = run_template(global, &recipe_dir(path), &config)?;

    let report = lifecycle::plan(&composition.root().recipe, context)?;

    if OutputConfig::global().json {
        return output::print_json(&Plan {
            report: &report,
            runs: &runs,
        });
    }

    print!("{}", output::format_report(&report));
    if runs.len() > 1 {
        println!("  runs:");
        for run in &runs {
            println!("    {}/{} ({:?})", run.name, run.version, run.role);
        }
    }
    Ok(())
}

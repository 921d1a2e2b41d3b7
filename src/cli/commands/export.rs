//! Export command implementation

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{self, status, OutputConfig};
use crate::core::recipe::Recipe;
use crate::infra::export::export_sources;

use super::recipe_dir;

/// Copy the files matched by `exports_sources` into `to`
pub fn execute(path: &Path, to: &Path) -> Result<()> {
    let recipe = Recipe::load(path).context("Failed to load recipe")?;
    let exported = export_sources(&recipe_dir(path), &recipe.recipe.exports_sources, to)
        .with_context(|| format!("Failed to export sources to {}", to.display()))?;

    if OutputConfig::global().json {
        return output::print_json(&exported);
    }
    output::info(&format!(
        "{} Exported {} files from {} to {}",
        status::SUCCESS,
        exported.len(),
        recipe.name(),
        to.display()
    ));
    Ok(())
}

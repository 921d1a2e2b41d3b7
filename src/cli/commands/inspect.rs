//! Inspect command implementation

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{self, OutputConfig};
use crate::core::recipe::Recipe;

/// Print the recipe declaration as TOML, or JSON with `--json`
pub fn execute(path: &Path) -> Result<()> {
    let recipe = Recipe::load(path).context("Failed to load recipe")?;
    if OutputConfig::global().json {
        output::print_json(&recipe)
    } else {
        print!("{}", recipe.to_toml().context("Failed to render recipe")?);
        Ok(())
    }
}

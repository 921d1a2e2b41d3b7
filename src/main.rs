//! recipekit CLI
//!
//! Entry point for the recipekit command-line application.

use anyhow::Result;
use clap::Parser;

use recipekit::cli::output::{display_error, OutputConfig};
use recipekit::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output_config = OutputConfig::new(cli.global.quiet, cli.global.json, cli.global.verbose);
    output_config.apply_global();

    // RUST_LOG directives still apply on top of the flag-derived level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(output_config.log_level().into()),
        )
        .init();

    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}

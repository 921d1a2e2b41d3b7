//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

use commands::Commands;

/// recipekit - declarative C/C++ package recipes
///
/// Drive recipes through a fixed configure/build/package/test lifecycle.
#[derive(Parser, Debug)]
#[command(name = "recipekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Setting override (os, arch, build_type, compiler, compiler.version, compiler.cppstd)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", global = true)]
    pub settings: Vec<String>,

    /// Option value: name=value, or dependency:name=value
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE", global = true)]
    pub options: Vec<String>,

    /// Profile file supplying settings and options
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// Output root for build trees and packages
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        if let Some(cmd) = self.command {
            cmd.run(&self.global)
        } else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}

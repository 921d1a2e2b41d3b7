//! recipekit - declarative C/C++ package recipes
//!
//! A recipe declares a package's identity, options, requirements and build
//! constraints as data. The engine drives each recipe through a fixed
//! lifecycle and hands the actual compilation to an external build tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Recipe model, option resolution and the lifecycle controller
//! - [`infra`] - Filesystem, process and platform access
//! - [`config`] - Constants
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;

//! Core business logic module
//!
//! Recipe model and lifecycle. I/O is delegated to [`crate::infra`].
//!
//! # Submodules
//!
//! - [`settings`] - Platform settings and language standards
//! - [`options`] - Option values, domains and deletion rules
//! - [`requirements`] - Requirement classification
//! - [`recipe`] - Recipe (recipe.toml) parsing and validation
//! - [`profile`] - Build profiles
//! - [`layout`] - Output layout and package ids
//! - [`generate`] - Toolchain and dependency descriptors
//! - [`run_env`] - Run environment for built binaries
//! - [`lifecycle`] - Phase controller
//! - [`resolver`] - Run-order resolution
//! - [`composition`] - Nested recipe trees
//! - [`engine_config`] - User configuration

pub mod composition;
pub mod engine_config;
pub mod generate;
pub mod layout;
pub mod lifecycle;
pub mod options;
pub mod profile;
pub mod recipe;
pub mod requirements;
pub mod resolver;
pub mod run_env;
pub mod settings;

//! Error types for recipekit
//!
//! Domain-specific error types using thiserror. Every lifecycle phase reports
//! one of four kinds (configuration, validation, filesystem, external tool);
//! the controller wraps the first one it sees in a [`PhaseFailure`].

use std::path::PathBuf;
use thiserror::Error;

use crate::core::lifecycle::Phase;

/// Option validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    /// Option is not declared by the recipe
    #[error("Option '{name}' is not declared by recipe '{recipe}'")]
    Unknown { recipe: String, name: String },

    /// Value outside the declared domain
    #[error("Option '{name}' has invalid value '{value}': must be one of {allowed:?}")]
    InvalidValue {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Malformed domain declaration
    #[error("Option '{name}' has an invalid domain: {reason}")]
    InvalidDomain { name: String, reason: String },

    /// Malformed `name=value` assignment
    #[error("Invalid option assignment '{input}': expected name=value or dependency:name=value")]
    InvalidAssignment { input: String },
}

/// Malformed or contradictory declarations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Dependency declared twice (both private and public, or twice in one list)
    #[error("Requirement '{name}' is declared more than once (private and public declarations must be disjoint)")]
    DuplicateRequirement { name: String },

    /// Dependency reference cannot be parsed
    #[error("Invalid requirement reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Recipe version is empty or not semver
    #[error("Recipe '{recipe}' has invalid version '{version}': {reason}")]
    InvalidVersion {
        recipe: String,
        version: String,
        reason: String,
    },

    /// Required declaration field is missing or empty
    #[error("Recipe '{recipe}' is missing required field '{field}'")]
    MissingField { recipe: String, field: String },

    /// Recipe or profile file could not be parsed
    #[error("Failed to parse '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Setting value cannot be interpreted
    #[error("Setting '{axis}' has invalid value '{value}'")]
    InvalidSetting { axis: String, value: String },

    /// Nested recipe declares a different version than the outermost recipe
    #[error("Nested recipe '{nested}' declares version {nested_version} but '{root}' is being built at {root_version}")]
    VersionDivergence {
        root: String,
        root_version: String,
        nested: String,
        nested_version: String,
    },

    /// Source export pattern cannot be compiled
    #[error("Invalid export pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Version stamp variable is not a valid identifier
    #[error("Invalid version stamp variable '{variable}'")]
    InvalidStampVariable { variable: String },

    /// Version stamp path is absolute or leaves the source root
    #[error("Version stamp path '{path}' must be relative to the source root")]
    InvalidStampPath { path: PathBuf },

    /// Option error
    #[error(transparent)]
    Option(#[from] OptionError),
}

/// Platform validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Active language standard below the recipe minimum
    #[error("Recipe '{recipe}' requires C++{required} but compiler '{compiler}' is configured for C++{actual}")]
    UnsupportedStandard {
        recipe: String,
        required: String,
        actual: String,
        compiler: String,
    },

    /// No standard configured and no default known for the compiler
    #[error("No C++ standard configured for compiler '{compiler}' and no default is known")]
    UndefinedStandard { compiler: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to walk a directory tree
    #[error("Failed to traverse '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Errors reported by the external build tool capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExternalToolError {
    /// Tool executable not found
    #[error("Build tool '{tool}' not found in PATH")]
    NotFound { tool: String },

    /// Tool could not be started
    #[error("Failed to start '{tool}': {error}")]
    SpawnFailed { tool: String, error: String },

    /// Tool exited with a non-zero status
    #[error("'{tool}' {step} exited with status {code}")]
    NonZeroExit {
        tool: String,
        step: String,
        code: i32,
    },
}

/// Recipe composition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    /// Circular nesting detected
    #[error("Circular recipe nesting detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Nested recipe could not be found
    #[error("Nested recipe '{path}' declared by '{recipe}' was not found")]
    MissingRecipe { recipe: String, path: PathBuf },
}

/// Error raised inside a single lifecycle phase
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] FilesystemError),

    /// External tool error
    #[error("External tool error: {0}")]
    ExternalTool(#[from] ExternalToolError),
}

impl From<OptionError> for LifecycleError {
    fn from(error: OptionError) -> Self {
        Self::Configuration(ConfigurationError::Option(error))
    }
}

/// First failure of a lifecycle run, tagged with the phase it came from
#[derive(Error, Debug)]
#[error("{recipe}: {phase} phase failed: {source}")]
pub struct PhaseFailure {
    /// Recipe being run
    pub recipe: String,
    /// Phase that failed
    pub phase: Phase,
    /// Underlying error
    #[source]
    pub source: LifecycleError,
}

/// Top-level recipekit error type
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Recipe file not found
    #[error("Recipe not found at '{path}'")]
    RecipeNotFound { path: PathBuf },

    /// Configuration error outside a lifecycle run (loading, composition)
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Lifecycle phase failure
    #[error(transparent)]
    Phase(#[from] PhaseFailure),

    /// Composition error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}

impl From<OptionError> for RecipeError {
    fn from(error: OptionError) -> Self {
        Self::Configuration(ConfigurationError::Option(error))
    }
}

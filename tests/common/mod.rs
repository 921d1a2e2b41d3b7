//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use recipekit::core::lifecycle::{BuildTool, ToolInvocation};
use recipekit::core::run_env::RunEnvironment;
use recipekit::core::settings::{Compiler, CppStd, Settings};
use recipekit::error::ExternalToolError;

/// Test project context
///
/// Creates a temporary directory for recipes and provides utilities for
/// setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run the recipekit binary inside the project with an isolated config dir
    pub fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_recipekit"))
            .current_dir(self.path())
            .env("RECIPEKIT_CONFIG_DIR", self.path().join(".recipekit"))
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute recipekit")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Host settings with gcc 13 pinned to C++20
pub fn gcc_settings() -> Settings {
    Settings::host(Compiler::new("gcc", "13").with_cppstd(CppStd::CPP20))
}

/// One call made to [`RecordingTool`]
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Configure { build_dir: PathBuf, toolchain: PathBuf },
    Compile { build_dir: PathBuf, jobs: usize },
    Install { package_dir: PathBuf },
    Run { binary: PathBuf, env: BTreeMap<String, String> },
}

impl ToolCall {
    pub fn step(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::Compile { .. } => "build",
            Self::Install { .. } => "install",
            Self::Run { .. } => "run",
        }
    }
}

/// Build tool double that records calls and returns scripted exit codes
#[derive(Debug, Default)]
pub struct RecordingTool {
    pub calls: Vec<ToolCall>,
    /// Exit code per step name; unlisted steps succeed
    pub exit_codes: BTreeMap<&'static str, i32>,
}

impl RecordingTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `step` exit with `code`
    pub fn failing(step: &'static str, code: i32) -> Self {
        let mut tool = Self::new();
        tool.exit_codes.insert(step, code);
        tool
    }

    pub fn steps(&self) -> Vec<&'static str> {
        self.calls.iter().map(ToolCall::step).collect()
    }

    fn record(&mut self, call: ToolCall) -> i32 {
        let code = self.exit_codes.get(call.step()).copied().unwrap_or(0);
        self.calls.push(call);
        code
    }
}

impl BuildTool for RecordingTool {
    fn name(&self) -> &str {
        "recording"
    }

    fn configure(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Ok(self.record(ToolCall::Configure {
            build_dir: invocation.layout.build_dir.clone(),
            toolchain: invocation.toolchain_file.to_path_buf(),
        }))
    }

    fn compile(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Ok(self.record(ToolCall::Compile {
            build_dir: invocation.layout.build_dir.clone(),
            jobs: invocation.jobs,
        }))
    }

    fn install(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Ok(self.record(ToolCall::Install {
            package_dir: invocation.layout.package_dir.clone(),
        }))
    }

    fn run_binary(&mut self, binary: &Path, env: &RunEnvironment) -> Result<i32, ExternalToolError> {
        Ok(self.record(ToolCall::Run {
            binary: binary.to_path_buf(),
            env: env.to_env_map(&BTreeMap::new()),
        }))
    }
}

/// Library recipe with platform and dependent option rules
pub const NOVA_RECIPE: &str = r#"
[recipe]
name = "nova"
version = "0.8.0"
package_type = "library"
license = "BSL"
description = "A collection of modern utilities for various tasks"
settings = ["os", "compiler", "build_type", "arch"]
exports_sources = ["CMakeLists.txt", "libnova/*", "cmake/*", "*.cmake"]

[options]
shared = [true, false]
fPIC = [true, false]

[default_options]
shared = false
fPIC = true

[[platform_rules]]
remove = "fPIC"
when_os = ["Windows"]

[[option_rules]]
remove = "fPIC"
when_option = "shared"
equals = true

[dependency_options.fmt]
header_only = true

[dependency_options.spdlog]
header_only = true

[requirements]
private-deps = ["spdlog/1.13.0"]
public-deps = ["fmt/10.2.1"]

[validate]
min_cppstd = "20"

[generate]
version_stamp = true

[package_info]
libs = ["nova"]
"#;

/// Test consumer for [`NOVA_RECIPE`]
pub const NOVA_TEST_RECIPE: &str = r#"
[recipe]
name = "nova-test"
package_type = "test"

[test]
binary = "package-test"
"#;

/// Root recipe composing a nested library and a test consumer
pub const NOVA_ROOT_RECIPE: &str = r#"
[recipe]
name = "nova"
version = "0.8.0"
exports_sources = ["CMakeLists.txt", "libnova/*"]

[dependency_options.fmt]
header_only = true

[requirements]
public-deps = ["fmt/10.2.1"]

[[nested]]
path = "libnova"
role = "package"

[[nested]]
path = "test_package"
role = "test"
"#;

/// Nested library packaged alongside [`NOVA_ROOT_RECIPE`]
pub const LIBNOVA_RECIPE: &str = r#"
[recipe]
name = "libnova"

[options]
shared = [true, false]

[default_options]
shared = false

[dependency_options.fmt]
header_only = false

[requirements]
private-deps = ["spdlog/1.13.0"]
"#;

/// Profile pinning a compiler so CLI tests never depend on host detection
pub const GCC_PROFILE: &str = r#"
[settings]
compiler = "gcc"
compiler_version = "13"
cppstd = "20"
build_type = "Release"
"#;

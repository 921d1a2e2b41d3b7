//! CMake build tool
//!
//! [`BuildTool`] implementation that drives `cmake` through
//! `std::process::Command`. Invocations block until the tool exits.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::lifecycle::{BuildTool, ToolInvocation};
use crate::core::run_env::RunEnvironment;
use crate::error::ExternalToolError;

/// `cmake` located on PATH or at an explicit path
#[derive(Debug, Clone)]
pub struct CMakeTool {
    program: PathBuf,
    generator: Option<String>,
}

impl CMakeTool {
    /// Locate `program` (name or path) and wrap it
    pub fn locate(program: &str, generator: Option<String>) -> Result<Self, ExternalToolError> {
        let program = which::which(program).map_err(|_| ExternalToolError::NotFound {
            tool: program.to_string(),
        })?;
        tracing::debug!("using cmake at {}", program.display());
        Ok(Self { program, generator })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for the configure step
    pub fn configure_args(&self, invocation: &ToolInvocation<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-S".into(),
            invocation.layout.source_dir.clone().into(),
            "-B".into(),
            invocation.layout.build_dir.clone().into(),
        ];
        let mut toolchain = OsString::from("-DCMAKE_TOOLCHAIN_FILE=");
        toolchain.push(invocation.toolchain_file);
        args.push(toolchain);
        if let Some(generator) = &self.generator {
            args.push("-G".into());
            args.push(generator.into());
        }
        args
    }

    /// Arguments for the compile step
    pub fn build_args(&self, invocation: &ToolInvocation<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--build".into(),
            invocation.layout.build_dir.clone().into(),
            "--parallel".into(),
            invocation.jobs.to_string().into(),
        ];
        push_config(&mut args, invocation);
        args
    }

    /// Arguments for the install step
    pub fn install_args(&self, invocation: &ToolInvocation<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--install".into(),
            invocation.layout.build_dir.clone().into(),
            "--prefix".into(),
            invocation.layout.package_dir.clone().into(),
        ];
        push_config(&mut args, invocation);
        args
    }

    fn execute(&self, step: &str, args: Vec<OsString>) -> Result<i32, ExternalToolError> {
        tracing::debug!("cmake {step}: {:?}", args);
        let status = Command::new(&self.program)
            .args(args)
            .status()
            .map_err(|e| ExternalToolError::SpawnFailed {
                tool: self.name().to_string(),
                error: e.to_string(),
            })?;
        Ok(exit_code(status))
    }
}

fn push_config(args: &mut Vec<OsString>, invocation: &ToolInvocation<'_>) {
    if invocation.layout.multi_config {
        args.push("--config".into());
        args.push(invocation.settings.build_type.to_string().into());
    }
}

// Killed by a signal counts as failure
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

impl BuildTool for CMakeTool {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        self.execute("configure", self.configure_args(invocation))
    }

    fn compile(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        self.execute("build", self.build_args(invocation))
    }

    fn install(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        self.execute("install", self.install_args(invocation))
    }

    fn run_binary(&mut self, binary: &Path, env: &RunEnvironment) -> Result<i32, ExternalToolError> {
        let status = Command::new(binary)
            .envs(child_env(env, |key| std::env::var_os(key)))
            .status()
            .map_err(|e| ExternalToolError::SpawnFailed {
                tool: binary.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(exit_code(status))
    }
}

/// Child process environment, prepending to inherited values as raw OS strings
fn child_env(env: &RunEnvironment, inherited: impl Fn(&str) -> Option<OsString>) -> BTreeMap<String, OsString> {
    let mut vars = BTreeMap::new();
    for (key, value) in env.prepends() {
        let mut merged = OsString::from(value);
        if let Some(existing) = inherited(&key).filter(|v| !v.is_empty()) {
            merged.push(env.separator());
            merged.push(existing);
        }
        vars.insert(key, merged);
    }
    for (key, value) in &env.extra_env {
        vars.insert(key.clone(), OsString::from(value));
    }
    vars
}

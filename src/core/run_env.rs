//! Run environment
//!
//! Environment a built binary is executed under: search paths for
//! executables and shared libraries of the package itself and of every
//! package it consumes. Rendered both as a variable map for process
//! execution and as a `runenv.sh` script for users.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::recipe::PackageInfo;
use crate::core::settings::Os;

/// Run environment for test binaries
#[derive(Debug, Clone, PartialEq)]
pub struct RunEnvironment {
    /// Target operating system (selects the library path variable)
    pub os: Os,
    /// Directories prepended to PATH
    pub bin_dirs: Vec<PathBuf>,
    /// Directories prepended to the shared library search path
    pub lib_dirs: Vec<PathBuf>,
    /// Additional environment variables
    pub extra_env: BTreeMap<String, String>,
}

impl RunEnvironment {
    /// Empty run environment for the target OS
    pub fn new(os: Os) -> Self {
        Self {
            os,
            bin_dirs: Vec::new(),
            lib_dirs: Vec::new(),
            extra_env: BTreeMap::new(),
        }
    }

    /// Add an executable search directory
    #[must_use]
    pub fn with_bin_dir(mut self, dir: PathBuf) -> Self {
        if !self.bin_dirs.contains(&dir) {
            self.bin_dirs.push(dir);
        }
        self
    }

    /// Add a shared library search directory
    #[must_use]
    pub fn with_lib_dir(mut self, dir: PathBuf) -> Self {
        if !self.lib_dirs.contains(&dir) {
            self.lib_dirs.push(dir);
        }
        self
    }

    /// Add the bin and lib dirs a package publishes
    #[must_use]
    pub fn with_package(self, package_dir: &Path, info: &PackageInfo) -> Self {
        let env = info
            .bindirs
            .iter()
            .fold(self, |env, dir| env.with_bin_dir(package_dir.join(dir)));
        info.libdirs
            .iter()
            .fold(env, |env, dir| env.with_lib_dir(package_dir.join(dir)))
    }

    /// Add an extra environment variable
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.extra_env.insert(key.to_string(), value.to_string());
        self
    }

    /// Variable holding the shared library search path on the target OS
    pub fn library_path_var(&self) -> &'static str {
        match self.os {
            Os::Windows => "PATH",
            Os::Macos => "DYLD_LIBRARY_PATH",
            _ => "LD_LIBRARY_PATH",
        }
    }

    /// Search path list separator for the target OS
    pub fn separator(&self) -> &'static str {
        if self.os == Os::Windows {
            ";"
        } else {
            ":"
        }
    }

    fn join(&self, dirs: &[PathBuf]) -> String {
        dirs.iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(self.separator())
    }

    /// Search path entries to prepend, keyed by variable
    pub fn prepends(&self) -> BTreeMap<String, String> {
        let mut vars: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        if !self.bin_dirs.is_empty() {
            vars.entry("PATH".to_string())
                .or_default()
                .extend(self.bin_dirs.iter().cloned());
        }
        if !self.lib_dirs.is_empty() {
            vars.entry(self.library_path_var().to_string())
                .or_default()
                .extend(self.lib_dirs.iter().cloned());
        }
        vars.into_iter()
            .map(|(key, dirs)| (key, self.join(&dirs)))
            .collect()
    }

    /// Convert to environment variable map, prepending to `inherited` values
    pub fn to_env_map(&self, inherited: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        for (key, value) in self.prepends() {
            let merged = match inherited.get(&key) {
                Some(existing) if !existing.is_empty() => {
                    format!("{value}{}{existing}", self.separator())
                }
                _ => value,
            };
            env.insert(key, merged);
        }
        for (key, value) in &self.extra_env {
            env.insert(key.clone(), value.clone());
        }
        env
    }

    /// Render as a POSIX shell script
    pub fn render_script(&self) -> String {
        let mut script = String::from("#!/bin/sh\n# Generated by recipekit. Source this file before running package binaries.\n");
        for (key, value) in self.prepends() {
            script.push_str(&format!(
                "export {key}=\"{value}${{{key}:+{}${key}}}\"\n",
                self.separator()
            ));
        }
        for (key, value) in &self.extra_env {
            script.push_str(&format!("export {key}=\"{value}\"\n"));
        }
        script
    }
}

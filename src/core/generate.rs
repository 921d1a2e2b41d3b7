//! Descriptor rendering for the external build tool
//!
//! Produces the text of the toolchain file and the dependency descriptor.
//! Writing them is left to the lifecycle's generate phase.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::layout::Layout;
use crate::core::options::{DependencyOptions, OptionSet, OptionValue};
use crate::core::requirements::Requirement;
use crate::core::settings::{CppStd, Settings};

/// Inputs for the toolchain file
#[derive(Debug, Clone)]
pub struct ToolchainParams<'a> {
    pub reference: &'a str,
    pub settings: &'a Settings,
    pub options: &'a OptionSet,
    pub layout: &'a Layout,
    pub cppstd: Option<CppStd>,
    /// Package directories of consumed packages, searched after the generators
    pub prefix_paths: &'a [PathBuf],
}

fn cmake_bool(value: &OptionValue) -> &'static str {
    if value.is_truthy() {
        "ON"
    } else {
        "OFF"
    }
}

fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Render `toolchain.cmake`
pub fn render_toolchain(params: &ToolchainParams<'_>) -> String {
    let mut out = format!("# Generated by recipekit for {}\n\n", params.reference);

    if !params.layout.multi_config {
        out.push_str(&format!(
            "set(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"Build type\" FORCE)\n",
            params.settings.build_type
        ));
    }

    if let Some(std) = params.cppstd {
        out.push_str(&format!("set(CMAKE_CXX_STANDARD {})\n", std.number()));
        out.push_str("set(CMAKE_CXX_STANDARD_REQUIRED ON)\n");
        out.push_str(&format!(
            "set(CMAKE_CXX_EXTENSIONS {})\n",
            if std.is_gnu() { "ON" } else { "OFF" }
        ));
    }

    if let Some(shared) = params.options.get("shared") {
        out.push_str(&format!("set(BUILD_SHARED_LIBS {})\n", cmake_bool(shared)));
    }
    if let Some(fpic) = params.options.get("fPIC") {
        out.push_str(&format!(
            "set(CMAKE_POSITION_INDEPENDENT_CODE {})\n",
            cmake_bool(fpic)
        ));
    }

    let prefixes: Vec<String> = std::iter::once(params.layout.generators_dir.as_path())
        .chain(params.prefix_paths.iter().map(PathBuf::as_path))
        .map(|dir| format!("\"{}\"", cmake_path(dir)))
        .collect();
    out.push_str(&format!(
        "\nlist(PREPEND CMAKE_PREFIX_PATH {})\n",
        prefixes.join(" ")
    ));
    out.push_str(&format!(
        "set(CMAKE_INSTALL_PREFIX \"{}\" CACHE PATH \"Install prefix\" FORCE)\n",
        cmake_path(&params.layout.package_dir)
    ));
    out
}

/// Contents of `dependencies.json`
#[derive(Debug, Clone, Serialize)]
pub struct DependencyDescriptor<'a> {
    /// Reference of the recipe being built
    pub recipe: &'a str,
    /// Classified requirements
    pub requires: &'a [Requirement],
    /// Option values forced on dependencies
    pub dependency_options: &'a DependencyOptions,
}

/// Render `dependencies.json`
pub fn render_dependencies(descriptor: &DependencyDescriptor<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(descriptor)
}

//! Host settings detection
//!
//! Used when no profile is given: OS and architecture come from the
//! platform, the compiler from the first of `c++`, `g++`, `clang++` found on
//! PATH and its `--version` banner.

use regex::Regex;
use std::process::Command;

use crate::core::settings::{Compiler, Settings};

const CANDIDATES: &[&str] = &["c++", "g++", "clang++"];

/// Fallback when no compiler can be identified
const FALLBACK: (&str, &str) = ("gcc", "13");

/// Parse a `--version` banner into compiler family and major version
pub fn parse_version_banner(banner: &str) -> Option<Compiler> {
    let first = banner.lines().next()?;
    let version = Regex::new(r"(\d+)\.(\d+)(?:\.\d+)?").ok()?;
    let captures = version.captures(first)?;
    let major = captures.get(1)?.as_str();

    let name = if first.contains("Apple clang") {
        "apple-clang"
    } else if first.contains("clang") {
        "clang"
    } else if first.contains("g++") || first.contains("GCC") || first.contains("gcc") {
        "gcc"
    } else {
        return None;
    };
    Some(Compiler::new(name, major))
}

/// Detect the host compiler by running `--version` on known drivers
pub fn detect_compiler() -> Option<Compiler> {
    CANDIDATES.iter().find_map(|candidate| {
        let path = which::which(candidate).ok()?;
        let output = Command::new(&path).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let compiler = parse_version_banner(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!("detected {} from {}", compiler, path.display());
        Some(compiler)
    })
}

/// Host settings with the detected compiler
pub fn detect_host_settings() -> Settings {
    let compiler = detect_compiler().unwrap_or_else(|| {
        tracing::warn!(
            "no C++ compiler found on PATH, assuming {} {}",
            FALLBACK.0,
            FALLBACK.1
        );
        Compiler::new(FALLBACK.0, FALLBACK.1)
    });
    Settings::host(compiler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gcc_banner() {
        let banner = "g++ (Ubuntu 13.2.0-4ubuntu3) 13.2.0\nCopyright (C) 2023 Free Software Foundation, Inc.";
        let compiler = parse_version_banner(banner).unwrap();
        assert_eq!(compiler.name, "gcc");
        assert_eq!(compiler.version, "13");
    }

    #[test]
    fn test_parse_clang_banner() {
        let banner = "Ubuntu clang version 17.0.6 (++20231209124227+6009708b4367-1~exp1~20231209124336.77)\nTarget: x86_64-pc-linux-gnu";
        let compiler = parse_version_banner(banner).unwrap();
        assert_eq!(compiler.name, "clang");
        assert_eq!(compiler.version, "17");
    }

    #[test]
    fn test_parse_apple_clang_banner() {
        let banner = "Apple clang version 15.0.0 (clang-1500.1.0.2.5)";
        let compiler = parse_version_banner(banner).unwrap();
        assert_eq!(compiler.name, "apple-clang");
        assert_eq!(compiler.version, "15");
    }

    #[test]
    fn test_parse_unknown_banner() {
        assert!(parse_version_banner("Intel(R) oneAPI DPC++ 2024.0.0").is_none());
        assert!(parse_version_banner("").is_none());
    }
}

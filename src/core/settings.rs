//! Platform settings
//!
//! Settings are the platform axes a recipe is built for: operating system,
//! architecture, build type and compiler. They are read-only for the whole
//! lifecycle run and drive option deletion, validation and layout.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Setting axis names a recipe may declare
pub const AXES: &[&str] = &["os", "arch", "build_type", "compiler"];

/// Target operating system
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    FreeBSD,
    Android,
    Other(String),
}

impl Os {
    /// Host operating system
    pub fn host() -> Self {
        std::env::consts::OS.parse().unwrap_or_else(|_| Self::Other(std::env::consts::OS.to_string()))
    }

    /// Whether the OS belongs to the POSIX family
    pub fn is_posix(&self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl FromStr for Os {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "macos" | "darwin" => Ok(Self::Macos),
            "freebsd" => Ok(Self::FreeBSD),
            "android" => Ok(Self::Android),
            "" => Err(ConfigurationError::InvalidSetting {
                axis: "os".to_string(),
                value: s.to_string(),
            }),
            _ => Ok(Self::Other(s.to_string())),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "Linux"),
            Self::Windows => write!(f, "Windows"),
            Self::Macos => write!(f, "Macos"),
            Self::FreeBSD => write!(f, "FreeBSD"),
            Self::Android => write!(f, "Android"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for Os {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Os {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// CMake-style build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl FromStr for BuildType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            "relwithdebinfo" => Ok(Self::RelWithDebInfo),
            "minsizerel" => Ok(Self::MinSizeRel),
            _ => Err(ConfigurationError::InvalidSetting {
                axis: "build_type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        };
        f.write_str(name)
    }
}

/// C++ language standard
///
/// Ordered by release date, so `98` sorts below `11`. The GNU extension flag
/// does not take part in the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CppStd {
    level: StdLevel,
    gnu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum StdLevel {
    Cpp98,
    Cpp11,
    Cpp14,
    Cpp17,
    Cpp20,
    Cpp23,
    Cpp26,
}

impl CppStd {
    pub const CPP98: Self = Self::iso(StdLevel::Cpp98);
    pub const CPP14: Self = Self::iso(StdLevel::Cpp14);
    pub const CPP17: Self = Self::iso(StdLevel::Cpp17);
    pub const CPP20: Self = Self::iso(StdLevel::Cpp20);

    const fn iso(level: StdLevel) -> Self {
        Self { level, gnu: false }
    }

    /// Whether GNU extensions are enabled
    pub fn is_gnu(&self) -> bool {
        self.gnu
    }

    /// Numeric standard year as used by `CMAKE_CXX_STANDARD`
    pub fn number(&self) -> &'static str {
        match self.level {
            StdLevel::Cpp98 => "98",
            StdLevel::Cpp11 => "11",
            StdLevel::Cpp14 => "14",
            StdLevel::Cpp17 => "17",
            StdLevel::Cpp20 => "20",
            StdLevel::Cpp23 => "23",
            StdLevel::Cpp26 => "26",
        }
    }
}

impl PartialOrd for CppStd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CppStd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level.cmp(&other.level)
    }
}

impl FromStr for CppStd {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (gnu, number) = match s.strip_prefix("gnu") {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix("c++").unwrap_or(s)),
        };
        let level = match number {
            "98" | "03" => StdLevel::Cpp98,
            "11" | "0x" => StdLevel::Cpp11,
            "14" | "1y" => StdLevel::Cpp14,
            "17" | "1z" => StdLevel::Cpp17,
            "20" | "2a" => StdLevel::Cpp20,
            "23" | "2b" => StdLevel::Cpp23,
            "26" | "2c" => StdLevel::Cpp26,
            _ => {
                return Err(ConfigurationError::InvalidSetting {
                    axis: "compiler.cppstd".to_string(),
                    value: s.to_string(),
                })
            }
        };
        Ok(Self { level, gnu })
    }
}

impl fmt::Display for CppStd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.gnu {
            write!(f, "gnu{}", self.number())
        } else {
            f.write_str(self.number())
        }
    }
}

impl Serialize for CppStd {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CppStd {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Compiler family and version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compiler {
    /// Compiler family (gcc, clang, apple-clang, msvc)
    pub name: String,
    /// Compiler version (major or major.minor)
    pub version: String,
    /// Explicitly configured language standard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cppstd: Option<CppStd>,
}

impl Compiler {
    /// Create a compiler setting without an explicit standard
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            cppstd: None,
        }
    }

    /// Set the language standard
    #[must_use]
    pub fn with_cppstd(mut self, cppstd: CppStd) -> Self {
        self.cppstd = Some(cppstd);
        self
    }

    fn major(&self) -> Option<u32> {
        self.version.split('.').next()?.parse().ok()
    }

    /// Standard the compiler uses when none is configured
    pub fn default_cppstd(&self) -> Option<CppStd> {
        let major = self.major()?;
        let std = match self.name.as_str() {
            "gcc" if major >= 11 => CppStd::CPP17,
            "gcc" if major >= 6 => CppStd::CPP14,
            "gcc" => CppStd::CPP98,
            "clang" if major >= 16 => CppStd::CPP17,
            "clang" if major >= 6 => CppStd::CPP14,
            "clang" => CppStd::CPP98,
            "apple-clang" if major >= 10 => CppStd::CPP14,
            "apple-clang" => CppStd::CPP98,
            "msvc" => CppStd::CPP14,
            _ => return None,
        };
        Some(std)
    }

    /// Active language standard: explicit if configured, else the compiler default
    pub fn active_cppstd(&self) -> Option<CppStd> {
        self.cppstd.or_else(|| self.default_cppstd())
    }

    /// Whether the compiler drives a multi-config generator (Visual Studio)
    pub fn is_multi_config(&self) -> bool {
        self.name == "msvc"
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Immutable settings snapshot for one lifecycle run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
    pub os: Os,
    pub arch: String,
    pub build_type: BuildType,
    pub compiler: Compiler,
}

impl Settings {
    /// Settings for the host with the given compiler
    pub fn host(compiler: Compiler) -> Self {
        Self {
            os: Os::host(),
            arch: host_arch().to_string(),
            build_type: BuildType::Release,
            compiler,
        }
    }

    /// Apply a `key=value` override (`os`, `arch`, `build_type`,
    /// `compiler`, `compiler.version`, `compiler.cppstd`)
    pub fn with_override(mut self, key: &str, value: &str) -> Result<Self, ConfigurationError> {
        match key {
            "os" => self.os = value.parse()?,
            "arch" => self.arch = value.to_string(),
            "build_type" => self.build_type = value.parse()?,
            "compiler" => self.compiler.name = value.to_string(),
            "compiler.version" => self.compiler.version = value.to_string(),
            "compiler.cppstd" => self.compiler.cppstd = Some(value.parse()?),
            _ => {
                return Err(ConfigurationError::InvalidSetting {
                    axis: key.to_string(),
                    value: value.to_string(),
                })
            }
        }
        Ok(self)
    }

    /// Values of the declared axes, keyed by axis name
    ///
    /// Undeclared axes are left out so they do not affect the package id.
    pub fn declared_values(&self, declared: &[String]) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        for axis in declared {
            match axis.as_str() {
                "os" => {
                    values.insert("os".to_string(), self.os.to_string());
                }
                "arch" => {
                    values.insert("arch".to_string(), self.arch.clone());
                }
                "build_type" => {
                    values.insert("build_type".to_string(), self.build_type.to_string());
                }
                "compiler" => {
                    values.insert("compiler".to_string(), self.compiler.name.clone());
                    values.insert("compiler.version".to_string(), self.compiler.version.clone());
                    if let Some(std) = self.compiler.cppstd {
                        values.insert("compiler.cppstd".to_string(), std.to_string());
                    }
                }
                _ => {}
            }
        }
        values
    }

    /// Whether binaries built for these settings can run on the host
    pub fn runs_on_host(&self) -> bool {
        self.os == Os::host() && self.arch == host_arch()
    }
}

/// Host architecture in recipe naming (`x86_64`, `armv8`, ...)
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "armv8",
        "arm" => "armv7",
        "x86" => "x86",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gcc(version: &str) -> Compiler {
        Compiler::new("gcc", version)
    }

    #[test]
    fn test_cppstd_ordering_puts_98_first() {
        let c98: CppStd = "98".parse().unwrap();
        let c11: CppStd = "11".parse().unwrap();
        let c20: CppStd = "20".parse().unwrap();
        assert!(c98 < c11);
        assert!(c11 < c20);
    }

    #[test]
    fn test_cppstd_gnu_prefix() {
        let std: CppStd = "gnu17".parse().unwrap();
        assert!(std.is_gnu());
        assert_eq!(std.number(), "17");
        assert_eq!(std.to_string(), "gnu17");
        assert_eq!(std.cmp(&CppStd::CPP17), Ordering::Equal);
    }

    #[test]
    fn test_cppstd_rejects_unknown() {
        assert!("42".parse::<CppStd>().is_err());
    }

    #[test]
    fn test_default_cppstd_per_compiler() {
        assert_eq!(gcc("13").default_cppstd(), Some(CppStd::CPP17));
        assert_eq!(gcc("9.4").default_cppstd(), Some(CppStd::CPP14));
        assert_eq!(Compiler::new("clang", "15").default_cppstd(), Some(CppStd::CPP14));
        assert_eq!(Compiler::new("clang", "17").default_cppstd(), Some(CppStd::CPP17));
        assert_eq!(Compiler::new("tcc", "0.9").default_cppstd(), None);
    }

    #[test]
    fn test_explicit_cppstd_wins_over_default() {
        let compiler = gcc("13").with_cppstd(CppStd::CPP20);
        assert_eq!(compiler.active_cppstd(), Some(CppStd::CPP20));
    }

    #[test]
    fn test_override_settings() {
        let settings = Settings::host(gcc("13"))
            .with_override("os", "Windows")
            .unwrap()
            .with_override("build_type", "Debug")
            .unwrap()
            .with_override("compiler.cppstd", "20")
            .unwrap();
        assert_eq!(settings.os, Os::Windows);
        assert_eq!(settings.build_type, BuildType::Debug);
        assert_eq!(settings.compiler.cppstd, Some(CppStd::CPP20));
    }

    #[test]
    fn test_override_unknown_axis_fails() {
        let result = Settings::host(gcc("13")).with_override("libc", "musl");
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidSetting { axis, .. }) if axis == "libc"
        ));
    }

    #[test]
    fn test_declared_values_skip_undeclared_axes() {
        let settings = Settings::host(gcc("13"));
        let values = settings.declared_values(&["os".to_string(), "arch".to_string()]);
        assert_eq!(values.len(), 2);
        assert!(!values.contains_key("build_type"));
    }

    #[test]
    fn test_windows_is_not_posix() {
        assert!(!Os::Windows.is_posix());
        assert!(Os::Linux.is_posix());
    }

    proptest! {
        #[test]
        fn test_cppstd_display_parses_back(idx in 0usize..7, gnu in any::<bool>()) {
            let numbers = ["98", "11", "14", "17", "20", "23", "26"];
            let raw = if gnu { format!("gnu{}", numbers[idx]) } else { numbers[idx].to_string() };
            let std: CppStd = raw.parse().unwrap();
            prop_assert_eq!(std.to_string(), raw);
        }
    }
}

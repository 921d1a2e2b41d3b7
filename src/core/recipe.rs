//! Recipe declaration (recipe.toml) parsing and validation
//!
//! A recipe is static data: identity, declared settings axes, options with
//! their domains and defaults, option deletion rules, forced dependency
//! options, requirements and the optional nested recipes it composes with.
//! Variants between recipes are expressed here, never as code.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::config::defaults::{RECIPE_FILE, VERSION_STAMP_PATH};
use crate::core::options::{DependencyOptions, DependentRule, OptionDecl, OptionDomain, OptionValue, PlatformRule};
use crate::core::requirements::DependencyRef;
use crate::core::settings::{CppStd, AXES};
use crate::error::{ConfigurationError, OptionError, RecipeError};

/// A recipe as declared in `recipe.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Identity and metadata
    pub recipe: RecipeInfo,

    /// Declared options in declaration order
    #[serde(
        default,
        deserialize_with = "deserialize_options",
        serialize_with = "serialize_options"
    )]
    pub options: Vec<OptionDecl>,

    /// Default option values
    #[serde(default)]
    pub default_options: BTreeMap<String, OptionValue>,

    /// Options deleted on given operating systems
    #[serde(default)]
    pub platform_rules: Vec<PlatformRule>,

    /// Options deleted as a side effect of another option's value
    #[serde(default)]
    pub option_rules: Vec<DependentRule>,

    /// Option values forced on dependencies
    #[serde(default)]
    pub dependency_options: DependencyOptions,

    /// Declared dependencies
    #[serde(default)]
    pub requirements: RequirementsDecl,

    /// Platform validation constraints
    #[serde(default)]
    pub validate: ValidateConfig,

    /// Generate phase configuration
    #[serde(default)]
    pub generate: GenerateConfig,

    /// Consumer-facing package description
    #[serde(default)]
    pub package_info: PackageInfo,

    /// Test phase configuration (test-consumer recipes only)
    #[serde(default)]
    pub test: Option<TestConfig>,

    /// Nested recipes composed by this one
    #[serde(default)]
    pub nested: Vec<NestedRecipe>,

    /// Composition policy
    #[serde(default)]
    pub composition: CompositionConfig,
}

/// Recipe identity and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInfo {
    /// Package name
    pub name: String,

    /// Package version; test consumers may omit it and inherit the tested one
    #[serde(default)]
    pub version: Option<String>,

    /// Package type
    #[serde(default)]
    pub package_type: PackageType,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    /// Settings axes that affect this package
    #[serde(default = "default_settings")]
    pub settings: Vec<String>,

    /// Source path patterns exported with the recipe
    #[serde(default)]
    pub exports_sources: Vec<String>,
}

fn default_settings() -> Vec<String> {
    AXES.iter().map(|a| (*a).to_string()).collect()
}

/// Kind of package a recipe produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    #[default]
    Library,
    HeaderLibrary,
    Application,
    Test,
}

/// `private-deps` / `public-deps` declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsDecl {
    #[serde(default, rename = "private-deps")]
    pub private: Vec<DependencyRef>,

    #[serde(default, rename = "public-deps")]
    pub public: Vec<DependencyRef>,
}

/// Validation constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Minimum C++ standard
    #[serde(default)]
    pub min_cppstd: Option<CppStd>,
}

/// Generate phase configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Version stamp request: `true` or `{ path, variable }`
    #[serde(default)]
    pub version_stamp: Option<StampDecl>,
}

/// Version stamp declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StampDecl {
    Enabled(bool),
    Custom {
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        variable: Option<String>,
    },
}

/// Resolved version stamp target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampTarget {
    /// Path relative to the source root
    pub path: PathBuf,
    /// Environment variable assigned by the stamp
    pub variable: String,
}

/// Package description published to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default = "default_bindirs")]
    pub bindirs: Vec<String>,

    #[serde(default = "default_libdirs")]
    pub libdirs: Vec<String>,

    #[serde(default = "default_includedirs")]
    pub includedirs: Vec<String>,
}

fn default_bindirs() -> Vec<String> {
    vec!["bin".to_string()]
}

fn default_libdirs() -> Vec<String> {
    vec!["lib".to_string()]
}

fn default_includedirs() -> Vec<String> {
    vec!["include".to_string()]
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            libs: Vec::new(),
            bindirs: default_bindirs(),
            libdirs: default_libdirs(),
            includedirs: default_includedirs(),
        }
    }
}

/// Test phase configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Name of the built test binary, relative to the layout's binary dir
    pub binary: String,
}

/// Role of a nested recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedRole {
    /// Packages the same logical artifact as the root
    Package,
    /// Consumes the root package to test it
    Test,
}

/// Reference to a nested recipe directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedRecipe {
    /// Directory relative to the declaring recipe
    pub path: PathBuf,
    pub role: NestedRole,
}

/// How nested versions relate to the root version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Nested `package` recipes must declare the root version (or none)
    #[default]
    Lockstep,
    /// Nested recipes keep their own declared versions
    Independent,
}

/// Composition policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionConfig {
    #[serde(default)]
    pub version_policy: VersionPolicy,
}

fn deserialize_options<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<OptionDecl>, D::Error> {
    let table = toml::Table::deserialize(deserializer)?;
    table
        .into_iter()
        .map(|(name, raw)| {
            let domain = OptionDomain::deserialize(raw)
                .map_err(|e| serde::de::Error::custom(format!("option '{name}': {e}")))?;
            Ok(OptionDecl { name, domain })
        })
        .collect()
}

fn serialize_options<S: Serializer>(options: &[OptionDecl], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(options.iter().map(|o| (&o.name, &o.domain)))
}

impl Recipe {
    /// Load a recipe from a file, or from `recipe.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let file = recipe_file(path);
        if !file.is_file() {
            return Err(RecipeError::RecipeNotFound { path: file });
        }
        let content = std::fs::read_to_string(&file).map_err(|e| crate::error::FilesystemError::ReadFile {
            path: file.clone(),
            error: e.to_string(),
        })?;
        let recipe = Self::from_toml(&content).map_err(|e| ConfigurationError::Parse {
            path: file.clone(),
            error: e.to_string(),
        })?;
        recipe.validate()?;
        tracing::debug!("loaded recipe '{}' from {}", recipe.recipe.name, file.display());
        Ok(recipe)
    }

    /// Load recipe from TOML string
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize recipe to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn name(&self) -> &str {
        &self.recipe.name
    }

    pub fn version(&self) -> Option<&str> {
        self.recipe.version.as_deref()
    }

    /// Check declaration consistency that does not depend on settings
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let name = &self.recipe.name;
        if name.trim().is_empty() {
            return Err(ConfigurationError::MissingField {
                recipe: name.clone(),
                field: "name".to_string(),
            });
        }

        // A missing version is resolved at run time from the composing root
        if let Some(version) = self.version() {
            validate_version(name, version)?;
        }

        for axis in &self.recipe.settings {
            if !AXES.contains(&axis.as_str()) {
                return Err(ConfigurationError::InvalidSetting {
                    axis: axis.clone(),
                    value: "declared in recipe settings".to_string(),
                });
            }
        }

        for (option, value) in &self.default_options {
            let decl = self.option(option).ok_or_else(|| OptionError::Unknown {
                recipe: name.clone(),
                name: option.clone(),
            })?;
            decl.domain.validate(option, value)?;
        }

        if self.recipe.package_type == PackageType::Test && self.test.is_none() {
            return Err(ConfigurationError::MissingField {
                recipe: name.clone(),
                field: "test.binary".to_string(),
            });
        }

        if let Some(target) = self.stamp_target() {
            if !is_identifier(&target.variable) {
                return Err(ConfigurationError::InvalidStampVariable {
                    variable: target.variable,
                });
            }
            if !stays_inside(&target.path) {
                return Err(ConfigurationError::InvalidStampPath { path: target.path });
            }
        }

        Ok(())
    }

    /// Declared option by name
    pub fn option(&self, name: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Resolved version stamp target, if requested
    pub fn stamp_target(&self) -> Option<StampTarget> {
        let default_variable = stamp_variable_for(&self.recipe.name);
        match self.generate.version_stamp.as_ref()? {
            StampDecl::Enabled(false) => None,
            StampDecl::Enabled(true) => Some(StampTarget {
                path: PathBuf::from(VERSION_STAMP_PATH),
                variable: default_variable,
            }),
            StampDecl::Custom { path, variable } => Some(StampTarget {
                path: path.clone().unwrap_or_else(|| PathBuf::from(VERSION_STAMP_PATH)),
                variable: variable.clone().unwrap_or(default_variable),
            }),
        }
    }
}

/// Path of the recipe file for a file or directory argument
pub fn recipe_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(RECIPE_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Check that a version is non-empty semver
pub fn validate_version(recipe: &str, version: &str) -> Result<(), ConfigurationError> {
    if version.trim().is_empty() {
        return Err(ConfigurationError::InvalidVersion {
            recipe: recipe.to_string(),
            version: version.to_string(),
            reason: "version must not be empty".to_string(),
        });
    }
    semver::Version::parse(version)
        .map(|_| ())
        .map_err(|e| ConfigurationError::InvalidVersion {
            recipe: recipe.to_string(),
            version: version.to_string(),
            reason: e.to_string(),
        })
}

/// Default stamp variable: `NOVA_VERSION` for recipe `nova`
pub fn stamp_variable_for(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{upper}_VERSION")
}

/// Relative path with no `..`, root or drive prefix
fn stays_inside(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Os;
    use crate::test_utils::generators;
    use proptest::prelude::*;

    pub(crate) const NOVA: &str = r#"
[recipe]
name = "nova"
version = "0.8.0"
package_type = "library"
license = "BSL"
url = "https://github.com/GK72/nova-cpp"
description = "A collection of modern utilities for various tasks"
topics = ["modern-cpp"]
settings = ["os", "compiler", "build_type", "arch"]
exports_sources = ["CMakeLists.txt", "libnova/*", "cmake/*", "*.cmake", "Config.cmake.in"]

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

    #[test]
    fn test_parse_full_recipe() {
        let recipe = Recipe::from_toml(NOVA).unwrap();
        assert_eq!(recipe.name(), "nova");
        assert_eq!(recipe.version(), Some("0.8.0"));
        assert_eq!(recipe.recipe.package_type, PackageType::Library);
        assert_eq!(recipe.recipe.exports_sources.len(), 5);
        assert_eq!(recipe.requirements.private.len(), 1);
        assert_eq!(recipe.requirements.public[0].name, "fmt");
        assert_eq!(recipe.validate.min_cppstd, Some(CppStd::CPP20));
        assert_eq!(recipe.platform_rules[0].when_os, vec![Os::Windows]);
        assert_eq!(
            recipe.dependency_options["fmt"]["header_only"],
            OptionValue::Bool(true)
        );
        recipe.validate().unwrap();
    }

    #[test]
    fn test_options_keep_declaration_order() {
        let recipe = Recipe::from_toml(NOVA).unwrap();
        let names: Vec<&str> = recipe.options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["shared", "fPIC"]);
    }

    #[test]
    fn test_default_stamp_target() {
        let recipe = Recipe::from_toml(NOVA).unwrap();
        let target = recipe.stamp_target().unwrap();
        assert_eq!(target.path, PathBuf::from("cmake/version.cmake"));
        assert_eq!(target.variable, "NOVA_VERSION");
    }

    #[test]
    fn test_custom_stamp_target() {
        let content = NOVA.replace(
            "version_stamp = true",
            "version_stamp = { variable = \"LIBNOVA_VERSION\" }",
        );
        let recipe = Recipe::from_toml(&content).unwrap();
        let target = recipe.stamp_target().unwrap();
        assert_eq!(target.variable, "LIBNOVA_VERSION");
        assert_eq!(target.path, PathBuf::from(VERSION_STAMP_PATH));
    }

    #[test]
    fn test_stamp_path_outside_source_root_rejected() {
        for path in ["../version.cmake", "cmake/../../version.cmake", "/tmp/version.cmake"] {
            let content = NOVA.replace(
                "version_stamp = true",
                &format!("version_stamp = {{ path = \"{path}\" }}"),
            );
            let recipe = Recipe::from_toml(&content).unwrap();
            assert!(
                matches!(recipe.validate(), Err(ConfigurationError::InvalidStampPath { .. })),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_nested_stamp_path_accepted() {
        let content = NOVA.replace(
            "version_stamp = true",
            "version_stamp = { path = \"./cmake/gen/version.cmake\" }",
        );
        assert!(Recipe::from_toml(&content).unwrap().validate().is_ok());
    }

    #[test]
    fn test_missing_version_is_left_to_the_run() {
        let content = NOVA.replace("version = \"0.8.0\"\n", "");
        let recipe = Recipe::from_toml(&content).unwrap();
        assert!(recipe.validate().is_ok());
        assert_eq!(recipe.version(), None);
    }

    #[test]
    fn test_non_semver_version_rejected() {
        let content = NOVA.replace("0.8.0", "eight");
        let recipe = Recipe::from_toml(&content).unwrap();
        assert!(matches!(
            recipe.validate(),
            Err(ConfigurationError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_default_outside_domain_rejected() {
        let content = NOVA.replace("shared = false", "shared = \"maybe\"");
        let recipe = Recipe::from_toml(&content).unwrap();
        assert!(matches!(
            recipe.validate(),
            Err(ConfigurationError::Option(OptionError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_test_recipe_requires_binary() {
        let content = r#"
[recipe]
name = "nova-test"
package_type = "test"
"#;
        let recipe = Recipe::from_toml(content).unwrap();
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn test_stamp_variable_for_names() {
        assert_eq!(stamp_variable_for("nova"), "NOVA_VERSION");
        assert_eq!(stamp_variable_for("nova-gfx"), "NOVA_GFX_VERSION");
    }

    #[test]
    fn test_toml_roundtrip_preserves_recipe() {
        let recipe = Recipe::from_toml(NOVA).unwrap();
        let reparsed = Recipe::from_toml(&recipe.to_toml().unwrap()).unwrap();
        assert_eq!(recipe, reparsed);
    }

    proptest! {
        #[test]
        fn prop_semver_versions_validate(version in generators::semver_version()) {
            prop_assert!(validate_version("nova", &version).is_ok());
        }

        #[test]
        fn prop_stamp_variable_is_identifier(name in generators::recipe_name()) {
            prop_assert!(is_identifier(&stamp_variable_for(&name)));
        }
    }
}

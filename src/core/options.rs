//! Option model
//!
//! Options are recipe-scoped toggles with a declared domain. The active set
//! is an immutable name → value mapping; deleting an option produces a new
//! set without that key, and deleting a missing key is a no-op.
//!
//! Resolution priority for initial values: CLI > Profile > Default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::settings::{Os, Settings};
use crate::error::OptionError;

/// A concrete option value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl OptionValue {
    /// Parse a value typed on the command line (`True`, `false`, `3`, `header`)
    pub fn parse(raw: &str) -> Self {
        match raw {
            "True" | "true" => Self::Bool(true),
            "False" | "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Str(raw.to_string())),
        }
    }

    /// Truthiness used by dependent-option rules
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Str(s) => !s.is_empty() && s != "False" && s != "false",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Declared set of values an option may take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainDecl", into = "DomainDecl")]
pub enum OptionDomain {
    /// Any value is accepted
    Any,
    /// One of the listed values
    Values(Vec<OptionValue>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DomainDecl {
    Values(Vec<OptionValue>),
    Keyword(String),
}

impl TryFrom<DomainDecl> for OptionDomain {
    type Error = String;

    fn try_from(decl: DomainDecl) -> Result<Self, Self::Error> {
        match decl {
            DomainDecl::Keyword(k) if k == "ANY" => Ok(Self::Any),
            DomainDecl::Keyword(k) => Err(format!("expected a list of values or \"ANY\", got \"{k}\"")),
            DomainDecl::Values(v) if v.is_empty() => Err("domain must not be empty".to_string()),
            DomainDecl::Values(v) => Ok(Self::Values(v)),
        }
    }
}

impl From<OptionDomain> for DomainDecl {
    fn from(domain: OptionDomain) -> Self {
        match domain {
            OptionDomain::Any => Self::Keyword("ANY".to_string()),
            OptionDomain::Values(v) => Self::Values(v),
        }
    }
}

impl OptionDomain {
    /// Check a value against the domain
    pub fn validate(&self, name: &str, value: &OptionValue) -> Result<(), OptionError> {
        match self {
            Self::Any => Ok(()),
            Self::Values(allowed) if allowed.contains(value) => Ok(()),
            Self::Values(allowed) => Err(OptionError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
            }),
        }
    }
}

/// Option declaration as written in the recipe, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDecl {
    pub name: String,
    pub domain: OptionDomain,
}

/// Option value source for resolution priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSource {
    /// Value from CLI argument (highest priority)
    Cli,
    /// Value from the profile
    Profile,
    /// Recipe `default_options` (lowest priority)
    Default,
}

/// Resolved option value with its source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOption {
    /// The resolved value
    pub value: OptionValue,
    /// Where the value came from
    pub source: OptionSource,
}

/// Resolve one option value with priority: CLI > Profile > Default
///
/// Returns `None` when no layer provides a value; such an option stays unset.
pub fn resolve_option_value(
    default: Option<&OptionValue>,
    cli_value: Option<&OptionValue>,
    profile_value: Option<&OptionValue>,
) -> Option<ResolvedOption> {
    if let Some(value) = cli_value {
        Some(ResolvedOption {
            value: value.clone(),
            source: OptionSource::Cli,
        })
    } else if let Some(value) = profile_value {
        Some(ResolvedOption {
            value: value.clone(),
            source: OptionSource::Profile,
        })
    } else {
        default.map(|value| ResolvedOption {
            value: value.clone(),
            source: OptionSource::Default,
        })
    }
}

/// Resolve and validate all declared options into the initial active set
///
/// Values supplied for undeclared options are rejected.
pub fn resolve_all_options(
    recipe: &str,
    declared: &[OptionDecl],
    defaults: &BTreeMap<String, OptionValue>,
    cli_values: &BTreeMap<String, OptionValue>,
    profile_values: &BTreeMap<String, OptionValue>,
) -> Result<OptionSet, OptionError> {
    for name in cli_values.keys().chain(profile_values.keys()).chain(defaults.keys()) {
        if !declared.iter().any(|d| &d.name == name) {
            return Err(OptionError::Unknown {
                recipe: recipe.to_string(),
                name: name.clone(),
            });
        }
    }

    let mut values = BTreeMap::new();
    for decl in declared {
        let resolved = resolve_option_value(
            defaults.get(&decl.name),
            cli_values.get(&decl.name),
            profile_values.get(&decl.name),
        );
        if let Some(resolved) = resolved {
            decl.domain.validate(&decl.name, &resolved.value)?;
            tracing::debug!(
                "option {}={} ({:?})",
                decl.name,
                resolved.value,
                resolved.source
            );
            values.insert(decl.name.clone(), resolved.value);
        }
    }
    Ok(OptionSet { values })
}

/// Immutable snapshot of active options
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionSet {
    values: BTreeMap<String, OptionValue>,
}

impl OptionSet {
    /// Empty option set
    pub fn new() -> Self {
        Self::default()
    }

    /// New set with `name` set to `value`
    #[must_use]
    pub fn with(&self, name: &str, value: OptionValue) -> Self {
        let mut values = self.values.clone();
        values.insert(name.to_string(), value);
        Self { values }
    }

    /// New set without `name`; missing names are ignored
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        let mut values = self.values.clone();
        values.remove(name);
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, OptionValue)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Delete an option on the listed operating systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRule {
    /// Option to delete
    pub remove: String,
    /// Operating systems where the option is meaningless
    pub when_os: Vec<Os>,
}

/// Delete an option when another option holds a given value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentRule {
    /// Option to delete
    pub remove: String,
    /// Option whose value is inspected
    pub when_option: String,
    /// Value that makes `remove` moot
    pub equals: OptionValue,
}

/// Apply platform deletions for the current settings
pub fn apply_platform_rules(settings: &Settings, options: &OptionSet, rules: &[PlatformRule]) -> OptionSet {
    rules
        .iter()
        .filter(|rule| rule.when_os.contains(&settings.os))
        .fold(options.clone(), |acc, rule| {
            if acc.contains(&rule.remove) {
                tracing::debug!("removing option '{}' on {}", rule.remove, settings.os);
            }
            acc.without(&rule.remove)
        })
}

/// Apply dependent-option deletions, in declaration order
///
/// A rule whose trigger option was already removed does not fire.
pub fn apply_dependent_rules(options: &OptionSet, rules: &[DependentRule]) -> OptionSet {
    rules.iter().fold(options.clone(), |acc, rule| {
        let fires = match (acc.get(&rule.when_option), &rule.equals) {
            (Some(value), OptionValue::Bool(expected)) => value.is_truthy() == *expected,
            (Some(value), expected) => value == expected,
            (None, _) => false,
        };
        if fires {
            tracing::debug!(
                "removing option '{}' because {}={}",
                rule.remove,
                rule.when_option,
                rule.equals
            );
            acc.without(&rule.remove)
        } else {
            acc
        }
    })
}

/// Option values forced on dependencies: dependency → option → value
pub type DependencyOptions = BTreeMap<String, BTreeMap<String, OptionValue>>;

/// Layer `overrides` on top of `base`; entries in `overrides` win
pub fn overlay_dependency_options(base: &DependencyOptions, overrides: &DependencyOptions) -> DependencyOptions {
    let mut merged = base.clone();
    for (dependency, options) in overrides {
        let entry = merged.entry(dependency.clone()).or_default();
        for (name, value) in options {
            entry.insert(name.clone(), value.clone());
        }
    }
    merged
}

/// Parsed `-o` assignment
#[derive(Debug, Clone, PartialEq)]
pub enum OptionAssignment {
    /// `name=value` for the recipe itself
    Recipe { name: String, value: OptionValue },
    /// `dependency:name=value`
    Dependency {
        dependency: String,
        name: String,
        value: OptionValue,
    },
}

/// Parse `name=value` or `dependency:name=value`
pub fn parse_assignment(input: &str) -> Result<OptionAssignment, OptionError> {
    let invalid = || OptionError::InvalidAssignment {
        input: input.to_string(),
    };
    let (key, raw) = input.split_once('=').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    let value = OptionValue::parse(raw.trim());
    match key.split_once(':') {
        Some((dependency, name)) if !dependency.is_empty() && !name.is_empty() => {
            Ok(OptionAssignment::Dependency {
                dependency: dependency.to_string(),
                name: name.to_string(),
                value,
            })
        }
        Some(_) => Err(invalid()),
        None => Ok(OptionAssignment::Recipe {
            name: key.to_string(),
            value,
        }),
    }
}

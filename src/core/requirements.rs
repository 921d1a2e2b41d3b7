//! Requirement classification
//!
//! Splits a recipe's declared dependencies into private and public
//! requirements. Public requirements propagate headers and link symbols to
//! consumers; private ones never do. The propagation flags live inside
//! [`Visibility::Public`] so a private requirement cannot carry them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Dependency reference: `name` or `name/version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyRef {
    pub name: String,
    pub version: Option<String>,
}

impl DependencyRef {
    /// Reference with an exact version
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: Some(version.to_string()),
        }
    }
}

impl FromStr for DependencyRef {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigurationError::InvalidReference {
            reference: s.to_string(),
            reason: reason.to_string(),
        };
        let (name, version) = match s.split_once('/') {
            Some((name, version)) => (name.trim(), Some(version.trim())),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(invalid("empty package name"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        {
            return Err(invalid("package name contains invalid characters"));
        }
        match version {
            Some("") => Err(invalid("empty version after '/'")),
            Some(v) => Ok(Self::new(name, v)),
            None => Ok(Self {
                name: name.to_string(),
                version: None,
            }),
        }
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for DependencyRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DependencyRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Requirement visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "visibility", rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public {
        transitive_headers: bool,
        transitive_libs: bool,
    },
}

/// A classified dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Requirement {
    pub reference: DependencyRef,
    #[serde(flatten)]
    pub visibility: Visibility,
}

impl Requirement {
    /// Private requirement: consumers never see it
    pub fn private(reference: DependencyRef) -> Self {
        Self {
            reference,
            visibility: Visibility::Private,
        }
    }

    /// Public requirement with full header and link propagation
    pub fn public(reference: DependencyRef) -> Self {
        Self {
            reference,
            visibility: Visibility::Public {
                transitive_headers: true,
                transitive_libs: true,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public { .. })
    }

    pub fn transitive_headers(&self) -> bool {
        matches!(
            self.visibility,
            Visibility::Public {
                transitive_headers: true,
                ..
            }
        )
    }

    pub fn transitive_libs(&self) -> bool {
        matches!(
            self.visibility,
            Visibility::Public {
                transitive_libs: true,
                ..
            }
        )
    }
}

/// Classify declared dependencies
///
/// Private entries come first, in declared order, followed by public ones.
/// A name appearing more than once, in either or both lists, is a
/// [`ConfigurationError::DuplicateRequirement`].
pub fn classify(
    declared_private: &[DependencyRef],
    declared_public: &[DependencyRef],
) -> Result<Vec<Requirement>, ConfigurationError> {
    let mut seen = BTreeSet::new();
    let mut requirements = Vec::with_capacity(declared_private.len() + declared_public.len());

    let tagged = declared_private
        .iter()
        .map(|r| Requirement::private(r.clone()))
        .chain(declared_public.iter().map(|r| Requirement::public(r.clone())));

    for requirement in tagged {
        if !seen.insert(requirement.name().to_string()) {
            return Err(ConfigurationError::DuplicateRequirement {
                name: requirement.name().to_string(),
            });
        }
        requirements.push(requirement);
    }

    Ok(requirements)
}

//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::options::{OptionSet, OptionValue};
    use crate::core::settings::Os;

    /// Generate a valid recipe or dependency name
    pub fn recipe_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,12}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a valid semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..100, 0u32..100, 0u32..100).prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Generate a named operating system
    pub fn os() -> impl Strategy<Value = Os> {
        prop_oneof![
            Just(Os::Linux),
            Just(Os::Windows),
            Just(Os::Macos),
            Just(Os::FreeBSD),
        ]
    }

    /// Generate a boolean option set with alphabetic names
    pub fn option_set() -> impl Strategy<Value = OptionSet> {
        proptest::collection::btree_map("[a-zA-Z]{1,8}", any::<bool>(), 0..6)
            .prop_map(|m| m.into_iter().map(|(k, v)| (k, OptionValue::Bool(v))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_recipe_name_generator(name in recipe_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.parse::<crate::core::requirements::DependencyRef>().is_ok());
        }

        #[test]
        fn test_semver_version_generator(version in semver_version()) {
            prop_assert!(semver::Version::parse(&version).is_ok());
        }

        #[test]
        fn test_option_set_generator(options in option_set()) {
            prop_assert!(options.len() < 6);
        }
    }
}

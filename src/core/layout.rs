//! Build layout
//!
//! Maps logical build-output roles to filesystem locations following the
//! CMake convention: single-config generators get one build tree per build
//! type, multi-config generators share one tree. Computing a layout does no
//! I/O.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::defaults::{BUILD_SUBDIR, GENERATORS_SUBDIR, PACKAGE_ID_LEN, PACKAGE_SUBDIR};
use crate::core::options::OptionSet;
use crate::core::requirements::Requirement;
use crate::core::settings::Settings;

/// Resolved output locations for one recipe instantiation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    /// Sources the build tool is pointed at
    pub source_dir: PathBuf,
    /// Build tree
    pub build_dir: PathBuf,
    /// Generated toolchain and dependency descriptors
    pub generators_dir: PathBuf,
    /// Install prefix for the package phase
    pub package_dir: PathBuf,
    /// Where built executables end up
    pub bindir: PathBuf,
    /// Package id the package dir is keyed on
    pub package_id: String,
    /// Whether the build tool uses a multi-config generator
    pub multi_config: bool,
}

impl Layout {
    /// Compute the layout
    ///
    /// `output_root` holds both the build trees and the package folders.
    pub fn compute(
        source_dir: &Path,
        output_root: &Path,
        name: &str,
        version: &str,
        settings: &Settings,
        package_id: &str,
    ) -> Self {
        let multi_config = settings.compiler.is_multi_config();
        let build_root = output_root.join(BUILD_SUBDIR);
        let build_type = settings.build_type.to_string();

        let (build_dir, bindir) = if multi_config {
            (build_root.clone(), build_root.join(&build_type))
        } else {
            let dir = build_root.join(&build_type);
            (dir.clone(), dir)
        };

        Self {
            source_dir: source_dir.to_path_buf(),
            generators_dir: build_dir.join(GENERATORS_SUBDIR),
            package_dir: output_root
                .join(PACKAGE_SUBDIR)
                .join(format!("{name}-{version}-{package_id}")),
            build_dir,
            bindir,
            package_id: package_id.to_string(),
            multi_config,
        }
    }
}

/// Package id: truncated SHA-256 over declared settings, active options and
/// requirement references
///
/// Inputs are iterated in sorted order so the id is stable across runs.
pub fn package_id(
    settings: &Settings,
    declared_axes: &[String],
    options: &OptionSet,
    requirements: &[Requirement],
) -> String {
    let mut hasher = Sha256::new();

    hasher.update(b"[settings]\n");
    for (axis, value) in settings.declared_values(declared_axes) {
        hasher.update(format!("{axis}={value}\n"));
    }

    hasher.update(b"[options]\n");
    for (name, value) in options.iter() {
        hasher.update(format!("{name}={value}\n"));
    }

    hasher.update(b"[requires]\n");
    let mut refs: Vec<String> = requirements.iter().map(|r| r.reference.to_string()).collect();
    refs.sort();
    for reference in refs {
        hasher.update(format!("{reference}\n"));
    }

    let digest = hex::encode(hasher.finalize());
    digest[..PACKAGE_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionValue;
    use crate::core::settings::{BuildType, Compiler};

    fn gcc_settings() -> Settings {
        Settings::host(Compiler::new("gcc", "13"))
    }

    fn axes() -> Vec<String> {
        vec!["os".into(), "compiler".into(), "build_type".into(), "arch".into()]
    }

    #[test]
    fn test_single_config_layout() {
        let layout = Layout::compute(
            Path::new("/src/nova"),
            Path::new("/out"),
            "nova",
            "0.8.0",
            &gcc_settings(),
            "abc",
        );
        assert_eq!(layout.build_dir, PathBuf::from("/out/build/Release"));
        assert_eq!(layout.generators_dir, PathBuf::from("/out/build/Release/generators"));
        assert_eq!(layout.bindir, layout.build_dir);
        assert_eq!(layout.package_dir, PathBuf::from("/out/package/nova-0.8.0-abc"));
        assert!(!layout.multi_config);
    }

    #[test]
    fn test_multi_config_layout() {
        let mut settings = Settings::host(Compiler::new("msvc", "193"));
        settings.build_type = BuildType::Debug;
        let layout = Layout::compute(Path::new("/src"), Path::new("/out"), "nova", "0.8.0", &settings, "abc");
        assert_eq!(layout.build_dir, PathBuf::from("/out/build"));
        assert_eq!(layout.generators_dir, PathBuf::from("/out/build/generators"));
        assert_eq!(layout.bindir, PathBuf::from("/out/build/Debug"));
        assert!(layout.multi_config);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = Layout::compute(Path::new("/s"), Path::new("/o"), "nova", "0.8.0", &gcc_settings(), "id");
        let b = Layout::compute(Path::new("/s"), Path::new("/o"), "nova", "0.8.0", &gcc_settings(), "id");
        assert_eq!(a, b);
    }

    #[test]
    fn test_package_id_changes_with_options() {
        let static_opts = OptionSet::new().with("shared", OptionValue::Bool(false));
        let shared_opts = OptionSet::new().with("shared", OptionValue::Bool(true));
        let a = package_id(&gcc_settings(), &axes(), &static_opts, &[]);
        let b = package_id(&gcc_settings(), &axes(), &shared_opts, &[]);
        assert_ne!(a, b);
        assert_eq!(a.len(), PACKAGE_ID_LEN);
    }

    #[test]
    fn test_package_id_ignores_undeclared_axes() {
        let release = gcc_settings();
        let mut debug = gcc_settings();
        debug.build_type = BuildType::Debug;
        let declared = vec!["os".to_string(), "arch".to_string()];
        assert_eq!(
            package_id(&release, &declared, &OptionSet::new(), &[]),
            package_id(&debug, &declared, &OptionSet::new(), &[])
        );
    }

    #[test]
    fn test_package_id_independent_of_requirement_order() {
        let fmt = Requirement::public("fmt/10.2.1".parse().unwrap());
        let spdlog = Requirement::private("spdlog/1.13.0".parse().unwrap());
        let a = package_id(&gcc_settings(), &axes(), &OptionSet::new(), &[fmt.clone(), spdlog.clone()]);
        let b = package_id(&gcc_settings(), &axes(), &OptionSet::new(), &[spdlog, fmt]);
        assert_eq!(a, b);
    }
}

//! Source export
//!
//! Copies the files matched by a recipe's `exports_sources` patterns, plus
//! the recipe file itself, into an export directory. Patterns are shell
//! globs relative to the recipe directory; `*` also crosses `/`, so
//! `libnova/*` exports the whole subtree.

use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::defaults::RECIPE_FILE;
use crate::error::{ConfigurationError, FilesystemError, RecipeError};
use crate::infra::filesystem;

const SKIPPED_DIRS: &[&str] = &[".git", ".svn", ".hg"];

/// Compiled set of export patterns
#[derive(Debug, Clone)]
pub struct ExportMatcher {
    patterns: Vec<Regex>,
}

impl ExportMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigurationError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&glob_to_regex(pattern)).map_err(|e| ConfigurationError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether a `/`-separated relative path is exported
    pub fn is_match(&self, relative: &str) -> bool {
        relative == RECIPE_FILE || self.patterns.iter().any(|p| p.is_match(relative))
    }
}

/// Translate a shell glob into an anchored regex
pub fn glob_to_regex(pattern: &str) -> String {
    let pattern = pattern.trim_start_matches("./");
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                // `**` behaves like `*`
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push_str(".*");
            }
            '?' => out.push_str("[^/]"),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

fn relative_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Copy matched files from `source_dir` into `dest`
///
/// Returns the exported paths relative to `source_dir`, sorted. When `dest`
/// lies inside `source_dir`, the directories containing it are not walked.
pub fn export_sources(source_dir: &Path, patterns: &[String], dest: &Path) -> Result<Vec<PathBuf>, RecipeError> {
    let matcher = ExportMatcher::new(patterns)?;
    filesystem::create_dir_all(dest)?;
    let dest_abs = dest.canonicalize().unwrap_or_else(|_| dest.to_path_buf());
    let mut exported = Vec::new();

    let walker = WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()) {
                return false;
            }
            let path = entry.path().canonicalize().unwrap_or_else(|_| entry.path().to_path_buf());
            !dest_abs.starts_with(path)
        });

    for entry in walker {
        let entry = entry.map_err(|e| FilesystemError::Walk {
            path: source_dir.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        if matcher.is_match(&relative_key(relative)) {
            filesystem::copy_file(entry.path(), &dest.join(relative))?;
            exported.push(relative.to_path_buf());
        }
    }

    tracing::info!("exported {} files to {}", exported.len(), dest.display());
    Ok(exported)
}

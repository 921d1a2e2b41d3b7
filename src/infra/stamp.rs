//! Version stamp writer
//!
//! Writes a one-line CMake fragment exporting the package version so the
//! build system reads the version from the recipe instead of hard-coding it.

use std::path::Path;

use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Stamp content: `set(ENV{<variable>} "<version>")` and a newline
pub fn render_stamp(variable: &str, version: &str) -> String {
    format!("set(ENV{{{variable}}} \"{version}\")\n")
}

/// Write the stamp to `target`, replacing any prior content
pub fn write_stamp(variable: &str, version: &str, target: &Path) -> Result<(), FilesystemError> {
    tracing::debug!("writing version stamp {variable}={version} to {}", target.display());
    filesystem::write_file(target, &render_stamp(variable, version))
}

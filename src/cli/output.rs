//! Output formatting and progress indicators
//!
//! Spinners for lifecycle runs, human-readable reports and the error
//! display used by `main`.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::OnceLock;

use crate::core::lifecycle::{LifecycleReport, TestOutcome};

static OUTPUT: OnceLock<OutputConfig> = OnceLock::new();

/// Output mode selected by the global flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub quiet: bool,
    pub json: bool,
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self { quiet, json, verbose }
    }

    /// Make this the process-wide output mode; the first call wins
    pub fn apply_global(self) {
        let _ = OUTPUT.set(self);
    }

    /// Process-wide output mode
    pub fn global() -> Self {
        OUTPUT.get().copied().unwrap_or_default()
    }

    /// Log filter directive for these flags
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, _) => tracing::Level::DEBUG,
        }
    }

    /// Whether progress spinners should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Spinner when progress is shown, hidden bar otherwise
pub fn phase_spinner(message: &str) -> ProgressBar {
    if OutputConfig::global().show_progress() {
        create_spinner(message)
    } else {
        ProgressBar::hidden()
    }
}

/// Print a message unless quiet or JSON output is active
pub fn info(message: &str) {
    if OutputConfig::global().show_progress() {
        println!("{message}");
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Human-readable summary of a lifecycle run
pub fn format_report(report: &LifecycleReport) -> String {
    let mut out = String::new();
    match &report.layout {
        Some(layout) => out.push_str(&format!(
            "{} {} (package id {})\n",
            status::SUCCESS,
            report.reference,
            layout.package_id
        )),
        None => out.push_str(&format!("{} {}\n", status::SUCCESS, report.reference)),
    }

    let options: Vec<String> = report
        .options
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    if !options.is_empty() {
        out.push_str(&format!("  options:  {}\n", options.join(" ")));
    }
    if let Some(cppstd) = &report.cppstd {
        out.push_str(&format!("  cppstd:   {cppstd}\n"));
    }
    for requirement in &report.requirements {
        let scope = if requirement.is_public() {
            "public, transitive headers and libs"
        } else {
            "private"
        };
        out.push_str(&format!("  requires: {} ({scope})\n", requirement.reference));
    }
    if let Some(layout) = &report.layout {
        out.push_str(&format!("  build:    {}\n", layout.build_dir.display()));
        out.push_str(&format!("  package:  {}\n", layout.package_dir.display()));
    }
    match report.test {
        Some(TestOutcome::Passed) => out.push_str("  test:     passed\n"),
        Some(TestOutcome::Skipped) => out.push_str(&format!(
            "  test:     {} skipped (target cannot run here)\n",
            status::WARNING
        )),
        None => {}
    }
    out
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    if OutputConfig::global().json {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        eprintln!(
            "{}",
            serde_json::json!({ "error": error.to_string(), "causes": causes })
        );
        return;
    }
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lifecycle::Phase;
    use crate::core::options::{OptionSet, OptionValue};
    use crate::core::requirements::Requirement;

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(OutputConfig::new(false, false, 0).log_level(), tracing::Level::WARN);
        assert_eq!(OutputConfig::new(false, false, 1).log_level(), tracing::Level::INFO);
        assert_eq!(OutputConfig::new(false, false, 3).log_level(), tracing::Level::DEBUG);
        assert_eq!(OutputConfig::new(true, false, 2).log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_json_hides_progress() {
        assert!(!OutputConfig::new(false, true, 0).show_progress());
        assert!(OutputConfig::new(false, false, 0).show_progress());
    }

    #[test]
    fn test_format_report_lists_requirements() {
        let report = LifecycleReport {
            recipe: "nova".to_string(),
            reference: "nova/0.8.0".to_string(),
            completed: vec![Phase::Init, Phase::Requirements],
            options: OptionSet::new().with("shared", OptionValue::Bool(false)),
            dependency_options: Default::default(),
            cppstd: Some("20".to_string()),
            requirements: vec![
                Requirement::private("spdlog/1.13.0".parse().unwrap()),
                Requirement::public("fmt/10.2.1".parse().unwrap()),
            ],
            layout: None,
            generated: None,
            package_info: None,
            test: Some(TestOutcome::Skipped),
        };
        let text = format_report(&report);
        assert!(text.contains("nova/0.8.0"));
        assert!(text.contains("shared=false"));
        assert!(text.contains("spdlog/1.13.0 (private)"));
        assert!(text.contains("fmt/10.2.1 (public"));
        assert!(text.contains("skipped"));
    }
}

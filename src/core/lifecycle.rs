//! Lifecycle controller
//!
//! Drives one recipe through the fixed phase sequence
//!
//! `Init → ConfigOptions → Configure → Validate → Requirements → Layout →
//! Generate → Build → Package → [Test]`
//!
//! Every phase is a function from the previous phase's snapshot to a new
//! one. The controller is consumed by [`Lifecycle::run`], so a phase can
//! never run twice in one invocation. The first failure aborts the run and
//! is returned tagged with its phase; files written by earlier phases stay
//! on disk.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::defaults::{DEPENDENCIES_FILE, PACKAGE_INFO_FILE, RUN_ENV_FILE, TOOLCHAIN_FILE};
use crate::core::generate::{render_dependencies, render_toolchain, DependencyDescriptor, ToolchainParams};
use crate::core::layout::{package_id, Layout};
use crate::core::options::{
    apply_dependent_rules, apply_platform_rules, overlay_dependency_options, resolve_all_options,
    DependencyOptions, OptionSet, OptionValue,
};
use crate::core::recipe::{PackageInfo, PackageType, Recipe};
use crate::core::requirements::{classify, DependencyRef, Requirement};
use crate::core::run_env::RunEnvironment;
use crate::core::settings::{CppStd, Os, Settings};
use crate::error::{
    ConfigurationError, ExternalToolError, FilesystemError, LifecycleError, PhaseFailure, ValidationError,
};
use crate::infra::{filesystem, stamp};

/// Lifecycle phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    ConfigOptions,
    Configure,
    Validate,
    Requirements,
    Layout,
    Generate,
    Build,
    Package,
    Test,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 10] = [
        Phase::Init,
        Phase::ConfigOptions,
        Phase::Configure,
        Phase::Validate,
        Phase::Requirements,
        Phase::Layout,
        Phase::Generate,
        Phase::Build,
        Phase::Package,
        Phase::Test,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ConfigOptions => "config_options",
            Self::Configure => "configure",
            Self::Validate => "validate",
            Self::Requirements => "requirements",
            Self::Layout => "layout",
            Self::Generate => "generate",
            Self::Build => "build",
            Self::Package => "package",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a build step needs to know about the build tree
#[derive(Debug, Clone)]
pub struct ToolInvocation<'a> {
    pub layout: &'a Layout,
    pub toolchain_file: &'a Path,
    pub settings: &'a Settings,
    pub jobs: usize,
}

/// External build tool capability
///
/// Implementations report the tool's exit code; the controller decides
/// whether it is a failure. `Err` is reserved for the tool not running at
/// all.
pub trait BuildTool {
    /// Tool name used in error messages
    fn name(&self) -> &str;

    /// Configure the build tree with the generated toolchain
    fn configure(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError>;

    /// Compile
    fn compile(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError>;

    /// Install artifacts into the layout's package dir
    fn install(&mut self, invocation: &ToolInvocation<'_>) -> Result<i32, ExternalToolError>;

    /// Run a built binary under a run environment
    fn run_binary(&mut self, binary: &Path, env: &RunEnvironment) -> Result<i32, ExternalToolError>;
}

/// An upstream package a run consumes (the tested package for test consumers)
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedPackage {
    pub package_dir: PathBuf,
    pub info: PackageInfo,
}

/// Inputs of one lifecycle run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Sources the build tool is pointed at
    pub source_dir: PathBuf,
    /// Root for build trees and packages
    pub output_root: PathBuf,
    /// Platform settings
    pub settings: Settings,
    /// `-o name=value` values
    pub cli_options: BTreeMap<String, OptionValue>,
    /// Profile `[options]` values
    pub profile_options: BTreeMap<String, OptionValue>,
    /// `-o dep:name=value` values
    pub cli_dependency_options: DependencyOptions,
    /// Overrides copied verbatim from the composing root recipe
    pub inherited_overrides: Option<DependencyOptions>,
    /// Version single-sourced from the outermost recipe
    pub version: Option<String>,
    /// Requirements added by composition
    pub extra_requires: Vec<DependencyRef>,
    /// Upstream packages added to the run environment
    pub consumed: Vec<ConsumedPackage>,
    /// Parallel build jobs
    pub jobs: usize,
    /// Runnable-environment override; `None` compares host and target
    pub can_run: Option<bool>,
    /// Last phase to execute
    pub stop_after: Phase,
}

impl RunContext {
    /// Context with no overrides that runs every phase
    pub fn new(source_dir: PathBuf, output_root: PathBuf, settings: Settings) -> Self {
        Self {
            source_dir,
            output_root,
            settings,
            cli_options: BTreeMap::new(),
            profile_options: BTreeMap::new(),
            cli_dependency_options: DependencyOptions::new(),
            inherited_overrides: None,
            version: None,
            extra_requires: Vec::new(),
            consumed: Vec::new(),
            jobs: num_cpus::get(),
            can_run: None,
            stop_after: Phase::Test,
        }
    }

    #[must_use]
    pub fn stop_after(mut self, phase: Phase) -> Self {
        self.stop_after = phase;
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn with_cli_option(mut self, name: &str, value: OptionValue) -> Self {
        self.cli_options.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_can_run(mut self, can_run: bool) -> Self {
        self.can_run = Some(can_run);
        self
    }
}

/// Snapshot produced by Init
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitState {
    /// `name/version`
    pub reference: String,
    pub version: String,
    pub options: OptionSet,
}

/// Snapshot produced by Configure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configured {
    pub options: OptionSet,
    pub dependency_options: DependencyOptions,
}

/// Files written by Generate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedFiles {
    pub toolchain: PathBuf,
    pub dependencies: PathBuf,
    pub run_env: PathBuf,
    pub version_stamp: Option<PathBuf>,
}

/// Result of the Test phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// Binary ran and exited with status 0
    Passed,
    /// Target cannot run in this environment
    Skipped,
}

/// What a run produced, phase by phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleReport {
    pub recipe: String,
    pub reference: String,
    pub completed: Vec<Phase>,
    pub options: OptionSet,
    pub dependency_options: DependencyOptions,
    pub cppstd: Option<String>,
    pub requirements: Vec<Requirement>,
    pub layout: Option<Layout>,
    pub generated: Option<GeneratedFiles>,
    pub package_info: Option<PathBuf>,
    pub test: Option<TestOutcome>,
}

impl LifecycleReport {
    fn new(recipe: &str) -> Self {
        Self {
            recipe: recipe.to_string(),
            reference: recipe.to_string(),
            completed: Vec::new(),
            options: OptionSet::new(),
            dependency_options: DependencyOptions::new(),
            cppstd: None,
            requirements: Vec::new(),
            layout: None,
            generated: None,
            package_info: None,
            test: None,
        }
    }
}

// ============================================
// Phase functions
// ============================================

/// Init: resolve identity and initial option values
pub fn init(recipe: &Recipe, context: &RunContext) -> Result<InitState, LifecycleError> {
    recipe.validate()?;
    let version = context
        .version
        .clone()
        .or_else(|| recipe.version().map(str::to_string))
        .ok_or_else(|| ConfigurationError::MissingField {
            recipe: recipe.name().to_string(),
            field: "version".to_string(),
        })?;
    crate::core::recipe::validate_version(recipe.name(), &version)?;

    let options = resolve_all_options(
        recipe.name(),
        &recipe.options,
        &recipe.default_options,
        &context.cli_options,
        &context.profile_options,
    )?;

    Ok(InitState {
        reference: format!("{}/{}", recipe.name(), version),
        version,
        options,
    })
}

/// ConfigOptions: platform-conditional option deletion
pub fn config_options(recipe: &Recipe, settings: &Settings, options: &OptionSet) -> OptionSet {
    apply_platform_rules(settings, options, &recipe.platform_rules)
}

/// Configure: forced dependency options, then dependent-option deletion
///
/// Dependency options are layered CLI, then the recipe's own, then the set
/// inherited from a composing root, later layers winning.
pub fn configure(
    recipe: &Recipe,
    options: &OptionSet,
    cli_dependency_options: &DependencyOptions,
    inherited: Option<&DependencyOptions>,
) -> Configured {
    let own = overlay_dependency_options(cli_dependency_options, &recipe.dependency_options);
    let dependency_options = match inherited {
        Some(root) => overlay_dependency_options(&own, root),
        None => own,
    };
    Configured {
        options: apply_dependent_rules(options, &recipe.option_rules),
        dependency_options,
    }
}

/// Validate: active language standard against the recipe minimum
///
/// Returns the active standard when one is known.
pub fn validate(recipe: &Recipe, settings: &Settings) -> Result<Option<CppStd>, ValidationError> {
    let active = settings.compiler.active_cppstd();
    let Some(required) = recipe.validate.min_cppstd else {
        return Ok(active);
    };
    let Some(active) = active else {
        return Err(ValidationError::UndefinedStandard {
            compiler: settings.compiler.to_string(),
        });
    };
    if active < required {
        return Err(ValidationError::UnsupportedStandard {
            recipe: recipe.name().to_string(),
            required: required.number().to_string(),
            actual: active.to_string(),
            compiler: settings.compiler.to_string(),
        });
    }
    Ok(Some(active))
}

/// Requirements: classify declared dependencies plus composition extras
///
/// Composition extras are private: a test consumer links the tested package
/// but has no consumers of its own.
pub fn requirements(recipe: &Recipe, extra: &[DependencyRef]) -> Result<Vec<Requirement>, ConfigurationError> {
    let private: Vec<DependencyRef> = recipe
        .requirements
        .private
        .iter()
        .chain(extra.iter())
        .cloned()
        .collect();
    classify(&private, &recipe.requirements.public)
}

/// Layout: package id and output locations
pub fn layout(
    recipe: &Recipe,
    context: &RunContext,
    version: &str,
    options: &OptionSet,
    requirements: &[Requirement],
) -> Layout {
    let id = package_id(&context.settings, &recipe.recipe.settings, options, requirements);
    Layout::compute(
        &context.source_dir,
        &context.output_root,
        recipe.name(),
        version,
        &context.settings,
        &id,
    )
}

/// Run environment for a laid-out recipe
pub fn run_environment(os: Os, layout: &Layout, consumed: &[ConsumedPackage]) -> RunEnvironment {
    consumed.iter().fold(
        RunEnvironment::new(os).with_bin_dir(layout.bindir.clone()),
        |env, package| env.with_package(&package.package_dir, &package.info),
    )
}

/// Generate: write descriptors and the optional version stamp
pub fn generate(
    recipe: &Recipe,
    init: &InitState,
    context: &RunContext,
    configured: &Configured,
    cppstd: Option<CppStd>,
    requirements: &[Requirement],
    layout: &Layout,
) -> Result<GeneratedFiles, LifecycleError> {
    filesystem::create_dir_all(&layout.generators_dir)?;

    let toolchain = layout.generators_dir.join(TOOLCHAIN_FILE);
    let consumed_dirs: Vec<PathBuf> = context.consumed.iter().map(|p| p.package_dir.clone()).collect();
    filesystem::write_file(
        &toolchain,
        &render_toolchain(&ToolchainParams {
            reference: &init.reference,
            settings: &context.settings,
            options: &configured.options,
            layout,
            cppstd,
            prefix_paths: &consumed_dirs,
        }),
    )?;

    let dependencies = layout.generators_dir.join(DEPENDENCIES_FILE);
    let descriptor = render_dependencies(&DependencyDescriptor {
        recipe: &init.reference,
        requires: requirements,
        dependency_options: &configured.dependency_options,
    })
    .map_err(|e| FilesystemError::WriteFile {
        path: dependencies.clone(),
        error: e.to_string(),
    })?;
    filesystem::write_file(&dependencies, &descriptor)?;

    let run_env = layout.generators_dir.join(RUN_ENV_FILE);
    let env = run_environment(context.settings.os.clone(), layout, &context.consumed);
    filesystem::write_file(&run_env, &env.render_script())?;

    let version_stamp = match recipe.stamp_target() {
        Some(target) => {
            let path = layout.source_dir.join(&target.path);
            stamp::write_stamp(&target.variable, &init.version, &path)?;
            Some(path)
        }
        None => None,
    };

    Ok(GeneratedFiles {
        toolchain,
        dependencies,
        run_env,
        version_stamp,
    })
}

fn check_exit(tool: &str, step: &str, code: i32) -> Result<(), ExternalToolError> {
    if code == 0 {
        Ok(())
    } else {
        Err(ExternalToolError::NonZeroExit {
            tool: tool.to_string(),
            step: step.to_string(),
            code,
        })
    }
}

/// Build: configure and compile through the build tool
pub fn build<T: BuildTool>(tool: &mut T, invocation: &ToolInvocation<'_>) -> Result<(), ExternalToolError> {
    let code = tool.configure(invocation)?;
    check_exit(tool.name(), "configure", code)?;
    let code = tool.compile(invocation)?;
    check_exit(tool.name(), "build", code)
}

/// Package: install artifacts and publish `package-info.json`
///
/// Test consumers are never packaged.
pub fn package<T: BuildTool>(
    recipe: &Recipe,
    tool: &mut T,
    invocation: &ToolInvocation<'_>,
    reference: &str,
) -> Result<Option<PathBuf>, LifecycleError> {
    if recipe.recipe.package_type == PackageType::Test {
        tracing::debug!("{} is a test consumer, nothing to package", recipe.name());
        return Ok(None);
    }
    let code = tool.install(invocation)?;
    check_exit(tool.name(), "install", code)?;

    #[derive(Serialize)]
    struct PublishedInfo<'a> {
        reference: &'a str,
        package_id: &'a str,
        #[serde(flatten)]
        info: &'a PackageInfo,
    }

    let path = invocation.layout.package_dir.join(PACKAGE_INFO_FILE);
    let content = serde_json::to_string_pretty(&PublishedInfo {
        reference,
        package_id: &invocation.layout.package_id,
        info: &recipe.package_info,
    })
    .map_err(|e| FilesystemError::WriteFile {
        path: path.clone(),
        error: e.to_string(),
    })?;
    filesystem::write_file(&path, &content)?;
    Ok(Some(path))
}

/// Test: run the built test binary when the target can run here
pub fn test<T: BuildTool>(
    recipe: &Recipe,
    context: &RunContext,
    tool: &mut T,
    layout: &Layout,
) -> Result<Option<TestOutcome>, ExternalToolError> {
    let Some(test) = recipe.test.as_ref() else {
        return Ok(None);
    };
    let can_run = context.can_run.unwrap_or_else(|| context.settings.runs_on_host());
    if !can_run {
        tracing::warn!(
            "skipping tests for {}: {} {} binaries cannot run on this host",
            recipe.name(),
            context.settings.os,
            context.settings.arch
        );
        return Ok(Some(TestOutcome::Skipped));
    }

    let mut binary = layout.bindir.join(&test.binary);
    if context.settings.os == Os::Windows && binary.extension().is_none() {
        binary.set_extension("exe");
    }
    let env = run_environment(context.settings.os.clone(), layout, &context.consumed);
    tracing::info!("running {}", binary.display());
    let code = tool.run_binary(&binary, &env)?;
    check_exit(&test.binary, "test", code)?;
    Ok(Some(TestOutcome::Passed))
}

// ============================================
// Controller
// ============================================

/// Callback invoked when a phase starts
pub type PhaseObserver<'a> = Box<dyn FnMut(&str, Phase) + 'a>;

/// Controller for a single lifecycle run
pub struct Lifecycle<'a, T: BuildTool> {
    recipe: &'a Recipe,
    context: RunContext,
    tool: &'a mut T,
    observer: Option<PhaseObserver<'a>>,
}

impl<'a, T: BuildTool> Lifecycle<'a, T> {
    pub fn new(recipe: &'a Recipe, context: RunContext, tool: &'a mut T) -> Self {
        Self {
            recipe,
            context,
            tool,
            observer: None,
        }
    }

    /// Report phase starts to `observer` (progress display)
    #[must_use]
    pub fn on_phase(mut self, observer: impl FnMut(&str, Phase) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Execute phases up to and including `phase`
    pub fn run_until(mut self, phase: Phase) -> Result<LifecycleReport, PhaseFailure> {
        self.context.stop_after = phase;
        self.run()
    }

    /// Execute phases up to the context's stop point
    pub fn run(self) -> Result<LifecycleReport, PhaseFailure> {
        let Self {
            recipe,
            context,
            tool,
            mut observer,
        } = self;
        let mut report = LifecycleReport::new(recipe.name());
        let fail = |phase: Phase, source: LifecycleError| PhaseFailure {
            recipe: recipe.name().to_string(),
            phase,
            source,
        };

        macro_rules! step {
            ($phase:expr, $body:expr) => {{
                tracing::info!("{}: {}", recipe.name(), $phase);
                if let Some(observer) = observer.as_mut() {
                    observer(recipe.name(), $phase);
                }
                let value = $body.map_err(|e| fail($phase, LifecycleError::from(e)))?;
                report.completed.push($phase);
                value
            }};
        }
        macro_rules! stop_if_done {
            ($phase:expr) => {
                if context.stop_after == $phase {
                    return Ok(report);
                }
            };
        }

        let init_state = step!(Phase::Init, init(recipe, &context));
        report.reference = init_state.reference.clone();
        report.options = init_state.options.clone();
        stop_if_done!(Phase::Init);

        let options = step!(
            Phase::ConfigOptions,
            Ok::<_, LifecycleError>(config_options(recipe, &context.settings, &init_state.options))
        );
        report.options = options.clone();
        stop_if_done!(Phase::ConfigOptions);

        let configured = step!(
            Phase::Configure,
            Ok::<_, LifecycleError>(configure(
                recipe,
                &options,
                &context.cli_dependency_options,
                context.inherited_overrides.as_ref(),
            ))
        );
        tracing::debug!("active options: {:?}", configured.options);
        report.options = configured.options.clone();
        report.dependency_options = configured.dependency_options.clone();
        stop_if_done!(Phase::Configure);

        let cppstd = step!(Phase::Validate, validate(recipe, &context.settings));
        report.cppstd = cppstd.map(|s| s.to_string());
        stop_if_done!(Phase::Validate);

        let requires = step!(
            Phase::Requirements,
            requirements(recipe, &context.extra_requires)
        );
        report.requirements = requires.clone();
        stop_if_done!(Phase::Requirements);

        let layout = step!(
            Phase::Layout,
            Ok::<_, LifecycleError>(layout(
                recipe,
                &context,
                &init_state.version,
                &configured.options,
                &requires,
            ))
        );
        report.layout = Some(layout.clone());
        stop_if_done!(Phase::Layout);

        let generated = step!(
            Phase::Generate,
            generate(recipe, &init_state, &context, &configured, cppstd, &requires, &layout)
        );
        let toolchain_file = generated.toolchain.clone();
        report.generated = Some(generated);
        stop_if_done!(Phase::Generate);

        let invocation = ToolInvocation {
            layout: &layout,
            toolchain_file: &toolchain_file,
            settings: &context.settings,
            jobs: context.jobs,
        };

        step!(Phase::Build, build(&mut *tool, &invocation));
        stop_if_done!(Phase::Build);

        report.package_info = step!(
            Phase::Package,
            package(recipe, &mut *tool, &invocation, &init_state.reference)
        );
        stop_if_done!(Phase::Package);

        if recipe.test.is_some() {
            report.test = step!(Phase::Test, test(recipe, &context, &mut *tool, &layout));
        }

        Ok(report)
    }
}

/// Stand-in tool for runs that stop before Build
struct NoBuildTool;

impl NoBuildTool {
    fn unavailable() -> ExternalToolError {
        ExternalToolError::NotFound {
            tool: "build tool".to_string(),
        }
    }
}

impl BuildTool for NoBuildTool {
    fn name(&self) -> &str {
        "none"
    }

    fn configure(&mut self, _: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Err(Self::unavailable())
    }

    fn compile(&mut self, _: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Err(Self::unavailable())
    }

    fn install(&mut self, _: &ToolInvocation<'_>) -> Result<i32, ExternalToolError> {
        Err(Self::unavailable())
    }

    fn run_binary(&mut self, _: &Path, _: &RunEnvironment) -> Result<i32, ExternalToolError> {
        Err(Self::unavailable())
    }
}

/// Resolve a recipe up to Layout without touching the filesystem
pub fn plan(recipe: &Recipe, context: RunContext) -> Result<LifecycleReport, PhaseFailure> {
    let mut tool = NoBuildTool;
    Lifecycle::new(recipe, context, &mut tool).run_until(Phase::Layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Compiler;
    use proptest::prelude::*;

    const RECIPE: &str = r#"
[recipe]
name = "nova"
version = "0.8.0"

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

[requirements]
private-deps = ["spdlog"]
public-deps = ["fmt"]

[validate]
min_cppstd = "20"
"#;

    fn recipe() -> Recipe {
        Recipe::from_toml(RECIPE).unwrap()
    }

    fn settings(cppstd: &str) -> Settings {
        Settings::host(Compiler::new("gcc", "13").with_cppstd(cppstd.parse().unwrap()))
    }

    fn context() -> RunContext {
        RunContext::new(PathBuf::from("/src"), PathBuf::from("/out"), settings("20"))
    }

    #[test]
    fn test_phase_order_is_fixed() {
        let mut sorted = Phase::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Phase::ALL.to_vec());
        assert_eq!(Phase::ALL[0], Phase::Init);
        assert_eq!(Phase::ALL[9], Phase::Test);
    }

    #[test]
    fn test_init_resolves_defaults_and_reference() {
        let state = init(&recipe(), &context()).unwrap();
        assert_eq!(state.reference, "nova/0.8.0");
        assert_eq!(state.options.get("fPIC"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_init_uses_single_sourced_version() {
        let state = init(&recipe(), &context().with_version("0.9.0")).unwrap();
        assert_eq!(state.version, "0.9.0");
    }

    #[test]
    fn test_init_requires_some_version() {
        let r = Recipe::from_toml(&RECIPE.replace("version = \"0.8.0\"\n", "")).unwrap();
        assert!(matches!(
            init(&r, &context()),
            Err(LifecycleError::Configuration(ConfigurationError::MissingField { .. }))
        ));
        assert_eq!(init(&r, &context().with_version("1.0.0")).unwrap().reference, "nova/1.0.0");
    }

    #[test]
    fn test_init_rejects_invalid_version_override() {
        assert!(init(&recipe(), &context().with_version("")).is_err());
    }

    #[test]
    fn test_configure_with_shared_drops_fpic() {
        let r = recipe();
        let state = init(&r, &context().with_cli_option("shared", OptionValue::Bool(true))).unwrap();
        let options = config_options(&r, &context().settings, &state.options);
        let configured = configure(&r, &options, &DependencyOptions::new(), None);
        assert!(!configured.options.contains("fPIC"));
        assert_eq!(
            configured.dependency_options["fmt"]["header_only"],
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn test_inherited_overrides_are_applied_verbatim() {
        let r = recipe();
        let mut root = DependencyOptions::new();
        root.entry("spdlog".to_string())
            .or_default()
            .insert("header_only".to_string(), OptionValue::Bool(true));
        root.entry("fmt".to_string())
            .or_default()
            .insert("header_only".to_string(), OptionValue::Bool(false));

        let configured = configure(&r, &OptionSet::new(), &DependencyOptions::new(), Some(&root));
        assert_eq!(configured.dependency_options, root);
    }

    #[test]
    fn test_recipe_overrides_beat_cli_dependency_options() {
        let r = recipe();
        let mut cli = DependencyOptions::new();
        cli.entry("fmt".to_string())
            .or_default()
            .insert("header_only".to_string(), OptionValue::Bool(false));
        let configured = configure(&r, &OptionSet::new(), &cli, None);
        assert_eq!(
            configured.dependency_options["fmt"]["header_only"],
            OptionValue::Bool(true)
        );
    }

    #[test]
    fn test_validate_fails_below_minimum() {
        let err = validate(&recipe(), &settings("17")).unwrap_err();
        match err {
            ValidationError::UnsupportedStandard { required, actual, .. } => {
                assert_eq!(required, "20");
                assert_eq!(actual, "17");
            }
            _ => panic!("Expected UnsupportedStandard error"),
        }
    }

    #[test]
    fn test_validate_passes_at_or_above_minimum() {
        assert_eq!(validate(&recipe(), &settings("20")).unwrap(), Some(CppStd::CPP20));
        assert!(validate(&recipe(), &settings("23")).is_ok());
        assert!(validate(&recipe(), &settings("gnu20")).is_ok());
    }

    #[test]
    fn test_validate_uses_compiler_default_when_unset() {
        let s = Settings::host(Compiler::new("gcc", "13"));
        assert!(matches!(
            validate(&recipe(), &s),
            Err(ValidationError::UnsupportedStandard { .. })
        ));
    }

    #[test]
    fn test_validate_unknown_compiler_without_cppstd() {
        let s = Settings::host(Compiler::new("tcc", "0.9"));
        assert!(matches!(
            validate(&recipe(), &s),
            Err(ValidationError::UndefinedStandard { .. })
        ));
    }

    #[test]
    fn test_requirements_add_composition_extras_as_private() {
        let reqs = requirements(&recipe(), &[DependencyRef::new("nova", "0.8.0")]).unwrap();
        assert_eq!(reqs.len(), 3);
        let nova = reqs.iter().find(|r| r.name() == "nova").unwrap();
        assert!(!nova.is_public());
    }

    #[test]
    fn test_requirements_extra_colliding_with_declared_fails() {
        let result = requirements(&recipe(), &["fmt".parse().unwrap()]);
        assert!(matches!(
            result,
            Err(ConfigurationError::DuplicateRequirement { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_config_options_is_idempotent(windows in any::<bool>(), shared in any::<bool>()) {
            let r = recipe();
            let mut s = settings("20");
            if windows {
                s.os = Os::Windows;
            }
            let state = init(&r, &context().with_cli_option("shared", OptionValue::Bool(shared))).unwrap();
            let once = config_options(&r, &s, &state.options);
            let twice = config_options(&r, &s, &once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_shared_never_keeps_fpic(windows in any::<bool>()) {
            let r = recipe();
            let mut s = settings("20");
            if windows {
                s.os = Os::Windows;
            }
            let state = init(&r, &context().with_cli_option("shared", OptionValue::Bool(true))).unwrap();
            let options = config_options(&r, &s, &state.options);
            let configured = configure(&r, &options, &DependencyOptions::new(), None);
            prop_assert!(!configured.options.contains("fPIC"));
        }
    }
}

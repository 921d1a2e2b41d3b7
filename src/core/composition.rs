//! Recipe composition
//!
//! A root recipe may nest recipes that package the same artifact
//! (`role = "package"`) or consume it to test it (`role = "test"`). The
//! tree is loaded once, ordered with [`DependencyGraph`] (packaged recipes,
//! then their declarer, then test consumers) and each recipe is driven
//! through its own independent lifecycle run.
//!
//! The root's version and forced dependency options are single-sourced:
//! every nested run receives them verbatim.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::lifecycle::{BuildTool, ConsumedPackage, Lifecycle, LifecycleReport, Phase, RunContext};
use crate::core::recipe::{recipe_file, NestedRole, Recipe, VersionPolicy};
use crate::core::requirements::DependencyRef;
use crate::core::resolver::DependencyGraph;
use crate::error::{ConfigurationError, RecipeError, ResolverError};

/// Role of a recipe inside a composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionRole {
    Root,
    Package,
    Test,
}

/// A loaded recipe and where it sits in the tree
#[derive(Debug, Clone)]
pub struct RecipeNode {
    /// Unique key (canonical recipe directory)
    pub key: String,
    pub dir: PathBuf,
    pub recipe: Recipe,
    pub role: CompositionRole,
    /// Key of the declaring recipe; `None` for the root
    pub parent: Option<String>,
}

/// One planned lifecycle run
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRun {
    pub key: String,
    pub name: String,
    pub role: CompositionRole,
    /// Version the run is invoked with
    pub version: String,
    /// Reference of the tested package (test consumers only)
    pub tests: Option<DependencyRef>,
}

/// A loaded, ordered recipe tree
#[derive(Debug, Clone)]
pub struct Composition {
    root: String,
    nodes: BTreeMap<String, RecipeNode>,
    order: Vec<String>,
}

fn node_key(dir: &Path) -> String {
    dir.canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf())
        .display()
        .to_string()
}

fn recipe_dir(path: &Path) -> PathBuf {
    let file = recipe_file(path);
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

impl Composition {
    /// Load the root recipe at `path` and every recipe it nests
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let root_dir = recipe_dir(path);
        let root = node_key(&root_dir);
        let mut nodes = BTreeMap::new();
        let mut graph = DependencyGraph::new();
        graph.add_node(&root);

        let mut pending = vec![(root_dir, CompositionRole::Root, None::<String>)];
        while let Some((dir, role, parent)) = pending.pop() {
            let key = node_key(&dir);
            if nodes.contains_key(&key) {
                continue;
            }
            let recipe = Recipe::load(&dir)?;
            for nested in &recipe.nested {
                let nested_dir = dir.join(&nested.path);
                if !recipe_file(&nested_dir).is_file() {
                    return Err(ResolverError::MissingRecipe {
                        recipe: recipe.name().to_string(),
                        path: nested_dir,
                    }
                    .into());
                }
                let nested_key = node_key(&nested_dir);
                let nested_role = match nested.role {
                    NestedRole::Package => {
                        graph.add_edge(&key, &nested_key);
                        CompositionRole::Package
                    }
                    NestedRole::Test => {
                        graph.add_edge(&nested_key, &key);
                        CompositionRole::Test
                    }
                };
                pending.push((nested_dir, nested_role, Some(key.clone())));
            }
            nodes.insert(
                key.clone(),
                RecipeNode {
                    key,
                    dir,
                    recipe,
                    role,
                    parent,
                },
            );
        }

        let order = graph.topological_sort()?;
        tracing::debug!("composition order: {:?}", order);
        Ok(Self { root, nodes, order })
    }

    pub fn root(&self) -> &RecipeNode {
        &self.nodes[&self.root]
    }

    /// Nodes in run order
    pub fn nodes(&self) -> impl Iterator<Item = &RecipeNode> {
        self.order.iter().filter_map(|key| self.nodes.get(key))
    }

    /// Resolve versions for every run under the root's version policy
    pub fn plan(&self) -> Result<Vec<PlannedRun>, ConfigurationError> {
        let root = self.root();
        let root_version = root
            .recipe
            .version()
            .ok_or_else(|| ConfigurationError::MissingField {
                recipe: root.recipe.name().to_string(),
                field: "version".to_string(),
            })?
            .to_string();
        let policy = root.recipe.composition.version_policy;

        let mut versions: BTreeMap<&str, String> = BTreeMap::new();
        let mut runs = Vec::new();
        for node in self.nodes() {
            // Parents run first, so a tested recipe's version is already resolved
            let tested = match (node.role, &node.parent) {
                (CompositionRole::Test, Some(parent)) => {
                    let tested_version = versions
                        .get(parent.as_str())
                        .cloned()
                        .unwrap_or_else(|| root_version.clone());
                    Some(DependencyRef::new(self.nodes[parent].recipe.name(), &tested_version))
                }
                _ => None,
            };

            let declared = node.recipe.version();
            let version = match (node.role, policy, declared) {
                (CompositionRole::Root, _, _) => root_version.clone(),
                (CompositionRole::Test, _, _) => {
                    let tested_version = tested
                        .as_ref()
                        .and_then(|r| r.version.clone())
                        .unwrap_or_else(|| root_version.clone());
                    if declared.is_some_and(|v| v != tested_version) {
                        tracing::debug!(
                            "{} runs at {} to match the recipe it tests",
                            node.recipe.name(),
                            tested_version
                        );
                    }
                    tested_version
                }
                (CompositionRole::Package, VersionPolicy::Lockstep, Some(v)) if v != root_version => {
                    return Err(ConfigurationError::VersionDivergence {
                        root: root.recipe.name().to_string(),
                        root_version,
                        nested: node.recipe.name().to_string(),
                        nested_version: v.to_string(),
                    })
                }
                (CompositionRole::Package, VersionPolicy::Lockstep, _) => root_version.clone(),
                (_, _, Some(v)) => v.to_string(),
                (_, _, None) => root_version.clone(),
            };

            versions.insert(node.key.as_str(), version.clone());
            runs.push(PlannedRun {
                key: node.key.clone(),
                name: node.recipe.name().to_string(),
                role: node.role,
                version,
                tests: tested,
            });
        }
        Ok(runs)
    }

    /// Run every recipe in order, stopping at the first failure
    ///
    /// `template` supplies settings, user options and the output root; each
    /// recipe builds under `<output_root>/<name>`.
    pub fn run<T: BuildTool>(
        &self,
        template: &RunContext,
        tool: &mut T,
        mut observer: impl FnMut(&str, Phase),
    ) -> Result<Vec<LifecycleReport>, RecipeError> {
        let plan = self.plan()?;
        let root = self.root();
        let mut reports: BTreeMap<String, LifecycleReport> = BTreeMap::new();
        let mut ordered = Vec::new();

        for run in plan {
            let node = &self.nodes[&run.key];
            let context = self.context_for(node, &run, template, &reports);
            tracing::info!("running {} ({:?}) at {}", run.name, run.role, run.version);
            let report = Lifecycle::new(&node.recipe, context, tool)
                .on_phase(&mut observer)
                .run()?;
            reports.insert(run.key.clone(), report.clone());
            ordered.push(report);
        }

        tracing::debug!("composition of {} finished", root.recipe.name());
        Ok(ordered)
    }

    fn context_for(
        &self,
        node: &RecipeNode,
        run: &PlannedRun,
        template: &RunContext,
        reports: &BTreeMap<String, LifecycleReport>,
    ) -> RunContext {
        let mut context = template.clone();
        context.source_dir = node.dir.clone();
        context.output_root = template.output_root.join(&run.name);
        context.version = Some(run.version.clone());

        if node.role != CompositionRole::Root {
            context.inherited_overrides = Some(self.root().recipe.dependency_options.clone());
            // User options target the root; nested recipes take the ones they declare
            context.cli_options.retain(|name, _| node.recipe.option(name).is_some());
            context.profile_options.retain(|name, _| node.recipe.option(name).is_some());
        }

        if let (Some(tested), Some(parent)) = (&run.tests, &node.parent) {
            context.extra_requires = vec![tested.clone()];
            let tested_node = &self.nodes[parent];
            context.consumed = reports
                .get(parent)
                .and_then(|report| report.layout.as_ref())
                .map(|layout| ConsumedPackage {
                    package_dir: layout.package_dir.clone(),
                    info: tested_node.recipe.package_info.clone(),
                })
                .into_iter()
                .collect();
        }
        context
    }
}

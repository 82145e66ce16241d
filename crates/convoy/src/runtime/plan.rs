//! Deployment plan construction and validation

use crate::config::{PlanFile, UnitConfigError, UnitSpec};
use crate::runtime::graph::{CycleError, Digraph, GraphError, TopSorter};
use indexmap::IndexMap;

/// Validated, ordered deployment plan.
///
/// Built once from a [`PlanFile`]; validation, graph construction and the
/// topological sort all happen in the constructor, so an instance of this
/// type is immutable and always safe to iterate in deploy order.
#[derive(Debug)]
pub struct DeploymentPlan {
    units: IndexMap<String, UnitSpec>,
    order: Vec<String>,
}

impl DeploymentPlan {
    /// Build a plan from a parsed plan document
    pub fn from_document(document: &PlanFile) -> Result<Self, PlanError> {
        let unit_defs = document.units.as_ref().ok_or(PlanError::MissingUnits)?;

        let mut units = IndexMap::with_capacity(unit_defs.len());
        for (name, def) in unit_defs {
            units.insert(name.clone(), UnitSpec::new(name, def)?);
        }

        let order = determine_deploy_order(&units)?;

        Ok(Self { units, order })
    }

    /// Number of units in the plan
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the plan declares no units
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in dependency-first deploy order
    pub fn iter(&self) -> impl Iterator<Item = &UnitSpec> {
        self.order.iter().filter_map(|name| self.units.get(name))
    }

    /// Look up a unit by name
    pub fn get(&self, name: &str) -> Option<&UnitSpec> {
        self.units.get(name)
    }
}

/// Build the dependency graph (edge unit -> dependency) and sort it
fn determine_deploy_order(units: &IndexMap<String, UnitSpec>) -> Result<Vec<String>, PlanError> {
    let mut graph = Digraph::with_capacity(units.len());

    for name in units.keys() {
        graph.add_node(name.clone());
    }

    for (name, spec) in units {
        for dependency in &spec.dependencies {
            if !units.contains_key(dependency) {
                return Err(PlanError::UnknownDependency {
                    unit: name.clone(),
                    dependency: dependency.clone(),
                });
            }
            graph.add_edge(name.clone(), dependency.clone())?;
        }
    }

    Ok(TopSorter::new(&graph).sort()?)
}

/// Errors that can occur when constructing a deployment plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("required field `units` is missing")]
    MissingUnits,

    #[error(transparent)]
    Unit(#[from] UnitConfigError),

    #[error("unit '{unit}' depends on unknown dependency '{dependency}'")]
    UnknownDependency { unit: String, dependency: String },

    #[error(transparent)]
    Cycle(#[from] CycleError<String>),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl std::fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Deployment Plan")?;
        writeln!(f, "===============")?;
        writeln!(f)?;
        writeln!(f, "Units (in deploy order):")?;

        for (i, unit) in self.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "  {}. {}", i + 1, unit.name)?;
            writeln!(f, "     Class: {}", unit.class)?;
            writeln!(f, "     Instances: {}", unit.instances)?;

            if unit.worker {
                let mode = if unit.multi_threaded {
                    "worker (multi-threaded)"
                } else {
                    "worker"
                };
                writeln!(f, "     Mode: {}", mode)?;
            }

            if !unit.dependencies.is_empty() {
                writeln!(f, "     Depends on: {}", unit.dependencies.join(", "))?;
            }
        }

        Ok(())
    }
}

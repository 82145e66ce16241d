//! Validated unit specification

use crate::config::plan_file::{ConfigRef, InstancesValue, UnitDef};
use std::num::ParseIntError;

/// Validated description of one deployable unit.
///
/// Produced from a raw [`UnitDef`] at plan-construction time; the instance
/// count is fully resolved here, so the rest of the pipeline only ever sees
/// a concrete count >= 1.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    /// Unit name, unique within the plan
    pub name: String,
    /// Implementation identifier, resolved against the host's unit registry
    pub class: String,
    /// Resolved instance count (>= 1)
    pub instances: usize,
    /// Unit configuration reference, resolved later by the config loader
    pub config: Option<ConfigRef>,
    /// Deploy on the worker pool
    pub worker: bool,
    /// Allow concurrent execution of worker instances
    pub multi_threaded: bool,
    /// Names of units that must be deployed before this one
    pub dependencies: Vec<String>,
}

impl UnitSpec {
    /// Validate a raw unit definition
    pub fn new(name: &str, def: &UnitDef) -> Result<Self, UnitConfigError> {
        let class = def
            .class
            .clone()
            .ok_or_else(|| UnitConfigError::MissingClass {
                name: name.to_string(),
            })?;

        let instances = resolve_instances(name, def.instances.as_ref())?;

        Ok(Self {
            name: name.to_string(),
            class,
            instances,
            config: def.config.clone(),
            worker: def.worker,
            multi_threaded: def.multi_threaded,
            dependencies: def.dependencies.clone(),
        })
    }
}

/// Resolve the declared instance count to a concrete count >= 1.
///
/// A `"<N>C"` string multiplies N by the host's available parallelism; a
/// bare numeric string parses as-is.
fn resolve_instances(name: &str, value: Option<&InstancesValue>) -> Result<usize, UnitConfigError> {
    let resolved = match value {
        None => {
            return Err(UnitConfigError::MissingInstances {
                name: name.to_string(),
            })
        }
        Some(InstancesValue::Count(n)) => *n,
        Some(InstancesValue::Expr(expr)) => parse_instances(name, expr)?,
    };

    if resolved < 1 {
        return Err(UnitConfigError::TooFewInstances {
            name: name.to_string(),
            resolved,
        });
    }

    Ok(resolved as usize)
}

fn parse_instances(name: &str, expr: &str) -> Result<i64, UnitConfigError> {
    let invalid = |source: ParseIntError| UnitConfigError::InvalidInstances {
        name: name.to_string(),
        value: expr.to_string(),
        source,
    };

    match expr.strip_suffix('C') {
        Some(per_core) => {
            let per_core: i64 = per_core.parse().map_err(invalid)?;
            Ok(per_core * available_parallelism() as i64)
        }
        None => expr.parse().map_err(invalid),
    }
}

/// Logical processors available to the process; 1 if the query fails
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Errors that can occur when validating a unit definition
#[derive(Debug, thiserror::Error)]
pub enum UnitConfigError {
    #[error("field `class` not specified for unit '{name}'")]
    MissingClass { name: String },

    #[error("field `instances` not specified for unit '{name}'")]
    MissingInstances { name: String },

    #[error("field `instances` for unit '{name}' has unparseable value '{value}': {source}")]
    InvalidInstances {
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("field `instances` for unit '{name}' resolves to {resolved}; at least 1 is required")]
    TooFewInstances { name: String, resolved: i64 },
}

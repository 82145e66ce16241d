//! Plan file schema definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root plan document
///
/// Declares the units that make up a service and how they depend on each
/// other. The document is YAML; JSON documents load unchanged since YAML is
/// a superset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    /// Unit definitions (ordered map for deterministic deploy order)
    #[serde(default)]
    pub units: Option<IndexMap<String, UnitDef>>,

    /// Whether the caller should tear everything down on a failed deploy.
    /// Parsed here for completeness; the orchestrator itself always runs
    /// the full sequence and reports the aggregate outcome.
    #[serde(default)]
    pub abort_on_failure: bool,
}

/// Raw definition of one unit, prior to validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDef {
    /// Implementation identifier, resolved against the host's unit registry
    #[serde(default)]
    pub class: Option<String>,

    /// Number of instances to deploy
    #[serde(default)]
    pub instances: Option<InstancesValue>,

    /// Unit configuration: an inline object or a path to a config file
    #[serde(default)]
    pub config: Option<ConfigRef>,

    /// Deploy on the worker pool instead of the main loop
    #[serde(default)]
    pub worker: bool,

    /// Allow concurrent execution of worker instances
    #[serde(default)]
    pub multi_threaded: bool,

    /// Units that must be deployed before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Instance count: a plain integer, or a string such as `"4"` or `"4C"`
/// (the latter meaning 4 x available parallelism)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstancesValue {
    Count(i64),
    Expr(String),
}

/// Unit configuration reference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigRef {
    /// Path to a config file, resolved by the [`ConfigLoader`](crate::config::ConfigLoader)
    Path(String),
    /// Inline configuration object
    Inline(serde_json::Value),
}

impl PlanFile {
    /// Load a plan document from a file
    pub fn from_file(path: &str) -> Result<Self, PlanFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanFileError::Io {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a plan document from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, PlanFileError> {
        serde_yaml::from_str(content).map_err(PlanFileError::Parse)
    }
}

/// Errors that can occur when loading a plan file
#[derive(Debug, thiserror::Error)]
pub enum PlanFileError {
    #[error("failed to read plan file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plan file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_plan_file() {
        let yaml = r#"
units:
  metrics:
    class: "svc.Metrics"
    instances: 1
  api:
    class: "svc.Api"
    instances: "2C"
    worker: true
    dependencies:
      - metrics
"#;
        let plan_file = PlanFile::from_yaml(yaml).unwrap();
        let units = plan_file.units.unwrap();
        assert_eq!(units.len(), 2);
        assert!(matches!(units["metrics"].instances, Some(InstancesValue::Count(1))));
        assert!(matches!(units["api"].instances, Some(InstancesValue::Expr(_))));
        assert!(units["api"].worker);
        assert_eq!(units["api"].dependencies, vec!["metrics"]);
    }

    #[test]
    fn test_missing_units_mapping_parses_as_none() {
        let plan_file = PlanFile::from_yaml("abort_on_failure: true").unwrap();
        assert!(plan_file.units.is_none());
        assert!(plan_file.abort_on_failure);
    }

    #[test]
    fn test_config_ref_variants() {
        let yaml = r#"
units:
  a:
    class: "svc.A"
    instances: 1
    config: "configs/a.yaml"
  b:
    class: "svc.B"
    instances: 1
    config:
      port: 8080
"#;
        let plan_file = PlanFile::from_yaml(yaml).unwrap();
        let units = plan_file.units.unwrap();
        assert!(matches!(units["a"].config, Some(ConfigRef::Path(_))));
        assert!(matches!(units["b"].config, Some(ConfigRef::Inline(_))));
    }

    #[test]
    fn test_json_document_loads() {
        let json = r#"{"units": {"a": {"class": "svc.A", "instances": 2}}}"#;
        let plan_file = PlanFile::from_yaml(json).unwrap();
        assert_eq!(plan_file.units.unwrap().len(), 1);
    }
}

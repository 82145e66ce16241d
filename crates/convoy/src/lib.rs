//! Convoy
//!
//! A deployment-time control plane for multi-component services: declare
//! your units and their dependencies in a plan file, and convoy deploys
//! them one at a time in dependency order, aggregating every per-unit
//! outcome into a single result.
//!
//! # Overview
//!
//! - Define units (implementation, instance count, config, dependencies)
//!   in a YAML plan file
//! - Deploy units in a deterministic, dependency-first order with cycle
//!   detection
//! - Register the actual deploy mechanism per implementation id via a
//!   [`UnitRegistry`](runtime::UnitRegistry) — convoy never instantiates
//!   implementations itself
//! - Collect all per-unit failures of a run into one aggregate error
//!
//! # Example Plan File
//!
//! ```yaml
//! units:
//!   metrics:
//!     class: "svc.MetricsReporter"
//!     instances: 1
//!
//!   api:
//!     class: "svc.ApiServer"
//!     instances: "2C"
//!     config: "configs/api.yaml"
//!     dependencies:
//!       - metrics
//!
//!   indexer:
//!     class: "svc.Indexer"
//!     instances: 4
//!     worker: true
//!     dependencies:
//!       - api
//! ```

pub mod cli;
pub mod config;
pub mod runtime;

pub use cli::ConvoyArgs;
pub use config::{ConfigLoadError, ConfigLoader, PlanFile, PlanFileError, UnitConfigError, UnitSpec};
pub use runtime::{
    AggregateDeployError, CycleError, DeployError, DeployOptions, Deployment, DeploymentMonitor,
    DeploymentPlan, Digraph, GraphError, MultiDeployError, MultiUnitDeployment, PlanError,
    TopSorter, UnitFactory, UnitRegistry,
};

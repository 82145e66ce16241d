//! Per-unit deployment handles and the host-supplied unit registry

use crate::config::{ConfigLoadError, UnitSpec};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Options handed to a [`UnitFactory`] for one deployment
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Number of instances to run
    pub instances: usize,
    /// Resolved configuration object
    pub config: Value,
    /// Run on the worker pool
    pub worker: bool,
    /// Allow concurrent execution of worker instances
    pub multi_threaded: bool,
}

/// The host's deploy primitive for one implementation.
///
/// On success the factory returns a non-empty deployment identifier; an
/// empty identifier is treated as a failed deployment by the caller.
#[async_trait]
pub trait UnitFactory: Send + Sync {
    async fn deploy(&self, options: DeployOptions) -> anyhow::Result<String>;
}

/// Maps implementation identifiers to the factories that deploy them.
///
/// Supplied by the host process at orchestrator construction time; the
/// orchestrator only ever calls registered factories, it never instantiates
/// implementations itself.
#[derive(Default)]
pub struct UnitRegistry {
    factories: HashMap<String, Arc<dyn UnitFactory>>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for an implementation identifier
    pub fn register(&mut self, class: impl Into<String>, factory: Arc<dyn UnitFactory>) {
        self.factories.insert(class.into(), factory);
    }

    /// Look up the factory for an implementation identifier
    pub fn get(&self, class: &str) -> Option<Arc<dyn UnitFactory>> {
        self.factories.get(class).map(Arc::clone)
    }
}

/// Facade over one unit's deploy primitive.
///
/// Normalizes the three ways a unit can fail to come up (config load
/// failure, deploy failure, empty deployment id) into [`DeployError`];
/// each handle settles exactly once, via either [`Deployment::deploy`] or
/// [`Deployment::abort`].
pub struct Deployment {
    name: String,
    factory: Arc<dyn UnitFactory>,
    worker: bool,
    multi_threaded: bool,
}

impl Deployment {
    /// Resolve the unit's factory from the registry
    pub fn create(registry: &UnitRegistry, spec: &UnitSpec) -> Result<Self, DeployError> {
        let factory = registry
            .get(&spec.class)
            .ok_or_else(|| DeployError::UnknownImplementation {
                name: spec.name.clone(),
                class: spec.class.clone(),
            })?;

        Ok(Self {
            name: spec.name.clone(),
            factory,
            worker: spec.worker,
            multi_threaded: spec.multi_threaded,
        })
    }

    /// Invoke the deploy primitive and normalize its outcome
    pub async fn deploy(&self, instances: usize, config: Value) -> Result<String, DeployError> {
        log::info!(
            "Deploying unit '{}' ({} instance(s))",
            self.name,
            instances
        );

        let options = DeployOptions {
            instances,
            config,
            worker: self.worker,
            multi_threaded: self.multi_threaded,
        };

        match self.factory.deploy(options).await {
            Ok(id) if !id.is_empty() => {
                log::debug!("Deployed unit '{}' successfully", self.name);
                Ok(id)
            }
            Ok(_) => {
                log::debug!("Unit '{}' returned an empty deployment id", self.name);
                Err(DeployError::Failed {
                    name: self.name.clone(),
                    cause: None,
                })
            }
            Err(e) => {
                log::debug!("Failed to deploy unit '{}': {:#}", self.name, e);
                Err(DeployError::Failed {
                    name: self.name.clone(),
                    cause: Some(e.into()),
                })
            }
        }
    }

    /// Settle the deployment as aborted: its configuration could not be
    /// resolved before the deploy primitive was attempted.
    pub fn abort(&self, cause: ConfigLoadError) -> DeployError {
        log::debug!("Aborted deploying unit '{}': {}", self.name, cause);
        DeployError::Aborted {
            name: self.name.clone(),
            cause,
        }
    }
}

/// Per-unit deployment failures
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The deploy primitive failed, or succeeded without an identifier
    #[error("failed to deploy unit '{name}'")]
    Failed {
        name: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The unit's configuration could not be resolved
    #[error("aborted deploying unit '{name}'")]
    Aborted {
        name: String,
        #[source]
        cause: ConfigLoadError,
    },

    /// A success outcome carried an empty deployment id
    #[error("empty deployment id; failed to deploy unit")]
    EmptyId,

    /// No factory registered for the unit's implementation identifier
    #[error("no factory registered for implementation '{class}' (unit '{name}')")]
    UnknownImplementation { name: String, class: String },
}

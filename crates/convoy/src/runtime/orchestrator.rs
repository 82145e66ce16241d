//! Multi-unit deployment orchestration

use crate::config::{ConfigLoader, PlanFile, UnitSpec};
use crate::runtime::deployment::{DeployError, Deployment, UnitRegistry};
use crate::runtime::monitor::{AggregateDeployError, DeploymentMonitor};
use crate::runtime::plan::{DeploymentPlan, PlanError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Deploys every unit in a plan, one at a time, in dependency order.
///
/// Ordering is attempt-order only: a unit waits for its predecessor in the
/// plan to settle (successfully or not) before it is attempted, but it is
/// never gated on its dependencies *succeeding*. A failed unit therefore
/// delays later units, it does not block them; every unit is attempted and
/// every outcome feeds the aggregate result.
///
/// One-shot: a second call to [`MultiUnitDeployment::deploy`] on the same
/// instance fails immediately without performing any work.
pub struct MultiUnitDeployment {
    registry: Arc<UnitRegistry>,
    loader: Arc<ConfigLoader>,
    started: AtomicBool,
}

impl MultiUnitDeployment {
    pub fn new(registry: Arc<UnitRegistry>, loader: Arc<ConfigLoader>) -> Self {
        Self {
            registry,
            loader,
            started: AtomicBool::new(false),
        }
    }

    /// Deploy all units declared by `document`.
    ///
    /// Plan validation failures (malformed units, unknown dependencies,
    /// cycles) abort the run before any unit is attempted. Per-unit
    /// failures never stop the sequence; they are collected and surfaced
    /// as one [`AggregateDeployError`] once every unit has settled.
    pub async fn deploy(&self, document: &PlanFile) -> Result<(), MultiDeployError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(MultiDeployError::AlreadyStarted);
        }

        let plan = DeploymentPlan::from_document(document)?;
        let total = plan.len();
        log::info!("Deploying {} unit(s)", total);

        if total == 0 {
            return Ok(());
        }

        let (done_tx, done_rx) = oneshot::channel();
        let monitor = DeploymentMonitor::new(total, move |result| {
            let _ = done_tx.send(result);
        });

        for spec in plan.iter() {
            monitor.report(self.deploy_unit(spec).await);
        }

        // The monitor fires on the Nth report, which happened in the loop
        // above, so the channel cannot be dropped unsent.
        done_rx.await.unwrap_or(Ok(())).map_err(Into::into)
    }

    /// Resolve one unit's config and settle its deployment handle
    async fn deploy_unit(&self, spec: &UnitSpec) -> Result<String, DeployError> {
        let deployment = Deployment::create(&self.registry, spec)?;

        match self.loader.load(spec.config.as_ref()).await {
            Ok(config) => deployment.deploy(spec.instances, config).await,
            Err(cause) => Err(deployment.abort(cause)),
        }
    }
}

/// Terminal error of one orchestration run
#[derive(Debug, thiserror::Error)]
pub enum MultiDeployError {
    #[error("deployment already started")]
    AlreadyStarted,

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Aggregate(#[from] AggregateDeployError),
}

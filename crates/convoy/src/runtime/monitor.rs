//! Completion tracking for in-flight unit deployments

use crate::runtime::deployment::DeployError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type CompletionCallback = Box<dyn FnOnce(Result<(), AggregateDeployError>) + Send>;

/// Tracks the number of unit deployments remaining and the failures seen so
/// far; once every unit has reported, invokes the completion callback
/// exactly once with the aggregate outcome.
///
/// Reports may arrive from arbitrary threads: the remaining count is an
/// atomic decrement, and whichever reporter observes it hit zero takes the
/// callback out of its slot and fires it.
pub struct DeploymentMonitor {
    total: usize,
    remaining: AtomicUsize,
    failures: Mutex<Vec<DeployError>>,
    on_complete: Mutex<Option<CompletionCallback>>,
}

impl DeploymentMonitor {
    /// `total` is the number of reports to wait for before firing
    /// `on_complete`.
    pub fn new<F>(total: usize, on_complete: F) -> Self
    where
        F: FnOnce(Result<(), AggregateDeployError>) + Send + 'static,
    {
        Self {
            total,
            remaining: AtomicUsize::new(total),
            failures: Mutex::new(Vec::new()),
            on_complete: Mutex::new(Some(Box::new(on_complete))),
        }
    }

    /// Record one unit's outcome.
    ///
    /// A failure, or a success that carried an empty deployment id, is
    /// added to the failure collection.
    pub fn report(&self, result: Result<String, DeployError>) {
        self.check_for_failure(result);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.handle_completion();
        }
    }

    fn check_for_failure(&self, result: Result<String, DeployError>) {
        let failure = match result {
            Ok(id) if id.is_empty() => DeployError::EmptyId,
            Ok(_) => return,
            Err(e) => e,
        };

        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure);
        }
    }

    fn handle_completion(&self) {
        let Some(on_complete) = self.on_complete.lock().ok().and_then(|mut cb| cb.take()) else {
            return;
        };

        let failures = self
            .failures
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default();

        if failures.is_empty() {
            log::info!("Deployed {} unit(s) successfully", self.total);
            on_complete(Ok(()));
        } else {
            let error = AggregateDeployError::new(self.total, failures);
            log::error!("{}", error);
            on_complete(Err(error));
        }
    }
}

/// Terminal failure of one orchestration run, carrying every per-unit cause
#[derive(Debug, thiserror::Error)]
#[error("Failed to deploy {failed} of {total} unit(s)")]
pub struct AggregateDeployError {
    failed: usize,
    total: usize,
    failures: Vec<DeployError>,
}

impl AggregateDeployError {
    fn new(total: usize, failures: Vec<DeployError>) -> Self {
        Self {
            failed: failures.len(),
            total,
            failures,
        }
    }

    /// The individual per-unit failures behind this aggregate
    pub fn failures(&self) -> &[DeployError] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn monitor_with_result(
        total: usize,
    ) -> (
        Arc<DeploymentMonitor>,
        Arc<Mutex<Option<Result<(), AggregateDeployError>>>>,
        Arc<AtomicUsize>,
    ) {
        let slot = Arc::new(Mutex::new(None));
        let fired = Arc::new(AtomicUsize::new(0));
        let monitor = {
            let slot = Arc::clone(&slot);
            let fired = Arc::clone(&fired);
            Arc::new(DeploymentMonitor::new(total, move |result| {
                fired.fetch_add(1, Ordering::SeqCst);
                *slot.lock().unwrap() = Some(result);
            }))
        };
        (monitor, slot, fired)
    }

    fn failed(name: &str) -> DeployError {
        DeployError::Failed {
            name: name.to_string(),
            cause: None,
        }
    }

    #[test]
    fn test_all_successes_complete_ok() {
        let (monitor, slot, fired) = monitor_with_result(3);
        for i in 0..3 {
            monitor.report(Ok(format!("deploy-{i}")));
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(slot.lock().unwrap().take().unwrap().is_ok());
    }

    #[test]
    fn test_callback_not_fired_before_last_report() {
        let (monitor, _slot, fired) = monitor_with_result(2);
        monitor.report(Ok("deploy-0".to_string()));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        monitor.report(Ok("deploy-1".to_string()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_aggregate_with_count() {
        let (monitor, slot, _fired) = monitor_with_result(3);
        monitor.report(Ok("deploy-0".to_string()));
        monitor.report(Err(failed("b")));
        monitor.report(Err(failed("c")));

        let error = slot.lock().unwrap().take().unwrap().unwrap_err();
        assert_eq!(error.to_string(), "Failed to deploy 2 of 3 unit(s)");
        assert_eq!(error.failures().len(), 2);
    }

    #[test]
    fn test_empty_deployment_id_counts_as_failure() {
        let (monitor, slot, _fired) = monitor_with_result(1);
        monitor.report(Ok(String::new()));

        let error = slot.lock().unwrap().take().unwrap().unwrap_err();
        assert_eq!(error.to_string(), "Failed to deploy 1 of 1 unit(s)");
        assert!(matches!(error.failures()[0], DeployError::EmptyId));
    }

    #[test]
    fn test_concurrent_reports_fire_exactly_once() {
        let total = 64;
        let (monitor, slot, fired) = monitor_with_result(total);

        let handles: Vec<_> = (0..total)
            .map(|i| {
                let monitor = Arc::clone(&monitor);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        monitor.report(Ok(format!("deploy-{i}")));
                    } else {
                        monitor.report(Err(failed(&format!("unit-{i}"))));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let error = slot.lock().unwrap().take().unwrap().unwrap_err();
        assert_eq!(error.failures().len(), total / 2);
    }
}

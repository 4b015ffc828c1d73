//! Runs every check concurrently against one container.

use std::sync::Arc;

use canary_types::{Check, CheckError, CheckResult};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::container::ContainerHandle;
use crate::engine::{execute_check, ProbeTiming};
use crate::probe::{prober_for, ProbeSettings};

/// One task per check; results arrive in completion order.
///
/// Dropping the scheduler aborts outstanding checks.
pub struct CheckScheduler {
    tasks: JoinSet<()>,
    results: mpsc::Receiver<CheckResult>,
    total: usize,
    received: usize,
}

impl CheckScheduler {
    pub fn spawn(
        container: Arc<dyn ContainerHandle>,
        checks: &[Check],
        settings: &ProbeSettings,
    ) -> Self {
        // Room for every result, so no task ever waits on the receiver
        let (tx, results) = mpsc::channel(checks.len().max(1));
        let mut tasks = JoinSet::new();

        for check in checks {
            let tx = tx.clone();
            let check = check.clone();
            let container = Arc::clone(&container);
            let settings = settings.clone();

            tasks.spawn(async move {
                let outcome = run_check(&check, container.as_ref(), &settings).await;
                let result = CheckResult::new(&check.name, &check.description, outcome);
                debug!(check = %result.name, passed = result.passed, "Check finished");
                // The receiver is gone once the session aborted
                let _ = tx.send(result).await;
            });
        }

        Self {
            tasks,
            results,
            total: checks.len(),
            received: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Next finished check; `None` once all results were delivered or
    /// every task is gone.
    pub async fn next_result(&mut self) -> Option<CheckResult> {
        if self.received == self.total {
            return None;
        }
        let result = self.results.recv().await?;
        self.received += 1;
        Some(result)
    }

    /// Cancel all checks still running.
    pub fn abort(&mut self) {
        self.tasks.abort_all();
        self.results.close();
    }
}

async fn run_check(
    check: &Check,
    container: &dyn ContainerHandle,
    settings: &ProbeSettings,
) -> Result<bool, CheckError> {
    let handler = check.handler()?;
    let prober = prober_for(handler, &check.probe, settings)?;
    let timing = ProbeTiming::from(&check.probe);
    execute_check(prober.as_ref(), container, &check.name, &timing).await
}

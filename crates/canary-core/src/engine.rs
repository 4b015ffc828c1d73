//! Retry/threshold loop shared by every probe kind.

use std::time::Duration;

use canary_types::{CheckError, Probe};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::container::ContainerHandle;
use crate::probe::Prober;

/// Timing policy of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTiming {
    pub initial_delay: Duration,
    pub period: Duration,
    pub timeout: Duration,
    pub success_threshold: u32,
    pub failure_threshold: u32,
}

impl From<&Probe> for ProbeTiming {
    fn from(probe: &Probe) -> Self {
        Self {
            initial_delay: Duration::from_secs(probe.initial_delay_seconds),
            period: Duration::from_secs(probe.period_seconds),
            timeout: Duration::from_secs(probe.timeout_seconds),
            // A zero threshold would settle before any attempt ran
            success_threshold: probe.success_threshold.max(1),
            failure_threshold: probe.failure_threshold.max(1),
        }
    }
}

/// Run attempts until a threshold settles the verdict.
///
/// Passes and failures are counted consecutively; an attempt of the other
/// kind resets the counter. The timeout is measured from the first attempt,
/// after the initial delay.
pub async fn execute_check(
    prober: &dyn Prober,
    container: &dyn ContainerHandle,
    check: &str,
    timing: &ProbeTiming,
) -> Result<bool, CheckError> {
    if !timing.initial_delay.is_zero() {
        sleep(timing.initial_delay).await;
    }

    let started = Instant::now();
    let mut passes = 0u32;
    let mut fails = 0u32;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let outcome = match prober.probe(container).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(check, attempt, probe = prober.kind(), error = %e, "Probe errored");
                return Err(e);
            }
        };

        info!(
            check,
            attempt,
            pass = outcome.passed,
            diagnostics = %serde_json::Value::Object(outcome.diagnostics.clone()),
            "Probe attempt"
        );

        if outcome.passed {
            passes += 1;
            fails = 0;
        } else {
            fails += 1;
            passes = 0;
        }

        if passes >= timing.success_threshold || fails >= timing.failure_threshold {
            return Ok(outcome.passed);
        }

        if started.elapsed() > timing.timeout {
            return Err(CheckError::Timeout(timing.timeout.as_secs()));
        }

        sleep(timing.period).await;
    }
}

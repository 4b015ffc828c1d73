//! One validation run: load, start, check, tear down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use canary_config::{Config, ValidatorSource};
use canary_types::{CanaryError, CheckResult, Result, ValidatorSpec};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::container::{ContainerFactory, ContainerHandle};
use crate::probe::ProbeSettings;
use crate::reporter::{Reporter, SessionEvent};
use crate::scheduler::CheckScheduler;
use crate::utils::GracefulShutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoadingConfig,
    StartingContainer,
    RunningChecks,
    Teardown,
    Done,
    Failed,
}

/// What to do with a container kept for debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    /// Wait for an interrupt, then remove it.
    Block,
    /// Return immediately and leave it running.
    Detach,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub image: String,
    /// Keep the container after a failed validation.
    pub debug: bool,
    pub keep_alive: KeepAlive,
    pub startup_timeout: Duration,
    pub probe_settings: ProbeSettings,
    /// How often the reporter is ticked while the session waits.
    pub tick_interval: Duration,
}

impl SessionOptions {
    pub fn new(image: &str, config: &Config) -> Self {
        Self {
            image: image.to_string(),
            debug: false,
            keep_alive: KeepAlive::Detach,
            startup_timeout: config.startup_timeout(),
            probe_settings: ProbeSettings::from(config),
            tick_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub passed: bool,
    /// In completion order.
    pub results: Vec<CheckResult>,
    pub container_name: String,
    /// The container was left running after the session returned.
    pub kept_alive: bool,
    pub interrupted: bool,
}

impl SessionOutcome {
    fn interrupted(container_name: &str, results: Vec<CheckResult>) -> Self {
        Self {
            passed: false,
            results,
            container_name: container_name.to_string(),
            kept_alive: false,
            interrupted: true,
        }
    }
}

/// Drives a validator against one image.
///
/// Load and start failures are returned as errors; a failed validation is an
/// `Ok` outcome with `passed == false`. A fatal check error is returned as
/// [`CanaryError::Check`] after teardown.
pub struct ValidationSession<R: Reporter> {
    options: SessionOptions,
    factory: Arc<dyn ContainerFactory>,
    reporter: R,
    state: SessionState,
}

impl<R: Reporter> ValidationSession<R> {
    pub fn new(options: SessionOptions, factory: Arc<dyn ContainerFactory>, reporter: R) -> Self {
        Self {
            options,
            factory,
            reporter,
            state: SessionState::LoadingConfig,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub async fn run(
        &mut self,
        source: &dyn ValidatorSource,
        shutdown: &GracefulShutdown,
    ) -> Result<SessionOutcome> {
        let result = self.run_inner(source, shutdown).await;
        self.state = match &result {
            Ok(_) => SessionState::Done,
            Err(_) => SessionState::Failed,
        };
        self.reporter.finish();
        result
    }

    async fn run_inner(
        &mut self,
        source: &dyn ValidatorSource,
        shutdown: &GracefulShutdown,
    ) -> Result<SessionOutcome> {
        self.state = SessionState::LoadingConfig;
        self.reporter.handle(&SessionEvent::ConfigLoading);

        let loaded = wait_with_ticks(
            &mut self.reporter,
            self.options.tick_interval,
            shutdown,
            source.load(),
        )
        .await;
        let spec = match loaded {
            None => return Ok(self.interrupted_before_start("", None).await),
            Some(Ok(spec)) if spec.checks.is_empty() => {
                return Err(self.config_failed(CanaryError::Config("no checks found".to_string())))
            }
            Some(Ok(spec)) => spec,
            Some(Err(e)) => return Err(self.config_failed(e)),
        };
        self.reporter.handle(&SessionEvent::ConfigLoaded {
            name: spec.name.clone(),
            description: spec.description.clone(),
            checks: spec.checks.len(),
            image: self.options.image.clone(),
        });
        info!(validator = %spec.name, image = %self.options.image, checks = spec.checks.len(), "Validator loaded");

        self.state = SessionState::StartingContainer;
        let mut container = self.factory.create(&self.options.image, &spec);
        self.reporter.handle(&SessionEvent::ContainerStarting);

        match self.prepare_image(container.as_ref(), shutdown).await {
            Ok(true) => {}
            Ok(false) => return Ok(self.interrupted_before_start(container.name(), None).await),
            Err(e) => return Err(self.start_failed(e)),
        }

        let started = wait_with_ticks(
            &mut self.reporter,
            self.options.tick_interval,
            shutdown,
            container.start(self.options.startup_timeout),
        )
        .await;
        match started {
            None => {
                let name = container.name().to_string();
                return Ok(self
                    .interrupted_before_start(&name, Some(container.as_ref()))
                    .await);
            }
            Some(Err(e)) => return Err(self.start_failed(e)),
            Some(Ok(())) => {}
        }
        self.reporter.handle(&SessionEvent::ContainerStarted {
            name: container.name().to_string(),
            run_command: container.run_command().map(str::to_string),
        });

        let container: Arc<dyn ContainerHandle> = Arc::from(container);
        self.run_checks(container, &spec, shutdown).await
    }

    /// Returns `false` when interrupted.
    async fn prepare_image(
        &mut self,
        container: &dyn ContainerHandle,
        shutdown: &GracefulShutdown,
    ) -> Result<bool> {
        container.check_runtime().await?;
        if container.image_present().await? {
            return Ok(true);
        }

        self.reporter.handle(&SessionEvent::ImagePulling {
            image: container.image().to_string(),
        });
        match wait_with_ticks(
            &mut self.reporter,
            self.options.tick_interval,
            shutdown,
            container.pull_image(),
        )
        .await
        {
            None => Ok(false),
            Some(pulled) => pulled.map(|_| true),
        }
    }

    async fn run_checks(
        &mut self,
        container: Arc<dyn ContainerHandle>,
        spec: &ValidatorSpec,
        shutdown: &GracefulShutdown,
    ) -> Result<SessionOutcome> {
        self.state = SessionState::RunningChecks;
        let mut scheduler = CheckScheduler::spawn(
            Arc::clone(&container),
            &spec.checks,
            &self.options.probe_settings,
        );
        let total = scheduler.total();

        let mut results = Vec::with_capacity(total);
        let mut fatal: Option<CanaryError> = None;
        let mut interrupted = false;

        while results.len() < total {
            let next = wait_with_ticks(
                &mut self.reporter,
                self.options.tick_interval,
                shutdown,
                scheduler.next_result(),
            )
            .await;

            let result = match next {
                None => {
                    interrupted = true;
                    break;
                }
                Some(None) => {
                    let e = CanaryError::Internal(format!(
                        "check tasks ended after {} of {} results",
                        results.len(),
                        total
                    ));
                    self.reporter.handle(&SessionEvent::Aborted(e.to_string()));
                    fatal = Some(e);
                    break;
                }
                Some(Some(result)) => result,
            };

            let fatal_error = result.fatal_error().cloned();
            let name = result.name.clone();
            results.push(result.clone());
            self.reporter.handle(&SessionEvent::CheckCompleted {
                result,
                completed: results.len(),
                total,
            });

            if let Some(source) = fatal_error {
                warn!(check = %name, error = %source, "Fatal check error, aborting remaining checks");
                self.reporter
                    .handle(&SessionEvent::Aborted(source.to_string()));
                fatal = Some(CanaryError::Check { name, source });
                break;
            }
        }
        scheduler.abort();
        drop(scheduler);

        self.state = SessionState::Teardown;

        if interrupted {
            self.reporter.handle(&SessionEvent::Interrupted);
            self.remove(container.as_ref()).await;
            return Ok(SessionOutcome::interrupted(container.name(), results));
        }

        let passed = fatal.is_none() && results.iter().all(|r| r.passed);
        self.reporter.handle(&SessionEvent::Finished {
            passed,
            documentation: Some(spec.documentation.clone()).filter(|d| !passed && !d.is_empty()),
        });
        info!(container = container.name(), passed, "Checks complete");

        let mut outcome = SessionOutcome {
            passed,
            results,
            container_name: container.name().to_string(),
            kept_alive: false,
            interrupted: false,
        };

        if !passed && self.options.debug {
            let blocking = self.options.keep_alive == KeepAlive::Block;
            self.reporter.handle(&SessionEvent::ContainerKeptAlive {
                name: container.name().to_string(),
                blocking,
            });

            if blocking {
                wait_with_ticks(
                    &mut self.reporter,
                    self.options.tick_interval,
                    shutdown,
                    std::future::pending::<()>(),
                )
                .await;
                self.remove(container.as_ref()).await;
            } else {
                outcome.kept_alive = true;
            }
        } else {
            self.remove(container.as_ref()).await;
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }

    async fn interrupted_before_start(
        &mut self,
        name: &str,
        container: Option<&dyn ContainerHandle>,
    ) -> SessionOutcome {
        self.state = SessionState::Teardown;
        self.reporter.handle(&SessionEvent::Interrupted);
        if let Some(container) = container {
            // The start may have been cancelled after `run` created it
            self.remove(container).await;
        }
        SessionOutcome::interrupted(name, Vec::new())
    }

    async fn remove(&mut self, container: &dyn ContainerHandle) {
        match container.remove().await {
            Ok(()) => self.reporter.handle(&SessionEvent::ContainerRemoved),
            Err(e) => warn!(container = container.name(), error = %e, "Failed to remove container"),
        }
    }

    fn config_failed(&mut self, e: CanaryError) -> CanaryError {
        self.reporter.handle(&SessionEvent::ConfigFailed(e.to_string()));
        e
    }

    fn start_failed(&mut self, e: CanaryError) -> CanaryError {
        self.reporter
            .handle(&SessionEvent::ContainerStartFailed(e.to_string()));
        e
    }
}

/// Await `fut` while ticking the reporter; `None` if interrupted first.
async fn wait_with_ticks<R: Reporter, F: Future>(
    reporter: &mut R,
    tick: Duration,
    shutdown: &GracefulShutdown,
    fut: F,
) -> Option<F::Output> {
    tokio::pin!(fut);
    let interrupt = shutdown.requested();
    tokio::pin!(interrupt);

    let mut ticker = tokio::time::interval(tick.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut interrupt => return None,
            out = &mut fut => return Some(out),
            _ = ticker.tick() => reporter.tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::RecordingReporter;

    #[tokio::test(start_paused = true)]
    async fn wait_with_ticks_returns_output_and_ticks() {
        let shutdown = GracefulShutdown::new();
        let mut reporter = RecordingReporter::default();
        let out = wait_with_ticks(
            &mut reporter,
            Duration::from_millis(100),
            &shutdown,
            async {
                tokio::time::sleep(Duration::from_millis(450)).await;
                7
            },
        )
        .await;
        assert_eq!(out, Some(7));
        assert!(reporter.ticks >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_with_ticks_yields_to_interrupt() {
        let shutdown = GracefulShutdown::new();
        shutdown.request_shutdown();
        let mut reporter = RecordingReporter::default();
        let out = wait_with_ticks(
            &mut reporter,
            Duration::from_millis(100),
            &shutdown,
            std::future::pending::<()>(),
        )
        .await;
        assert!(out.is_none());
    }

    #[test]
    fn options_follow_config() {
        let cfg = Config {
            startup_timeout: 3,
            probe_host: "127.0.0.1".to_string(),
            ..Config::default()
        };
        let opts = SessionOptions::new("nginx", &cfg);
        assert_eq!(opts.startup_timeout, Duration::from_secs(3));
        assert_eq!(opts.probe_settings.host, "127.0.0.1");
        assert!(!opts.debug);
        assert_eq!(opts.keep_alive, KeepAlive::Detach);
    }
}

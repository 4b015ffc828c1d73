use canary_types::CheckResult;

/// Progress notifications emitted by a [`crate::session::ValidationSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ConfigLoading,
    ConfigLoaded {
        name: String,
        description: String,
        checks: usize,
        image: String,
    },
    ConfigFailed(String),
    ImagePulling {
        image: String,
    },
    ContainerStarting,
    ContainerStarted {
        name: String,
        run_command: Option<String>,
    },
    ContainerStartFailed(String),
    CheckCompleted {
        result: CheckResult,
        completed: usize,
        total: usize,
    },
    /// A check errored fatally and the remaining checks were aborted.
    Aborted(String),
    Interrupted,
    ContainerKeptAlive {
        name: String,
        /// True when the session waits for an interrupt before removing it.
        blocking: bool,
    },
    ContainerRemoved,
    Finished {
        passed: bool,
        documentation: Option<String>,
    },
}

/// Presentation of session progress.
pub trait Reporter: Send {
    fn handle(&mut self, event: &SessionEvent);

    /// Called periodically while the session is waiting.
    fn tick(&mut self) {}

    /// Restore the terminal; called once when the session ends.
    fn finish(&mut self) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn handle(&mut self, _event: &SessionEvent) {}
}

/// Keeps every event; useful for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub events: Vec<SessionEvent>,
    pub ticks: usize,
}

impl Reporter for RecordingReporter {
    fn handle(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn handle(&mut self, event: &SessionEvent) {
        (**self).handle(event)
    }

    fn tick(&mut self) {
        (**self).tick()
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

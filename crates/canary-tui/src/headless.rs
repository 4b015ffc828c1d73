use std::io::Write;

use canary_core::{Reporter, SessionEvent};
use tracing::warn;

use crate::state::{ProgressState, ReportOptions};

/// Line-oriented output for pipes and CI logs.
pub struct HeadlessReporter<W: Write + Send> {
    out: W,
    state: ProgressState,
}

impl HeadlessReporter<std::io::Stdout> {
    pub fn stdout(options: ReportOptions) -> Self {
        Self::new(std::io::stdout(), options)
    }
}

impl<W: Write + Send> HeadlessReporter<W> {
    pub fn new(out: W, mut options: ReportOptions) -> Self {
        options.interactive = false;
        Self {
            out,
            state: ProgressState::new(options),
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for HeadlessReporter<W> {
    fn handle(&mut self, event: &SessionEvent) {
        for line in self.state.apply(event) {
            if let Err(e) = writeln!(self.out, "{}", line.text()) {
                warn!(error = %e, "Failed to write progress output");
                return;
            }
        }
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        let _ = self.out.flush();
    }
}

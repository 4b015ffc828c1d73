//! Session progress as seen by a reporter.

use canary_core::SessionEvent;

/// Visual role of a piece of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Passed,
    Failed,
    Highlight,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub tone: Tone,
}

impl Segment {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }
}

/// One line of permanent output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputLine(pub Vec<Segment>);

impl OutputLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self(vec![Segment::plain(text)])
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self(vec![Segment::new(text, tone)])
    }

    pub fn text(&self) -> String {
        self.0.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadingConfig,
    PullingImage,
    StartingContainer,
    RunningChecks,
    /// Waiting for an interrupt with the container kept for debugging.
    KeptAlive,
    Done,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// A live status area replaces the progress lines a headless run prints.
    pub interactive: bool,
    pub debug: bool,
    /// Runtime binary named in the inspection instructions.
    pub runtime: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            interactive: false,
            debug: false,
            runtime: "docker".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressState {
    options: ReportOptions,
    pub phase: Phase,
    pub validator: String,
    pub image: String,
    pub total: usize,
    pub completed: usize,
    /// Cleared by the first failed or errored check and never set again.
    pub all_passed: bool,
    pub ticks: usize,
}

impl ProgressState {
    pub fn new(options: ReportOptions) -> Self {
        Self {
            options,
            phase: Phase::LoadingConfig,
            validator: String::new(),
            image: String::new(),
            total: 0,
            completed: 0,
            all_passed: true,
            ticks: 0,
        }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Fraction of checks finished, in `0.0..=1.0`.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }

    /// Text next to the spinner, while there is something to wait for.
    pub fn status(&self) -> Option<&'static str> {
        match self.phase {
            Phase::LoadingConfig => Some("Loading config"),
            Phase::PullingImage => Some("Pulling image"),
            Phase::StartingContainer => Some("Starting container"),
            _ => None,
        }
    }

    pub fn help(&self) -> &'static str {
        match self.phase {
            Phase::KeptAlive => "Press Ctrl+C to remove the container and exit",
            Phase::Done => "",
            _ => "Press Ctrl+C to quit...",
        }
    }

    /// Update from `event` and return the lines to print permanently.
    pub fn apply(&mut self, event: &SessionEvent) -> Vec<OutputLine> {
        let mut lines = Vec::new();
        match event {
            SessionEvent::ConfigLoading => self.phase = Phase::LoadingConfig,
            SessionEvent::ConfigLoaded {
                name, checks, image, ..
            } => {
                self.validator = name.clone();
                self.image = image.clone();
                self.total = *checks;
            }
            SessionEvent::ConfigFailed(msg) | SessionEvent::ContainerStartFailed(msg) => {
                self.phase = Phase::Done;
                self.all_passed = false;
                lines.push(OutputLine::toned(format!("Error: {msg}"), Tone::Failed));
            }
            SessionEvent::ImagePulling { image } => {
                self.phase = Phase::PullingImage;
                lines.push(OutputLine::plain(format!("Cannot find {image}, pulling...")));
            }
            SessionEvent::ContainerStarting => {
                self.phase = Phase::StartingContainer;
                if !self.options.interactive {
                    lines.push(OutputLine::plain("Starting container"));
                }
            }
            SessionEvent::ContainerStarted { run_command, .. } => {
                self.phase = Phase::RunningChecks;
                if let (true, Some(cmd)) = (self.options.debug, run_command) {
                    lines.push(OutputLine::plain(format!(
                        "Running container with command '{cmd}'"
                    )));
                }
                lines.push(OutputLine(vec![
                    Segment::plain("Validating "),
                    Segment::new(self.image.clone(), Tone::Highlight),
                    Segment::plain(" against "),
                    Segment::new(self.validator.clone(), Tone::Highlight),
                ]));
            }
            SessionEvent::CheckCompleted {
                result,
                completed,
                total,
            } => {
                self.completed = *completed;
                self.total = *total;
                if !result.passed {
                    self.all_passed = false;
                }
                let label = if result.description.is_empty() {
                    &result.name
                } else {
                    &result.description
                };
                let tone = if result.passed {
                    Tone::Passed
                } else {
                    Tone::Failed
                };
                lines.push(OutputLine(vec![
                    Segment::plain(format!(" {label:<50} [")),
                    Segment::new(result.status_label(), tone),
                    Segment::plain("]"),
                ]));
            }
            SessionEvent::Aborted(msg) => {
                self.all_passed = false;
                lines.push(OutputLine::toned(
                    format!("Error: {msg}, remaining checks aborted"),
                    Tone::Failed,
                ));
            }
            SessionEvent::Interrupted => {
                self.all_passed = false;
                lines.push(OutputLine::toned("Interrupted", Tone::Failed));
                lines.push(OutputLine::toned("validation failed", Tone::Failed));
            }
            SessionEvent::ContainerKeptAlive { name, blocking } => {
                lines.push(OutputLine::plain("Leaving container running for debugging..."));
                let runtime = &self.options.runtime;
                lines.push(OutputLine(vec![
                    Segment::plain("Inspect it with "),
                    Segment::new(format!("{runtime} exec -it {name} sh"), Tone::Highlight),
                ]));
                if *blocking {
                    self.phase = Phase::KeptAlive;
                } else {
                    lines.push(OutputLine(vec![
                        Segment::plain("Remove it with "),
                        Segment::new(format!("{runtime} rm -f {name}"), Tone::Highlight),
                    ]));
                }
            }
            SessionEvent::ContainerRemoved => {}
            SessionEvent::Finished {
                passed,
                documentation,
            } => {
                self.phase = Phase::Done;
                lines.push(if *passed {
                    OutputLine::toned("validation passed", Tone::Passed)
                } else {
                    OutputLine::toned("validation failed", Tone::Failed)
                });
                if let Some(doc) = documentation {
                    lines.push(OutputLine(vec![
                        Segment::plain("See "),
                        Segment::new(doc.clone(), Tone::Highlight),
                        Segment::plain(" for the requirements"),
                    ]));
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_types::{CheckError, CheckResult};

    fn state(interactive: bool, debug: bool) -> ProgressState {
        ProgressState::new(ReportOptions {
            interactive,
            debug,
            ..ReportOptions::default()
        })
    }

    fn completed(result: CheckResult, completed: usize) -> SessionEvent {
        SessionEvent::CheckCompleted {
            result,
            completed,
            total: 2,
        }
    }

    #[test]
    fn all_passed_never_recovers() {
        let mut s = state(false, false);
        s.apply(&completed(CheckResult::new("a", "A", Ok(false)), 1));
        assert!(!s.all_passed);
        s.apply(&completed(CheckResult::new("b", "B", Ok(true)), 2));
        assert!(!s.all_passed);
        assert_eq!(s.ratio(), 1.0);
    }

    #[test]
    fn result_line_is_padded() {
        let mut s = state(false, false);
        let lines = s.apply(&completed(
            CheckResult::new("user", "User is jovyan", Ok(true)),
            1,
        ));
        assert_eq!(lines[0].text(), format!(" {:<50} [passed]", "User is jovyan"));
        assert_eq!(lines[0].0[1].tone, Tone::Passed);
    }

    #[test]
    fn errored_result_shows_message() {
        let mut s = state(false, false);
        let lines = s.apply(&completed(
            CheckResult::new("slow", "", Err(CheckError::Timeout(4))),
            1,
        ));
        assert!(lines[0]
            .text()
            .ends_with("[error - check timed out after 4 seconds]"));
        assert!(lines[0].text().starts_with(" slow "));
    }

    #[test]
    fn interactive_hides_starting_line() {
        let mut s = state(true, false);
        assert!(s.apply(&SessionEvent::ContainerStarting).is_empty());
        assert_eq!(s.status(), Some("Starting container"));

        let mut s = state(false, false);
        let lines = s.apply(&SessionEvent::ContainerStarting);
        assert_eq!(lines[0].text(), "Starting container");
    }

    #[test]
    fn run_command_only_in_debug() {
        let started = SessionEvent::ContainerStarted {
            name: "canary-runner-1".to_string(),
            run_command: Some("docker run -d busybox".to_string()),
        };

        let mut s = state(false, false);
        assert_eq!(s.apply(&started).len(), 1);

        let mut s = state(false, true);
        let lines = s.apply(&started);
        assert_eq!(
            lines[0].text(),
            "Running container with command 'docker run -d busybox'"
        );
    }

    #[test]
    fn validating_line_uses_loaded_names() {
        let mut s = state(false, false);
        s.apply(&SessionEvent::ConfigLoaded {
            name: "kubeflow".to_string(),
            description: String::new(),
            checks: 2,
            image: "jupyter:latest".to_string(),
        });
        let lines = s.apply(&SessionEvent::ContainerStarted {
            name: "c".to_string(),
            run_command: None,
        });
        assert_eq!(lines[0].text(), "Validating jupyter:latest against kubeflow");
        assert_eq!(s.phase, Phase::RunningChecks);
        assert_eq!(s.total, 2);
    }

    #[test]
    fn blocking_keep_alive_changes_help() {
        let mut s = state(true, true);
        let lines = s.apply(&SessionEvent::ContainerKeptAlive {
            name: "canary-runner-1".to_string(),
            blocking: true,
        });
        assert_eq!(lines[0].text(), "Leaving container running for debugging...");
        assert_eq!(s.phase, Phase::KeptAlive);
        assert!(s.help().contains("Ctrl+C"));
    }

    #[test]
    fn detached_keep_alive_prints_instructions() {
        let mut s = state(false, true);
        let text: Vec<String> = s
            .apply(&SessionEvent::ContainerKeptAlive {
                name: "canary-runner-1".to_string(),
                blocking: false,
            })
            .iter()
            .map(OutputLine::text)
            .collect();
        assert!(text.contains(&"Inspect it with docker exec -it canary-runner-1 sh".to_string()));
        assert!(text.contains(&"Remove it with docker rm -f canary-runner-1".to_string()));
    }

    #[test]
    fn finished_lines() {
        let mut s = state(false, false);
        let lines = s.apply(&SessionEvent::Finished {
            passed: false,
            documentation: Some("https://example.com".to_string()),
        });
        assert_eq!(lines[0].text(), "validation failed");
        assert_eq!(lines[1].text(), "See https://example.com for the requirements");
        assert_eq!(s.phase, Phase::Done);
        assert_eq!(s.help(), "");
    }
}

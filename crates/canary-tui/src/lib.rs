//! Progress reporting for validation sessions.
//!
//! [`HeadlessReporter`] writes plain lines for CI logs, [`InteractiveReporter`]
//! draws a spinner and progress bar in an inline terminal viewport. Both turn
//! session events into output through [`ProgressState`].

pub mod headless;
pub mod interactive;
pub mod state;
pub mod theme;

pub use headless::HeadlessReporter;
pub use interactive::{stdout_is_tty, InteractiveReporter};
pub use state::{OutputLine, Phase, ProgressState, ReportOptions, Segment, Tone};
pub use theme::{Theme, ThemeName};

//! Spinner and progress bar in an inline viewport below the printed results.

use std::io::{self, Stdout};

use anyhow::Result;
use canary_core::{Reporter, SessionEvent};
use crossterm::tty::IsTty;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
    Frame, Terminal, TerminalOptions, Viewport,
};
use tracing::warn;

use crate::state::{OutputLine, Phase, ProgressState, ReportOptions, Tone};
use crate::theme::Theme;

/// Height of the live area: status line plus help line.
const VIEWPORT_HEIGHT: u16 = 2;

pub struct InteractiveReporter<B: Backend + Send> {
    terminal: Terminal<B>,
    state: ProgressState,
    theme: Theme,
    finished: bool,
}

/// Whether stdout can host the interactive display.
pub fn stdout_is_tty() -> bool {
    io::stdout().is_tty()
}

impl InteractiveReporter<CrosstermBackend<Stdout>> {
    /// Draw on stdout, which must be a terminal.
    pub fn stdout(options: ReportOptions, theme: Theme) -> Result<Self> {
        if !stdout_is_tty() {
            anyhow::bail!("stdout is not a terminal");
        }
        let backend = CrosstermBackend::new(io::stdout());
        Self::with_backend(backend, Viewport::Inline(VIEWPORT_HEIGHT), options, theme)
    }
}

impl<B: Backend + Send> InteractiveReporter<B> {
    pub fn with_backend(
        backend: B,
        viewport: Viewport,
        mut options: ReportOptions,
        theme: Theme,
    ) -> Result<Self> {
        options.interactive = true;
        let terminal = Terminal::with_options(backend, TerminalOptions { viewport })?;
        let mut reporter = Self {
            terminal,
            state: ProgressState::new(options),
            theme,
            finished: false,
        };
        reporter.redraw()?;
        Ok(reporter)
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    fn print(&mut self, line: &OutputLine) -> Result<()> {
        let width = self.terminal.size()?.width.max(1) as usize;
        let len = line.text().chars().count().max(1);
        let height = len.div_ceil(width) as u16;

        let rendered = Line::from(
            line.0
                .iter()
                .map(|s| Span::styled(s.text.clone(), self.theme.style(s.tone)))
                .collect::<Vec<_>>(),
        );
        self.terminal.insert_before(height, |buf: &mut Buffer| {
            Paragraph::new(rendered)
                .wrap(Wrap { trim: false })
                .render(buf.area, buf);
        })?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let state = &self.state;
        let theme = &self.theme;
        self.terminal.draw(|f| draw(f, state, theme))?;
        Ok(())
    }

    fn handle_inner(&mut self, event: &SessionEvent) -> Result<()> {
        for line in self.state.apply(event) {
            self.print(&line)?;
        }
        self.redraw()
    }
}

fn draw(f: &mut Frame, state: &ProgressState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(f.area());

    draw_status(f, chunks[0], state, theme);
    f.render_widget(
        Paragraph::new(Span::styled(state.help(), theme.style(Tone::Help))),
        chunks[1],
    );
}

fn draw_status(f: &mut Frame, area: Rect, state: &ProgressState, theme: &Theme) {
    if let Some(status) = state.status() {
        let text = format!("{} {}", theme.spinner_frame(state.ticks), status);
        f.render_widget(Paragraph::new(text), area);
    } else if state.phase == Phase::RunningChecks {
        let gauge = Gauge::default()
            .gauge_style(theme.progress(state.all_passed))
            .ratio(state.ratio())
            .label(format!("{}/{}", state.completed, state.total));
        f.render_widget(gauge, area);
    }
}

impl<B: Backend + Send> Reporter for InteractiveReporter<B> {
    fn handle(&mut self, event: &SessionEvent) {
        if let Err(e) = self.handle_inner(event) {
            warn!(error = %e, "Failed to draw progress");
        }
    }

    fn tick(&mut self) {
        self.state.tick();
        if let Err(e) = self.redraw() {
            warn!(error = %e, "Failed to draw progress");
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.state.phase = Phase::Done;
        let _ = self.redraw();
        let _ = self.terminal.show_cursor();
    }
}

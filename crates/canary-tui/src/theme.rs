//! Colors and glyphs for the interactive reporter.

use ratatui::style::{Color, Modifier, Style};

use crate::state::Tone;

/// Available theme presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Ansi,
    /// No colors, ASCII spinner.
    Plain,
}

impl ThemeName {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ansi" | "default" => Some(ThemeName::Ansi),
            "plain" | "none" => Some(ThemeName::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub passed: Color,
    pub failed: Color,
    pub highlight: Color,
    pub help: Color,
    pub spinner: [&'static str; 10],
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_name(ThemeName::default())
    }
}

impl Theme {
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Ansi => Self {
                name,
                passed: Color::LightGreen,
                failed: Color::LightRed,
                highlight: Color::Cyan,
                help: Color::DarkGray,
                spinner: ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
            },
            ThemeName::Plain => Self {
                name,
                passed: Color::Reset,
                failed: Color::Reset,
                highlight: Color::Reset,
                help: Color::Reset,
                spinner: ["|", "/", "-", "\\", "|", "/", "-", "\\", "|", "/"],
            },
        }
    }

    pub fn style(&self, tone: Tone) -> Style {
        match tone {
            Tone::Plain => Style::default(),
            Tone::Passed => Style::default().fg(self.passed),
            Tone::Failed => Style::default().fg(self.failed),
            Tone::Highlight => Style::default()
                .fg(self.highlight)
                .add_modifier(Modifier::BOLD),
            Tone::Help => Style::default().fg(self.help),
        }
    }

    /// Bar color while checks run: green until the first failure.
    pub fn progress(&self, all_passed: bool) -> Style {
        Style::default().fg(if all_passed { self.passed } else { self.failed })
    }

    pub fn spinner_frame(&self, tick: usize) -> &'static str {
        self.spinner[tick % self.spinner.len()]
    }
}

//! Single-line search prompt drawn in the status line.
//!
//! Holds the query text only. Filtering is done by the step list, which the
//! controller re-runs after every edit.

use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Span,
    Frame,
};

use crate::text_input::TextInput;
use crate::theme::Theme;

const QUERY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct SearchBar {
    input: TextInput,
}

impl Default for SearchBar {
    fn default() -> Self {
        Self {
            input: TextInput::single_line().with_char_limit(QUERY_LIMIT),
        }
    }
}

impl SearchBar {
    /// Clears any previous query.
    pub fn open(&mut self) {
        self.input.clear();
    }

    pub fn close(&mut self) {
        self.input.clear();
    }

    pub fn query(&self) -> String {
        self.input.value()
    }

    /// Returns `true` when the query text changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.input.handle_key(key)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [prompt, input] =
            area.layout(&Layout::horizontal([Constraint::Length(1), Constraint::Fill(1)]));
        frame.render_widget(Span::styled("/", Style::default().fg(theme.status_key)), prompt);
        self.input.render(
            frame,
            input,
            Style::default().fg(theme.normal_step),
            Style::default().fg(theme.status_fg),
            true,
        );
    }
}

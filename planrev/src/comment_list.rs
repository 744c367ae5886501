//! Per-step comment browser shown in the detail pane.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use planrev_core::types::ReviewComment;

use crate::theme::Theme;
use crate::ui::truncate_to_width;

/// Cursor over a snapshot of one step's comments.
#[derive(Debug, Clone, Default)]
pub struct CommentList {
    step_id: String,
    comments: Vec<ReviewComment>,
    cursor: usize,
}

impl CommentList {
    /// Shows `comments` for `step_id`.
    ///
    /// The previous cursor is kept when it still points at a comment and
    /// clamped into range otherwise.
    pub fn open(&mut self, step_id: &str, comments: &[ReviewComment]) {
        self.step_id = step_id.to_owned();
        self.comments = comments.to_vec();
        if self.cursor >= self.comments.len() {
            self.cursor = self.comments.len().saturating_sub(1);
        }
    }

    pub fn close(&mut self) {
        self.comments.clear();
        self.cursor = 0;
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.comments.len() {
            self.cursor += 1;
        }
    }

    /// One header line per comment (`> #n [action]`) plus the first line of
    /// its body, separated by blank lines.
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let width = area.width as usize;
        let mut lines = vec![
            Line::from(Span::styled(
                format!("Comments on {}", self.step_id),
                Style::new().fg(theme.title).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];

        for (i, comment) in self.comments.iter().enumerate() {
            let selected = i == self.cursor;
            let (prefix, style) = if selected {
                let bold = Style::new().add_modifier(Modifier::BOLD);
                ("> ", bold.fg(theme.selected_step))
            } else {
                ("  ", Style::default().fg(theme.normal_step))
            };
            lines.push(Line::from(Span::styled(
                format!("{prefix}#{} [{}]", i + 1, comment.action),
                style,
            )));

            let first = comment.body.lines().next().unwrap_or_default();
            if !first.is_empty() {
                let preview = if first.width() > width.saturating_sub(6) {
                    truncate_to_width(first, width.saturating_sub(6))
                } else {
                    first.to_owned()
                };
                lines.push(Line::from(Span::styled(
                    format!("    {preview}"),
                    Style::default().fg(theme.normal_step),
                )));
            }
            lines.push(Line::default());
        }

        frame.render_widget(Paragraph::new(lines), area);
    }
}

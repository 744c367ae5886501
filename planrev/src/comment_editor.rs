//! Comment editor widget.
//!
//! Edits one review comment for one step: a multi-line body plus an action
//! label cycled with Tab / Shift-Tab. The editor only produces a
//! [`ReviewComment`]; saving it into the step list is the controller's job.

use crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType},
    Frame,
};

use planrev_core::types::{ActionType, ReviewComment};

use crate::text_input::TextInput;
use crate::theme::Theme;

/// Rows the editor occupies, borders included.
pub const EDITOR_HEIGHT: u16 = 7;

#[derive(Debug, Clone)]
pub struct CommentEditor {
    input: TextInput,
    step_id: String,
    label_index: usize,
}

impl Default for CommentEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentEditor {
    pub fn new() -> Self {
        Self {
            input: TextInput::multiline()
                .with_placeholder("Enter review comment... (Ctrl+S to save, Esc to cancel)"),
            step_id: String::new(),
            label_index: 0,
        }
    }

    /// Binds the editor to `step_id`, pre-filled from `existing` when editing.
    ///
    /// Without an existing comment the body is empty and the label is the
    /// default action.
    pub fn open(&mut self, step_id: &str, existing: Option<&ReviewComment>) {
        self.step_id = step_id.to_owned();
        match existing {
            Some(comment) => {
                self.label_index = comment.action.index();
                self.input.set_value(&comment.body);
            }
            None => {
                self.label_index = ActionType::default().index();
                self.input.clear();
            }
        }
    }

    /// Drops the in-progress text.
    pub fn close(&mut self) {
        self.input.clear();
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn label(&self) -> ActionType {
        ActionType::ALL[self.label_index]
    }

    pub fn cycle_label(&mut self) {
        self.label_index = (self.label_index + 1) % ActionType::ALL.len();
    }

    pub fn cycle_label_reverse(&mut self) {
        let n = ActionType::ALL.len();
        self.label_index = (self.label_index + n - 1) % n;
    }

    /// The comment as it would be saved, or `None` when the trimmed body is
    /// empty.
    pub fn result(&self) -> Option<ReviewComment> {
        let value = self.input.value();
        let body = value.trim();
        if body.is_empty() {
            return None;
        }
        Some(ReviewComment::new(&self.step_id, self.label(), body))
    }

    /// Forwards a key to the text buffer.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.input.handle_key(key)
    }

    /// Draws the editor box with the active label in its title.
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let title = Line::from(vec![
            Span::raw(format!(" Comment on {} ", self.step_id)),
            Span::styled(
                format!("[{}]", self.label()),
                Style::default()
                    .fg(theme.comment_badge)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]);
        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.comment_border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.input.render(
            frame,
            inner,
            Style::default().fg(theme.normal_step),
            Style::default().fg(theme.status_fg),
            true,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn type_str(editor: &mut CommentEditor, s: &str) {
        for c in s.chars() {
            editor.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    #[test]
    fn new_comment_starts_empty_with_default_label() {
        let mut editor = CommentEditor::new();
        editor.cycle_label();
        editor.open("S1", None);
        assert_eq!(editor.label(), ActionType::Suggestion);
        assert_eq!(editor.step_id(), "S1");
        assert_eq!(editor.result(), None);
    }

    #[test]
    fn editing_prefills_body_and_label() {
        let existing = ReviewComment::new("S2", ActionType::Question, "why?");
        let mut editor = CommentEditor::new();
        editor.open("S2", Some(&existing));
        assert_eq!(editor.label(), ActionType::Question);
        type_str(&mut editor, " really");
        assert_eq!(
            editor.result(),
            Some(ReviewComment::new("S2", ActionType::Question, "why? really"))
        );
    }

    #[test]
    fn whitespace_only_body_is_discarded() {
        let mut editor = CommentEditor::new();
        editor.open("S1", None);
        type_str(&mut editor, "   ");
        editor.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(editor.result(), None);
    }

    #[test]
    fn result_is_trimmed() {
        let mut editor = CommentEditor::new();
        editor.open("S1", None);
        type_str(&mut editor, "  fix this  ");
        let comment = editor.result().expect("comment");
        assert_eq!(comment.body, "fix this");
        assert_eq!(comment.action, ActionType::Suggestion);
    }

    #[test]
    fn label_cycling_wraps_both_ways() {
        let mut editor = CommentEditor::new();
        editor.open("S1", None);
        editor.cycle_label_reverse();
        assert_eq!(editor.label(), ActionType::Chore);
        editor.cycle_label();
        assert_eq!(editor.label(), ActionType::Suggestion);

        let start = editor.label();
        for _ in 0..ActionType::ALL.len() {
            editor.cycle_label();
        }
        for _ in 0..ActionType::ALL.len() {
            editor.cycle_label_reverse();
        }
        assert_eq!(editor.label(), start);
    }
}

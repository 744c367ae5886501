//! Quit confirmation dialog.

use ratatui::{
    layout::Constraint,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Padding, Paragraph},
    Frame,
};

use crate::theme::Theme;

const DIALOG_WIDTH: u16 = 44;
const DIALOG_HEIGHT: u16 = 9;

/// Draws a centred dialog asking whether to discard the review comments.
pub fn render_confirm(frame: &mut Frame, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Length(DIALOG_WIDTH), Constraint::Length(DIALOG_HEIGHT));
    frame.render_widget(Clear, area);

    let key = Style::default().fg(theme.status_key);
    let text = vec![
        Line::raw("You have review comments."),
        Line::default(),
        Line::raw("Quit without submitting?"),
        Line::default(),
        Line::from(vec![
            Span::styled("y", key),
            Span::raw(" yes   "),
            Span::styled("n", key),
            Span::raw(" no   "),
            Span::styled("esc", key),
            Span::raw(" cancel"),
        ]),
    ];

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.dialog_border))
        .padding(Padding::new(2, 2, 1, 0));
    frame.render_widget(Paragraph::new(text).block(block), area);
}

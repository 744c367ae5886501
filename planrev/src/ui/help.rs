//! Help overlay renderer for planrev.
//!
//! Provides `render_help_overlay()` which draws a centred modal box over the
//! pane layout using ratatui's `Clear` widget to erase the background first.
//! The overlay is rendered inside the same `terminal.draw()` closure as
//! everything else.

use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Clear, Paragraph},
    Frame,
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal, scrolled by `scroll` rows.
///
/// Skipped on terminals narrower than 40 columns, where the box would have no
/// room for its content.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, scroll: u16) {
    if frame.area().width < 40 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to close) ")
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.dialog_border));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .scroll((scroll, 0)),
        overlay_area,
    );
}

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, Up/Down", "Move cursor (tree) or scroll (detail)"),
            ("gg", "Go to top"),
            ("G", "Go to bottom"),
            ("Enter, Space", "Toggle expand/collapse"),
            ("l/h, Right/Left", "Expand/collapse (tree) or scroll sideways (detail)"),
            ("H/L", "Scroll detail to start/end of line"),
            ("Ctrl-d/Ctrl-u", "Scroll detail half a page"),
            ("f", "Toggle full/section view"),
            (">/<", "Resize left pane"),
            ("Tab", "Switch between tree and detail"),
        ],
    ),
    (
        "Review",
        &[
            ("c", "Add comment on selected step"),
            ("C", "Manage comments (edit/delete)"),
            ("v", "Toggle viewed mark"),
            ("/", "Search steps"),
            ("s", "Submit review"),
        ],
    ),
    (
        "Comment Editor",
        &[
            ("Tab", "Cycle label (forward)"),
            ("Shift-Tab", "Cycle label (reverse)"),
            ("Ctrl-s", "Save comment"),
            ("Esc", "Cancel editing"),
        ],
    ),
    (
        "Other",
        &[
            ("?", "Toggle this help"),
            ("q, Ctrl-c", "Quit"),
        ],
    ),
];

fn build_help_text(theme: &Theme) -> Text<'static> {
    let heading = Style::new().fg(theme.title).add_modifier(Modifier::BOLD);
    let key = Style::default().fg(theme.status_key);
    let body = Style::default().fg(theme.help_fg);

    let mut lines = Vec::new();
    for (i, (section, entries)) in SECTIONS.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(*section, heading)));
        for (keys, description) in *entries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<18}"), key),
                Span::styled(*description, body),
            ]));
        }
    }
    Text::from(lines)
}

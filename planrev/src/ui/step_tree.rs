//! Step tree panel renderer for planrev.
//!
//! Renders the visible rows of the step list into the left pane. Each row shows
//! an expansion marker, the step ID and title, and badges for comment count
//! and viewed state. The cursor row is marked with `> `.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use planrev_core::step_list::{StepList, StepListItem};

use crate::app::{App, Focus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;
use crate::ui::truncate_to_width;

/// Renders the tree pane and keeps `app.tree_state` selection on the cursor so
/// the list scrolls with it.
pub fn render_step_tree(frame: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    let is_focused = app.focus == Focus::Tree;
    let title = if app.step_list.query().is_empty() {
        "Steps".to_owned()
    } else {
        format!("Steps /{}", app.step_list.query())
    };
    let block = panel_block(&title, is_focused, theme);
    let width = block.inner(area).width as usize;

    let cursor = app.step_list.cursor();
    let items: Vec<ListItem> = app
        .step_list
        .visible_items()
        .map(|(row, item)| {
            ListItem::new(tree_row(&app.step_list, row, item, width, row == cursor, theme))
        })
        .collect();

    let selected = app.step_list.cursor_visible_position();
    app.tree_state.select(selected);
    frame.render_stateful_widget(List::new(items).block(block), area, &mut app.tree_state);
}

/// Builds one tree row: `> {indent}{marker} {id} {title} [*N] [✓]`.
///
/// The step text is truncated so the badges always fit in `width` cells.
pub fn tree_row(
    list: &StepList,
    row: usize,
    item: &StepListItem,
    width: usize,
    selected: bool,
    theme: &Theme,
) -> Line<'static> {
    let (prefix, text_style) = if selected {
        (
            "> ",
            Style::default()
                .fg(theme.selected_step)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("  ", Style::default().fg(theme.normal_step))
    };

    let Some(idx) = item.step else {
        let text = truncate_to_width("Overview", width.saturating_sub(2));
        return Line::from(vec![
            Span::styled(prefix, text_style),
            Span::styled(text, text_style),
        ]);
    };

    let step = list.plan().step(idx);
    let marker = match (step.children.is_empty(), list.is_open(row)) {
        (true, _) => " ",
        (false, true) => "▼",
        (false, false) => "▶",
    };
    let text = format!("{}{marker} {} {}", "  ".repeat(item.depth), step.id, step.title);

    let mut badges = Vec::new();
    match list.comments(&step.id).len() {
        0 => {}
        1 => badges.push(Span::styled(" [*]", Style::default().fg(theme.comment_badge))),
        n => badges.push(Span::styled(
            format!(" [*{n}]"),
            Style::default().fg(theme.comment_badge),
        )),
    }
    if list.is_viewed(&step.id) {
        badges.push(Span::styled(" [✓]", Style::default().fg(theme.viewed_badge)));
    }
    let badge_width: usize = badges.iter().map(|s| s.content.width()).sum();

    let mut spans = vec![
        Span::styled(prefix, text_style),
        Span::styled(
            truncate_to_width(&text, width.saturating_sub(2 + badge_width)),
            text_style,
        ),
    ];
    spans.extend(badges);
    Line::from(spans)
}

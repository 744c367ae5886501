//! UI rendering module for planrev.
//!
//! This is the module root for `ui/`. It exposes `render()` as the single entry
//! point called by the event loop's `terminal.draw()` closure.
//!
//! Layout arithmetic and the title/status lines live in `layout.rs`, the step
//! tree in `step_tree.rs`, and the modal overlays in `help.rs` and
//! `confirm.rs`. The detail pane draws itself from its pre-rendered lines.

pub mod confirm;
pub mod help;
pub mod keybindings;
pub mod layout;
pub mod step_tree;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Focus, Mode};
use crate::comment_editor::EDITOR_HEIGHT;
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, panel_block, render_status_bar, render_title_bar};

/// Renders one complete frame from `app`.
///
/// The detail pane's size is written back into `app` before drawing; when its
/// width changed the content is re-rendered so prose wraps to the new width.
/// Pane rectangles are cached for mouse hit-testing.
pub fn render(frame: &mut Frame, app: &mut App, theme: &Theme) {
    let area = frame.area();
    app.resize(area.width, area.height);
    let layout = compute_layout(area, app);

    app.tree_rect = layout.tree.unwrap_or_default();
    app.detail_rect = layout.detail.unwrap_or_default();

    if let Some(title) = layout.title {
        render_title_bar(frame, title, app, theme);
    }

    if let Some(tree) = layout.tree {
        step_tree::render_step_tree(frame, tree, app, theme);
    }

    if let Some(detail) = layout.detail {
        render_detail(frame, detail, app, theme);
    }

    render_status_bar(frame, layout.status, app, theme);

    // Overlays are drawn last so they sit on top.
    match app.mode {
        Mode::Help { scroll } => help::render_help_overlay(frame, theme, scroll),
        Mode::Confirm => confirm::render_confirm(frame, theme),
        _ => {}
    }
}

/// Renders the right pane: detail content, with the comment editor docked at
/// the bottom in comment mode, or the comment list in comment-list mode.
fn render_detail(frame: &mut Frame, area: Rect, app: &mut App, theme: &Theme) {
    let focused = app.focus == Focus::Detail
        || matches!(app.mode, Mode::Comment { .. } | Mode::CommentList);
    frame.render_widget(panel_block("Detail", focused, theme), area);
    let inner = inner_rect(area);

    match app.mode {
        Mode::CommentList => app.comment_list.render(frame, inner, theme),
        Mode::Comment { .. } => {
            let [content, editor] = inner.layout(&Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(EDITOR_HEIGHT),
            ]));
            draw_detail_content(frame, content, app);
            app.editor.render(frame, editor, theme);
        }
        _ => draw_detail_content(frame, inner, app),
    }
}

fn draw_detail_content(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.detail.set_size(area.width, area.height) {
        app.refresh_detail();
    }
    app.detail.render(frame, area);
}

/// Truncates `s` to at most `max` display cells, ending with `...` when cut.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    use unicode_width::UnicodeWidthStr;
    if s.width() <= max {
        return s.to_owned();
    }
    let (budget, tail) = if max <= 3 { (max, "") } else { (max - 3, "...") };
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(tail);
    out
}

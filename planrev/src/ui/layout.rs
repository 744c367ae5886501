//! Responsive two-pane layout engine for planrev.
//!
//! This module is pure layout arithmetic plus the one-row title and status
//! lines. It is called inside `terminal.draw()` on every render so every frame
//! gets a fresh layout that reflects the current terminal size.
//!
//! # Pane geometry
//!
//! At `>= 80` columns the tree and detail panes sit side by side, the tree
//! taking `App.left_pct` percent. Below 80 columns only one pane is shown,
//! picked by focus (the detail pane is forced while a comment is being edited
//! or browsed).
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes the two pane borders share a single column.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus, Mode};
use crate::theme::Theme;

/// Screen regions for one frame. Panes that are not shown are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub title: Option<Rect>,
    pub tree: Option<Rect>,
    pub detail: Option<Rect>,
    pub status: Rect,
}

/// `"{title} ({path})"`, with either part omitted when empty.
pub fn title_text(app: &App) -> String {
    let mut parts = Vec::new();
    if !app.plan().title.is_empty() {
        parts.push(app.plan().title.clone());
    }
    if !app.file_path.is_empty() {
        parts.push(format!("({})", app.file_path));
    }
    parts.join(" ")
}

/// Splits `area` into title line, panes, and status line.
pub fn compute_layout(area: Rect, app: &App) -> AppLayout {
    let title_height = if title_text(app).is_empty() { 0 } else { 1 };
    let [title, main, status] = area.layout(&Layout::vertical([
        Constraint::Length(title_height),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));
    let title = (title_height > 0).then_some(title);

    if area.width < crate::app::MIN_SPLIT_WIDTH {
        let show_detail = app.focus == Focus::Detail
            || matches!(app.mode, Mode::Comment { .. } | Mode::CommentList);
        return if show_detail {
            AppLayout {
                title,
                tree: None,
                detail: Some(main),
                status,
            }
        } else {
            AppLayout {
                title,
                tree: Some(main),
                detail: None,
                status,
            }
        };
    }

    let [tree, detail] = main.layout(
        &Layout::horizontal([Constraint::Percentage(app.left_pct), Constraint::Fill(1)])
            .spacing(Spacing::Overlap(1)),
    );
    AppLayout {
        title,
        tree: Some(tree),
        detail: Some(detail),
        status,
    }
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

/// Builds a bordered `Block` for a pane.
///
/// Focused panes get a thick border in the active color. `MergeStrategy::Fuzzy`
/// is required because `Exact` produces broken junctions when `Thick` and
/// `Plain` borders meet.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

pub fn render_title_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let text = crate::ui::truncate_to_width(&title_text(app), area.width as usize);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::new().fg(theme.title).add_modifier(Modifier::BOLD),
        ))),
        area,
    );
}

fn hint(
    spans: &mut Vec<Span<'static>>,
    key: &'static str,
    label: impl Into<String>,
    theme: &Theme,
) {
    if !spans.is_empty() {
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(key, Style::default().fg(theme.status_key)));
    spans.push(Span::styled(
        format!(" {}", label.into()),
        Style::default().fg(theme.status_fg),
    ));
}

/// `[viewed/total viewed]` plus `[N comments]` when any exist.
pub fn progress_text(app: &App) -> String {
    let mut progress = format!(
        "[{}/{} viewed]",
        app.step_list.viewed_count(),
        app.plan().len()
    );
    let comments = app.step_list.comment_count();
    if comments > 0 {
        progress.push_str(&format!(" [{comments} comments]"));
    }
    progress
}

/// Renders the 1-row status line: key hints for the current mode, the
/// search prompt in search mode, and review progress on the right.
pub fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    if app.mode == Mode::Search {
        app.search.render(frame, area, theme);
        return;
    }

    let mut spans = Vec::new();
    match app.mode {
        Mode::Comment { .. } => {
            hint(&mut spans, "tab/S-tab", "label:", theme);
            spans.push(Span::styled(
                format!(" {}", app.editor.label()),
                Style::new().fg(theme.title).add_modifier(Modifier::BOLD),
            ));
            hint(&mut spans, "ctrl+s", "save", theme);
            hint(&mut spans, "esc", "cancel", theme);
        }
        Mode::CommentList => {
            hint(&mut spans, "j/k", "navigate", theme);
            hint(&mut spans, "e", "edit", theme);
            hint(&mut spans, "d", "delete", theme);
            hint(&mut spans, "esc", "back", theme);
        }
        _ => {
            hint(&mut spans, "enter", "toggle", theme);
            hint(&mut spans, "f", if app.full_view { "section" } else { "full" }, theme);
            hint(&mut spans, "c", "comment", theme);
            hint(&mut spans, "C", "comments", theme);
            hint(&mut spans, "v", "viewed", theme);
            hint(&mut spans, "/", "search", theme);
            hint(&mut spans, "s", "submit", theme);
            hint(&mut spans, "tab", "switch", theme);
            hint(&mut spans, "?", "help", theme);
            hint(&mut spans, "q", "quit", theme);
        }
    }

    let progress = progress_text(app);
    let progress_width = u16::try_from(progress.width() + 1).unwrap_or(u16::MAX);
    let [hints, right] = area.layout(&Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(progress_width),
    ]));

    frame.render_widget(Paragraph::new(Line::from(spans)), hints);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            progress,
            Style::default().fg(theme.status_fg),
        )))
        .right_aligned(),
        right,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::AppOptions;
    use planrev_core::parser::parse;

    fn app(source: &str, path: &str) -> App {
        App::new(
            Arc::new(parse(source)),
            &Theme::dark(),
            AppOptions {
                file_path: path.to_owned(),
                ..AppOptions::default()
            },
        )
    }

    #[test]
    fn title_line_is_optional() {
        let untitled = app("## A\n", "");
        let layout = compute_layout(Rect::new(0, 0, 100, 30), &untitled);
        assert_eq!(layout.title, None);
        assert_eq!(layout.status, Rect::new(0, 29, 100, 1));

        let titled = app("# T\n\n## A\n", "p.md");
        assert_eq!(title_text(&titled), "T (p.md)");
        let layout = compute_layout(Rect::new(0, 0, 100, 30), &titled);
        assert_eq!(layout.title, Some(Rect::new(0, 0, 100, 1)));
    }

    #[test]
    fn split_follows_left_ratio() {
        let mut a = app("## A\n", "");
        a.left_pct = 20;
        let layout = compute_layout(Rect::new(0, 0, 100, 30), &a);
        let tree = layout.tree.expect("tree");
        let detail = layout.detail.expect("detail");
        assert!((19..=21).contains(&tree.width), "{tree:?}");
        // Borders overlap by one column.
        assert_eq!(detail.x, tree.right() - 1);
        assert_eq!(detail.right(), 100);
    }

    #[test]
    fn narrow_layout_picks_pane_by_focus_and_mode() {
        let mut a = app("## A\n", "");
        let area = Rect::new(0, 0, 70, 30);
        assert!(compute_layout(area, &a).detail.is_none());

        a.focus = Focus::Detail;
        assert!(compute_layout(area, &a).tree.is_none());

        a.focus = Focus::Tree;
        a.mode = Mode::CommentList;
        assert!(compute_layout(area, &a).tree.is_none());
    }
}

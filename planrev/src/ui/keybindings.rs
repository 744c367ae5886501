//! Keybinding dispatcher for planrev.
//!
//! Translates raw crossterm `KeyEvent`s into `App` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. The
//! dispatcher branches first on `app.mode` so that every mode has an isolated
//! handler function.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{App, ChordState, Focus, Mode, RESIZE_STEP};

/// Columns moved by one horizontal scroll key in the detail pane.
const HORIZONTAL_STEP: usize = 4;
/// Lines moved by one mouse wheel notch.
const WHEEL_STEP: usize = 3;

/// Control-flow signal returned from the key dispatcher.
///
/// The event loop checks this after every keypress: `Quit` tears down the
/// terminal and exits; `Continue` redraws and waits for the next event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    /// End the session. The outcome is whatever `App::result` holds.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, app: &mut App) -> KeyAction {
    match app.mode {
        Mode::Normal => handle_normal(key, app),
        Mode::Comment { .. } => handle_comment(key, app),
        Mode::CommentList => handle_comment_list(key, app),
        Mode::Confirm => handle_confirm(key, app),
        Mode::Help { scroll } => handle_help(key, app, scroll),
        Mode::Search => handle_search(key, app),
    }
}

fn ctrl(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

/// Handles a key event while in Normal mode.
///
/// A pending `g` is always disarmed here: the second `g` completes the
/// "go to top" chord, any other key is processed as if the first `g` had
/// never been pressed.
fn handle_normal(key: KeyEvent, app: &mut App) -> KeyAction {
    let armed = app.chord == ChordState::Armed;
    app.chord = ChordState::Idle;

    if key.code == KeyCode::Char('g') && !ctrl(&key) {
        if armed {
            go_top(app);
        } else {
            app.chord = ChordState::Armed;
        }
        return KeyAction::Continue;
    }

    if ctrl(&key) {
        return handle_normal_ctrl(key, app);
    }

    match key.code {
        KeyCode::Char('q') => {
            if app.request_quit() {
                return KeyAction::Quit;
            }
        }
        KeyCode::Char('s') => {
            app.submit();
            return KeyAction::Quit;
        }
        KeyCode::Char('?') => app.mode = Mode::Help { scroll: 0 },
        KeyCode::Tab => app.focus = app.focus.toggle(),
        KeyCode::Char('>') => app.resize_left_pane(RESIZE_STEP),
        KeyCode::Char('<') => app.resize_left_pane(-RESIZE_STEP),
        KeyCode::Char('f') => app.toggle_full_view(),
        KeyCode::Char('G') => go_bottom(app),
        KeyCode::Char('H') => app.detail.scroll_to_start(),
        KeyCode::Char('L') => app.detail.scroll_to_end(),
        _ => match app.focus {
            Focus::Tree => handle_tree_key(key, app),
            Focus::Detail => handle_detail_key(key, app),
        },
    }
    KeyAction::Continue
}

fn handle_normal_ctrl(key: KeyEvent, app: &mut App) -> KeyAction {
    match key.code {
        KeyCode::Char('c') => {
            if app.request_quit() {
                return KeyAction::Quit;
            }
        }
        KeyCode::Char('d') => {
            app.detail.half_page_down();
            app.sync_cursor_to_scroll();
        }
        KeyCode::Char('u') => {
            app.detail.half_page_up();
            app.sync_cursor_to_scroll();
        }
        _ => {}
    }
    KeyAction::Continue
}

fn go_top(app: &mut App) {
    match app.focus {
        Focus::Tree => {
            app.step_list.cursor_top();
            app.after_cursor_move();
        }
        Focus::Detail => {
            app.detail.goto_top();
            app.sync_cursor_to_scroll();
        }
    }
}

fn go_bottom(app: &mut App) {
    match app.focus {
        Focus::Tree => {
            app.step_list.cursor_bottom();
            app.after_cursor_move();
        }
        Focus::Detail => {
            app.detail.goto_bottom();
            app.sync_cursor_to_scroll();
        }
    }
}

/// Tree-focused keys: cursor movement, expansion, and per-step review actions.
fn handle_tree_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.step_list.cursor_down();
            app.after_cursor_move();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.step_list.cursor_up();
            app.after_cursor_move();
        }
        KeyCode::Enter | KeyCode::Char(' ') => app.step_list.toggle_expand(),
        KeyCode::Char('l') | KeyCode::Right => app.step_list.expand(),
        KeyCode::Char('h') | KeyCode::Left => {
            app.step_list.collapse();
            app.after_cursor_move();
        }
        KeyCode::Char('c') => app.open_comment_editor(),
        KeyCode::Char('C') => app.open_comment_list(),
        KeyCode::Char('v') => app.toggle_viewed_selected(),
        KeyCode::Char('/') => app.open_search(),
        _ => {}
    }
}

/// Detail-focused keys: vertical and horizontal scrolling.
fn handle_detail_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.detail.scroll_down(1);
            app.sync_cursor_to_scroll();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.detail.scroll_up(1);
            app.sync_cursor_to_scroll();
        }
        KeyCode::Char('l') | KeyCode::Right => app.detail.scroll_right(HORIZONTAL_STEP),
        KeyCode::Char('h') | KeyCode::Left => app.detail.scroll_left(HORIZONTAL_STEP),
        KeyCode::Enter | KeyCode::Char(' ') => app.step_list.toggle_expand(),
        KeyCode::Char('c') => app.open_comment_editor(),
        KeyCode::Char('C') => app.open_comment_list(),
        KeyCode::Char('v') => app.toggle_viewed_selected(),
        KeyCode::Char('/') => app.open_search(),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Comment mode
// ---------------------------------------------------------------------------

fn handle_comment(key: KeyEvent, app: &mut App) -> KeyAction {
    match key.code {
        KeyCode::Char('s') if ctrl(&key) => app.save_comment(),
        KeyCode::Esc => app.return_from_comment(),
        KeyCode::Tab => app.editor.cycle_label(),
        KeyCode::BackTab => app.editor.cycle_label_reverse(),
        _ => {
            app.editor.handle_key(key);
        }
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// CommentList mode
// ---------------------------------------------------------------------------

fn handle_comment_list(key: KeyEvent, app: &mut App) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.comment_list.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.comment_list.cursor_up(),
        KeyCode::Char('e') | KeyCode::Enter => app.edit_selected_comment(),
        KeyCode::Char('d') => app.delete_selected_comment(),
        KeyCode::Esc => app.close_comment_list(),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Confirm mode
// ---------------------------------------------------------------------------

/// `y` / `Y` / `Ctrl-c` discard the comments and quit; `n` / `N` / `Esc` go
/// back to Normal mode.
fn handle_confirm(key: KeyEvent, app: &mut App) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if ctrl(&key) => {
            app.cancel();
            KeyAction::Quit
        }
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.cancel();
            KeyAction::Quit
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// Help mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, app: &mut App, scroll: u16) -> KeyAction {
    let scroll = match key.code {
        KeyCode::Char('j') | KeyCode::Down => scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => scroll.saturating_sub(1),
        KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => {
            app.mode = Mode::Normal;
            return KeyAction::Continue;
        }
        _ => scroll,
    };
    app.mode = Mode::Help { scroll };
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

fn handle_search(key: KeyEvent, app: &mut App) -> KeyAction {
    match key.code {
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Down => search_move(app, true),
        KeyCode::Up => search_move(app, false),
        KeyCode::Char('n') if ctrl(&key) => search_move(app, true),
        KeyCode::Char('p') if ctrl(&key) => search_move(app, false),
        _ => {
            if app.search.handle_key(key) {
                app.update_search();
            }
        }
    }
    KeyAction::Continue
}

fn search_move(app: &mut App, down: bool) {
    if down {
        app.step_list.cursor_down();
    } else {
        app.step_list.cursor_up();
    }
    app.after_cursor_move();
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// Left click on a pane focuses it. The wheel scrolls the focused pane by
/// three lines, or the help overlay while it is open. Mouse input is ignored
/// while a comment is being edited or a dialog is up.
pub fn handle_mouse(mouse: MouseEvent, app: &mut App) -> KeyAction {
    match app.mode {
        Mode::Help { scroll } => {
            let scroll = match mouse.kind {
                MouseEventKind::ScrollDown => scroll.saturating_add(WHEEL_STEP as u16),
                MouseEventKind::ScrollUp => scroll.saturating_sub(WHEEL_STEP as u16),
                _ => scroll,
            };
            app.mode = Mode::Help { scroll };
            return KeyAction::Continue;
        }
        Mode::Normal => {}
        _ => return KeyAction::Continue,
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let pos = Position {
                x: mouse.column,
                y: mouse.row,
            };
            if app.tree_rect.width > 0 && app.tree_rect.contains(pos) {
                app.focus = Focus::Tree;
            } else if app.detail_rect.width > 0 && app.detail_rect.contains(pos) {
                app.focus = Focus::Detail;
            }
        }
        MouseEventKind::ScrollDown => scroll_focused(app, true),
        MouseEventKind::ScrollUp => scroll_focused(app, false),
        _ => {}
    }
    KeyAction::Continue
}

fn scroll_focused(app: &mut App, down: bool) {
    match app.focus {
        Focus::Tree => {
            for _ in 0..WHEEL_STEP {
                if down {
                    app.step_list.cursor_down();
                } else {
                    app.step_list.cursor_up();
                }
            }
            app.after_cursor_move();
        }
        Focus::Detail => {
            if down {
                app.detail.scroll_down(WHEEL_STEP);
            } else {
                app.detail.scroll_up(WHEEL_STEP);
            }
            app.sync_cursor_to_scroll();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::layout::Rect;

    use super::*;
    use crate::app::AppOptions;
    use crate::theme::Theme;
    use planrev_core::parser::parse;
    use planrev_core::types::{ActionType, Status};

    const PLAN: &str = "# Plan\n\nIntro.\n\n## Auth\nA\n### Login\nL\n## Storage\nS\n";

    fn app() -> App {
        App::new(Arc::new(parse(PLAN)), &Theme::dark(), AppOptions::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn press(app: &mut App, keys: &str) -> KeyAction {
        let mut last = KeyAction::Continue;
        for c in keys.chars() {
            last = handle_key(key(KeyCode::Char(c)), app);
        }
        last
    }

    fn selected_id(app: &App) -> Option<String> {
        app.step_list.selected().map(|s| s.id.clone())
    }

    #[test]
    fn gg_goes_to_top_and_g_bottom() {
        let mut app = app();
        press(&mut app, "G");
        assert_eq!(selected_id(&app).as_deref(), Some("S2"));
        press(&mut app, "gg");
        assert!(app.step_list.is_overview_selected());
        assert_eq!(app.chord, ChordState::Idle);
    }

    #[test]
    fn unfinished_chord_is_dropped() {
        let mut app = app();
        press(&mut app, "jj");
        assert_eq!(selected_id(&app).as_deref(), Some("S1.1"));

        // `g` then `v`: cursor unmoved, `v` handled on its own.
        press(&mut app, "g");
        assert_eq!(app.chord, ChordState::Armed);
        press(&mut app, "v");
        assert_eq!(app.chord, ChordState::Idle);
        assert_eq!(selected_id(&app).as_deref(), Some("S1.1"));
        assert!(app.step_list.is_viewed("S1.1"));

        // `g` then `j` moves exactly one row.
        press(&mut app, "gj");
        assert_eq!(selected_id(&app).as_deref(), Some("S2"));

        // A later single `g` is armed afresh, not completed by the stale one.
        press(&mut app, "g");
        assert_eq!(selected_id(&app).as_deref(), Some("S2"));
    }

    #[test]
    fn tab_switches_focus_and_keys_follow_it() {
        let mut app = app();
        handle_key(key(KeyCode::Tab), &mut app);
        assert_eq!(app.focus, Focus::Detail);
        press(&mut app, "j");
        assert!(app.step_list.is_overview_selected());
        handle_key(key(KeyCode::Tab), &mut app);
        press(&mut app, "j");
        assert_eq!(selected_id(&app).as_deref(), Some("S1"));
    }

    #[test]
    fn collapse_and_expand_from_tree() {
        let mut app = app();
        press(&mut app, "j");
        press(&mut app, "h");
        assert_eq!(app.step_list.visible_items().count(), 3);
        press(&mut app, "l");
        assert_eq!(app.step_list.visible_items().count(), 4);
        handle_key(key(KeyCode::Enter), &mut app);
        assert_eq!(app.step_list.visible_items().count(), 3);
    }

    #[test]
    fn comment_save_and_edit_round_trip() {
        let mut app = app();
        press(&mut app, "j");
        press(&mut app, "c");
        assert_eq!(app.mode, Mode::Comment { editing: None });
        handle_key(key(KeyCode::Tab), &mut app);
        press(&mut app, "why?");
        handle_key(ctrl_key('s'), &mut app);
        assert_eq!(app.mode, Mode::Normal);
        let comments = app.step_list.comments("S1");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].action, ActionType::Issue);
        assert_eq!(comments[0].body, "why?");

        press(&mut app, "C");
        assert_eq!(app.mode, Mode::CommentList);
        press(&mut app, "e");
        assert_eq!(app.mode, Mode::Comment { editing: Some(0) });
        press(&mut app, "!");
        handle_key(ctrl_key('s'), &mut app);
        assert_eq!(app.mode, Mode::CommentList);
        assert_eq!(app.step_list.comments("S1")[0].body, "why?!");

        press(&mut app, "d");
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.step_list.has_comments());
    }

    #[test]
    fn escape_discards_comment() {
        let mut app = app();
        press(&mut app, "jc");
        press(&mut app, "draft");
        handle_key(key(KeyCode::Esc), &mut app);
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.step_list.has_comments());
    }

    #[test]
    fn comment_list_needs_comments() {
        let mut app = app();
        press(&mut app, "jC");
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn quit_without_comments_is_immediate() {
        let mut app = app();
        assert_eq!(press(&mut app, "q"), KeyAction::Quit);
        assert_eq!(app.result().status, Status::Cancelled);
    }

    #[test]
    fn quit_with_comments_asks_first() {
        let mut app = app();
        press(&mut app, "jc");
        press(&mut app, "x");
        handle_key(ctrl_key('s'), &mut app);

        assert_eq!(handle_key(ctrl_key('c'), &mut app), KeyAction::Continue);
        assert_eq!(app.mode, Mode::Confirm);
        assert_eq!(press(&mut app, "n"), KeyAction::Continue);
        assert_eq!(app.mode, Mode::Normal);

        press(&mut app, "q");
        assert_eq!(press(&mut app, "y"), KeyAction::Quit);
        assert_eq!(app.result().status, Status::Cancelled);
    }

    #[test]
    fn submit_reports_status() {
        let mut app = app();
        assert_eq!(press(&mut app, "s"), KeyAction::Quit);
        assert_eq!(app.result().status, Status::Approved);

        let mut app = self::app();
        press(&mut app, "jc");
        press(&mut app, "fix");
        handle_key(ctrl_key('s'), &mut app);
        press(&mut app, "s");
        assert_eq!(app.result().status, Status::Submitted);
        assert_eq!(app.result().comments.len(), 1);
    }

    #[test]
    fn search_cancel_restores_tree() {
        let mut app = app();
        press(&mut app, "/");
        assert_eq!(app.mode, Mode::Search);
        press(&mut app, "login");
        assert_eq!(app.step_list.query(), "login");
        // The match and its parent.
        assert_eq!(app.step_list.visible_items().count(), 2);

        handle_key(key(KeyCode::Esc), &mut app);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.step_list.query(), "");
        assert_eq!(app.step_list.visible_items().count(), 4);
    }

    #[test]
    fn cancelled_search_keeps_user_collapse() {
        let mut app = app();
        press(&mut app, "jh");
        let before: Vec<bool> = app.step_list.items().iter().map(|it| it.visible).collect();
        assert_eq!(before, [true, true, false, true]);

        press(&mut app, "/s");
        handle_key(key(KeyCode::Esc), &mut app);

        let after: Vec<bool> = app.step_list.items().iter().map(|it| it.visible).collect();
        assert_eq!(after, before);
        assert!(!app.step_list.items()[1].expanded);
    }

    #[test]
    fn search_confirm_keeps_filter() {
        let mut app = app();
        press(&mut app, "/stor");
        handle_key(key(KeyCode::Enter), &mut app);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.step_list.query(), "stor");
        assert_eq!(selected_id(&app).as_deref(), Some("S2"));
    }

    #[test]
    fn help_toggles_and_scrolls() {
        let mut app = app();
        press(&mut app, "?");
        assert_eq!(app.mode, Mode::Help { scroll: 0 });
        press(&mut app, "jjk");
        assert_eq!(app.mode, Mode::Help { scroll: 1 });
        press(&mut app, "?");
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn resize_keys_respect_bounds() {
        let mut app = app();
        app.resize(120, 40);
        press(&mut app, ">");
        assert_eq!(app.left_pct, 35);
        press(&mut app, "<<<<<<");
        assert_eq!(app.left_pct, 10);

        app.resize(60, 40);
        press(&mut app, ">");
        assert_eq!(app.left_pct, 10);
    }

    #[test]
    fn click_focuses_pane() {
        let mut app = app();
        app.tree_rect = Rect::new(0, 1, 30, 20);
        app.detail_rect = Rect::new(29, 1, 71, 20);
        let click = |x, y| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(click(50, 5), &mut app);
        assert_eq!(app.focus, Focus::Detail);
        handle_mouse(click(3, 5), &mut app);
        assert_eq!(app.focus, Focus::Tree);
    }
}

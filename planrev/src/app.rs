//! Central application state for planrev.
//!
//! `App` owns every sub-component (step list, detail pane, comment editor,
//! comment list, search bar) plus the current mode, focus, and pane geometry.
//! The keybinding dispatcher mutates it through the methods below and the
//! render module reads it; nothing else holds state.

use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use planrev_core::step_list::StepList;
use planrev_core::types::{Plan, ReviewResult};
use planrev_core::viewed::ViewedState;

use crate::comment_editor::CommentEditor;
use crate::comment_list::CommentList;
use crate::config::{DEFAULT_LEFT_RATIO, MAX_LEFT_RATIO, MIN_LEFT_RATIO};
use crate::detail::DetailPane;
use crate::search_bar::SearchBar;
use crate::theme::Theme;

/// Terminals narrower than this show a single pane.
pub const MIN_SPLIT_WIDTH: u16 = 80;

/// Percentage points added or removed by one pane resize.
pub const RESIZE_STEP: i16 = 5;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Tree and detail navigation (default).
    #[default]
    Normal,
    /// Comment editor open. `editing` is the index being edited, `None` for a
    /// new comment.
    Comment { editing: Option<usize> },
    /// Browsing the selected step's comments.
    CommentList,
    /// Quit confirmation shown when comments would be discarded.
    Confirm,
    /// Help overlay with its vertical scroll offset.
    Help { scroll: u16 },
    /// Search prompt in the status line.
    Search,
}

/// Which pane receives navigation keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tree,
    Detail,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Tree => Focus::Detail,
            Focus::Detail => Focus::Tree,
        }
    }
}

/// Lookahead for the `gg` chord.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChordState {
    #[default]
    Idle,
    /// The first `g` was pressed; the next key decides.
    Armed,
}

/// Session inputs that do not come from the plan itself.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Plan file path shown in the title line.
    pub file_path: String,
    /// Persisted viewed state, present when tracking is enabled.
    pub viewed_state: Option<ViewedState>,
    pub left_ratio: Option<u16>,
}

pub struct App {
    pub mode: Mode,
    pub focus: Focus,
    pub chord: ChordState,

    pub step_list: StepList,
    pub detail: DetailPane,
    pub editor: CommentEditor,
    pub comment_list: CommentList,
    pub search: SearchBar,

    /// Whole-plan view in the detail pane instead of the selected section.
    pub full_view: bool,
    /// Width percentage allocated to the left (tree) pane. Default: 30.
    pub left_pct: u16,
    /// Terminal size from the last resize or draw.
    pub width: u16,
    pub height: u16,

    /// Stateful list backing the tree pane; the selection mirrors the cursor.
    pub tree_state: ListState,
    /// Pane rectangles from the last frame, used for click-to-focus.
    pub tree_rect: Rect,
    pub detail_rect: Rect,

    pub file_path: String,
    result: ReviewResult,
}

impl App {
    pub fn new(plan: Arc<Plan>, theme: &Theme, options: AppOptions) -> Self {
        let mut app = Self {
            mode: Mode::default(),
            focus: Focus::default(),
            chord: ChordState::default(),
            step_list: StepList::new(plan, options.viewed_state),
            detail: DetailPane::new(theme),
            editor: CommentEditor::new(),
            comment_list: CommentList::default(),
            search: SearchBar::default(),
            full_view: false,
            left_pct: options
                .left_ratio
                .unwrap_or(DEFAULT_LEFT_RATIO)
                .clamp(MIN_LEFT_RATIO, MAX_LEFT_RATIO),
            width: 0,
            height: 0,
            tree_state: ListState::default(),
            tree_rect: Rect::default(),
            detail_rect: Rect::default(),
            file_path: options.file_path,
            result: ReviewResult::default(),
        };
        app.refresh_detail();
        app
    }

    pub fn plan(&self) -> &Arc<Plan> {
        self.step_list.plan()
    }

    /// Outcome of the session. Cancelled until [`App::submit`] runs.
    pub fn result(&self) -> &ReviewResult {
        &self.result
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn is_single_pane(&self) -> bool {
        self.width < MIN_SPLIT_WIDTH
    }

    // -----------------------------------------------------------------------
    // Detail pane synchronisation
    // -----------------------------------------------------------------------

    /// Re-renders the detail pane for the current selection or full view.
    pub fn refresh_detail(&mut self) {
        let plan = Arc::clone(self.step_list.plan());
        if self.full_view {
            let step_list = &self.step_list;
            self.detail.show_all(&plan, |id| step_list.comments(id));
            return;
        }
        if self.step_list.is_overview_selected() {
            self.detail.show_overview(&plan);
        } else if let Some(idx) = self.step_list.selected_idx() {
            let step = plan.step(idx);
            let comments = self.step_list.comments(&step.id);
            self.detail.show_step(step, comments);
        }
    }

    /// Follows a tree cursor move: re-renders the section, or in full view
    /// scrolls to the selected step's heading.
    pub fn after_cursor_move(&mut self) {
        if self.full_view {
            let id = self
                .step_list
                .selected()
                .map(|s| s.id.clone())
                .unwrap_or_default();
            self.detail.scroll_to_step(&id);
        } else {
            self.refresh_detail();
        }
    }

    /// In full view, moves the tree cursor to the step at the top of the
    /// detail viewport.
    pub fn sync_cursor_to_scroll(&mut self) {
        if !self.full_view {
            return;
        }
        if let Some(id) = self.detail.step_id_at_offset(self.detail.y_offset()) {
            let id = id.to_owned();
            self.step_list.select_by_step_id(&id);
        }
    }

    pub fn toggle_full_view(&mut self) {
        self.full_view = !self.full_view;
        self.refresh_detail();
        if self.full_view {
            self.after_cursor_move();
        }
    }

    /// Grows (`delta > 0`) or shrinks the tree pane.
    ///
    /// Ignored in single-pane layouts and outside the supported ratio range.
    pub fn resize_left_pane(&mut self, delta: i16) {
        if self.is_single_pane() {
            return;
        }
        let new = self.left_pct as i16 + delta;
        if !(MIN_LEFT_RATIO as i16..=MAX_LEFT_RATIO as i16).contains(&new) {
            return;
        }
        self.left_pct = new as u16;
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Opens the editor for a new comment on the selected step.
    /// Does nothing on the overview row.
    pub fn open_comment_editor(&mut self) {
        let Some(id) = self.step_list.selected().map(|s| s.id.clone()) else {
            return;
        };
        self.editor.open(&id, None);
        self.mode = Mode::Comment { editing: None };
    }

    /// Saves the editor's comment, then leaves the editor.
    pub fn save_comment(&mut self) {
        let Mode::Comment { editing } = self.mode else {
            return;
        };
        let step_id = self.editor.step_id().to_owned();
        let comment = self.editor.result();
        match editing {
            Some(index) => self.step_list.update_comment(&step_id, index, comment),
            None => self.step_list.add_comment(&step_id, comment),
        }
        self.return_from_comment();
        self.refresh_detail();
    }

    /// Closes the editor and goes back to where it was opened from.
    pub fn return_from_comment(&mut self) {
        let editing = matches!(self.mode, Mode::Comment { editing: Some(_) });
        self.editor.close();
        let step_id = self.editor.step_id().to_owned();
        let comments = self.step_list.comments(&step_id);
        if editing && !comments.is_empty() {
            self.comment_list.open(&step_id, comments);
            self.mode = Mode::CommentList;
        } else {
            self.mode = Mode::Normal;
        }
    }

    /// Opens the comment list when the selected step has comments.
    pub fn open_comment_list(&mut self) {
        let Some(id) = self.step_list.selected().map(|s| s.id.clone()) else {
            return;
        };
        let comments = self.step_list.comments(&id);
        if comments.is_empty() {
            return;
        }
        self.comment_list.open(&id, comments);
        self.mode = Mode::CommentList;
    }

    pub fn close_comment_list(&mut self) {
        self.comment_list.close();
        self.mode = Mode::Normal;
        self.refresh_detail();
    }

    /// Re-opens the editor on the comment under the list cursor.
    pub fn edit_selected_comment(&mut self) {
        let step_id = self.comment_list.step_id().to_owned();
        let index = self.comment_list.cursor();
        let Some(existing) = self.step_list.comments(&step_id).get(index).cloned() else {
            return;
        };
        self.editor.open(&step_id, Some(&existing));
        self.mode = Mode::Comment {
            editing: Some(index),
        };
    }

    /// Deletes the comment under the list cursor; leaves the list when it
    /// becomes empty.
    pub fn delete_selected_comment(&mut self) {
        let step_id = self.comment_list.step_id().to_owned();
        let cursor = self.comment_list.cursor();
        self.step_list.delete_comment(&step_id, cursor);
        let comments = self.step_list.comments(&step_id);
        if comments.is_empty() {
            self.comment_list.close();
            self.mode = Mode::Normal;
        } else {
            self.comment_list.open(&step_id, comments);
        }
        self.refresh_detail();
    }

    pub fn toggle_viewed_selected(&mut self) {
        if let Some(id) = self.step_list.selected().map(|s| s.id.clone()) {
            self.step_list.toggle_viewed(&id);
        }
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    pub fn open_search(&mut self) {
        self.search.open();
        self.mode = Mode::Search;
    }

    /// Re-applies the filter after the query changed.
    pub fn update_search(&mut self) {
        self.step_list.filter_by_query(&self.search.query());
        self.refresh_detail();
    }

    /// Leaves search mode keeping the filter and cursor.
    pub fn confirm_search(&mut self) {
        self.search.close();
        self.mode = Mode::Normal;
        self.refresh_detail();
    }

    /// Leaves search mode and restores the unfiltered tree.
    pub fn cancel_search(&mut self) {
        self.search.close();
        self.step_list.clear_filter();
        self.mode = Mode::Normal;
        self.refresh_detail();
    }

    // -----------------------------------------------------------------------
    // Session end
    // -----------------------------------------------------------------------

    /// Asks to quit. Returns `true` when the session can end right away,
    /// otherwise switches to the confirmation dialog.
    pub fn request_quit(&mut self) -> bool {
        if self.step_list.has_comments() {
            self.mode = Mode::Confirm;
            return false;
        }
        self.cancel();
        true
    }

    pub fn cancel(&mut self) {
        self.result = ReviewResult::default();
    }

    /// Builds the final result: approved without comments, submitted with.
    pub fn submit(&mut self) {
        let review = self.step_list.build_review_result();
        self.result = ReviewResult::submitted(review.comments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planrev_core::parser::parse;
    use planrev_core::types::{ActionType, ReviewComment, Status};

    const PLAN: &str = "# Plan\n\nIntro.\n\n## Auth\nA\n### Login\nL\n## Storage\nS\n";

    fn app() -> App {
        App::new(Arc::new(parse(PLAN)), &Theme::dark(), AppOptions::default())
    }

    #[test]
    fn defaults() {
        let app = app();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.focus, Focus::Tree);
        assert_eq!(app.left_pct, DEFAULT_LEFT_RATIO);
        assert_eq!(app.result().status, Status::Cancelled);
        assert!(app.step_list.is_overview_selected());
    }

    #[test]
    fn comment_editor_does_not_open_on_overview() {
        let mut app = app();
        app.open_comment_editor();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn comment_list_requires_comments() {
        let mut app = app();
        app.step_list.cursor_down();
        app.open_comment_list();
        assert_eq!(app.mode, Mode::Normal);

        app.step_list
            .add_comment("S1", Some(ReviewComment::new("S1", ActionType::Note, "x")));
        app.open_comment_list();
        assert_eq!(app.mode, Mode::CommentList);
    }

    #[test]
    fn deleting_last_comment_returns_to_normal() {
        let mut app = app();
        app.step_list.cursor_down();
        app.step_list
            .add_comment("S1", Some(ReviewComment::new("S1", ActionType::Note, "x")));
        app.open_comment_list();
        app.delete_selected_comment();
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.step_list.has_comments());
    }

    #[test]
    fn submit_statuses() {
        let mut app = app();
        app.submit();
        assert_eq!(app.result().status, Status::Approved);

        app.step_list
            .add_comment("S2", Some(ReviewComment::new("S2", ActionType::Issue, "y")));
        app.submit();
        assert_eq!(app.result().status, Status::Submitted);
        assert_eq!(app.result().comments.len(), 1);
    }

    #[test]
    fn quit_with_comments_asks_first() {
        let mut app = app();
        assert!(app.request_quit());

        app.step_list
            .add_comment("S1", Some(ReviewComment::new("S1", ActionType::Note, "x")));
        assert!(!app.request_quit());
        assert_eq!(app.mode, Mode::Confirm);
    }

    #[test]
    fn pane_resize_is_bounded_and_needs_width() {
        let mut app = app();
        app.resize(60, 24);
        app.resize_left_pane(RESIZE_STEP);
        assert_eq!(app.left_pct, 30);

        app.resize(120, 40);
        for _ in 0..10 {
            app.resize_left_pane(RESIZE_STEP);
        }
        assert_eq!(app.left_pct, MAX_LEFT_RATIO);
        for _ in 0..10 {
            app.resize_left_pane(-RESIZE_STEP);
        }
        assert_eq!(app.left_pct, MIN_LEFT_RATIO);
    }

    #[test]
    fn left_ratio_option_is_clamped() {
        let app = App::new(
            Arc::new(parse(PLAN)),
            &Theme::dark(),
            AppOptions {
                left_ratio: Some(80),
                ..AppOptions::default()
            },
        );
        assert_eq!(app.left_pct, MAX_LEFT_RATIO);
    }

    #[test]
    fn full_view_follows_cursor_and_scroll() {
        let mut app = app();
        app.detail.set_size(60, 3);
        app.toggle_full_view();
        app.step_list.cursor_bottom();
        app.after_cursor_move();
        assert_eq!(app.detail.step_id_at_offset(app.detail.y_offset()), Some("S2"));

        app.detail.goto_top();
        app.step_list.cursor_bottom();
        app.detail.scroll_down(4);
        app.sync_cursor_to_scroll();
        assert_eq!(app.step_list.selected().map(|s| s.id.as_str()), Some("S1"));
    }
}

//! Navigable, filterable view over a plan's step tree.
//!
//! [`StepList`] flattens the arena into display rows, tracks the cursor and
//! expansion state, applies search filters, and owns every review comment and
//! per-session viewed flag until the session is submitted.
//!
//! Visibility is always derived from two inputs, expansion state and the
//! active query, and is recomputed eagerly whenever either changes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::types::{Plan, ReviewComment, ReviewResult, Step, StepIdx};
use crate::viewed::ViewedState;

/// One flattened row of the step tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepListItem {
    /// Step shown on this row, `None` for the synthetic overview row.
    pub step: Option<StepIdx>,
    pub depth: usize,
    pub expanded: bool,
    pub visible: bool,
}

impl StepListItem {
    pub fn is_overview(&self) -> bool {
        self.step.is_none()
    }
}

/// Step tree state for one review session.
#[derive(Debug, Clone)]
pub struct StepList {
    plan: Arc<Plan>,
    items: Vec<StepListItem>,
    cursor: usize,
    /// Lower-cased active search query, empty when no filter is applied.
    query: String,
    /// Collapsed rows held open by the active query because they are
    /// ancestors of a match. Their `expanded` flag is left untouched.
    revealed: HashSet<usize>,
    comments: HashMap<String, Vec<ReviewComment>>,
    viewed: HashSet<String>,
    viewed_state: Option<ViewedState>,
}

impl StepList {
    /// Builds the flattened list for `plan`.
    ///
    /// An overview row is added first when the plan has a preamble. When a
    /// persisted `viewed_state` is supplied, steps whose content still matches
    /// it start out flagged as viewed.
    pub fn new(plan: Arc<Plan>, viewed_state: Option<ViewedState>) -> Self {
        let mut items = Vec::with_capacity(plan.len() + 1);
        if !plan.preamble.is_empty() {
            items.push(StepListItem {
                step: None,
                depth: 0,
                expanded: true,
                visible: true,
            });
        }
        for (idx, _) in plan.all_steps() {
            items.push(StepListItem {
                step: Some(idx),
                depth: plan.depth(idx),
                expanded: true,
                visible: true,
            });
        }

        let viewed = match &viewed_state {
            Some(state) => plan
                .all_steps()
                .filter(|(_, s)| state.is_step_viewed(s))
                .map(|(_, s)| s.id.clone())
                .collect(),
            None => HashSet::new(),
        };

        Self {
            plan,
            items,
            cursor: 0,
            query: String::new(),
            revealed: HashSet::new(),
            comments: HashMap::new(),
            viewed,
            viewed_state,
        }
    }

    pub fn plan(&self) -> &Arc<Plan> {
        &self.plan
    }

    pub fn items(&self) -> &[StepListItem] {
        &self.items
    }

    /// Index of the cursor into [`StepList::items`].
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Iterates the visible rows together with their index into `items`.
    pub fn visible_items(&self) -> impl Iterator<Item = (usize, &StepListItem)> + '_ {
        self.items.iter().enumerate().filter(|(_, it)| it.visible)
    }

    /// Position of the cursor among the visible rows.
    pub fn cursor_visible_position(&self) -> Option<usize> {
        self.visible_items().position(|(i, _)| i == self.cursor)
    }

    /// Whether the row's children are shown: expanded by the user, or held
    /// open by the active query.
    pub fn is_open(&self, row: usize) -> bool {
        self.items.get(row).is_some_and(|it| it.expanded) || self.revealed.contains(&row)
    }

    /// Row index holding `idx`, accounting for the optional overview row.
    fn item_index(&self, idx: StepIdx) -> usize {
        idx.0 + usize::from(!self.plan.preamble.is_empty())
    }

    // -------------------------------------------------------------------------
    // Cursor movement
    // -------------------------------------------------------------------------

    pub fn cursor_up(&mut self) {
        if let Some(i) = (0..self.cursor).rev().find(|i| self.items[*i].visible) {
            self.cursor = i;
        }
    }

    pub fn cursor_down(&mut self) {
        if let Some(i) = (self.cursor + 1..self.items.len()).find(|i| self.items[*i].visible) {
            self.cursor = i;
        }
    }

    pub fn cursor_top(&mut self) {
        if let Some(i) = self.items.iter().position(|it| it.visible) {
            self.cursor = i;
        }
    }

    pub fn cursor_bottom(&mut self) {
        if let Some(i) = self.items.iter().rposition(|it| it.visible) {
            self.cursor = i;
        }
    }

    /// Moves the cursor to the visible row showing `step_id`.
    ///
    /// Returns `false` and leaves the cursor alone when the step is unknown or
    /// currently hidden.
    pub fn select_by_step_id(&mut self, step_id: &str) -> bool {
        let Some(idx) = self.plan.find_index(step_id) else {
            return false;
        };
        let row = self.item_index(idx);
        if self.items.get(row).is_some_and(|it| it.visible) {
            self.cursor = row;
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    /// Returns the cursor row and its step if it is a step with children.
    fn expandable_at_cursor(&self) -> Option<StepIdx> {
        let idx = self.items.get(self.cursor)?.step?;
        (!self.plan.step(idx).children.is_empty()).then_some(idx)
    }

    pub fn toggle_expand(&mut self) {
        if self.expandable_at_cursor().is_none() {
            return;
        }
        let item = &mut self.items[self.cursor];
        item.expanded = !item.expanded;
        self.update_visibility();
    }

    pub fn expand(&mut self) {
        if self.expandable_at_cursor().is_none() || self.items[self.cursor].expanded {
            return;
        }
        self.items[self.cursor].expanded = true;
        self.update_visibility();
    }

    /// Collapses the cursor step, or ascends to its parent when there is
    /// nothing left to collapse.
    pub fn collapse(&mut self) {
        let Some(idx) = self.items.get(self.cursor).and_then(|it| it.step) else {
            return;
        };
        if self.expandable_at_cursor().is_some() && self.items[self.cursor].expanded {
            self.items[self.cursor].expanded = false;
            self.update_visibility();
            return;
        }
        if let Some(parent) = self.plan.step(idx).parent {
            let row = self.item_index(parent);
            if self.items[row].visible {
                self.cursor = row;
            }
        }
    }

    /// Recomputes every row's `visible` flag from expansion state and the
    /// active query, then relocates the cursor if its row became hidden.
    fn update_visibility(&mut self) {
        let filter = self.filter_set();
        self.revealed = self.match_ancestor_rows();
        let collapsed: HashSet<StepIdx> = self
            .items
            .iter()
            .enumerate()
            .filter(|(row, it)| !it.expanded && !self.revealed.contains(row))
            .filter_map(|(_, it)| it.step)
            .collect();

        for (row, item) in self.items.iter_mut().enumerate() {
            let shown_by_tree = match item.step {
                None => true,
                Some(idx) => !self.plan.ancestors(idx).any(|a| collapsed.contains(&a)),
            };
            let shown_by_filter = filter.as_ref().is_none_or(|set| set.contains(&row));
            item.visible = shown_by_tree && shown_by_filter;
        }

        if self.items.get(self.cursor).is_some_and(|it| !it.visible) {
            self.cursor_top();
        }
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Filters the list to rows related to `query`.
    ///
    /// A row matches when `"{id} {title}"` contains the query, ignoring case;
    /// the overview row matches when `"overview"` contains it. Matches stay
    /// visible along with their ancestors and descendants. Collapsed
    /// ancestors of a match are held open while the query is active, without
    /// changing their expansion state. An empty query clears the filter.
    pub fn filter_by_query(&mut self, query: &str) {
        if query.is_empty() {
            self.clear_filter();
            return;
        }
        self.query = query.to_lowercase();
        self.update_visibility();
    }

    /// Drops the active query so only expansion state decides visibility.
    /// Rows collapsed before the search are collapsed again.
    pub fn clear_filter(&mut self) {
        self.query.clear();
        self.update_visibility();
    }

    /// Active lower-cased query, empty when no filter is applied.
    pub fn query(&self) -> &str {
        &self.query
    }

    fn direct_matches(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, it)| match it.step {
                None => "overview".contains(self.query.as_str()),
                Some(idx) => {
                    let step = self.plan.step(idx);
                    format!("{} {}", step.id, step.title)
                        .to_lowercase()
                        .contains(self.query.as_str())
                }
            })
            .map(|(row, _)| row)
            .collect()
    }

    /// Rows of every ancestor of a direct match; empty without a query.
    fn match_ancestor_rows(&self) -> HashSet<usize> {
        if self.query.is_empty() {
            return HashSet::new();
        }
        self.direct_matches()
            .into_iter()
            .filter_map(|row| self.items[row].step)
            .flat_map(|idx| self.plan.ancestors(idx))
            .map(|a| self.item_index(a))
            .collect()
    }

    /// Rows allowed by the active query, or `None` when no query is active.
    fn filter_set(&self) -> Option<HashSet<usize>> {
        if self.query.is_empty() {
            return None;
        }
        let matched = self.direct_matches();
        let mut allowed: HashSet<usize> = matched.iter().copied().collect();

        for row in &matched {
            let Some(idx) = self.items[*row].step else {
                continue;
            };
            allowed.extend(self.plan.ancestors(idx).map(|a| self.item_index(a)));
        }
        for row in &matched {
            let Some(idx) = self.items[*row].step else {
                continue;
            };
            allowed.extend(
                self.plan
                    .descendants(idx)
                    .into_iter()
                    .map(|d| self.item_index(d)),
            );
        }
        Some(allowed)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Step under the cursor, `None` when the overview row is selected.
    pub fn selected(&self) -> Option<&Step> {
        self.selected_idx().map(|idx| self.plan.step(idx))
    }

    pub fn selected_idx(&self) -> Option<StepIdx> {
        self.items.get(self.cursor).and_then(|it| it.step)
    }

    pub fn is_overview_selected(&self) -> bool {
        self.items
            .get(self.cursor)
            .is_some_and(StepListItem::is_overview)
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    /// Appends a comment for `step_id`. `None` or an empty body is ignored.
    pub fn add_comment(&mut self, step_id: &str, comment: Option<ReviewComment>) {
        let Some(comment) = comment.filter(|c| !c.body.is_empty()) else {
            return;
        };
        self.comments
            .entry(step_id.to_owned())
            .or_default()
            .push(comment);
    }

    /// Replaces the comment at `index`, or deletes it when the replacement is
    /// `None` or has an empty body. Out-of-range indices are ignored.
    pub fn update_comment(&mut self, step_id: &str, index: usize, comment: Option<ReviewComment>) {
        if index >= self.comments(step_id).len() {
            return;
        }
        match comment.filter(|c| !c.body.is_empty()) {
            Some(comment) => {
                if let Some(list) = self.comments.get_mut(step_id) {
                    list[index] = comment;
                }
            }
            None => self.delete_comment(step_id, index),
        }
    }

    /// Removes the comment at `index`, dropping the step's entry once empty.
    pub fn delete_comment(&mut self, step_id: &str, index: usize) {
        let Some(list) = self.comments.get_mut(step_id) else {
            return;
        };
        if index >= list.len() {
            return;
        }
        list.remove(index);
        if list.is_empty() {
            self.comments.remove(step_id);
        }
    }

    pub fn comments(&self, step_id: &str) -> &[ReviewComment] {
        self.comments
            .get(step_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_comments(&self) -> bool {
        self.comments.values().any(|list| !list.is_empty())
    }

    /// Number of comments across every step.
    pub fn comment_count(&self) -> usize {
        self.comments.values().map(Vec::len).sum()
    }

    // -------------------------------------------------------------------------
    // Viewed tracking
    // -------------------------------------------------------------------------

    /// Flips the session viewed flag for `step_id` and mirrors the change into
    /// the persisted state when one is attached. Unknown IDs are ignored.
    pub fn toggle_viewed(&mut self, step_id: &str) {
        let Some(step) = self.plan.find_step(step_id) else {
            return;
        };
        let now_viewed = if self.viewed.remove(step_id) {
            false
        } else {
            self.viewed.insert(step_id.to_owned());
            true
        };
        if let Some(state) = self.viewed_state.as_mut() {
            if now_viewed {
                state.mark_viewed(step);
            } else {
                state.unmark_viewed(step);
            }
        }
        tracing::debug!(step_id, viewed = now_viewed, "toggled viewed");
    }

    pub fn is_viewed(&self, step_id: &str) -> bool {
        self.viewed.contains(step_id)
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }

    /// Persisted state to write back at session end, if tracking is enabled.
    pub fn viewed_state(&self) -> Option<&ViewedState> {
        self.viewed_state.as_ref()
    }

    // -------------------------------------------------------------------------
    // Submission
    // -------------------------------------------------------------------------

    /// Collects every comment in step pre-order, then insertion order per step.
    ///
    /// The returned status is the default; the caller decides it.
    pub fn build_review_result(&self) -> ReviewResult {
        let comments = self
            .plan
            .all_steps()
            .flat_map(|(_, step)| self.comments(&step.id).iter().cloned())
            .collect();
        ReviewResult {
            comments,
            ..ReviewResult::default()
        }
    }
}

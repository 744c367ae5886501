//! Owned data types shared by the parser, the step list, and the binary.
//!
//! The step tree is stored as an arena: every `Step` lives in `Plan::steps`
//! and refers to its parent and children by `StepIdx`. Arena order is the
//! depth-first pre-order of the tree, so iterating `steps` front to back is the
//! canonical document order used for submission.

use std::fmt;

/// Index of a step inside `Plan::steps`.
///
/// Indices are stable for the lifetime of the `Plan` because the arena is never
/// reordered or shrunk after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIdx(pub usize);

/// The parsed structure of an entire plan file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Text of the first level-1 heading, empty when the document has none.
    pub title: String,
    /// Text before the first step heading, plus the body of the title heading.
    pub preamble: String,
    /// Arena of every step in depth-first pre-order.
    pub steps: Vec<Step>,
    /// Top-level steps in document order.
    pub roots: Vec<StepIdx>,
}

/// A single heading-delimited section of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Hierarchical ID: `S1`, `S1.1`, `S2`, ...
    pub id: String,
    /// Heading text without the `#` markers.
    pub title: String,
    /// Raw heading level (2 for `##`, 3 for `###`, ...).
    pub level: u8,
    /// Markdown text between this heading and the next one, trimmed.
    pub body: String,
    pub children: Vec<StepIdx>,
    /// Containing step, `None` for top-level steps. Lookup only.
    pub parent: Option<StepIdx>,
}

impl Plan {
    /// Returns the step stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` did not come from this plan.
    pub fn step(&self, idx: StepIdx) -> &Step {
        &self.steps[idx.0]
    }

    /// Mutable access to a step. Only tests and the parser need this; the
    /// review session treats the plan as read-only.
    pub fn step_mut(&mut self, idx: StepIdx) -> &mut Step {
        &mut self.steps[idx.0]
    }

    /// Number of steps in the whole tree.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterates all steps in depth-first pre-order together with their index.
    pub fn all_steps(&self) -> impl Iterator<Item = (StepIdx, &Step)> + '_ {
        self.steps.iter().enumerate().map(|(i, s)| (StepIdx(i), s))
    }

    /// Returns the arena index of the step with the given ID.
    pub fn find_index(&self, id: &str) -> Option<StepIdx> {
        self.steps.iter().position(|s| s.id == id).map(StepIdx)
    }

    /// Returns the step with the given ID, or `None` if not found.
    pub fn find_step(&self, id: &str) -> Option<&Step> {
        self.find_index(id).map(|idx| self.step(idx))
    }

    /// Iterates the ancestors of `idx`, nearest first.
    pub fn ancestors(&self, idx: StepIdx) -> impl Iterator<Item = StepIdx> + '_ {
        std::iter::successors(self.step(idx).parent, move |p| self.step(*p).parent)
    }

    /// Collects every descendant of `idx` in pre-order.
    pub fn descendants(&self, idx: StepIdx) -> Vec<StepIdx> {
        let mut out = Vec::new();
        let mut stack: Vec<StepIdx> = self.step(idx).children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.step(next).children.iter().rev().copied());
        }
        out
    }

    /// Nesting depth of `idx` in the built tree (0 for top-level steps).
    pub fn depth(&self, idx: StepIdx) -> usize {
        self.ancestors(idx).count()
    }

    /// Returns `true` if `ancestor` is a strict ancestor of `idx`.
    pub fn is_ancestor(&self, ancestor: StepIdx, idx: StepIdx) -> bool {
        self.ancestors(idx).any(|a| a == ancestor)
    }
}

/// Type of review action, based on Conventional Comments labels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    #[default]
    Suggestion,
    Issue,
    Question,
    Nitpick,
    Todo,
    Thought,
    Note,
    Praise,
    Chore,
}

impl ActionType {
    /// Every label in cycling order. The first entry is the default.
    pub const ALL: [ActionType; 9] = [
        ActionType::Suggestion,
        ActionType::Issue,
        ActionType::Question,
        ActionType::Nitpick,
        ActionType::Todo,
        ActionType::Thought,
        ActionType::Note,
        ActionType::Praise,
        ActionType::Chore,
    ];

    /// Lower-case label used in output and in the UI.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Suggestion => "suggestion",
            ActionType::Issue => "issue",
            ActionType::Question => "question",
            ActionType::Nitpick => "nitpick",
            ActionType::Todo => "todo",
            ActionType::Thought => "thought",
            ActionType::Note => "note",
            ActionType::Praise => "praise",
            ActionType::Chore => "chore",
        }
    }

    /// Position of `self` inside [`ActionType::ALL`].
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A review comment on a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    pub step_id: String,
    pub action: ActionType,
    pub body: String,
}

impl ReviewComment {
    pub fn new(step_id: impl Into<String>, action: ActionType, body: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            action,
            body: body.into(),
        }
    }
}

/// Terminal status of a review session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Submitted,
    Approved,
    #[default]
    Cancelled,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Submitted => "submitted",
            Status::Approved => "approved",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entire review output: comments in canonical step order plus a status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewResult {
    pub comments: Vec<ReviewComment>,
    pub status: Status,
}

impl ReviewResult {
    /// Result of an explicit submit: approved when there is nothing to say.
    pub fn submitted(comments: Vec<ReviewComment>) -> Self {
        let status = if comments.is_empty() {
            Status::Approved
        } else {
            Status::Submitted
        };
        Self { comments, status }
    }
}

//! Detail pane: rendered content for the selected step, the overview, or the
//! whole plan, plus its scroll state.
//!
//! Content is re-rendered into a `Vec<Line<'static>>` whenever the selection
//! or the pane width changes; drawing a frame only slices that buffer. In
//! full view the pane also remembers where each step heading starts so the
//! tree cursor can follow continuous scrolling.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use planrev_core::types::{Plan, ReviewComment, Step};

use crate::markdown::{plain_lines, MarkdownRenderer, StyledRenderer};
use crate::theme::Theme;
use crate::wrap::{soft_wrap_line, wrap_prose};

/// Columns kept free on the right of wrapped prose for list and quote prefixes.
const WRAP_MARGIN: u16 = 2;

/// Line at which a step heading begins in full view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionOffset {
    line: usize,
    step_id: String,
}

pub struct DetailPane {
    renderer: Option<Box<dyn MarkdownRenderer>>,
    theme: Theme,
    lines: Vec<Line<'static>>,
    section_offsets: Vec<SectionOffset>,
    width: u16,
    height: u16,
    y_offset: usize,
    x_offset: usize,
}

impl DetailPane {
    /// Creates a pane using the styled Markdown renderer for `theme`.
    ///
    /// If the renderer cannot be built the pane shows wrapped plain text.
    pub fn new(theme: &Theme) -> Self {
        let renderer = match StyledRenderer::new(theme) {
            Ok(r) => Some(Box::new(r) as Box<dyn MarkdownRenderer>),
            Err(e) => {
                tracing::warn!(error = %e, "markdown renderer unavailable, using plain text");
                None
            }
        };
        Self::with_renderer(theme, renderer)
    }

    pub fn with_renderer(theme: &Theme, renderer: Option<Box<dyn MarkdownRenderer>>) -> Self {
        Self {
            renderer,
            theme: theme.clone(),
            lines: Vec::new(),
            section_offsets: Vec::new(),
            width: 0,
            height: 0,
            y_offset: 0,
            x_offset: 0,
        }
    }

    /// Updates the viewport size. Returns `true` when the width changed; the
    /// caller must then re-show the current content so prose is re-wrapped.
    pub fn set_size(&mut self, width: u16, height: u16) -> bool {
        let rewrap = width != self.width;
        self.width = width;
        self.height = height;
        self.clamp_offsets();
        rewrap
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn x_offset(&self) -> usize {
        self.x_offset
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    /// Shows one step's heading, body, and review comments.
    pub fn show_step(&mut self, step: &Step, comments: &[ReviewComment]) {
        self.lines = self.step_section(step, comments, "##");
        self.section_offsets.clear();
        self.reset_scroll();
    }

    /// Shows the plan title and preamble.
    pub fn show_overview(&mut self, plan: &Plan) {
        self.lines = self.overview_section(plan);
        self.section_offsets.clear();
        self.reset_scroll();
    }

    /// Shows the overview followed by every step in document order.
    ///
    /// Heading depth follows tree depth. The scroll position is kept (clamped)
    /// so the caller can re-sync it with [`DetailPane::scroll_to_step`].
    pub fn show_all<'a, F>(&mut self, plan: &Plan, comments_of: F)
    where
        F: Fn(&str) -> &'a [ReviewComment],
    {
        let mut lines = self.overview_section(plan);
        let mut offsets = Vec::with_capacity(plan.len());

        for (idx, step) in plan.all_steps() {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            offsets.push(SectionOffset {
                line: lines.len(),
                step_id: step.id.clone(),
            });
            let marker = "#".repeat((plan.depth(idx) + 2).min(6));
            lines.extend(self.step_section(step, comments_of(&step.id), &marker));
        }

        self.lines = lines;
        self.section_offsets = offsets;
        self.clamp_offsets();
    }

    fn overview_section(&self, plan: &Plan) -> Vec<Line<'static>> {
        let mut md = String::new();
        if !plan.title.is_empty() {
            md.push_str(&format!("# {}\n\n", plan.title));
        }
        if !plan.preamble.is_empty() {
            md.push_str(&plan.preamble);
            md.push('\n');
        }
        if md.is_empty() {
            return Vec::new();
        }
        self.render_markdown(&md)
    }

    fn step_section(
        &self,
        step: &Step,
        comments: &[ReviewComment],
        marker: &str,
    ) -> Vec<Line<'static>> {
        let mut md = format!("{marker} {}: {}\n\n", step.id, step.title);
        if !step.body.is_empty() {
            md.push_str(&step.body);
            md.push('\n');
        }
        let mut lines = self.render_markdown(&md);

        let numbered = comments.len() > 1;
        for (i, comment) in comments.iter().enumerate() {
            lines.push(Line::default());
            let number = numbered.then_some(i + 1);
            lines.extend(comment_box(comment, number, self.wrap_width(), &self.theme));
        }
        lines
    }

    fn wrap_width(&self) -> usize {
        self.width.saturating_sub(WRAP_MARGIN) as usize
    }

    /// Wraps and renders `md`, falling back to the wrapped source on error.
    fn render_markdown(&self, md: &str) -> Vec<Line<'static>> {
        let wrapped = wrap_prose(md, self.wrap_width());
        match &self.renderer {
            Some(renderer) => renderer.render(&wrapped).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "markdown render failed, showing source");
                plain_lines(&wrapped)
            }),
            None => plain_lines(&wrapped),
        }
    }

    // -----------------------------------------------------------------------
    // Full-view mapping
    // -----------------------------------------------------------------------

    /// Step whose heading is the last one starting at or above line `y`.
    pub fn step_id_at_offset(&self, y: usize) -> Option<&str> {
        let n = self.section_offsets.partition_point(|s| s.line <= y);
        let i = n.checked_sub(1)?;
        Some(self.section_offsets[i].step_id.as_str())
    }

    /// Scrolls so `step_id`'s heading is at the top.
    ///
    /// An empty ID scrolls to the top; an ID without a recorded section is
    /// ignored.
    pub fn scroll_to_step(&mut self, step_id: &str) {
        if step_id.is_empty() {
            self.y_offset = 0;
            return;
        }
        if let Some(section) = self.section_offsets.iter().find(|s| s.step_id == step_id) {
            self.y_offset = section.line.min(self.max_y_offset());
        }
    }

    // -----------------------------------------------------------------------
    // Scrolling
    // -----------------------------------------------------------------------

    fn max_y_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    fn max_x_offset(&self) -> usize {
        let widest = self.lines.iter().map(Line::width).max().unwrap_or(0);
        widest.saturating_sub(self.width as usize)
    }

    fn clamp_offsets(&mut self) {
        self.y_offset = self.y_offset.min(self.max_y_offset());
        self.x_offset = self.x_offset.min(self.max_x_offset());
    }

    fn reset_scroll(&mut self) {
        self.y_offset = 0;
        self.x_offset = 0;
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.y_offset = (self.y_offset + n).min(self.max_y_offset());
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.y_offset = self.y_offset.saturating_sub(n);
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.height as usize / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.height as usize / 2).max(1));
    }

    pub fn goto_top(&mut self) {
        self.y_offset = 0;
    }

    pub fn goto_bottom(&mut self) {
        self.y_offset = self.max_y_offset();
    }

    pub fn scroll_right(&mut self, n: usize) {
        self.x_offset = (self.x_offset + n).min(self.max_x_offset());
    }

    pub fn scroll_left(&mut self, n: usize) {
        self.x_offset = self.x_offset.saturating_sub(n);
    }

    pub fn scroll_to_start(&mut self) {
        self.x_offset = 0;
    }

    pub fn scroll_to_end(&mut self) {
        self.x_offset = self.max_x_offset();
    }

    /// Draws the visible window of the rendered content into `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let end = (self.y_offset + area.height as usize).min(self.lines.len());
        let start = self.y_offset.min(end);
        let x = u16::try_from(self.x_offset).unwrap_or(u16::MAX);
        frame.render_widget(
            Paragraph::new(self.lines[start..end].to_vec()).scroll((0, x)),
            area,
        );
    }
}

/// Builds a rounded box around one review comment, `width` cells wide.
fn comment_box(
    comment: &ReviewComment,
    number: Option<usize>,
    width: usize,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let border = Style::default().fg(theme.comment_border);
    let title_style = Style::default()
        .fg(theme.comment_badge)
        .add_modifier(Modifier::BOLD);

    let title = match number {
        Some(n) => format!(" Review Comment #{n} [{}] ", comment.action),
        None => format!(" Review Comment [{}] ", comment.action),
    };
    let width = width.max(title.width() + 4);
    let inner = width - 4;

    let mut lines = Vec::new();
    let fill = width - 3 - title.width();
    lines.push(Line::from(vec![
        Span::styled("╭─", border),
        Span::styled(title, title_style),
        Span::styled(format!("{}╮", "─".repeat(fill)), border),
    ]));

    for raw in comment.body.lines() {
        let pieces = if raw.width() > inner {
            soft_wrap_line(raw, inner)
        } else {
            vec![raw.to_owned()]
        };
        for piece in pieces {
            let pad = inner.saturating_sub(piece.width());
            lines.push(Line::from(vec![
                Span::styled("│ ", border),
                Span::raw(format!("{piece}{}", " ".repeat(pad))),
                Span::styled(" │", border),
            ]));
        }
    }

    lines.push(Line::from(Span::styled(
        format!("╰{}╯", "─".repeat(width - 2)),
        border,
    )));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use planrev_core::parser::parse;
    use planrev_core::types::ActionType;

    struct FailingRenderer;

    impl MarkdownRenderer for FailingRenderer {
        fn render(&self, _markdown: &str) -> anyhow::Result<Vec<Line<'static>>> {
            anyhow::bail!("renderer broke")
        }
    }

    fn pane(width: u16, height: u16) -> DetailPane {
        let mut pane = DetailPane::with_renderer(&Theme::dark(), None);
        pane.set_size(width, height);
        pane
    }

    fn text(pane: &DetailPane) -> Vec<String> {
        pane.lines().iter().map(|l| l.to_string()).collect()
    }

    fn with_offsets(offsets: &[(usize, &str)]) -> DetailPane {
        let mut pane = pane(80, 10);
        pane.lines = vec![Line::default(); 100];
        pane.section_offsets = offsets
            .iter()
            .map(|(line, id)| SectionOffset {
                line: *line,
                step_id: (*id).to_owned(),
            })
            .collect();
        pane
    }

    const PLAN: &str = "# My Plan\n\nUnique preamble content\n\n\
        ## First\nAlpha body text\n### Child\nChild body\n## Second\nBravo body text\n";

    #[test]
    fn show_step_includes_heading_and_body() {
        let plan = parse(PLAN);
        let mut pane = pane(80, 20);
        pane.show_step(plan.find_step("S1").expect("S1"), &[]);
        let lines = text(&pane);
        assert_eq!(lines[0], "## S1: First");
        assert!(lines.iter().any(|l| l == "Alpha body text"));
    }

    #[test]
    fn single_comment_box_is_unnumbered() {
        let plan = parse(PLAN);
        let mut pane = pane(40, 20);
        let comments = [ReviewComment::new("S1", ActionType::Issue, "broken")];
        pane.show_step(plan.find_step("S1").expect("S1"), &comments);
        let lines = text(&pane);
        let header = "╭─ Review Comment [issue] ";
        assert!(lines.iter().any(|l| l.starts_with(header)));
        let body_row = |l: &String| l.starts_with("│ broken") && l.ends_with(" │");
        assert!(lines.iter().any(body_row));
        assert!(lines.iter().all(|l| l.width() <= 40));
    }

    #[test]
    fn multiple_comments_are_numbered() {
        let plan = parse(PLAN);
        let mut pane = pane(40, 20);
        let comments = [
            ReviewComment::new("S1", ActionType::Note, "one"),
            ReviewComment::new("S1", ActionType::Praise, "two"),
        ];
        pane.show_step(plan.find_step("S1").expect("S1"), &comments);
        let lines = text(&pane);
        let has = |needle: &str| lines.iter().any(|l| l.contains(needle));
        assert!(has("Review Comment #1 [note]"));
        assert!(has("Review Comment #2 [praise]"));
    }

    #[test]
    fn overview_shows_title_and_preamble() {
        let plan = parse(PLAN);
        let mut pane = pane(80, 20);
        pane.show_overview(&plan);
        let lines = text(&pane);
        assert_eq!(lines[0], "# My Plan");
        assert!(lines.iter().any(|l| l == "Unique preamble content"));
    }

    #[test]
    fn show_all_records_offsets_in_order() {
        let plan = parse(PLAN);
        let mut pane = pane(80, 80);
        pane.show_all(&plan, |_| &[]);

        let ids: Vec<&str> = pane
            .section_offsets
            .iter()
            .map(|s| s.step_id.as_str())
            .collect();
        assert_eq!(ids, ["S1", "S1.1", "S2"]);
        assert!(pane.section_offsets.windows(2).all(|w| w[0].line < w[1].line));

        let lines = text(&pane);
        for section in &pane.section_offsets {
            assert!(lines[section.line].contains(&section.step_id));
        }
        assert!(lines[pane.section_offsets[1].line].starts_with("### S1.1"));
    }

    #[test]
    fn show_all_includes_comments() {
        let plan = parse(PLAN);
        let comments = vec![ReviewComment::new("S2", ActionType::Todo, "Review feedback")];
        let mut pane = pane(80, 80);
        pane.show_all(&plan, |id| if id == "S2" { &comments[..] } else { &[] });
        assert!(text(&pane).iter().any(|l| l.contains("Review feedback")));
    }

    #[test]
    fn show_step_clears_offsets() {
        let plan = parse(PLAN);
        let mut pane = pane(80, 80);
        pane.show_all(&plan, |_| &[]);
        pane.show_step(plan.find_step("S2").expect("S2"), &[]);
        assert_eq!(pane.step_id_at_offset(100), None);
    }

    #[test]
    fn step_id_at_offset_finds_enclosing_section() {
        let pane = with_offsets(&[(5, "S1"), (20, "S2"), (40, "S3")]);
        assert_eq!(pane.step_id_at_offset(0), None);
        assert_eq!(pane.step_id_at_offset(5), Some("S1"));
        assert_eq!(pane.step_id_at_offset(15), Some("S1"));
        assert_eq!(pane.step_id_at_offset(20), Some("S2"));
        assert_eq!(pane.step_id_at_offset(30), Some("S2"));
        assert_eq!(pane.step_id_at_offset(40), Some("S3"));
        assert_eq!(pane.step_id_at_offset(100), Some("S3"));
    }

    #[test]
    fn scroll_to_step_edge_cases() {
        let mut pane = with_offsets(&[(5, "S1"), (20, "S2")]);
        pane.scroll_to_step("S2");
        assert_eq!(pane.y_offset(), 20);
        pane.scroll_to_step("S9");
        assert_eq!(pane.y_offset(), 20);
        pane.scroll_to_step("");
        assert_eq!(pane.y_offset(), 0);
    }

    #[test]
    fn vertical_scroll_is_clamped() {
        let mut pane = with_offsets(&[]);
        pane.scroll_down(500);
        assert_eq!(pane.y_offset(), 90);
        pane.half_page_up();
        assert_eq!(pane.y_offset(), 85);
        pane.goto_top();
        pane.scroll_up(3);
        assert_eq!(pane.y_offset(), 0);
        pane.goto_bottom();
        assert_eq!(pane.y_offset(), 90);
    }

    #[test]
    fn horizontal_scroll_is_clamped() {
        let mut pane = pane(10, 5);
        pane.lines = vec![Line::raw("x".repeat(25))];
        pane.scroll_right(4);
        assert_eq!(pane.x_offset(), 4);
        pane.scroll_to_end();
        assert_eq!(pane.x_offset(), 15);
        pane.scroll_right(4);
        assert_eq!(pane.x_offset(), 15);
        pane.scroll_left(100);
        assert_eq!(pane.x_offset(), 0);
    }

    #[test]
    fn renderer_failure_falls_back_to_source() {
        let plan = parse(PLAN);
        let mut pane = DetailPane::with_renderer(&Theme::dark(), Some(Box::new(FailingRenderer)));
        pane.set_size(80, 20);
        pane.show_step(plan.find_step("S2").expect("S2"), &[]);
        assert_eq!(text(&pane)[0], "## S2: Second");
    }

    #[test]
    fn prose_is_wrapped_to_pane_width() {
        let plan = parse("## Long\none two three four five six seven eight nine ten\n");
        let mut pane = pane(20, 20);
        pane.show_step(plan.find_step("S1").expect("S1"), &[]);
        assert!(text(&pane).iter().all(|l| l.width() <= 18));
    }
}

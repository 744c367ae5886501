//! Markdown to styled terminal lines.
//!
//! [`StyledRenderer`] walks `pulldown-cmark` events and emits owned ratatui
//! `Line`s, highlighting fenced code with syntect. The detail pane talks to it
//! through the [`MarkdownRenderer`] trait and falls back to [`plain_lines`]
//! whenever rendering fails.
//!
//! Prose is expected to be pre-wrapped by `wrap::wrap_prose`, so soft breaks
//! are kept as real line breaks instead of being joined with spaces.

use std::sync::LazyLock;

use anyhow::Context as _;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as CodeTheme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Converts Markdown source into display lines.
pub trait MarkdownRenderer {
    /// # Errors
    ///
    /// Returns an error when the source cannot be rendered; callers are
    /// expected to show [`plain_lines`] instead.
    fn render(&self, markdown: &str) -> anyhow::Result<Vec<Line<'static>>>;
}

/// Raw source lines without styling, used when rendering fails.
pub fn plain_lines(markdown: &str) -> Vec<Line<'static>> {
    markdown.lines().map(|l| Line::raw(l.to_owned())).collect()
}

/// Themed renderer backed by pulldown-cmark and syntect.
pub struct StyledRenderer {
    palette: Theme,
    code_theme: &'static CodeTheme,
}

impl StyledRenderer {
    /// # Errors
    ///
    /// Returns an error if the palette names a syntect theme that is not
    /// bundled with syntect's defaults.
    pub fn new(palette: &Theme) -> anyhow::Result<Self> {
        let code_theme = TS
            .themes
            .get(palette.syntect_theme)
            .with_context(|| format!("syntect theme {:?} is not bundled", palette.syntect_theme))?;
        Ok(Self {
            palette: palette.clone(),
            code_theme,
        })
    }
}

impl MarkdownRenderer for StyledRenderer {
    fn render(&self, markdown: &str) -> anyhow::Result<Vec<Line<'static>>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut writer = LineWriter::new(&self.palette, self.code_theme);
        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(tag) => writer.handle_start(tag),
                Event::End(tag) => writer.handle_end(tag)?,
                Event::Text(text) => writer.add_text(&text),
                Event::Code(code) => writer.add_inline_code(&code),
                Event::Html(html) | Event::InlineHtml(html) => writer.add_text(html.trim_end()),
                Event::SoftBreak | Event::HardBreak => writer.line_break(),
                Event::Rule => writer.add_rule(),
                Event::TaskListMarker(done) => writer.add_task_marker(done),
                _ => {}
            }
        }
        Ok(writer.finish())
    }
}

/// Converts a syntect (Style, &str) pair to an owned ratatui Span.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::{Color as SC, FontStyle};
    let to_color = |c: SC| -> Option<Color> {
        if c.a > 0 {
            Some(Color::Rgb(c.r, c.g, c.b))
        } else {
            None
        }
    };
    let mut ratatui_style = Style::default();
    if let Some(fg) = to_color(style.foreground) {
        ratatui_style = ratatui_style.fg(fg);
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

fn heading_level_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Default)]
struct InlineState {
    emphasis: usize,
    strong: usize,
    strikethrough: usize,
    link: usize,
}

#[derive(Default)]
struct TableState {
    alignments: Vec<Alignment>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

struct ListLevel {
    next_index: Option<u64>,
}

struct LineWriter<'a> {
    palette: &'a Theme,
    code_theme: &'a CodeTheme,

    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,

    inline: InlineState,
    heading: Option<u8>,
    quote_depth: usize,
    lists: Vec<ListLevel>,
    code_block: Option<(String, String)>,
    table: Option<TableState>,
}

impl<'a> LineWriter<'a> {
    fn new(palette: &'a Theme, code_theme: &'a CodeTheme) -> Self {
        Self {
            palette,
            code_theme,
            lines: Vec::new(),
            spans: Vec::new(),
            inline: InlineState::default(),
            heading: None,
            quote_depth: 0,
            lists: Vec::new(),
            code_block: None,
            table: None,
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }

    fn dim(&self) -> Style {
        Style::default().fg(self.palette.rule)
    }

    fn text_style(&self) -> Style {
        if let Some(level) = self.heading {
            let style = Style::default()
                .fg(self.palette.heading)
                .add_modifier(Modifier::BOLD);
            return if level == 1 {
                style.add_modifier(Modifier::UNDERLINED)
            } else {
                style
            };
        }
        let mut style = Style::default();
        if self.inline.emphasis > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.inline.strong > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.inline.strikethrough > 0 {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if self.inline.link > 0 {
            style = style
                .fg(self.palette.link)
                .add_modifier(Modifier::UNDERLINED);
        }
        if self.quote_depth > 0 {
            style = style.fg(self.palette.quote);
        }
        style
    }

    fn push(&mut self, text: impl Into<String>, style: Style) {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span::styled(text, style));
        }
    }

    /// Starts a fresh line with the block quote marker and list indentation.
    fn push_prefix_if_needed(&mut self) {
        if !self.spans.is_empty() {
            return;
        }
        if self.quote_depth > 0 {
            self.push("│ ".repeat(self.quote_depth), self.dim());
        }
        if !self.lists.is_empty() {
            self.push("  ".repeat(self.lists.len()), Style::default());
        }
    }

    fn flush_line(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank_line(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn handle_start(&mut self, tag: Tag<'_>) {
        if let Some(table) = self.table.as_mut() {
            match tag {
                Tag::TableHead | Tag::TableRow => {
                    table.row.clear();
                    return;
                }
                Tag::TableCell => {
                    table.cell.clear();
                    return;
                }
                _ => {}
            }
        }

        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let level = heading_level_u8(level);
                self.heading = Some(level);
                if level > 1 {
                    let marker = format!("{} ", "#".repeat(usize::from(level)));
                    self.push(marker, self.text_style());
                }
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let lang = match kind {
                    CodeBlockKind::Fenced(name) => {
                        name.split_whitespace().next().unwrap_or("").to_owned()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some((lang, String::new()));
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.flush_line();
                }
                self.lists.push(ListLevel { next_index: start });
            }
            Tag::Item => {
                self.flush_line();
                if self.quote_depth > 0 {
                    self.push("│ ".repeat(self.quote_depth), self.dim());
                }
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let bullet = match self.lists.last_mut().and_then(|l| l.next_index.as_mut()) {
                    Some(n) => {
                        let b = format!("{n}. ");
                        *n += 1;
                        b
                    }
                    None => "• ".to_owned(),
                };
                self.push(format!("{indent}{bullet}"), self.dim());
            }
            Tag::Emphasis => self.inline.emphasis += 1,
            Tag::Strong => self.inline.strong += 1,
            Tag::Strikethrough => self.inline.strikethrough += 1,
            Tag::Link { .. } => self.inline.link += 1,
            Tag::Image { .. } => {
                self.push_prefix_if_needed();
                self.push("[image: ", self.dim());
            }
            Tag::Table(alignments) => {
                self.flush_line();
                self.table = Some(TableState {
                    alignments,
                    ..TableState::default()
                });
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, tag: TagEnd) -> anyhow::Result<()> {
        if let Some(table) = self.table.as_mut() {
            match tag {
                TagEnd::TableCell => {
                    let cell = std::mem::take(&mut table.cell);
                    table.row.push(cell.trim().to_owned());
                    return Ok(());
                }
                TagEnd::TableRow => {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                    return Ok(());
                }
                TagEnd::TableHead => {
                    // The header row's cells arrive without a TableRow wrapper.
                    table.header = std::mem::take(&mut table.row);
                    return Ok(());
                }
                TagEnd::Table => {
                    if let Some(table) = self.table.take() {
                        self.render_table(&table);
                    }
                    self.blank_line();
                    return Ok(());
                }
                _ => {}
            }
        }

        match tag {
            TagEnd::Paragraph => self.blank_line(),
            TagEnd::Heading(_) => {
                self.heading = None;
                self.blank_line();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                if let Some((lang, code)) = self.code_block.take() {
                    self.render_code_block(&lang, &code)?;
                }
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Emphasis => self.inline.emphasis = self.inline.emphasis.saturating_sub(1),
            TagEnd::Strong => self.inline.strong = self.inline.strong.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.inline.strikethrough = self.inline.strikethrough.saturating_sub(1);
            }
            TagEnd::Link => self.inline.link = self.inline.link.saturating_sub(1),
            TagEnd::Image => self.push("]", self.dim()),
            _ => {}
        }
        Ok(())
    }

    fn add_text(&mut self, text: &str) {
        if let Some((_, buf)) = self.code_block.as_mut() {
            buf.push_str(text);
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(text);
            return;
        }
        self.push_prefix_if_needed();
        self.push(text, self.text_style());
    }

    fn add_inline_code(&mut self, code: &str) {
        if let Some(table) = self.table.as_mut() {
            table.cell.push_str(code);
            return;
        }
        self.push_prefix_if_needed();
        self.push(code, Style::default().fg(self.palette.inline_code));
    }

    fn line_break(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.cell.push(' ');
            return;
        }
        self.flush_line();
    }

    fn add_rule(&mut self) {
        self.flush_line();
        self.push("─".repeat(40), self.dim());
        self.blank_line();
    }

    fn add_task_marker(&mut self, done: bool) {
        let marker = if done { "[x] " } else { "[ ] " };
        self.push(marker, self.dim());
    }

    fn render_code_block(&mut self, lang: &str, code: &str) -> anyhow::Result<()> {
        let syntax = PS
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| PS.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, self.code_theme);

        for line in LinesWithEndings::from(code) {
            let ranges = highlighter
                .highlight_line(line, &PS)
                .with_context(|| format!("highlighting {lang:?} code block"))?;
            self.push_prefix_if_needed();
            self.push("  ", Style::default());
            for (style, text) in ranges {
                let text = text.trim_end_matches(['\n', '\r']);
                if !text.is_empty() {
                    self.spans.push(syntect_to_span(style, text));
                }
            }
            // Keep empty code lines as real blank lines.
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
        Ok(())
    }

    fn render_table(&mut self, table: &TableState) {
        let mut rows: Vec<&Vec<String>> = Vec::new();
        if !table.header.is_empty() {
            rows.push(&table.header);
        }
        rows.extend(table.rows.iter());

        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if cols == 0 {
            return;
        }
        let mut widths = vec![3usize; cols];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let header_style = Style::default()
            .fg(self.palette.heading)
            .add_modifier(Modifier::BOLD);
        for (n, row) in rows.iter().enumerate() {
            self.push_prefix_if_needed();
            let style = if n == 0 && !table.header.is_empty() {
                header_style
            } else {
                Style::default()
            };
            let cells: Vec<String> = (0..cols)
                .map(|i| {
                    let cell = row.get(i).map_or("", String::as_str);
                    let pad = widths[i].saturating_sub(cell.width());
                    match table.alignments.get(i) {
                        Some(Alignment::Right) => format!("{}{cell}", " ".repeat(pad)),
                        Some(Alignment::Center) => {
                            format!("{}{cell}{}", " ".repeat(pad / 2), " ".repeat(pad - pad / 2))
                        }
                        _ => format!("{cell}{}", " ".repeat(pad)),
                    }
                })
                .collect();
            self.push(format!("│ {} │", cells.join(" │ ")), style);
            self.flush_line();

            if n == 0 && !table.header.is_empty() {
                let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
                self.push(format!("├─{}─┤", sep.join("─┼─")), self.dim());
                self.flush_line();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn render(md: &str) -> Vec<String> {
        let renderer = StyledRenderer::new(&Theme::dark()).unwrap();
        text_of(&renderer.render(md).unwrap())
    }

    #[test]
    fn headings_and_paragraphs() {
        let out = render("# Title\n\n## S1: Auth\n\nSome text.\n");
        assert_eq!(out, ["Title", "", "## S1: Auth", "", "Some text."]);
    }

    #[test]
    fn soft_breaks_are_kept() {
        let out = render("first line\nsecond line\n");
        assert_eq!(out, ["first line", "second line"]);
    }

    #[test]
    fn lists_get_bullets_and_numbers() {
        let out = render("- one\n- two\n\n3. three\n4. four\n");
        assert_eq!(out, ["• one", "• two", "", "3. three", "4. four"]);
    }

    #[test]
    fn code_block_lines_are_indented() {
        let out = render("```rust\nfn main() {}\n\nlet x = 1;\n```\n");
        assert_eq!(out, ["  fn main() {}", "  ", "  let x = 1;"]);
    }

    #[test]
    fn tables_are_aligned() {
        let out = render("| a | long |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(out[0], "│ a   │ long │");
        assert_eq!(out[1], "├─────┼──────┤");
        assert_eq!(out[2], "│ 1   │ 2    │");
    }

    #[test]
    fn inline_code_is_styled() {
        let renderer = StyledRenderer::new(&Theme::dark()).unwrap();
        let lines = renderer.render("use `cargo` here").unwrap();
        let code = lines[0].spans.iter().find(|s| s.content == "cargo").unwrap();
        assert_eq!(code.style.fg, Some(Theme::dark().inline_code));
    }

    #[test]
    fn plain_lines_keep_source() {
        let lines = plain_lines("a\n**b**");
        assert_eq!(text_of(&lines), ["a", "**b**"]);
    }

    #[test]
    fn unknown_code_theme_is_an_error() {
        let mut theme = Theme::dark();
        theme.syntect_theme = "does-not-exist";
        assert!(StyledRenderer::new(&theme).is_err());
    }
}

//! Minimal editable text buffer used by the comment editor and the search bar.
//!
//! Holds one or more lines plus a cursor addressed by `(row, column)` in chars.
//! Key handling understands the usual readline-style motions so both the
//! multi-line comment body and the single-line search prompt behave the same.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone)]
pub struct TextInput {
    lines: Vec<String>,
    row: usize,
    col: usize,
    multiline: bool,
    /// Maximum number of chars across all lines; zero means unlimited.
    char_limit: usize,
    placeholder: String,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::multiline()
    }
}

/// Byte offset of the `col`-th char in `line`, or the line length past the end.
fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl TextInput {
    /// A buffer where `Enter` inserts a newline.
    pub fn multiline() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            multiline: true,
            char_limit: 0,
            placeholder: String::new(),
        }
    }

    /// A buffer that never contains a newline. `Enter` is left to the caller.
    pub fn single_line() -> Self {
        Self {
            multiline: false,
            ..Self::multiline()
        }
    }

    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Full contents with lines joined by `\n`.
    pub fn value(&self) -> String {
        self.lines.join("\n")
    }

    /// Replaces the contents and moves the cursor to the very end.
    pub fn set_value(&mut self, value: &str) {
        self.lines = if self.multiline {
            value.split('\n').map(str::to_owned).collect()
        } else {
            vec![value.replace('\n', " ")]
        };
        if self.char_limit > 0 {
            self.truncate_to_limit();
        }
        self.row = self.lines.len() - 1;
        self.col = char_len(&self.lines[self.row]);
    }

    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.row = 0;
        self.col = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Cursor position as `(row, column)` in chars.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn total_chars(&self) -> usize {
        self.lines.iter().map(|l| char_len(l)).sum::<usize>() + self.lines.len() - 1
    }

    fn truncate_to_limit(&mut self) {
        let mut budget = self.char_limit;
        let mut kept = Vec::new();
        for line in self.lines.drain(..) {
            let n = char_len(&line);
            if n >= budget {
                kept.push(line.chars().take(budget).collect());
                break;
            }
            budget -= n + 1;
            kept.push(line);
        }
        self.lines = kept;
    }

    fn has_room(&self) -> bool {
        self.char_limit == 0 || self.total_chars() < self.char_limit
    }

    // -----------------------------------------------------------------------
    // Editing primitives
    // -----------------------------------------------------------------------

    pub fn insert_char(&mut self, c: char) {
        if !self.has_room() {
            return;
        }
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.insert(at, c);
        self.col += 1;
    }

    pub fn insert_newline(&mut self) {
        if !self.multiline || !self.has_room() {
            return;
        }
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);
        self.row += 1;
        self.col = 0;
        self.lines.insert(self.row, rest);
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col - 1);
            line.remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        let len = char_len(&self.lines[self.row]);
        if self.col < len {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col);
            line.remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    /// Deletes from the cursor back to the start of the previous word.
    pub fn delete_word_back(&mut self) {
        if self.col == 0 {
            self.backspace();
            return;
        }
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        let mut start = self.col;
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        let line = &mut self.lines[self.row];
        let from = byte_index(line, start);
        let to = byte_index(line, self.col);
        line.replace_range(from..to, "");
        self.col = start;
    }

    pub fn delete_to_line_start(&mut self) {
        let line = &mut self.lines[self.row];
        let to = byte_index(line, self.col);
        line.replace_range(..to, "");
        self.col = 0;
    }

    pub fn delete_to_line_end(&mut self) {
        let line = &mut self.lines[self.row];
        let from = byte_index(line, self.col);
        line.truncate(from);
    }

    // -----------------------------------------------------------------------
    // Motions
    // -----------------------------------------------------------------------

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(&self.lines[self.row]);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < char_len(&self.lines[self.row]) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(char_len(&self.lines[self.row]));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(char_len(&self.lines[self.row]));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = char_len(&self.lines[self.row]);
    }

    /// Applies one key press. Returns `true` when the contents changed.
    ///
    /// Keys the buffer does not understand (Esc, Tab, most control chords) are
    /// ignored so the owning widget can bind them.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let before = self.lines.clone();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('a') if ctrl => self.move_home(),
            KeyCode::Char('e') if ctrl => self.move_end(),
            KeyCode::Char('b') if ctrl => self.move_left(),
            KeyCode::Char('f') if ctrl => self.move_right(),
            KeyCode::Char('h') if ctrl => self.backspace(),
            KeyCode::Char('u') if ctrl => self.delete_to_line_start(),
            KeyCode::Char('k') if ctrl => self.delete_to_line_end(),
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Char(c) if !ctrl && !alt => self.insert_char(c),
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace if alt => self.delete_word_back(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }

        self.lines != before
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Draws the buffer into `area`, scrolled so the cursor row is visible.
    ///
    /// When `focused` is set the terminal cursor is placed at the edit point.
    /// An empty buffer shows the placeholder in `placeholder_style`.
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        style: Style,
        placeholder_style: Style,
        focused: bool,
    ) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let height = area.height as usize;
        let top = self.row.saturating_sub(height - 1);

        let line = &self.lines[self.row];
        let prefix_width = line[..byte_index(line, self.col)].width();
        let left = if self.multiline {
            0
        } else {
            prefix_width.saturating_sub(area.width as usize - 1)
        };

        let lines: Vec<Line> = if self.is_empty() && !self.placeholder.is_empty() {
            vec![Line::from(Span::styled(self.placeholder.clone(), placeholder_style))]
        } else {
            self.lines
                .iter()
                .skip(top)
                .take(height)
                .map(|l| Line::from(Span::styled(l.clone(), style)))
                .collect()
        };

        frame.render_widget(
            Paragraph::new(lines).scroll((0, left.min(u16::MAX as usize) as u16)),
            area,
        );

        if focused {
            let x = (prefix_width - left).min(area.width as usize - 1);
            let y = self.row - top;
            frame.set_cursor_position(Position {
                x: area.x + x as u16,
                y: area.y + y as u16,
            });
        }
    }
}

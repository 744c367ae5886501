//! Display-width-aware prose wrapping for Markdown source.
//!
//! Lines are measured in terminal cells with `unicode-width`, so CJK and other
//! wide characters wrap at the right column. Fenced code blocks (```` ``` ````
//! or `~~~`) pass through untouched.

use unicode_width::UnicodeWidthStr;

/// Wraps every over-long prose line in `md` to `width` cells.
///
/// A `width` of zero disables wrapping.
pub fn wrap_prose(md: &str, width: usize) -> String {
    if width == 0 {
        return md.to_owned();
    }

    let mut out: Vec<String> = Vec::new();
    let mut fence: Option<&str> = None;

    for line in md.split('\n') {
        let trimmed = line.trim();
        match fence {
            None if trimmed.starts_with("```") || trimmed.starts_with("~~~") => {
                fence = Some(&trimmed[..3]);
                out.push(line.to_owned());
            }
            Some(marker) if trimmed.starts_with(marker) => {
                fence = None;
                out.push(line.to_owned());
            }
            Some(_) => out.push(line.to_owned()),
            None if line.width() <= width => out.push(line.to_owned()),
            None => out.extend(soft_wrap_line(line, width)),
        }
    }

    out.join("\n")
}

/// Breaks one line at word boundaries so each piece fits in `width` cells.
///
/// Leading whitespace is repeated on every continuation line. A single word
/// wider than the available space is kept whole on its own line.
pub fn soft_wrap_line(line: &str, width: usize) -> Vec<String> {
    let body = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - body.len()];

    let mut words = body.split_whitespace();
    let Some(first) = words.next() else {
        return vec![line.to_owned()];
    };

    let available = width.saturating_sub(indent.width()).max(1);

    let mut lines = Vec::new();
    let mut current = first.to_owned();
    let mut current_width = first.width();
    for word in words {
        let w = word.width();
        if current_width + 1 + w > available {
            lines.push(format!("{indent}{current}"));
            current = word.to_owned();
            current_width = w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + w;
        }
    }
    lines.push(format!("{indent}{current}"));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_are_untouched() {
        assert_eq!(wrap_prose("one two\nthree", 20), "one two\nthree");
    }

    #[test]
    fn long_line_wraps_at_words() {
        assert_eq!(
            soft_wrap_line("alpha beta gamma delta", 11),
            ["alpha beta", "gamma delta"]
        );
    }

    #[test]
    fn indent_is_preserved() {
        assert_eq!(
            soft_wrap_line("    - item with words", 14),
            ["    - item", "    with words"]
        );
    }

    #[test]
    fn wide_characters_use_display_width() {
        // Each of these characters is two cells wide.
        let wrapped = soft_wrap_line("日本語 日本語 日本語", 14);
        assert_eq!(wrapped, ["日本語 日本語", "日本語"]);
        assert!(wrapped.iter().all(|l| l.width() <= 14));
    }

    #[test]
    fn fenced_code_is_not_wrapped() {
        let md = "```\nthis line is far too long to fit\n```\nthis line is far too long to fit";
        let out = wrap_prose(md, 10);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "this line is far too long to fit");
        assert!(lines[4..].iter().all(|l| l.width() <= 10));
    }

    #[test]
    fn tilde_fence_needs_matching_marker() {
        let md = "~~~\n``` not a close\nlong long long long\n~~~\nlong long long long";
        let out = wrap_prose(md, 9);
        assert!(out.contains("\nlong long long long\n~~~"));
        assert!(out.ends_with("long long\nlong long"));
    }

    #[test]
    fn zero_width_disables_wrapping() {
        assert_eq!(wrap_prose("a b c", 0), "a b c");
    }
}

//! Markdown plan parser.
//!
//! Walks heading events from `pulldown-cmark` and slices the source between
//! consecutive heading lines to obtain step bodies. Nesting is derived from
//! heading levels with a stack of open steps, then IDs are assigned in a
//! single depth-first pass so they reflect the built tree, not the raw levels.

use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use thiserror::Error;

use crate::types::{Plan, Step, StepIdx};

/// Errors produced while turning plan bytes into a [`Plan`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("plan file is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// One heading found in the source, before hierarchy is applied.
struct HeadingInfo {
    level: u8,
    title: String,
    /// Byte offset of the start of the heading line (before the `#` markers).
    start: usize,
    /// Byte offset just past the heading line, including its newline.
    end: usize,
}

/// Parses raw bytes into a [`Plan`].
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] when `source` is not UTF-8.
pub fn parse_bytes(source: &[u8]) -> Result<Plan, ParseError> {
    let text = std::str::from_utf8(source)?;
    Ok(parse(text))
}

/// Parses Markdown source into a [`Plan`].
///
/// The first level-1 heading becomes the plan title and its body is folded
/// into the preamble. Every other heading becomes a step.
pub fn parse(source: &str) -> Plan {
    let headings = collect_headings(source);
    let mut plan = Plan::default();

    let Some(first) = headings.first() else {
        plan.preamble = source.trim().to_owned();
        return plan;
    };
    if first.start > 0 {
        plan.preamble = source[..first.start].trim().to_owned();
    }

    let mut flat = Vec::with_capacity(headings.len());
    for (i, h) in headings.iter().enumerate() {
        let body_end = headings.get(i + 1).map_or(source.len(), |next| next.start);
        let body = if h.end < body_end {
            source[h.end..body_end].trim().to_owned()
        } else {
            String::new()
        };

        if h.level == 1 && plan.title.is_empty() {
            plan.title = h.title.clone();
            if !body.is_empty() {
                if plan.preamble.is_empty() {
                    plan.preamble = body;
                } else {
                    plan.preamble = format!("{}\n\n{}", plan.preamble, body);
                }
            }
            continue;
        }

        flat.push(Step {
            level: h.level,
            title: h.title.clone(),
            body,
            ..Step::default()
        });
    }

    build_hierarchy(&mut plan, flat);
    tracing::debug!(steps = plan.len(), title = %plan.title, "parsed plan");
    plan
}

/// Collects every heading with its title text and line span.
fn collect_headings(source: &str) -> Vec<HeadingInfo> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut headings = Vec::new();
    let mut current: Option<(u8, Range<usize>, String)> = None;

    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((heading_level_u8(level), range, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, span, title)) = current.take() {
                    headings.push(HeadingInfo {
                        level,
                        title: title.trim().to_owned(),
                        start: line_start(source, span.start),
                        end: line_end(source, span.end),
                    });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push(' ');
                }
            }
            _ => {}
        }
    }

    headings
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

/// Moves `pos` back to the first byte of its line.
fn line_start(source: &str, pos: usize) -> usize {
    source[..pos].rfind('\n').map_or(0, |nl| nl + 1)
}

/// Moves `pos` forward past the end of its line, including the newline.
fn line_end(source: &str, pos: usize) -> usize {
    let pos = pos.min(source.len());
    if pos > 0 && source.as_bytes()[pos - 1] == b'\n' {
        return pos;
    }
    source[pos..].find('\n').map_or(source.len(), |nl| pos + nl + 1)
}

/// Links flat steps into a tree and assigns hierarchical IDs.
///
/// Headings arrive in document order and each one attaches to the innermost
/// open step with a strictly lower level, so document order is also the
/// pre-order of the resulting tree and the arena needs no reordering.
fn build_hierarchy(plan: &mut Plan, flat: Vec<Step>) {
    let mut open: Vec<StepIdx> = Vec::new();

    for step in flat {
        let idx = StepIdx(plan.steps.len());
        let level = step.level;
        plan.steps.push(step);

        while let Some(&top) = open.last() {
            if plan.step(top).level < level {
                break;
            }
            open.pop();
        }

        match open.last().copied() {
            Some(parent) => {
                plan.step_mut(idx).parent = Some(parent);
                plan.step_mut(parent).children.push(idx);
            }
            None => plan.roots.push(idx),
        }
        open.push(idx);
    }

    let roots = plan.roots.clone();
    assign_ids(plan, &roots, "");
}

fn assign_ids(plan: &mut Plan, siblings: &[StepIdx], prefix: &str) {
    for (i, idx) in siblings.iter().enumerate() {
        let id = if prefix.is_empty() {
            format!("S{}", i + 1)
        } else {
            format!("{}.{}", prefix, i + 1)
        };
        let children = plan.step(*idx).children.clone();
        plan.step_mut(*idx).id = id.clone();
        assign_ids(plan, &children, &id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(plan: &Plan) -> Vec<&str> {
        plan.all_steps().map(|(_, s)| s.id.as_str()).collect()
    }

    #[test]
    fn title_preamble_and_steps() {
        let src = "# My Plan\n\nIntro text.\n\n## First\n\nBody one.\n\n## Second\n\nBody two.\n";
        let plan = parse(src);
        assert_eq!(plan.title, "My Plan");
        assert_eq!(plan.preamble, "Intro text.");
        assert_eq!(ids(&plan), ["S1", "S2"]);
        assert_eq!(plan.steps[0].title, "First");
        assert_eq!(plan.steps[0].body, "Body one.");
        assert_eq!(plan.steps[1].body, "Body two.");
    }

    #[test]
    fn text_before_title_is_preamble() {
        let plan = parse("Leading words\n\n# Title\n\nMore words\n\n## Step\n");
        assert_eq!(plan.title, "Title");
        assert_eq!(plan.preamble, "Leading words\n\nMore words");
    }

    #[test]
    fn no_headings_gives_preamble_only() {
        let plan = parse("  just some text\n");
        assert!(plan.title.is_empty());
        assert_eq!(plan.preamble, "just some text");
        assert!(plan.is_empty());
    }

    #[test]
    fn nested_ids_follow_tree_depth() {
        let src = "## A\n### A1\n#### A1a\n### A2\n## B\n";
        let plan = parse(src);
        assert_eq!(ids(&plan), ["S1", "S1.1", "S1.1.1", "S1.2", "S2"]);
        let a2 = plan.find_index("S1.2").unwrap();
        assert_eq!(plan.step(a2).parent, plan.find_index("S1"));
        assert_eq!(plan.depth(a2), 1);
    }

    #[test]
    fn orphan_deep_heading_becomes_top_level() {
        let plan = parse("### Deep first\n## Shallow\n### Child\n");
        assert_eq!(ids(&plan), ["S1", "S2", "S2.1"]);
        assert_eq!(plan.steps[0].level, 3);
        assert!(plan.steps[0].parent.is_none());
    }

    #[test]
    fn second_h1_is_a_step() {
        let plan = parse("# Title\n## One\n# Another\n");
        assert_eq!(plan.title, "Title");
        assert_eq!(ids(&plan), ["S1", "S2"]);
        assert_eq!(plan.steps[1].title, "Another");
    }

    #[test]
    fn heading_inside_code_fence_is_body() {
        let src = "## Step\n\n```sh\n# not a heading\n```\n";
        let plan = parse(src);
        assert_eq!(plan.len(), 1);
        assert!(plan.steps[0].body.contains("# not a heading"));
    }

    #[test]
    fn inline_code_in_heading_title() {
        let plan = parse("## Update `main.rs` entry\n");
        assert_eq!(plan.steps[0].title, "Update main.rs entry");
    }

    #[test]
    fn ids_are_unique() {
        let src = "## A\n### B\n### C\n## D\n### E\n#### F\n## G\n";
        let plan = parse(src);
        let mut seen = std::collections::HashSet::new();
        for (idx, step) in plan.all_steps() {
            assert!(seen.insert(step.id.clone()), "duplicate id {}", step.id);
            assert_eq!(step.id.matches('.').count(), plan.depth(idx));
        }
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(parse_bytes(&[0xff, 0xfe, b'#']).is_err());
    }
}

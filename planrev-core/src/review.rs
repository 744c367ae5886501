//! Markdown formatting of a finished review.

use std::fmt::Write as _;

use crate::types::{Plan, ReviewComment, ReviewResult};

/// Formats `result` as a Markdown document addressed to `file_path`.
///
/// Comments on the same step are grouped under one `## {id}: {title}`
/// heading, with groups in first-seen order. Returns an empty string when the
/// result carries no comments.
pub fn format_review(result: &ReviewResult, plan: &Plan, file_path: &str) -> String {
    if result.comments.is_empty() {
        return String::new();
    }

    let target = if file_path.is_empty() {
        "the file"
    } else {
        file_path
    };

    let mut groups: Vec<(&str, Vec<&ReviewComment>)> = Vec::new();
    for comment in &result.comments {
        match groups.iter_mut().find(|(id, _)| *id == comment.step_id) {
            Some((_, list)) => list.push(comment),
            None => groups.push((&comment.step_id, vec![comment])),
        }
    }

    let mut out = String::from("# Plan Review\n\n");
    let _ = writeln!(
        out,
        "Please review and address the following comments on: {target}"
    );

    for (id, comments) in groups {
        match plan.find_step(id) {
            Some(step) => {
                let _ = write!(out, "\n## {}: {}\n", id, step.title);
            }
            None => {
                let _ = write!(out, "\n## {id}\n");
            }
        }
        for c in comments {
            let _ = writeln!(out, "[{}] {}", c.action, c.body);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::{ActionType, Status};

    #[test]
    fn empty_result_formats_to_nothing() {
        let plan = parse("## Auth\n");
        let result = ReviewResult::default();
        assert_eq!(format_review(&result, &plan, "plan.md"), "");
    }

    #[test]
    fn groups_comments_under_one_heading() {
        let plan = parse("# Plan\n## Auth\n## Storage\n");
        let result = ReviewResult {
            comments: vec![
                ReviewComment::new("S1", ActionType::Suggestion, "fix this"),
                ReviewComment::new("S1", ActionType::Issue, "and this"),
                ReviewComment::new("S2", ActionType::Question, "why?"),
            ],
            status: Status::Submitted,
        };
        let out = format_review(&result, &plan, "plan.md");
        assert_eq!(
            out,
            "# Plan Review\n\n\
             Please review and address the following comments on: plan.md\n\
             \n## S1: Auth\n[suggestion] fix this\n[issue] and this\n\
             \n## S2: Storage\n[question] why?\n"
        );
        assert_eq!(out.matches("## S1: Auth").count(), 1);
    }

    #[test]
    fn missing_step_and_file_fallbacks() {
        let plan = parse("## Only\n");
        let result = ReviewResult {
            comments: vec![ReviewComment::new("S9", ActionType::Note, "gone")],
            status: Status::Submitted,
        };
        let out = format_review(&result, &plan, "");
        assert!(out.contains("comments on: the file\n"));
        assert!(out.contains("\n## S9\n[note] gone\n"));
    }
}

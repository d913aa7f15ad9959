use crate::ast::Module;
use crate::diagnostics::Applicability;
use crate::fix::TextEdit;
use crate::lint::{FixDescriptor, LintCategory, LintContext, LintDescriptor, LintRule};
use crate::locator::span_of;

use super::util::{matched_len, starts_with_ignore_case, suggestion};

// ============================================================================
// LinkPartCommentSpaceLint
// ============================================================================

pub struct LinkPartCommentSpaceLint;

static LINK_PART_COMMENT_SPACE: LintDescriptor = LintDescriptor::with_fix(
    "link_part_comment_space",
    LintCategory::CodeStyle,
    "A link in a documentation comment needs a space after `See`",
    FixDescriptor::safe("Separate the link keyword from the link with a single space"),
);

const LINK_KEYWORDS: &[&str] = &["См.", "See"];

impl LintRule for LinkPartCommentSpaceLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &LINK_PART_COMMENT_SPACE
    }

    fn check(&self, module: &Module, ctx: &mut LintContext<'_>) {
        let lint = &LINK_PART_COMMENT_SPACE;
        for method in module.methods() {
            if method.doc_comment.is_none() {
                continue;
            }
            if let Err(err) = ctx.checkpoint() {
                ctx.skip(lint, &err);
                return;
            }
            let comment = match span_of(module, &method.doc_comment) {
                Ok(comment) => comment,
                Err(err) => {
                    ctx.skip(lint, &err);
                    continue;
                }
            };

            for issue in link_spacing_issues(comment.raw_text) {
                let base = comment.start_offset;
                let mut edit = issue.edit;
                edit.anchor += base;
                ctx.report_with_suggestion(
                    lint,
                    base + issue.offset,
                    issue.length,
                    "Link keyword must be followed by a space",
                    Some(suggestion(
                        "separate the link with a space",
                        edit,
                        Applicability::MachineApplicable,
                    )),
                );
            }
        }
    }
}

/// A badly separated link, with offsets relative to the comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpacingIssue {
    pub offset: usize,
    pub length: usize,
    pub edit: TextEdit,
}

/// Find link keywords in `comment` not followed by whitespace.
///
/// Directly attached link text (`См.Модуль`) is reported on the keyword's
/// last character and the following one, and fixed by inserting a space.
/// Punctuation between keyword and link (`См.:Модуль`) is reported on the
/// punctuation run, which the fix replaces with a space.
pub fn link_spacing_issues(comment: &str) -> Vec<LinkSpacingIssue> {
    let mut issues = Vec::new();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    for (start, _) in comment.char_indices() {
        let rest = &comment[start..];
        let Some(keyword) = LINK_KEYWORDS
            .iter()
            .find(|k| starts_with_ignore_case(rest, k))
        else {
            continue;
        };
        if comment[..start].chars().next_back().is_some_and(char::is_alphabetic) {
            continue;
        }

        let link_start = start + matched_len(rest, keyword);
        let tail = &comment[link_start..];
        let run_len = tail
            .char_indices()
            .find(|(_, c)| !matches!(c, ':' | '_'))
            .map_or(tail.len(), |(idx, _)| idx);
        let after = tail[run_len..].chars().next();

        // "See" is an ordinary word unless a qualified name follows.
        let link_text = tail[run_len..]
            .split(char::is_whitespace)
            .next()
            .unwrap_or_default();
        if keyword.eq_ignore_ascii_case("See") && !link_text.contains('.') && run_len == 0 {
            continue;
        }

        match (run_len, after) {
            (0, Some(c)) if is_word(c) => {
                let dot = comment[..link_start]
                    .char_indices()
                    .next_back()
                    .map_or(link_start, |(idx, _)| idx);
                let next = link_start + c.len_utf8();
                issues.push(LinkSpacingIssue {
                    offset: dot,
                    length: next - dot,
                    edit: TextEdit::insert(link_start, " "),
                });
            }
            (0, _) => {}
            (len, Some(c)) if c == ' ' || c == '\t' => issues.push(LinkSpacingIssue {
                offset: link_start,
                length: len,
                edit: TextEdit::delete(link_start, link_start + len),
            }),
            (len, Some(c)) if is_word(c) => issues.push(LinkSpacingIssue {
                offset: link_start,
                length: len,
                edit: TextEdit::replace(link_start, link_start + len, " "),
            }),
            _ => {}
        }
    }
    issues
}

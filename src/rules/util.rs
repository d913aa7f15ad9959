use crate::diagnostics::{Applicability, Suggestion};
use crate::fix::TextEdit;

pub(crate) fn suggestion(
    message: impl Into<String>,
    edit: TextEdit,
    applicability: Applicability,
) -> Suggestion {
    Suggestion {
        message: message.into(),
        edit,
        applicability,
    }
}

/// Whether `text` starts with `prefix`, ignoring case.
pub(crate) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut chars = text.chars();
    prefix.chars().all(|p| {
        chars
            .next()
            .is_some_and(|c| c.to_lowercase().eq(p.to_lowercase()))
    })
}

/// Byte length of the prefix of `text` matching `prefix` case-insensitively.
///
/// Lowercasing can change byte lengths, so the prefix is measured on `text`.
pub(crate) fn matched_len(text: &str, prefix: &str) -> usize {
    text.char_indices()
        .nth(prefix.chars().count())
        .map_or(text.len(), |(idx, _)| idx)
}

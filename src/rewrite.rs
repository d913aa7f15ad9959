//! Rewrite modal calls into their asynchronous equivalents.

use crate::calls::{CanonicalCallEntry, EditExtent, RewriteStyle};
use crate::debug_event;
use crate::error::AnalysisError;
use crate::fix::TextEdit;
use crate::project::ScriptVariant;
use crate::scope::CallSite;

/// Edit replacing `call` with the replacement of `entry`, spelled per `variant`.
///
/// Returns `None`, never a partial edit, when the call text cannot be
/// taken apart or the entry has no rewrite template.
pub fn rewrite(
    call: &CallSite<'_>,
    entry: &CanonicalCallEntry,
    variant: ScriptVariant,
) -> Option<TextEdit> {
    match plan_rewrite(call, entry, variant) {
        Ok(edit) => Some(edit),
        Err(err) => {
            debug_event!(
                call = entry.id.as_str(),
                line = call.span.line_number,
                error = %err,
                "no rewrite for call"
            );
            None
        }
    }
}

/// Fallible core of [`rewrite`].
pub fn plan_rewrite(
    call: &CallSite<'_>,
    entry: &CanonicalCallEntry,
    variant: ScriptVariant,
) -> Result<TextEdit, AnalysisError> {
    let template = entry.rewrite.ok_or_else(|| {
        AnalysisError::malformed(format!("`{}` has no rewrite template", entry.id.as_str()))
    })?;

    let raw = call.span.raw_text;
    let name = call.name_range()?;

    // A member-access dot directly before the name is replaced and re-emitted.
    let prefix_len = usize::from(raw[..name.start].ends_with('.'));
    let anchor = name.start - prefix_len;
    let prefix = &raw[anchor..name.start];

    let open = raw[name.end..]
        .find('(')
        .map(|idx| name.end + idx)
        .ok_or_else(|| AnalysisError::malformed(raw))?;
    let close = raw
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| AnalysisError::malformed(raw))?;
    let args = &raw[open + 1..close];

    let new_name = template.replacement(variant);
    let replacement = match template.style {
        RewriteStyle::PassthroughArgs => format!("{prefix}{new_name}({args})"),
        RewriteStyle::CommaPrefixArgs => format!("{prefix}{new_name}(,{args})"),
        RewriteStyle::SelectorSuffix => format!("{prefix}{new_name}(,"),
    };
    let end = match template.extent {
        EditExtent::ThroughCallEnd => close + 1,
        EditExtent::ThroughOpenParen => open + 1,
    };

    Ok(TextEdit::replace(
        call.span.start_offset + anchor,
        call.span.start_offset + end,
        replacement,
    ))
}

//! Auto-fix application module.
//!
//! Collects the edits carried by diagnostic suggestions and applies them to a
//! module source.

use crate::diagnostics::{Applicability, Diagnostic};
use crate::fix::{FixError, TextEdit, apply_fixes};
use std::path::{Path, PathBuf};

/// Result of applying fixes to a source file.
#[derive(Debug)]
pub struct FixResult {
    /// The modified source code.
    pub fixed_source: String,
    /// Number of fixes applied.
    pub fixes_applied: usize,
    /// Suggestions held back because they need `allow_unsafe`.
    pub skipped_unsafe: usize,
    /// Suggestions dropped for overlapping an earlier fix, pointing outside
    /// the source, or having unspecified applicability.
    pub skipped_other: usize,
}

impl FixResult {
    pub fn fixes_skipped(&self) -> usize {
        self.skipped_unsafe + self.skipped_other
    }
}

/// Apply the suggestions carried by `diagnostics` to `source`.
///
/// Machine-applicable suggestions are always taken; `MaybeIncorrect` and
/// `HasPlaceholders` ones only with `allow_unsafe`. A suggestion overlapping
/// one accepted earlier is skipped until the fixed text is linted again.
pub fn apply_suggestions(
    source: &str,
    diagnostics: &[Diagnostic],
    allow_unsafe: bool,
) -> Result<FixResult, FixError> {
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut skipped_unsafe = 0;
    let mut skipped_other = 0;

    for diag in diagnostics {
        let Some(suggestion) = &diag.suggestion else {
            continue;
        };

        match suggestion.applicability {
            Applicability::MachineApplicable => {}
            Applicability::MaybeIncorrect | Applicability::HasPlaceholders => {
                if !allow_unsafe {
                    skipped_unsafe += 1;
                    continue;
                }
            }
            Applicability::Unspecified => {
                skipped_other += 1;
                continue;
            }
        }

        let edit = &suggestion.edit;
        if edit.validate(source).is_err() || edits.iter().any(|e| e.overlaps_with(edit)) {
            skipped_other += 1;
            continue;
        }
        edits.push(edit.clone());
    }

    let fixed_source = apply_fixes(source, &edits)?;
    Ok(FixResult {
        fixed_source,
        fixes_applied: edits.len(),
        skipped_unsafe,
        skipped_other,
    })
}

/// Where `--fix` writes the fixed text of the module behind `snapshot`.
///
/// The snapshot itself is never rewritten: its spans describe the old text.
pub fn fixed_source_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("bsl")
}

/// Generate a unified diff between original and fixed source.
///
/// Includes context lines (3 lines before and after each change) for better readability.
pub fn format_diff(original: &str, fixed: &str, path: &Path) -> String {
    format_diff_with_context(original, fixed, path, 3)
}

type LineChange<'a> = (usize, Option<&'a str>, Option<&'a str>);

/// Generate a unified diff with configurable context lines.
pub fn format_diff_with_context(
    original: &str,
    fixed: &str,
    path: &Path,
    context: usize,
) -> String {
    use std::fmt::Write;

    let orig_lines: Vec<&str> = original.lines().collect();
    let fixed_lines: Vec<&str> = fixed.lines().collect();
    let max_len = orig_lines.len().max(fixed_lines.len());

    let changes: Vec<LineChange<'_>> = (0..max_len)
        .map(|i| (i, orig_lines.get(i).copied(), fixed_lines.get(i).copied()))
        .filter(|(_, orig, fix)| orig != fix)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    // Group changes into hunks with context
    let mut hunks: Vec<(usize, usize, Vec<LineChange<'_>>)> = Vec::new();
    for change in changes {
        let start = change.0.saturating_sub(context);
        let end = (change.0 + context + 1).min(max_len);
        match hunks.last_mut() {
            Some((_, hunk_end, hunk_changes)) if start <= *hunk_end => {
                *hunk_end = end;
                hunk_changes.push(change);
            }
            _ => hunks.push((start, end, vec![change])),
        }
    }

    let path_str = path.display().to_string();
    let mut output = String::new();
    let _ = writeln!(output, "--- a/{path_str}");
    let _ = writeln!(output, "+++ b/{path_str}");

    for (hunk_start, hunk_end, hunk_changes) in hunks {
        let orig_size = hunk_end.min(orig_lines.len()).saturating_sub(hunk_start);
        let fixed_size = hunk_end.min(fixed_lines.len()).saturating_sub(hunk_start);
        let _ = writeln!(
            output,
            "@@ -{},{} +{},{} @@",
            hunk_start + 1,
            orig_size,
            hunk_start + 1,
            fixed_size
        );

        for line_idx in hunk_start..hunk_end {
            if let Some((_, orig, fix)) = hunk_changes.iter().find(|(i, _, _)| *i == line_idx) {
                if let Some(orig) = orig {
                    let _ = writeln!(output, "-{orig}");
                }
                if let Some(fix) = fix {
                    let _ = writeln!(output, "+{fix}");
                }
            } else if let Some(line) = orig_lines.get(line_idx) {
                let _ = writeln!(output, " {line}");
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Span, Suggestion};
    use crate::level::LintLevel;
    use crate::lint::{LintCategory, LintDescriptor};

    static TEST_LINT: LintDescriptor =
        LintDescriptor::new("test", LintCategory::CodeStyle, "test");

    fn diag(source: &str, edit: TextEdit, applicability: Applicability) -> Diagnostic {
        Diagnostic {
            lint: &TEST_LINT,
            level: LintLevel::Warn,
            file: None,
            span: Span::from_offsets(source, edit.anchor, edit.length),
            message: "test".into(),
            help: None,
            suggestion: Some(Suggestion {
                message: "Replace".into(),
                edit,
                applicability,
            }),
        }
    }

    #[test]
    fn test_apply_single_fix() {
        let source = "Если Вопрос(Текст) Тогда";
        let start = source.find("Вопрос").unwrap();
        let end = source.find(')').unwrap() + 1;
        let edit = TextEdit::replace(start, end, "ПоказатьВопрос(,Текст)");
        let d = diag(source, edit, Applicability::MachineApplicable);

        let result = apply_suggestions(source, &[d], false).unwrap();
        assert_eq!(result.fixed_source, "Если ПоказатьВопрос(,Текст) Тогда");
        assert_eq!(result.fixes_applied, 1);
    }

    #[test]
    fn test_unsafe_fixes_need_opt_in() {
        let source = "Процедура А()\nКонецПроцедуры";
        let edit = TextEdit::replace(0, source.len(), "#Если Сервер Тогда\n...\n#КонецЕсли");
        let d = diag(source, edit, Applicability::MaybeIncorrect);

        let result = apply_suggestions(source, std::slice::from_ref(&d), false).unwrap();
        assert_eq!(result.fixed_source, source);
        assert_eq!((result.skipped_unsafe, result.skipped_other), (1, 0));

        let result = apply_suggestions(source, &[d], true).unwrap();
        assert_eq!(result.fixes_applied, 1);
    }

    #[test]
    fn test_overlapping_fix_is_skipped() {
        let source = "Вопрос(ВвестиСтроку(С));";
        let outer = TextEdit::replace(0, source.len() - 1, "ПоказатьВопрос(,ВвестиСтроку(С))");
        let inner_start = source.find("ВвестиСтроку").unwrap();
        let inner = TextEdit::replace(inner_start, source.len() - 2, "ПоказатьВводСтроки(,С)");
        let diags = [
            diag(source, outer, Applicability::MachineApplicable),
            diag(source, inner, Applicability::MachineApplicable),
        ];

        let result = apply_suggestions(source, &diags, false).unwrap();
        assert_eq!(result.fixed_source, "ПоказатьВопрос(,ВвестиСтроку(С));");
        assert_eq!((result.fixes_applied, result.fixes_skipped()), (1, 1));
        assert_eq!(result.skipped_unsafe, 0);
    }

    #[test]
    fn test_format_diff() {
        let original = "А = 1;\nОткрытьЗначение(А);\nБ = 2;";
        let fixed = "А = 1;\nПоказатьЗначение(,А);\nБ = 2;";
        let path = Path::new("Module.json");

        let diff = format_diff(original, fixed, path);
        assert!(diff.contains("--- a/Module.json"));
        assert!(diff.contains("@@ -1,3 +1,3 @@"));
        assert!(diff.contains("-ОткрытьЗначение(А);"));
        assert!(diff.contains("+ПоказатьЗначение(,А);"));
        assert!(diff.contains(" Б = 2;"));
    }

    #[test]
    fn test_fixed_source_sits_next_to_the_snapshot() {
        assert_eq!(
            fixed_source_path(Path::new("out/ОбщийМодуль.json")),
            PathBuf::from("out/ОбщийМодуль.bsl")
        );
    }

    #[test]
    fn test_identical_sources_have_no_diff() {
        assert!(format_diff("x", "x", Path::new("m.json")).is_empty());
    }
}

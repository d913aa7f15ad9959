use crate::fix::TextEdit;
use crate::level::LintLevel;
use crate::lint::LintDescriptor;
use crate::locator::line_column;

/// A single lint finding produced by BSL Clippy.
#[derive(Debug, Clone)]
#[must_use]
pub struct Diagnostic {
    pub lint: &'static LintDescriptor,
    pub level: LintLevel,
    pub file: Option<String>,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
    pub suggestion: Option<Suggestion>,
}

/// Optional machine- or human-applicable fix for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub message: String,
    pub edit: TextEdit,
    pub applicability: Applicability,
}

/// Applicability of an automated suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    MachineApplicable,
    MaybeIncorrect,
    HasPlaceholders,
    Unspecified,
}

/// Location of a finding: byte range plus 1-based row/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
    pub start: Position,
    pub end: Position,
}

/// Single position in a source file (1-based row, 1-based character column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Span {
    /// Build a span for `length` bytes at `offset` of `source`.
    #[must_use]
    pub fn from_offsets(source: &str, offset: usize, length: usize) -> Self {
        let (row, column) = line_column(source, offset);
        let (end_row, end_column) = line_column(source, offset + length);
        Self {
            offset,
            length,
            start: Position { row, column },
            end: Position {
                row: end_row,
                column: end_column,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_positions_count_characters() {
        let source = "А = 1;\nВопрос(А);";
        let offset = source.find("Вопрос").unwrap();
        let span = Span::from_offsets(source, offset, "Вопрос".len());
        assert_eq!(span.start, Position { row: 2, column: 1 });
        assert_eq!(span.end, Position { row: 2, column: 7 });
        assert_eq!(span.length, 12);
    }
}

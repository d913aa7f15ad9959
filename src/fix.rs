//! Text edits and their application.
//!
//! All functions work on strings and byte offsets - no file I/O.
//!
//! ## Safety Guarantees
//!
//! - Edits are validated to be in bounds, on character boundaries and
//!   non-overlapping before application
//! - Edits are applied in reverse order to preserve byte offsets

use thiserror::Error;

/// Error type for fix application operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    #[error("Overlapping edits detected at byte {0}")]
    OverlappingEdits(usize),

    #[error("Edit range [{start}..{end}) exceeds source length {source_len}")]
    InvalidRange {
        start: usize,
        end: usize,
        source_len: usize,
    },

    #[error("Edit boundary {0} splits a character")]
    NotCharBoundary(usize),
}

/// Replace `length` bytes at `anchor` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextEdit {
    /// Starting byte offset.
    pub anchor: usize,
    /// Number of bytes replaced.
    pub length: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(anchor: usize, length: usize, replacement: impl Into<String>) -> Self {
        Self {
            anchor,
            length,
            replacement: replacement.into(),
        }
    }

    /// Replace the byte range `start..end`.
    pub fn replace(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self::new(start, end.saturating_sub(start), replacement)
    }

    pub fn insert(anchor: usize, text: impl Into<String>) -> Self {
        Self::new(anchor, 0, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, String::new())
    }

    pub fn end(&self) -> usize {
        self.anchor + self.length
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.anchor..self.end()
    }

    /// Returns true if this edit overlaps with another.
    ///
    /// Two insertions at the same anchor also conflict: their order would be
    /// ambiguous.
    pub fn overlaps_with(&self, other: &TextEdit) -> bool {
        if self.length == 0 && other.length == 0 {
            return self.anchor == other.anchor;
        }
        self.anchor < other.end() && other.anchor < self.end()
    }

    pub fn validate(&self, source: &str) -> Result<(), FixError> {
        if self.end() > source.len() {
            return Err(FixError::InvalidRange {
                start: self.anchor,
                end: self.end(),
                source_len: source.len(),
            });
        }
        for boundary in [self.anchor, self.end()] {
            if !source.is_char_boundary(boundary) {
                return Err(FixError::NotCharBoundary(boundary));
            }
        }
        Ok(())
    }
}

/// Validate that a list of edits are non-overlapping and within bounds.
pub fn validate_edits(edits: &[TextEdit], source: &str) -> Result<(), FixError> {
    for edit in edits {
        edit.validate(source)?;
    }

    for i in 0..edits.len() {
        for j in (i + 1)..edits.len() {
            if edits[i].overlaps_with(&edits[j]) {
                return Err(FixError::OverlappingEdits(edits[i].anchor));
            }
        }
    }

    Ok(())
}

/// Apply a list of non-overlapping edits to source code.
///
/// # Example
///
/// ```rust
/// use bsl_clippy::fix::{TextEdit, apply_fixes};
///
/// let source = "ОткрытьЗначение(x, y);";
/// let end = source.find(';').unwrap();
/// let edits = vec![TextEdit::replace(0, end, "ПоказатьЗначение(,x, y)")];
///
/// let result = apply_fixes(source, &edits).unwrap();
/// assert_eq!(result, "ПоказатьЗначение(,x, y);");
/// ```
pub fn apply_fixes(source: &str, edits: &[TextEdit]) -> Result<String, FixError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    validate_edits(edits, source)?;

    let mut sorted_edits = edits.to_vec();
    sorted_edits.sort_by(|a, b| b.anchor.cmp(&a.anchor));

    let mut result = source.to_string();
    for edit in sorted_edits {
        result.replace_range(edit.range(), &edit.replacement);
    }

    Ok(result)
}

/// Apply a single edit to source code (convenience wrapper).
pub fn apply_fix(source: &str, edit: &TextEdit) -> Result<String, FixError> {
    apply_fixes(source, std::slice::from_ref(edit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_edit_constructors() {
        let edit = TextEdit::replace(3, 8, "x");
        assert_eq!((edit.anchor, edit.length, edit.end()), (3, 5, 8));

        let edit = TextEdit::insert(5, " ");
        assert_eq!(edit.length, 0);

        let edit = TextEdit::delete(10, 20);
        assert_eq!(edit.range(), 10..20);
        assert_eq!(edit.replacement, "");
    }

    #[test]
    fn test_overlaps_with() {
        let edit1 = TextEdit::replace(0, 10, "a");
        let edit2 = TextEdit::replace(5, 15, "b");
        let edit3 = TextEdit::replace(10, 20, "c");

        assert!(edit1.overlaps_with(&edit2));
        assert!(edit2.overlaps_with(&edit1));
        assert!(!edit1.overlaps_with(&edit3));
        assert!(!edit3.overlaps_with(&edit1));
        assert!(TextEdit::insert(4, "x").overlaps_with(&TextEdit::insert(4, "y")));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let edit = TextEdit::replace(0, 15, "hello");
        assert!(matches!(
            edit.validate("short"),
            Err(FixError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_split_characters() {
        // "Вопрос" is two bytes per character.
        let edit = TextEdit::replace(1, 4, "x");
        assert_eq!(edit.validate("Вопрос"), Err(FixError::NotCharBoundary(1)));
    }

    #[test]
    fn test_validate_edits_overlapping() {
        let edits = vec![TextEdit::replace(0, 10, "a"), TextEdit::replace(5, 15, "b")];
        assert!(matches!(
            validate_edits(&edits, "01234567890123456789"),
            Err(FixError::OverlappingEdits(_))
        ));
    }

    #[test]
    fn test_apply_multibyte_replacement() {
        let source = "Вопрос(Текст);";
        let end = source.find(';').unwrap();
        let edit = TextEdit::replace(0, end, "ПоказатьВопрос(,Текст)");
        assert_eq!(apply_fix(source, &edit).unwrap(), "ПоказатьВопрос(,Текст);");
    }

    #[test]
    fn test_apply_edits_reversed_order() {
        let source = "abc def ghi";
        let edits = vec![
            TextEdit::replace(8, 11, "3"),
            TextEdit::replace(0, 3, "1"),
            TextEdit::replace(4, 7, "2"),
        ];
        assert_eq!(apply_fixes(source, &edits).unwrap(), "1 2 3");
    }

    #[test]
    fn test_insert_then_delete() {
        let source = "См.Модуль";
        let inserted = apply_fix(source, &TextEdit::insert("См.".len(), " ")).unwrap();
        assert_eq!(inserted, "См. Модуль");
        let start = "См.".len();
        let restored = apply_fix(&inserted, &TextEdit::delete(start, start + 1)).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn test_no_edits_is_identity() {
        assert_eq!(apply_fixes("unchanged", &[]).unwrap(), "unchanged");
    }
}

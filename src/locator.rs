//! Map syntax nodes back to their exact source text.

use crate::ast::{Expression, Method, Module, NodeSpan, PreprocessorRegion, Statement};
use crate::error::AnalysisError;

/// Anything that may be backed by concrete syntax.
pub trait Syntax {
    fn node_span(&self) -> Option<NodeSpan>;
}

impl Syntax for NodeSpan {
    fn node_span(&self) -> Option<NodeSpan> {
        Some(*self)
    }
}

impl Syntax for Option<NodeSpan> {
    fn node_span(&self) -> Option<NodeSpan> {
        *self
    }
}

impl Syntax for Expression {
    fn node_span(&self) -> Option<NodeSpan> {
        self.span()
    }
}

impl Syntax for Statement {
    fn node_span(&self) -> Option<NodeSpan> {
        self.span()
    }
}

impl Syntax for Method {
    fn node_span(&self) -> Option<NodeSpan> {
        self.span
    }
}

impl Syntax for PreprocessorRegion {
    fn node_span(&self) -> Option<NodeSpan> {
        self.span
    }
}

/// Exact text backing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan<'a> {
    /// Absolute byte offset in the module source.
    pub start_offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// 1-based line of `start_offset`.
    pub line_number: usize,
    pub raw_text: &'a str,
}

impl SourceSpan<'_> {
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }
}

/// Resolve `node` against the text of `module`.
///
/// Fails with [`AnalysisError::NoConcreteSyntax`] when the node has no span or
/// the span does not denote a valid slice of the source.
pub fn span_of<'a>(module: &'a Module, node: &impl Syntax) -> Result<SourceSpan<'a>, AnalysisError> {
    let span = node.node_span().ok_or(AnalysisError::NoConcreteSyntax)?;
    let raw_text = module
        .source
        .get(span.offset..span.end())
        .ok_or(AnalysisError::NoConcreteSyntax)?;
    Ok(SourceSpan {
        start_offset: span.offset,
        length: span.length,
        line_number: line_of(&module.source, span.offset),
        raw_text,
    })
}

/// 1-based line containing byte `offset`.
pub fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// 1-based line and character column of byte `offset`.
///
/// An offset inside a multi-byte character counts as that character's start.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = &source[..end];
    let line_start = prefix.rfind('\n').map_or(0, |idx| idx + 1);
    let column = prefix[line_start..].chars().count() + 1;
    (line_of(source, prefix.len()), column)
}

//! Lexical scopes and call sites.
//!
//! A [`Scope`] tracks where a node sits: the module, the innermost enclosing
//! preprocessor region and the containing routine, plus the execution
//! environments narrowed by each of them.

use crate::ast::{Expression, Method, Module, ModuleItem, PreprocessorRegion, Statement};
use crate::environment::{Environments, directive_environments};
use crate::error::AnalysisError;
use crate::locator::{SourceSpan, span_of};

#[derive(Debug, Clone, Copy)]
pub struct Scope<'m> {
    pub module: &'m Module,
    /// Innermost enclosing `#If` region.
    pub region: Option<&'m PreprocessorRegion>,
    pub method: Option<&'m Method>,
    pub environments: Environments,
}

impl<'m> Scope<'m> {
    /// Module body scope.
    pub fn module(module: &'m Module) -> Self {
        Self {
            module,
            region: None,
            method: None,
            environments: module.environments,
        }
    }

    #[must_use]
    pub fn enter_region(&self, region: &'m PreprocessorRegion) -> Self {
        Self {
            region: Some(region),
            environments: self.environments.intersection(region.condition.evaluate()),
            ..*self
        }
    }

    #[must_use]
    pub fn enter_method(&self, method: &'m Method) -> Self {
        Self {
            method: Some(method),
            environments: self
                .environments
                .intersection(directive_environments(&method.directives)),
            ..*self
        }
    }

    /// Scope of `method` inside `module`, found by identity.
    pub fn of_method(module: &'m Module, method: &Method) -> Result<Self, AnalysisError> {
        fn find<'m>(
            items: &'m [ModuleItem],
            scope: Scope<'m>,
            target: &Method,
        ) -> Option<Scope<'m>> {
            items.iter().find_map(|item| match item {
                ModuleItem::Method(m) if std::ptr::eq(m, target) => Some(scope.enter_method(m)),
                ModuleItem::Method(_) => None,
                ModuleItem::Region(region) => find(&region.items, scope.enter_region(region), target),
            })
        }

        find(&module.items, Scope::module(module), method).ok_or_else(|| {
            AnalysisError::ambiguous_scope(format!(
                "method `{}` is not declared in module `{}`",
                method.name, module.name
            ))
        })
    }

    /// Statement list of the containing routine, or the module body.
    pub fn statements(&self) -> &'m [Statement] {
        match self.method {
            Some(method) => &method.statements,
            None => &self.module.statements,
        }
    }
}

/// A located call-like node: an invocation or an `Execute` statement.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'m> {
    pub module: &'m Module,
    pub callee_name: &'m str,
    pub span: SourceSpan<'m>,
    /// End of the receiver text relative to the call start, for member calls.
    pub receiver_end: Option<usize>,
    pub containing_routine: Option<&'m Method>,
    pub execution_context: Environments,
}

impl<'m> CallSite<'m> {
    pub fn from_invocation(expr: &'m Expression, scope: &Scope<'m>) -> Result<Self, AnalysisError> {
        let Expression::Invocation { name, receiver, .. } = expr else {
            return Err(AnalysisError::malformed("expression is not a call"));
        };
        let span = span_of(scope.module, expr)?;
        let receiver_end = receiver
            .as_deref()
            .and_then(Expression::span)
            .and_then(|r| r.end().checked_sub(span.start_offset))
            .filter(|end| *end <= span.length);
        Ok(Self {
            module: scope.module,
            callee_name: name,
            span,
            receiver_end,
            containing_routine: scope.method,
            execution_context: scope.environments,
        })
    }

    pub fn from_execute(stmt: &'m Statement, scope: &Scope<'m>) -> Result<Self, AnalysisError> {
        if !matches!(stmt, Statement::Execute { .. }) {
            return Err(AnalysisError::malformed("statement is not Execute"));
        }
        let span = span_of(scope.module, stmt)?;
        let raw = span.raw_text;
        let keyword_len = raw
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(raw.len());
        Ok(Self {
            module: scope.module,
            callee_name: &raw[..keyword_len],
            span,
            receiver_end: None,
            containing_routine: scope.method,
            execution_context: scope.environments,
        })
    }

    /// Statements the guard analysis scans for this call.
    pub fn scope_statements(&self) -> &'m [Statement] {
        match self.containing_routine {
            Some(method) => &method.statements,
            None => &self.module.statements,
        }
    }

    /// Byte range of the callee name token, relative to the call start.
    ///
    /// Searched after the receiver for member calls; the detector and the
    /// rewriter both anchor on this range.
    pub fn name_range(&self) -> Result<std::ops::Range<usize>, AnalysisError> {
        let start = find_word(self.span.raw_text, self.callee_name, self.receiver_end.unwrap_or(0))
            .ok_or_else(|| AnalysisError::malformed(self.span.raw_text))?;
        Ok(start..start + self.callee_name.len())
    }
}

/// Case-insensitive whole-word search of `word` in `text` starting at `from`.
fn find_word(text: &str, word: &str, from: usize) -> Option<usize> {
    let lower = word.to_lowercase();
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    text.get(from..)?.char_indices().find_map(|(idx, _)| {
        let start = from + idx;
        let end = start + word.len();
        let candidate = text.get(start..end)?;
        let clean_before = text[..start].chars().next_back().is_none_or(|c| !is_ident(c));
        let clean_after = text[end..].chars().next().is_none_or(|c| !is_ident(c));
        (candidate.to_lowercase() == lower && clean_before && clean_after).then_some(start)
    })
}

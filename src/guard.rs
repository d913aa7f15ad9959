//! Safe-mode guard analysis for server-side dynamic evaluation.
//!
//! A routine counts as guarded when any statement in it enables safe mode with
//! a literal `true`. Conditional branches are searched regardless of which
//! branch reaches the risky call; loop and try bodies are not.

use crate::ast::{Expression, Statement};
use crate::calls::{CanonicalId, lookup};
use crate::cancel::CancellationToken;
use crate::environment::Environment;
use crate::error::AnalysisError;
use crate::scope::CallSite;

/// Safe-mode state established by a statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardState {
    Enabled,
    Disabled,
    #[default]
    Unknown,
}

impl GuardState {
    /// Combine two findings. An enabling statement anywhere wins.
    #[must_use]
    pub fn merge(self, other: GuardState) -> GuardState {
        match (self, other) {
            (GuardState::Enabled, _) | (_, GuardState::Enabled) => GuardState::Enabled,
            (GuardState::Disabled, _) | (_, GuardState::Disabled) => GuardState::Disabled,
            _ => GuardState::Unknown,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == GuardState::Enabled
    }
}

/// The shape of a statement as far as guard detection cares.
enum StatementView<'a> {
    Simple(&'a Expression),
    Conditional(Vec<&'a [Statement]>),
    Opaque,
}

impl<'a> StatementView<'a> {
    fn of(stmt: &'a Statement) -> Self {
        match stmt {
            Statement::Simple { left, right: None, .. } => StatementView::Simple(left),
            Statement::If { .. } => StatementView::Conditional(stmt.bodies()),
            _ => StatementView::Opaque,
        }
    }
}

/// Safe-mode state of a single call expression.
fn call_state(expr: &Expression) -> GuardState {
    let Expression::Invocation {
        name,
        receiver: None,
        params,
        ..
    } = expr
    else {
        return GuardState::Unknown;
    };
    if lookup(name).is_none_or(|entry| entry.id != CanonicalId::SetSafeMode) {
        return GuardState::Unknown;
    }
    match params.as_slice() {
        [Some(arg)] => match arg.as_boolean() {
            Some(true) => GuardState::Enabled,
            Some(false) => GuardState::Disabled,
            None => GuardState::Unknown,
        },
        _ => GuardState::Unknown,
    }
}

fn statement_state(stmt: &Statement) -> GuardState {
    match StatementView::of(stmt) {
        StatementView::Simple(expr) => call_state(expr),
        StatementView::Conditional(branches) => branches
            .into_iter()
            .map(nested_state)
            .fold(GuardState::Unknown, GuardState::merge),
        StatementView::Opaque => GuardState::Unknown,
    }
}

fn nested_state(stmts: &[Statement]) -> GuardState {
    stmts
        .iter()
        .map(statement_state)
        .fold(GuardState::Unknown, GuardState::merge)
}

/// Scan a top-level statement list in document order.
///
/// The token is polled once per top-level statement.
pub fn scan_statements(
    stmts: &[Statement],
    token: &CancellationToken,
) -> Result<GuardState, AnalysisError> {
    let mut state = GuardState::Unknown;
    for stmt in stmts {
        token.checkpoint()?;
        state = state.merge(statement_state(stmt));
    }
    Ok(state)
}

/// Whether the routine (or module body) containing `call` enables safe mode.
pub fn is_guarded(call: &CallSite<'_>, token: &CancellationToken) -> Result<bool, AnalysisError> {
    scan_statements(call.scope_statements(), token).map(GuardState::is_enabled)
}

/// Only calls that may run on the server need a guard.
pub fn requires_guard(call: &CallSite<'_>) -> bool {
    call.execution_context.contains(Environment::Server)
}

/// Whether `expr` is a dynamic-evaluation call.
pub fn is_eval_call(expr: &Expression) -> bool {
    matches!(expr, Expression::Invocation { name, .. }
        if lookup(name).is_some_and(|entry| entry.id == CanonicalId::Eval))
}

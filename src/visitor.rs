use crate::ast::{Expression, Method, Module, ModuleItem, Statement};
use crate::lint::LintContext;
use crate::scope::Scope;

/// Callbacks for a document-order walk over a module.
///
/// Every callback receives the scope the node sits in, so rules can ask for
/// the enclosing routine and its execution environments.
pub trait BslVisitor<'m> {
    fn visit_method(&mut self, _method: &'m Method, _scope: &Scope<'m>, _ctx: &mut LintContext<'_>) {}
    fn visit_statement(
        &mut self,
        _stmt: &'m Statement,
        _scope: &Scope<'m>,
        _ctx: &mut LintContext<'_>,
    ) {
    }
    fn visit_invocation(
        &mut self,
        _expr: &'m Expression,
        _scope: &Scope<'m>,
        _ctx: &mut LintContext<'_>,
    ) {
    }
    fn visit_execute(&mut self, _stmt: &'m Statement, _scope: &Scope<'m>, _ctx: &mut LintContext<'_>) {}
}

/// Walk methods (inside regions too), then the module body.
///
/// Stops early once the context observes cancellation.
pub fn walk_module<'m>(
    module: &'m Module,
    visitor: &mut impl BslVisitor<'m>,
    ctx: &mut LintContext<'_>,
) {
    let scope = Scope::module(module);
    walk_items(&module.items, &scope, visitor, ctx);
    walk_statements(&module.statements, &scope, visitor, ctx);
}

fn walk_items<'m>(
    items: &'m [ModuleItem],
    scope: &Scope<'m>,
    visitor: &mut impl BslVisitor<'m>,
    ctx: &mut LintContext<'_>,
) {
    for item in items {
        if ctx.is_cancelled() {
            return;
        }
        match item {
            ModuleItem::Method(method) => {
                let scope = scope.enter_method(method);
                visitor.visit_method(method, &scope, ctx);
                walk_statements(&method.statements, &scope, visitor, ctx);
            }
            ModuleItem::Region(region) => {
                walk_items(&region.items, &scope.enter_region(region), visitor, ctx);
            }
        }
    }
}

fn walk_statements<'m>(
    stmts: &'m [Statement],
    scope: &Scope<'m>,
    visitor: &mut impl BslVisitor<'m>,
    ctx: &mut LintContext<'_>,
) {
    for stmt in stmts {
        if ctx.is_cancelled() {
            return;
        }
        visitor.visit_statement(stmt, scope, ctx);
        if matches!(stmt, Statement::Execute { .. }) {
            visitor.visit_execute(stmt, scope, ctx);
        }
        for expr in stmt.expressions() {
            walk_expression(expr, scope, visitor, ctx);
        }
        for body in stmt.bodies() {
            walk_statements(body, scope, visitor, ctx);
        }
    }
}

fn walk_expression<'m>(
    expr: &'m Expression,
    scope: &Scope<'m>,
    visitor: &mut impl BslVisitor<'m>,
    ctx: &mut LintContext<'_>,
) {
    if matches!(expr, Expression::Invocation { .. }) {
        visitor.visit_invocation(expr, scope, ctx);
    }
    for child in expr.children() {
        walk_expression(child, scope, visitor, ctx);
    }
}

use crate::ast::{Expression, Module, Statement};
use crate::error::AnalysisError;
use crate::guard::{is_eval_call, is_guarded, requires_guard};
use crate::lint::{LintCategory, LintContext, LintDescriptor, LintRule};
use crate::scope::{CallSite, Scope};
use crate::visitor::{BslVisitor, walk_module};

// ============================================================================
// RestrictionExecuteEvalServerLint
// ============================================================================

pub struct RestrictionExecuteEvalServerLint;

static RESTRICTION_EXECUTE_EVAL_SERVER: LintDescriptor = LintDescriptor::new(
    "restriction_execute_eval_server",
    LintCategory::Security,
    "Execute and Eval on the server require safe mode to be enabled first",
);

impl LintRule for RestrictionExecuteEvalServerLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &RESTRICTION_EXECUTE_EVAL_SERVER
    }

    fn check(&self, module: &Module, ctx: &mut LintContext<'_>) {
        walk_module(module, &mut RiskyCalls, ctx);
    }
}

struct RiskyCalls;

impl RiskyCalls {
    fn check_site(site: Result<CallSite<'_>, AnalysisError>, ctx: &mut LintContext<'_>) {
        let lint = &RESTRICTION_EXECUTE_EVAL_SERVER;
        let site = match site {
            Ok(site) => site,
            Err(err) => {
                ctx.skip(lint, &err);
                return;
            }
        };
        if !requires_guard(&site) {
            return;
        }
        match is_guarded(&site, ctx.cancellation()) {
            Ok(true) => {}
            Ok(false) => ctx.report(
                lint,
                site.span.start_offset,
                site.span.length,
                format!(
                    "`{}` may run on the server without safe mode enabled",
                    site.callee_name
                ),
            ),
            Err(err) => ctx.skip(lint, &err),
        }
    }
}

impl<'m> BslVisitor<'m> for RiskyCalls {
    fn visit_execute(&mut self, stmt: &'m Statement, scope: &Scope<'m>, ctx: &mut LintContext<'_>) {
        Self::check_site(CallSite::from_execute(stmt, scope), ctx);
    }

    fn visit_invocation(&mut self, expr: &'m Expression, scope: &Scope<'m>, ctx: &mut LintContext<'_>) {
        if is_eval_call(expr) {
            Self::check_site(CallSite::from_invocation(expr, scope), ctx);
        }
    }
}

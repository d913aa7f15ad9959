use crate::ast::{Expression, Module};
use crate::calls::lookup_modal;
use crate::diagnostics::Applicability;
use crate::lint::{FixDescriptor, LintCategory, LintContext, LintDescriptor, LintRule};
use crate::rewrite::rewrite;
use crate::scope::{CallSite, Scope};
use crate::visitor::{BslVisitor, walk_module};

use super::util::suggestion;

// ============================================================================
// DontUseModalityModeLint
// ============================================================================

pub struct DontUseModalityModeLint;

static DONT_USE_MODALITY_MODE: LintDescriptor = LintDescriptor::with_fix(
    "dont_use_modality_mode",
    LintCategory::CodeStyle,
    "Modal dialogs are not allowed when the configuration disables modality",
    FixDescriptor::safe("Replace the modal call with its asynchronous counterpart"),
);

impl LintRule for DontUseModalityModeLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &DONT_USE_MODALITY_MODE
    }

    fn check(&self, module: &Module, ctx: &mut LintContext<'_>) {
        if !ctx.project().modality.forbids_modal_calls() {
            return;
        }
        walk_module(module, &mut ModalCalls, ctx);
    }
}

struct ModalCalls;

impl<'m> BslVisitor<'m> for ModalCalls {
    fn visit_invocation(&mut self, expr: &'m Expression, scope: &Scope<'m>, ctx: &mut LintContext<'_>) {
        let lint = &DONT_USE_MODALITY_MODE;
        let Expression::Invocation { name, .. } = expr else {
            return;
        };
        let Some(entry) = lookup_modal(name) else {
            return;
        };
        if let Err(err) = ctx.checkpoint() {
            ctx.skip(lint, &err);
            return;
        }

        let located = CallSite::from_invocation(expr, scope)
            .and_then(|site| site.name_range().map(|range| (site, range)));
        let (site, name_range) = match located {
            Ok(located) => located,
            Err(err) => {
                ctx.skip(lint, &err);
                return;
            }
        };

        let variant = ctx.project().variant;
        let fix = rewrite(&site, entry, variant).map(|edit| {
            let replacement = entry
                .rewrite
                .map_or(entry.name(variant), |t| t.replacement(variant));
            suggestion(
                format!("use `{replacement}` instead"),
                edit,
                Applicability::MachineApplicable,
            )
        });

        ctx.report_with_suggestion(
            lint,
            site.span.start_offset + name_range.start,
            name_range.len(),
            format!("Modal call `{}` is not allowed in this configuration", site.callee_name),
            fix,
        );
    }
}

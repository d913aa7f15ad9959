use crate::ast::{Method, Module};
use crate::debug_event;
use crate::diagnostics::Applicability;
use crate::error::AnalysisError;
use crate::extension::{
    SourceMethodResolver, environments_of, incompatible_environments, wrap_in_source_region,
};
use crate::lint::{FixDescriptor, LintCategory, LintContext, LintDescriptor, LintRule};
use crate::locator::span_of;

use super::util::suggestion;

// ============================================================================
// ExtensionMethodVisibleModeLint
// ============================================================================

pub struct ExtensionMethodVisibleModeLint;

static EXTENSION_METHOD_VISIBLE_MODE: LintDescriptor = LintDescriptor::with_fix(
    "extension_method_visible_mode",
    LintCategory::Compatibility,
    "Extension methods must not be available where the extended method is not",
    FixDescriptor::unsafe_fix("Wrap the method in the preprocessor condition of the source method"),
);

impl LintRule for ExtensionMethodVisibleModeLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &EXTENSION_METHOD_VISIBLE_MODE
    }

    fn check(&self, module: &Module, ctx: &mut LintContext<'_>) {
        if !ctx.project().extension {
            return;
        }
        let Some(resolver) = ctx.resolver() else {
            debug_event!(module = %module.name, "no source method resolver, extension check skipped");
            return;
        };

        for method in module.methods() {
            if let Err(err) = check_method(module, method, resolver, ctx) {
                ctx.skip(&EXTENSION_METHOD_VISIBLE_MODE, &err);
                if ctx.is_cancelled() {
                    return;
                }
            }
        }
    }
}

fn check_method(
    module: &Module,
    method: &Method,
    resolver: &dyn SourceMethodResolver,
    ctx: &mut LintContext<'_>,
) -> Result<(), AnalysisError> {
    ctx.checkpoint()?;
    let Some(source) = resolver.source_method(module, method) else {
        return Ok(());
    };

    let derived_env = environments_of(module, method)?;
    let source_env = environments_of(source.module, source.method)?;
    let Some(extra) = incompatible_environments(derived_env, source_env) else {
        return Ok(());
    };

    let name = span_of(module, &method.name_span)?;
    let fix = wrap_in_source_region(module, method, source, ctx.project().variant)
        .unwrap_or_else(|err| {
            debug_event!(method = %method.name, error = %err, "no wrap fix");
            None
        })
        .map(|edit| {
            suggestion(
                "wrap the method in the condition of its source method",
                edit,
                Applicability::MaybeIncorrect,
            )
        });

    ctx.report_with_suggestion(
        &EXTENSION_METHOD_VISIBLE_MODE,
        name.start_offset,
        name.length,
        format!(
            "Method `{}` is available in environments where `{}` is not: {extra}",
            method.name, source.method.name
        ),
        fix,
    );
    Ok(())
}

//! Execution-environment compatibility between extension methods and the
//! base configuration methods they extend.

use std::collections::HashMap;

use crate::ast::{Method, Module, PreprocessorRegion};
use crate::environment::Environments;
use crate::error::AnalysisError;
use crate::fix::TextEdit;
use crate::locator::span_of;
use crate::project::ScriptVariant;
use crate::scope::Scope;

/// A method together with the module declaring it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMethod<'a> {
    pub module: &'a Module,
    pub method: &'a Method,
}

/// Resolves the source method an extension method is attached to.
///
/// Passed explicitly to the checks that need it; there is no ambient lookup.
pub trait SourceMethodResolver: Send + Sync {
    fn source_method<'a>(&'a self, module: &Module, method: &Method) -> Option<ResolvedMethod<'a>>;
}

/// Resolver over an in-memory set of base configuration modules.
///
/// An extension method in module `M` annotated with `&Before("Name")` resolves
/// to the method `Name` of the base module with the same name as `M`.
#[derive(Debug, Default)]
pub struct ExtensionIndex {
    modules: Vec<Module>,
    by_name: HashMap<String, usize>,
}

impl ExtensionIndex {
    pub fn new(modules: Vec<Module>) -> Self {
        let by_name = modules
            .iter()
            .enumerate()
            .map(|(idx, module)| (module.name.to_lowercase(), idx))
            .collect();
        Self { modules, by_name }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|idx| &self.modules[*idx])
    }
}

impl SourceMethodResolver for ExtensionIndex {
    fn source_method<'a>(&'a self, module: &Module, method: &Method) -> Option<ResolvedMethod<'a>> {
        let target = method.extension_target()?;
        let base = self.module(&module.name)?;
        let source = base.find_method(&target.target)?;
        Some(ResolvedMethod {
            module: base,
            method: source,
        })
    }
}

/// Environments `method` compiles for inside `module`.
pub fn environments_of(module: &Module, method: &Method) -> Result<Environments, AnalysisError> {
    Scope::of_method(module, method).map(|scope| scope.environments)
}

/// Innermost `#If` region around `method`, if any.
pub fn enclosing_region<'m>(
    module: &'m Module,
    method: &Method,
) -> Result<Option<&'m PreprocessorRegion>, AnalysisError> {
    Scope::of_method(module, method).map(|scope| scope.region)
}

/// Environments the derived method claims that its source does not support.
///
/// `None` when `derived` is a subset of `source`.
pub fn incompatible_environments(derived: Environments, source: Environments) -> Option<Environments> {
    (!source.contains_all(derived)).then(|| derived.difference(source))
}

/// Wrap the derived method in the preprocessor condition guarding its source.
///
/// Returns `Ok(None)` when the source method is not inside a region.
pub fn wrap_in_source_region(
    derived: &Module,
    derived_method: &Method,
    source: ResolvedMethod<'_>,
    variant: ScriptVariant,
) -> Result<Option<TextEdit>, AnalysisError> {
    let Some(region) = enclosing_region(source.module, source.method)? else {
        return Ok(None);
    };
    let condition = span_of(source.module, &region.condition_span)?.raw_text;
    let method = span_of(derived, derived_method)?;

    let (open, then, close) = match variant {
        ScriptVariant::Primary => ("#Если", "Тогда", "#КонецЕсли"),
        ScriptVariant::Alternate => ("#If", "Then", "#EndIf"),
    };
    let replacement = format!("{open} {condition} {then}\n{}\n{close}", method.raw_text);
    Ok(Some(TextEdit::new(method.start_offset, method.length, replacement)))
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

use bsl_clippy::LintEngine;
use bsl_clippy::ast::Module;
use bsl_clippy::diagnostics::Diagnostic;
use bsl_clippy::fix::apply_fixes;
use bsl_clippy::lint::{LintRegistry, LintServices, LintSettings};
use bsl_clippy::project::ProjectSettings;

pub fn engine(project: ProjectSettings) -> LintEngine {
    LintEngine::new_with_settings(LintRegistry::default_rules(), LintSettings::default())
        .with_project(project)
}

pub fn lint(module: &Module, project: ProjectSettings) -> Vec<Diagnostic> {
    engine(project).lint_module(module)
}

pub fn lint_with(
    module: &Module,
    project: ProjectSettings,
    services: &LintServices<'_>,
) -> Vec<Diagnostic> {
    engine(project).lint_module_with(module, services)
}

/// Diagnostics of a single lint.
pub fn only<'a>(diags: &'a [Diagnostic], lint: &str) -> Vec<&'a Diagnostic> {
    diags.iter().filter(|d| d.lint.name == lint).collect()
}

/// Text covered by a diagnostic.
pub fn flagged<'a>(module: &'a Module, diag: &Diagnostic) -> &'a str {
    &module.source[diag.span.offset..diag.span.offset + diag.span.length]
}

/// Apply the suggestion of `diag` to the module source.
pub fn fixed(module: &Module, diag: &Diagnostic) -> String {
    let suggestion = diag.suggestion.as_ref().expect("diagnostic carries a fix");
    apply_fixes(&module.source, std::slice::from_ref(&suggestion.edit)).expect("fix applies")
}

//! Core BSL Clippy engine and lint registry.
//!
//! The crate checks BSL (1C:Enterprise) modules for modal UI calls, unguarded
//! server-side dynamic evaluation, extension methods visible where their
//! source methods are not, and badly spaced documentation links. Modules
//! arrive as an owned syntax tree (see [`ast`]); findings come back as
//! [`Diagnostic`]s, optionally carrying a single text edit.

#![allow(clippy::new_without_default)] // LintRegistry::new() requires explicit construction

pub mod ast;
pub mod calls;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod extension;
pub mod fix;
pub mod fixer;
pub mod guard;
pub mod level;
pub mod lint;
pub mod locator;
pub mod project;
pub mod rewrite;
pub mod rules;
pub mod scope;
pub mod telemetry;
pub mod visitor;

use anyhow::Result;

use crate::ast::Module;
use crate::diagnostics::Diagnostic;
use crate::lint::{LintContext, LintRegistry, LintServices, LintSettings};
use crate::project::ProjectSettings;

/// Engine orchestrates linting by running registered rules over a module.
pub struct LintEngine {
    registry: LintRegistry,
    settings: LintSettings,
    project: ProjectSettings,
}

impl LintEngine {
    /// Create a new engine with default lint settings.
    pub fn new(registry: LintRegistry) -> Self {
        Self {
            registry,
            settings: LintSettings::default(),
            project: ProjectSettings::default(),
        }
    }

    /// Create a new engine with explicit lint settings (e.g. from config).
    pub fn new_with_settings(registry: LintRegistry, settings: LintSettings) -> Self {
        Self {
            registry,
            settings,
            project: ProjectSettings::default(),
        }
    }

    #[must_use]
    pub fn with_project(mut self, project: ProjectSettings) -> Self {
        self.project = project;
        self
    }

    pub fn project(&self) -> ProjectSettings {
        self.project
    }

    pub fn registry(&self) -> &LintRegistry {
        &self.registry
    }

    /// Lint a module without cancellation or a source-method resolver.
    pub fn lint_module(&self, module: &Module) -> Vec<Diagnostic> {
        self.lint_module_with(module, &LintServices::default())
    }

    /// Lint a module with explicit services.
    ///
    /// Returns an empty list when the run is cancelled.
    pub fn lint_module_with(&self, module: &Module, services: &LintServices<'_>) -> Vec<Diagnostic> {
        instrument_block!("lint_module", {
            let mut ctx =
                LintContext::new(module, self.settings.clone(), self.project, services.clone());

            for rule in self.registry.rules() {
                if ctx.is_cancelled() {
                    break;
                }
                rule.check(module, &mut ctx);
            }

            ctx.into_diagnostics()
        })
    }
}

/// Construct a `LintEngine` with all built-in lints enabled.
pub fn create_default_engine() -> Result<LintEngine> {
    let registry = LintRegistry::default_rules_filtered(&[], &[], &[])?;
    Ok(LintEngine::new(registry))
}

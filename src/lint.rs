use crate::ast::Module;
use crate::cancel::CancellationToken;
use crate::debug_event;
use crate::diagnostics::{Diagnostic, Span, Suggestion};
use crate::error::AnalysisError;
use crate::extension::SourceMethodResolver;
use crate::level::LintLevel;
use crate::project::ProjectSettings;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Fix Safety Classification
// ============================================================================

/// Safety classification for auto-fixes.
///
/// - `Safe` fixes preserve runtime behavior and are applied by `--fix`
/// - `Unsafe` fixes change code structure and need `--unsafe-fixes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixSafety {
    #[default]
    Safe,
    Unsafe,
}

impl FixSafety {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixSafety::Safe => "safe",
            FixSafety::Unsafe => "unsafe",
        }
    }
}

/// Descriptor for an auto-fix associated with a lint rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixDescriptor {
    pub available: bool,
    pub safety: FixSafety,
    /// Human-readable description of what the fix does.
    pub description: &'static str,
}

impl FixDescriptor {
    pub const fn safe(description: &'static str) -> Self {
        Self {
            available: true,
            safety: FixSafety::Safe,
            description,
        }
    }

    pub const fn unsafe_fix(description: &'static str) -> Self {
        Self {
            available: true,
            safety: FixSafety::Unsafe,
            description,
        }
    }

    pub const fn none() -> Self {
        Self {
            available: false,
            safety: FixSafety::Safe,
            description: "",
        }
    }
}

// ============================================================================
// Lint Categories
// ============================================================================

/// High-level categories used to group lints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LintCategory {
    CodeStyle,
    /// Code that lets untrusted input run with full privileges.
    Security,
    /// Extension code that does not match the base configuration it extends.
    Compatibility,
}

impl LintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintCategory::CodeStyle => "code_style",
            LintCategory::Security => "security",
            LintCategory::Compatibility => "compatibility",
        }
    }
}

/// Static metadata describing a lint rule.
#[derive(Debug)]
pub struct LintDescriptor {
    pub name: &'static str,
    pub category: LintCategory,
    pub description: &'static str,
    pub fix: FixDescriptor,
}

impl LintDescriptor {
    pub const fn new(name: &'static str, category: LintCategory, description: &'static str) -> Self {
        Self {
            name,
            category,
            description,
            fix: FixDescriptor::none(),
        }
    }

    pub const fn with_fix(
        name: &'static str,
        category: LintCategory,
        description: &'static str,
        fix: FixDescriptor,
    ) -> Self {
        Self {
            name,
            category,
            description,
            fix,
        }
    }
}

/// A single lint rule that inspects a module.
pub trait LintRule: Send + Sync {
    fn descriptor(&self) -> &'static LintDescriptor;
    fn check(&self, module: &Module, ctx: &mut LintContext<'_>);
}

/// Per-lint configuration derived from `bsl-clippy.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSettings {
    levels: HashMap<String, LintLevel>,
}

impl LintSettings {
    #[must_use]
    pub fn with_config_levels(mut self, levels: HashMap<String, LintLevel>) -> Self {
        for (name, level) in levels {
            let canonical = resolve_lint_alias(&name);
            self.levels.insert(canonical.to_string(), level);
        }
        self
    }

    #[must_use]
    pub fn disable(mut self, disabled: impl IntoIterator<Item = String>) -> Self {
        for name in disabled {
            let canonical = resolve_lint_alias(&name);
            self.levels.insert(canonical.to_string(), LintLevel::Allow);
        }
        self
    }

    pub fn level_for(&self, lint_name: &str) -> LintLevel {
        if let Some(&level) = self.levels.get(lint_name) {
            return level;
        }
        let canonical = resolve_lint_alias(lint_name);
        self.levels.get(canonical).copied().unwrap_or_default()
    }
}

/// Capabilities handed to the rules for one run.
#[derive(Clone, Default)]
pub struct LintServices<'a> {
    pub cancellation: CancellationToken,
    /// Needed by the extension checks; they stay silent without it.
    pub resolver: Option<&'a dyn SourceMethodResolver>,
}

impl<'a> LintServices<'a> {
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn SourceMethodResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// Mutable context passed to lint rules while checking a module.
pub struct LintContext<'src> {
    module: &'src Module,
    settings: LintSettings,
    project: ProjectSettings,
    services: LintServices<'src>,
    diagnostics: Vec<Diagnostic>,
    cancelled: bool,
}

impl<'src> LintContext<'src> {
    pub fn new(
        module: &'src Module,
        settings: LintSettings,
        project: ProjectSettings,
        services: LintServices<'src>,
    ) -> Self {
        Self {
            module,
            settings,
            project,
            services,
            diagnostics: Vec::new(),
            cancelled: false,
        }
    }

    pub fn source(&self) -> &'src str {
        &self.module.source
    }

    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    pub fn project(&self) -> ProjectSettings {
        self.project
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.services.cancellation
    }

    pub fn resolver(&self) -> Option<&'src dyn SourceMethodResolver> {
        self.services.resolver
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Poll the cancellation token, latching the result.
    pub fn checkpoint(&mut self) -> Result<(), AnalysisError> {
        if self.cancelled {
            return Err(AnalysisError::Cancelled);
        }
        self.services.cancellation.checkpoint().inspect_err(|_| {
            self.cancelled = true;
        })
    }

    /// Record why a candidate produced no diagnostic.
    pub fn skip(&mut self, lint: &'static LintDescriptor, err: &AnalysisError) {
        if *err == AnalysisError::Cancelled {
            self.cancelled = true;
        }
        debug_event!(lint = lint.name, module = %self.module.name, error = %err, "candidate skipped");
    }

    pub fn report(
        &mut self,
        lint: &'static LintDescriptor,
        offset: usize,
        length: usize,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            lint,
            level: LintLevel::default(),
            file: None,
            span: Span::from_offsets(&self.module.source, offset, length),
            message: message.into(),
            help: None,
            suggestion: None,
        };
        self.report_diagnostic(diagnostic);
    }

    pub fn report_with_suggestion(
        &mut self,
        lint: &'static LintDescriptor,
        offset: usize,
        length: usize,
        message: impl Into<String>,
        suggestion: Option<Suggestion>,
    ) {
        let diagnostic = Diagnostic {
            lint,
            level: LintLevel::default(),
            file: None,
            span: Span::from_offsets(&self.module.source, offset, length),
            message: message.into(),
            help: suggestion.as_ref().map(|s| s.message.clone()),
            suggestion,
        };
        self.report_diagnostic(diagnostic);
    }

    /// Report an already-constructed diagnostic at its configured level.
    pub fn report_diagnostic(&mut self, mut diagnostic: Diagnostic) {
        let level = self.settings.level_for(diagnostic.lint.name);
        if level == LintLevel::Allow {
            return;
        }
        diagnostic.level = level;
        self.diagnostics.push(diagnostic);
    }

    /// Collected diagnostics; empty when the run was cancelled.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        if self.cancelled || self.services.cancellation.is_cancelled() {
            debug_event!(module = %self.module.name, "run cancelled, dropping diagnostics");
            return Vec::new();
        }
        self.diagnostics
    }
}

// ============================================================================
// Lint Name Aliases
// ============================================================================

/// Kebab-case check ids, accepted wherever a lint name is.
///
/// Format: (alias, canonical_name)
pub const LINT_ALIASES: &[(&str, &str)] = &[
    ("dont-use-modality-mode", "dont_use_modality_mode"),
    ("restriction-execute-eval-server", "restriction_execute_eval_server"),
    ("extension-method-visible-mode", "extension_method_visible_mode"),
    ("link-part-comment-space", "link_part_comment_space"),
];

/// Resolve a lint name to its canonical form.
pub fn resolve_lint_alias(name: &str) -> &str {
    for (alias, canonical) in LINT_ALIASES {
        if *alias == name {
            return canonical;
        }
    }
    name
}

pub fn is_lint_alias(name: &str) -> bool {
    LINT_ALIASES.iter().any(|(alias, _)| *alias == name)
}

/// Get all known lint names including aliases.
pub fn all_known_lints_with_aliases() -> HashSet<&'static str> {
    let mut known = all_known_lints();
    for (alias, _) in LINT_ALIASES {
        known.insert(alias);
    }
    known
}

pub fn all_known_lints() -> HashSet<&'static str> {
    LintRegistry::default_rules()
        .descriptors()
        .map(|d| d.name)
        .collect()
}

/// Registry of lint rules run by the engine.
pub struct LintRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl Default for LintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl LintRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn LintRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static LintDescriptor> + '_ {
        self.rules.iter().map(|r| r.descriptor())
    }

    pub fn find_descriptor(&self, name: &str) -> Option<&'static LintDescriptor> {
        let name = resolve_lint_alias(name);
        self.descriptors().find(|d| d.name == name)
    }

    #[must_use = "registry should be used to create an engine"]
    pub fn default_rules() -> Self {
        use crate::rules::{
            DontUseModalityModeLint, ExtensionMethodVisibleModeLint, LinkPartCommentSpaceLint,
            RestrictionExecuteEvalServerLint,
        };

        Self::new()
            .with_rule(DontUseModalityModeLint)
            .with_rule(RestrictionExecuteEvalServerLint)
            .with_rule(ExtensionMethodVisibleModeLint)
            .with_rule(LinkPartCommentSpaceLint)
    }

    /// Default rules narrowed by `only`, `skip` and `disabled`.
    ///
    /// # Errors
    ///
    /// Returns error if any lint name in `only`, `skip`, or `disabled` is unknown.
    pub fn default_rules_filtered(
        only: &[String],
        skip: &[String],
        disabled: &[String],
    ) -> Result<Self> {
        let known = all_known_lints_with_aliases();

        for n in only.iter().chain(skip.iter()).chain(disabled.iter()) {
            if !known.contains(n.as_str()) {
                return Err(anyhow!("unknown lint: {n}"));
            }
        }

        let only_set: Option<HashSet<&str>> = if only.is_empty() {
            None
        } else {
            Some(only.iter().map(|s| resolve_lint_alias(s)).collect())
        };
        let excluded: HashSet<&str> = skip
            .iter()
            .chain(disabled.iter())
            .map(|s| resolve_lint_alias(s))
            .collect();

        let mut reg = Self::new();
        for rule in Self::default_rules().rules {
            let name = rule.descriptor().name;

            if let Some(ref only) = only_set
                && !only.contains(name)
            {
                continue;
            }
            if excluded.contains(name) {
                continue;
            }

            reg.rules.push(rule);
        }

        Ok(reg)
    }
}

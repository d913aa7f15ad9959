use bsl_clippy::LintEngine;
use bsl_clippy::ast::Module;
use bsl_clippy::cli::{Args, Command, LintArgs, OutputFormat};
use bsl_clippy::config;
use bsl_clippy::diagnostics::Diagnostic;
use bsl_clippy::extension::ExtensionIndex;
use bsl_clippy::fixer;
use bsl_clippy::level::LintLevel;
use bsl_clippy::lint::{LintRegistry, LintServices, LintSettings, resolve_lint_alias};
use bsl_clippy::project::ProjectSettings;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

fn main() -> ExitCode {
    bsl_clippy::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Some(Command::ListRules) => {
            list_rules();
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { rule }) => {
            explain_rule(&rule)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Lint(lint)) => lint_command(lint),
        None => lint_command(args.lint),
    }
}

fn list_rules() {
    let registry = LintRegistry::default_rules();
    let mut rules: Vec<_> = registry.descriptors().collect();
    rules.sort_by_key(|d| d.name);

    for d in rules {
        let fix_status = if d.fix.available {
            format!(" [fix: {}]", d.fix.safety.as_str())
        } else {
            String::new()
        };
        println!(
            "{}\t{}\t{}{}",
            d.name,
            d.category.as_str(),
            d.description,
            fix_status
        );
    }
}

fn explain_rule(rule: &str) -> anyhow::Result<()> {
    let Some(d) = LintRegistry::default_rules().find_descriptor(rule) else {
        anyhow::bail!("unknown lint: {rule}");
    };

    println!("name: {}", d.name);
    if resolve_lint_alias(rule) != rule {
        println!("alias: {rule}");
    }
    println!("category: {}", d.category.as_str());
    println!("description: {}", d.description);
    if d.fix.available {
        println!("fix: available ({})", d.fix.safety.as_str());
        if !d.fix.description.is_empty() {
            println!("fix description: {}", d.fix.description);
        }
    } else {
        println!("fix: not available");
    }
    Ok(())
}

/// Engine plus the base configuration used to resolve extension sources.
struct Session {
    engine: LintEngine,
    base: ExtensionIndex,
}

impl Session {
    fn lint(&self, module: &Module, path: &Path) -> Vec<Diagnostic> {
        let services = LintServices::default().with_resolver(&self.base);
        let file = path.display().to_string();
        self.engine
            .lint_module_with(module, &services)
            .into_iter()
            .map(|mut d| {
                d.file.get_or_insert_with(|| file.clone());
                d
            })
            .collect()
    }
}

fn build_session(args: &LintArgs) -> anyhow::Result<Session> {
    let start_dir = infer_start_dir(args)?;
    let loaded_cfg = config::load_config(args.config.as_deref(), &start_dir)?;

    let (disabled, settings, mut project) = match loaded_cfg {
        Some((path, cfg)) => {
            bsl_clippy::debug_event!(config = %path.display(), "loaded configuration");
            (
                cfg.lints.disabled.clone(),
                LintSettings::default()
                    .with_config_levels(cfg.lints.levels)
                    .disable(cfg.lints.disabled),
                cfg.project,
            )
        }
        None => (Vec::new(), LintSettings::default(), ProjectSettings::default()),
    };

    // CLI flags take precedence over config
    if let Some(variant) = args.variant {
        project = project.with_variant(variant);
    }
    if let Some(modality) = args.modality {
        project = project.with_modality(modality);
    }
    if args.extension {
        project = project.as_extension();
    }

    let registry = LintRegistry::default_rules_filtered(&args.only, &args.skip, &disabled)?;
    let engine = LintEngine::new_with_settings(registry, settings).with_project(project);

    let base_files = collect_json_files(&args.base)?;
    let base = base_files
        .iter()
        .map(|p| read_module(p))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Session {
        engine,
        base: ExtensionIndex::new(base),
    })
}

fn lint_command(args: LintArgs) -> anyhow::Result<ExitCode> {
    if args.paths.is_empty() {
        anyhow::bail!("no module snapshots given");
    }
    if args.fix {
        return fix_command(args);
    }

    let session = build_session(&args)?;
    let files = collect_json_files(&args.paths)?;

    let mut total_diags = 0usize;
    let mut has_error = false;

    match args.format {
        OutputFormat::Json => {
            let mut out: Vec<JsonDiagnostic> = Vec::new();
            for path in &files {
                let module = read_module(path)?;
                for d in session.lint(&module, path) {
                    has_error |= d.level == LintLevel::Error;
                    total_diags += 1;
                    out.push(JsonDiagnostic::from_diagnostic(&d, path));
                }
            }

            out.sort_by(|a, b| {
                (a.file.as_str(), a.row, a.column, a.lint.as_str())
                    .cmp(&(b.file.as_str(), b.row, b.column, b.lint.as_str()))
            });

            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Pretty | OutputFormat::Github => {
            for path in &files {
                let module = read_module(path)?;
                let diagnostics = session.lint(&module, path);
                for diag in &diagnostics {
                    has_error |= print_diagnostic(diag, args.format, args.deny_warnings);
                }
                if matches!(args.format, OutputFormat::Pretty) {
                    println!("{} diagnostics for {}", diagnostics.len(), path.display());
                }
                total_diags += diagnostics.len();
            }
        }
    }

    if has_error || (args.deny_warnings && total_diags > 0) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print one diagnostic; returns whether it counts as an error.
fn print_diagnostic(diag: &Diagnostic, format: OutputFormat, deny_warnings: bool) -> bool {
    let file = diag.file.as_deref().unwrap_or("<unknown>");
    match format {
        OutputFormat::Pretty => {
            println!(
                "{}:{}:{}: {}: {}: {}",
                file,
                diag.span.start.row,
                diag.span.start.column,
                diag.level.as_str(),
                diag.lint.name,
                diag.message
            );
            if let Some(help) = &diag.help {
                println!("  help: {help}");
            }
            diag.level == LintLevel::Error
        }
        OutputFormat::Github => {
            let kind = if diag.level == LintLevel::Error
                || (deny_warnings && diag.level == LintLevel::Warn)
            {
                "error"
            } else {
                "warning"
            };
            println!(
                "::{} file={},line={},col={},title={}::{}",
                kind,
                github_escape(file),
                diag.span.start.row,
                diag.span.start.column,
                diag.lint.name,
                github_escape(&diag.message)
            );
            kind == "error"
        }
        OutputFormat::Json => unreachable!("json handled elsewhere"),
    }
}

#[derive(Debug, Serialize)]
struct JsonDiagnostic {
    file: String,
    row: usize,
    column: usize,
    end_row: usize,
    end_column: usize,
    level: String,
    lint: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<JsonFix>,
}

#[derive(Debug, Serialize)]
struct JsonFix {
    offset: usize,
    length: usize,
    replacement: String,
}

impl JsonDiagnostic {
    fn from_diagnostic(d: &Diagnostic, path: &Path) -> Self {
        Self {
            file: d.file.clone().unwrap_or_else(|| path.display().to_string()),
            row: d.span.start.row,
            column: d.span.start.column,
            end_row: d.span.end.row,
            end_column: d.span.end.column,
            level: d.level.as_str().to_string(),
            lint: d.lint.name.to_string(),
            message: d.message.clone(),
            help: d.help.clone(),
            fix: d.suggestion.as_ref().map(|s| JsonFix {
                offset: s.edit.anchor,
                length: s.edit.length,
                replacement: s.edit.replacement.clone(),
            }),
        }
    }
}

/// Handle --fix mode: write the fixed text of each module next to its snapshot.
///
/// Snapshots stay untouched since their spans describe the old text; the
/// front end exports the fixed module again before the next lint run.
fn fix_command(args: LintArgs) -> anyhow::Result<ExitCode> {
    let session = build_session(&args)?;
    let files = collect_json_files(&args.paths)?;

    let mut total_fixed = 0usize;
    let mut skipped_unsafe = 0usize;
    let mut skipped_other = 0usize;
    let mut files_modified = 0usize;

    for path in &files {
        let module = read_module(path)?;
        let diagnostics = session.lint(&module, path);
        if diagnostics.iter().all(|d| d.suggestion.is_none()) {
            continue;
        }

        let result = fixer::apply_suggestions(&module.source, &diagnostics, args.unsafe_fixes)
            .with_context(|| format!("failed to apply fixes to {}", path.display()))?;
        skipped_unsafe += result.skipped_unsafe;
        skipped_other += result.skipped_other;
        if result.fixes_applied == 0 {
            continue;
        }
        total_fixed += result.fixes_applied;

        if args.diff {
            let diff = fixer::format_diff(&module.source, &result.fixed_source, path);
            if !diff.is_empty() {
                println!("{diff}");
            }
        } else {
            let target = fixer::fixed_source_path(path);
            std::fs::write(&target, &result.fixed_source)
                .with_context(|| format!("failed to write {}", target.display()))?;
            bsl_clippy::debug_event!(file = %target.display(), fixes = result.fixes_applied, "wrote fixed module");
            files_modified += 1;
        }
    }

    if args.diff {
        println!(
            "\n{} fix(es) would be applied to {} file(s)",
            total_fixed,
            files.len()
        );
    } else {
        println!(
            "Applied {} fix(es) to {} file(s)",
            total_fixed, files_modified
        );
    }
    if skipped_unsafe > 0 {
        println!(
            "{} fix(es) skipped (use --unsafe-fixes to apply)",
            skipped_unsafe
        );
    }
    if skipped_other > 0 {
        println!(
            "{} fix(es) skipped (overlapping or out of date)",
            skipped_other
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn read_module(path: &Path) -> anyhow::Result<Module> {
    Module::load(path).with_context(|| format!("failed to load module snapshot {}", path.display()))
}

fn github_escape(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn collect_json_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_file() {
            out.push(path.clone());
            continue;
        }
        let walker = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| !should_skip_dir(e.path()));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
            let p = entry.path();
            if entry.file_type().is_file() && p.extension().and_then(|e| e.to_str()) == Some("json")
            {
                out.push(p.to_path_buf());
            }
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}

fn should_skip_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };

    matches!(name, ".git" | "target" | "node_modules")
}

fn infer_start_dir(args: &LintArgs) -> anyhow::Result<PathBuf> {
    let base = match args.paths.first() {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };

    let base = if base.is_file() {
        base.parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        base
    };

    Ok(base)
}

use bsl_clippy::LintEngine;
use bsl_clippy::ast::{AstBuilder, Module, ModuleItem};
use bsl_clippy::config;
use bsl_clippy::level::LintLevel;
use bsl_clippy::lint::{LintRegistry, LintSettings};
use bsl_clippy::project::{ModalityPolicy, ScriptVariant};

fn modal_module() -> Module {
    let src = "// См.ОбщийМодуль.Метод\nПроцедура Показ(Текст)\n    Вопрос(Текст, Режим);\nКонецПроцедуры\n";
    let mut b = AstBuilder::new(src);
    let method = b.method(|b| {
        vec![b.simple(|b| {
            b.call("Вопрос", |b| vec![Some(b.ident("Текст")), Some(b.ident("Режим"))])
        })]
    });
    b.finish("ОбщийМодуль", vec![ModuleItem::Method(method)], Vec::new())
}

fn engine_from(cfg: config::BslClippyConfig) -> LintEngine {
    let empty: Vec<String> = Vec::new();
    let registry = LintRegistry::default_rules_filtered(&empty, &empty, &cfg.lints.disabled)
        .expect("registry");
    let settings = LintSettings::default()
        .with_config_levels(cfg.lints.levels)
        .disable(cfg.lints.disabled);
    LintEngine::new_with_settings(registry, settings).with_project(cfg.project)
}

#[test]
fn config_is_discovered_from_a_nested_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(config::DEFAULT_CONFIG_FILE_NAME),
        "[project]\nmodality = \"dont-use\"\n",
    )
    .unwrap();
    let nested = dir.path().join("src/CommonModules");
    std::fs::create_dir_all(&nested).unwrap();

    let (path, cfg) = config::load_config(None, &nested)
        .unwrap()
        .expect("config found");
    assert_eq!(path, dir.path().join(config::DEFAULT_CONFIG_FILE_NAME));
    assert_eq!(cfg.project.modality, ModalityPolicy::DontUse);
    assert_eq!(cfg.project.variant, ScriptVariant::Primary);
}

#[test]
fn missing_config_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(config::load_config(None, dir.path()).unwrap().is_none());
}

#[test]
fn project_section_accepts_alias_spellings() {
    let cfg: config::BslClippyConfig = toml::from_str(
        "[project]\nscript_variant = \"english\"\nmodality = \"use-with-warnings\"\nextension = true\n",
    )
    .unwrap();
    assert_eq!(cfg.project.variant, ScriptVariant::Alternate);
    assert_eq!(cfg.project.modality, ModalityPolicy::Unrestricted);
    assert!(cfg.project.extension);
}

#[test]
fn config_can_promote_lint_to_error() {
    let cfg: config::BslClippyConfig = toml::from_str(
        "[project]\nmodality = \"dont-use\"\n\n[lints]\ndont_use_modality_mode = \"error\"\n",
    )
    .unwrap();
    let diags = engine_from(cfg).lint_module(&modal_module());

    assert!(
        diags
            .iter()
            .any(|d| d.lint.name == "dont_use_modality_mode" && d.level == LintLevel::Error)
    );
}

#[test]
fn config_can_disable_lint() {
    let cfg: config::BslClippyConfig = toml::from_str(
        "[project]\nmodality = \"dont-use\"\n\n[lints]\ndisabled = [\"dont-use-modality-mode\"]\n",
    )
    .unwrap();
    let diags = engine_from(cfg).lint_module(&modal_module());

    assert!(!diags.iter().any(|d| d.lint.name == "dont_use_modality_mode"));
    assert!(diags.iter().any(|d| d.lint.name == "link_part_comment_space"));
}

#[test]
fn allow_level_silences_a_lint() {
    let cfg: config::BslClippyConfig =
        toml::from_str("[lints]\nlink_part_comment_space = \"allow\"\n").unwrap();
    let diags = engine_from(cfg).lint_module(&modal_module());
    assert!(diags.is_empty());
}

#[test]
fn unknown_lint_names_are_rejected() {
    let empty: Vec<String> = Vec::new();
    let err = LintRegistry::default_rules_filtered(&["no_such_lint".to_string()], &empty, &empty)
        .err()
        .expect("unknown lint");
    assert!(err.to_string().contains("no_such_lint"));
}

#[test]
fn broken_config_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(config::DEFAULT_CONFIG_FILE_NAME);
    std::fs::write(&path, "[project\n").unwrap();

    let err = config::load_config(Some(&path), dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

//! End-to-end runs of the `bsl-clippy` binary over snapshots on disk.

use bsl_clippy::ast::{AstBuilder, Module, ModuleItem};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const MODAL_SOURCE: &str =
    "Процедура Показ(Текст)\n    ОткрытьЗначение(Текст, Заголовок);\n    Сообщить(Текст);\nКонецПроцедуры\n";

fn modal_module() -> Module {
    let mut b = AstBuilder::new(MODAL_SOURCE);
    let method = b.method(|b| {
        vec![
            b.simple(|b| {
                b.call("ОткрытьЗначение", |b| {
                    vec![Some(b.ident("Текст")), Some(b.ident("Заголовок"))]
                })
            }),
            b.simple(|b| b.call("Сообщить", |b| vec![Some(b.ident("Текст"))])),
        ]
    });
    b.finish("ОбщийМодуль", vec![ModuleItem::Method(method)], Vec::new())
}

/// Temp project holding one method-bearing snapshot and an optional config.
fn project(config: Option<&str>) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    if let Some(config) = config {
        std::fs::write(dir.path().join("bsl-clippy.toml"), config).unwrap();
    }
    let snapshot = dir.path().join("ОбщийМодуль.json");
    let json = serde_json::to_string_pretty(&modal_module()).unwrap();
    std::fs::write(&snapshot, json).unwrap();
    (dir, snapshot)
}

fn run(args: &[&str], path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bsl-clippy"))
        .args(args)
        .arg(path)
        .env("RUST_LOG", "off")
        .output()
        .expect("binary runs")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

const DONT_USE: &str = "[project]\nmodality = \"dont-use\"\n";

#[test]
fn clean_module_exits_zero() {
    let (_dir, snapshot) = project(None);
    let out = run(&[], &snapshot);

    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("0 diagnostics"));
}

#[test]
fn warnings_are_reported_and_exit_zero() {
    let (_dir, snapshot) = project(Some(DONT_USE));
    let out = run(&[], &snapshot);
    let text = stdout(&out);

    assert_eq!(out.status.code(), Some(0));
    assert!(text.contains(":2:5: "), "{text}");
    assert!(text.contains("dont_use_modality_mode"), "{text}");
    assert!(text.contains("1 diagnostics"), "{text}");
}

#[test]
fn deny_warnings_exits_one() {
    let (_dir, snapshot) = project(Some(DONT_USE));
    let out = run(&["--deny-warnings"], &snapshot);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn error_level_from_config_exits_one() {
    let (_dir, snapshot) = project(Some(
        "[project]\nmodality = \"dont-use\"\n\n[lints]\ndont_use_modality_mode = \"error\"\n",
    ));
    let out = run(&["--format", "json"], &snapshot);
    assert_eq!(out.status.code(), Some(1));

    let findings: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let findings = findings.as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["lint"], "dont_use_modality_mode");
    assert_eq!(findings[0]["level"], "error");
    assert_eq!(findings[0]["row"], 2);
    assert_eq!(findings[0]["fix"]["replacement"], "ПоказатьЗначение(,Текст, Заголовок)");
}

#[test]
fn command_line_policy_overrides_missing_config() {
    let (_dir, snapshot) = project(None);
    let out = run(&["--modality", "dont-use", "--deny-warnings"], &snapshot);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn unreadable_snapshot_exits_two() {
    let (dir, _snapshot) = project(None);
    let broken = dir.path().join("Сломанный.json");
    std::fs::write(&broken, "{\"name\":").unwrap();

    let out = run(&[], &broken);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to load module snapshot"));
}

#[test]
fn missing_path_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&[], &dir.path().join("нет"));
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn diff_shows_the_rewrite_without_writing() {
    let (_dir, snapshot) = project(Some(DONT_USE));
    let before = std::fs::read_to_string(&snapshot).unwrap();

    let out = run(&["--fix", "--diff"], &snapshot);
    let text = stdout(&out);

    assert_eq!(out.status.code(), Some(0));
    assert!(text.contains("-    ОткрытьЗначение(Текст, Заголовок);"), "{text}");
    assert!(text.contains("+    ПоказатьЗначение(,Текст, Заголовок);"), "{text}");
    assert!(text.contains("1 fix(es) would be applied"), "{text}");
    assert_eq!(std::fs::read_to_string(&snapshot).unwrap(), before);
    assert!(!snapshot.with_extension("bsl").exists());
}

#[test]
fn fix_writes_module_text_and_keeps_the_snapshot() {
    let (_dir, snapshot) = project(Some(DONT_USE));
    let before = std::fs::read_to_string(&snapshot).unwrap();

    let out = run(&["--fix"], &snapshot);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("Applied 1 fix(es) to 1 file(s)"));

    let fixed = std::fs::read_to_string(snapshot.with_extension("bsl")).unwrap();
    assert_eq!(
        fixed,
        MODAL_SOURCE.replace("ОткрытьЗначение(Текст, Заголовок)", "ПоказатьЗначение(,Текст, Заголовок)")
    );

    // The snapshot still describes the old text, so it still loads and lints.
    assert_eq!(std::fs::read_to_string(&snapshot).unwrap(), before);
    let again = run(&["--deny-warnings"], &snapshot);
    assert_eq!(again.status.code(), Some(1));
}

#[test]
fn extension_methods_are_checked_against_base_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let base_src = "#Если Сервер Тогда\nПроцедура Провести() Экспорт\nКонецПроцедуры\n#КонецЕсли\n";
    let mut b = AstBuilder::new(base_src);
    let region = b.region(|b| vec![ModuleItem::Method(b.method(|_| Vec::new()))]);
    let base = b.finish("ДокументыОбщий", vec![ModuleItem::Region(region)], Vec::new());

    let ext_src = "&После(\"Провести\")\nПроцедура Расш1_Провести()\nКонецПроцедуры";
    let mut b = AstBuilder::new(ext_src);
    let method = b.method(|_| Vec::new());
    let ext = b.finish("ДокументыОбщий", vec![ModuleItem::Method(method)], Vec::new());

    let base_path = dir.path().join("base.json");
    let ext_path = dir.path().join("ext.json");
    std::fs::write(&base_path, serde_json::to_string(&base).unwrap()).unwrap();
    std::fs::write(&ext_path, serde_json::to_string(&ext).unwrap()).unwrap();
    let base_arg = base_path.to_str().unwrap();

    let out = run(&["--extension", "--deny-warnings", "--base", base_arg], &ext_path);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).contains("extension_method_visible_mode"));

    let out = run(&["--deny-warnings", "--base", base_arg], &ext_path);
    assert_eq!(out.status.code(), Some(0));
}

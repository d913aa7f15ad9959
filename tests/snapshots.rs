//! JSON module snapshots as read by the command-line driver.

mod support;

use bsl_clippy::ast::{AstBuilder, Module, ModuleItem};
use bsl_clippy::environment::Environments;
use bsl_clippy::project::ProjectSettings;
use support::{flagged, lint};

#[test]
fn minimal_snapshot_uses_defaults() {
    let json = r#"{
        "name": "МодульМенеджера",
        "source": "Выполнить(Код);",
        "statements": [
            {
                "kind": "execute",
                "expression": { "kind": "access", "name": "Код", "span": { "offset": 19, "length": 6 } },
                "span": { "offset": 0, "length": 27 }
            }
        ]
    }"#;
    let module: Module = serde_json::from_str(json).unwrap();
    assert_eq!(module.environments, Environments::all());
    assert!(module.items.is_empty());

    let diags = lint(&module, ProjectSettings::default());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].lint.name, "restriction_execute_eval_server");
    assert_eq!(flagged(&module, &diags[0]), "Выполнить(Код);");
}

#[test]
fn built_modules_lint_the_same_after_serialization() {
    let src = "&НаСервере\nФункция Расчет(Формула)\n    Возврат Вычислить(Формула);\nКонецФункции\n";
    let mut b = AstBuilder::new(src);
    let method = b.method(|b| {
        vec![b.return_statement(|b| Some(b.call("Вычислить", |b| vec![Some(b.ident("Формула"))])))]
    });
    let module = b.finish("ОбщийМодуль", vec![ModuleItem::Method(method)], Vec::new());

    let json = serde_json::to_string_pretty(&module).unwrap();
    let restored: Module = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, module);

    let before = lint(&module, ProjectSettings::default());
    let after = lint(&restored, ProjectSettings::default());
    assert_eq!(before.len(), 1);
    assert_eq!(
        before.iter().map(|d| d.span).collect::<Vec<_>>(),
        after.iter().map(|d| d.span).collect::<Vec<_>>()
    );
}

#[test]
fn bad_spans_are_skipped_not_fatal() {
    let json = r#"{
        "name": "М",
        "source": "Выполнить(Код);",
        "statements": [
            { "kind": "execute", "expression": { "kind": "access", "name": "Код" }, "span": { "offset": 3, "length": 100 } }
        ]
    }"#;
    let module: Module = serde_json::from_str(json).unwrap();
    assert!(lint(&module, ProjectSettings::default()).is_empty());
}

//! End-to-end fix application over engine output.

mod support;

use bsl_clippy::ast::{AstBuilder, Module, ModuleItem};
use bsl_clippy::extension::ExtensionIndex;
use bsl_clippy::fixer::{apply_suggestions, format_diff};
use bsl_clippy::lint::LintServices;
use bsl_clippy::project::{ModalityPolicy, ProjectSettings};
use std::path::Path;
use support::{lint, lint_with};

fn form_module() -> Module {
    let src = "// См.:ОбщийМодуль.Сохранить\nПроцедура Сохранить(Форма, Текст)\n    Если Вопрос(Текст, Режим) = Да Тогда\n        Форма.ОткрытьМодально();\n    КонецЕсли;\n    Предупреждение(Текст);\nКонецПроцедуры\n";
    let mut b = AstBuilder::new(src);
    let method = b.method(|b| {
        vec![
            b.if_statement(
                |b| {
                    b.binary(
                        bsl_clippy::ast::BinaryOp::Eq,
                        |b| {
                            b.call("Вопрос", |b| {
                                vec![Some(b.ident("Текст")), Some(b.ident("Режим"))]
                            })
                        },
                        |b| b.ident("Да"),
                    )
                },
                |b| {
                    vec![b.simple(|b| {
                        b.method_call(|b| b.ident("Форма"), "ОткрытьМодально", |_| Vec::new())
                    })]
                },
            ),
            b.simple(|b| b.call("Предупреждение", |b| vec![Some(b.ident("Текст"))])),
        ]
    });
    b.finish("ФормаДокумента", vec![ModuleItem::Method(method)], Vec::new())
}

#[test]
fn all_safe_fixes_apply_in_one_pass() {
    let module = form_module();
    let project = ProjectSettings::default().with_modality(ModalityPolicy::DontUse);
    let diags = lint(&module, project);
    assert_eq!(diags.len(), 4);

    let result = apply_suggestions(&module.source, &diags, false).unwrap();
    assert_eq!((result.fixes_applied, result.fixes_skipped()), (4, 0));
    insta::assert_snapshot!(result.fixed_source, @r"
    // См. ОбщийМодуль.Сохранить
    Процедура Сохранить(Форма, Текст)
        Если ПоказатьВопрос(,Текст, Режим) = Да Тогда
            Форма.Показать();
        КонецЕсли;
        ПоказатьПредупреждение(,Текст);
    КонецПроцедуры
    ");
}

#[test]
fn diff_lists_only_changed_lines() {
    let module = form_module();
    let project = ProjectSettings::default().with_modality(ModalityPolicy::DontUse);
    let diags = lint(&module, project);
    let result = apply_suggestions(&module.source, &diags, false).unwrap();

    let diff = format_diff(&module.source, &result.fixed_source, Path::new("Form.json"));
    assert!(diff.contains("-    Предупреждение(Текст);"));
    assert!(diff.contains("+    ПоказатьПредупреждение(,Текст);"));
    assert!(!diff.contains("-Процедура"));
}

#[test]
fn wrap_fix_needs_unsafe_opt_in() {
    let base = {
        let src = "#Если Сервер Тогда\nПроцедура Провести()\nКонецПроцедуры\n#КонецЕсли\n";
        let mut b = AstBuilder::new(src);
        let region = b.region(|b| vec![ModuleItem::Method(b.method(|_| Vec::new()))]);
        b.finish("Документ", vec![ModuleItem::Region(region)], Vec::new())
    };
    let derived = {
        let src = "&После(\"Провести\")\nПроцедура Расш_Провести()\nКонецПроцедуры\n";
        let mut b = AstBuilder::new(src);
        let method = b.method(|_| Vec::new());
        b.finish("Документ", vec![ModuleItem::Method(method)], Vec::new())
    };
    let index = ExtensionIndex::new(vec![base]);
    let services = LintServices::default().with_resolver(&index);
    let diags = lint_with(&derived, ProjectSettings::default().as_extension(), &services);
    assert_eq!(diags.len(), 1);

    let safe = apply_suggestions(&derived.source, &diags, false).unwrap();
    assert_eq!(safe.fixed_source, derived.source);
    assert_eq!(safe.skipped_unsafe, 1);

    let all = apply_suggestions(&derived.source, &diags, true).unwrap();
    assert_eq!(all.fixes_applied, 1);
    assert!(all.fixed_source.starts_with("#Если Сервер Тогда\n&После"));
    assert!(all.fixed_source.ends_with("КонецПроцедуры\n#КонецЕсли\n"));
}

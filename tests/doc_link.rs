mod support;

use bsl_clippy::ast::{AstBuilder, Module, ModuleItem};
use bsl_clippy::project::ProjectSettings;
use support::{fixed, flagged, lint, only};

const LINT: &str = "link_part_comment_space";

fn documented(src: &str) -> Module {
    let mut b = AstBuilder::new(src);
    let method = b.method(|_| Vec::new());
    b.finish("ОбщийМодуль", vec![ModuleItem::Method(method)], Vec::new())
}

#[test]
fn attached_link_is_reported_at_the_separator() {
    let module = documented(
        "// Заполняет табличную часть.\n// См.ОбщийМодуль.Заполнить\nПроцедура Заполнить() Экспорт\nКонецПроцедуры",
    );
    let diags = lint(&module, ProjectSettings::default());
    let diags = only(&diags, LINT);

    assert_eq!(diags.len(), 1);
    assert_eq!(flagged(&module, diags[0]), ".О");
    assert_eq!(diags[0].span.start.row, 2);
    assert_eq!(
        fixed(&module, diags[0]).lines().nth(1),
        Some("// См. ОбщийМодуль.Заполнить")
    );
}

#[test]
fn punctuation_between_keyword_and_link_is_replaced() {
    let module = documented("// See:CommonModule.Fill\nProcedure Fill() Export\nEndProcedure");
    let diags = lint(&module, ProjectSettings::default());
    let diags = only(&diags, LINT);

    assert_eq!(diags.len(), 1);
    assert_eq!(flagged(&module, diags[0]), ":");
    assert_eq!(
        fixed(&module, diags[0]).lines().next(),
        Some("// See CommonModule.Fill")
    );
}

#[test]
fn well_formed_links_are_quiet() {
    let module = documented(
        "// См. ОбщийМодуль.Заполнить\n// See\tCommonModule.Fill\n// Seen elsewhere.\nПроцедура Заполнить()\nКонецПроцедуры",
    );
    assert!(only(&lint(&module, ProjectSettings::default()), LINT).is_empty());
}

#[test]
fn methods_without_comments_are_skipped() {
    let module = documented("Процедура Заполнить()\nКонецПроцедуры");
    assert!(module.methods()[0].doc_comment.is_none());
    assert!(only(&lint(&module, ProjectSettings::default()), LINT).is_empty());
}

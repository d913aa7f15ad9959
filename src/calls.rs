//! Registry of risky calls, keyed by a spelling-independent id.
//!
//! Every entry pairs the Russian and English spelling of a built-in routine.
//! Modal UI calls carry the template used to rewrite them into their
//! asynchronous counterpart; the evaluation and safe-mode entries are looked
//! up by the guard analysis only.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::project::ScriptVariant;

/// Spelling-independent identifier of a registered call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalId {
    OpenValue,
    OpenFormModal,
    QueryBox,
    MessageBox,
    ChooseFromList,
    InputString,
    InputNumber,
    InputDate,
    DoModal,
    PutFile,
    CheckItems,
    ChooseItem,
    InstallFileSystemExtension,
    InstallAddIn,
    Eval,
    SetSafeMode,
}

impl CanonicalId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalId::OpenValue => "open-value",
            CanonicalId::OpenFormModal => "open-form-modal",
            CanonicalId::QueryBox => "query-box",
            CanonicalId::MessageBox => "message-box",
            CanonicalId::ChooseFromList => "choose-from-list",
            CanonicalId::InputString => "input-string",
            CanonicalId::InputNumber => "input-number",
            CanonicalId::InputDate => "input-date",
            CanonicalId::DoModal => "do-modal",
            CanonicalId::PutFile => "put-file",
            CanonicalId::CheckItems => "check-items",
            CanonicalId::ChooseItem => "choose-item",
            CanonicalId::InstallFileSystemExtension => "install-filesystem-extension",
            CanonicalId::InstallAddIn => "install-addin",
            CanonicalId::Eval => "eval",
            CanonicalId::SetSafeMode => "set-safe-mode",
        }
    }
}

/// How the argument list is re-assembled around the replacement name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStyle {
    /// `NewName(args)`
    PassthroughArgs,
    /// `NewName(,args)`: the replacement takes a leading callback parameter.
    CommaPrefixArgs,
    /// `NewName(,` with the argument text and `)` left in place.
    SelectorSuffix,
}

/// Part of the call text covered by the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditExtent {
    /// From the anchor through the closing parenthesis.
    ThroughCallEnd,
    /// From the anchor through the opening parenthesis.
    ThroughOpenParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteTemplate {
    pub replacement_primary: &'static str,
    pub replacement_alternate: &'static str,
    pub style: RewriteStyle,
    pub extent: EditExtent,
}

impl RewriteTemplate {
    pub fn replacement(&self, variant: ScriptVariant) -> &'static str {
        variant.pick(self.replacement_primary, self.replacement_alternate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalCallEntry {
    pub id: CanonicalId,
    pub primary_name: &'static str,
    pub alternate_name: &'static str,
    /// Present for modal calls that have an asynchronous equivalent.
    pub rewrite: Option<RewriteTemplate>,
}

impl CanonicalCallEntry {
    pub fn name(&self, variant: ScriptVariant) -> &'static str {
        variant.pick(self.primary_name, self.alternate_name)
    }

    pub fn is_modal(&self) -> bool {
        self.rewrite.is_some()
    }
}

const fn modal(
    id: CanonicalId,
    primary_name: &'static str,
    alternate_name: &'static str,
    replacement_primary: &'static str,
    replacement_alternate: &'static str,
    style: RewriteStyle,
) -> CanonicalCallEntry {
    let extent = match style {
        RewriteStyle::SelectorSuffix => EditExtent::ThroughOpenParen,
        RewriteStyle::PassthroughArgs | RewriteStyle::CommaPrefixArgs => EditExtent::ThroughCallEnd,
    };
    CanonicalCallEntry {
        id,
        primary_name,
        alternate_name,
        rewrite: Some(RewriteTemplate {
            replacement_primary,
            replacement_alternate,
            style,
            extent,
        }),
    }
}

const fn plain(
    id: CanonicalId,
    primary_name: &'static str,
    alternate_name: &'static str,
) -> CanonicalCallEntry {
    CanonicalCallEntry {
        id,
        primary_name,
        alternate_name,
        rewrite: None,
    }
}

use CanonicalId as Id;
use RewriteStyle::{CommaPrefixArgs, PassthroughArgs, SelectorSuffix};

pub static CANONICAL_CALLS: &[CanonicalCallEntry] = &[
    modal(Id::OpenValue, "ОткрытьЗначение", "OpenValue", "ПоказатьЗначение", "ShowValue", CommaPrefixArgs),
    modal(Id::OpenFormModal, "ОткрытьФормуМодально", "OpenFormModal", "ОткрытьФорму", "OpenForm", PassthroughArgs),
    modal(Id::QueryBox, "Вопрос", "DoQueryBox", "ПоказатьВопрос", "ShowQueryBox", CommaPrefixArgs),
    modal(Id::MessageBox, "Предупреждение", "DoMessageBox", "ПоказатьПредупреждение", "ShowMessageBox", CommaPrefixArgs),
    modal(Id::ChooseFromList, "ВыбратьИзСписка", "ChooseFromList", "ПоказатьВыборИзСписка", "ShowChooseFromList", SelectorSuffix),
    modal(Id::InputString, "ВвестиСтроку", "InputString", "ПоказатьВводСтроки", "ShowInputString", CommaPrefixArgs),
    modal(Id::InputNumber, "ВвестиЧисло", "InputNumber", "ПоказатьВводЧисла", "ShowInputNumber", CommaPrefixArgs),
    modal(Id::InputDate, "ВвестиДату", "InputDate", "ПоказатьВводДаты", "ShowInputDate", CommaPrefixArgs),
    modal(Id::DoModal, "ОткрытьМодально", "DoModal", "Показать", "Show", PassthroughArgs),
    modal(Id::PutFile, "ПоместитьФайл", "PutFile", "НачатьПомещениеФайла", "BeginPutFile", CommaPrefixArgs),
    modal(Id::CheckItems, "ОтметитьЭлементы", "CheckItems", "ПоказатьОтметкуЭлементов", "ShowCheckItems", SelectorSuffix),
    modal(Id::ChooseItem, "ВыбратьЭлемент", "ChooseItem", "ПоказатьВыборЭлемента", "ShowChooseItem", SelectorSuffix),
    modal(
        Id::InstallFileSystemExtension,
        "УстановитьРасширениеРаботыСФайлами",
        "InstallFileSystemExtension",
        "НачатьУстановкуРасширенияРаботыСФайлами",
        "BeginInstallFileSystemExtension",
        PassthroughArgs,
    ),
    modal(
        Id::InstallAddIn,
        "УстановитьВнешнююКомпоненту",
        "InstallAddIn",
        "НачатьУстановкуВнешнейКомпоненты",
        "BeginInstallAddIn",
        CommaPrefixArgs,
    ),
    plain(Id::Eval, "Вычислить", "Eval"),
    plain(Id::SetSafeMode, "УстановитьБезопасныйРежим", "SetSafeMode"),
];

fn index() -> &'static HashMap<String, &'static CanonicalCallEntry> {
    static INDEX: OnceLock<HashMap<String, &'static CanonicalCallEntry>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::with_capacity(CANONICAL_CALLS.len() * 2);
        for entry in CANONICAL_CALLS {
            map.insert(entry.primary_name.to_lowercase(), entry);
            map.insert(entry.alternate_name.to_lowercase(), entry);
        }
        map
    })
}

/// Case-insensitive lookup by either spelling.
pub fn lookup(name: &str) -> Option<&'static CanonicalCallEntry> {
    index().get(&name.to_lowercase()).copied()
}

/// Lookup restricted to modal calls with a rewrite template.
pub fn lookup_modal(name: &str) -> Option<&'static CanonicalCallEntry> {
    lookup(name).filter(|entry| entry.is_modal())
}

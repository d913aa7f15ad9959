//! Owned BSL syntax tree consumed by the checks.
//!
//! The tree is produced outside this crate (an IDE front-end or a JSON
//! snapshot) or assembled with [`builder::AstBuilder`]. Every node may carry a
//! [`NodeSpan`] pointing back into [`Module::source`]; nodes without one are
//! synthesized and have no concrete syntax.

pub mod builder;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clippy_ensure;
use crate::environment::{CompilationDirective, Condition, Environments};
use crate::error::ClippyResult;

pub use builder::AstBuilder;

/// Byte range of a node inside its module source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSpan {
    pub offset: usize,
    pub length: usize,
}

impl NodeSpan {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self {
            offset: start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// One BSL module: its text, where it runs, and what it declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub source: String,
    #[serde(default = "Environments::all")]
    pub environments: Environments,
    #[serde(default)]
    pub items: Vec<ModuleItem>,
    /// Module body executed on module load, outside any routine.
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl Module {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            environments: Environments::all(),
            items: Vec::new(),
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_environments(mut self, environments: Environments) -> Self {
        self.environments = environments;
        self
    }

    /// All methods of the module in document order, descending into regions.
    pub fn methods(&self) -> Vec<&Method> {
        fn collect<'m>(items: &'m [ModuleItem], out: &mut Vec<&'m Method>) {
            for item in items {
                match item {
                    ModuleItem::Method(method) => out.push(method),
                    ModuleItem::Region(region) => collect(&region.items, out),
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }

    /// Case-insensitive method lookup by name.
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        let lower = name.to_lowercase();
        self.methods()
            .into_iter()
            .find(|m| m.name.to_lowercase() == lower)
    }

    /// Parse a JSON module snapshot.
    pub fn from_json(text: &str) -> ClippyResult<Self> {
        let module: Module = serde_json::from_str(text)?;
        clippy_ensure!(!module.name.trim().is_empty(), "module snapshot has no name");
        Ok(module)
    }

    /// Read a JSON module snapshot from disk.
    pub fn load(path: &Path) -> ClippyResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Tagged with `item` so the tag never collides with [`Method::kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ModuleItem {
    Method(Method),
    Region(PreprocessorRegion),
}

/// `#If <condition> Then ... #EndIf` at module level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorRegion {
    pub condition: Condition,
    /// Text of the condition between the `#If` and `Then` keywords.
    #[serde(default)]
    pub condition_span: Option<NodeSpan>,
    #[serde(default)]
    pub items: Vec<ModuleItem>,
    #[serde(default)]
    pub span: Option<NodeSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub kind: MethodKind,
    #[serde(default)]
    pub export: bool,
    #[serde(default)]
    pub directives: Vec<CompilationDirective>,
    #[serde(default)]
    pub annotations: Vec<ExtensionAnnotation>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    /// Whole declaration, including leading directive and annotation lines.
    #[serde(default)]
    pub span: Option<NodeSpan>,
    #[serde(default)]
    pub name_span: Option<NodeSpan>,
    /// Contiguous `//` comment block directly above the declaration.
    #[serde(default)]
    pub doc_comment: Option<NodeSpan>,
}

impl Method {
    /// Source routine this method extends, when it carries an extension annotation.
    pub fn extension_target(&self) -> Option<&ExtensionAnnotation> {
        self.annotations.first()
    }
}

/// `&Before("Name")` style link from an extension method to its source method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAnnotation {
    pub kind: AnnotationKind,
    pub target: String,
    #[serde(default)]
    pub span: Option<NodeSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Before,
    After,
    Around,
    ChangeAndValidate,
}

impl AnnotationKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().trim_start_matches('&').to_lowercase();
        match lower.as_str() {
            "перед" | "before" => Some(AnnotationKind::Before),
            "после" | "after" => Some(AnnotationKind::After),
            "вместо" | "around" => Some(AnnotationKind::Around),
            "изменениеиконтроль" | "changeandvalidate" => Some(AnnotationKind::ChangeAndValidate),
            _ => None,
        }
    }
}

/// Branch of an `If` chain: predicate plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub predicate: Expression,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Expression statement or assignment (`left = right`).
    Simple {
        left: Expression,
        #[serde(default)]
        right: Option<Expression>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    If {
        if_part: Conditional,
        #[serde(default)]
        else_if_parts: Vec<Conditional>,
        #[serde(default)]
        else_statements: Option<Vec<Statement>>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    While {
        predicate: Expression,
        #[serde(default)]
        statements: Vec<Statement>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    /// `For Each <variable> In <collection> Do`.
    For {
        variable: String,
        collection: Expression,
        #[serde(default)]
        statements: Vec<Statement>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    Try {
        #[serde(default)]
        statements: Vec<Statement>,
        #[serde(default)]
        except_statements: Vec<Statement>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    /// `Execute(<expression>)`.
    Execute {
        expression: Expression,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    Return {
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
}

impl Statement {
    pub fn span(&self) -> Option<NodeSpan> {
        match self {
            Statement::Simple { span, .. }
            | Statement::If { span, .. }
            | Statement::While { span, .. }
            | Statement::For { span, .. }
            | Statement::Try { span, .. }
            | Statement::Execute { span, .. }
            | Statement::Return { span, .. } => *span,
        }
    }

    /// Expressions owned directly by this statement, without nested bodies.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Statement::Simple { left, right, .. } => {
                std::iter::once(left).chain(right.as_ref()).collect()
            }
            Statement::If {
                if_part,
                else_if_parts,
                ..
            } => std::iter::once(if_part)
                .chain(else_if_parts)
                .map(|c| &c.predicate)
                .collect(),
            Statement::While { predicate, .. } => vec![predicate],
            Statement::For { collection, .. } => vec![collection],
            Statement::Try { .. } => Vec::new(),
            Statement::Execute { expression, .. } => vec![expression],
            Statement::Return { value, .. } => value.iter().collect(),
        }
    }

    /// Nested statement lists in document order.
    pub fn bodies(&self) -> Vec<&[Statement]> {
        match self {
            Statement::If {
                if_part,
                else_if_parts,
                else_statements,
                ..
            } => std::iter::once(if_part)
                .chain(else_if_parts)
                .map(|c| c.statements.as_slice())
                .chain(else_statements.as_deref())
                .collect(),
            Statement::While { statements, .. } | Statement::For { statements, .. } => {
                vec![statements.as_slice()]
            }
            Statement::Try {
                statements,
                except_statements,
                ..
            } => vec![statements.as_slice(), except_statements.as_slice()],
            Statement::Simple { .. } | Statement::Execute { .. } | Statement::Return { .. } => {
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Boolean(bool),
    String(String),
    Number(String),
    Date(String),
    Undefined,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Literal {
        value: Literal,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    /// Identifier, or member access when `source` is present.
    Access {
        name: String,
        #[serde(default)]
        source: Option<Box<Expression>>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    /// Call of `name`, as a method of `receiver` when present. Omitted
    /// arguments (`F(, x)`) are `None`.
    Invocation {
        name: String,
        #[serde(default)]
        receiver: Option<Box<Expression>>,
        #[serde(default)]
        params: Vec<Option<Expression>>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        #[serde(default)]
        span: Option<NodeSpan>,
    },
}

impl Expression {
    pub fn span(&self) -> Option<NodeSpan> {
        match self {
            Expression::Literal { span, .. }
            | Expression::Access { span, .. }
            | Expression::Invocation { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Unary { span, .. } => *span,
        }
    }

    /// Direct sub-expressions in document order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal { .. } => Vec::new(),
            Expression::Access { source, .. } => source.as_deref().into_iter().collect(),
            Expression::Invocation {
                receiver, params, ..
            } => receiver
                .as_deref()
                .into_iter()
                .chain(params.iter().flatten())
                .collect(),
            Expression::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::Unary { operand, .. } => vec![operand.as_ref()],
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Expression::Literal {
                value: Literal::Boolean(b),
                ..
            } => Some(*b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_round_trip_through_json() {
        let stmt = Statement::Simple {
            left: Expression::Invocation {
                name: "SetSafeMode".into(),
                receiver: None,
                params: vec![Some(Expression::Literal {
                    value: Literal::Boolean(true),
                    span: Some(NodeSpan::new(12, 4)),
                })],
                span: Some(NodeSpan::new(0, 17)),
            },
            right: None,
            span: Some(NodeSpan::new(0, 18)),
        };

        let json = serde_json::to_string(&stmt).unwrap();
        assert!(json.contains(r#""kind":"simple""#));
        assert!(json.contains(r#""type":"boolean""#));
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }

    #[test]
    fn module_defaults_to_every_environment() {
        let module: Module = serde_json::from_str(r#"{"name":"M","source":""}"#).unwrap();
        assert_eq!(module.environments, Environments::all());
        assert!(module.items.is_empty());
    }

    #[test]
    fn snapshots_need_a_name_and_valid_json() {
        assert!(Module::from_json(r#"{"name":"Общий","source":"А = 1;"}"#).is_ok());
        assert!(matches!(
            Module::from_json(r#"{"name":" ","source":""}"#),
            Err(crate::error::BslClippyError::Other(_))
        ));
        assert!(matches!(
            Module::from_json("{"),
            Err(crate::error::BslClippyError::Ast(_))
        ));
    }

    #[test]
    fn method_snapshots_load() {
        let json = r#"{
            "name": "ОбщийМодуль",
            "source": "",
            "items": [
                { "item": "method", "name": "А", "kind": "procedure" },
                {
                    "item": "region",
                    "condition": { "op": "symbol", "args": "server" },
                    "items": [
                        { "item": "method", "name": "Б", "kind": "function", "directives": ["at_server"] }
                    ]
                }
            ]
        }"#;
        let module = Module::from_json(json).unwrap();
        let methods = module.methods();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].kind, MethodKind::Procedure);
        assert_eq!(methods[1].kind, MethodKind::Function);
        assert_eq!(methods[1].directives, vec![CompilationDirective::AtServer]);

        let written = serde_json::to_string(&module).unwrap();
        assert_eq!(Module::from_json(&written).unwrap(), module);
    }

    #[test]
    fn annotation_kinds_parse_in_both_spellings() {
        assert_eq!(AnnotationKind::from_name("&Вместо"), Some(AnnotationKind::Around));
        assert_eq!(AnnotationKind::from_name("after"), Some(AnnotationKind::After));
        assert_eq!(
            AnnotationKind::from_name("ИзменениеИКонтроль"),
            Some(AnnotationKind::ChangeAndValidate)
        );
        assert_eq!(AnnotationKind::from_name("Whatever"), None);
    }

    #[test]
    fn bodies_cover_every_if_branch() {
        let ident = |name: &str| Expression::Access {
            name: name.into(),
            source: None,
            span: None,
        };
        let ret = Statement::Return {
            value: None,
            span: None,
        };
        let stmt = Statement::If {
            if_part: Conditional {
                predicate: ident("a"),
                statements: vec![ret.clone()],
            },
            else_if_parts: vec![Conditional {
                predicate: ident("b"),
                statements: vec![ret.clone()],
            }],
            else_statements: Some(vec![ret]),
            span: None,
        };
        assert_eq!(stmt.bodies().len(), 3);
        assert_eq!(stmt.expressions().len(), 2);
    }
}

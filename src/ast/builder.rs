//! Assemble syntax trees over existing source text.
//!
//! `AstBuilder` does not parse. Callers describe the tree in document order
//! and the builder locates each node by searching the source forward from a
//! cursor, recording the span it finds. Nodes whose text cannot be found get
//! no span and behave as synthesized nodes.
//!
//! This is the front-end helper for callers that have the module text and
//! know its structure but have no BSL parser of their own, such as editor
//! bridges producing JSON snapshots or tests. The checks never call it; they
//! only read the finished [`Module`].

use crate::ast::{
    AnnotationKind, BinaryOp, Conditional, Expression, ExtensionAnnotation, Literal, Method,
    MethodKind, Module, ModuleItem, NodeSpan, PreprocessorRegion, Statement, UnaryOp,
};
use crate::environment::{CompilationDirective, Condition, Symbol};

const IF: &[&str] = &["Если", "If"];
const THEN: &[&str] = &["Тогда", "Then"];
const ELSE: &[&str] = &["Иначе", "Else"];
const END_IF: &[&str] = &["КонецЕсли", "EndIf"];
const WHILE: &[&str] = &["Пока", "While"];
const FOR: &[&str] = &["Для", "For"];
const DO: &[&str] = &["Цикл", "Do"];
const END_DO: &[&str] = &["КонецЦикла", "EndDo"];
const TRY: &[&str] = &["Попытка", "Try"];
const EXCEPT: &[&str] = &["Исключение", "Except"];
const END_TRY: &[&str] = &["КонецПопытки", "EndTry"];
const EXECUTE: &[&str] = &["Выполнить", "Execute"];
const RETURN: &[&str] = &["Возврат", "Return"];
const NOT: &[&str] = &["НЕ", "Not"];
const EXPORT: &[&str] = &["Экспорт", "Export"];
const METHOD_START: &[&str] = &["Процедура", "Функция", "Procedure", "Function"];
const METHOD_END: &[&str] = &["КонецПроцедуры", "КонецФункции", "EndProcedure", "EndFunction"];
const REGION_IF: &[&str] = &["#Если", "#If"];
const REGION_END: &[&str] = &["#КонецЕсли", "#EndIf"];

/// Parts of an `If` chain, filled in document order.
pub struct IfChain {
    pub if_part: Conditional,
    pub else_if_parts: Vec<Conditional>,
    pub else_statements: Option<Vec<Statement>>,
}

pub struct AstBuilder<'src> {
    source: &'src str,
    cursor: usize,
}

impl<'src> AstBuilder<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, cursor: 0 }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Wrap up into a module that runs everywhere.
    pub fn finish(
        self,
        name: impl Into<String>,
        items: Vec<ModuleItem>,
        statements: Vec<Statement>,
    ) -> Module {
        let mut module = Module::new(name, self.source);
        module.items = items;
        module.statements = statements;
        module
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn ident(&mut self, name: &str) -> Expression {
        let found = self.find_word(self.cursor, &[name]);
        Expression::Access {
            name: name.to_string(),
            source: None,
            span: self.take(found),
        }
    }

    /// `source.name`
    pub fn member(&mut self, source: impl FnOnce(&mut Self) -> Expression, name: &str) -> Expression {
        let source = source(self);
        let found = self.find_word(self.cursor, &[name]);
        let name_span = self.take(found);
        let span = join(source.span(), name_span);
        Expression::Access {
            name: name.to_string(),
            source: Some(Box::new(source)),
            span,
        }
    }

    /// Global call `name(params)`.
    pub fn call(
        &mut self,
        name: &str,
        params: impl FnOnce(&mut Self) -> Vec<Option<Expression>>,
    ) -> Expression {
        let found = self.find_word(self.cursor, &[name]);
        let start = found.map(|(start, _)| start);
        self.invocation(name, None, start, found, params)
    }

    /// Method call `receiver.name(params)`.
    pub fn method_call(
        &mut self,
        receiver: impl FnOnce(&mut Self) -> Expression,
        name: &str,
        params: impl FnOnce(&mut Self) -> Vec<Option<Expression>>,
    ) -> Expression {
        let receiver = receiver(self);
        let found = self.find_word(self.cursor, &[name]);
        let start = receiver.span().map(|s| s.offset);
        self.invocation(name, Some(receiver), start, found, params)
    }

    fn invocation(
        &mut self,
        name: &str,
        receiver: Option<Expression>,
        start: Option<usize>,
        found: Option<(usize, usize)>,
        params: impl FnOnce(&mut Self) -> Vec<Option<Expression>>,
    ) -> Expression {
        let open = found.and_then(|(_, name_end)| self.find_char(name_end, '('));
        if let Some(open) = open {
            self.cursor = open + 1;
        }
        let params = params(self);
        let close = open.and_then(|open| self.matching_paren(open));
        if let Some(close) = close {
            self.cursor = close + 1;
        }

        let span = match (start, close) {
            (Some(start), Some(close)) => Some(NodeSpan::between(start, close + 1)),
            _ => None,
        };
        Expression::Invocation {
            name: name.to_string(),
            receiver: receiver.map(Box::new),
            params,
            span,
        }
    }

    /// `Истина` / `True` / `Ложь` / `False`, spelled as in the source.
    pub fn boolean(&mut self, text: &str) -> Expression {
        let value = matches!(text.to_lowercase().as_str(), "истина" | "true");
        let found = self.find_word(self.cursor, &[text]);
        Expression::Literal {
            value: Literal::Boolean(value),
            span: self.take(found),
        }
    }

    /// String literal including its quotes.
    pub fn string(&mut self, text: &str) -> Expression {
        let found = self.source[self.cursor..]
            .find(text)
            .map(|idx| (self.cursor + idx, self.cursor + idx + text.len()));
        let inner = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text)
            .replace("\"\"", "\"");
        Expression::Literal {
            value: Literal::String(inner),
            span: self.take(found),
        }
    }

    pub fn number(&mut self, text: &str) -> Expression {
        let found = self.find_word(self.cursor, &[text]);
        Expression::Literal {
            value: Literal::Number(text.to_string()),
            span: self.take(found),
        }
    }

    /// `Неопределено` / `Undefined`
    pub fn undefined(&mut self, text: &str) -> Expression {
        let found = self.find_word(self.cursor, &[text]);
        Expression::Literal {
            value: Literal::Undefined,
            span: self.take(found),
        }
    }

    pub fn binary(
        &mut self,
        op: BinaryOp,
        left: impl FnOnce(&mut Self) -> Expression,
        right: impl FnOnce(&mut Self) -> Expression,
    ) -> Expression {
        let left = left(self);
        let right = right(self);
        let span = join(left.span(), right.span());
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    pub fn not(&mut self, operand: impl FnOnce(&mut Self) -> Expression) -> Expression {
        let keyword = self.find_word(self.cursor, NOT);
        let keyword = self.take(keyword);
        let operand = operand(self);
        let span = join(keyword, operand.span());
        Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
            span,
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Expression statement such as a procedure call.
    pub fn simple(&mut self, expr: impl FnOnce(&mut Self) -> Expression) -> Statement {
        let left = expr(self);
        let span = self.statement_span(left.span().map(|s| s.offset), left.span());
        Statement::Simple {
            left,
            right: None,
            span,
        }
    }

    /// `left = right;`
    pub fn assign(
        &mut self,
        left: impl FnOnce(&mut Self) -> Expression,
        right: impl FnOnce(&mut Self) -> Expression,
    ) -> Statement {
        let left = left(self);
        let right = right(self);
        let span = self.statement_span(left.span().map(|s| s.offset), right.span());
        Statement::Simple {
            left,
            right: Some(right),
            span,
        }
    }

    /// Single-branch `If`.
    pub fn if_statement(
        &mut self,
        predicate: impl FnOnce(&mut Self) -> Expression,
        body: impl FnOnce(&mut Self) -> Vec<Statement>,
    ) -> Statement {
        self.if_chain(|b| IfChain {
            if_part: b.branch(predicate, body),
            else_if_parts: Vec::new(),
            else_statements: None,
        })
    }

    /// Full `If ... ElsIf ... Else ... EndIf` chain.
    pub fn if_chain(&mut self, chain: impl FnOnce(&mut Self) -> IfChain) -> Statement {
        let start = self.find_word(self.cursor, IF);
        let start = self.take(start);
        let chain = chain(self);
        let end = self.find_word(self.cursor, END_IF);
        let end = self.take(end);
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::If {
            if_part: chain.if_part,
            else_if_parts: chain.else_if_parts,
            else_statements: chain.else_statements,
            span,
        }
    }

    /// One `If` / `ElsIf` branch: predicate, `Then`, body.
    pub fn branch(
        &mut self,
        predicate: impl FnOnce(&mut Self) -> Expression,
        body: impl FnOnce(&mut Self) -> Vec<Statement>,
    ) -> Conditional {
        let predicate = predicate(self);
        let then = self.find_word(self.cursor, THEN);
        self.take(then);
        let statements = body(self);
        Conditional {
            predicate,
            statements,
        }
    }

    pub fn else_branch(&mut self, body: impl FnOnce(&mut Self) -> Vec<Statement>) -> Vec<Statement> {
        let keyword = self.find_word(self.cursor, ELSE);
        self.take(keyword);
        body(self)
    }

    pub fn while_loop(
        &mut self,
        predicate: impl FnOnce(&mut Self) -> Expression,
        body: impl FnOnce(&mut Self) -> Vec<Statement>,
    ) -> Statement {
        let start = self.find_word(self.cursor, WHILE);
        let start = self.take(start);
        let predicate = predicate(self);
        let keyword = self.find_word(self.cursor, DO);
        self.take(keyword);
        let statements = body(self);
        let end = self.find_word(self.cursor, END_DO);
        let end = self.take(end);
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::While {
            predicate,
            statements,
            span,
        }
    }

    /// `For Each variable In collection Do ... EndDo`
    pub fn for_each(
        &mut self,
        variable: &str,
        collection: impl FnOnce(&mut Self) -> Expression,
        body: impl FnOnce(&mut Self) -> Vec<Statement>,
    ) -> Statement {
        let start = self.find_word(self.cursor, FOR);
        let start = self.take(start);
        let var = self.find_word(self.cursor, &[variable]);
        self.take(var);
        let collection = collection(self);
        let keyword = self.find_word(self.cursor, DO);
        self.take(keyword);
        let statements = body(self);
        let end = self.find_word(self.cursor, END_DO);
        let end = self.take(end);
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::For {
            variable: variable.to_string(),
            collection,
            statements,
            span,
        }
    }

    pub fn try_statement(
        &mut self,
        body: impl FnOnce(&mut Self) -> Vec<Statement>,
        except_body: impl FnOnce(&mut Self) -> Vec<Statement>,
    ) -> Statement {
        let start = self.find_word(self.cursor, TRY);
        let start = self.take(start);
        let statements = body(self);
        let keyword = self.find_word(self.cursor, EXCEPT);
        self.take(keyword);
        let except_statements = except_body(self);
        let end = self.find_word(self.cursor, END_TRY);
        let end = self.take(end);
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::Try {
            statements,
            except_statements,
            span,
        }
    }

    /// `Execute(expression)` statement.
    pub fn execute(&mut self, expression: impl FnOnce(&mut Self) -> Expression) -> Statement {
        let start = self.find_word(self.cursor, EXECUTE);
        let start = self.take(start);
        let open = start
            .map(|s| self.skip_whitespace(s.end()))
            .filter(|&pos| self.source[pos..].starts_with('('));
        if let Some(open) = open {
            self.cursor = open + 1;
        }
        let expression = expression(self);
        let end = match open.and_then(|open| self.matching_paren(open)) {
            Some(close) => {
                self.cursor = close + 1;
                Some(NodeSpan::new(close, 1))
            }
            None => expression.span(),
        };
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::Execute { expression, span }
    }

    pub fn return_statement(
        &mut self,
        value: impl FnOnce(&mut Self) -> Option<Expression>,
    ) -> Statement {
        let start = self.find_word(self.cursor, RETURN);
        let start = self.take(start);
        let value = value(self);
        let end = value.as_ref().and_then(Expression::span).or(start);
        let span = self.statement_span(start.map(|s| s.offset), end);
        Statement::Return { value, span }
    }

    // ------------------------------------------------------------------
    // Module items
    // ------------------------------------------------------------------

    /// Next procedure or function in the source.
    ///
    /// Name, kind, export flag, compilation directives, extension annotations
    /// and the documentation comment are read from the declaration text.
    pub fn method(&mut self, body: impl FnOnce(&mut Self) -> Vec<Statement>) -> Method {
        let header = self.find_word(self.cursor, METHOD_START);
        let kind = match header.map(|(s, e)| self.source[s..e].to_lowercase()) {
            Some(keyword) if keyword == "функция" || keyword == "function" => MethodKind::Function,
            _ => MethodKind::Procedure,
        };

        let mut name = String::new();
        let mut name_span = None;
        let mut export = false;
        let mut directives = Vec::new();
        let mut annotations = Vec::new();
        let mut decl_start = None;
        let mut doc_comment = None;

        if let Some((kw_start, kw_end)) = header {
            self.cursor = kw_end;
            let name_start = self.skip_whitespace(kw_end);
            let name_end = self.source[name_start..]
                .char_indices()
                .find(|(_, c)| !is_ident_char(*c))
                .map_or(self.source.len(), |(i, _)| name_start + i);
            name = self.source[name_start..name_end].to_string();
            name_span = Some(NodeSpan::between(name_start, name_end));
            self.cursor = name_end;

            if let Some(close) = self
                .find_char(name_end, '(')
                .and_then(|open| self.matching_paren(open))
            {
                self.cursor = close + 1;
                let line_end = self.source[self.cursor..]
                    .find('\n')
                    .map_or(self.source.len(), |i| self.cursor + i);
                if let Some((_, export_end)) = self
                    .find_word(self.cursor, EXPORT)
                    .filter(|(_, end)| *end <= line_end)
                {
                    export = true;
                    self.cursor = export_end;
                }
            }

            let prefix = self.declaration_prefix(kw_start);
            directives = prefix.directives;
            annotations = prefix.annotations;
            decl_start = Some(prefix.start);
            doc_comment = prefix.doc_comment;
        }

        let statements = body(self);
        let end = self.find_word(self.cursor, METHOD_END);
        let end = self.take(end);
        let span = join(decl_start.map(|start| NodeSpan::new(start, 0)), end);

        Method {
            name,
            kind,
            export,
            directives,
            annotations,
            statements,
            span,
            name_span,
            doc_comment,
        }
    }

    /// Module-level `#If <condition> Then ... #EndIf`.
    pub fn region(
        &mut self,
        items: impl FnOnce(&mut Self) -> Vec<ModuleItem>,
    ) -> PreprocessorRegion {
        let start = self.find_word(self.cursor, REGION_IF);
        let start = self.take(start);

        let mut condition = Condition::And(Vec::new());
        let mut condition_span = None;
        if let Some(start) = start
            && let Some((then_start, then_end)) = self.find_word(start.end(), THEN)
        {
            let raw = &self.source[start.end()..then_start];
            let lead = raw.len() - raw.trim_start().len();
            let text = raw.trim();
            condition_span = Some(NodeSpan::new(start.end() + lead, text.len()));
            if let Some(parsed) = parse_condition(text) {
                condition = parsed;
            }
            self.cursor = then_end;
        }

        let items = items(self);
        let end = self.find_word(self.cursor, REGION_END);
        let end = self.take(end);
        PreprocessorRegion {
            condition,
            condition_span,
            items,
            span: join(start, end),
        }
    }

    // ------------------------------------------------------------------
    // Text search
    // ------------------------------------------------------------------

    fn take(&mut self, found: Option<(usize, usize)>) -> Option<NodeSpan> {
        found.map(|(start, end)| {
            self.cursor = self.cursor.max(end);
            NodeSpan::between(start, end)
        })
    }

    /// Earliest whole-word, case-insensitive occurrence of any of `words`.
    fn find_word(&self, from: usize, words: &[&str]) -> Option<(usize, usize)> {
        let text = self.source.get(from..)?;
        for (idx, _) in text.char_indices() {
            let start = from + idx;
            for word in words {
                let end = start + word.len();
                let Some(candidate) = self.source.get(start..end) else {
                    continue;
                };
                if candidate.to_lowercase() != word.to_lowercase() {
                    continue;
                }
                let before = self.source[..start].chars().next_back();
                let after = self.source[end..].chars().next();
                let clean_before = before.is_none_or(|c| {
                    !is_ident_char(c) && (word.starts_with('#') || c != '#')
                });
                let clean_after = after.is_none_or(|c| !is_ident_char(c));
                if clean_before && clean_after {
                    return Some((start, end));
                }
            }
        }
        None
    }

    fn find_char(&self, from: usize, needle: char) -> Option<usize> {
        self.source.get(from..)?.find(needle).map(|idx| from + idx)
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let rest = self.source.get(from..).unwrap_or("");
        from + (rest.len() - rest.trim_start().len())
    }

    /// Closing parenthesis matching the one at `open`, ignoring string contents.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut in_string = false;
        for (idx, c) in self.source.get(open..)?.char_indices() {
            match c {
                '"' => in_string = !in_string,
                '(' if !in_string => depth += 1,
                ')' if !in_string => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(open + idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Span from `start` through `end`, extended over a trailing `;`.
    fn statement_span(&mut self, start: Option<usize>, end: Option<NodeSpan>) -> Option<NodeSpan> {
        let (start, end) = (start?, end?.end());
        let after = self.skip_whitespace(end);
        let end = if self.source[after..].starts_with(';') {
            after + 1
        } else {
            end
        };
        self.cursor = self.cursor.max(end);
        Some(NodeSpan::between(start, end))
    }

    fn declaration_prefix(&self, keyword_start: usize) -> DeclarationPrefix {
        let mut prefix = DeclarationPrefix {
            start: keyword_start,
            ..DeclarationPrefix::default()
        };

        // Directive and annotation lines directly above the keyword.
        let mut line_start = line_start(self.source, keyword_start);
        let mut pragma_lines = Vec::new();
        while let Some((start, text)) = previous_line(self.source, line_start) {
            let trimmed = text.trim();
            if !trimmed.starts_with('&') {
                break;
            }
            pragma_lines.push((start + (text.len() - text.trim_start().len()), trimmed));
            line_start = start;
        }
        for (offset, text) in pragma_lines.into_iter().rev() {
            prefix.start = prefix.start.min(offset);
            parse_pragma(text, offset, &mut prefix);
        }

        // Documentation comment directly above those.
        let mut comment_top = None;
        let mut comment_end = None;
        while let Some((start, text)) = previous_line(self.source, line_start) {
            if !text.trim_start().starts_with("//") {
                break;
            }
            if comment_end.is_none() {
                comment_end = Some(start + text.trim_end().len());
            }
            comment_top = Some(start + (text.len() - text.trim_start().len()));
            line_start = start;
        }
        if let (Some(top), Some(end)) = (comment_top, comment_end) {
            prefix.doc_comment = Some(NodeSpan::between(top, end));
        }

        prefix
    }
}

#[derive(Default)]
struct DeclarationPrefix {
    start: usize,
    directives: Vec<CompilationDirective>,
    annotations: Vec<ExtensionAnnotation>,
    doc_comment: Option<NodeSpan>,
}

fn parse_pragma(text: &str, offset: usize, prefix: &mut DeclarationPrefix) {
    let name_end = text.find('(').unwrap_or(text.len());
    let name = &text[..name_end];
    if let Some(directive) = CompilationDirective::from_name(name) {
        prefix.directives.push(directive);
        return;
    }
    if let Some(kind) = AnnotationKind::from_name(name) {
        let target = text[name_end..]
            .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
            .trim_matches('"')
            .to_string();
        prefix.annotations.push(ExtensionAnnotation {
            kind,
            target,
            span: Some(NodeSpan::new(offset, text.len())),
        });
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn join(start: Option<NodeSpan>, end: Option<NodeSpan>) -> Option<NodeSpan> {
    Some(NodeSpan::between(start?.offset, end?.end()))
}

fn line_start(source: &str, pos: usize) -> usize {
    source[..pos].rfind('\n').map_or(0, |idx| idx + 1)
}

/// Start offset and text (without line terminator) of the line above the
/// line starting at `current_line_start`.
fn previous_line(source: &str, current_line_start: usize) -> Option<(usize, &str)> {
    if current_line_start == 0 {
        return None;
    }
    let newline = current_line_start - 1;
    let start = line_start(source, newline);
    Some((start, source[start..newline].trim_end_matches('\r')))
}

/// Parse a preprocessor condition such as `Сервер Или ВнешнееСоединение`.
pub fn parse_condition(text: &str) -> Option<Condition> {
    let tokens = tokenize_condition(text);
    let mut pos = 0;
    let condition = parse_or(&tokens, &mut pos)?;
    (pos == tokens.len()).then_some(condition)
}

fn tokenize_condition(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_ident_char(c) {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if c == '(' || c == ')' {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_keyword(token: Option<&String>, words: &[&str]) -> bool {
    token.is_some_and(|t| words.iter().any(|w| t.to_lowercase() == *w))
}

fn parse_or(tokens: &[String], pos: &mut usize) -> Option<Condition> {
    let mut parts = vec![parse_and(tokens, pos)?];
    while is_keyword(tokens.get(*pos), &["или", "or"]) {
        *pos += 1;
        parts.push(parse_and(tokens, pos)?);
    }
    Some(if parts.len() == 1 {
        parts.remove(0)
    } else {
        Condition::Or(parts)
    })
}

fn parse_and(tokens: &[String], pos: &mut usize) -> Option<Condition> {
    let mut parts = vec![parse_unary(tokens, pos)?];
    while is_keyword(tokens.get(*pos), &["и", "and"]) {
        *pos += 1;
        parts.push(parse_unary(tokens, pos)?);
    }
    Some(if parts.len() == 1 {
        parts.remove(0)
    } else {
        Condition::And(parts)
    })
}

fn parse_unary(tokens: &[String], pos: &mut usize) -> Option<Condition> {
    let token = tokens.get(*pos)?;
    *pos += 1;
    if is_keyword(Some(token), &["не", "not"]) {
        return Some(Condition::negate(parse_unary(tokens, pos)?));
    }
    if token == "(" {
        let inner = parse_or(tokens, pos)?;
        if tokens.get(*pos).map(String::as_str) != Some(")") {
            return None;
        }
        *pos += 1;
        return Some(inner);
    }
    Symbol::from_name(token).map(Condition::Symbol)
}

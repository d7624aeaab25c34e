//! AST Utility Layer
//!
//! Thin helpers over `oxc_parser` shared by every other module: fragment parsing,
//! node-kind predicates, property lookup, qualified member paths, span edits,
//! pretty-printing through `oxc_codegen` and sub-tree equality.
//!
//! Fragments (member values, method bodies, templates) are kept as owned source
//! text between phases and re-parsed on demand, so no arena outlives a call here.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::Visit;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{GetSpan, SourceType, Span};
use regex::Regex;

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    static ref IDENT_PATH_RE: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Legacy sources are classic scripts; JSX is enabled so compiled output re-parses.
pub fn source_type() -> SourceType {
    SourceType::default().with_module(false).with_jsx(true)
}

/// Parse `code` as a single expression and hand it to `f`.
/// Returns `None` when the fragment does not parse.
pub fn with_expression<R>(code: &str, f: impl for<'a> FnOnce(&Expression<'a>) -> R) -> Option<R> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, code, source_type()).parse_expression();
    match parsed {
        Ok(expr) => Some(f(&expr)),
        Err(_) => None,
    }
}

/// Parse `code` as a program and hand it to `f`. Returns `None` on any syntax error.
pub fn with_program<R>(code: &str, f: impl for<'a> FnOnce(&Program<'a>) -> R) -> Option<R> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }
    Some(f(&ret.program))
}

pub fn parses_as_expression(code: &str) -> bool {
    with_expression(code, |_| ()).is_some()
}

/// Compiled units are ES modules with JSX. Besides syntax, the module must pass
/// the early-error checks (strict mode rules such as `with` or duplicate params).
pub fn check_module(code: &str) -> Result<(), String> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true).with_jsx(true);
    let ret = Parser::new(&allocator, code, source_type).parse();
    if ret.panicked {
        return Err("parser panicked".to_string());
    }
    if let Some(error) = ret.errors.first() {
        return Err(format!("{:?}", error));
    }
    let semantic = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&ret.program);
    match semantic.errors.first() {
        Some(error) => Err(format!("{:?}", error)),
        None => Ok(()),
    }
}

pub fn parses_as_module(code: &str) -> bool {
    check_module(code).is_ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE PREDICATES
// ═══════════════════════════════════════════════════════════════════════════════

pub fn strip_parens<'b, 'a>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(p) => strip_parens(&p.expression),
        _ => expr,
    }
}

pub fn is_function(expr: &Expression) -> bool {
    matches!(
        strip_parens(expr),
        Expression::FunctionExpression(_) | Expression::ArrowFunctionExpression(_)
    )
}

pub fn is_conditional(expr: &Expression) -> bool {
    matches!(strip_parens(expr), Expression::ConditionalExpression(_))
}

pub fn is_true(expr: &Expression) -> bool {
    matches!(strip_parens(expr), Expression::BooleanLiteral(b) if b.value)
}

/// String literal or substitution-free template literal.
pub fn string_value(expr: &Expression) -> Option<String> {
    match strip_parens(expr) {
        Expression::StringLiteral(s) => Some(s.value.to_string()),
        Expression::TemplateLiteral(t) if t.expressions.is_empty() => t
            .quasis
            .first()
            .and_then(|q| q.value.cooked.as_ref())
            .map(|c| c.to_string()),
        _ => None,
    }
}

/// `a`, `this`, `a.b.c`; anything computed or called yields `None`.
pub fn qualified_name(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::ThisExpression(_) => Some("this".to_string()),
        Expression::StaticMemberExpression(member) => {
            let object = qualified_name(&member.object)?;
            Some(format!("{}.{}", object, member.property.name))
        }
        _ => None,
    }
}

pub fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        _ => None,
    }
}

/// Name of a non-computed object property.
pub fn property_name(prop: &ObjectProperty) -> Option<String> {
    if prop.computed {
        return None;
    }
    property_key_name(&prop.key)
}

pub fn find_property<'b, 'a>(
    obj: &'b ObjectExpression<'a>,
    name: &str,
) -> Option<&'b ObjectProperty<'a>> {
    obj.properties.iter().find_map(|kind| match kind {
        ObjectPropertyKind::ObjectProperty(p) if property_name(p).as_deref() == Some(name) => {
            Some(&**p)
        }
        _ => None,
    })
}

pub fn is_identifier(name: &str) -> bool {
    IDENT_RE.is_match(name)
}

/// `a`, `a.b.c`: cheap to repeat and safe as a call receiver.
pub fn is_simple_reference(code: &str) -> bool {
    IDENT_PATH_RE.is_match(code.trim())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPAN EDITS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

impl Edit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Edit {
            start: span.start,
            end: span.end,
            text: text.into(),
        }
    }

    pub fn remove(span: Span) -> Self {
        Edit::replace(span, "")
    }
}

/// Apply non-overlapping edits. When edits overlap, the outermost (earliest,
/// then longest) wins; the inner ones are picked up by the next round.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        match kept.last() {
            Some(last) if edit.start < last.end => continue,
            _ => kept.push(edit),
        }
    }

    let mut result = source.to_string();
    for edit in kept.into_iter().rev() {
        result.replace_range(edit.start as usize..edit.end as usize, &edit.text);
    }
    result
}

pub fn slice(source: &str, span: Span) -> &str {
    &source[span.start as usize..span.end as usize]
}

pub fn node_text<'s, T: GetSpan>(source: &'s str, node: &T) -> &'s str {
    slice(source, node.span())
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTION PARTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Source pieces of a function-valued fragment, ready to re-emit in another shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParts {
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    /// Parameter list including parentheses.
    pub params: String,
    /// Block body including braces, or the expression of an expression-bodied arrow.
    pub body: String,
    pub expression_body: bool,
}

impl FunctionParts {
    /// The body as a block, wrapping expression bodies in `return`.
    pub fn block_body(&self) -> String {
        if self.expression_body {
            format!("{{\n  return {}\n}}", self.body)
        } else {
            self.body.clone()
        }
    }

    pub fn as_arrow(&self) -> String {
        let prefix = if self.is_async { "async " } else { "" };
        format!("{}{} => {}", prefix, self.params, self.body)
    }
}

/// Parameter list (with parentheses) from the header between a function start and its body.
pub fn params_text(source: &str, fn_start: u32, body_start: u32) -> String {
    let header = &source[fn_start as usize..body_start as usize];
    match header.find('(') {
        Some(idx) => {
            let params = header[idx..].trim_end();
            params.trim_end_matches("=>").trim_end().to_string()
        }
        None => {
            // `x => x`: single bare parameter
            let bare = header.trim().trim_start_matches("async").trim();
            format!("({})", bare.trim_end_matches("=>").trim())
        }
    }
}

/// Split a function/arrow expression fragment into its parts.
pub fn function_parts(code: &str) -> Option<FunctionParts> {
    with_expression(code, |expr| match strip_parens(expr) {
        Expression::FunctionExpression(func) => {
            let body = func.body.as_ref()?;
            let body_text = slice(code, body.span).to_string();
            Some(FunctionParts {
                is_async: func.r#async,
                is_generator: func.generator,
                is_arrow: false,
                params: params_text(code, func.span.start, body.span.start),
                body: if body_text.starts_with('{') {
                    body_text
                } else {
                    format!("{{{}}}", body_text)
                },
                expression_body: false,
            })
        }
        Expression::ArrowFunctionExpression(arrow) => {
            let (body_start, body_text) = if arrow.expression {
                match arrow.body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) => (
                        stmt.expression.span().start,
                        node_text(code, &stmt.expression).to_string(),
                    ),
                    _ => return None,
                }
            } else {
                (arrow.body.span.start, slice(code, arrow.body.span).to_string())
            };
            Some(FunctionParts {
                is_async: arrow.r#async,
                is_generator: false,
                is_arrow: true,
                params: params_text(code, arrow.span.start, body_start),
                body: body_text,
                expression_body: arrow.expression,
            })
        }
        _ => None,
    })
    .flatten()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRINTING & EQUALITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Pretty-print a single expression (JSX allowed). `None` when it does not parse,
/// so callers can fall back to the unformatted text.
pub fn format_expression(code: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }
    if ret.program.body.len() != 1
        || !matches!(ret.program.body.first(), Some(Statement::ExpressionStatement(_)))
    {
        return None;
    }
    let printed = Codegen::new().build(&ret.program).code;
    Some(printed.trim().trim_end_matches(';').trim_end().to_string())
}

/// Reprint a whole program, used to compare trees independent of formatting.
pub fn reprint(code: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return None;
    }
    Some(Codegen::new().build(&ret.program).code)
}

/// Sub-tree equality: same tree after reprinting, or identical text when
/// either side fails to parse.
pub fn same_tree(a: &str, b: &str) -> bool {
    match (reprint(a), reprint(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim() == b.trim(),
    }
}

/// Single-quoted JS string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Wrap in parentheses unless the fragment is a plain reference or call chain.
pub fn wrap_receiver(code: &str) -> String {
    let trimmed = code.trim();
    let needs_parens = with_expression(trimmed, |expr| {
        !matches!(
            expr,
            Expression::Identifier(_)
                | Expression::ThisExpression(_)
                | Expression::StaticMemberExpression(_)
                | Expression::ComputedMemberExpression(_)
                | Expression::CallExpression(_)
                | Expression::ParenthesizedExpression(_)
                | Expression::StringLiteral(_)
                | Expression::ArrayExpression(_)
                | Expression::TemplateLiteral(_)
        )
    })
    .unwrap_or(true);
    if needs_parens {
        format!("({})", trimmed)
    } else {
        trimmed.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Every string literal value inside a sub-tree.
#[derive(Default)]
pub struct StringLiteralCollector {
    pub values: Vec<String>,
}

impl<'a> Visit<'a> for StringLiteralCollector {
    fn visit_string_literal(&mut self, lit: &StringLiteral<'a>) {
        self.values.push(lit.value.to_string());
    }
}

pub fn string_literals(expr: &Expression) -> Vec<String> {
    let mut collector = StringLiteralCollector::default();
    collector.visit_expression(expr);
    collector.values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let name = with_expression("Ext.Array.clean", |e| qualified_name(e)).unwrap();
        assert_eq!(name.as_deref(), Some("Ext.Array.clean"));
        let this_name = with_expression("this.foo.bar", |e| qualified_name(e)).unwrap();
        assert_eq!(this_name.as_deref(), Some("this.foo.bar"));
        let computed = with_expression("a[b].c", |e| qualified_name(e)).unwrap();
        assert_eq!(computed, None);
    }

    #[test]
    fn test_apply_edits_outermost_wins() {
        let src = "abcdef";
        let edits = vec![
            Edit { start: 1, end: 3, text: "X".into() },
            Edit { start: 0, end: 4, text: "Y".into() },
            Edit { start: 5, end: 6, text: "Z".into() },
        ];
        assert_eq!(apply_edits(src, edits), "YeZ");
    }

    #[test]
    fn test_find_property() {
        let found = with_expression("({ a: 1, 'b': 2 })", |e| match strip_parens(e) {
            Expression::ObjectExpression(obj) => find_property(obj, "b").is_some(),
            _ => false,
        });
        assert_eq!(found, Some(true));
    }

    #[test]
    fn test_function_parts() {
        let parts = function_parts("function(a, b) { return a + b; }").unwrap();
        assert_eq!(parts.params, "(a, b)");
        assert!(parts.body.starts_with('{'));
        assert!(!parts.is_arrow);

        let arrow = function_parts("async x => x * 2").unwrap();
        assert!(arrow.is_arrow);
        assert!(arrow.is_async);
        assert!(arrow.expression_body);
        assert_eq!(arrow.params, "(x)");
        assert_eq!(arrow.body, "x * 2");
    }

    #[test]
    fn test_format_expression_fallback() {
        assert!(format_expression("a ? <>On</> : <>Off</>").is_some());
        assert!(format_expression("<div>").is_none());
    }

    #[test]
    fn test_same_tree_ignores_formatting() {
        assert!(same_tree("let a = 1 + 2", "let  a=1+2;"));
        assert!(!same_tree("let a = 1", "let a = 2"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), "'it\\'s'");
    }

    #[test]
    fn test_wrap_receiver() {
        assert_eq!(wrap_receiver("items"), "items");
        assert_eq!(wrap_receiver("a ? b : c"), "(a ? b : c)");
    }

    #[test]
    fn test_module_check_rejects_strict_mode_errors() {
        assert!(check_module("import A from './A'\n\nexport default <A />\n").is_ok());
        assert!(check_module("with (scope) { go(); }\n").is_err());
        assert!(check_module("let = ;").is_err());
    }
}

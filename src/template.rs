//! Template micro-language compiler
//!
//! Compiles legacy string templates (`'<div>{name}</div>'`, `<tpl if>` / `<tpl for>`
//! blocks, `{[ inline code ]}`) into `new Template(data => (...))` with a JSX body.
//!
//! Interpolations are replaced by placeholders before the markup is handed to
//! html5ever, so braces and quotes inside them never reach the HTML parser.

use std::collections::BTreeSet;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use oxc_ast::ast::*;
use oxc_ast_visit::Visit;
use regex::{Captures, Regex};

use crate::ast::{self, apply_edits, node_text, strip_parens, Edit};
use crate::diagnostics::{Diagnostics, DIAG_FORMAT_FALLBACK};

pub const LIB_TEMPLATE: &str = "Template";
pub const LIB_FORMAT: &str = "Format";

lazy_static! {
    static ref INLINE_CODE_RE: Regex = Regex::new(r"(?s)\{\[(.+?)\]\}").unwrap();
    static ref FIELD_RE: Regex = Regex::new(r"\{([^{}\[\]]+)\}").unwrap();
    static ref FIELD_NAME_RE: Regex = Regex::new(r"^(\.|[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*)$").unwrap();
    static ref FORMATTER_RE: Regex = Regex::new(r"^\s*([^(\s]+)\s*(?:\((.*)\))?\s*$").unwrap();
    static ref VALUES_RE: Regex = Regex::new(r"\bvalues\b").unwrap();
    static ref THIS_RE: Regex = Regex::new(r"\bthis\.").unwrap();
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"__E2R_(\d+)__").unwrap();
}

const VOID_TAGS: [&str; 7] = ["area", "br", "embed", "frame", "hr", "img", "input"];

/// Lowercase names a test expression may use without the `data.` scope.
const UNSCOPED: [&str; 9] = [
    "data", "this", "undefined", "helper", "parseInt", "parseFloat", "isNaN", "isFinite", "parent",
];

#[derive(Debug, Clone, Default)]
pub struct TemplateOutput {
    pub code: String,
    pub libraries: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrText {
    Static(String),
    /// Text with interpolated expressions, rendered as a template literal.
    Interpolated(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateNode {
    Text(String),
    Expr(String),
    Element {
        tag: String,
        attrs: Vec<(String, AttrText)>,
        children: Vec<TemplateNode>,
    },
    Conditional {
        branches: Vec<(String, Vec<TemplateNode>)>,
        otherwise: Option<Vec<TemplateNode>>,
    },
    Loop {
        source: String,
        body: Vec<TemplateNode>,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE VALUE
// ═══════════════════════════════════════════════════════════════════════════════

struct TemplateSource {
    markup: String,
    /// Expression prefix for `this.fn` calls.
    helper: Option<String>,
    /// Object literal declared as `const helper = ...`.
    helper_object: Option<String>,
}

/// A string, or an array of strings with an optional trailing helper.
fn template_source(code: &str) -> Option<TemplateSource> {
    ast::with_expression(code, |expr| {
        if let Some(markup) = ast::string_value(expr) {
            return Some(TemplateSource {
                markup,
                helper: None,
                helper_object: None,
            });
        }
        let Expression::ArrayExpression(arr) = strip_parens(expr) else {
            return None;
        };
        let elements: Vec<&Expression> = arr.elements.iter().filter_map(|e| e.as_expression()).collect();
        let markup: String = elements.iter().filter_map(|e| ast::string_value(e)).collect();

        let (helper, helper_object) = match elements.last().map(|e| strip_parens(e)) {
            Some(Expression::ObjectExpression(_)) => (
                Some("helper".to_string()),
                elements.last().map(|e| node_text(code, *e).to_string()),
            ),
            Some(last @ (Expression::Identifier(_) | Expression::StaticMemberExpression(_))) => {
                (Some(node_text(code, last).to_string()), None)
            }
            _ => (None, None),
        };
        Some(TemplateSource {
            markup,
            helper,
            helper_object,
        })
    })
    .flatten()
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERPOLATIONS
// ═══════════════════════════════════════════════════════════════════════════════

struct Interpolated {
    markup: String,
    expressions: Vec<String>,
    uses_format: bool,
}

fn placeholder(expressions: &mut Vec<String>, code: String) -> String {
    expressions.push(code);
    format!("__E2R_{}__", expressions.len() - 1)
}

/// Inline code first, so the field pass never sees its braces; then fields.
fn interpolate(markup: &str, helper: Option<&str>) -> Interpolated {
    let mut expressions: Vec<String> = Vec::new();
    let helper_prefix = helper.map(|h| format!("{}.", h)).unwrap_or_default();

    let markup = INLINE_CODE_RE
        .replace_all(markup, |caps: &Captures| {
            let code = VALUES_RE.replace_all(caps[1].trim(), "data");
            let code = THIS_RE.replace_all(&code, helper_prefix.as_str()).into_owned();
            placeholder(&mut expressions, code)
        })
        .into_owned();

    let mut uses_format = false;
    let markup = FIELD_RE
        .replace_all(&markup, |caps: &Captures| {
            let inner = caps[1].trim();
            let (field, formatter) = match inner.split_once(':') {
                Some((field, formatter)) => (field.trim(), Some(formatter)),
                None => (inner, None),
            };
            if !FIELD_NAME_RE.is_match(field) {
                return caps[0].to_string();
            }
            let field = if field == "." {
                "data".to_string()
            } else {
                format!("data.{}", field)
            };

            let code = match formatter.and_then(|f| FORMATTER_RE.captures(f)) {
                None if formatter.is_some() => return caps[0].to_string(),
                None => field,
                Some(fmt) => {
                    let name = &fmt[1];
                    let callee = match name.strip_prefix("this.") {
                        Some(method) => format!("{}.{}", helper.unwrap_or("helper"), method),
                        None => {
                            uses_format = true;
                            format!("{}.{}", LIB_FORMAT, name)
                        }
                    };
                    let mut args = vec![field];
                    if let Some(extra) = fmt.get(2).map(|m| m.as_str().trim()).filter(|e| !e.is_empty()) {
                        args.push(extra.to_string());
                    }
                    format!("{}({})", callee, args.join(", "))
                }
            };
            placeholder(&mut expressions, code)
        })
        .into_owned();

    Interpolated {
        markup,
        expressions,
        uses_format,
    }
}

fn segments(text: &str, expressions: &[String]) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Text(text[last..whole.start()].to_string()));
        }
        let index: usize = caps[1].parse().unwrap_or(usize::MAX);
        match expressions.get(index) {
            Some(code) => out.push(Segment::Expr(code.clone())),
            None => out.push(Segment::Text(whole.as_str().to_string())),
        }
        last = whole.end();
    }
    if last < text.len() {
        out.push(Segment::Text(text[last..].to_string()));
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST SCOPING
// ═══════════════════════════════════════════════════════════════════════════════

struct FreeNames {
    spans: Vec<oxc_span::Span>,
    names: Vec<String>,
}

impl<'a> Visit<'a> for FreeNames {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let name = ident.name.as_str();
        let lowercase = name.starts_with(|c: char| c.is_ascii_lowercase() || c == '_');
        if lowercase && !UNSCOPED.contains(&name) {
            self.spans.push(ident.span);
            self.names.push(name.to_string());
        }
    }
}

/// `active && count > 1` → `data.active && data.count > 1`.
fn scope_test(test: &str) -> String {
    let test = VALUES_RE.replace_all(test.trim(), "data").into_owned();
    let edits = ast::with_expression(&test, |expr| {
        let mut names = FreeNames {
            spans: Vec::new(),
            names: Vec::new(),
        };
        names.visit_expression(expr);
        names
            .spans
            .into_iter()
            .zip(names.names)
            .map(|(span, name)| Edit::replace(span, format!("data.{}", name)))
            .collect::<Vec<_>>()
    });
    let scoped = match edits {
        Some(edits) => apply_edits(&test, edits),
        None => test,
    };
    if scoped.contains("&&") || scoped.contains("||") || scoped.contains('?') {
        format!("({})", scoped)
    } else {
        scoped
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP → TREE
// ═══════════════════════════════════════════════════════════════════════════════

fn attr_value(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.to_string() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Children of `<body>`, wherever html5ever put it.
fn body_children(handle: &Handle) -> Option<Vec<Handle>> {
    for child in handle.children.borrow().iter() {
        match tag_name(child).as_deref() {
            Some("body") => return Some(child.children.borrow().clone()),
            Some("html") => {
                if let Some(found) = body_children(child) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_blank(node: &TemplateNode) -> bool {
    matches!(node, TemplateNode::Text(t) if t.trim().is_empty() && t.contains('\n'))
}

fn build_nodes(handles: &[Handle], expressions: &[String]) -> Vec<TemplateNode> {
    let mut nodes: Vec<TemplateNode> = Vec::new();

    for handle in handles {
        match &handle.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                for segment in segments(&text, expressions) {
                    match segment {
                        Segment::Text(t) => nodes.push(TemplateNode::Text(t)),
                        Segment::Expr(e) => nodes.push(TemplateNode::Expr(e)),
                    }
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.to_string();
                let children = build_nodes(&handle.children.borrow(), expressions);

                if tag != "tpl" {
                    let attrs = attrs
                        .borrow()
                        .iter()
                        .map(|a| {
                            let value = a.value.to_string();
                            let parts = segments(&value, expressions);
                            let text = if parts.iter().any(|p| matches!(p, Segment::Expr(_))) {
                                AttrText::Interpolated(parts)
                            } else {
                                AttrText::Static(value)
                            };
                            (a.name.local.to_string(), text)
                        })
                        .collect();
                    nodes.push(TemplateNode::Element { tag, attrs, children });
                    continue;
                }

                if let Some(test) = attr_value(handle, "if") {
                    nodes.push(TemplateNode::Conditional {
                        branches: vec![(scope_test(&test), children)],
                        otherwise: None,
                    });
                } else if let Some(test) = attr_value(handle, "elseif") {
                    if !extend_chain(&mut nodes, Some(scope_test(&test)), children.clone()) {
                        nodes.extend(children);
                    }
                } else if attr_value(handle, "else").is_some() {
                    if !extend_chain(&mut nodes, None, children.clone()) {
                        nodes.extend(children);
                    }
                } else if let Some(source) = attr_value(handle, "for") {
                    let source = match source.trim() {
                        "." => "data".to_string(),
                        field => scope_test(field),
                    };
                    nodes.push(TemplateNode::Loop { source, body: children });
                } else {
                    nodes.extend(children);
                }
            }
            _ => {}
        }
    }
    nodes
}

/// Attach an `elseif`/`else` block to the nearest preceding open `if` chain.
fn extend_chain(nodes: &mut Vec<TemplateNode>, test: Option<String>, children: Vec<TemplateNode>) -> bool {
    while nodes.last().map(is_blank).unwrap_or(false) {
        nodes.pop();
    }
    match nodes.last_mut() {
        Some(TemplateNode::Conditional { branches, otherwise }) if otherwise.is_none() => {
            match test {
                Some(test) => branches.push((test, children)),
                None => *otherwise = Some(children),
            }
            true
        }
        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREE → JSX
// ═══════════════════════════════════════════════════════════════════════════════

fn meaningful(nodes: &[TemplateNode]) -> Vec<&TemplateNode> {
    nodes.iter().filter(|n| !is_blank(n)).collect()
}

/// A node list as one expression: a lone element or expression stands alone,
/// anything else becomes a fragment.
fn group_expression(nodes: &[TemplateNode], nested: bool) -> String {
    let nodes = meaningful(nodes);
    match nodes.as_slice() {
        [] => "null".to_string(),
        [node @ TemplateNode::Element { .. }] => render_child(node),
        [TemplateNode::Expr(code)] => {
            if code.contains(' ') {
                format!("({})", code)
            } else {
                code.clone()
            }
        }
        [node @ (TemplateNode::Conditional { .. } | TemplateNode::Loop { .. })] => {
            let code = render_expression(node);
            if nested {
                format!("({})", code)
            } else {
                code
            }
        }
        many => {
            let inner: String = many.iter().map(|n| render_child(n)).collect();
            format!("<>{}</>", inner)
        }
    }
}

fn render_expression(node: &TemplateNode) -> String {
    match node {
        TemplateNode::Conditional { branches, otherwise } => {
            if branches.len() == 1 && otherwise.is_none() {
                let (test, body) = &branches[0];
                return format!("{} && {}", test, group_expression(body, true));
            }
            let mut code = match otherwise {
                Some(body) => group_expression(body, true),
                None => "null".to_string(),
            };
            for (test, body) in branches.iter().rev() {
                code = format!("{} ? {} : {}", test, group_expression(body, true), code);
            }
            code
        }
        TemplateNode::Loop { source, body } => {
            format!("({} || []).map(data => {})", source, group_expression(body, true))
        }
        other => render_child(other),
    }
}

fn render_child(node: &TemplateNode) -> String {
    match node {
        TemplateNode::Text(text) => {
            if text.contains(['{', '}', '<', '>']) {
                format!("{{{}}}", ast::quote(text))
            } else {
                text.clone()
            }
        }
        TemplateNode::Expr(code) => format!("{{{}}}", code),
        TemplateNode::Element { tag, attrs, children } => {
            let mut open = format!("<{}", tag);
            for (name, value) in attrs {
                let name = if name == "class" { "className" } else { name.as_str() };
                open.push(' ');
                open.push_str(&render_attr(name, value));
            }
            let children = meaningful(children);
            if children.is_empty() && VOID_TAGS.contains(&tag.as_str()) {
                return format!("{} />", open);
            }
            let inner: String = children.iter().map(|c| render_child(c)).collect();
            format!("{}>{}</{}>", open, inner, tag)
        }
        TemplateNode::Conditional { .. } | TemplateNode::Loop { .. } => {
            format!("{{{}}}", render_expression(node))
        }
    }
}

fn render_attr(name: &str, value: &AttrText) -> String {
    match value {
        AttrText::Static(text) if !text.contains(['"', '{', '}']) => format!("{}=\"{}\"", name, text),
        AttrText::Static(text) => format!("{}={{{}}}", name, ast::quote(text)),
        AttrText::Interpolated(parts) => {
            let mut literal = String::from("`");
            for part in parts {
                match part {
                    Segment::Text(t) => literal.push_str(&t.replace('`', "\\`").replace("${", "\\${")),
                    Segment::Expr(e) => {
                        literal.push_str("${");
                        literal.push_str(e);
                        literal.push('}');
                    }
                }
            }
            literal.push('`');
            format!("{}={{{}}}", name, literal)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile a `tpl` value. `None` when the value is not a string or string array,
/// in which case callers keep it as written.
pub fn compile_template(code: &str, unit: &str) -> Option<TemplateOutput> {
    let source = template_source(code)?;
    let mut output = TemplateOutput::default();
    output.libraries.insert(LIB_TEMPLATE.to_string());

    let interpolated = interpolate(&source.markup, source.helper.as_deref());
    if interpolated.uses_format {
        output.libraries.insert(LIB_FORMAT.to_string());
    }

    // else blocks close the block before them
    let markup = interpolated.markup.replace("<tpl else", "</tpl><tpl else");

    let dom = match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut markup.as_bytes())
    {
        Ok(dom) => dom,
        Err(e) => {
            output.diagnostics.report(
                DIAG_FORMAT_FALLBACK,
                format!("Unable to read template markup: {}", e),
                Some(unit),
            );
            return None;
        }
    };

    let handles = body_children(&dom.document).unwrap_or_default();
    let nodes = build_nodes(&handles, &interpolated.expressions);
    let body = group_expression(&nodes, false);

    let body = match ast::format_expression(&body) {
        Some(formatted) => formatted,
        None => {
            output.diagnostics.report(
                DIAG_FORMAT_FALLBACK,
                format!("Template body did not format; kept as written: {}", body),
                Some(unit),
            );
            body
        }
    };

    output.code = match &source.helper_object {
        Some(helper) => format!(
            "new Template(data => {{\n  const helper = {}\n\n  return ({})\n}})",
            helper, body
        ),
        None => format!("new Template(data => ({}))", body),
    };
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(code: &str) -> TemplateOutput {
        compile_template(code, "t.js").unwrap()
    }

    #[test]
    fn test_if_else_chain() {
        let out = compile(r#"'<tpl if="active">On</tpl><tpl else>Off</tpl>'"#);
        assert!(out.code.starts_with("new Template(data => ("));
        assert!(out.code.contains("data.active ? <>On</> : <>Off</>"), "{}", out.code);
        assert!(out.libraries.contains("Template"));
    }

    #[test]
    fn test_nested_else_inside_if() {
        let out = compile(r#"'<tpl if="a">A<tpl elseif="b">B<tpl else>C</tpl>'"#);
        assert!(out.code.contains("data.a ? <>A</> : data.b ? <>B</> : <>C</>"), "{}", out.code);
    }

    #[test]
    fn test_lone_if_uses_and() {
        let out = compile(r#"'<tpl if="admin"><b>Admin</b></tpl>'"#);
        assert!(out.code.contains("data.admin && <b>Admin</b>"), "{}", out.code);
    }

    #[test]
    fn test_fields_and_formatters() {
        let nodes = interpolate("<div class=\"x {cls}\">{name:ellipsis(10)} {.}</div>", None);
        assert_eq!(
            nodes.expressions,
            vec!["data.cls", "Format.ellipsis(data.name, 10)", "data"]
        );
        assert!(nodes.uses_format);

        let out = compile(r#"'<div class="x {cls}">{name}</div>'"#);
        assert!(out.code.contains("className={`x ${data.cls}`}"), "{}", out.code);
        assert!(out.code.contains("{data.name}"));
    }

    #[test]
    fn test_inline_code_is_protected_from_field_pass() {
        let nodes = interpolate("<p>{[ values.n > 1 ? 'many' : this.one({a: 1}) ]}</p>", Some("fmt"));
        assert_eq!(nodes.expressions, vec!["data.n > 1 ? 'many' : fmt.one({a: 1})"]);
    }

    #[test]
    fn test_helper_object_and_loop() {
        let out = compile(
            r#"['<tpl for="items"><i>{name:this.upper}</i></tpl>', { upper: function(v) { return v.toUpperCase(); } }]"#,
        );
        assert!(out.code.contains("const helper = { upper:"), "{}", out.code);
        assert!(out.code.contains("(data.items || []).map("), "{}", out.code);
        assert!(out.code.contains("helper.upper(data.name)"), "{}", out.code);
        assert!(!out.libraries.contains("Format"));
    }

    #[test]
    fn test_scope_test_expressions() {
        assert_eq!(scope_test("active"), "data.active");
        assert_eq!(scope_test("values.count > 1 && Ext.isEmpty(x)"), "(data.count > 1 && Ext.isEmpty(data.x))");
        assert_eq!(scope_test("user.name"), "data.user.name");
    }

    #[test]
    fn test_non_string_values_are_left_alone() {
        assert!(compile_template("someTemplate", "t.js").is_none());
    }
}

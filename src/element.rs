//! Element tree compiler
//!
//! Converts declarative widget configuration objects (`{ xtype: 'button', ... }`)
//! into JSX element trees. Output tags and property transforms come from the
//! [`CapabilityTable`]; widget tags that only a project class declares resolve
//! through the registry. Complex literal values are lifted into named bindings
//! so the markup stays flat.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use oxc_ast::ast::*;
use regex::Regex;

use crate::ast::{self, node_text, property_name, strip_parens};
use crate::capability::{Capability, CapabilityTable, PropTransform};
use crate::diagnostics::{Diagnostics, DIAG_UNKNOWN_ALIAS};
use crate::naming::NamingContext;
use crate::registry::Registry;
use crate::rewrite::SymbolTable;
use crate::template;

lazy_static! {
    static ref COMPLEX_LITERAL_RE: Regex = Regex::new(r"<[^>]+>|,|\.|\?").unwrap();
}

/// Props that configure the tree itself rather than the element.
const STRUCTURAL_PROPS: [&str; 2] = ["xtype", "items"];

const TEMPLATE_PROPS: [&str; 2] = ["tpl", "itemTpl"];

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    True,
    /// String literal contents.
    Literal(String),
    /// Any other expression, as source text.
    Code(String),
}

/// A configuration property before transforms run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProp {
    pub name: String,
    pub value: PropValue,
    /// Contains a string literal with markup, a comma, a dot or a `?`.
    pub complex: bool,
}

impl RawProp {
    pub fn code(name: &str, code: &str) -> Self {
        let complex = ast::with_expression(code, |expr| is_complex(expr)).unwrap_or(false);
        let value = ast::with_expression(code, |expr| prop_value(expr, code))
            .unwrap_or_else(|| PropValue::Code(code.to_string()));
        RawProp {
            name: name.to_string(),
            value,
            complex,
        }
    }

    pub fn identifier(name: &str, identifier: &str) -> Self {
        RawProp {
            name: name.to_string(),
            value: PropValue::Code(identifier.to_string()),
            complex: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Presence,
    Literal(String),
    Expression(String),
    /// Reference to an extracted binding.
    Binding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: AttrValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementChild {
    Element(ElementNode),
    Text(String),
    Expression(String),
    /// One branch per arm of a conditional `xtype`; an arm without an element is `null`.
    Conditional {
        test: String,
        consequent: Option<Box<ElementChild>>,
        alternate: Option<Box<ElementChild>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementNode {
    pub tag: String,
    pub attrs: Vec<Attr>,
    /// Props spread after the attributes (`{...props}`).
    pub spread: Option<String>,
    pub children: Vec<ElementChild>,
    /// Some capability in the chain consumes text content.
    pub text_capable: bool,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        ElementNode {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn has_text_child(&self) -> bool {
        self.children
            .iter()
            .any(|c| matches!(c, ElementChild::Text(_) | ElementChild::Expression(_)))
    }

    /// JSX source, children on their own lines.
    pub fn render(&self) -> String {
        self.render_at(0)
    }

    fn render_at(&self, depth: usize) -> String {
        let mut open = format!("<{}", self.tag);
        for attr in &self.attrs {
            open.push(' ');
            open.push_str(&render_attr(attr));
        }
        if let Some(spread) = &self.spread {
            open.push_str(&format!(" {{...{}}}", spread));
        }

        if self.children.is_empty() {
            return format!("{} />", open);
        }

        let pad = "  ".repeat(depth + 1);
        let mut out = format!("{}>", open);
        for child in &self.children {
            out.push('\n');
            out.push_str(&pad);
            out.push_str(&child.render_at(depth + 1));
        }
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

impl ElementChild {
    pub fn render(&self) -> String {
        self.render_at(0)
    }

    fn render_at(&self, depth: usize) -> String {
        match self {
            ElementChild::Element(el) => el.render_at(depth),
            ElementChild::Text(text) => {
                if text.contains(['{', '}', '<', '>']) {
                    format!("{{{}}}", ast::quote(text))
                } else {
                    text.clone()
                }
            }
            ElementChild::Expression(code) => format!("{{{}}}", code),
            ElementChild::Conditional { .. } => format!("{{{}}}", self.render_expression(depth)),
        }
    }

    /// The child as a JS expression rather than a JSX child.
    pub fn render_expression(&self, depth: usize) -> String {
        match self {
            ElementChild::Element(el) => el.render_at(depth),
            ElementChild::Text(text) => ast::quote(text),
            ElementChild::Expression(code) => code.clone(),
            ElementChild::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let arm = |child: &Option<Box<ElementChild>>| match child {
                    Some(child) => child.render_expression(depth),
                    None => "null".to_string(),
                };
                format!("{} ? {} : {}", test, arm(consequent), arm(alternate))
            }
        }
    }
}

fn render_attr(attr: &Attr) -> String {
    match &attr.value {
        AttrValue::Presence => attr.name.clone(),
        AttrValue::Literal(text) if !text.contains(['"', '\n', '{', '}']) => {
            format!("{}=\"{}\"", attr.name, text)
        }
        AttrValue::Literal(text) => format!("{}={{{}}}", attr.name, ast::quote(text)),
        AttrValue::Expression(code) | AttrValue::Binding(code) => format!("{}={{{}}}", attr.name, code),
    }
}

fn is_complex(expr: &Expression) -> bool {
    ast::string_literals(expr)
        .iter()
        .any(|s| COMPLEX_LITERAL_RE.is_match(s))
}

fn prop_value(expr: &Expression, source: &str) -> PropValue {
    match strip_parens(expr) {
        Expression::BooleanLiteral(b) if b.value => PropValue::True,
        Expression::StringLiteral(s) => PropValue::Literal(s.value.to_string()),
        _ => PropValue::Code(node_text(source, expr).to_string()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum WidgetType {
    Missing,
    Tag(String),
    Conditional {
        test: String,
        consequent: Option<String>,
        alternate: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct ConfigShape {
    widget: WidgetType,
    props: Vec<RawProp>,
    items: Vec<String>,
}

fn widget_type(expr: &Expression, source: &str) -> WidgetType {
    match strip_parens(expr) {
        Expression::ConditionalExpression(cond) => WidgetType::Conditional {
            test: node_text(source, &cond.test).to_string(),
            consequent: ast::string_value(&cond.consequent),
            alternate: ast::string_value(&cond.alternate),
        },
        other => match ast::string_value(other) {
            Some(tag) => WidgetType::Tag(tag),
            None => WidgetType::Missing,
        },
    }
}

/// Item configs of an `items` value: array elements or a single object.
fn item_texts(expr: &Expression, source: &str) -> Vec<String> {
    match strip_parens(expr) {
        Expression::ArrayExpression(arr) => arr
            .elements
            .iter()
            .filter_map(|el| el.as_expression())
            .map(|e| node_text(source, e).to_string())
            .collect(),
        Expression::ObjectExpression(_) => vec![node_text(source, expr).to_string()],
        _ => Vec::new(),
    }
}

/// `handler` → `onTap`, `listeners: { tap: 'onGo' }` → `onTap`. String handlers become
/// identifiers; `scope` and `element` are dropped.
pub fn listener_props(name: &str, value: &Expression, source: &str, naming: &NamingContext) -> Vec<RawProp> {
    let listener = |event: &str, value: &Expression| -> Option<RawProp> {
        if event == "scope" || event == "element" {
            return None;
        }
        let prop = if event == "handler" {
            "onTap".to_string()
        } else {
            format!("on{}", naming.capitalize(event))
        };
        match ast::string_value(value) {
            Some(handler) => Some(RawProp::identifier(&prop, &handler)),
            None => Some(RawProp::code(&prop, node_text(source, value))),
        }
    };

    match name {
        "handler" => listener("handler", value).into_iter().collect(),
        "listeners" => match strip_parens(value) {
            Expression::ObjectExpression(obj) => obj
                .properties
                .iter()
                .filter_map(|kind| match kind {
                    ObjectPropertyKind::ObjectProperty(p) => {
                        property_name(p).and_then(|event| listener(&event, &p.value))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn config_shape(code: &str, naming: &NamingContext) -> Option<ConfigShape> {
    ast::with_expression(code, |expr| {
        let Expression::ObjectExpression(obj) = strip_parens(expr) else {
            return None;
        };
        let mut shape = ConfigShape {
            widget: WidgetType::Missing,
            props: Vec::new(),
            items: Vec::new(),
        };
        for kind in obj.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(p) = kind else {
                continue;
            };
            let Some(name) = property_name(p) else {
                continue;
            };
            match name.as_str() {
                "xtype" => shape.widget = widget_type(&p.value, code),
                "items" => shape.items = item_texts(&p.value, code),
                "handler" | "listeners" => {
                    shape.props.extend(listener_props(&name, &p.value, code, naming))
                }
                _ => shape.props.push(RawProp::code(&name, node_text(code, &p.value))),
            }
        }
        Some(shape)
    })
    .flatten()
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER
// ═══════════════════════════════════════════════════════════════════════════════

/// A value lifted out of the markup: `const name = code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ElementOutput {
    pub bindings: Vec<Binding>,
    pub libraries: BTreeSet<String>,
    pub class_refs: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}

pub struct ElementCompiler<'c> {
    capabilities: &'c CapabilityTable,
    registry: &'c Registry,
    symbols: &'c SymbolTable,
    unit: &'c str,
    bindings: Vec<Binding>,
    libraries: BTreeSet<String>,
    class_refs: BTreeSet<String>,
    diagnostics: Diagnostics,
}

enum Resolved<'c> {
    Capability(String, Vec<&'c Capability>),
    Class(String, Vec<&'c Capability>),
}

impl<'c> ElementCompiler<'c> {
    pub fn new(
        capabilities: &'c CapabilityTable,
        registry: &'c Registry,
        symbols: &'c SymbolTable,
        unit: &'c str,
    ) -> Self {
        ElementCompiler {
            capabilities,
            registry,
            symbols,
            unit,
            bindings: Vec::new(),
            libraries: BTreeSet::new(),
            class_refs: BTreeSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn naming(&self) -> &'c NamingContext {
        self.registry.naming()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn finish(self) -> ElementOutput {
        ElementOutput {
            bindings: self.bindings,
            libraries: self.libraries,
            class_refs: self.class_refs,
            diagnostics: self.diagnostics,
        }
    }

    /// A project class registered for the tag wins, then the capability table,
    /// then a framework class.
    fn resolve_tag(&mut self, tag: &str) -> Option<Resolved<'c>> {
        let alias = format!("widget.{}", tag);
        let class_name = self.registry.resolve_alias(&alias).map(str::to_string);
        let base = self.capabilities.chain("component");

        if let Some(class_name) = &class_name {
            if self.registry.is_local(class_name) {
                let import = self.class_import(&alias, class_name)?;
                self.class_refs.insert(import.clone());
                return Some(Resolved::Class(import, base));
            }
        }

        let chain = self.capabilities.chain(tag);
        if let Some(output) = self.capabilities.output_tag(tag) {
            if output.starts_with(|c: char| c.is_ascii_uppercase()) {
                self.libraries.insert(output.to_string());
            }
            return Some(Resolved::Capability(output.to_string(), chain));
        }

        let class_name = class_name?;
        let import = self.class_import(&alias, &class_name)?;
        self.class_refs.insert(import.clone());
        Some(Resolved::Class(import, base))
    }

    fn class_import(&self, alias: &str, class_name: &str) -> Option<String> {
        if let Some(local) = self
            .symbols
            .alias_import(alias)
            .or_else(|| self.symbols.class_import(class_name))
        {
            return Some(local.to_string());
        }
        self.registry
            .resolve_class(class_name)
            .and_then(|cls| cls.resolution.as_ref())
            .map(|r| r.export_name.clone())
    }

    /// Element for a widget tag with the given props, or `None` for an unknown tag.
    pub fn convert(&mut self, tag: &str, props: Vec<RawProp>) -> Option<ElementNode> {
        match self.resolve_tag(tag) {
            Some(Resolved::Capability(output, chain)) | Some(Resolved::Class(output, chain)) => {
                Some(self.build(tag, output, &chain, props))
            }
            None => {
                self.diagnostics.tally_tag(tag);
                self.diagnostics.report(
                    DIAG_UNKNOWN_ALIAS,
                    format!("No element for widget type '{}'", tag),
                    Some(self.unit),
                );
                None
            }
        }
    }

    /// Root element of a function component: the parent component with the
    /// class's own props, a props spread and compiled children.
    pub fn root(&mut self, tag: &str, props: Vec<RawProp>, children: Vec<ElementChild>) -> ElementNode {
        let chain = self.capabilities.chain("component");
        let mut node = self.build(tag, tag.to_string(), &chain, props);
        node.spread = Some("props".to_string());
        node.children.extend(children);
        node
    }

    fn build(&mut self, tag: &str, output: String, chain: &[&Capability], props: Vec<RawProp>) -> ElementNode {
        let mut node = ElementNode::new(output);
        node.text_capable = chain
            .iter()
            .any(|c| c.props.iter().any(|(_, t)| matches!(t, PropTransform::TextChild)));
        let mut icon_tag: Option<&'static str> = None;

        for prop in props {
            if STRUCTURAL_PROPS.contains(&prop.name.as_str()) {
                continue;
            }
            let mut pending = Some(prop);
            let mut transformed = false;

            for capability in chain {
                let Some(current) = pending.as_mut() else {
                    break;
                };
                let Some(transform) = capability.transform(&current.name) else {
                    continue;
                };
                transformed = true;
                match transform {
                    PropTransform::Suppress => pending = None,
                    PropTransform::Rename(name) => current.name = name.to_string(),
                    PropTransform::TextChild => {
                        if let Some(prop) = pending.take() {
                            if let Some(child) = self.text_child(prop) {
                                node.children.push(child);
                            }
                        }
                    }
                    PropTransform::IconContent { icon_tag: tag } => {
                        current.name = "icon".to_string();
                        icon_tag = Some(tag);
                    }
                    PropTransform::Custom(custom) => {
                        if !custom(current, &mut node) {
                            pending = None;
                        }
                    }
                }
            }

            if let Some(prop) = pending {
                if !transformed && !prop.name.starts_with("on") {
                    self.diagnostics.tally_prop(tag, &prop.name);
                }
                let attr = self.attribute(prop);
                node.attrs.push(attr);
            }
        }

        if let Some(icon_tag) = icon_tag {
            if !node.has_text_child() {
                node.tag = icon_tag.to_string();
                self.libraries.insert(icon_tag.to_string());
            }
        }
        node
    }

    fn text_child(&mut self, prop: RawProp) -> Option<ElementChild> {
        let name = prop.name.clone();
        match self.attribute(prop).value {
            AttrValue::Presence => None,
            AttrValue::Literal(text) => Some(ElementChild::Text(text)),
            AttrValue::Expression(code) | AttrValue::Binding(code) => {
                log::trace!("text child from '{}'", name);
                Some(ElementChild::Expression(code))
            }
        }
    }

    fn attribute(&mut self, prop: RawProp) -> Attr {
        if TEMPLATE_PROPS.contains(&prop.name.as_str()) {
            let code = match &prop.value {
                PropValue::Literal(text) => ast::quote(text),
                PropValue::Code(code) => code.clone(),
                PropValue::True => "true".to_string(),
            };
            let compiled = match template::compile_template(&code, self.unit) {
                Some(output) => {
                    self.libraries.extend(output.libraries);
                    self.diagnostics.merge(output.diagnostics);
                    output.code
                }
                None => code,
            };
            let name = self.bind(&prop.name, compiled);
            return Attr {
                name: prop.name,
                value: AttrValue::Binding(name),
            };
        }

        let value = match prop.value {
            PropValue::True => AttrValue::Presence,
            PropValue::Literal(text) if prop.complex => {
                AttrValue::Binding(self.bind(&prop.name, ast::quote(&text)))
            }
            PropValue::Literal(text) => AttrValue::Literal(text),
            PropValue::Code(code) if prop.complex => AttrValue::Binding(self.bind(&prop.name, code)),
            PropValue::Code(code) => AttrValue::Expression(code),
        };
        Attr {
            name: prop.name,
            value,
        }
    }

    /// `name`, then `name2`, `name3`… in first-occurrence order.
    fn bind(&mut self, name: &str, code: String) -> String {
        let taken: BTreeSet<&str> = self.bindings.iter().map(|b| b.name.as_str()).collect();
        let mut candidate = name.to_string();
        let mut instance = 1;
        while taken.contains(candidate.as_str()) {
            instance += 1;
            candidate = format!("{}{}", name, instance);
        }
        self.bindings.push(Binding {
            name: candidate.clone(),
            code,
        });
        candidate
    }

    /// Compile one item config. Configs without a usable `xtype` yield `None`.
    pub fn compile_config(&mut self, code: &str) -> Option<ElementChild> {
        let shape = config_shape(code, self.naming())?;
        match shape.widget.clone() {
            WidgetType::Missing => None,
            WidgetType::Tag(tag) => self.compile_shape(&tag, shape).map(ElementChild::Element),
            WidgetType::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let mut arm = |tag: Option<String>| -> Option<Box<ElementChild>> {
                    let tag = tag?;
                    self.compile_shape(&tag, shape.clone())
                        .map(|el| Box::new(ElementChild::Element(el)))
                };
                let consequent = arm(consequent);
                let alternate = arm(alternate);
                if consequent.is_none() && alternate.is_none() {
                    return None;
                }
                Some(ElementChild::Conditional {
                    test,
                    consequent,
                    alternate,
                })
            }
        }
    }

    fn compile_shape(&mut self, tag: &str, shape: ConfigShape) -> Option<ElementNode> {
        let mut node = self.convert(tag, shape.props)?;
        let children = self.compile_items(&shape.items);
        node.children.extend(children);
        Some(node)
    }

    /// Compile a list of item configs, dropping the ones that yield no element.
    pub fn compile_items(&mut self, items: &[String]) -> Vec<ElementChild> {
        items
            .iter()
            .filter_map(|item| self.compile_config(item))
            .collect()
    }

    /// Item configs of an `items` value source text.
    pub fn items_of(code: &str) -> Vec<String> {
        ast::with_expression(code, |expr| item_texts(expr, code)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ParsedUnit;

    fn registry() -> Registry {
        let mut registry = Registry::new(NamingContext::default());
        let unit = ParsedUnit::parse(
            "app/view/Card.js",
            "Ext.define('App.view.Card', { extend: 'Ext.Container', xtype: 'card' });",
            &["Ext.define".to_string()],
        );
        registry.register(&unit).unwrap();
        registry.finalize().unwrap();
        registry
    }

    fn scenario_table() -> CapabilityTable {
        let mut table = CapabilityTable::empty();
        table.insert(Capability::new("component").output("div"));
        table.insert(
            Capability::new("button")
                .extends("component")
                .output("Button")
                .prop("text", PropTransform::Suppress)
                .prop("onTap", PropTransform::Rename("onClick")),
        );
        table
    }

    #[test]
    fn test_button_config() {
        let registry = registry();
        let table = scenario_table();
        let symbols = SymbolTable::new();
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let child = compiler
            .compile_config("{ xtype: 'button', text: 'Go', handler: 'onGo' }")
            .unwrap();
        let ElementChild::Element(node) = child else {
            panic!("expected an element");
        };
        assert_eq!(node.tag, "Button");
        assert_eq!(node.attr("onClick"), Some(&AttrValue::Expression("onGo".to_string())));
        assert!(node.attr("text").is_none());
        assert!(node.attr("handler").is_none());
        assert!(node.attr("onTap").is_none());
    }

    #[test]
    fn test_text_child_and_icon_only() {
        let registry = registry();
        let table = CapabilityTable::default();
        let symbols = SymbolTable::new();
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let node = compiler
            .convert("button", vec![RawProp::code("text", "'Save'"), RawProp::code("disabled", "true")])
            .unwrap();
        assert_eq!(node.render(), "<Button disabled>\n  Save\n</Button>");

        let icon = compiler
            .convert("button", vec![RawProp::code("iconCls", "'x-add'")])
            .unwrap();
        assert_eq!(icon.tag, "IconButton");
        assert_eq!(icon.attr("icon"), Some(&AttrValue::Literal("x-add".to_string())));
    }

    #[test]
    fn test_complex_values_bind_in_order() {
        let registry = registry();
        let table = CapabilityTable::default();
        let symbols = SymbolTable::new();
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let items = ElementCompiler::items_of(
            "[{ xtype: 'label', label: 'a, b' }, { xtype: 'label', label: 'a, b' }, { xtype: 'label', label: 'plain' }]",
        );
        let children = compiler.compile_items(&items);
        assert_eq!(children.len(), 3);

        let names: Vec<&str> = compiler.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["label", "label2"]);
        let ElementChild::Element(first) = &children[0] else { panic!() };
        assert_eq!(first.attr("label"), Some(&AttrValue::Binding("label".to_string())));
        let ElementChild::Element(third) = &children[2] else { panic!() };
        assert_eq!(third.attr("label"), Some(&AttrValue::Literal("plain".to_string())));
    }

    #[test]
    fn test_conditional_xtype_and_registry_fallback() {
        let registry = registry();
        let table = CapabilityTable::default();
        let mut symbols = SymbolTable::new();
        symbols.insert_alias("widget.card", "Card");
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let child = compiler
            .compile_config("{ xtype: wide ? 'card' : 'label', cls: 'c' }")
            .unwrap();
        let rendered = child.render();
        assert_eq!(rendered, "{wide ? <Card className=\"c\" /> : <Label className=\"c\" />}");

        assert!(compiler.compile_config("{ xtype: 'mystery', foo: 1 }").is_none());
        let output = compiler.finish();
        assert!(output.class_refs.contains("Card"));
        assert!(output.libraries.contains("Label"));
        assert_eq!(output.diagnostics.unrecognized_tags.get("mystery"), Some(&1));
    }

    #[test]
    fn test_listeners_and_unrecognized_props() {
        let registry = registry();
        let table = CapabilityTable::default();
        let symbols = SymbolTable::new();
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let child = compiler
            .compile_config("{ xtype: 'list', listeners: { itemtap: 'onItem', scope: this }, grouped: true }")
            .unwrap();
        let ElementChild::Element(node) = child else { panic!() };
        assert_eq!(node.attr("onItemTap"), Some(&AttrValue::Expression("onItem".to_string())));
        assert!(node.attr("scope").is_none());
        assert_eq!(node.attr("grouped"), Some(&AttrValue::Presence));

        let output = compiler.finish();
        assert_eq!(output.diagnostics.unrecognized_props.get("list.grouped"), Some(&1));
    }

    #[test]
    fn test_children_of_unknown_tag_leave_no_trace() {
        let registry = registry();
        let table = CapabilityTable::default();
        let symbols = SymbolTable::new();
        let mut compiler = ElementCompiler::new(&table, &registry, &symbols, "a.js");

        let child = compiler.compile_config(
            "{ xtype: 'mystery', items: [{ xtype: 'button', handler: 'onGo', label: 'a, b' }] }",
        );
        assert!(child.is_none());

        let output = compiler.finish();
        assert!(output.bindings.is_empty());
        assert!(!output.libraries.contains("Button"));
        assert!(output.class_refs.is_empty());
        assert_eq!(output.diagnostics.unrecognized_tags.get("mystery"), Some(&1));
        assert!(output.diagnostics.unrecognized_props.is_empty());
    }
}

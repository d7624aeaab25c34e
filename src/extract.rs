//! Class extraction (parse pass)
//!
//! Turns one source unit into a [`ParsedUnit`]: the raw [`ClassModel`] of every
//! `Ext.define(name, body)` call plus the top-level code that is not a class.
//! Extraction never consults other units, so units can be parsed in parallel.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, Span};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::{self, node_text, property_name, qualified_name, slice, strip_parens};
use crate::diagnostics::{Diagnostics, DIAG_DEFINE_SHAPE, DIAG_MALFORMED_ALIAS, DIAG_UNPARSEABLE};
use crate::model::{ClassModel, ConfigEntry, ConfigKind, Member, MemberKind};

lazy_static! {
    static ref METHOD_CALL_RE: Regex = Regex::new(r"^[A-Za-z0-9_$.\[\]()]+$").unwrap();
}

const ALIAS_CONFIGS: [&str; 4] = ["xtype", "alias", "controller", "viewModel"];

// ═══════════════════════════════════════════════════════════════════════════════
// PARSED UNIT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUnit {
    /// Path relative to the source root, `/`-separated.
    pub path: String,
    pub source: String,
    /// False when the unit has no define call or fails to parse; copied through.
    pub parseable: bool,
    pub classes: Vec<ClassModel>,
    /// Top-level statements that contain no define call, in order.
    pub leftover: Vec<String>,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

impl ParsedUnit {
    pub fn parse(path: &str, source: &str, define_callees: &[String]) -> ParsedUnit {
        let mut unit = ParsedUnit {
            path: path.to_string(),
            source: source.to_string(),
            ..Default::default()
        };

        if !define_callees.iter().any(|callee| source.contains(callee.as_str())) {
            return unit;
        }

        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, ast::source_type()).parse();
        if ret.panicked || !ret.errors.is_empty() {
            let message = ret
                .errors
                .first()
                .map(|e| format!("{:?}", e))
                .unwrap_or_else(|| "parser panicked".to_string());
            unit.diagnostics.report(
                DIAG_UNPARSEABLE,
                format!("Unable to parse: {}", message),
                Some(path),
            );
            return unit;
        }

        let mut finder = DefineFinder {
            source,
            unit: path,
            callees: define_callees,
            classes: Vec::new(),
            spans: Vec::new(),
            diagnostics: Diagnostics::new(),
        };
        finder.visit_program(&ret.program);

        for stmt in ret.program.body.iter() {
            let span = stmt.span();
            let holds_define = finder
                .spans
                .iter()
                .any(|s| s.start >= span.start && s.end <= span.end);
            if !holds_define {
                unit.leftover.push(slice(source, span).to_string());
            }
        }

        unit.parseable = !finder.classes.is_empty();
        unit.classes = finder.classes;
        unit.diagnostics.merge(finder.diagnostics);
        log::debug!("{}: extracted {} class(es)", path, unit.classes.len());
        unit
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFINE CALL DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

struct DefineFinder<'s> {
    source: &'s str,
    unit: &'s str,
    callees: &'s [String],
    classes: Vec<ClassModel>,
    spans: Vec<Span>,
    diagnostics: Diagnostics,
}

impl<'s> DefineFinder<'s> {
    fn is_define(&self, callee: &Expression) -> bool {
        qualified_name(callee)
            .map(|name| self.callees.iter().any(|c| *c == name))
            .unwrap_or(false)
    }
}

impl<'a, 's> Visit<'a> for DefineFinder<'s> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if !self.is_define(&call.callee) {
            walk::walk_call_expression(self, call);
            return;
        }

        let name = call
            .arguments
            .first()
            .and_then(|a| a.as_expression())
            .and_then(ast::string_value);
        let body = call.arguments.get(1).and_then(|a| a.as_expression());

        let (Some(name), Some(body)) = (name, body) else {
            self.diagnostics.report(
                DIAG_DEFINE_SHAPE,
                format!("Skipping define call: {}", node_text(self.source, call)),
                Some(self.unit),
            );
            return;
        };

        match class_body(body) {
            Some(obj) => {
                let call_text = node_text(self.source, call).to_string();
                let model = extract_class(
                    &name,
                    obj,
                    self.source,
                    self.unit,
                    call_text,
                    &mut self.diagnostics,
                );
                self.classes.push(model);
                self.spans.push(call.span);
            }
            None => self.diagnostics.report(
                DIAG_DEFINE_SHAPE,
                format!("Class body for {} is neither an object nor a factory", name),
                Some(self.unit),
            ),
        }
    }
}

/// The member object: a literal, or what a factory function returns.
fn class_body<'b, 'a>(expr: &'b Expression<'a>) -> Option<&'b ObjectExpression<'a>> {
    match strip_parens(expr) {
        Expression::ObjectExpression(obj) => Some(&**obj),
        Expression::FunctionExpression(func) => {
            let body = func.body.as_ref()?;
            returned_object(&body.statements)
        }
        Expression::ArrowFunctionExpression(arrow) => {
            if arrow.expression {
                match arrow.body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) => match strip_parens(&stmt.expression) {
                        Expression::ObjectExpression(obj) => Some(&**obj),
                        _ => None,
                    },
                    _ => None,
                }
            } else {
                returned_object(&arrow.body.statements)
            }
        }
        _ => None,
    }
}

fn returned_object<'b, 'a>(statements: &'b [Statement<'a>]) -> Option<&'b ObjectExpression<'a>> {
    statements.iter().rev().find_map(|stmt| match stmt {
        Statement::ReturnStatement(ret) => match ret.argument.as_ref().map(strip_parens) {
            Some(Expression::ObjectExpression(obj)) => Some(&**obj),
            _ => None,
        },
        _ => None,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBER EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════

fn extract_class(
    name: &str,
    obj: &ObjectExpression,
    source: &str,
    unit: &str,
    call_text: String,
    diagnostics: &mut Diagnostics,
) -> ClassModel {
    let mut cls = ClassModel::new(name, unit);
    cls.source = call_text;

    for kind in obj.properties.iter() {
        let ObjectPropertyKind::ObjectProperty(prop) = kind else {
            continue;
        };
        let Some(key) = property_name(prop) else {
            continue;
        };
        let value = &prop.value;

        match key.as_str() {
            "extend" => {
                cls.parent_name = class_reference_names(value, source).into_iter().next();
            }
            "xtype" | "alias" => {
                let aliases = aliases_from_node(&key, value, name, source, Some(&mut *diagnostics));
                push_unique(&mut cls.aliases, aliases);
            }
            "alternateClassName" => {
                cls.alternate_names = class_reference_names(value, source);
            }
            "override" => {
                cls.override_target = class_reference_names(value, source).into_iter().next();
            }
            "singleton" => cls.singleton = ast::is_true(value),
            "mixins" => cls.mixins = class_reference_names(value, source),
            "requires" | "uses" => {}
            "statics" | "inheritableStatics" => {
                if let Expression::ObjectExpression(statics) = strip_parens(value) {
                    for kind in statics.properties.iter() {
                        if let ObjectPropertyKind::ObjectProperty(p) = kind {
                            if let Some(member) = member_from_property(p, source) {
                                cls.static_members.push(member);
                            }
                        }
                    }
                }
            }
            "config" | "cachedConfig" | "eventedConfig" => {
                let config_kind = match key.as_str() {
                    "cachedConfig" => ConfigKind::Cached,
                    "eventedConfig" => ConfigKind::Evented,
                    _ => ConfigKind::Plain,
                };
                if let Expression::ObjectExpression(block) = strip_parens(value) {
                    for kind in block.properties.iter() {
                        if let ObjectPropertyKind::ObjectProperty(p) = kind {
                            if let Some(config_name) = property_name(p) {
                                cls.configs.push(ConfigEntry {
                                    name: config_name,
                                    default_value: node_text(source, &p.value).to_string(),
                                    kind: config_kind,
                                });
                            }
                        }
                    }
                }
            }
            _ => {
                if key == "plugins" {
                    cls.plugins = class_reference_names(value, source);
                }
                if key == "controller" {
                    cls.controller_alias = aliases_from_node(&key, value, name, source, Some(&mut *diagnostics))
                        .into_iter()
                        .next();
                }
                if let Some(member) = member_from_property(prop, source) {
                    if member.is_method() {
                        cls.methods.push(member);
                    } else {
                        cls.properties.push(member);
                    }
                }
            }
        }
    }

    let mut usage = AliasUsageCollector {
        source,
        class_name: name,
        aliases: Vec::new(),
    };
    usage.visit_object_expression(obj);
    let used: Vec<String> = usage
        .aliases
        .into_iter()
        .filter(|a| !cls.aliases.contains(a))
        .collect();
    push_unique(&mut cls.aliases_used, used);

    let mut calls = MethodCallCollector {
        source,
        calls: Vec::new(),
    };
    calls.visit_object_expression(obj);
    cls.method_calls = calls.calls;

    cls
}

fn member_from_property(prop: &ObjectProperty, source: &str) -> Option<Member> {
    let name = property_name(prop)?;
    if prop.kind != PropertyKind::Init {
        log::debug!("skipping accessor property '{}'", name);
        return None;
    }

    if prop.method {
        if let Expression::FunctionExpression(func) = &prop.value {
            let rest = slice(source, Span::new(prop.key.span().end, prop.span.end));
            let keyword = match (func.r#async, func.generator) {
                (true, true) => "async function*",
                (true, false) => "async function",
                (false, true) => "function*",
                (false, false) => "function",
            };
            return Some(Member {
                name,
                value: format!("{}{}", keyword, rest.trim_start()),
                kind: MemberKind::Method,
            });
        }
    }

    let kind = if ast::is_function(&prop.value) {
        MemberKind::Method
    } else {
        MemberKind::Property
    };
    Some(Member {
        name,
        value: node_text(source, &prop.value).to_string(),
        kind,
    })
}

fn push_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALIASES & CLASS REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

fn alias_prefix(config_name: &str) -> &'static str {
    match config_name {
        "xtype" => "widget.",
        "viewModel" => "viewmodel.",
        "controller" => "controller.",
        _ => "",
    }
}

/// Aliases named by an `xtype`/`alias`/`controller`/`viewModel` value.
/// Unsupported shapes are reported (when a sink is given) and contribute nothing.
pub fn aliases_from_node(
    config_name: &str,
    node: &Expression,
    class_name: &str,
    source: &str,
    mut diagnostics: Option<&mut Diagnostics>,
) -> Vec<String> {
    fn handle(
        config_name: &str,
        node: &Expression,
        class_name: &str,
        source: &str,
        diagnostics: &mut Option<&mut Diagnostics>,
        aliases: &mut Vec<String>,
    ) {
        let node = strip_parens(node);
        if let Some(value) = ast::string_value(node) {
            aliases.push(format!("{}{}", alias_prefix(config_name), value));
            return;
        }
        match node {
            Expression::NullLiteral(_) => {}
            Expression::ArrayExpression(arr) if matches!(config_name, "xtype" | "alias") => {
                for el in arr.elements.iter() {
                    if let Some(expr) = el.as_expression() {
                        handle(config_name, expr, class_name, source, diagnostics, aliases);
                    }
                }
            }
            Expression::ObjectExpression(obj) if matches!(config_name, "controller" | "viewModel") => {
                if let Some(type_prop) = ast::find_property(obj, "type") {
                    handle(config_name, &type_prop.value, class_name, source, diagnostics, aliases);
                }
            }
            Expression::ConditionalExpression(cond) => {
                handle(config_name, &cond.consequent, class_name, source, diagnostics, aliases);
                handle(config_name, &cond.alternate, class_name, source, diagnostics, aliases);
            }
            _ => {
                if let Some(sink) = diagnostics.as_deref_mut() {
                    sink.report(
                        DIAG_MALFORMED_ALIAS,
                        format!(
                            "Error parsing {} ({}): {}",
                            config_name,
                            class_name,
                            node_text(source, node)
                        ),
                        None,
                    );
                }
            }
        }
    }

    let mut aliases = Vec::new();
    handle(config_name, node, class_name, source, &mut diagnostics, &mut aliases);
    aliases
}

/// Candidate class names in a reference value: strings, dotted paths, array
/// elements, and both keys and values of object forms. Filtering against the
/// registry happens at finalize.
pub fn class_reference_names(node: &Expression, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_reference_names(node, source, &mut names);
    names
}

fn collect_reference_names(node: &Expression, source: &str, names: &mut Vec<String>) {
    let node = strip_parens(node);
    if let Some(value) = ast::string_value(node) {
        names.push(value);
        return;
    }
    match node {
        Expression::ArrayExpression(arr) => {
            for el in arr.elements.iter() {
                if let Some(expr) = el.as_expression() {
                    collect_reference_names(expr, source, names);
                }
            }
        }
        Expression::ObjectExpression(obj) => {
            for kind in obj.properties.iter() {
                if let ObjectPropertyKind::ObjectProperty(p) = kind {
                    if let Some(key) = property_name(p) {
                        names.push(key);
                    }
                }
            }
            for kind in obj.properties.iter() {
                if let ObjectPropertyKind::ObjectProperty(p) = kind {
                    collect_reference_names(&p.value, source, names);
                }
            }
        }
        Expression::NullLiteral(_) => {}
        _ => {
            if let Some(name) = qualified_name(node) {
                names.push(name);
            } else {
                names.push(node_text(source, node).to_string());
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLECTORS
// ═══════════════════════════════════════════════════════════════════════════════

struct AliasUsageCollector<'s> {
    source: &'s str,
    class_name: &'s str,
    aliases: Vec<String>,
}

impl<'a, 's> Visit<'a> for AliasUsageCollector<'s> {
    fn visit_object_expression(&mut self, obj: &ObjectExpression<'a>) {
        for kind in obj.properties.iter() {
            if let ObjectPropertyKind::ObjectProperty(p) = kind {
                if let Some(name) = property_name(p) {
                    if ALIAS_CONFIGS.contains(&name.as_str()) {
                        let found =
                            aliases_from_node(&name, &p.value, self.class_name, self.source, None);
                        push_unique(&mut self.aliases, found);
                    }
                }
            }
        }
        walk::walk_object_expression(self, obj);
    }
}

struct MethodCallCollector<'s> {
    source: &'s str,
    calls: Vec<String>,
}

impl<'a, 's> Visit<'a> for MethodCallCollector<'s> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        let callee = qualified_name(&call.callee)
            .unwrap_or_else(|| node_text(self.source, &call.callee).to_string());
        if METHOD_CALL_RE.is_match(&callee) {
            self.calls.push(callee);
        }
        walk::walk_call_expression(self, call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedUnit {
        ParsedUnit::parse("app/view/Main.js", source, &["Ext.define".to_string()])
    }

    #[test]
    fn test_extracts_members_by_kind() {
        let unit = parse(
            r#"
            Ext.define('App.view.Main', {
                extend: 'Ext.Container',
                xtype: 'main',
                requires: ['App.Other'],
                config: { title: 'x', count: 0 },
                eventedConfig: { value: null },
                statics: { create: function() { return 1; }, VERSION: 2 },
                height: 20,
                onTap: function(btn) { this.fire(); },
                render() { return 1; }
            });
            "#,
        );
        assert!(unit.parseable);
        let cls = &unit.classes[0];
        assert_eq!(cls.name, "App.view.Main");
        assert_eq!(cls.parent_name.as_deref(), Some("Ext.Container"));
        assert_eq!(cls.aliases, vec!["widget.main"]);
        assert_eq!(cls.configs.len(), 3);
        assert_eq!(cls.configs[2].kind, ConfigKind::Evented);
        assert_eq!(cls.static_members.len(), 2);
        assert_eq!(cls.properties.len(), 1);
        assert_eq!(cls.methods.len(), 2);
        assert!(cls.methods[1].value.starts_with("function("));
        assert!(cls.method_calls.contains(&"this.fire".to_string()));
    }

    #[test]
    fn test_factory_function_body() {
        let unit = parse("Ext.define('A.B', function(B) { return { singleton: true }; });");
        assert!(unit.classes[0].singleton);
    }

    #[test]
    fn test_aliases_from_array_and_ternary() {
        let unit = parse(
            "Ext.define('A.B', { alias: ['widget.a', 'widget.b'], xtype: flag ? 'c' : 'd' });",
        );
        let aliases = &unit.classes[0].aliases;
        assert_eq!(aliases, &vec!["widget.a", "widget.b", "widget.c", "widget.d"]);
    }

    #[test]
    fn test_malformed_alias_is_reported_not_fatal() {
        let unit = parse("Ext.define('A.B', { xtype: getType() });");
        assert!(unit.classes[0].aliases.is_empty());
        assert!(unit.diagnostics.has_code(DIAG_MALFORMED_ALIAS));
    }

    #[test]
    fn test_controller_object_form_and_usage() {
        let unit = parse(
            r#"Ext.define('A.V', {
                controller: { type: 'main' },
                items: [{ xtype: 'button' }]
            });"#,
        );
        let cls = &unit.classes[0];
        assert_eq!(cls.controller_alias.as_deref(), Some("controller.main"));
        assert!(cls.aliases_used.contains(&"widget.button".to_string()));
        assert!(cls.aliases_used.contains(&"controller.main".to_string()));
    }

    #[test]
    fn test_mixins_object_form_collects_keys_and_values() {
        let unit = parse("Ext.define('A.B', { mixins: { observable: 'Ext.util.Observable' } });");
        assert_eq!(
            unit.classes[0].mixins,
            vec!["observable".to_string(), "Ext.util.Observable".to_string()]
        );
    }

    #[test]
    fn test_leftover_code_and_unparseable() {
        let unit = parse("var helper = 1;\nExt.define('A.B', {});\nhelper++;");
        assert_eq!(unit.leftover, vec!["var helper = 1;", "helper++;"]);

        let broken = parse("Ext.define('A.B', {");
        assert!(!broken.parseable);
        assert!(broken.diagnostics.has_code(DIAG_UNPARSEABLE));

        let plain = parse("console.log(1)");
        assert!(!plain.parseable);
    }
}

//! Rewrite passes
//!
//! Every pass is a read-only visitor that collects span edits over one source
//! fragment; the edits are applied outermost-first and the pass repeats until it
//! stops producing edits. The pass list itself repeats until the text settles, so
//! rewriting already rewritten output changes nothing.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{GetSpan, Span};
use oxc_syntax::scope::ScopeFlags;

use crate::ast::{self, apply_edits, node_text, params_text, qualified_name, slice, strip_parens, Edit};
use crate::registry::Registry;
use crate::rules::{canonical_callee, find_call_rule, find_member_rule, CallArg};

const MAX_ROUNDS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// A single expression: member values, method functions.
    Expression,
    /// Statements: top-level code outside class definitions.
    Program,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Class spellings and aliases in scope for one unit, mapped to local names.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    classes: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_class(&mut self, spelling: impl Into<String>, local: impl Into<String>) {
        self.classes.insert(spelling.into(), local.into());
    }

    pub fn insert_alias(&mut self, alias: impl Into<String>, local: impl Into<String>) {
        self.aliases.insert(alias.into(), local.into());
    }

    pub fn class_import(&self, spelling: &str) -> Option<&str> {
        self.classes.get(spelling).map(String::as_str)
    }

    pub fn alias_import(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }
}

/// Names a function component body can reach without `this`.
#[derive(Debug, Clone, Default)]
pub struct ComponentScope {
    /// Local bindings (`this.member` → `member`).
    pub members: BTreeSet<String>,
    /// Configs read from props (`this.config` → `props.config`).
    pub configs: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    /// Name of the enclosing member, when rewriting one.
    pub method: Option<String>,
    pub has_parent: bool,
    /// Configs with generated accessors on the enclosing class.
    pub accessors: BTreeSet<String>,
    pub component: Option<ComponentScope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub code: String,
    /// Helper library tags the rewritten code needs.
    pub libraries: BTreeSet<String>,
    /// Local class names the rewritten code refers to.
    pub class_refs: BTreeSet<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    SpecialCalls,
    CallRules,
    MemberRules,
    Accessors,
    ClassNames,
    ComponentRefs,
    MeAlias,
    Arrows,
    VarToLet,
    ReturnShorthand,
    TemplateLiterals,
}

const PASSES: [Pass; 11] = [
    Pass::SpecialCalls,
    Pass::CallRules,
    Pass::MemberRules,
    Pass::Accessors,
    Pass::ClassNames,
    Pass::ComponentRefs,
    Pass::MeAlias,
    Pass::Arrows,
    Pass::VarToLet,
    Pass::ReturnShorthand,
    Pass::TemplateLiterals,
];

/// Rewrite one fragment. Unparseable input comes back unchanged.
pub fn rewrite(
    code: &str,
    kind: FragmentKind,
    ctx: &RewriteContext,
    symbols: &SymbolTable,
) -> RewriteOutcome {
    let mut rewriter = Rewriter {
        kind,
        ctx,
        symbols,
        libraries: BTreeSet::new(),
        class_refs: BTreeSet::new(),
    };

    let mut current = code.to_string();
    for _ in 0..MAX_ROUNDS {
        let before = current.clone();
        for pass in PASSES {
            current = rewriter.run_to_fixpoint(pass, current);
        }
        if current == before {
            break;
        }
    }

    RewriteOutcome {
        code: current,
        libraries: rewriter.libraries,
        class_refs: rewriter.class_refs,
    }
}

struct Rewriter<'c> {
    kind: FragmentKind,
    ctx: &'c RewriteContext,
    symbols: &'c SymbolTable,
    libraries: BTreeSet<String>,
    class_refs: BTreeSet<String>,
}

impl<'c> Rewriter<'c> {
    fn run_to_fixpoint(&mut self, pass: Pass, mut code: String) -> String {
        for _ in 0..MAX_ROUNDS {
            let Some(edits) = self.collect(pass, &code) else {
                break;
            };
            if edits.is_empty() {
                break;
            }
            let next = apply_edits(&code, edits);
            if next == code || !parses(&next, self.kind) {
                if next != code {
                    log::debug!("{:?} produced unparseable output; keeping previous text", pass);
                }
                break;
            }
            code = next;
        }
        code
    }

    fn collect(&mut self, pass: Pass, code: &str) -> Option<Vec<Edit>> {
        let kind = self.kind;
        let ctx = self.ctx;
        let symbols = self.symbols;
        match pass {
            Pass::SpecialCalls => {
                visit_fragment(code, kind, |_| SpecialCalls::new(code, ctx)).map(|v| v.edits)
            }
            Pass::CallRules => {
                let v = visit_fragment(code, kind, |_| CallRules::new(code, symbols))?;
                self.libraries.extend(v.libraries);
                self.class_refs.extend(v.class_refs);
                Some(v.edits)
            }
            Pass::MemberRules => {
                let v = visit_fragment(code, kind, |_| MemberRules::new())?;
                self.libraries.extend(v.libraries);
                Some(v.edits)
            }
            Pass::Accessors => {
                if ctx.accessors.is_empty() {
                    return Some(Vec::new());
                }
                visit_fragment(code, kind, |_| AccessorCalls::new(code, &ctx.accessors)).map(|v| v.edits)
            }
            Pass::ClassNames => {
                let v = visit_fragment(code, kind, |_| ClassNames::new(symbols))?;
                self.class_refs.extend(v.class_refs);
                Some(v.edits)
            }
            Pass::ComponentRefs => match &ctx.component {
                Some(scope) => {
                    visit_fragment(code, kind, |_| ComponentRefs::new(scope)).map(|v| v.edits)
                }
                None => Some(Vec::new()),
            },
            Pass::MeAlias => match kind {
                FragmentKind::Expression => Some(eliminate_me_alias(code)),
                FragmentKind::Program => Some(Vec::new()),
            },
            Pass::Arrows => {
                visit_fragment(code, kind, |root| Arrows::new(code, root)).map(|v| v.edits)
            }
            Pass::VarToLet => visit_fragment(code, kind, |_| VarToLet::default()).map(|v| v.edits),
            Pass::ReturnShorthand => {
                visit_fragment(code, kind, |_| ReturnShorthand::new(code)).map(|v| v.edits)
            }
            Pass::TemplateLiterals => {
                visit_fragment(code, kind, |_| TemplateLiterals::new(code)).map(|v| v.edits)
            }
        }
    }
}

/// Parse `code` and run the visitor built by `make` over it. `make` receives the
/// span of the root expression for expression fragments.
fn visit_fragment<V, F>(code: &str, kind: FragmentKind, make: F) -> Option<V>
where
    V: for<'a> Visit<'a>,
    F: FnOnce(Option<Span>) -> V,
{
    let allocator = Allocator::default();
    match kind {
        FragmentKind::Expression => {
            let expr = Parser::new(&allocator, code, ast::source_type())
                .parse_expression()
                .ok()?;
            let mut visitor = make(Some(strip_parens(&expr).span()));
            visitor.visit_expression(&expr);
            Some(visitor)
        }
        FragmentKind::Program => {
            let ret = Parser::new(&allocator, code, ast::source_type()).parse();
            if ret.panicked || !ret.errors.is_empty() {
                return None;
            }
            let mut visitor = make(None);
            visitor.visit_program(&ret.program);
            Some(visitor)
        }
    }
}

struct Noop;

impl<'a> Visit<'a> for Noop {}

fn parses(code: &str, kind: FragmentKind) -> bool {
    visit_fragment(code, kind, |_| Noop).is_some()
}

/// `a.b.c` for a static member chain rooted in an identifier or `this`.
pub fn member_path(member: &StaticMemberExpression) -> Option<String> {
    let object = qualified_name(&member.object)?;
    Some(format!("{}.{}", object, member.property.name))
}

fn is_self_reference(expr: &Expression) -> bool {
    match strip_parens(expr) {
        Expression::ThisExpression(_) => true,
        Expression::Identifier(id) => id.name == "me",
        _ => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: initConfig / callParent
// ═══════════════════════════════════════════════════════════════════════════════

enum ParentCall {
    Leave,
    Remove,
    Replace(String),
}

struct SpecialCalls<'s> {
    source: &'s str,
    ctx: &'s RewriteContext,
    edits: Vec<Edit>,
}

impl<'s> SpecialCalls<'s> {
    fn new(source: &'s str, ctx: &'s RewriteContext) -> Self {
        SpecialCalls {
            source,
            ctx,
            edits: Vec::new(),
        }
    }

    fn callee(call: &CallExpression) -> Option<String> {
        let name = qualified_name(&call.callee)?;
        let (object, method) = name.split_once('.')?;
        if object != "this" && object != "me" {
            return None;
        }
        Some(method.to_string())
    }

    fn parent_call(&self, call: &CallExpression) -> ParentCall {
        if self.ctx.component.is_some() {
            return ParentCall::Remove;
        }
        let Some(method) = self.ctx.method.as_deref() else {
            return ParentCall::Leave;
        };
        if !self.ctx.has_parent {
            // a base-less class has no super constructor; other methods keep the call
            return if method == "constructor" {
                ParentCall::Remove
            } else {
                ParentCall::Leave
            };
        }

        let args = match call.arguments.len() {
            0 => String::new(),
            1 => {
                let arg = CallArg::from_argument(&call.arguments[0], self.source);
                if arg.text.trim() == "arguments" {
                    "...arguments".to_string()
                } else {
                    arg.exploded()
                }
            }
            _ => call
                .arguments
                .iter()
                .map(|a| node_text(self.source, a))
                .collect::<Vec<_>>()
                .join(", "),
        };

        if method == "constructor" {
            ParentCall::Replace(format!("super({})", args))
        } else {
            ParentCall::Replace(format!("super.{}({})", method, args))
        }
    }
}

impl<'a, 's> Visit<'a> for SpecialCalls<'s> {
    fn visit_expression_statement(&mut self, stmt: &ExpressionStatement<'a>) {
        if let Expression::CallExpression(call) = strip_parens(&stmt.expression) {
            match Self::callee(call).as_deref() {
                Some("initConfig") => {
                    self.edits.push(Edit::remove(stmt.span));
                    return;
                }
                Some("callParent") => match self.parent_call(call) {
                    ParentCall::Remove => {
                        self.edits.push(Edit::remove(stmt.span));
                        return;
                    }
                    ParentCall::Replace(text) => {
                        self.edits.push(Edit::replace(call.span, text));
                        return;
                    }
                    ParentCall::Leave => {}
                },
                _ => {}
            }
        }
        walk::walk_expression_statement(self, stmt);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if Self::callee(call).as_deref() == Some("callParent") {
            match self.parent_call(call) {
                ParentCall::Remove => {
                    self.edits.push(Edit::replace(call.span, "undefined"));
                    return;
                }
                ParentCall::Replace(text) => {
                    self.edits.push(Edit::replace(call.span, text));
                    return;
                }
                ParentCall::Leave => {}
            }
        }
        walk::walk_call_expression(self, call);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: call rules, Ext.create / Ext.widget
// ═══════════════════════════════════════════════════════════════════════════════

struct CallRules<'s> {
    source: &'s str,
    symbols: &'s SymbolTable,
    edits: Vec<Edit>,
    libraries: BTreeSet<String>,
    class_refs: BTreeSet<String>,
}

impl<'s> CallRules<'s> {
    fn new(source: &'s str, symbols: &'s SymbolTable) -> Self {
        CallRules {
            source,
            symbols,
            edits: Vec::new(),
            libraries: BTreeSet::new(),
            class_refs: BTreeSet::new(),
        }
    }

    /// `Ext.create('Cls', cfg)` / `Ext.widget('xtype', cfg)` → `new Import(cfg)`.
    fn instantiation(&mut self, callee: &str, call: &CallExpression) -> Option<String> {
        let first = call.arguments.first()?.as_expression()?;
        let target = ast::string_value(first)?;
        let import = match callee {
            "Ext.create" => self.symbols.class_import(&target)?,
            "Ext.widget" => self.symbols.alias_import(&format!("widget.{}", target))?,
            _ => return None,
        };
        let rest: Vec<&str> = call
            .arguments
            .iter()
            .skip(1)
            .map(|a| node_text(self.source, a))
            .collect();
        self.class_refs.insert(import.to_string());
        Some(format!("new {}({})", import, rest.join(", ")))
    }
}

impl<'a, 's> Visit<'a> for CallRules<'s> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Some(name) = qualified_name(&call.callee) {
            let callee = canonical_callee(&name);
            if let Some(text) = self.instantiation(callee, call) {
                self.edits.push(Edit::replace(call.span, text));
                return;
            }
            if let Some(rule) = find_call_rule(callee) {
                let args: Vec<CallArg> = call
                    .arguments
                    .iter()
                    .map(|a| CallArg::from_argument(a, self.source))
                    .collect();
                if let Some(text) = rule.apply(&args) {
                    if let Some(library) = rule.library {
                        self.libraries.insert(library.to_string());
                    }
                    self.edits.push(Edit::replace(call.span, text));
                    return;
                }
            }
        }
        walk::walk_call_expression(self, call);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: member rules
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct MemberRules {
    edits: Vec<Edit>,
    libraries: BTreeSet<String>,
}

impl MemberRules {
    fn new() -> Self {
        MemberRules {
            edits: Vec::new(),
            libraries: BTreeSet::new(),
        }
    }
}

impl<'a> Visit<'a> for MemberRules {
    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if let Some(path) = member_path(member) {
            if let Some(rule) = find_member_rule(&path) {
                if let Some(text) = rule.apply(canonical_callee(&path)) {
                    if let Some(library) = rule.library {
                        self.libraries.insert(library.to_string());
                    }
                    self.edits.push(Edit::replace(member.span, text));
                    return;
                }
            }
        }
        walk::walk_static_member_expression(self, member);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: accessor calls
// ═══════════════════════════════════════════════════════════════════════════════

enum AccessorCall {
    Get(String),
    Set(String, String),
}

struct AccessorCalls<'s> {
    source: &'s str,
    accessors: &'s BTreeSet<String>,
    edits: Vec<Edit>,
}

impl<'s> AccessorCalls<'s> {
    fn new(source: &'s str, accessors: &'s BTreeSet<String>) -> Self {
        AccessorCalls {
            source,
            accessors,
            edits: Vec::new(),
        }
    }

    /// `this.getFoo()` / `me.setFoo(v)` for a known accessor `foo`.
    fn classify(&self, call: &CallExpression) -> Option<AccessorCall> {
        let Expression::StaticMemberExpression(member) = &call.callee else {
            return None;
        };
        if !is_self_reference(&member.object) {
            return None;
        }
        let method = member.property.name.as_str();
        if method.len() <= 3 {
            return None;
        }
        let (prefix, rest) = method.split_at(3);
        let config = crate::naming::lower_first(rest);
        if !self.accessors.contains(&config) {
            return None;
        }
        let target = format!("{}.{}", node_text(self.source, &member.object), config);
        match (prefix, call.arguments.len()) {
            ("get", 0) => Some(AccessorCall::Get(target)),
            ("set", 1) => {
                let value = call.arguments[0].as_expression()?;
                Some(AccessorCall::Set(target, node_text(self.source, value).to_string()))
            }
            _ => None,
        }
    }
}

impl<'a, 's> Visit<'a> for AccessorCalls<'s> {
    fn visit_expression_statement(&mut self, stmt: &ExpressionStatement<'a>) {
        if let Expression::CallExpression(call) = &stmt.expression {
            if let Some(AccessorCall::Set(target, value)) = self.classify(call) {
                self.edits
                    .push(Edit::replace(call.span, format!("{} = {}", target, value)));
                return;
            }
        }
        walk::walk_expression_statement(self, stmt);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        match self.classify(call) {
            Some(AccessorCall::Get(target)) => self.edits.push(Edit::replace(call.span, target)),
            Some(AccessorCall::Set(target, value)) => self
                .edits
                .push(Edit::replace(call.span, format!("({} = {})", target, value))),
            None => walk::walk_call_expression(self, call),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: class names
// ═══════════════════════════════════════════════════════════════════════════════

struct ClassNames<'s> {
    symbols: &'s SymbolTable,
    edits: Vec<Edit>,
    class_refs: BTreeSet<String>,
}

impl<'s> ClassNames<'s> {
    fn new(symbols: &'s SymbolTable) -> Self {
        ClassNames {
            symbols,
            edits: Vec::new(),
            class_refs: BTreeSet::new(),
        }
    }
}

impl<'a, 's> Visit<'a> for ClassNames<'s> {
    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if let Some(path) = member_path(member) {
            if let Some(import) = self.symbols.class_import(&path) {
                self.class_refs.insert(import.to_string());
                self.edits.push(Edit::replace(member.span, import));
                return;
            }
        }
        walk::walk_static_member_expression(self, member);
    }
}

/// Canonical names of the classes a fragment refers to through dotted paths,
/// `Ext.create` or `Ext.widget`. Paths a rewrite rule will replace are skipped.
pub fn collect_class_references(code: &str, kind: FragmentKind, registry: &Registry) -> BTreeSet<String> {
    visit_fragment(code, kind, |_| ReferenceCollector {
        registry,
        found: BTreeSet::new(),
    })
    .map(|c| c.found)
    .unwrap_or_default()
}

struct ReferenceCollector<'r> {
    registry: &'r Registry,
    found: BTreeSet<String>,
}

impl<'a, 'r> Visit<'a> for ReferenceCollector<'r> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Some(name) = qualified_name(&call.callee) {
            let callee = canonical_callee(&name);
            let target = call
                .arguments
                .first()
                .and_then(|a| a.as_expression())
                .and_then(ast::string_value);
            match (callee, target) {
                ("Ext.create", Some(target)) => {
                    if let Some(cls) = self.registry.resolve_class(&target) {
                        self.found.insert(cls.name.clone());
                    }
                }
                ("Ext.widget", Some(target)) => {
                    if let Some(cls) = self.registry.resolve_alias(&format!("widget.{}", target)) {
                        self.found.insert(cls.to_string());
                    }
                }
                _ => {}
            }
            if find_call_rule(callee).is_some() {
                for arg in call.arguments.iter() {
                    self.visit_argument(arg);
                }
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if let Some(path) = member_path(member) {
            if find_member_rule(&path).is_some() {
                return;
            }
            if let Some(cls) = self.registry.resolve_class(&path) {
                self.found.insert(cls.name.clone());
                return;
            }
        }
        walk::walk_static_member_expression(self, member);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: component member references
// ═══════════════════════════════════════════════════════════════════════════════

struct ComponentRefs<'s> {
    scope: &'s ComponentScope,
    edits: Vec<Edit>,
}

impl<'s> ComponentRefs<'s> {
    fn new(scope: &'s ComponentScope) -> Self {
        ComponentRefs {
            scope,
            edits: Vec::new(),
        }
    }
}

impl<'a, 's> Visit<'a> for ComponentRefs<'s> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::StaticMemberExpression(member) = &call.callee {
            if is_self_reference(&member.object)
                && member.property.name == "getView"
                && call.arguments.is_empty()
            {
                self.edits.push(Edit::replace(call.span, "this"));
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if is_self_reference(&member.object) {
            let name = member.property.name.as_str();
            let replacement = if name == "view" {
                Some("this".to_string())
            } else if self.scope.members.contains(name) {
                Some(name.to_string())
            } else if self.scope.configs.contains(name) {
                Some(format!("props.{}", name))
            } else {
                None
            };
            if let Some(text) = replacement {
                self.edits.push(Edit::replace(member.span, text));
                return;
            }
        }
        walk::walk_static_member_expression(self, member);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: `var me = this`
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct MeUsage {
    depth: usize,
    nested: bool,
    references: Vec<Span>,
}

impl<'a> Visit<'a> for MeUsage {
    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        self.depth += 1;
        walk::walk_function(self, func, flags);
        self.depth -= 1;
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if ident.name == "me" {
            if self.depth > 0 {
                self.nested = true;
            } else {
                self.references.push(ident.span);
            }
        }
    }
}

/// Drop `var me = this` from the member's own body and use `this` directly,
/// unless a nested non-arrow function still needs the alias.
fn eliminate_me_alias(code: &str) -> Vec<Edit> {
    ast::with_expression(code, |expr| {
        let body = match strip_parens(expr) {
            Expression::FunctionExpression(func) => func.body.as_ref()?,
            Expression::ArrowFunctionExpression(arrow) if !arrow.expression => &arrow.body,
            _ => return None,
        };

        let declaration = body.statements.iter().find_map(|stmt| match stmt {
            Statement::VariableDeclaration(decl) => decl
                .declarations
                .iter()
                .position(|d| declares_me_alias(d))
                .map(|index| (&**decl, index)),
            _ => None,
        })?;

        let mut usage = MeUsage::default();
        usage.visit_function_body(body);
        if usage.nested {
            return None;
        }

        let (decl, index) = declaration;
        let mut edits = Vec::new();
        if decl.declarations.len() == 1 {
            edits.push(Edit::remove(decl.span));
        } else {
            let keyword = slice(code, decl.span)
                .split_whitespace()
                .next()
                .unwrap_or("var");
            let rest: Vec<&str> = decl
                .declarations
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, d)| node_text(code, d))
                .collect();
            let semicolon = if slice(code, decl.span).ends_with(';') { ";" } else { "" };
            edits.push(Edit::replace(
                decl.span,
                format!("{} {}{}", keyword, rest.join(", "), semicolon),
            ));
        }
        for span in usage.references {
            if span.start >= decl.span.start && span.end <= decl.span.end {
                continue;
            }
            edits.push(Edit::replace(span, "this"));
        }
        Some(edits)
    })
    .flatten()
    .unwrap_or_default()
}

fn declares_me_alias(decl: &VariableDeclarator) -> bool {
    let BindingPattern::BindingIdentifier(id) = &decl.id else {
        return false;
    };
    id.name == "me"
        && matches!(
            decl.init.as_ref().map(strip_parens),
            Some(Expression::ThisExpression(_))
        )
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: function expressions → arrows
// ═══════════════════════════════════════════════════════════════════════════════

struct Arrows<'s> {
    source: &'s str,
    root: Option<Span>,
    edits: Vec<Edit>,
}

impl<'s> Arrows<'s> {
    fn new(source: &'s str, root: Option<Span>) -> Self {
        Arrows {
            source,
            root,
            edits: Vec::new(),
        }
    }
}

/// Finds what an arrow would bind differently: `this`, `arguments`, `super`,
/// `new.target` or the function's own name.
struct OwnContext {
    name: Option<String>,
    found: bool,
}

impl<'a> Visit<'a> for OwnContext {
    fn visit_this_expression(&mut self, _it: &ThisExpression) {
        self.found = true;
    }

    fn visit_super(&mut self, _it: &Super) {
        self.found = true;
    }

    fn visit_meta_property(&mut self, _it: &MetaProperty<'a>) {
        self.found = true;
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if ident.name == "arguments" || Some(ident.name.as_str()) == self.name.as_deref() {
            self.found = true;
        }
    }
}

impl<'a, 's> Visit<'a> for Arrows<'s> {
    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        let convertible = func.r#type == FunctionType::FunctionExpression
            && !func.generator
            && Some(func.span) != self.root
            && {
                let text = slice(self.source, func.span);
                text.starts_with("function") || text.starts_with("async")
            };

        if convertible {
            let mut context = OwnContext {
                name: func.id.as_ref().map(|id| id.name.to_string()),
                found: false,
            };
            context.visit_function(func, flags);
            if let (false, Some(body)) = (context.found, func.body.as_ref()) {
                let params = params_text(self.source, func.span.start, body.span.start);
                let prefix = if func.r#async { "async " } else { "" };
                self.edits.push(Edit::replace(
                    func.span,
                    format!("{}{} => {}", prefix, params, slice(self.source, body.span)),
                ));
                return;
            }
        }
        walk::walk_function(self, func, flags);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: var → let
// ═══════════════════════════════════════════════════════════════════════════════

/// Declaration counts within one function scope, nested functions excluded.
#[derive(Default)]
struct ScopeNames {
    counts: HashMap<String, usize>,
    complex: bool,
}

impl ScopeNames {
    fn bump(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }
}

impl<'a> Visit<'a> for ScopeNames {
    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
        if decl.kind == VariableDeclarationKind::Var {
            for d in decl.declarations.iter() {
                match &d.id {
                    BindingPattern::BindingIdentifier(id) => self.bump(&id.name),
                    _ => self.complex = true,
                }
            }
        }
        walk::walk_variable_declaration(self, decl);
    }

    fn visit_function(&mut self, func: &Function<'a>, _flags: ScopeFlags) {
        if let Some(id) = &func.id {
            self.bump(&id.name);
        }
    }

    fn visit_arrow_function_expression(&mut self, _arrow: &ArrowFunctionExpression<'a>) {}
}

struct ParamNames(Vec<String>);

impl<'a> Visit<'a> for ParamNames {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.0.push(ident.name.to_string());
    }
}

#[derive(Default)]
struct VarToLet {
    edits: Vec<Edit>,
}

impl VarToLet {

    fn convert_body<'a>(&mut self, params: &FormalParameters<'a>, body: &FunctionBody<'a>) {
        let mut names = ScopeNames::default();
        for stmt in body.statements.iter() {
            names.visit_statement(stmt);
        }
        let mut param_names = ParamNames(Vec::new());
        param_names.visit_formal_parameters(params);
        for name in &param_names.0 {
            names.bump(name);
        }

        for stmt in body.statements.iter() {
            let Statement::VariableDeclaration(decl) = stmt else {
                continue;
            };
            if decl.kind != VariableDeclarationKind::Var {
                continue;
            }
            let unique = decl.declarations.iter().all(|d| match &d.id {
                BindingPattern::BindingIdentifier(id) => names.count(&id.name) == 1,
                _ => false,
            });
            if unique {
                self.edits.push(Edit::replace(
                    Span::new(decl.span.start, decl.span.start + 3),
                    "let",
                ));
            }
        }
    }
}

impl<'a> Visit<'a> for VarToLet {
    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        if let Some(body) = &func.body {
            self.convert_body(&func.params, body);
        }
        walk::walk_function(self, func, flags);
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        if !arrow.expression {
            self.convert_body(&arrow.params, &arrow.body);
        }
        walk::walk_arrow_function_expression(self, arrow);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: arrow return shorthand
// ═══════════════════════════════════════════════════════════════════════════════

struct ReturnShorthand<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'s> ReturnShorthand<'s> {
    fn new(source: &'s str) -> Self {
        ReturnShorthand {
            source,
            edits: Vec::new(),
        }
    }
}

impl<'a, 's> Visit<'a> for ReturnShorthand<'s> {
    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        if !arrow.expression && arrow.body.directives.is_empty() && arrow.body.statements.len() == 1 {
            if let Some(Statement::ReturnStatement(ret)) = arrow.body.statements.first() {
                if let Some(argument) = &ret.argument {
                    // nothing but the return statement between the braces
                    let body = slice(self.source, arrow.body.span);
                    let inner = body
                        .strip_prefix('{')
                        .and_then(|b| b.strip_suffix('}'))
                        .map(str::trim);
                    if inner == Some(slice(self.source, ret.span).trim()) {
                        let text = node_text(self.source, argument);
                        let text = match argument {
                            Expression::ObjectExpression(_) | Expression::SequenceExpression(_) => {
                                format!("({})", text)
                            }
                            _ => text.to_string(),
                        };
                        self.edits.push(Edit::replace(arrow.body.span, text));
                        return;
                    }
                }
            }
        }
        walk::walk_arrow_function_expression(self, arrow);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PASS: string concatenation → template literal
// ═══════════════════════════════════════════════════════════════════════════════

struct TemplateLiterals<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'s> TemplateLiterals<'s> {
    fn new(source: &'s str) -> Self {
        TemplateLiterals {
            source,
            edits: Vec::new(),
        }
    }
}

fn concat_leaves<'b, 'a>(expr: &'b Expression<'a>, leaves: &mut Vec<&'b Expression<'a>>) {
    match expr {
        Expression::BinaryExpression(bin) if bin.operator == BinaryOperator::Addition => {
            concat_leaves(&bin.left, leaves);
            leaves.push(&bin.right);
        }
        _ => leaves.push(expr),
    }
}

/// Quoted-string body as template text: escapes kept, backticks and `${` escaped.
fn template_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

impl<'a, 's> Visit<'a> for TemplateLiterals<'s> {
    fn visit_binary_expression(&mut self, bin: &BinaryExpression<'a>) {
        if bin.operator == BinaryOperator::Addition {
            let mut leaves = Vec::new();
            concat_leaves(&bin.left, &mut leaves);
            leaves.push(&bin.right);

            let is_string = |e: &Expression| matches!(e, Expression::StringLiteral(_));
            if is_string(leaves[0]) || leaves.get(1).map(|e| is_string(e)).unwrap_or(false) {
                let mut template = String::from("`");
                for leaf in &leaves {
                    let text = node_text(self.source, *leaf);
                    match leaf {
                        Expression::StringLiteral(_) => {
                            template.push_str(&template_text(&text[1..text.len() - 1]))
                        }
                        Expression::TemplateLiteral(_) => template.push_str(&text[1..text.len() - 1]),
                        _ => {
                            template.push_str("${");
                            template.push_str(text);
                            template.push('}');
                        }
                    }
                }
                template.push('`');
                self.edits.push(Edit::replace(bin.span, template));
                return;
            }
        }
        walk::walk_binary_expression(self, bin);
    }
}

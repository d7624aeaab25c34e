//! Class emission
//!
//! Turns one resolved [`ClassModel`] into source text. Classes that descend from
//! `Ext.Widget` become function components rendering their parent component;
//! everything else becomes a plain ES class. Members are rewritten one fragment
//! at a time and the declaration is assembled from the rewritten pieces.

use std::collections::BTreeSet;

use crate::accessor::{indent, synthesize_accessor, AccessorDescriptor};
use crate::ast;
use crate::capability::CapabilityTable;
use crate::diagnostics::Diagnostics;
use crate::element::{listener_props, ElementCompiler, RawProp};
use crate::error::CompileError;
use crate::model::{ClassModel, ConfigEntry, Member, Resolution};
use crate::registry::Registry;
use crate::rewrite::{rewrite, ComponentScope, FragmentKind, RewriteContext, SymbolTable};

pub const LIB_REACT: &str = "React";
pub const LIB_USE_MEMO: &str = "useMemo";
pub const LIB_USE_EFFECT: &str = "useEffect";

/// Class body members a function component consumes structurally.
const COMPONENT_SKIPPED: [&str; 2] = ["controller", "items"];

/// Members rendered as listener props on the root element.
const LISTENER_MEMBERS: [&str; 2] = ["listeners", "handler"];

/// Everything emission reads. Shared across units; never mutated.
pub struct EmitContext<'c> {
    pub registry: &'c Registry,
    pub symbols: &'c SymbolTable,
    pub capabilities: &'c CapabilityTable,
    pub unit: &'c str,
}

impl<'c> EmitContext<'c> {
    /// Local binding for a class: the unit's symbol table first, then the class's
    /// export name, then the last segment of its name.
    pub fn class_local(&self, name: &str) -> String {
        if let Some(local) = self.symbols.class_import(name) {
            return local.to_string();
        }
        match self.registry.resolve_class(name).and_then(|c| c.resolution.as_ref()) {
            Some(resolution) => resolution.export_name.clone(),
            None => name.rsplit('.').next().unwrap_or(name).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassOutput {
    pub class_name: String,
    /// Declared binding; `None` for overrides reproduced verbatim.
    pub local_name: Option<String>,
    pub code: String,
    /// Statements that must follow every declaration of the unit (mixin copies).
    pub trailer: Vec<String>,
    pub singleton: bool,
    pub libraries: BTreeSet<String>,
    pub class_refs: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}

/// Emit one class. Overrides come back verbatim; everything else needs a
/// finalized registry.
pub fn emit_class(cls: &ClassModel, cx: &EmitContext) -> Result<ClassOutput, CompileError> {
    if cls.is_override() {
        return Ok(ClassOutput {
            class_name: cls.name.clone(),
            code: cls.source.clone(),
            ..Default::default()
        });
    }

    let resolution = cls.resolved()?;
    let (merged, local_configs) = merge_assimilated(cls, resolution, cx.registry)?;
    let local_name = cx
        .symbols
        .class_import(&cls.name)
        .map(str::to_string)
        .unwrap_or_else(|| resolution.export_name.clone());

    let mut emitter = Emitter {
        cx,
        resolution,
        output: ClassOutput {
            class_name: cls.name.clone(),
            local_name: Some(local_name.clone()),
            singleton: resolution.singleton,
            ..Default::default()
        },
    };

    emitter.output.code = if resolution.is_component {
        log::debug!("{}: emitting {} as a function component", cx.unit, cls.name);
        emitter.function_component(&merged, &local_configs, &local_name)
    } else {
        log::debug!("{}: emitting {} as a class", cx.unit, cls.name);
        emitter.plain_class(&merged, &local_configs, &local_name)
    };
    Ok(emitter.output)
}

/// The owner's members followed by those of every class it assimilates. The
/// owner's names win.
fn merge_assimilated(
    cls: &ClassModel,
    resolution: &Resolution,
    registry: &Registry,
) -> Result<(ClassModel, Vec<ConfigEntry>), CompileError> {
    let mut merged = cls.clone();
    let mut local_configs = resolution.local_configs.clone();

    for name in &resolution.assimilates {
        let Some(companion) = registry.resolve_class(name) else {
            continue;
        };
        let companion_resolution = companion.resolved()?;
        log::debug!("merging {} into {}", companion.name, cls.name);

        append_missing(&mut merged.methods, &companion.methods);
        append_missing(&mut merged.properties, &companion.properties);
        append_missing(&mut merged.static_members, &companion.static_members);
        for entry in &companion_resolution.local_configs {
            if !resolution.is_inherited_config(&entry.name)
                && !local_configs.iter().any(|c| c.name == entry.name)
            {
                merged.configs.push(entry.clone());
                local_configs.push(entry.clone());
            }
        }
    }
    local_configs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((merged, local_configs))
}

fn append_missing(into: &mut Vec<Member>, from: &[Member]) {
    for member in from {
        if !into.iter().any(|m| m.name == member.name) {
            into.push(member.clone());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

struct Emitter<'e, 'c> {
    cx: &'e EmitContext<'c>,
    resolution: &'e Resolution,
    output: ClassOutput,
}

impl<'e, 'c> Emitter<'e, 'c> {
    fn rewrite(&mut self, code: &str, ctx: &RewriteContext) -> String {
        let outcome = rewrite(code, FragmentKind::Expression, ctx, self.cx.symbols);
        self.output.libraries.extend(outcome.libraries);
        self.output.class_refs.extend(outcome.class_refs);
        dedent(&outcome.code)
    }

    fn accessor_names(&self) -> BTreeSet<String> {
        self.resolution.storage_names.keys().cloned().collect()
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Plain classes
    // ───────────────────────────────────────────────────────────────────────────

    fn plain_class(&mut self, cls: &ClassModel, local_configs: &[ConfigEntry], name: &str) -> String {
        let parent = self.resolution.parent.clone().map(|p| self.cx.class_local(&p));
        if let Some(parent) = &parent {
            self.output.class_refs.insert(parent.clone());
        }

        let base = RewriteContext {
            method: None,
            has_parent: parent.is_some(),
            accessors: self.accessor_names(),
            component: None,
        };
        let in_method = |method: &str| RewriteContext {
            method: Some(method.to_string()),
            ..base.clone()
        };

        let accessors: Vec<AccessorDescriptor> = local_configs
            .iter()
            .map(|entry| {
                let mut accessor = synthesize_accessor(entry, cls);
                // hooks run through `.call(this)`, so `super` is out of reach there
                accessor.apply = accessor.apply.map(|code| self.rewrite(&code, &base));
                accessor.update = accessor.update.map(|code| self.rewrite(&code, &base));
                accessor
            })
            .collect();
        let hooks: BTreeSet<String> = accessors.iter().flat_map(|a| a.hook_methods()).collect();

        let mut static_props = Vec::new();
        let mut static_methods = Vec::new();
        for member in &cls.static_members {
            if member.is_method() {
                let code = self.rewrite(&member.value, &in_method(&member.name));
                static_methods.push(method_code(&member.name, &code, true));
            } else {
                let code = self.rewrite(&member.value, &base);
                static_props.push(format!("static {} = {}", class_key(&member.name), code));
            }
        }

        let mut properties = Vec::new();
        for member in &cls.properties {
            if member.name == "controller" && !self.resolution.assimilates.is_empty() {
                continue;
            }
            self.output.diagnostics.log_property(&member.name);
            let code = self.rewrite(&member.value, &base);
            let field = self.storage_field(&member.name);
            properties.push(format!("{} = {}", class_key(&field), code));
        }

        let mut config_fields = Vec::new();
        for entry in &cls.configs {
            if self.resolution.is_inherited_config(&entry.name) {
                let code = self.rewrite(entry.default_value.trim(), &base);
                config_fields.push(format!("{} = {}", class_key(&self.storage_field(&entry.name)), code));
            }
        }
        let mut fields: Vec<&AccessorDescriptor> = accessors.iter().collect();
        fields.sort_by_key(|a| a.internal_name.starts_with('_'));
        for accessor in fields {
            let code = self.rewrite(&accessor.default_value, &base);
            config_fields.push(format!("{} = {}", class_key(&accessor.internal_name), code));
        }
        let accessor_methods: Vec<String> = accessors.iter().filter_map(|a| a.methods()).collect();

        let mut methods = Vec::new();
        for member in &cls.methods {
            if hooks.contains(&member.name) {
                continue;
            }
            let code = self.rewrite(&member.value, &in_method(&member.name));
            methods.push(method_code(&member.name, &code, false));
        }

        let mut sections: Vec<String> = Vec::new();
        for group in [&static_props, &properties, &config_fields] {
            if !group.is_empty() {
                sections.push(group.join("\n"));
            }
        }
        for group in [&accessor_methods, &static_methods, &methods] {
            if !group.is_empty() {
                sections.push(group.join("\n\n"));
            }
        }

        if !self.resolution.mixins.is_empty() {
            for mixin in self.resolution.mixins.clone() {
                let mixin_local = self.cx.class_local(&mixin);
                self.output.class_refs.insert(mixin_local.clone());
                self.output.trailer.push(format!(
                    "Object.assign({}.prototype, {}.prototype)",
                    name, mixin_local
                ));
            }
        }

        let head = match &parent {
            Some(parent) => format!("class {} extends {}", name, parent),
            None => format!("class {}", name),
        };
        if sections.is_empty() {
            format!("{}{{}}", head)
        } else {
            format!("{}{{\n{}\n}}", head, indent(&sections.join("\n\n")))
        }
    }

    /// Field that holds a config's value, or the name itself for non-configs.
    fn storage_field(&self, name: &str) -> String {
        self.resolution
            .storage_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Function components
    // ───────────────────────────────────────────────────────────────────────────

    fn is_root_prop(&self, name: &str) -> bool {
        LISTENER_MEMBERS.contains(&name)
            || self.resolution.is_inherited_config(name)
            || self
                .cx
                .capabilities
                .chain("component")
                .iter()
                .any(|c| c.transform(name).is_some())
    }

    fn function_component(&mut self, cls: &ClassModel, local_configs: &[ConfigEntry], name: &str) -> String {
        self.output.libraries.insert(LIB_REACT.to_string());

        let applied: Vec<&ConfigEntry> = local_configs
            .iter()
            .filter(|e| cls.method(&crate::accessor::apply_hook_name(&e.name)).is_some())
            .collect();
        let updated: Vec<&ConfigEntry> = local_configs
            .iter()
            .filter(|e| cls.method(&crate::accessor::update_hook_name(&e.name)).is_some())
            .collect();
        let hooks: BTreeSet<String> = applied
            .iter()
            .map(|e| crate::accessor::apply_hook_name(&e.name))
            .chain(updated.iter().map(|e| crate::accessor::update_hook_name(&e.name)))
            .collect();

        let lets: Vec<&Member> = cls
            .properties
            .iter()
            .filter(|m| !COMPONENT_SKIPPED.contains(&m.name.as_str()) && !self.is_root_prop(&m.name))
            .collect();

        let mut scope = ComponentScope::default();
        scope.members.extend(
            cls.methods
                .iter()
                .filter(|m| !hooks.contains(&m.name) && m.name != "initialize")
                .map(|m| component_method_name(&m.name).to_string()),
        );
        scope.members.extend(lets.iter().filter(|m| ast::is_identifier(&m.name)).map(|m| m.name.clone()));
        scope.configs.extend(self.resolution.storage_names.keys().cloned());
        scope.configs.extend(self.resolution.inherited_configs.iter().cloned());
        scope.configs.extend(local_configs.iter().map(|e| e.name.clone()));

        let base = RewriteContext {
            method: None,
            has_parent: false,
            accessors: self.accessor_names(),
            component: Some(scope),
        };
        let in_method = |method: &str| RewriteContext {
            method: Some(method.to_string()),
            ..base.clone()
        };

        let mut sections: Vec<String> = Vec::new();

        if !local_configs.is_empty() {
            let mut entries: Vec<String> = Vec::new();
            for entry in local_configs {
                let code = self.rewrite(entry.default_value.trim(), &base);
                entries.push(format!("{}: {}", object_key(&entry.name), code));
            }
            entries.push("...props".to_string());
            sections.push(format!("props = {{\n{}\n}}", indent(&entries.join(",\n"))));
        }

        let mut declarations = Vec::new();
        for member in &lets {
            self.output.diagnostics.log_property(&member.name);
            let code = self.rewrite(&member.value, &base);
            let declaration = format!("let {} = {}", member.name, code);
            if ast::is_identifier(&member.name) {
                declarations.push(declaration);
            } else {
                declarations.push(format!("/* {} */", declaration.replace("*/", "*//*")));
            }
        }
        if !declarations.is_empty() {
            sections.push(declarations.join("\n"));
        }

        let mut effects = Vec::new();
        for entry in &applied {
            let hook = crate::accessor::apply_hook_name(&entry.name);
            if let Some(member) = cls.method(&hook) {
                let code = self.rewrite(&member.value, &in_method(&hook));
                self.output.libraries.insert(LIB_USE_MEMO.to_string());
                effects.push(format!(
                    "props.{name} = useMemo({fn}, [props.{name}])",
                    name = entry.name,
                    fn = arrow_of(&code)
                ));
            }
        }
        for entry in &updated {
            let hook = crate::accessor::update_hook_name(&entry.name);
            if let Some(member) = cls.method(&hook) {
                let code = self.rewrite(&member.value, &in_method(&hook));
                self.output.libraries.insert(LIB_USE_EFFECT.to_string());
                effects.push(format!(
                    "useEffect({}, [props.{}])",
                    arrow_of(&code),
                    entry.name
                ));
            }
        }

        let mut functions = Vec::new();
        for member in &cls.methods {
            if hooks.contains(&member.name) {
                continue;
            }
            let code = self.rewrite(&member.value, &in_method(&member.name));
            if member.name == "initialize" {
                self.output.libraries.insert(LIB_USE_EFFECT.to_string());
                effects.push(format!("useEffect({}, [])", arrow_of(&code)));
                continue;
            }
            functions.push(local_function(component_method_name(&member.name), &code));
        }
        if !effects.is_empty() {
            sections.push(effects.join("\n\n"));
        }
        if !functions.is_empty() {
            sections.push(functions.join("\n\n"));
        }

        sections.push(self.render(cls, &base));

        let mut code = format!("function {}(props){{\n{}\n}}", name, indent(&sections.join("\n\n")));

        let mut statics = Vec::new();
        for member in &cls.static_members {
            let ctx = if member.is_method() { in_method(&member.name) } else { base.clone() };
            let value = self.rewrite(&member.value, &ctx);
            statics.push(format!("{}.{} = {}", name, member.name, value));
        }
        if !statics.is_empty() {
            code.push_str("\n\n");
            code.push_str(&statics.join("\n"));
        }
        code
    }

    /// Extracted bindings followed by `return (<Parent … {...props}>items</Parent>)`.
    fn render(&mut self, cls: &ClassModel, ctx: &RewriteContext) -> String {
        let cx = self.cx;
        let tag = match self.resolution.parent.clone() {
            Some(parent) => {
                let local = cx.class_local(&parent);
                self.output.class_refs.insert(local.clone());
                local
            }
            None => cx
                .capabilities
                .output_tag("component")
                .unwrap_or("div")
                .to_string(),
        };

        let mut compiler = ElementCompiler::new(cx.capabilities, cx.registry, cx.symbols, cx.unit);

        let mut props: Vec<RawProp> = Vec::new();
        for entry in &cls.configs {
            if self.resolution.is_inherited_config(&entry.name) {
                props.push(RawProp::code(&entry.name, entry.default_value.trim()));
            }
        }
        for member in &cls.properties {
            if COMPONENT_SKIPPED.contains(&member.name.as_str()) || !self.is_root_prop(&member.name) {
                continue;
            }
            if LISTENER_MEMBERS.contains(&member.name.as_str()) {
                let naming = compiler.naming();
                let listeners = ast::with_expression(&member.value, |expr| {
                    listener_props(&member.name, expr, &member.value, naming)
                });
                props.extend(listeners.unwrap_or_default());
            } else {
                props.push(RawProp::code(&member.name, &member.value));
            }
        }

        let children = match cls.property("items") {
            Some(items) => compiler.compile_items(&ElementCompiler::items_of(&items.value)),
            None => Vec::new(),
        };
        let root = compiler.root(&tag, props, children);
        let jsx = root.render();

        let compiled = compiler.finish();
        self.output.libraries.extend(compiled.libraries);
        self.output.class_refs.extend(compiled.class_refs);
        self.output.diagnostics.merge(compiled.diagnostics);

        let mut lines: Vec<String> = compiled
            .bindings
            .iter()
            .map(|binding| format!("const {} = {}", binding.name, self.rewrite(&binding.code, ctx)))
            .collect();
        lines.push(format!("return (\n{}\n)", indent(&self.rewrite(&jsx, ctx))));
        lines.join("\n\n")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBER SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

/// `constructor` has no meaning inside a function body.
fn component_method_name(name: &str) -> &str {
    if name == "constructor" {
        "construct"
    } else {
        name
    }
}

fn class_key(name: &str) -> String {
    if ast::is_identifier(name) {
        name.to_string()
    } else {
        ast::quote(name)
    }
}

fn object_key(name: &str) -> String {
    class_key(name)
}

/// `name(params){…}` for function values, a field holding the value otherwise.
fn method_code(name: &str, code: &str, is_static: bool) -> String {
    let prefix = if is_static { "static " } else { "" };
    match ast::function_parts(code) {
        Some(parts) if !parts.is_arrow => format!(
            "{}{}{}{}{}{}",
            prefix,
            if parts.is_async { "async " } else { "" },
            if parts.is_generator { "*" } else { "" },
            class_key(name),
            parts.params,
            parts.body
        ),
        _ => format!("{}{} = {}", prefix, class_key(name), code),
    }
}

fn arrow_of(code: &str) -> String {
    match ast::function_parts(code) {
        Some(parts) if !parts.is_generator => parts.as_arrow(),
        _ => code.to_string(),
    }
}

/// `const name = (…) => {…}`; generators keep their function form.
fn local_function(name: &str, code: &str) -> String {
    match ast::function_parts(code) {
        Some(parts) if parts.is_generator => format!(
            "{}function* {}{}{}",
            if parts.is_async { "async " } else { "" },
            name,
            parts.params,
            parts.body
        ),
        Some(parts) => format!("const {} = {}", name, parts.as_arrow()),
        None => format!("const {} = {}", name, code),
    }
}

/// Strip the indentation the fragment had in its original position. The first
/// line starts at the fragment itself, so only continuation lines count.
pub fn dedent(code: &str) -> String {
    let mut lines = code.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);

    let mut out = vec![first.trim_end().to_string()];
    for line in rest {
        if line.trim().is_empty() {
            out.push(String::new());
        } else {
            out.push(line[common..].trim_end().to_string());
        }
    }
    out.join("\n")
}

/// Leading spaces and tabs, in bytes. Other whitespace counts as content.
fn indent_width(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ParsedUnit;
    use crate::naming::NamingContext;
    use std::sync::Arc;

    fn unit(path: &str, source: &str) -> ParsedUnit {
        ParsedUnit::parse(path, source, &["Ext.define".to_string()])
    }

    fn framework() -> Arc<Registry> {
        let mut registry = Registry::new(NamingContext::default());
        registry
            .register(&unit(
                "ext.js",
                "Ext.define('Ext.Widget', { config: { cls: null, hidden: false } });\
                 Ext.define('Ext.Panel', { extend: 'Ext.Widget', xtype: 'panel', config: { title: null } });",
            ))
            .unwrap();
        registry.finalize().unwrap();
        Arc::new(registry)
    }

    fn project(units: &[ParsedUnit]) -> Registry {
        let mut registry = Registry::new(NamingContext::default()).with_parent(framework());
        for u in units {
            registry.register(u).unwrap();
        }
        registry.finalize().unwrap();
        registry
    }

    fn emit(registry: &Registry, name: &str) -> ClassOutput {
        let table = CapabilityTable::default();
        let symbols = SymbolTable::new();
        let cls = registry.resolve_class(name).unwrap();
        let cx = EmitContext {
            registry,
            symbols: &symbols,
            capabilities: &table,
            unit: &cls.unit,
        };
        emit_class(cls, &cx).unwrap()
    }

    #[test]
    fn test_plain_config_becomes_field() {
        let registry = project(&[unit(
            "foo.js",
            "Ext.define('App.Bar', {}); Ext.define('App.Foo', { extend: 'App.Bar', config: { title: 'x' } });",
        )]);
        let output = emit(&registry, "App.Foo");
        assert_eq!(output.code, "class Foo extends Bar{\n  title = 'x'\n}");
        assert!(!output.code.contains("get title"));
        assert!(output.class_refs.contains("Bar"));
    }

    #[test]
    fn test_hooks_fold_into_accessor() {
        let registry = project(&[unit(
            "counter.js",
            "Ext.define('App.Counter', {
                config: { count: 0 },
                applyCount: function(value) {
                    return Math.max(value, 0);
                },
                reset: function() {
                    this.setCount(0);
                }
            });",
        )]);
        let output = emit(&registry, "App.Counter");
        assert!(output.code.contains("_count = 0"));
        assert!(output.code.contains("get count(){"));
        assert!(output.code.contains("set count(value){"));
        assert!(!output.code.contains("applyCount("));
        assert!(output.code.contains("reset(){\n      this.count = 0;\n  }"));
    }

    #[test]
    fn test_call_parent_and_statics() {
        let registry = project(&[unit(
            "store.js",
            "Ext.define('App.Base', { load: function() {} });
            Ext.define('App.Store', {
                extend: 'App.Base',
                statics: { create: function() { return 1; }, LIMIT: 10 },
                pageSize: 25,
                load: function(options) {
                    this.callParent([options]);
                }
            });",
        )]);
        let output = emit(&registry, "App.Store");
        assert!(output.code.contains("static LIMIT = 10"));
        assert!(output.code.contains("static create(){ return 1; }"));
        assert!(output.code.contains("pageSize = 25"));
        assert!(output.code.contains("super.load(options)"));
    }

    #[test]
    fn test_mixins_become_trailer() {
        let registry = project(&[unit(
            "m.js",
            "Ext.define('App.Mixin', {}); Ext.define('App.Thing', { mixins: ['App.Mixin'] });",
        )]);
        let output = emit(&registry, "App.Thing");
        assert_eq!(
            output.trailer,
            vec!["Object.assign(Thing.prototype, Mixin.prototype)".to_string()]
        );
    }

    #[test]
    fn test_component_renders_parent_with_items() {
        let registry = project(&[unit(
            "app/view/Main.js",
            "Ext.define('App.view.Main', {
                extend: 'Ext.Panel',
                xtype: 'main',
                title: 'Home',
                config: { count: 1 },
                items: [{ xtype: 'button', text: 'Go', handler: 'onGo' }],
                onGo: function() {
                    this.setCount(this.getCount() + 1);
                }
            });",
        )]);
        let output = emit(&registry, "App.view.Main");
        let code = &output.code;
        assert!(code.starts_with("function Main(props){"));
        assert!(code.contains("props = {\n    count: 1,\n    ...props\n  }"));
        assert!(code.contains("const onGo = () => {"));
        assert!(code.contains("props.count = props.count + 1"));
        assert!(code.contains("<Panel title=\"Home\" {...props}>"));
        assert!(code.contains("<Button onClick={onGo}>"));
        assert!(output.libraries.contains(LIB_REACT));
        assert!(output.libraries.contains("Button"));
        assert!(output.class_refs.contains("Panel"));
    }

    #[test]
    fn test_component_hooks_become_react_hooks() {
        let registry = project(&[unit(
            "v.js",
            "Ext.define('App.Gauge', {
                extend: 'Ext.Panel',
                config: { level: 0 },
                applyLevel: function(level) { return level * 2; },
                updateLevel: function(level) { console.log(level); },
                initialize: function() { this.callParent(); }
            });",
        )]);
        let output = emit(&registry, "App.Gauge");
        assert!(output.code.contains("props.level = useMemo((level) => { return level * 2; }, [props.level])"));
        assert!(output.code.contains("useEffect((level) => { console.log(level); }, [props.level])"));
        assert!(output.code.contains("useEffect(() => {"));
        assert!(output.code.contains("}, [])"));
        assert!(!output.code.contains("callParent"));
        assert!(output.libraries.contains(LIB_USE_MEMO));
        assert!(output.libraries.contains(LIB_USE_EFFECT));
    }

    #[test]
    fn test_override_is_verbatim() {
        let source = "Ext.define('App.Patch', { override: 'App.Foo', x: 1 })";
        let registry = project(&[unit("p.js", &format!("{};", source))]);
        let output = emit(&registry, "App.Patch");
        assert_eq!(output.code, source);
        assert!(output.local_name.is_none());
    }

    #[test]
    fn test_controller_members_are_assimilated() {
        let registry = project(&[
            unit(
                "MainController.js",
                "Ext.define('App.MainController', { alias: 'controller.main', onSave: function() { return 1; } });",
            ),
            unit(
                "Main.js",
                "Ext.define('App.Main', { controller: 'main', onLoad: function() {} });",
            ),
        ]);
        let output = emit(&registry, "App.Main");
        assert!(output.code.contains("onSave(){ return 1; }"));
        assert!(output.code.contains("onLoad(){}"));
        assert!(!output.code.contains("controller = "));
    }

    #[test]
    fn test_dedent_keeps_relative_indentation() {
        let code = "function() {\n        if (a) {\n            b();\n        }\n    }";
        assert_eq!(dedent(code), "function() {\n    if (a) {\n        b();\n    }\n}");
    }

    #[test]
    fn test_dedent_with_non_ascii_whitespace() {
        let code = "f() {\n x();\n\u{a0}y();\n }";
        assert_eq!(dedent(code), "f() {\n x();\n\u{a0}y();\n }");

        let code = "f() {\n  \u{a0}x();\n  y();\n  }";
        assert_eq!(dedent(code), "f() {\n\u{a0}x();\ny();\n}");
    }
}

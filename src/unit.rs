//! Unit assembly
//!
//! One compiled unit is laid out as: imports, leftover top-level code, class
//! declarations, mixin copies, exports. Every class the unit names is bound to a
//! local identifier up front so rewriting can rename structurally.

use std::collections::{BTreeMap, BTreeSet};

use crate::capability::CapabilityTable;
use crate::diagnostics::{Diagnostics, DIAG_UNKNOWN_CLASS};
use crate::emit::{emit_class, ClassOutput, EmitContext, LIB_REACT, LIB_USE_EFFECT, LIB_USE_MEMO};
use crate::error::CompileError;
use crate::extract::ParsedUnit;
use crate::model::ClassModel;
use crate::naming::import_path;
use crate::registry::Registry;
use crate::rewrite::{collect_class_references, rewrite, FragmentKind, RewriteContext, SymbolTable};
use crate::rules::{LIB_APP, LIB_LODASH};
use crate::template::{LIB_FORMAT, LIB_TEMPLATE};

pub const MODULE_REACT: &str = "react";
pub const MODULE_APP: &str = "app";
pub const MODULE_LODASH: &str = "lodash";
pub const MODULE_FRAMEWORK: &str = "framework";

/// Identifiers a class binding must not shadow.
const JS_GLOBALS: [&str; 24] = [
    "Array", "Boolean", "Date", "Document", "Element", "Error", "Event", "Function", "Image",
    "JSON", "Map", "Math", "Node", "Number", "Object", "Promise", "Proxy", "Reflect", "RegExp",
    "Set", "String", "Symbol", "Text", "Window",
];

#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    pub path: String,
    pub code: String,
    pub diagnostics: Diagnostics,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// Local names for every class a unit declares or refers to.
struct Bindings<'r> {
    registry: &'r Registry,
    symbols: SymbolTable,
    taken: BTreeSet<String>,
    /// Element tags imported from the framework. Framework classes of the same
    /// name share the import; project classes step around them.
    element_tags: BTreeSet<String>,
    by_class: BTreeMap<String, String>,
    by_local: BTreeMap<String, String>,
}

impl<'r> Bindings<'r> {
    fn new(registry: &'r Registry, capabilities: &CapabilityTable) -> Self {
        let mut taken: BTreeSet<String> = JS_GLOBALS.iter().map(|g| g.to_string()).collect();
        for library in [LIB_REACT, LIB_USE_MEMO, LIB_USE_EFFECT, LIB_APP, LIB_LODASH, LIB_TEMPLATE, LIB_FORMAT] {
            taken.insert(library.to_string());
        }
        Bindings {
            registry,
            symbols: SymbolTable::new(),
            taken,
            element_tags: capabilities
                .output_tags()
                .into_iter()
                .map(str::to_string)
                .collect(),
            by_class: BTreeMap::new(),
            by_local: BTreeMap::new(),
        }
    }

    /// Own classes first, in declaration order, so every importer derives the
    /// same names the declaring unit uses.
    fn for_unit(registry: &'r Registry, capabilities: &CapabilityTable, path: &str) -> Self {
        let mut bindings = Bindings::new(registry, capabilities);
        for cls in registry.classes_in_unit(path) {
            if !cls.discard() && !cls.is_override() {
                bindings.bind(&cls.name);
            }
        }
        bindings
    }

    fn bind(&mut self, class_name: &str) -> Option<String> {
        let registry = self.registry;
        let cls = registry.resolve_class(class_name)?;
        if let Some(local) = self.by_class.get(&cls.name) {
            return Some(local.clone());
        }

        let base = cls
            .resolution
            .as_ref()
            .map(|r| r.export_name.clone())
            .unwrap_or_else(|| cls.name.rsplit('.').next().unwrap_or(&cls.name).to_string());
        let project = registry.is_local(&cls.name);
        let clashes = |bindings: &Self, name: &str| {
            bindings.taken.contains(name) || (project && bindings.element_tags.contains(name))
        };
        let mut local = base.clone();
        let mut instance = 1;
        while clashes(self, &local) {
            instance += 1;
            local = format!("{}{}", base, instance);
        }

        self.taken.insert(local.clone());
        self.by_class.insert(cls.name.clone(), local.clone());
        self.by_local.insert(local.clone(), cls.name.clone());
        self.symbols.insert_class(cls.name.clone(), local.clone());
        for name in &cls.alternate_names {
            self.symbols.insert_class(name.clone(), local.clone());
        }
        for alias in &cls.aliases {
            self.symbols.insert_alias(alias.clone(), local.clone());
        }
        Some(local)
    }

    fn bind_alias(&mut self, alias: &str) -> Option<String> {
        let class_name = self.registry.resolve_alias(alias)?.to_string();
        let local = self.bind(&class_name)?;
        self.symbols.insert_alias(alias.to_string(), local.clone());
        Some(local)
    }
}

/// Name the declaring unit gives `class_name`.
fn declared_name(registry: &Registry, capabilities: &CapabilityTable, cls: &ClassModel) -> String {
    let bindings = Bindings::for_unit(registry, capabilities, &cls.unit);
    bindings
        .by_class
        .get(&cls.name)
        .cloned()
        .unwrap_or_else(|| cls.name.clone())
}

fn exported_classes<'r>(registry: &'r Registry, path: &'r str) -> impl Iterator<Item = &'r ClassModel> + 'r {
    registry
        .classes_in_unit(path)
        .filter(|c| !c.discard() && !c.is_override())
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile one parsed unit against a finalized registry. `Ok(None)` when every
/// class of the unit was assimilated elsewhere.
pub fn compile_unit(
    unit: &ParsedUnit,
    registry: &Registry,
    capabilities: &CapabilityTable,
) -> Result<Option<CompiledUnit>, CompileError> {
    let classes: Vec<&ClassModel> = registry.classes_in_unit(&unit.path).collect();
    if !classes.is_empty() && classes.iter().all(|c| c.discard()) {
        log::debug!("{}: every class is assimilated; not written", unit.path);
        return Ok(None);
    }
    let classes: Vec<&ClassModel> = classes.into_iter().filter(|c| !c.discard()).collect();

    let mut bindings = Bindings::for_unit(registry, capabilities, &unit.path);
    let own: BTreeSet<String> = bindings.by_local.keys().cloned().collect();
    let mut diagnostics = Diagnostics::new();

    for cls in &classes {
        for name in referenced_classes(cls, registry)? {
            bindings.bind(&name);
        }
        for alias in &cls.aliases_used {
            if bindings.bind_alias(alias).is_none() && alias.starts_with("widget.") {
                log::debug!("{}: alias {} has no class", unit.path, alias);
            }
        }
    }
    let leftover = unit.leftover.join("\n\n");
    if !leftover.is_empty() {
        for name in collect_class_references(&leftover, FragmentKind::Program, registry) {
            bindings.bind(&name);
        }
    }

    let cx = EmitContext {
        registry,
        symbols: &bindings.symbols,
        capabilities,
        unit: &unit.path,
    };
    let mut outputs: Vec<ClassOutput> = Vec::with_capacity(classes.len());
    for cls in &classes {
        outputs.push(emit_class(cls, &cx)?);
    }

    let leftover = if leftover.is_empty() {
        None
    } else {
        let outcome = rewrite(&leftover, FragmentKind::Program, &RewriteContext::default(), &bindings.symbols);
        Some(outcome)
    };

    let mut libraries: BTreeSet<String> = BTreeSet::new();
    let mut refs: BTreeSet<String> = BTreeSet::new();
    if let Some(outcome) = &leftover {
        libraries.extend(outcome.libraries.iter().cloned());
        refs.extend(outcome.class_refs.iter().cloned());
    }
    for output in &outputs {
        libraries.extend(output.libraries.iter().cloned());
        refs.extend(output.class_refs.iter().cloned());
        diagnostics.merge(output.diagnostics.clone());
    }

    let imports = ImportSet::collect(&unit.path, registry, capabilities, &bindings, &own, &refs, &libraries, &mut diagnostics);

    let mut sections: Vec<String> = Vec::new();
    let import_lines = imports.render();
    if !import_lines.is_empty() {
        sections.push(import_lines.join("\n"));
    }
    if let Some(outcome) = leftover {
        sections.push(outcome.code);
    }
    for output in &outputs {
        sections.push(output.code.clone());
    }
    let trailer: Vec<String> = outputs.iter().flat_map(|o| o.trailer.iter().cloned()).collect();
    if !trailer.is_empty() {
        sections.push(trailer.join("\n"));
    }
    if let Some(exports) = export_statement(&outputs) {
        sections.push(exports);
    }

    let code = format!("{}\n", sections.join("\n\n"));
    if let Err(message) = crate::ast::check_module(&code) {
        return Err(CompileError::Parse {
            unit: unit.path.clone(),
            message: format!("compiled output is not a valid module: {}", message),
        });
    }

    Ok(Some(CompiledUnit {
        path: unit.path.clone(),
        code,
        diagnostics,
    }))
}

/// Classes named by a class and the companions it assimilates.
fn referenced_classes(cls: &ClassModel, registry: &Registry) -> Result<BTreeSet<String>, CompileError> {
    let resolution = cls.resolved()?;
    let mut names: BTreeSet<String> = BTreeSet::new();
    names.extend(resolution.parent.iter().cloned());
    names.extend(resolution.mixins.iter().cloned());

    let mut sources: Vec<&ClassModel> = vec![cls];
    sources.extend(
        resolution
            .assimilates
            .iter()
            .filter_map(|name| registry.resolve_class(name)),
    );
    for source in sources {
        let fragments = source
            .methods
            .iter()
            .chain(source.properties.iter())
            .chain(source.static_members.iter())
            .map(|m| m.value.as_str())
            .chain(source.configs.iter().map(|c| c.default_value.as_str()));
        for fragment in fragments {
            names.extend(collect_class_references(fragment, FragmentKind::Expression, registry));
        }
    }
    Ok(names)
}

fn export_statement(outputs: &[ClassOutput]) -> Option<String> {
    let exported: Vec<(&str, bool)> = outputs
        .iter()
        .filter_map(|o| o.local_name.as_deref().map(|name| (name, o.singleton)))
        .collect();
    match exported.as_slice() {
        [] => None,
        [(name, true)] => Some(format!("export default new {}()", name)),
        [(name, false)] => Some(format!("export default {}", name)),
        // singletons of multi-class units export the class
        many => Some(format!(
            "export {{ {} }}",
            many.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct ImportSet {
    react_default: bool,
    react_named: BTreeSet<String>,
    app: bool,
    lodash: bool,
    framework: BTreeSet<String>,
    /// Module path → (default import, named specifiers).
    relative: BTreeMap<String, (Option<String>, BTreeSet<String>)>,
}

impl ImportSet {
    #[allow(clippy::too_many_arguments)]
    fn collect(
        path: &str,
        registry: &Registry,
        capabilities: &CapabilityTable,
        bindings: &Bindings,
        own: &BTreeSet<String>,
        refs: &BTreeSet<String>,
        libraries: &BTreeSet<String>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut set = ImportSet::default();

        for library in libraries {
            match library.as_str() {
                LIB_REACT => set.react_default = true,
                LIB_USE_MEMO | LIB_USE_EFFECT => {
                    set.react_named.insert(library.clone());
                }
                LIB_APP => set.app = true,
                LIB_LODASH => set.lodash = true,
                _ => {
                    set.framework.insert(library.clone());
                }
            }
        }

        for local in refs {
            if own.contains(local) {
                continue;
            }
            let Some(cls) = bindings
                .by_local
                .get(local)
                .and_then(|name| registry.resolve_class(name))
            else {
                diagnostics.report(
                    DIAG_UNKNOWN_CLASS,
                    format!("No import for '{}'", local),
                    Some(path),
                );
                continue;
            };

            let exported_as = if registry.is_local(&cls.name) {
                declared_name(registry, capabilities, cls)
            } else {
                cls.resolution
                    .as_ref()
                    .map(|r| r.export_name.clone())
                    .unwrap_or_else(|| local.clone())
            };
            let specifier = if exported_as == *local {
                local.clone()
            } else {
                format!("{} as {}", exported_as, local)
            };

            if !registry.is_local(&cls.name) {
                set.framework.insert(specifier);
                continue;
            }

            let module = import_path(path, &cls.unit);
            let entry = set.relative.entry(module).or_default();
            if exported_classes(registry, &cls.unit).count() == 1 {
                entry.0 = Some(local.clone());
            } else {
                entry.1.insert(specifier);
            }
        }
        set
    }

    fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();

        let mut react: Vec<String> = Vec::new();
        if self.react_default {
            react.push(LIB_REACT.to_string());
        }
        if let Some(named) = join_named(&self.react_named) {
            react.push(named);
        }
        if !react.is_empty() {
            lines.push(format!("import {} from '{}'", react.join(", "), MODULE_REACT));
        }
        if self.app {
            lines.push(format!("import {} from '{}'", LIB_APP, MODULE_APP));
        }
        if self.lodash {
            lines.push(format!("import {} from '{}'", LIB_LODASH, MODULE_LODASH));
        }
        if let Some(named) = join_named(&self.framework) {
            lines.push(format!("import {} from '{}'", named, MODULE_FRAMEWORK));
        }

        for (module, (default, named)) in &self.relative {
            let mut clause: Vec<String> = Vec::new();
            if let Some(default) = default {
                clause.push(default.clone());
            }
            if let Some(named) = join_named(named) {
                clause.push(named);
            }
            lines.push(format!("import {} from '{}'", clause.join(", "), module));
        }
        lines
    }
}

fn join_named(names: &BTreeSet<String>) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(format!(
            "{{ {} }}",
            names.iter().cloned().collect::<Vec<_>>().join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingContext;
    use std::sync::Arc;

    fn parse(path: &str, source: &str) -> ParsedUnit {
        ParsedUnit::parse(path, source, &["Ext.define".to_string()])
    }

    fn framework() -> Arc<Registry> {
        let mut registry = Registry::new(NamingContext::default());
        registry
            .register(&parse(
                "ext.js",
                "Ext.define('Ext.Widget', { config: { cls: null } });\
                 Ext.define('Ext.Panel', { extend: 'Ext.Widget', xtype: 'panel' });\
                 Ext.define('Ext.data.Store', {});",
            ))
            .unwrap();
        registry.finalize().unwrap();
        Arc::new(registry)
    }

    fn project(units: &[ParsedUnit]) -> Registry {
        let mut registry = Registry::new(NamingContext::default()).with_parent(framework());
        for unit in units {
            registry.register(unit).unwrap();
        }
        registry.finalize().unwrap();
        registry
    }

    #[test]
    fn test_layout_and_relative_imports() {
        let model = parse(
            "app/model/User.js",
            "Ext.define('App.model.User', { fields: [] });",
        );
        let view = parse(
            "app/view/Users.js",
            "var DEFAULT_PAGE = 1;\n\
             Ext.define('App.view.Users', {\n\
                 load: function() {\n\
                     return Ext.create('App.model.User', { page: DEFAULT_PAGE });\n\
                 }\n\
             });",
        );
        let registry = project(&[model, view.clone()]);
        let table = CapabilityTable::default();

        let compiled = compile_unit(&view, &registry, &table).unwrap().unwrap();
        let code = &compiled.code;
        assert!(code.starts_with("import UserModel from '../model/User'\n\nvar DEFAULT_PAGE = 1;"));
        assert!(code.contains("return new UserModel({ page: DEFAULT_PAGE });"));
        assert!(code.trim_end().ends_with("export default UsersView"));
        let class_at = code.find("class UsersView").unwrap();
        let leftover_at = code.find("var DEFAULT_PAGE").unwrap();
        assert!(leftover_at < class_at);
    }

    #[test]
    fn test_framework_and_library_imports() {
        let view = parse(
            "app/Main.js",
            "Ext.define('App.Main', {\n\
                 extend: 'Ext.Panel',\n\
                 xtype: 'main',\n\
                 items: [{ xtype: 'button', text: 'Go' }],\n\
                 isEmpty: function(v) { return Ext.isEmpty(v); }\n\
             });",
        );
        let registry = project(&[view.clone()]);
        let table = CapabilityTable::default();

        let code = compile_unit(&view, &registry, &table).unwrap().unwrap().code;
        let lines: Vec<&str> = code.lines().take(3).collect();
        assert_eq!(
            lines,
            vec![
                "import React from 'react'",
                "import _ from 'lodash'",
                "import { Button, Panel } from 'framework'",
            ]
        );
        assert!(code.contains("function Main(props){"));
    }

    #[test]
    fn test_multiple_classes_and_singleton() {
        let unit = parse(
            "app/util.js",
            "Ext.define('App.util.Cache', { singleton: true });\n\
             Ext.define('App.util.Clock', {});",
        );
        let registry = project(&[unit.clone()]);
        let table = CapabilityTable::default();
        let code = compile_unit(&unit, &registry, &table).unwrap().unwrap().code;
        assert!(code.contains("export { CacheUtil, ClockUtil }"));

        let single = parse("app/Cache.js", "Ext.define('App.Cache', { singleton: true });");
        let registry = project(&[single.clone()]);
        let code = compile_unit(&single, &registry, &table).unwrap().unwrap().code;
        assert!(code.contains("export default new Cache()"));
    }

    #[test]
    fn test_import_names_avoid_collisions() {
        let a = parse("a/Map.js", "Ext.define('App.Map', {});");
        let b = parse(
            "b/Use.js",
            "Ext.define('App.Use', { make: function() { return new App.Map(); } });",
        );
        let registry = project(&[a, b.clone()]);
        let table = CapabilityTable::default();
        let code = compile_unit(&b, &registry, &table).unwrap().unwrap().code;
        assert!(code.contains("import Map2 from '../a/Map'"));
        assert!(code.contains("return new Map2();"));
    }

    #[test]
    fn test_fully_assimilated_unit_is_skipped() {
        let controller = parse(
            "MainController.js",
            "Ext.define('App.MainController', { alias: 'controller.main', onTap: function() {} });",
        );
        let view = parse("Main.js", "Ext.define('App.Main', { controller: 'main' });");
        let registry = project(&[controller.clone(), view]);
        let table = CapabilityTable::default();
        assert!(compile_unit(&controller, &registry, &table).unwrap().is_none());
    }

    #[test]
    fn test_strict_mode_leftover_is_a_compile_error() {
        let unit = parse(
            "app/Legacy.js",
            "with (scope) { go(); }\nExt.define('App.Legacy', {});",
        );
        let registry = project(&[unit.clone()]);
        let table = CapabilityTable::default();
        let err = compile_unit(&unit, &registry, &table).unwrap_err();
        assert!(matches!(err, CompileError::Parse { ref unit, .. } if unit == "app/Legacy.js"));
    }
}

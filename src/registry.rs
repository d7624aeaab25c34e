//! Class Registry & Resolver
//!
//! Two phases. `register` indexes the classes of one parsed unit at a time and
//! never looks at other units; `finalize` runs once after every unit is in and
//! attaches an immutable [`Resolution`] to each class. Lookups fall back to an
//! optional parent (framework) registry, local entries always winning.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::accessor::synthesize_accessor;
use crate::diagnostics::{
    Diagnostics, DIAG_DUPLICATE_ALIAS, DIAG_DUPLICATE_ASSIMILATION, DIAG_DUPLICATE_CLASS,
    DIAG_INHERITANCE_CYCLE, DIAG_UNKNOWN_CLASS,
};
use crate::error::RegistryError;
use crate::extract::ParsedUnit;
use crate::model::{ClassModel, ConfigEntry, Resolution};
use crate::naming::{export_name, NamingContext};

pub const WIDGET_BASE: &str = "Ext.Widget";
pub const APPLICATION_BASE: &str = "Ext.app.Application";

#[derive(Debug, Clone, Default)]
pub struct Registry {
    classes: Vec<ClassModel>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    alternate_names: HashMap<String, String>,
    parent: Option<Arc<Registry>>,
    naming: NamingContext,
    finalized: bool,
    diagnostics: Diagnostics,
}

impl Registry {
    pub fn new(naming: NamingContext) -> Self {
        Registry {
            naming,
            ..Default::default()
        }
    }

    /// Install a finalized framework registry as the fallback scope.
    pub fn with_parent(mut self, parent: Arc<Registry>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn parent(&self) -> Option<&Registry> {
        self.parent.as_deref()
    }

    pub fn naming(&self) -> &NamingContext {
        &self.naming
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PHASE 1: REGISTER
    // ═══════════════════════════════════════════════════════════════════════════

    /// Index the classes of one unit. Duplicate class names and aliases are
    /// reported; the first registration wins.
    pub fn register(&mut self, unit: &ParsedUnit) -> Result<Vec<&ClassModel>, RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized("register new units"));
        }

        let mut added = Vec::new();
        for cls in &unit.classes {
            if let Some(&existing) = self.index.get(&cls.name) {
                self.diagnostics.report(
                    DIAG_DUPLICATE_CLASS,
                    format!(
                        "Duplicate class: {} (first declared in {})",
                        cls.name, self.classes[existing].unit
                    ),
                    Some(&unit.path),
                );
                continue;
            }

            for alias in &cls.aliases {
                match self.aliases.get(alias) {
                    Some(owner) => {
                        let message = format!("Duplicate alias: {} (kept {})", alias, owner);
                        self.diagnostics
                            .report(DIAG_DUPLICATE_ALIAS, message, Some(&unit.path));
                    }
                    None => {
                        self.aliases.insert(alias.clone(), cls.name.clone());
                    }
                }
            }
            for name in &cls.alternate_names {
                self.alternate_names
                    .entry(name.clone())
                    .or_insert_with(|| cls.name.clone());
            }

            self.index.insert(cls.name.clone(), self.classes.len());
            added.push(self.classes.len());
            self.classes.push(cls.clone());
        }

        log::debug!("{}: registered {} class(es)", unit.path, added.len());
        Ok(added.into_iter().map(|i| &self.classes[i]).collect())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PHASE 2: FINALIZE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn finalize(&mut self) -> Result<(), RegistryError> {
        if self.finalized {
            return Err(RegistryError::AlreadyFinalized("finalize twice"));
        }

        let mut names: Vec<String> = self.classes.iter().map(|c| c.name.clone()).collect();
        if let Some(parent) = &self.parent {
            names.extend(parent.aliases.values().cloned());
        }
        self.naming.add_words_from_class_names(names.iter().map(String::as_str));

        let mut diagnostics = Diagnostics::new();
        let links = self.resolve_links(&mut diagnostics);

        let mut resolver = InheritanceResolver {
            registry: self,
            links: &links,
            memo: HashMap::new(),
            visiting: HashSet::new(),
            diagnostics: &mut diagnostics,
        };
        let mut resolutions = Vec::with_capacity(self.classes.len());
        for cls in &self.classes {
            let inherited = resolver.inherited(&cls.name)?;
            let ancestors = resolver.ancestors(&cls.name)?;
            resolutions.push((inherited, ancestors));
        }

        let assimilation = self.assimilation_ledger(&mut diagnostics);

        let mut resolved: Vec<Resolution> = Vec::with_capacity(self.classes.len());
        for (cls, (inherited, ancestors)) in self.classes.iter().zip(resolutions) {
            let link = links.get(&cls.name).cloned().unwrap_or_default();
            let is_component =
                cls.name == WIDGET_BASE || ancestors.iter().any(|a| a == WIDGET_BASE);
            let singleton = cls.singleton || ancestors.iter().any(|a| a == APPLICATION_BASE);

            resolved.push(Resolution {
                parent: link.parent,
                mixins: link.mixins,
                plugins: link.plugins,
                ancestors,
                inherited_configs: inherited.inherited.into_iter().collect(),
                local_configs: inherited.local,
                storage_names: inherited.storage,
                is_component,
                singleton,
                export_name: export_name(cls, &self.naming),
                assimilated_by: assimilation.owners.get(&cls.name).cloned(),
                assimilates: assimilation.owned.get(&cls.name).cloned().unwrap_or_default(),
            });
        }

        for (cls, resolution) in self.classes.iter_mut().zip(resolved) {
            cls.resolution = Some(resolution);
        }
        self.diagnostics.merge(diagnostics);
        self.finalized = true;
        log::info!("finalized registry with {} class(es)", self.classes.len());
        Ok(())
    }

    /// Parent, mixin and plugin references resolved to canonical class names.
    fn resolve_links(&self, diagnostics: &mut Diagnostics) -> HashMap<String, Links> {
        let mut links = HashMap::new();
        for cls in &self.classes {
            let parent = cls.parent_name.as_ref().and_then(|raw| {
                let found = self.resolve_class(raw).map(|c| c.name.clone());
                if found.is_none() {
                    diagnostics.report(
                        DIAG_UNKNOWN_CLASS,
                        format!("Unknown parent class {} for {}", raw, cls.name),
                        Some(&cls.unit),
                    );
                }
                found
            });
            let mixins = dedup(
                cls.mixins
                    .iter()
                    .filter_map(|raw| self.resolve_class(raw).map(|c| c.name.clone())),
            );
            let plugins = dedup(cls.plugins.iter().filter_map(|raw| {
                self.resolve_class(raw)
                    .map(|c| c.name.clone())
                    .or_else(|| self.resolve_alias(&format!("plugin.{}", raw)).map(str::to_string))
            }));
            links.insert(
                cls.name.clone(),
                Links {
                    parent,
                    mixins,
                    plugins,
                },
            );
        }
        links
    }

    /// One owner per assimilated class; later claims are reported and rejected.
    fn assimilation_ledger(&self, diagnostics: &mut Diagnostics) -> Assimilation {
        let mut ledger = Assimilation::default();
        for cls in &self.classes {
            let Some(alias) = &cls.controller_alias else {
                continue;
            };
            let Some(target) = self.aliases.get(alias) else {
                continue;
            };
            if *target == cls.name {
                continue;
            }
            match ledger.owners.get(target) {
                Some(owner) if *owner != cls.name => {
                    diagnostics.report(
                        DIAG_DUPLICATE_ASSIMILATION,
                        format!(
                            "Assimilated {} into more than one class: {} and {}",
                            target, owner, cls.name
                        ),
                        Some(&cls.unit),
                    );
                }
                Some(_) => {}
                None => {
                    ledger.owners.insert(target.clone(), cls.name.clone());
                    ledger
                        .owned
                        .entry(cls.name.clone())
                        .or_default()
                        .push(target.clone());
                }
            }
        }
        ledger
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUPS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Local table first, then the parent registry.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        match self.aliases.get(alias) {
            Some(name) => Some(name.as_str()),
            None => self.parent.as_ref().and_then(|p| p.resolve_alias(alias)),
        }
    }

    /// Local classes (by name or alternate name), then the parent registry.
    pub fn resolve_class(&self, name: &str) -> Option<&ClassModel> {
        let canonical = self
            .alternate_names
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);
        match self.index.get(canonical) {
            Some(&i) => Some(&self.classes[i]),
            None => self.parent.as_ref().and_then(|p| p.resolve_class(name)),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resolved record of a class. Before `finalize` this is an invariant violation.
    pub fn resolution(&self, name: &str) -> Result<&Resolution, RegistryError> {
        let cls = self
            .resolve_class(name)
            .ok_or_else(|| RegistryError::UnknownClass(name.to_string()))?;
        cls.resolved()
    }

    pub fn classes_in_unit<'r>(&'r self, unit: &'r str) -> impl Iterator<Item = &'r ClassModel> + 'r {
        self.classes.iter().filter(move |c| c.unit == unit)
    }

    /// Every class name and alias the rename pass may meet, local scope winning.
    pub fn known_class_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .parent
            .as_ref()
            .map(|p| p.known_class_names())
            .unwrap_or_default();
        names.extend(self.index.keys().cloned());
        names.extend(self.alternate_names.keys().cloned());
        names
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REPORTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Distinct class names, most referenced first.
    pub fn class_names_ranked(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> =
            self.classes.iter().map(|c| (c.name.clone(), 0)).collect();
        for cls in &self.classes {
            let Some(resolution) = &cls.resolution else {
                continue;
            };
            let referenced = resolution
                .parent
                .iter()
                .chain(resolution.mixins.iter())
                .chain(resolution.plugins.iter())
                .cloned()
                .chain(
                    cls.aliases_used
                        .iter()
                        .filter_map(|a| self.resolve_alias(a).map(str::to_string)),
                );
            for name in referenced {
                if let Some(count) = counts.get_mut(&name) {
                    *count += 1;
                }
            }
        }
        crate::diagnostics::ranked(&counts)
    }

    /// Call-site frequencies. Receivers other than `Ext` and `Math` collapse to
    /// the bare method; `me` counts as `this`.
    pub fn method_call_frequencies(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for call in self.classes.iter().flat_map(|c| c.method_calls.iter()) {
            let mut parts = call.splitn(3, '.');
            let object = parts.next().unwrap_or_default();
            let method = parts.next().unwrap_or_default();
            let object = if object == "me" { "this" } else { object };
            let key = match object {
                "Ext" | "Math" | "this" => format!("{}.{}", object, method),
                _ => format!(".{}", method),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        crate::diagnostics::ranked(&counts)
    }

    /// Rebuild a finalized registry from classes that already carry their
    /// resolution, skipping both phases.
    pub fn restore(
        classes: Vec<ClassModel>,
        naming: NamingContext,
        parent: Option<Arc<Registry>>,
    ) -> Result<Registry, RegistryError> {
        let mut registry = Registry::new(naming);
        registry.parent = parent;
        for cls in classes {
            cls.resolved()?;
            for alias in &cls.aliases {
                registry
                    .aliases
                    .entry(alias.clone())
                    .or_insert_with(|| cls.name.clone());
            }
            for name in &cls.alternate_names {
                registry
                    .alternate_names
                    .entry(name.clone())
                    .or_insert_with(|| cls.name.clone());
            }
            if registry.index.contains_key(&cls.name) {
                continue;
            }
            registry.index.insert(cls.name.clone(), registry.classes.len());
            registry.classes.push(cls);
        }
        let mut names: Vec<String> = registry.classes.iter().map(|c| c.name.clone()).collect();
        if let Some(parent) = &registry.parent {
            names.extend(parent.aliases.values().cloned());
        }
        registry
            .naming
            .add_words_from_class_names(names.iter().map(String::as_str));
        registry.finalized = true;
        Ok(registry)
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// INHERITANCE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
struct Links {
    parent: Option<String>,
    mixins: Vec<String>,
    plugins: Vec<String>,
}

impl Links {
    fn references(&self) -> impl Iterator<Item = &String> {
        self.parent
            .iter()
            .chain(self.mixins.iter())
            .chain(self.plugins.iter())
    }
}

#[derive(Debug, Default)]
struct Assimilation {
    /// assimilated class → owner
    owners: HashMap<String, String>,
    /// owner → assimilated classes
    owned: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    /// Config names reachable through parent, mixins and plugins.
    inherited: BTreeSet<String>,
    /// Declared configs minus inherited ones, sorted by name.
    local: Vec<ConfigEntry>,
    /// Storage name of every local and inherited accessor.
    storage: BTreeMap<String, String>,
}

impl Inherited {
    fn all_configs(&self) -> impl Iterator<Item = &String> {
        self.inherited.iter().chain(self.local.iter().map(|c| &c.name))
    }
}

struct InheritanceResolver<'r> {
    registry: &'r Registry,
    links: &'r HashMap<String, Links>,
    memo: HashMap<String, Inherited>,
    visiting: HashSet<String>,
    diagnostics: &'r mut Diagnostics,
}

impl<'r> InheritanceResolver<'r> {
    fn inherited(&mut self, name: &str) -> Result<Inherited, RegistryError> {
        if let Some(done) = self.memo.get(name) {
            return Ok(done.clone());
        }

        let all_links: &'r HashMap<String, Links> = self.links;
        let Some(links) = all_links.get(name) else {
            return self.from_parent_registry(name);
        };
        if !self.visiting.insert(name.to_string()) {
            self.diagnostics.report(
                DIAG_INHERITANCE_CYCLE,
                format!("Inheritance cycle through {}", name),
                None,
            );
            return Ok(Inherited::default());
        }

        let mut result = Inherited::default();
        for reference in links.references() {
            let upstream = self.inherited(reference)?;
            result.inherited.extend(upstream.all_configs().cloned());
            for (config, storage) in upstream.storage {
                result.storage.entry(config).or_insert(storage);
            }
        }

        let registry: &'r Registry = self.registry;
        if let Some(cls) = registry.resolve_class(name) {
            let mut local: Vec<ConfigEntry> = Vec::new();
            for entry in &cls.configs {
                if result.inherited.contains(&entry.name)
                    || local.iter().any(|c| c.name == entry.name)
                {
                    continue;
                }
                local.push(entry.clone());
            }
            local.sort_by(|a, b| a.name.cmp(&b.name));
            for entry in &local {
                let accessor = synthesize_accessor(entry, cls);
                result
                    .storage
                    .insert(accessor.external_name, accessor.internal_name);
            }
            result.local = local;
        }

        self.visiting.remove(name);
        self.memo.insert(name.to_string(), result.clone());
        Ok(result)
    }

    fn from_parent_registry(&mut self, name: &str) -> Result<Inherited, RegistryError> {
        let registry: &'r Registry = self.registry;
        let Some(parent) = registry.parent() else {
            return Ok(Inherited::default());
        };
        if parent.resolve_class(name).is_none() {
            return Ok(Inherited::default());
        }
        let resolution = parent.resolution(name)?;
        let result = Inherited {
            inherited: resolution.inherited_configs.iter().cloned().collect(),
            local: resolution.local_configs.clone(),
            storage: resolution.storage_names.clone(),
        };
        self.memo.insert(name.to_string(), result.clone());
        Ok(result)
    }

    /// Nearest first, stopping at the first repeated class.
    fn ancestors(&self, name: &str) -> Result<Vec<String>, RegistryError> {
        let mut ancestors: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::from([name.to_string()]);
        let mut current = self.parent_of(name)?;
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            current = self.parent_of(&parent)?;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    fn parent_of(&self, name: &str) -> Result<Option<String>, RegistryError> {
        if let Some(links) = self.links.get(name) {
            return Ok(links.parent.clone());
        }
        match self.registry.parent() {
            Some(parent) if parent.resolve_class(name).is_some() => {
                Ok(parent.resolution(name)?.parent.clone())
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str, source: &str) -> ParsedUnit {
        ParsedUnit::parse(path, source, &["Ext.define".to_string()])
    }

    fn finalized(units: &[ParsedUnit]) -> Registry {
        let mut registry = Registry::new(NamingContext::default());
        for u in units {
            registry.register(u).unwrap();
        }
        registry.finalize().unwrap();
        registry
    }

    #[test]
    fn test_resolution_before_finalize_is_an_invariant_violation() {
        let mut registry = Registry::new(NamingContext::default());
        registry
            .register(&unit("a.js", "Ext.define('App.A', { config: { x: 1 } });"))
            .unwrap();
        assert_eq!(
            registry.resolution("App.A"),
            Err(RegistryError::NotFinalized("App.A".to_string()))
        );
        registry.finalize().unwrap();
        assert!(registry.resolution("App.A").is_ok());
        assert!(matches!(
            registry.register(&unit("b.js", "Ext.define('App.B', {});")),
            Err(RegistryError::AlreadyFinalized(_))
        ));
    }

    #[test]
    fn test_inherited_configs_are_not_redeclared() {
        let registry = finalized(&[
            unit("child.js", "Ext.define('App.Child', { extend: 'App.Base', config: { x: 2, y: 3 } });"),
            unit("base.js", "Ext.define('App.Base', { mixins: ['App.Mix'], config: { x: 1 } });"),
            unit("mix.js", "Ext.define('App.Mix', { config: { z: 0 } });"),
        ]);
        let child = registry.resolution("App.Child").unwrap();
        assert_eq!(child.inherited_configs, vec!["x", "z"]);
        let local: Vec<&str> = child.local_configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(local, vec!["y"]);
        assert_eq!(child.ancestors, vec!["App.Base"]);
        assert!(child.is_accessor("z"));
    }

    #[test]
    fn test_duplicate_alias_first_registration_wins() {
        let mut registry = Registry::new(NamingContext::default());
        registry
            .register(&unit("a.js", "Ext.define('App.A', { alias: 'widget.foo' });"))
            .unwrap();
        registry
            .register(&unit("b.js", "Ext.define('App.B', { alias: 'widget.foo' });"))
            .unwrap();
        assert!(registry.diagnostics().has_code(DIAG_DUPLICATE_ALIAS));
        assert_eq!(registry.resolve_alias("widget.foo"), Some("App.A"));
    }

    #[test]
    fn test_duplicate_class_keeps_first() {
        let mut registry = Registry::new(NamingContext::default());
        registry
            .register(&unit("a.js", "Ext.define('App.A', { x: 1 });"))
            .unwrap();
        let added = registry
            .register(&unit("b.js", "Ext.define('App.A', { x: 2 });"))
            .unwrap();
        assert!(added.is_empty());
        assert!(registry.diagnostics().has_code(DIAG_DUPLICATE_CLASS));
        assert_eq!(registry.resolve_class("App.A").unwrap().unit, "a.js");
    }

    #[test]
    fn test_local_alias_shadows_framework_alias() {
        let mut framework = Registry::new(NamingContext::default());
        framework
            .register(&unit("ext.js", "Ext.define('Ext.Button', { xtype: 'button' });"))
            .unwrap();
        framework.finalize().unwrap();

        let mut project = Registry::new(NamingContext::default()).with_parent(Arc::new(framework));
        project
            .register(&unit("b.js", "Ext.define('App.Button', { xtype: 'button' });"))
            .unwrap();
        project.finalize().unwrap();

        assert_eq!(project.resolve_alias("widget.button"), Some("App.Button"));
        assert!(project.resolve_class("Ext.Button").is_some());
    }

    #[test]
    fn test_component_and_singleton_flags_through_framework() {
        let mut framework = Registry::new(NamingContext::default());
        framework
            .register(&unit(
                "ext.js",
                "Ext.define('Ext.Widget', {}); Ext.define('Ext.Container', { extend: 'Ext.Widget' }); Ext.define('Ext.app.Application', {});",
            ))
            .unwrap();
        framework.finalize().unwrap();

        let mut project = Registry::new(NamingContext::default()).with_parent(Arc::new(framework));
        project
            .register(&unit(
                "main.js",
                "Ext.define('App.Main', { extend: 'Ext.Container' }); Ext.define('App.App', { extend: 'Ext.app.Application' });",
            ))
            .unwrap();
        project.finalize().unwrap();

        let main = project.resolution("App.Main").unwrap();
        assert!(main.is_component);
        assert_eq!(main.ancestors, vec!["Ext.Container", "Ext.Widget"]);
        assert!(project.resolution("App.App").unwrap().singleton);
    }

    #[test]
    fn test_assimilation_is_one_to_one() {
        let registry = finalized(&[
            unit("c.js", "Ext.define('App.MainController', { alias: 'controller.main' });"),
            unit("v1.js", "Ext.define('App.Main', { controller: 'main' });"),
            unit("v2.js", "Ext.define('App.Other', { controller: 'main' });"),
        ]);
        let controller = registry.resolve_class("App.MainController").unwrap();
        assert!(controller.discard());
        assert_eq!(
            controller.resolved().unwrap().assimilated_by.as_deref(),
            Some("App.Main")
        );
        assert_eq!(
            registry.resolution("App.Main").unwrap().assimilates,
            vec!["App.MainController"]
        );
        assert!(registry.resolution("App.Other").unwrap().assimilates.is_empty());
        assert!(registry.diagnostics().has_code(DIAG_DUPLICATE_ASSIMILATION));
    }

    #[test]
    fn test_inheritance_cycle_is_reported_not_looped() {
        let registry = finalized(&[
            unit("a.js", "Ext.define('App.A', { extend: 'App.B', config: { a: 1 } });"),
            unit("b.js", "Ext.define('App.B', { extend: 'App.A', config: { b: 1 } });"),
        ]);
        assert!(registry.diagnostics().has_code(DIAG_INHERITANCE_CYCLE));
        assert_eq!(registry.resolution("App.A").unwrap().ancestors, vec!["App.B"]);
    }

    #[test]
    fn test_method_call_frequencies_collapse_receivers() {
        let registry = finalized(&[unit(
            "a.js",
            "Ext.define('App.A', { f: function() { var me = this; Ext.isEmpty(1); me.go(); store.go(); Math.max(1, 2); } });",
        )]);
        let calls = registry.method_call_frequencies();
        assert!(calls.contains(&("Ext.isEmpty".to_string(), 1)));
        assert!(calls.contains(&("this.go".to_string(), 1)));
        assert!(calls.contains(&(".go".to_string(), 1)));
        assert!(calls.contains(&("Math.max".to_string(), 1)));
    }
}

//! Class model types.
//!
//! A [`ClassModel`] is extracted once per `Ext.define` call and keeps every member as
//! owned source text. `finalize` attaches an immutable [`Resolution`]; nothing reads
//! ancestry, configs or aliases through any other path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RegistryError;

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBERS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigKind {
    Plain,
    Cached,
    Evented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub name: String,
    /// Default value as source text.
    pub default_value: String,
    pub kind: ConfigKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberKind {
    Method,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    /// Value as source text. Methods are always a function expression.
    pub value: String,
    pub kind: MemberKind,
}

impl Member {
    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS MODEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassModel {
    pub name: String,
    /// Declaring unit, relative to the source root.
    pub unit: String,
    /// Verbatim `Ext.define(...)` call.
    pub source: String,
    pub parent_name: Option<String>,
    pub mixins: Vec<String>,
    pub plugins: Vec<String>,
    pub aliases: Vec<String>,
    pub alternate_names: Vec<String>,
    /// Entries from the `config`, `cachedConfig` and `eventedConfig` blocks, in order.
    pub configs: Vec<ConfigEntry>,
    pub methods: Vec<Member>,
    pub properties: Vec<Member>,
    pub static_members: Vec<Member>,
    pub controller_alias: Option<String>,
    pub override_target: Option<String>,
    pub singleton: bool,
    pub aliases_used: Vec<String>,
    pub method_calls: Vec<String>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        ClassModel {
            name: name.into(),
            unit: unit.into(),
            ..Default::default()
        }
    }

    /// Resolved record. Asking before `finalize` is a sequencing bug.
    pub fn resolved(&self) -> Result<&Resolution, RegistryError> {
        self.resolution
            .as_ref()
            .ok_or_else(|| RegistryError::NotFinalized(self.name.clone()))
    }

    pub fn is_override(&self) -> bool {
        self.override_target.is_some()
    }

    /// Soft deletion: assimilated into another class.
    pub fn discard(&self) -> bool {
        self.resolution
            .as_ref()
            .map(|r| r.assimilated_by.is_some())
            .unwrap_or(false)
    }

    pub fn method(&self, name: &str) -> Option<&Member> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&Member> {
        self.properties.iter().find(|m| m.name == name)
    }

    /// Config names declared in any config block, first occurrence wins.
    pub fn declared_config_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.configs {
            if !names.contains(&entry.name.as_str()) {
                names.push(&entry.name);
            }
        }
        names
    }

    pub fn widget_xtypes(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .filter_map(|a| a.strip_prefix("widget."))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything derived from the whole registry, computed exactly once by `finalize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub parent: Option<String>,
    pub mixins: Vec<String>,
    pub plugins: Vec<String>,
    /// Nearest first.
    pub ancestors: Vec<String>,
    /// Transitive over parent, mixins and plugins. Sorted.
    pub inherited_configs: Vec<String>,
    /// Declared configs minus inherited names, sorted by name.
    pub local_configs: Vec<ConfigEntry>,
    /// Storage field of every local and inherited accessor (`title` → `_title`).
    pub storage_names: BTreeMap<String, String>,
    pub is_component: bool,
    pub singleton: bool,
    pub export_name: String,
    pub assimilated_by: Option<String>,
    pub assimilates: Vec<String>,
}

impl Resolution {
    pub fn is_accessor(&self, name: &str) -> bool {
        self.storage_names.contains_key(name)
    }

    pub fn is_inherited_config(&self, name: &str) -> bool {
        self.inherited_configs.binary_search_by(|c| c.as_str().cmp(name)).is_ok()
    }

    pub fn is_local_config(&self, name: &str) -> bool {
        self.local_configs.iter().any(|c| c.name == name)
    }
}

//! Accessor synthesis for declared configs.
//!
//! A config without hooks and without `evented` stays a plain field. Otherwise the
//! value lives in `_name` behind a getter/setter pair whose setter runs, in order:
//! the `apply` transform, the `update` hook, the change event (only once
//! initialized), the initialization flag, and finally the storage assignment.

use crate::model::{ClassModel, ConfigEntry, ConfigKind};
use crate::naming::upper_first;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDescriptor {
    pub external_name: String,
    pub internal_name: String,
    /// Default value as source text.
    pub default_value: String,
    /// Source of the local `apply<Name>` method.
    pub apply: Option<String>,
    /// Source of the local `update<Name>` method.
    pub update: Option<String>,
    pub evented: bool,
}

pub fn apply_hook_name(config: &str) -> String {
    format!("apply{}", upper_first(config))
}

pub fn update_hook_name(config: &str) -> String {
    format!("update{}", upper_first(config))
}

/// Only hooks declared on the class itself are honored; inherited or mixed-in
/// `apply`/`update` methods are ignored.
pub fn synthesize_accessor(entry: &ConfigEntry, cls: &ClassModel) -> AccessorDescriptor {
    let apply = cls.method(&apply_hook_name(&entry.name)).map(|m| m.value.clone());
    let update = cls.method(&update_hook_name(&entry.name)).map(|m| m.value.clone());
    let evented = entry.kind == ConfigKind::Evented;

    let internal_name = if apply.is_none() && update.is_none() && !evented {
        entry.name.clone()
    } else {
        format!("_{}", entry.name)
    };

    AccessorDescriptor {
        external_name: entry.name.clone(),
        internal_name,
        default_value: entry.default_value.trim().trim_end_matches(';').to_string(),
        apply,
        update,
        evented,
    }
}

impl AccessorDescriptor {
    pub fn is_plain(&self) -> bool {
        self.internal_name == self.external_name
    }

    pub fn has_hooks(&self) -> bool {
        self.apply.is_some() || self.update.is_some()
    }

    pub fn event_name(&self) -> String {
        format!("{}change", self.external_name.to_lowercase())
    }

    /// Method names subsumed into the accessor body.
    pub fn hook_methods(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.apply.is_some() {
            names.push(apply_hook_name(&self.external_name));
        }
        if self.update.is_some() {
            names.push(update_hook_name(&self.external_name));
        }
        names
    }

    /// Field declaration holding the default value.
    pub fn field(&self) -> String {
        format!("{} = {}", self.internal_name, self.default_value)
    }

    /// Getter/setter pair, or `None` for a plain field.
    pub fn methods(&self) -> Option<String> {
        if self.is_plain() {
            return None;
        }

        let name = &self.external_name;
        let storage = &self.internal_name;
        let initialized = format!("this.{}Initialized", storage);

        let mut getter: Vec<String> = Vec::new();
        if self.has_hooks() {
            getter.push(format!(
                "if(!{init}){{\n  this.{name} = this.{storage}\n}}",
                init = initialized,
                name = name,
                storage = storage
            ));
        }
        getter.push(format!("return this.{}", storage));

        let mut setter: Vec<String> = Vec::new();
        if let Some(apply) = &self.apply {
            setter.push(format!(
                "value = ({}).call(this, value, {} ? this.{} : undefined)",
                apply, initialized, storage
            ));
        }
        if let Some(update) = &self.update {
            let call = format!("({}).call(this, value, this.{})", update, storage);
            if self.apply.is_some() {
                setter.push(format!(
                    "if(typeof value !== 'undefined' && value !== this.{}){{\n{}\n}}",
                    storage,
                    indent(&call)
                ));
            } else {
                setter.push(call);
            }
        }
        if self.evented {
            setter.push(format!(
                "if({}){{\n  this.dispatchEvent('{}', this, value, this.{})\n}}",
                initialized,
                self.event_name(),
                storage
            ));
        }
        setter.push(format!("{} = true", initialized));
        setter.push(format!("this.{} = value", storage));

        Some(format!(
            "get {name}(){{\n{getter}\n}}\n\nset {name}(value){{\n{setter}\n}}",
            name = name,
            getter = indent(&getter.join("\n\n")),
            setter = indent(&setter.join("\n\n"))
        ))
    }
}

/// Indent every non-empty line by two spaces.
pub fn indent(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, MemberKind};

    fn entry(name: &str, default_value: &str, kind: ConfigKind) -> ConfigEntry {
        ConfigEntry {
            name: name.to_string(),
            default_value: default_value.to_string(),
            kind,
        }
    }

    fn method(name: &str, value: &str) -> Member {
        Member {
            name: name.to_string(),
            value: value.to_string(),
            kind: MemberKind::Method,
        }
    }

    #[test]
    fn test_plain_config_is_a_field() {
        let cls = ClassModel::new("Foo", "foo.js");
        let accessor = synthesize_accessor(&entry("title", "'x'", ConfigKind::Plain), &cls);
        assert!(accessor.is_plain());
        assert_eq!(accessor.field(), "title = 'x'");
        assert!(accessor.methods().is_none());
    }

    #[test]
    fn test_setter_ordering_with_all_hooks() {
        let mut cls = ClassModel::new("Foo", "foo.js");
        cls.methods.push(method("applyValue", "function(v) { return v * 2; }"));
        cls.methods.push(method("updateValue", "function(v) { this.render(); }"));

        let accessor = synthesize_accessor(&entry("value", "0", ConfigKind::Evented), &cls);
        assert_eq!(accessor.internal_name, "_value");
        assert_eq!(accessor.hook_methods(), vec!["applyValue", "updateValue"]);

        let code = accessor.methods().unwrap();
        let setter = &code[code.find("set value").unwrap()..];
        let apply = setter.find("return v * 2").unwrap();
        let update = setter.find("this.render()").unwrap();
        let dispatch = setter.find("dispatchEvent('valuechange'").unwrap();
        let flag = setter.find("this._valueInitialized = true").unwrap();
        let store = setter.find("this._value = value").unwrap();
        assert!(apply < update && update < dispatch && dispatch < flag && flag < store);

        // the event only fires once a first assignment has initialized the accessor
        assert!(setter.contains("if(this._valueInitialized){"));
        assert!(code.contains("if(!this._valueInitialized){"));
    }

    #[test]
    fn test_evented_without_hooks_has_no_getter_guard() {
        let cls = ClassModel::new("Foo", "foo.js");
        let accessor = synthesize_accessor(&entry("mode", "'a'", ConfigKind::Evented), &cls);
        let code = accessor.methods().unwrap();
        assert!(!code.contains("if(!this._modeInitialized)"));
        assert!(code.contains("this.dispatchEvent('modechange', this, value, this._mode)"));
    }
}

//! Capability table
//!
//! Maps a widget tag to an output tag, an optional parent tag and per-property
//! transforms. Lookups walk the parent chain; the nearest output tag wins and
//! transforms apply most-general first.

use std::collections::{BTreeMap, BTreeSet};

use crate::element::{ElementNode, RawProp};

/// What happens to one property on its way to an element attribute.
#[derive(Clone, Copy)]
pub enum PropTransform {
    /// Drop the property.
    Suppress,
    /// Emit under another attribute name.
    Rename(&'static str),
    /// Consume the value as the element's text child.
    TextChild,
    /// Emit as `icon`; the element switches to `icon_tag` when it ends up without text.
    IconContent { icon_tag: &'static str },
    /// Arbitrary rewrite. Returning `false` drops the property.
    Custom(fn(&mut RawProp, &mut ElementNode) -> bool),
}

impl std::fmt::Debug for PropTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropTransform::Suppress => write!(f, "Suppress"),
            PropTransform::Rename(name) => write!(f, "Rename({})", name),
            PropTransform::TextChild => write!(f, "TextChild"),
            PropTransform::IconContent { icon_tag } => write!(f, "IconContent({})", icon_tag),
            PropTransform::Custom(_) => write!(f, "Custom"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Capability {
    pub tag: String,
    pub parent: Option<String>,
    /// Output tag or component name; `None` inherits the parent's.
    pub output: Option<String>,
    pub props: Vec<(String, PropTransform)>,
}

impl Capability {
    pub fn new(tag: &str) -> Self {
        Capability {
            tag: tag.to_string(),
            parent: None,
            output: None,
            props: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn output(mut self, tag: &str) -> Self {
        self.output = Some(tag.to_string());
        self
    }

    pub fn prop(mut self, name: &str, transform: PropTransform) -> Self {
        self.props.push((name.to_string(), transform));
        self
    }

    pub fn transform(&self, name: &str) -> Option<PropTransform> {
        self.props
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, transform)| *transform)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    entries: BTreeMap<String, Capability>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        let mut table = CapabilityTable::empty();
        table.insert(
            Capability::new("component")
                .output("div")
                .prop("cls", PropTransform::Rename("className"))
                .prop("xclass", PropTransform::Suppress)
                .prop("reference", PropTransform::Suppress)
                .prop("itemId", PropTransform::Suppress),
        );
        table.insert(Capability::new("container").extends("component"));
        table.insert(
            Capability::new("panel")
                .extends("container")
                .output("Panel")
                .prop("title", PropTransform::Rename("title")),
        );
        table.insert(Capability::new("toolbar").extends("container").output("Toolbar"));
        table.insert(Capability::new("titlebar").extends("toolbar").output("TitleBar"));
        table.insert(
            Capability::new("button")
                .extends("component")
                .output("Button")
                .prop("text", PropTransform::TextChild)
                .prop("onTap", PropTransform::Rename("onClick"))
                .prop("iconCls", PropTransform::IconContent { icon_tag: "IconButton" }),
        );
        table.insert(
            Capability::new("label")
                .extends("component")
                .output("Label")
                .prop("html", PropTransform::TextChild),
        );
        table.insert(
            Capability::new("textfield")
                .extends("component")
                .output("TextField")
                .prop("onChange", PropTransform::Rename("onChange")),
        );
        table.insert(Capability::new("image").extends("component").output("Image"));
        table.insert(Capability::new("list").extends("component").output("List"));
        table
    }
}

impl CapabilityTable {
    pub fn empty() -> Self {
        CapabilityTable {
            entries: BTreeMap::new(),
        }
    }

    /// Later inserts replace earlier entries with the same tag.
    pub fn insert(&mut self, capability: Capability) {
        self.entries.insert(capability.tag.clone(), capability);
    }

    pub fn get(&self, tag: &str) -> Option<&Capability> {
        self.entries.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Most general first, ending with `tag` itself. Empty for unknown tags.
    pub fn chain(&self, tag: &str) -> Vec<&Capability> {
        let mut chain: Vec<&Capability> = Vec::new();
        let mut current = self.entries.get(tag);
        while let Some(capability) = current {
            if chain.iter().any(|c| c.tag == capability.tag) {
                log::warn!("capability chain of '{}' loops at '{}'", tag, capability.tag);
                break;
            }
            chain.push(capability);
            current = capability
                .parent
                .as_deref()
                .and_then(|parent| self.entries.get(parent));
        }
        chain.reverse();
        chain
    }

    /// Every tag an element can end up with, icon variants included.
    pub fn output_tags(&self) -> BTreeSet<&str> {
        let mut tags = BTreeSet::new();
        for capability in self.entries.values() {
            if let Some(output) = &capability.output {
                tags.insert(output.as_str());
            }
            for (_, transform) in &capability.props {
                if let PropTransform::IconContent { icon_tag } = transform {
                    tags.insert(*icon_tag);
                }
            }
        }
        tags
    }

    /// The nearest override along the chain.
    pub fn output_tag(&self, tag: &str) -> Option<&str> {
        self.chain(tag)
            .iter()
            .rev()
            .find_map(|c| c.output.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_general_first() {
        let table = CapabilityTable::default();
        let tags: Vec<&str> = table.chain("titlebar").iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["component", "container", "toolbar", "titlebar"]);
        assert!(table.chain("unknown").is_empty());
    }

    #[test]
    fn test_nearest_output_wins() {
        let table = CapabilityTable::default();
        assert_eq!(table.output_tag("container"), Some("div"));
        assert_eq!(table.output_tag("titlebar"), Some("TitleBar"));
        assert_eq!(table.output_tag("nope"), None);
    }

    #[test]
    fn test_output_tags_include_icon_variants() {
        let table = CapabilityTable::default();
        let tags = table.output_tags();
        assert!(tags.contains("Button"));
        assert!(tags.contains("IconButton"));
        assert!(tags.contains("div"));
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let mut table = CapabilityTable::empty();
        table.insert(Capability::new("a").extends("b").output("A"));
        table.insert(Capability::new("b").extends("a"));
        assert_eq!(table.chain("a").len(), 2);
    }
}

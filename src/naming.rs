//! Naming context
//!
//! Word-based capitalization, export-name derivation and relative import paths.
//! The word list is an explicit value built from configuration and class names
//! and passed to whoever needs it; nothing here is global or mutated after
//! the registry is finalized.

use regex::Regex;

use crate::model::ClassModel;

const DEFAULT_WORDS: [&str; 12] = [
    "Change",
    "Tap",
    "HeaderPin",
    "KeyUp",
    "Initialize",
    "Disclose",
    "Record",
    "Validated",
    "Cmp",
    "Icon",
    "Mode",
    "Width",
];

#[derive(Debug, Clone)]
struct Word {
    text: String,
    pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct NamingContext {
    custom: Vec<String>,
    words: Vec<Word>,
}

impl Default for NamingContext {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl NamingContext {
    pub fn new(custom: &[String]) -> Self {
        let mut ctx = NamingContext {
            custom: custom.to_vec(),
            words: Vec::new(),
        };
        let mut initial: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
        initial.extend(custom.iter().cloned());
        ctx.add_words(initial);
        ctx
    }

    /// Custom words only; the rest is derived again from class names.
    pub fn custom_words(&self) -> &[String] {
        &self.custom
    }

    pub fn add_words(&mut self, words: impl IntoIterator<Item = String>) {
        let mut all: Vec<String> = self.words.iter().map(|w| w.text.clone()).collect();
        for word in words {
            if !word.is_empty() && !all.contains(&word) {
                all.push(word);
            }
        }

        // Shorter first so longer words win; custom words last among equals.
        let custom = &self.custom;
        all.sort_by(|a, b| {
            a.len()
                .cmp(&b.len())
                .then_with(|| custom.contains(a).cmp(&custom.contains(b)))
        });

        self.words = all
            .into_iter()
            .filter_map(|text| {
                let pattern = Regex::new(&format!("(?i){}", regex::escape(&text))).ok()?;
                Some(Word { text, pattern })
            })
            .collect();
    }

    /// Words longer than three letters from every dotted/camel-cased part.
    pub fn add_words_from_class_names<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        let mut words = Vec::new();
        for name in names {
            for part in name.split('.') {
                for word in split_camel(part) {
                    if word.chars().count() > 3 {
                        words.push(capitalize_word(&word));
                    }
                }
            }
        }
        self.add_words(words);
    }

    /// `itemtap` → `ItemTap` given the words `Item` and `Tap`.
    pub fn capitalize(&self, value: &str) -> String {
        let mut result = value.to_string();
        for word in &self.words {
            result = word
                .pattern
                .replace_all(&result, word.text.as_str())
                .into_owned();
        }
        upper_first(&result)
    }
}

fn split_camel(part: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in part.chars() {
        if c.is_ascii_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// First letter upper, rest lower.
pub fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

pub fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORT NAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Derived from the first alias when there is one (`widget.user-list` → `List`,
/// `viewmodel.main` → `MainModel`), otherwise from the reversed class name
/// without its root namespace (`App.view.Main` → `MainView`).
pub fn export_name(cls: &ClassModel, naming: &NamingContext) -> String {
    let Some(alias) = cls.aliases.first() else {
        let parts: Vec<&str> = cls.name.split('.').collect();
        let name: String = parts
            .iter()
            .rev()
            .take(parts.len().saturating_sub(1))
            .map(|p| upper_first(p))
            .collect();
        return if name.is_empty() {
            upper_first(&cls.name)
        } else {
            name
        };
    };

    let parts: Vec<&str> = alias.split('.').collect();
    let (last, namespace) = match parts.split_last() {
        Some((last, rest)) => (*last, rest.join(".").to_lowercase()),
        None => (alias.as_str(), String::new()),
    };
    let base = last.rsplit('-').next().unwrap_or(last);
    let name = naming.capitalize(&capitalize_word(base));

    let suffix = match namespace.as_str() {
        "widget" | "" => String::new(),
        "viewmodel" => "Model".to_string(),
        other => other.split('.').map(capitalize_word).collect(),
    };
    format!("{}{}", name, suffix)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATHS
// ═══════════════════════════════════════════════════════════════════════════════

/// Relative path from one file to another, both `/`-separated.
pub fn relative_path(from_file: &str, to_file: &str) -> String {
    let from_parts: Vec<&str> = from_file.split('/').collect();
    let to_parts: Vec<&str> = to_file.split('/').collect();

    let common = from_parts
        .iter()
        .enumerate()
        .position(|(i, p)| to_parts.get(i) != Some(p))
        .unwrap_or(to_parts.len().saturating_sub(1));

    let ups = from_parts.len().saturating_sub(common + 1);
    let mut parts: Vec<&str> = std::iter::repeat("..").take(ups).collect();
    parts.extend(to_parts.iter().skip(common));

    if parts.first() != Some(&"..") {
        parts.insert(0, ".");
    }
    parts.join("/")
}

/// Module specifier for importing `to_unit` from `from_unit`.
pub fn import_path(from_unit: &str, to_unit: &str) -> String {
    let path = relative_path(&format!("/{}", from_unit), &format!("/{}", to_unit));
    let path = path.strip_suffix(".js").unwrap_or(&path);
    path.strip_suffix("/index").unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("/foo.js", "/foo.js"), "./foo.js");
        assert_eq!(relative_path("/foo.js", "/bar.js"), "./bar.js");
        assert_eq!(relative_path("/1/foo.js", "/1/bar.js"), "./bar.js");
        assert_eq!(relative_path("/1/2/foo.js", "/1/2/bar.js"), "./bar.js");
        assert_eq!(relative_path("/1/foo.js", "/2/bar.js"), "../2/bar.js");
        assert_eq!(relative_path("/1/a/foo.js", "/1/bar.js"), "../bar.js");
        assert_eq!(relative_path("/1/foo.js", "/1/a/bar.js"), "./a/bar.js");
        assert_eq!(
            relative_path("/1/2/3/4/foo.js", "/1/2/a/b/c/bar.js"),
            "../../a/b/c/bar.js"
        );
    }

    #[test]
    fn test_import_path_strips_extension_and_index() {
        assert_eq!(import_path("app/view/Main.js", "app/model/User.js"), "../model/User");
        assert_eq!(import_path("app/Main.js", "app/util/index.js"), "./util");
    }

    #[test]
    fn test_capitalize_with_words() {
        let mut naming = NamingContext::default();
        assert_eq!(naming.capitalize("itemtap"), "ItemTap");
        assert_eq!(naming.capitalize("headerpinchange"), "HeaderPinChange");
        naming.add_words_from_class_names(["App.view.UserList"]);
        assert_eq!(naming.capitalize("userlistchange"), "UserListChange");
    }

    #[test]
    fn test_longer_word_wins_over_embedded_word() {
        let mut naming = NamingContext::default();
        naming.add_words(["Date".to_string()]);
        assert_eq!(naming.capitalize("validatedchange"), "ValidatedChange");
        assert_eq!(naming.capitalize("datechange"), "DateChange");
    }

    #[test]
    fn test_export_names() {
        let naming = NamingContext::default();

        let plain = ClassModel::new("App.view.Main", "a.js");
        assert_eq!(export_name(&plain, &naming), "MainView");

        let mut widget = ClassModel::new("App.view.List", "a.js");
        widget.aliases = vec!["widget.user-list".to_string()];
        assert_eq!(export_name(&widget, &naming), "List");

        let mut model = ClassModel::new("App.view.MainModel", "a.js");
        model.aliases = vec!["viewmodel.main".to_string()];
        assert_eq!(export_name(&model, &naming), "MainModel");

        let mut controller = ClassModel::new("App.view.MainController", "a.js");
        controller.aliases = vec!["controller.main".to_string()];
        assert_eq!(export_name(&controller, &naming), "MainController");
    }
}

//! Non-fatal findings and usage counters.
//!
//! Every phase appends to its own [`Diagnostics`]; parallel phases merge their
//! accumulators afterwards, so accumulation order only affects report ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const DIAG_DUPLICATE_CLASS: &str = "E2R-DUP-CLASS";
pub const DIAG_DUPLICATE_ALIAS: &str = "E2R-DUP-ALIAS";
pub const DIAG_UNKNOWN_ALIAS: &str = "E2R-UNKNOWN-ALIAS";
pub const DIAG_UNKNOWN_CLASS: &str = "E2R-UNKNOWN-CLASS";
pub const DIAG_MALFORMED_ALIAS: &str = "E2R-MALFORMED-ALIAS";
pub const DIAG_DEFINE_SHAPE: &str = "E2R-DEFINE-SHAPE";
pub const DIAG_DUPLICATE_ASSIMILATION: &str = "E2R-DUP-ASSIMILATION";
pub const DIAG_INHERITANCE_CYCLE: &str = "E2R-CYCLE";
pub const DIAG_FORMAT_FALLBACK: &str = "E2R-FORMAT-FALLBACK";
pub const DIAG_UNIT_FALLBACK: &str = "E2R-UNIT-FALLBACK";
pub const DIAG_UNPARSEABLE: &str = "E2R-UNPARSEABLE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub unit: Option<String>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "[{}] {} ({})", self.code, self.message, unit),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub entries: Vec<Diagnostic>,
    /// Widget tags the element compiler could not map.
    pub unrecognized_tags: BTreeMap<String, usize>,
    /// `tag.prop` pairs that passed through without a capability transform.
    pub unrecognized_props: BTreeMap<String, usize>,
    /// Class member names seen during emission, for tuning transform tables.
    pub property_usage: BTreeMap<String, usize>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and log it.
    pub fn report(&mut self, code: &str, message: impl Into<String>, unit: Option<&str>) {
        let diagnostic = Diagnostic {
            code: code.to_string(),
            message: message.into(),
            unit: unit.map(str::to_string),
        };
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn tally_tag(&mut self, tag: &str) {
        *self.unrecognized_tags.entry(tag.to_string()).or_insert(0) += 1;
    }

    pub fn tally_prop(&mut self, tag: &str, prop: &str) {
        *self
            .unrecognized_props
            .entry(format!("{}.{}", tag, prop))
            .or_insert(0) += 1;
    }

    pub fn log_property(&mut self, name: &str) {
        *self.property_usage.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
        for (k, v) in other.unrecognized_tags {
            *self.unrecognized_tags.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.unrecognized_props {
            *self.unrecognized_props.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.property_usage {
            *self.property_usage.entry(k).or_insert(0) += v;
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    pub fn count_code(&self, code: &str) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.unrecognized_tags.is_empty()
            && self.unrecognized_props.is_empty()
    }
}

/// Highest count first; ties broken alphabetically so reports are stable.
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut list: Vec<(String, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_orders_by_count_then_name() {
        let mut counts = BTreeMap::new();
        counts.insert("b".to_string(), 2);
        counts.insert("a".to_string(), 2);
        counts.insert("c".to_string(), 5);
        let ranked = ranked(&counts);
        assert_eq!(ranked[0], ("c".to_string(), 5));
        assert_eq!(ranked[1].0, "a");
        assert_eq!(ranked[2].0, "b");
    }

    #[test]
    fn test_merge_sums_tallies() {
        let mut a = Diagnostics::new();
        a.tally_tag("grid");
        let mut b = Diagnostics::new();
        b.tally_tag("grid");
        b.report(DIAG_UNKNOWN_ALIAS, "Unknown alias: widget.x", Some("a.js"));
        a.merge(b);
        assert_eq!(a.unrecognized_tags["grid"], 2);
        assert!(a.has_code(DIAG_UNKNOWN_ALIAS));
    }
}

//! Rewrite rule tables
//!
//! Declarative member and call substitutions for legacy framework APIs. A rule is
//! a dotted pattern (a `*` segment matches one identifier) plus a production. Call
//! productions see their arguments as source fragments and return `None` to decline,
//! leaving the original call in place.

use lazy_static::lazy_static;
use oxc_ast::ast::*;
use oxc_span::GetSpan;

use crate::ast::{self, node_text, strip_parens, wrap_receiver};

pub const LIB_LODASH: &str = "_";
pub const LIB_APP: &str = "App";

/// Callee spellings normalized before any rule is matched.
const CALLEE_ALIASES: [(&str, &str); 2] = [
    ("Ext.bind", "Ext.Function.bind"),
    ("Ext.encode", "Ext.JSON.encode"),
];

pub fn canonical_callee(name: &str) -> &str {
    CALLEE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, target)| *target)
        .unwrap_or(name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERNS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('.')
            .map(|s| {
                if s == "*" {
                    Segment::Wildcard
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Pattern { segments }
    }

    /// Wildcard captures on a match.
    pub fn captures(&self, name: &str) -> Option<Vec<String>> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Wildcard if ast::is_identifier(part) => captures.push(part.to_string()),
                _ => return None,
            }
        }
        Some(captures)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.captures(name).is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBER RULES
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MemberRule {
    pub pattern: Pattern,
    pub production: fn(&[String]) -> String,
    pub library: Option<&'static str>,
}

impl MemberRule {
    fn new(pattern: &str, production: fn(&[String]) -> String, library: Option<&'static str>) -> Self {
        MemberRule {
            pattern: Pattern::new(pattern),
            production,
            library,
        }
    }

    /// Replacement text for a member path, parenthesized when it is an arrow.
    pub fn apply(&self, name: &str) -> Option<String> {
        let captures = self.pattern.captures(name)?;
        let produced = (self.production)(&captures);
        if produced.contains("=>") {
            Some(format!("({})", produced))
        } else {
            Some(produced)
        }
    }
}

macro_rules! constant {
    ($text:expr) => {
        |_: &[String]| $text.to_string()
    };
}

lazy_static! {
    pub static ref MEMBER_RULES: Vec<MemberRule> = vec![
        MemberRule::new("*.app.*", |c| format!("App.{}", c[1]), Some(LIB_APP)),
        MemberRule::new("Ext.Array.clean", constant!("_.compact"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.difference", constant!("_.difference"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.flatten", constant!("_.flattenDeep"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.intersect", constant!("_.intersection"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.pluck", constant!("_.map"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.remove", constant!("_.pull"), Some(LIB_LODASH)),
        MemberRule::new("Ext.Array.unique", constant!("_.uniq"), Some(LIB_LODASH)),
        MemberRule::new("Ext.JSON.decode", constant!("JSON.parse"), None),
        MemberRule::new("Ext.JSON.encode", constant!("JSON.stringify"), None),
        MemberRule::new("Ext.Number.constrain", constant!("_.clamp"), Some(LIB_LODASH)),
        MemberRule::new("Ext.String.capitalize", constant!("_.upperFirst"), Some(LIB_LODASH)),
        MemberRule::new("Ext.baseCSSPrefix", constant!("'x-'"), None),
        MemberRule::new("Ext.clone", constant!("_.cloneDeep"), Some(LIB_LODASH)),
        MemberRule::new("Ext.emptyFn", constant!("() => {}"), None),
        MemberRule::new("Ext.isArray", constant!("_.isArray"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isDate", constant!("_.isDate"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isDefined", constant!("!_.isUndefined"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isEmpty", constant!("_.isEmpty"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isFunction", constant!("_.isFunction"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isNumber", constant!("_.isFinite"), Some(LIB_LODASH)),
        MemberRule::new("Ext.isString", constant!("_.isString"), Some(LIB_LODASH)),
    ];
}

pub fn find_member_rule(name: &str) -> Option<&'static MemberRule> {
    let name = canonical_callee(name);
    MEMBER_RULES.iter().find(|rule| rule.pattern.matches(name))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL RULES
// ═══════════════════════════════════════════════════════════════════════════════

/// One call argument, reduced to the facts productions need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    pub text: String,
    /// Element list of an array literal, without brackets.
    pub array_inner: Option<String>,
    pub is_function: bool,
    pub is_spread: bool,
    /// Parameter texts of a function literal.
    pub params: Vec<String>,
}

impl CallArg {
    pub fn from_argument(arg: &Argument, source: &str) -> CallArg {
        let text = node_text(source, arg).to_string();
        let Some(expr) = arg.as_expression() else {
            return CallArg {
                text,
                array_inner: None,
                is_function: false,
                is_spread: true,
                params: Vec::new(),
            };
        };

        let inner = strip_parens(expr);
        let array_inner = match inner {
            Expression::ArrayExpression(arr) => {
                let span = arr.span();
                Some(source[span.start as usize + 1..span.end as usize - 1].trim().to_string())
            }
            _ => None,
        };
        let params = match inner {
            Expression::FunctionExpression(func) => func
                .params
                .items
                .iter()
                .map(|p| node_text(source, p).to_string())
                .collect(),
            Expression::ArrowFunctionExpression(arrow) => arrow
                .params
                .items
                .iter()
                .map(|p| node_text(source, p).to_string())
                .collect(),
            _ => Vec::new(),
        };

        CallArg {
            text,
            array_inner,
            is_function: ast::is_function(expr),
            is_spread: false,
            params,
        }
    }

    /// Arguments spread into a call: array literals inline, anything else spread.
    pub fn exploded(&self) -> String {
        match &self.array_inner {
            Some(inner) => inner.clone(),
            None => format!("...{}", wrap_receiver(&self.text)),
        }
    }

    /// The function with its first two parameters exchanged.
    pub fn with_swapped_params(&self) -> Option<String> {
        let parts = ast::function_parts(&self.text)?;
        let mut params = self.params.clone();
        match params.len() {
            0 => return None,
            1 => params.insert(0, "_value".to_string()),
            _ => params.swap(0, 1),
        }
        let list = format!("({})", params.join(", "));
        let prefix = if parts.is_async { "async " } else { "" };
        if parts.is_arrow {
            Some(format!("{}{} => {}", prefix, list, parts.body))
        } else {
            Some(format!("{}function{}{}", prefix, list, parts.body))
        }
    }
}

pub type CallProduction = fn(&[CallArg]) -> Option<String>;

pub struct CallRule {
    pub pattern: Pattern,
    pub min_args: usize,
    pub max_args: usize,
    pub production: CallProduction,
    pub library: Option<&'static str>,
}

impl CallRule {
    fn new(
        pattern: &str,
        min_args: usize,
        max_args: usize,
        production: CallProduction,
        library: Option<&'static str>,
    ) -> Self {
        CallRule {
            pattern: Pattern::new(pattern),
            min_args,
            max_args,
            production,
            library,
        }
    }

    pub fn apply(&self, args: &[CallArg]) -> Option<String> {
        if args.len() < self.min_args || args.len() > self.max_args {
            return None;
        }
        if args.iter().any(|a| a.is_spread) {
            return None;
        }
        (self.production)(args)
    }
}

fn join_args(args: &[&CallArg]) -> String {
    args.iter().map(|a| a.text.as_str()).collect::<Vec<_>>().join(", ")
}

fn bind(args: &[CallArg]) -> Option<String> {
    let func = args.first()?;
    let scope = args.get(1);
    let bound = args.get(2);
    let append = args.get(3);

    if bound.is_some() && append.map(|a| a.text.trim() != "0").unwrap_or(true) {
        return None;
    }

    let scope = scope.map(|s| s.text.clone()).unwrap_or_else(|| "window".to_string());
    let extra = bound
        .map(|b| b.exploded())
        .filter(|e| !e.is_empty())
        .map(|e| format!(", {}", e))
        .unwrap_or_default();
    Some(format!("{}.bind({}{})", wrap_receiver(&func.text), scope, extra))
}

fn defer(args: &[CallArg]) -> Option<String> {
    let func = args.first()?;
    let millis = args.get(1)?;
    let callable = if args.len() > 2 {
        let mut bind_args = vec![func.clone()];
        bind_args.extend(args.iter().skip(2).cloned());
        bind(&bind_args)?
    } else {
        func.text.clone()
    };
    Some(format!("setTimeout({}, {})", callable, millis.text))
}

lazy_static! {
    pub static ref CALL_RULES: Vec<CallRule> = vec![
        CallRule::new("Ext.Array.contains", 2, 2, |a| {
            Some(format!("{}.includes({})", wrap_receiver(&a[0].text), a[1].text))
        }, None),
        CallRule::new("Ext.Array.each", 2, 2, |a| {
            Some(format!("{}.forEach({})", wrap_receiver(&a[0].text), a[1].text))
        }, None),
        CallRule::new("Ext.Array.indexOf", 2, 3, |a| {
            let rest: Vec<&CallArg> = a.iter().skip(1).collect();
            Some(format!("{}.indexOf({})", wrap_receiver(&a[0].text), join_args(&rest)))
        }, None),
        CallRule::new("Ext.Array.map", 2, 3, |a| {
            let rest: Vec<&CallArg> = a.iter().skip(1).collect();
            Some(format!("{}.map({})", wrap_receiver(&a[0].text), join_args(&rest)))
        }, None),
        CallRule::new("Ext.Function.bind", 1, 4, bind, None),
        CallRule::new("Ext.Number.toFixed", 2, 2, |a| {
            Some(format!("{}.toFixed({})", wrap_receiver(&a[0].text), a[1].text))
        }, None),
        CallRule::new("Ext.Object.each", 2, 2, |a| {
            if !a[1].is_function {
                return None;
            }
            Some(format!("_.forEach({}, {})", a[0].text, a[1].with_swapped_params()?))
        }, Some(LIB_LODASH)),
        CallRule::new("Ext.Object.getSize", 1, 1, |a| {
            Some(format!("Object.keys({}).length", a[0].text))
        }, None),
        CallRule::new("Ext.String.leftPad", 2, 3, |a| {
            let rest: Vec<&CallArg> = a.iter().skip(1).collect();
            Some(format!("{}.padStart({})", wrap_receiver(&a[0].text), join_args(&rest)))
        }, None),
        CallRule::new("Ext.String.trim", 1, 1, |a| {
            Some(format!("{}.trim()", wrap_receiver(&a[0].text)))
        }, None),
        CallRule::new("Ext.defer", 2, 5, defer, None),
        CallRule::new("Ext.apply", 2, 3, |a| {
            let defaults = a.get(2).map(|d| format!(", {}", d.text)).unwrap_or_default();
            Some(format!("Object.assign({}{}, {})", a[0].text, defaults, a[1].text))
        }, None),
        CallRule::new("Ext.applyIf", 2, 2, |a| {
            Some(format!(
                "_.assignWith({}, {}, (objValue, srcValue) => _.isUndefined(objValue) ? srcValue : objValue)",
                a[0].text, a[1].text
            ))
        }, Some(LIB_LODASH)),
        CallRule::new("Ext.isNumeric", 1, 1, |a| {
            let value = if ast::is_simple_reference(&a[0].text) {
                a[0].text.clone()
            } else {
                format!("({})", a[0].text)
            };
            Some(format!("_.isFinite(+{})", value))
        }, Some(LIB_LODASH)),
    ];
}

pub fn find_call_rule(callee: &str) -> Option<&'static CallRule> {
    let callee = canonical_callee(callee);
    CALL_RULES.iter().find(|rule| rule.pattern.matches(callee))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(call: &str) -> Vec<CallArg> {
        ast::with_expression(call, |expr| match expr {
            Expression::CallExpression(c) => c
                .arguments
                .iter()
                .map(|a| CallArg::from_argument(a, call))
                .collect(),
            _ => Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_pattern_wildcards() {
        let pattern = Pattern::new("*.app.*");
        assert_eq!(
            pattern.captures("MyApp.app.getStore"),
            Some(vec!["MyApp".to_string(), "getStore".to_string()])
        );
        assert!(!pattern.matches("App.getStore"));
        assert!(!Pattern::new("Ext.isEmpty").matches("Ext.IsEmpty"));
    }

    #[test]
    fn test_member_rules() {
        assert_eq!(find_member_rule("Ext.isEmpty").unwrap().apply("Ext.isEmpty").unwrap(), "_.isEmpty");
        let encode = find_member_rule("Ext.encode").unwrap();
        assert_eq!(encode.apply(canonical_callee("Ext.encode")).unwrap(), "JSON.stringify");
        assert_eq!(find_member_rule("Ext.emptyFn").unwrap().apply("Ext.emptyFn").unwrap(), "(() => {})");
        assert!(find_member_rule("_.isEmpty").is_none());
    }

    #[test]
    fn test_contains_with_conditional_receiver() {
        let rule = find_call_rule("Ext.Array.contains").unwrap();
        let out = rule.apply(&args("Ext.Array.contains(a ? b : c, 1)")).unwrap();
        assert_eq!(out, "(a ? b : c).includes(1)");
    }

    #[test]
    fn test_bind_declines_on_prepended_args() {
        let rule = find_call_rule("Ext.bind").unwrap();
        assert_eq!(
            rule.apply(&args("Ext.bind(fn, this)")).unwrap(),
            "fn.bind(this)"
        );
        assert_eq!(
            rule.apply(&args("Ext.bind(fn, this, [1, 2], 0)")).unwrap(),
            "fn.bind(this, 1, 2)"
        );
        assert!(rule.apply(&args("Ext.bind(fn, this, [1, 2])")).is_none());
        assert!(rule.apply(&args("Ext.bind(fn, this, [1], true)")).is_none());
    }

    #[test]
    fn test_object_each_swaps_params() {
        let rule = find_call_rule("Ext.Object.each").unwrap();
        let out = rule
            .apply(&args("Ext.Object.each(obj, function(key, value) { log(key, value); })"))
            .unwrap();
        assert_eq!(out, "_.forEach(obj, function(value, key){ log(key, value); })");
        assert!(rule.apply(&args("Ext.Object.each(obj, fn, this)")).is_none());
    }

    #[test]
    fn test_apply_defer_and_numeric() {
        assert_eq!(
            find_call_rule("Ext.apply").unwrap().apply(&args("Ext.apply(a, b, c)")).unwrap(),
            "Object.assign(a, c, b)"
        );
        assert_eq!(
            find_call_rule("Ext.defer").unwrap().apply(&args("Ext.defer(fn, 10, this)")).unwrap(),
            "setTimeout(fn.bind(this), 10)"
        );
        assert_eq!(
            find_call_rule("Ext.isNumeric").unwrap().apply(&args("Ext.isNumeric(a + b)")).unwrap(),
            "_.isFinite(+(a + b))"
        );
        assert!(find_call_rule("Ext.Array.each")
            .unwrap()
            .apply(&args("Ext.Array.each(a, fn, this)"))
            .is_none());
    }
}

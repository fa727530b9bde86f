//! Defines the [`Value`] and [`Context`] types and the [`render`] function,
//! which implements the site's minimal template language.
//!
//! The language has exactly three constructs:
//!
//! * `{{#each KEY}}...{{/each}}` repeats its body once per element of the
//!   sequence `KEY`, substituting the element's scalar properties.
//! * `{{#if KEY}}...{{/if}}` keeps its body only when `KEY` is truthy.
//! * `{{KEY}}` is replaced by the string form of `KEY`.
//!
//! Rendering is three flat passes over the whole template, always in the
//! order above. Blocks do not nest: an `{{#each}}` inside another block's
//! body is left as literal text. Unknown `{{KEY}}` tokens are left verbatim
//! so that a rendered page can be fed through a second (layout) render
//! without losing placeholders meant for it. Nothing is HTML-escaped.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EACH_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#each ([A-Za-z0-9_]+)\}\}(.*?)\{\{/each\}\}").unwrap()
});

static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{#if ([A-Za-z0-9_]+)\}\}(.*?)\{\{/if\}\}").unwrap()
});

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// A value which can be bound to a key in a [`Context`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Number(i64),
    Bool(bool),

    /// A sequence of records, consumed by `{{#each}}`.
    List(Vec<Context>),
}

impl Value {
    /// Mirrors the legacy truthiness rules: empty strings, zero and `false`
    /// are falsy; every list (even an empty one) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(_) => true,
        }
    }

    /// Returns true for values which can be substituted inside a loop body.
    fn is_scalar(&self) -> bool {
        !matches!(self, Value::List(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            // Records have no useful flat form.
            Value::List(_) => Ok(()),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Value {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Value {
        Value::Number(n as i64)
    }
}

impl From<Vec<Context>> for Value {
    fn from(items: Vec<Context>) -> Value {
        Value::List(items)
    }
}

/// The data a template is rendered against. Keys are kept sorted so that
/// loop substitution happens in a deterministic order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// Returns a copy of the context with `key` bound to `value`. Existing
    /// bindings for `key` are replaced.
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Context {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a new context holding the bindings of `self` overridden by
    /// those of `other`. Neither input is modified.
    pub fn merged(&self, other: &Context) -> Context {
        let mut merged = self.clone();
        for (k, v) in other.0.iter() {
            merged.0.insert(k.clone(), v.clone());
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Context {
        Context(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Renders `template` against `context`. See the module documentation for
/// the language. Rendering never fails; anything unresolved is left in the
/// output as written.
pub fn render(template: &str, context: &Context) -> String {
    let looped = render_loops(template, context);
    let conditioned = render_conditionals(&looped, context);
    render_variables(&conditioned, context)
}

fn render_loops(template: &str, context: &Context) -> String {
    EACH_BLOCK
        .replace_all(template, |caps: &Captures| {
            let body = &caps[2];
            match context.get(&caps[1]) {
                Some(Value::List(items)) => items
                    .iter()
                    .map(|item| instantiate(body, item))
                    .collect::<String>(),
                _ => String::new(),
            }
        })
        .into_owned()
}

// Substitutes every scalar property of `item` into one copy of a loop body.
fn instantiate(body: &str, item: &Context) -> String {
    let mut out = body.to_owned();
    // Properties go in sorted key order, not declaration order. A `{{key}}`
    // token inside an earlier property's value is rewritten by a later one,
    // e.g. `{{title}}` inside `excerpt` becomes the element's own title.
    for (key, value) in item.iter().filter(|(_, v)| v.is_scalar()) {
        let token = format!("{{{{{}}}}}", key);
        if out.contains(&token) {
            out = out.replace(&token, &value.to_string());
        }
    }
    out
}

fn render_conditionals(template: &str, context: &Context) -> String {
    IF_BLOCK
        .replace_all(template, |caps: &Captures| {
            match context.get(&caps[1]) {
                Some(value) if value.is_truthy() => caps[2].to_owned(),
                _ => String::new(),
            }
        })
        .into_owned()
}

fn render_variables(template: &str, context: &Context) -> String {
    VARIABLE
        .replace_all(template, |caps: &Captures| match context.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_owned(),
        })
        .into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    fn item(name: &str) -> Context {
        Context::new().with("name", name)
    }

    #[test]
    fn test_each_repeats_body_per_element() {
        let ctx = Context::new().with("items", vec![item("a"), item("b")]);
        assert_eq!(
            render("{{#each items}}<li>{{name}}</li>{{/each}}", &ctx),
            "<li>a</li><li>b</li>"
        );
    }

    #[test]
    fn test_each_over_missing_or_scalar_key_is_empty() {
        let ctx = Context::new().with("items", "not a list");
        assert_eq!(render("[{{#each items}}x{{/each}}]", &ctx), "[]");
        assert_eq!(render("[{{#each nothing}}x{{/each}}]", &ctx), "[]");
    }

    #[test]
    fn test_each_leaves_unknown_properties_for_later_passes() {
        let ctx = Context::new()
            .with("items", vec![item("a")])
            .with("basePath", "../");
        assert_eq!(
            render("{{#each items}}<a href=\"{{basePath}}x\">{{name}}</a>{{/each}}", &ctx),
            "<a href=\"../x\">a</a>"
        );
    }

    #[test]
    fn test_each_substitutes_properties_in_key_order() {
        let element = Context::new()
            .with("excerpt", "About {{title}}")
            .with("title", "Post");
        let ctx = Context::new()
            .with("items", vec![element])
            .with("title", "Page");
        assert_eq!(
            render("{{#each items}}{{excerpt}}{{/each}}", &ctx),
            "About Post"
        );
    }

    #[test]
    fn test_each_skips_list_properties() {
        let element = item("a").with("tags", vec![item("t")]);
        let ctx = Context::new().with("items", vec![element]);
        assert_eq!(
            render("{{#each items}}{{name}}:{{tags}}{{/each}}", &ctx),
            "a:{{tags}}"
        );
    }

    #[test]
    fn test_nested_each_is_not_recognized() {
        let ctx = Context::new().with("outer", vec![item("a")]);
        // The first `{{/each}}` closes the outer block; the rest is literal.
        assert_eq!(
            render("{{#each outer}}{{#each inner}}{{name}}{{/each}}!{{/each}}", &ctx),
            "{{#each inner}}a!{{/each}}"
        );
    }

    #[test]
    fn test_if() {
        let template = "{{#if show}}X{{/if}}";
        assert_eq!(render(template, &Context::new().with("show", false)), "");
        assert_eq!(render(template, &Context::new().with("show", true)), "X");
        assert_eq!(render(template, &Context::new()), "");
        assert_eq!(render(template, &Context::new().with("show", "")), "");
        assert_eq!(render(template, &Context::new().with("show", 0)), "");
        assert_eq!(render(template, &Context::new().with("show", "y")), "X");
        assert_eq!(
            render(template, &Context::new().with("show", Vec::<Context>::new())),
            "X"
        );
    }

    #[test]
    fn test_if_spans_lines() {
        let ctx = Context::new().with("hasPrev", true).with("prev", "p.html");
        assert_eq!(
            render("{{#if hasPrev}}\n<a href=\"{{prev}}\">\n{{/if}}", &ctx),
            "\n<a href=\"p.html\">\n"
        );
    }

    #[test]
    fn test_unknown_variable_passes_through() {
        assert_eq!(render("{{unknown}}", &Context::new()), "{{unknown}}");
    }

    #[test]
    fn test_variables() {
        let ctx = Context::new()
            .with("title", "Hello")
            .with("count", 3)
            .with("draft", false);
        assert_eq!(
            render("{{title}} ({{count}}) {{draft}} {{ title }}", &ctx),
            "Hello (3) false {{ title }}"
        );
    }

    #[test]
    fn test_passes_run_in_order() {
        // The loop emits an `{{#if}}` block which the conditional pass then
        // evaluates against the outer context.
        let ctx = Context::new()
            .with("items", vec![item("flag")])
            .with("flag", true);
        assert_eq!(
            render("{{#each items}}{{#if {{name}}}}yes{{/if}}{{/each}}", &ctx),
            "yes"
        );
    }

    #[test]
    fn test_no_html_escaping() {
        let ctx = Context::new().with("html", "<p>a & b</p>");
        assert_eq!(render("{{html}}", &ctx), "<p>a & b</p>");
    }

    #[test]
    fn test_merged_overrides_without_mutating() {
        let base = Context::new().with("a", 1).with("b", 2);
        let merged = base.merged(&Context::new().with("b", 3));
        assert_eq!(merged.get("b"), Some(&Value::Number(3)));
        assert_eq!(base.get("b"), Some(&Value::Number(2)));
    }
}

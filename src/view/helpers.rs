//! Template helpers available to every view, layout and partial.

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Environment, HtmlEscape};

/// Registers the built-in helpers on `env`.
pub fn register(env: &mut Environment<'_>) {
    env.add_function("default_to", default_to);
    env.add_filter("default_to", default_to);
    env.add_function("html_attribute", html_attribute);
    env.add_function("class_list", class_list);
}

/// `value` when it is truthy, `fallback` otherwise.
pub fn default_to(value: Option<Value>, fallback: Option<Value>) -> Value {
    match value {
        Some(value) if value.is_true() => value,
        _ => fallback.unwrap_or_default(),
    }
}

/// Renders ` name="value"`, a bare ` name` for `true`, or nothing for
/// falsy values.
pub fn html_attribute(name: &str, value: Option<Value>) -> Value {
    match value {
        Some(value) if value.kind() == ValueKind::Bool && value.is_true() => {
            Value::from_safe_string(format!(" {name}"))
        }
        Some(value) if value.is_true() => Value::from_safe_string(format!(
            " {}=\"{}\"",
            name,
            HtmlEscape(&value.to_string())
        )),
        _ => Value::from(""),
    }
}

/// Joins the non-empty string arguments with single spaces.
pub fn class_list(classes: Rest<Value>) -> String {
    classes
        .iter()
        .filter_map(|class| class.as_str())
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

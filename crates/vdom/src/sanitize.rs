//! XSS guards applied by the public node and attribute constructors.
//!
//! Tabs and other whitespace may appear inside a URL scheme and browsers
//! still honour it (`"\tjava\tSCRIPT:alert(1)"` runs), so the scheme patterns
//! allow whitespace between every letter.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("invalid sanitizer pattern {pattern}: {e}"))
    })
}

fn re_script() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^script$")
}

fn re_on_form_action() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^(on|formAction$)")
}

fn re_js() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^\s*j\s*a\s*v\s*a\s*s\s*c\s*r\s*i\s*p\s*t\s*:")
}

fn re_js_html() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"^\s*(j\s*a\s*v\s*a\s*s\s*c\s*r\s*i\s*p\s*t\s*:|d\s*a\s*t\s*a\s*:\s*t\s*e\s*x\s*t\s*/\s*h\s*t\s*m\s*l\s*(,|;))",
    )
}

/// `script` elements are rendered as `p`.
pub fn no_script(tag: &str) -> &str {
    if re_script().is_match(tag) {
        "p"
    } else {
        tag
    }
}

/// Event-handler attributes (`on*`) and `formAction` become `data-*`.
pub fn no_on_or_form_action(key: &str) -> String {
    if re_on_form_action().is_match(key) {
        format!("data-{key}")
    } else {
        key.to_owned()
    }
}

pub fn no_inner_html_or_form_action(key: &str) -> String {
    if key == "innerHTML" || key == "formAction" {
        format!("data-{key}")
    } else {
        key.to_owned()
    }
}

pub fn no_javascript_uri(value: &str) -> &str {
    if re_js().is_match(value) {
        ""
    } else {
        value
    }
}

pub fn no_javascript_or_html_uri(value: &str) -> &str {
    if re_js_html().is_match(value) {
        ""
    } else {
        value
    }
}

pub fn no_javascript_or_html_json(value: Value) -> Value {
    match &value {
        Value::String(s) if re_js_html().is_match(s) => Value::String(String::new()),
        _ => value,
    }
}

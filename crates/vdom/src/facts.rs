//! Facts: the property, style, attribute and event bag of a node.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::handler::{Handler, TaggerFn};
use crate::sanitize::{
    no_inner_html_or_form_action, no_javascript_or_html_json, no_javascript_or_html_uri,
    no_on_or_form_action,
};

// ── Attribute list entries ────────────────────────────────────────────────

pub enum Attribute<Msg> {
    Event { name: String, handler: Handler<Msg> },
    Style { key: String, value: String },
    Property { key: String, value: Value },
    Attr { key: String, value: String },
    AttrNs { namespace: String, key: String, value: String },
}

impl<Msg> Clone for Attribute<Msg> {
    fn clone(&self) -> Self {
        match self {
            Attribute::Event { name, handler } => Attribute::Event {
                name: name.clone(),
                handler: handler.clone(),
            },
            Attribute::Style { key, value } => Attribute::Style {
                key: key.clone(),
                value: value.clone(),
            },
            Attribute::Property { key, value } => Attribute::Property {
                key: key.clone(),
                value: value.clone(),
            },
            Attribute::Attr { key, value } => Attribute::Attr {
                key: key.clone(),
                value: value.clone(),
            },
            Attribute::AttrNs { namespace, key, value } => Attribute::AttrNs {
                namespace: namespace.clone(),
                key: key.clone(),
                value: value.clone(),
            },
        }
    }
}

pub fn on<Msg>(name: &str, handler: Handler<Msg>) -> Attribute<Msg> {
    Attribute::Event {
        name: name.to_owned(),
        handler,
    }
}

pub fn style<Msg>(key: &str, value: &str) -> Attribute<Msg> {
    Attribute::Style {
        key: key.to_owned(),
        value: value.to_owned(),
    }
}

/// A DOM property. `innerHTML` is renamed away and script URIs are blanked.
pub fn property<Msg>(key: &str, value: Value) -> Attribute<Msg> {
    Attribute::Property {
        key: no_inner_html_or_form_action(key),
        value: no_javascript_or_html_json(value),
    }
}

/// A string property set as is; used by helpers like `value` and `class`
/// whose contents are user text.
pub fn string_property<Msg>(key: &str, value: &str) -> Attribute<Msg> {
    Attribute::Property {
        key: key.to_owned(),
        value: Value::String(value.to_owned()),
    }
}

pub fn bool_property<Msg>(key: &str, value: bool) -> Attribute<Msg> {
    Attribute::Property {
        key: key.to_owned(),
        value: Value::Bool(value),
    }
}

pub fn attribute<Msg>(key: &str, value: &str) -> Attribute<Msg> {
    Attribute::Attr {
        key: no_on_or_form_action(key),
        value: no_javascript_or_html_uri(value).to_owned(),
    }
}

pub fn attribute_ns<Msg>(namespace: &str, key: &str, value: &str) -> Attribute<Msg> {
    Attribute::AttrNs {
        namespace: namespace.to_owned(),
        key: no_on_or_form_action(key),
        value: no_javascript_or_html_uri(value).to_owned(),
    }
}

/// Adds to the `className` property; repeated classes accumulate.
pub fn class<Msg>(name: &str) -> Attribute<Msg> {
    string_property("className", name)
}

/// Maps the message of an event attribute; other attributes pass through.
pub fn map_attribute<Msg: 'static>(f: TaggerFn<Msg>, attr: Attribute<Msg>) -> Attribute<Msg> {
    match attr {
        Attribute::Event { name, handler } => Attribute::Event {
            name,
            handler: handler.map(f),
        },
        other => other,
    }
}

// ── Facts ─────────────────────────────────────────────────────────────────

const CLASS_NAME: &str = "className";
const CLASS: &str = "class";

/// Facts of one node, partitioned by category. A key appears at most once
/// per category.
pub struct Facts<Msg> {
    pub props: IndexMap<String, Value>,
    pub styles: IndexMap<String, String>,
    pub attrs: IndexMap<String, String>,
    /// `key -> (namespace, value)`.
    pub attrs_ns: IndexMap<String, (String, String)>,
    pub events: IndexMap<String, Handler<Msg>>,
}

impl<Msg> Default for Facts<Msg> {
    fn default() -> Self {
        Facts {
            props: IndexMap::new(),
            styles: IndexMap::new(),
            attrs: IndexMap::new(),
            attrs_ns: IndexMap::new(),
            events: IndexMap::new(),
        }
    }
}

impl<Msg> fmt::Debug for Facts<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facts")
            .field("props", &self.props)
            .field("styles", &self.styles)
            .field("attrs", &self.attrs)
            .field("attrs_ns", &self.attrs_ns)
            .field("events", &self.events)
            .finish()
    }
}

fn add_class(existing: Option<&str>, class: &str) -> String {
    match existing {
        Some(classes) if !classes.is_empty() => format!("{classes} {class}"),
        _ => class.to_owned(),
    }
}

impl<Msg> Facts<Msg> {
    /// Builds facts from an attribute list. Later declarations overwrite
    /// earlier ones, except `className` properties and `class` attributes,
    /// which are joined with a space.
    pub fn organize(list: Vec<Attribute<Msg>>) -> Self {
        let mut facts = Facts::default();
        for attr in list {
            match attr {
                Attribute::Event { name, handler } => {
                    facts.events.insert(name, handler);
                }
                Attribute::Style { key, value } => {
                    facts.styles.insert(key, value);
                }
                Attribute::Property { key, value } => {
                    let value = match value {
                        Value::String(class) if key == CLASS_NAME => {
                            let existing = facts.props.get(CLASS_NAME).and_then(Value::as_str);
                            Value::String(add_class(existing, &class))
                        }
                        other => other,
                    };
                    facts.props.insert(key, value);
                }
                Attribute::Attr { key, value } => {
                    let value = if key == CLASS {
                        add_class(facts.attrs.get(CLASS).map(String::as_str), &value)
                    } else {
                        value
                    };
                    facts.attrs.insert(key, value);
                }
                Attribute::AttrNs { namespace, key, value } => {
                    facts.attrs_ns.insert(key, (namespace, value));
                }
            }
        }
        facts
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
            && self.styles.is_empty()
            && self.attrs.is_empty()
            && self.attrs_ns.is_empty()
            && self.events.is_empty()
    }
}

// ── Diff ──────────────────────────────────────────────────────────────────

/// Changes to apply to a node's facts. Removals are encoded per category:
/// an empty string for styles, `""` or `null` for properties (by the old
/// value's type), and `None` for attributes and events.
pub struct FactsDiff<Msg> {
    pub props: IndexMap<String, Value>,
    pub styles: IndexMap<String, String>,
    pub attrs: IndexMap<String, Option<String>>,
    pub attrs_ns: IndexMap<String, (String, Option<String>)>,
    pub events: IndexMap<String, Option<Handler<Msg>>>,
}

impl<Msg> Default for FactsDiff<Msg> {
    fn default() -> Self {
        FactsDiff {
            props: IndexMap::new(),
            styles: IndexMap::new(),
            attrs: IndexMap::new(),
            attrs_ns: IndexMap::new(),
            events: IndexMap::new(),
        }
    }
}

impl<Msg> fmt::Debug for FactsDiff<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactsDiff")
            .field("props", &self.props)
            .field("styles", &self.styles)
            .field("attrs", &self.attrs)
            .field("attrs_ns", &self.attrs_ns)
            .field("events", &self.events)
            .finish()
    }
}

impl<Msg> FactsDiff<Msg> {
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
            && self.styles.is_empty()
            && self.attrs.is_empty()
            && self.attrs_ns.is_empty()
            && self.events.is_empty()
    }
}

/// Everything in `facts`, as if diffed against nothing.
impl<Msg> From<&Facts<Msg>> for FactsDiff<Msg> {
    fn from(facts: &Facts<Msg>) -> Self {
        FactsDiff {
            props: facts.props.clone(),
            styles: facts.styles.clone(),
            attrs: facts.attrs.iter().map(|(k, v)| (k.clone(), Some(v.clone()))).collect(),
            attrs_ns: facts
                .attrs_ns
                .iter()
                .map(|(k, (ns, v))| (k.clone(), (ns.clone(), Some(v.clone()))))
                .collect(),
            events: facts.events.iter().map(|(k, h)| (k.clone(), Some(h.clone()))).collect(),
        }
    }
}

/// `value` and `checked` track live user input, so they are always
/// re-emitted and the patcher compares them against the node instead.
fn always_emit(key: &str) -> bool {
    key == "value" || key == "checked"
}

fn diff_category<V, D>(
    old: &IndexMap<String, V>,
    new: &IndexMap<String, V>,
    out: &mut IndexMap<String, D>,
    same: impl Fn(&V, &V) -> bool,
    removed: impl Fn(&V) -> D,
    changed: impl Fn(&V) -> D,
) {
    for (key, x) in old {
        match new.get(key) {
            None => {
                out.insert(key.clone(), removed(x));
            }
            Some(y) if same(x, y) && !always_emit(key) => {}
            Some(y) => {
                out.insert(key.clone(), changed(y));
            }
        }
    }
    for (key, y) in new {
        if !old.contains_key(key) {
            out.insert(key.clone(), changed(y));
        }
    }
}

pub fn diff_facts<Msg: 'static>(old: &Facts<Msg>, new: &Facts<Msg>) -> FactsDiff<Msg> {
    let mut diff = FactsDiff::default();
    diff_category(
        &old.props,
        &new.props,
        &mut diff.props,
        |x, y| x == y,
        |x| match x {
            Value::String(_) => Value::String(String::new()),
            _ => Value::Null,
        },
        Value::clone,
    );
    diff_category(
        &old.styles,
        &new.styles,
        &mut diff.styles,
        |x, y| x == y,
        |_| String::new(),
        String::clone,
    );
    diff_category(
        &old.attrs,
        &new.attrs,
        &mut diff.attrs,
        |x, y| x == y,
        |_| None,
        |y| Some(y.clone()),
    );
    diff_category(
        &old.attrs_ns,
        &new.attrs_ns,
        &mut diff.attrs_ns,
        |x, y| x == y,
        |(ns, _)| (ns.clone(), None),
        |(ns, v)| (ns.clone(), Some(v.clone())),
    );
    diff_category(
        &old.events,
        &new.events,
        &mut diff.events,
        |x, y| x.same_as(y),
        |_| None,
        |y| Some(y.clone()),
    );
    diff
}

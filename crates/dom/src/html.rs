//! HTML serializer for document subtrees.
//!
//! Attributes are emitted in insertion order, then namespaced attributes,
//! then inline styles as a single `style` attribute (unless an explicit
//! `style` attribute exists). Properties are not part of the markup.

use crate::document::Document;
use crate::types::{ElementData, NodeId, NodeKind};

/// Escape text content: `<`, `>`, `&` and characters in U+00A0–U+9999
/// become numeric character references.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let code = ch as u32;
        if ch == '<' || ch == '>' || ch == '&' || (0x00A0..=0x9999).contains(&code) {
            out.push_str(&format!("&#{};", code));
        } else {
            out.push(ch);
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Serialize the subtree at `node` to HTML.
///
/// - `tab`: indentation string (e.g. `"  "`); use `""` for compact output.
/// - `indent`: current indentation prefix (used in recursion).
pub fn to_html(doc: &Document, node: NodeId, tab: &str, indent: &str) -> String {
    match doc.kind(node) {
        NodeKind::Text(s) => format!("{}{}", indent, escape_text(s)),
        NodeKind::Fragment => children_to_html(doc, node, tab, indent, true).0,
        NodeKind::Element(el) => element_to_html(doc, node, el, tab, indent),
    }
}

/// Returns the serialized children and whether they were all text.
fn children_to_html(
    doc: &Document,
    node: NodeId,
    tab: &str,
    indent: &str,
    is_fragment: bool,
) -> (String, bool) {
    let children = doc.child_nodes(node);
    let text_only = children.iter().all(|&c| doc.kind(c).is_text());
    if text_only {
        let s = children
            .iter()
            .filter_map(|&c| doc.text(c))
            .map(escape_text)
            .collect::<String>();
        return (s, true);
    }

    let children_indent = if is_fragment {
        indent.to_owned()
    } else {
        format!("{}{}", indent, tab)
    };
    let mut s = String::new();
    for (i, &child) in children.iter().enumerate() {
        if !tab.is_empty() && (!is_fragment || i > 0) {
            s.push('\n');
        }
        s.push_str(&to_html(doc, child, tab, &children_indent));
    }
    (s, false)
}

fn attrs_to_html(el: &ElementData) -> String {
    let mut out = String::new();
    let mut push = |k: &str, v: &str| {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape_attr(v));
        out.push('"');
    };
    for (k, v) in &el.attributes {
        push(k, v);
    }
    for ((_, k), v) in &el.attributes_ns {
        push(k, v);
    }
    if !el.styles.is_empty() && !el.attributes.contains_key("style") {
        let css = el
            .styles
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        push("style", &css);
    }
    out
}

fn element_to_html(
    doc: &Document,
    node: NodeId,
    el: &ElementData,
    tab: &str,
    indent: &str,
) -> String {
    let (children_str, text_only) = children_to_html(doc, node, tab, indent, false);
    let html_head = format!("<{}{}", el.tag, attrs_to_html(el));
    if children_str.is_empty() {
        return format!("{}{} />", indent, html_head);
    }
    let closing_indent = if !tab.is_empty() && !text_only {
        format!("\n{}", indent)
    } else {
        String::new()
    };
    format!(
        "{}{}>{}{}</{}>",
        indent, html_head, children_str, closing_indent, el.tag
    )
}

impl Document {
    /// Compact HTML of the subtree at `node`.
    pub fn outer_html(&self, node: NodeId) -> String {
        to_html(self, node, "", "")
    }
}

//! Reads an existing real subtree back into a virtual tree, so server
//! rendered markup can be adopted by the first diff instead of rebuilt.

use haskle_dom::{Document, NodeId, NodeKind};

use crate::facts::Attribute;
use crate::node::{element, text, VNode};

/// Text stays text, elements keep their plain attributes and children, and
/// anything else reads as empty text. Attributes are taken as they are:
/// they are already in the document, so there is nothing to guard.
pub fn virtualize<Msg>(doc: &Document, node: NodeId) -> VNode<Msg> {
    match doc.kind(node) {
        NodeKind::Text(content) => text(content.as_str()),
        NodeKind::Fragment => text(""),
        NodeKind::Element(el) => {
            let attributes = el
                .attributes
                .iter()
                .map(|(key, value)| Attribute::Attr {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect();
            let children = doc
                .child_nodes(node)
                .iter()
                .map(|&child| virtualize(doc, child))
                .collect();
            element(None, &el.tag.to_lowercase(), attributes, children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn reads_elements_text_and_attributes() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        doc.set_attribute(div, "id", "app").unwrap();
        let t = doc.create_text_node("hi");
        doc.append_child(div, t).unwrap();

        let vnode: VNode<()> = virtualize(&doc, div);
        let Node::Element { tag, facts, children, .. } = vnode.node() else {
            panic!("expected an element, got {vnode:?}");
        };
        assert_eq!(tag, "div");
        assert_eq!(facts.attrs.get("id").map(String::as_str), Some("app"));
        assert!(matches!(children[0].node(), Node::Text(s) if s == "hi"));
        assert_eq!(vnode.descendants(), 1);
    }

    #[test]
    fn fragments_read_as_empty_text() {
        let mut doc = Document::new();
        let frag = doc.create_document_fragment();
        let vnode: VNode<()> = virtualize(&doc, frag);
        assert!(matches!(vnode.node(), Node::Text(s) if s.is_empty()));
    }
}

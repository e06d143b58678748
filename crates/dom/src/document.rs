//! The document arena and its DOM-style operations.
//!
//! Structural operations follow DOM semantics: inserting a node that already
//! has a parent moves it, inserting a fragment moves the fragment's children
//! and leaves the fragment empty. Passing a [`NodeId`] that was not produced
//! by this document is a programming error and panics, like indexing a `Vec`
//! out of bounds.

use std::rc::Rc;

use serde_json::Value;

use crate::event::{Event, EventListener, ListenerOptions, Registration};
use crate::types::{DomError, ElementData, NodeId, NodeKind};

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Registration>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

/// An in-memory document: the "real" tree the reconciler renders into.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created (attached or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Creation ──────────────────────────────────────────────────────────

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag, None)))
    }

    pub fn create_element_ns(&mut self, namespace: &str, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(tag, Some(namespace))))
    }

    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_owned()))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.idx()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.idx()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.data(id).children.get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.data(id).children.len()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.data(id).kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.data_mut(id).kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|el| el.namespace.as_deref())
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.data(id).kind {
            NodeKind::Text(s) => out.push_str(s),
            _ => {
                for &child in &self.data(id).children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut curr = Some(node);
        while let Some(id) = curr {
            if id == ancestor {
                return true;
            }
            curr = self.data(id).parent;
        }
        false
    }

    // ── Character data ────────────────────────────────────────────────────

    /// Replaces the whole character data of a text node.
    pub fn replace_data(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.data_mut(id).kind {
            NodeKind::Text(s) => {
                s.clear();
                s.push_str(text);
                Ok(())
            }
            _ => Err(DomError::NotAText(id)),
        }
    }

    // ── Tree mutation ─────────────────────────────────────────────────────

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` before `reference`, or at the end when `reference` is
    /// `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if self.data(parent).kind.is_text() || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            if self.data(r).parent != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }

        if matches!(self.data(child).kind, NodeKind::Fragment) {
            let moved = std::mem::take(&mut self.data_mut(child).children);
            for &c in &moved {
                self.data_mut(c).parent = None;
            }
            let at = self.position(parent, reference);
            for (offset, &c) in moved.iter().enumerate() {
                self.data_mut(c).parent = Some(parent);
                self.data_mut(parent).children.insert(at + offset, c);
            }
            return Ok(());
        }

        // Inserting a node before itself keeps it in place.
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };
        self.detach(child);
        let at = self.position(parent, reference);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(parent).children.insert(at, child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.data(child).parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child);
        Ok(())
    }

    /// Puts `new` where `old` is and detaches `old`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), DomError> {
        if self.data(old).parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child: old });
        }
        if new == old {
            return Ok(());
        }
        self.insert_before(parent, new, Some(old))?;
        self.detach(old);
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.data_mut(child).parent.take() {
            self.data_mut(parent).children.retain(|&c| c != child);
        }
    }

    fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.data(id).parent?;
        let siblings = &self.data(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    fn position(&self, parent: NodeId, reference: Option<NodeId>) -> usize {
        let children = &self.data(parent).children;
        reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len())
    }

    // ── Attributes ────────────────────────────────────────────────────────

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> Result<(), DomError> {
        self.element_mut(id)?.attributes.shift_remove(key);
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)?.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes_ns
            .insert((namespace.to_owned(), key.to_owned()), value.to_owned());
        Ok(())
    }

    pub fn remove_attribute_ns(
        &mut self,
        id: NodeId,
        namespace: &str,
        key: &str,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes_ns
            .shift_remove(&(namespace.to_owned(), key.to_owned()));
        Ok(())
    }

    pub fn attribute_ns(&self, id: NodeId, namespace: &str, key: &str) -> Option<&str> {
        self.element(id)?
            .attributes_ns
            .get(&(namespace.to_owned(), key.to_owned()))
            .map(String::as_str)
    }

    // ── Properties & styles ───────────────────────────────────────────────

    pub fn set_property(&mut self, id: NodeId, key: &str, value: Value) -> Result<(), DomError> {
        self.element_mut(id)?.properties.insert(key.to_owned(), value);
        Ok(())
    }

    pub fn property(&self, id: NodeId, key: &str) -> Option<&Value> {
        self.element(id)?.properties.get(key)
    }

    /// Sets one inline style declaration; an empty value removes it.
    pub fn set_style(&mut self, id: NodeId, key: &str, value: &str) -> Result<(), DomError> {
        let styles = &mut self.element_mut(id)?.styles;
        if value.is_empty() {
            styles.shift_remove(key);
        } else {
            styles.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }

    pub fn style(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id)?.styles.get(key).map(String::as_str)
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        name: &str,
        listener: Rc<dyn EventListener>,
        options: ListenerOptions,
    ) {
        let listeners = &mut self.data_mut(id).listeners;
        if listeners.iter().any(|r| r.is(name, &listener)) {
            return;
        }
        listeners.push(Registration {
            name: name.to_owned(),
            listener,
            options,
        });
    }

    pub fn remove_event_listener(
        &mut self,
        id: NodeId,
        name: &str,
        listener: &Rc<dyn EventListener>,
    ) {
        self.data_mut(id).listeners.retain(|r| !r.is(name, listener));
    }

    pub fn listener_count(&self, id: NodeId, name: &str) -> usize {
        self.data(id)
            .listeners
            .iter()
            .filter(|r| r.name == name)
            .count()
    }

    /// Whether the listener registered for `name` on `id` is passive.
    pub fn listener_is_passive(&self, id: NodeId, name: &str) -> Option<bool> {
        self.data(id)
            .listeners
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.options.passive)
    }

    /// Fires an event at `target` and bubbles it to the root.
    ///
    /// Listeners on a node all run even if one of them stops propagation;
    /// the ancestors above that node are then skipped.
    pub fn dispatch_event(&self, target: NodeId, name: &str, payload: Value) -> Event {
        let mut event = Event::new(name, target, payload);
        let mut curr = Some(target);
        while let Some(id) = curr {
            let registrations: Vec<Registration> = self
                .data(id)
                .listeners
                .iter()
                .filter(|r| r.name == name)
                .cloned()
                .collect();
            event.current_target = Some(id);
            for reg in registrations {
                event.set_passive(reg.options.passive);
                reg.listener.handle_event(&mut event);
                event.set_passive(false);
            }
            if event.propagation_stopped() {
                log::trace!("{name} stopped at {id:?}");
                break;
            }
            curr = self.data(id).parent;
        }
        event.current_target = None;
        event
    }

    // ── Comparison ────────────────────────────────────────────────────────

    /// Structural equality of two subtrees (listeners are not compared).
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> bool {
        let (x, y) = (self.data(a), self.data(b));
        x.kind == y.kind
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.is_equal_node(ca, cb))
    }

    /// Like [`Document::is_equal_node`] but across two documents.
    pub fn is_equal_node_in(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let (x, y) = (self.data(a), other.data(b));
        x.kind == y.kind
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.is_equal_node_in(ca, other, cb))
    }
}

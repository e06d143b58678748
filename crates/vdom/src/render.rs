//! The reconciler and its renderer.
//!
//! [`Reconciler`] keeps a side table from real node to the data the virtual
//! tree hangs off it: the event root of a tagged subtree and the callbacks
//! bound for each event name. The indexer and patcher live in `index.rs`
//! and `apply.rs` as further `impl` blocks.

use std::collections::HashMap;
use std::rc::Rc;

use haskle_dom::{Document, EventListener, ListenerOptions, NodeId};
use indexmap::IndexMap;

use crate::error::ReconcileError;
use crate::event::{EventCallback, EventRoot};
use crate::facts::FactsDiff;
use crate::handler::{Handler, HandlerKind};
use crate::node::{Node, VNode};
use crate::options::Options;

struct NodeMeta<Msg> {
    event_root: Option<Rc<EventRoot<Msg>>>,
    callbacks: HashMap<String, Rc<EventCallback<Msg>>>,
}

impl<Msg> Default for NodeMeta<Msg> {
    fn default() -> Self {
        NodeMeta {
            event_root: None,
            callbacks: HashMap::new(),
        }
    }
}

pub struct Reconciler<Msg> {
    options: Options,
    nodes: HashMap<NodeId, NodeMeta<Msg>>,
}

impl<Msg: 'static> Reconciler<Msg> {
    pub fn new(options: Options) -> Self {
        Reconciler {
            options,
            nodes: HashMap::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    // ── Side table ────────────────────────────────────────────────────────

    /// Event root recorded on `node` by a tagger.
    pub fn event_root_of(&self, node: NodeId) -> Option<Rc<EventRoot<Msg>>> {
        self.nodes.get(&node).and_then(|meta| meta.event_root.clone())
    }

    pub(crate) fn set_event_root(&mut self, node: NodeId, root: Rc<EventRoot<Msg>>) {
        self.nodes.entry(node).or_default().event_root = Some(root);
    }

    /// The callback currently bound for `name` on `node`.
    pub fn callback(&self, node: NodeId, name: &str) -> Option<Rc<EventCallback<Msg>>> {
        self.nodes.get(&node)?.callbacks.get(name).cloned()
    }

    /// Drops side-table entries of a subtree that left the document.
    pub(crate) fn forget(&mut self, doc: &Document, node: NodeId) {
        self.nodes.remove(&node);
        for &child in doc.child_nodes(node) {
            self.forget(doc, child);
        }
    }

    // ── Render ────────────────────────────────────────────────────────────

    /// Builds real nodes for `vnode`. The result is detached.
    pub fn render(
        &mut self,
        doc: &mut Document,
        vnode: &VNode<Msg>,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<NodeId, ReconcileError> {
        match vnode.node() {
            Node::Thunk(thunk) => self.render(doc, thunk.force(), event_root),

            Node::Text(content) => Ok(doc.create_text_node(content)),

            Node::Tagger { .. } => {
                let (taggers, sub) = vnode
                    .tagger_chain()
                    .ok_or(ReconcileError::Invariant("tagger without a chain"))?;
                let sub_root = EventRoot::tagged(taggers, event_root.clone());
                let node = self.render(doc, sub, &sub_root)?;
                self.set_event_root(node, sub_root);
                Ok(node)
            }

            Node::Custom(custom) => {
                let node = (custom.render)(doc, &*custom.state)?;
                self.apply_facts(doc, node, event_root, &FactsDiff::from(&*custom.facts))?;
                Ok(node)
            }

            Node::Element {
                tag,
                namespace,
                facts,
                ..
            }
            | Node::KeyedElement {
                tag,
                namespace,
                facts,
                ..
            } => {
                let node = match namespace {
                    Some(ns) => doc.create_element_ns(ns, tag),
                    None => doc.create_element(tag),
                };
                self.apply_facts(doc, node, event_root, &FactsDiff::from(&**facts))?;
                for kid in vnode.kids() {
                    let child = self.render(doc, kid, event_root)?;
                    doc.append_child(node, child)?;
                }
                Ok(node)
            }
        }
    }

    // ── Facts ─────────────────────────────────────────────────────────────

    pub(crate) fn apply_facts(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        event_root: &Rc<EventRoot<Msg>>,
        diff: &FactsDiff<Msg>,
    ) -> Result<(), ReconcileError> {
        for (key, value) in &diff.props {
            // Do not clobber live input with an equal value.
            if (key == "value" || key == "checked") && doc.property(node, key) == Some(value) {
                continue;
            }
            doc.set_property(node, key, value.clone())?;
        }
        for (key, value) in &diff.styles {
            doc.set_style(node, key, value)?;
        }
        for (key, value) in &diff.attrs {
            match value {
                Some(value) => doc.set_attribute(node, key, value)?,
                None => doc.remove_attribute(node, key)?,
            }
        }
        for (key, (namespace, value)) in &diff.attrs_ns {
            match value {
                Some(value) => doc.set_attribute_ns(node, namespace, key, value)?,
                None => doc.remove_attribute_ns(node, namespace, key)?,
            }
        }
        if !diff.events.is_empty() {
            self.apply_events(doc, node, event_root, &diff.events);
        }
        Ok(())
    }

    fn apply_events(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        event_root: &Rc<EventRoot<Msg>>,
        events: &IndexMap<String, Option<Handler<Msg>>>,
    ) {
        let passive_listeners = self.options.passive_listeners;
        let callbacks = &mut self.nodes.entry(node).or_default().callbacks;

        for (name, handler) in events {
            let old = callbacks.get(name).cloned();
            let Some(handler) = handler else {
                if let Some(old) = old {
                    let listener: Rc<dyn EventListener> = old;
                    doc.remove_event_listener(node, name, &listener);
                    callbacks.remove(name);
                }
                continue;
            };

            if let Some(old) = old {
                if old.kind() == handler.kind() {
                    old.swap(handler.clone());
                    continue;
                }
                let listener: Rc<dyn EventListener> = old;
                doc.remove_event_listener(node, name, &listener);
            }

            let callback = Rc::new(EventCallback::new(handler.clone(), event_root.clone()));
            let passive = passive_listeners && handler.kind() < HandlerKind::MayPreventDefault;
            doc.add_event_listener(node, name, callback.clone(), ListenerOptions { passive });
            callbacks.insert(name.clone(), callback);
        }
    }
}

//! The driver a host keeps for one mounted view.

use std::rc::Rc;

use haskle_dom::{Document, Event, NodeId};
use serde_json::Value;

use crate::error::ReconcileError;
use crate::event::EventRoot;
use crate::node::VNode;
use crate::options::Options;
use crate::render::Reconciler;
use crate::virtualize::virtualize;

/// A mounted view: the tree last drawn, the real node it was drawn into and
/// the event root every listener delivers to.
pub struct VirtualDom<Msg> {
    reconciler: Reconciler<Msg>,
    tree: VNode<Msg>,
    root: NodeId,
    event_root: Rc<EventRoot<Msg>>,
}

impl<Msg: 'static> VirtualDom<Msg> {
    /// Renders `tree` and puts it where `placeholder` is.
    pub fn mount(
        doc: &mut Document,
        placeholder: NodeId,
        tree: VNode<Msg>,
        sink: impl Fn(Msg, bool) + 'static,
        options: Options,
    ) -> Result<Self, ReconcileError> {
        let mut reconciler = Reconciler::new(options);
        let event_root = EventRoot::root(sink);
        let root = reconciler.render(doc, &tree, &event_root)?;
        if let Some(parent) = doc.parent_node(placeholder) {
            doc.replace_child(parent, root, placeholder)?;
        }
        Ok(VirtualDom {
            reconciler,
            tree,
            root,
            event_root,
        })
    }

    /// Adopts the markup already at `node` and patches it into `tree`.
    pub fn hydrate(
        doc: &mut Document,
        node: NodeId,
        tree: VNode<Msg>,
        sink: impl Fn(Msg, bool) + 'static,
        options: Options,
    ) -> Result<Self, ReconcileError> {
        let mut reconciler = Reconciler::new(options);
        let event_root = EventRoot::root(sink);
        let existing = virtualize(doc, node);
        log::debug!(
            "hydrating {node:?} with {} existing descendants",
            existing.descendants()
        );
        let (root, _) = reconciler.diff_and_patch(doc, &existing, &tree, node, &event_root)?;
        Ok(VirtualDom {
            reconciler,
            tree,
            root,
            event_root,
        })
    }

    /// Patches the real tree from the retained tree to `tree`. Returns the
    /// number of top-level patches applied.
    pub fn update(
        &mut self,
        doc: &mut Document,
        tree: VNode<Msg>,
    ) -> Result<usize, ReconcileError> {
        let (root, count) =
            self.reconciler
                .diff_and_patch(doc, &self.tree, &tree, self.root, &self.event_root)?;
        self.tree = tree;
        self.root = root;
        Ok(count)
    }

    pub fn dispatch(&self, doc: &Document, target: NodeId, name: &str, payload: Value) -> Event {
        doc.dispatch_event(target, name, payload)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &VNode<Msg> {
        &self.tree
    }

    pub fn reconciler(&self) -> &Reconciler<Msg> {
        &self.reconciler
    }
}

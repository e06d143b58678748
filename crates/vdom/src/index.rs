//! Binds each patch to the real node it addresses.
//!
//! The old virtual tree and the real tree have the same shape, so one walk
//! over both, skipping every subtree whose index window holds no patch,
//! resolves all targets before anything is mutated.

use std::rc::Rc;

use haskle_dom::{Document, NodeId};

use crate::error::ReconcileError;
use crate::event::EventRoot;
use crate::node::{Node, VNode};
use crate::patch::{Patch, PatchKind};
use crate::render::Reconciler;

impl<Msg: 'static> Reconciler<Msg> {
    pub(crate) fn bind_targets(
        &self,
        doc: &Document,
        root: NodeId,
        vnode: &VNode<Msg>,
        patches: &mut [Patch<Msg>],
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<(), ReconcileError> {
        self.bind_help(doc, root, vnode, patches, 0, 0, vnode.descendants(), event_root)?;
        Ok(())
    }

    /// Binds patches from `i` on whose index falls in `low..=high`, the
    /// window covered by `vnode`. Returns the first patch left unbound.
    #[allow(clippy::too_many_arguments)]
    fn bind_help(
        &self,
        doc: &Document,
        node: NodeId,
        vnode: &VNode<Msg>,
        patches: &mut [Patch<Msg>],
        mut i: usize,
        mut low: usize,
        high: usize,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<usize, ReconcileError> {
        let Some(mut index) = patches.get(i).map(|p| p.index) else {
            return Ok(i);
        };
        if index > high {
            return Ok(i);
        }

        while index == low {
            let patch = &mut patches[i];
            patch.target = Some(node);
            patch.event_root = Some(event_root.clone());
            match &mut patch.kind {
                PatchKind::SubtreePatches(sub) => {
                    let Node::Thunk(thunk) = vnode.node() else {
                        return Err(ReconcileError::Invariant("subtree patches off a thunk"));
                    };
                    let cached = thunk
                        .cached()
                        .ok_or(ReconcileError::Invariant("thunk was never built"))?;
                    self.bind_help(doc, node, cached, sub, 0, 0, cached.descendants(), event_root)?;
                }
                PatchKind::ReorderKeyed(reorder) => {
                    self.bind_help(doc, node, vnode, &mut reorder.patches, 0, low, high, event_root)?;
                }
                PatchKind::RemoveKeyed(Some(mv)) => {
                    mv.entry.borrow_mut().dom = Some(node);
                    self.bind_help(doc, node, vnode, &mut mv.patches, 0, low, high, event_root)?;
                }
                _ => {}
            }

            i += 1;
            match patches.get(i) {
                Some(next) if next.index <= high => index = next.index,
                _ => return Ok(i),
            }
        }

        match vnode.node() {
            Node::Tagger { .. } => {
                let (_, sub) = vnode
                    .tagger_chain()
                    .ok_or(ReconcileError::Invariant("tagger without a chain"))?;
                let tagged = self
                    .event_root_of(node)
                    .ok_or(ReconcileError::Invariant("tagged node without an event root"))?;
                self.bind_help(doc, node, sub, patches, i, low + 1, high, &tagged)
            }

            Node::Element { .. } | Node::KeyedElement { .. } => {
                for (j, kid) in vnode.kids().enumerate() {
                    low += 1;
                    let next_low = low + kid.descendants();
                    if low <= index && index <= next_low {
                        let child = doc
                            .child_at(node, j)
                            .ok_or(ReconcileError::MissingChild { parent: node, index: j })?;
                        i = self.bind_help(doc, child, kid, patches, i, low, next_low, event_root)?;
                        match patches.get(i) {
                            Some(next) if next.index <= high => index = next.index,
                            _ => return Ok(i),
                        }
                    }
                    low = next_low;
                }
                Ok(i)
            }

            _ => Ok(i),
        }
    }
}

//! Applies bound patches to the real tree.

use std::rc::Rc;

use haskle_dom::{Document, NodeId};

use crate::diff::diff;
use crate::error::ReconcileError;
use crate::event::EventRoot;
use crate::node::VNode;
use crate::patch::{EntryRef, EntryState, Patch, PatchKind, Reorder};
use crate::render::Reconciler;

impl<Msg: 'static> Reconciler<Msg> {
    /// Diffs `old` against `new` and patches the real tree rooted at `root`,
    /// which must currently mirror `old`. Returns the root after patching
    /// (it changes when the root itself is redrawn) and the number of
    /// top-level patches applied.
    pub fn diff_and_patch(
        &mut self,
        doc: &mut Document,
        old: &VNode<Msg>,
        new: &VNode<Msg>,
        root: NodeId,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<(NodeId, usize), ReconcileError> {
        let patches = diff(old, new);
        let count = patches.len();
        log::trace!("{count} patches against {root:?}");
        let root = self.apply_patches(doc, root, old, patches, event_root)?;
        Ok((root, count))
    }

    pub fn apply_patches(
        &mut self,
        doc: &mut Document,
        root: NodeId,
        old: &VNode<Msg>,
        mut patches: Vec<Patch<Msg>>,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<NodeId, ReconcileError> {
        if patches.is_empty() {
            return Ok(root);
        }
        self.bind_targets(doc, root, old, &mut patches, event_root)?;
        self.apply_help(doc, root, &patches)
    }

    fn apply_help(
        &mut self,
        doc: &mut Document,
        mut root: NodeId,
        patches: &[Patch<Msg>],
    ) -> Result<NodeId, ReconcileError> {
        for patch in patches {
            let target = patch.target.ok_or(ReconcileError::Unbound(patch.index))?;
            let new = self.apply_patch(doc, target, patch)?;
            if target == root {
                root = new;
            }
        }
        Ok(root)
    }

    fn apply_patch(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        patch: &Patch<Msg>,
    ) -> Result<NodeId, ReconcileError> {
        let event_root = patch
            .event_root
            .as_ref()
            .ok_or(ReconcileError::Unbound(patch.index))?;

        match &patch.kind {
            PatchKind::Redraw(vnode) => self.apply_redraw(doc, node, vnode, event_root),

            PatchKind::ApplyFactsDiff(facts) => {
                self.apply_facts(doc, node, event_root, facts)?;
                Ok(node)
            }

            PatchKind::ReplaceText(content) => {
                doc.replace_data(node, content)?;
                Ok(node)
            }

            PatchKind::SubtreePatches(sub) => self.apply_help(doc, node, sub),

            PatchKind::RetagChain(taggers) => {
                let retagged = self
                    .event_root_of(node)
                    .is_some_and(|tagged| tagged.retag(taggers.clone()));
                if !retagged {
                    log::warn!("retag on {node:?} without a tagged event root");
                    let tagged = EventRoot::tagged(taggers.clone(), event_root.clone());
                    self.set_event_root(node, tagged);
                }
                Ok(node)
            }

            PatchKind::RemoveTrailing { from, count } => {
                for _ in 0..*count {
                    let child = doc.child_at(node, *from).ok_or(ReconcileError::MissingChild {
                        parent: node,
                        index: *from,
                    })?;
                    doc.remove_child(node, child)?;
                    self.forget(doc, child);
                }
                Ok(node)
            }

            PatchKind::AppendNew { from, children } => {
                let end = doc.child_at(node, *from);
                for kid in children {
                    let child = self.render(doc, kid, event_root)?;
                    doc.insert_before(node, child, end)?;
                }
                Ok(node)
            }

            PatchKind::RemoveKeyed(None) => {
                if let Some(parent) = doc.parent_node(node) {
                    doc.remove_child(parent, node)?;
                }
                self.forget(doc, node);
                Ok(node)
            }

            PatchKind::RemoveKeyed(Some(mv)) => {
                // Detached now, reinserted by the enclosing reorder.
                if let Some(parent) = doc.parent_node(node) {
                    doc.remove_child(parent, node)?;
                }
                let moved = self.apply_help(doc, node, &mv.patches)?;
                mv.entry.borrow_mut().dom = Some(moved);
                Ok(node)
            }

            PatchKind::ReorderKeyed(reorder) => self.apply_reorder(doc, node, reorder, event_root),

            PatchKind::ApplyCustomDiff(custom) => {
                let new = custom.apply(doc, node)?;
                if new != node {
                    if let Some(parent) = doc.parent_node(node) {
                        doc.replace_child(parent, new, node)?;
                    }
                }
                Ok(new)
            }
        }
    }

    fn apply_redraw(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        vnode: &VNode<Msg>,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<NodeId, ReconcileError> {
        let parent = doc.parent_node(node);
        let new = self.render(doc, vnode, event_root)?;
        if self.event_root_of(new).is_none() {
            if let Some(old_root) = self.event_root_of(node) {
                self.set_event_root(new, old_root);
            }
        }
        if let Some(parent) = parent {
            doc.replace_child(parent, new, node)?;
        }
        self.forget(doc, node);
        Ok(new)
    }

    fn apply_reorder(
        &mut self,
        doc: &mut Document,
        node: NodeId,
        reorder: &Reorder<Msg>,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<NodeId, ReconcileError> {
        // Removals and in-place patches first; moved nodes end up detached.
        let node = self.apply_help(doc, node, &reorder.patches)?;

        for insert in &reorder.inserts {
            let child = self.entry_node(doc, &insert.entry, event_root)?;
            let before = doc.child_at(node, insert.index);
            doc.insert_before(node, child, before)?;
        }

        if !reorder.end_inserts.is_empty() {
            let fragment = doc.create_document_fragment();
            for entry in &reorder.end_inserts {
                let child = self.entry_node(doc, entry, event_root)?;
                doc.append_child(fragment, child)?;
            }
            doc.append_child(node, fragment)?;
        }
        Ok(node)
    }

    /// The node to insert for a keyed entry: the detached original when it
    /// moved, a fresh render otherwise.
    fn entry_node(
        &mut self,
        doc: &mut Document,
        entry: &EntryRef<Msg>,
        event_root: &Rc<EventRoot<Msg>>,
    ) -> Result<NodeId, ReconcileError> {
        let (state, vnode, dom) = {
            let entry = entry.borrow();
            (entry.state, entry.vnode.clone(), entry.dom)
        };
        match state {
            EntryState::Moved => dom.ok_or(ReconcileError::Invariant("moved entry without a node")),
            _ => self.render(doc, &vnode, event_root),
        }
    }
}

//! Patches produced by the differ.
//!
//! A patch is addressed by `index`, its position in a pre-order walk of the
//! *old* tree (root 0). The differ emits patches in ascending index order;
//! the indexer relies on that to bind `target` and `event_root` in one
//! forward scan, and the patcher then works from the bound node alone.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use haskle_dom::NodeId;

use crate::event::EventRoot;
use crate::facts::FactsDiff;
use crate::handler::TaggerFn;
use crate::node::{CustomPatch, VNode};

pub struct Patch<Msg> {
    pub index: usize,
    pub kind: PatchKind<Msg>,
    /// Real node at `index`, filled in by the indexer.
    pub target: Option<NodeId>,
    pub event_root: Option<Rc<EventRoot<Msg>>>,
}

impl<Msg> Patch<Msg> {
    pub fn new(index: usize, kind: PatchKind<Msg>) -> Self {
        Patch {
            index,
            kind,
            target: None,
            event_root: None,
        }
    }
}

pub enum PatchKind<Msg> {
    /// Render the new node and replace the old one.
    Redraw(VNode<Msg>),
    /// Patches of a rebuilt thunk, indexed from the thunk's subtree root.
    SubtreePatches(Vec<Patch<Msg>>),
    RetagChain(Vec<TaggerFn<Msg>>),
    ReplaceText(String),
    ApplyFactsDiff(FactsDiff<Msg>),
    ApplyCustomDiff(CustomPatch),
    RemoveTrailing { from: usize, count: usize },
    AppendNew { from: usize, children: Vec<VNode<Msg>> },
    ReorderKeyed(Reorder<Msg>),
    /// Remove a keyed child. With a [`Move`] the node is only detached and
    /// patched, to be reinserted by the enclosing reorder.
    RemoveKeyed(Option<Move<Msg>>),
}

pub struct Reorder<Msg> {
    /// Patches for children diffed in place, plus the keyed removals.
    pub patches: Vec<Patch<Msg>>,
    pub inserts: Vec<Insert<Msg>>,
    /// Appended after all existing children in one fragment.
    pub end_inserts: Vec<EntryRef<Msg>>,
}

pub struct Insert<Msg> {
    /// Position among the new children.
    pub index: usize,
    pub entry: EntryRef<Msg>,
}

pub struct Move<Msg> {
    pub patches: Vec<Patch<Msg>>,
    pub entry: EntryRef<Msg>,
}

pub type EntryRef<Msg> = Rc<RefCell<Entry<Msg>>>;

/// Shared record that pairs a keyed removal with an insertion of the same
/// key.
pub struct Entry<Msg> {
    pub state: EntryState,
    pub vnode: VNode<Msg>,
    /// Real node of a moved child, set by the indexer and updated by the
    /// patcher once the move's own patches are applied.
    pub dom: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Inserted,
    /// Removed at old `index`; `slot` is the removal patch in the reorder's
    /// local patch list.
    Removed { index: usize, slot: usize },
    Moved,
}

impl<Msg> Entry<Msg> {
    pub(crate) fn shared(state: EntryState, vnode: VNode<Msg>) -> EntryRef<Msg> {
        Rc::new(RefCell::new(Entry {
            state,
            vnode,
            dom: None,
        }))
    }
}

// ── Debug ─────────────────────────────────────────────────────────────────

impl<Msg> fmt::Debug for Patch<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("target", &self.target)
            .finish()
    }
}

impl<Msg> fmt::Debug for PatchKind<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKind::Redraw(v) => f.debug_tuple("Redraw").field(v).finish(),
            PatchKind::SubtreePatches(p) => f.debug_tuple("SubtreePatches").field(p).finish(),
            PatchKind::RetagChain(t) => f.debug_tuple("RetagChain").field(&t.len()).finish(),
            PatchKind::ReplaceText(s) => f.debug_tuple("ReplaceText").field(s).finish(),
            PatchKind::ApplyFactsDiff(d) => f.debug_tuple("ApplyFactsDiff").field(d).finish(),
            PatchKind::ApplyCustomDiff(p) => f.debug_tuple("ApplyCustomDiff").field(p).finish(),
            PatchKind::RemoveTrailing { from, count } => f
                .debug_struct("RemoveTrailing")
                .field("from", from)
                .field("count", count)
                .finish(),
            PatchKind::AppendNew { from, children } => f
                .debug_struct("AppendNew")
                .field("from", from)
                .field("children", children)
                .finish(),
            PatchKind::ReorderKeyed(r) => f
                .debug_struct("ReorderKeyed")
                .field("patches", &r.patches)
                .field("inserts", &r.inserts.iter().map(|i| i.index).collect::<Vec<_>>())
                .field("end_inserts", &r.end_inserts.len())
                .finish(),
            PatchKind::RemoveKeyed(None) => f.write_str("RemoveKeyed"),
            PatchKind::RemoveKeyed(Some(mv)) => f
                .debug_struct("RemoveKeyed")
                .field("patches", &mv.patches)
                .field("state", &mv.entry.borrow().state)
                .finish(),
        }
    }
}

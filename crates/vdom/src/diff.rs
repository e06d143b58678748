//! Tree diff.
//!
//! `diff(old, new)` walks both trees once and emits patches indexed by the
//! old tree's pre-order numbering. It bails out with a `Redraw` whenever
//! the shape changes (different variant, tag, namespace, tagger depth or
//! custom renderer) instead of trying to diff across shapes.
//!
//! Keyed children go through a single left-to-right pass with one step of
//! lookahead on each side, which handles append, prepend, a single insert or
//! removal and an adjacent swap in linear time. Everything else becomes an
//! explicit removal plus insertion. Removals and insertions of the same key
//! meet in a shared table and turn into a move that keeps the real node.

use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use crate::facts::diff_facts;
use crate::handler::TaggerFn;
use crate::node::{Node, VNode};
use crate::patch::{Entry, EntryRef, EntryState, Insert, Move, Patch, PatchKind, Reorder};

/// Appended to a key that is already in use within one keyed pass, so each
/// duplicate gets an entry of its own.
pub const DUPLICATE_KEY_SUFFIX: &str = "_hk\u{1f}dup";

pub fn diff<Msg: 'static>(old: &VNode<Msg>, new: &VNode<Msg>) -> Vec<Patch<Msg>> {
    let mut patches = Vec::new();
    diff_help(old, new, &mut patches, 0);
    patches
}

fn push<Msg>(patches: &mut Vec<Patch<Msg>>, index: usize, kind: PatchKind<Msg>) -> usize {
    patches.push(Patch::new(index, kind));
    patches.len() - 1
}

fn same_tagger<Msg>(a: &TaggerFn<Msg>, b: &TaggerFn<Msg>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

fn diff_help<Msg: 'static>(
    x: &VNode<Msg>,
    y: &VNode<Msg>,
    patches: &mut Vec<Patch<Msg>>,
    index: usize,
) {
    if x.ptr_eq(y) {
        return;
    }

    let dekeyed;
    let y = if mem::discriminant(x.node()) == mem::discriminant(y.node()) {
        y
    } else if matches!(
        (x.node(), y.node()),
        (Node::Element { .. }, Node::KeyedElement { .. })
    ) {
        dekeyed = y.dekey();
        &dekeyed
    } else {
        push(patches, index, PatchKind::Redraw(y.clone()));
        return;
    };

    match (x.node(), y.node()) {
        (Node::Thunk(xt), Node::Thunk(yt)) => {
            if xt.refs == yt.refs {
                yt.adopt(xt.force());
                return;
            }
            let mut sub = Vec::new();
            diff_help(xt.force(), yt.force(), &mut sub, 0);
            if !sub.is_empty() {
                push(patches, index, PatchKind::SubtreePatches(sub));
            }
        }

        (Node::Tagger { .. }, Node::Tagger { .. }) => {
            let (Some((x_taggers, x_sub)), Some((y_taggers, y_sub))) =
                (x.tagger_chain(), y.tagger_chain())
            else {
                return;
            };
            // A different nesting depth means the structure changed.
            if x_taggers.len() != y_taggers.len() {
                push(patches, index, PatchKind::Redraw(y.clone()));
                return;
            }
            if !x_taggers.iter().zip(&y_taggers).all(|(a, b)| same_tagger(a, b)) {
                push(patches, index, PatchKind::RetagChain(y_taggers));
            }
            diff_help(x_sub, y_sub, patches, index + 1);
        }

        (Node::Text(a), Node::Text(b)) => {
            if a != b {
                push(patches, index, PatchKind::ReplaceText(b.clone()));
            }
        }

        (
            Node::Element {
                tag: xtag,
                namespace: xns,
                facts: xfacts,
                children: xkids,
                ..
            },
            Node::Element {
                tag: ytag,
                namespace: yns,
                facts: yfacts,
                children: ykids,
                ..
            },
        ) => {
            if xtag != ytag || xns != yns {
                push(patches, index, PatchKind::Redraw(y.clone()));
                return;
            }
            let facts = diff_facts(xfacts, yfacts);
            if !facts.is_empty() {
                push(patches, index, PatchKind::ApplyFactsDiff(facts));
            }
            diff_kids(xkids, ykids, patches, index);
        }

        (
            Node::KeyedElement {
                tag: xtag,
                namespace: xns,
                facts: xfacts,
                children: xkids,
                ..
            },
            Node::KeyedElement {
                tag: ytag,
                namespace: yns,
                facts: yfacts,
                children: ykids,
                ..
            },
        ) => {
            if xtag != ytag || xns != yns {
                push(patches, index, PatchKind::Redraw(y.clone()));
                return;
            }
            let facts = diff_facts(xfacts, yfacts);
            if !facts.is_empty() {
                push(patches, index, PatchKind::ApplyFactsDiff(facts));
            }
            diff_keyed_kids(xkids, ykids, patches, index);
        }

        (Node::Custom(xc), Node::Custom(yc)) => {
            if !xc.same_render(yc) {
                push(patches, index, PatchKind::Redraw(y.clone()));
                return;
            }
            let facts = diff_facts(&xc.facts, &yc.facts);
            if !facts.is_empty() {
                push(patches, index, PatchKind::ApplyFactsDiff(facts));
            }
            if let Some(patch) = (yc.diff)(&*xc.state, &*yc.state) {
                push(patches, index, PatchKind::ApplyCustomDiff(patch));
            }
        }

        // Variants were aligned above.
        _ => {
            push(patches, index, PatchKind::Redraw(y.clone()));
        }
    }
}

// ── Children ──────────────────────────────────────────────────────────────

fn diff_kids<Msg: 'static>(
    xkids: &[VNode<Msg>],
    ykids: &[VNode<Msg>],
    patches: &mut Vec<Patch<Msg>>,
    index: usize,
) {
    let (xlen, ylen) = (xkids.len(), ykids.len());
    if xlen > ylen {
        push(
            patches,
            index,
            PatchKind::RemoveTrailing {
                from: ylen,
                count: xlen - ylen,
            },
        );
    } else if xlen < ylen {
        push(
            patches,
            index,
            PatchKind::AppendNew {
                from: xlen,
                children: ykids[xlen..].to_vec(),
            },
        );
    }

    let mut index = index;
    for (xkid, ykid) in xkids.iter().zip(ykids) {
        index += 1;
        diff_help(xkid, ykid, patches, index);
        index += xkid.descendants();
    }
}

// ── Keyed children ────────────────────────────────────────────────────────

type Changes<Msg> = HashMap<String, EntryRef<Msg>>;

fn diff_keyed_kids<Msg: 'static>(
    xkids: &[(String, VNode<Msg>)],
    ykids: &[(String, VNode<Msg>)],
    patches: &mut Vec<Patch<Msg>>,
    root_index: usize,
) {
    let mut local = Vec::new();
    let mut changes: Changes<Msg> = HashMap::new();
    let mut inserts = Vec::new();
    let mut end_inserts = Vec::new();

    let (xlen, ylen) = (xkids.len(), ykids.len());
    let (mut xi, mut yi) = (0, 0);
    let mut index = root_index;

    while xi < xlen && yi < ylen {
        let (xkey, xnode) = &xkids[xi];
        let (ykey, ynode) = &ykids[yi];

        if xkey == ykey {
            index += 1;
            diff_help(xnode, ynode, &mut local, index);
            index += xnode.descendants();
            xi += 1;
            yi += 1;
            continue;
        }

        let xnext = xkids.get(xi + 1);
        let ynext = ykids.get(yi + 1);
        // The old list's next key is the current new key, or vice versa.
        let old_match = xnext.filter(|(key, _)| key == ykey);
        let new_match = ynext.filter(|(key, _)| key == xkey);

        match (old_match, new_match) {
            // Adjacent swap.
            (Some((_, xnext_node)), Some((_, ynext_node))) => {
                index += 1;
                diff_help(xnode, ynext_node, &mut local, index);
                // Both halves share the old key's slot.
                let entry = insert_node(&mut changes, &mut local, xkey, ynode);
                inserts.push(Insert { index: yi, entry });
                index += xnode.descendants();

                index += 1;
                remove_node(&mut changes, &mut local, xkey, xnext_node, index);
                index += xnext_node.descendants();

                xi += 2;
                yi += 2;
            }

            // Insert y.
            (None, Some((_, ynext_node))) => {
                index += 1;
                let entry = insert_node(&mut changes, &mut local, ykey, ynode);
                inserts.push(Insert { index: yi, entry });
                diff_help(xnode, ynext_node, &mut local, index);
                index += xnode.descendants();

                xi += 1;
                yi += 2;
            }

            // Remove x.
            (Some((_, xnext_node)), None) => {
                index += 1;
                remove_node(&mut changes, &mut local, xkey, xnode, index);
                index += xnode.descendants();

                index += 1;
                diff_help(xnext_node, ynode, &mut local, index);
                index += xnext_node.descendants();

                xi += 2;
                yi += 1;
            }

            // Remove x and insert y when the next pair lines up again.
            (None, None) => match (xnext, ynext) {
                (Some((xnext_key, xnext_node)), Some((ynext_key, ynext_node)))
                    if xnext_key == ynext_key =>
                {
                    index += 1;
                    remove_node(&mut changes, &mut local, xkey, xnode, index);
                    let entry = insert_node(&mut changes, &mut local, ykey, ynode);
                    inserts.push(Insert { index: yi, entry });
                    index += xnode.descendants();

                    index += 1;
                    diff_help(xnext_node, ynext_node, &mut local, index);
                    index += xnext_node.descendants();

                    xi += 2;
                    yi += 2;
                }
                _ => break,
            },
        }
    }

    while xi < xlen {
        index += 1;
        let (key, node) = &xkids[xi];
        remove_node(&mut changes, &mut local, key, node, index);
        index += node.descendants();
        xi += 1;
    }

    while yi < ylen {
        let (key, node) = &ykids[yi];
        end_inserts.push(insert_node(&mut changes, &mut local, key, node));
        yi += 1;
    }

    if !local.is_empty() || !inserts.is_empty() || !end_inserts.is_empty() {
        log::trace!(
            "keyed diff at {root_index}: {} local, {} inserts, {} end inserts",
            local.len(),
            inserts.len(),
            end_inserts.len()
        );
        push(
            patches,
            root_index,
            PatchKind::ReorderKeyed(Reorder {
                patches: local,
                inserts,
                end_inserts,
            }),
        );
    }
}

fn insert_node<Msg: 'static>(
    changes: &mut Changes<Msg>,
    local: &mut [Patch<Msg>],
    key: &str,
    vnode: &VNode<Msg>,
) -> EntryRef<Msg> {
    let Some(entry) = changes.get(key).cloned() else {
        let entry = Entry::shared(EntryState::Inserted, vnode.clone());
        changes.insert(key.to_owned(), entry.clone());
        return entry;
    };

    let state = entry.borrow().state;
    match state {
        // Removed earlier in this pass: a move.
        EntryState::Removed { index, slot } => {
            let old = entry.borrow().vnode.clone();
            let mut sub = Vec::new();
            diff_help(&old, vnode, &mut sub, index);
            entry.borrow_mut().state = EntryState::Moved;
            local[slot].kind = PatchKind::RemoveKeyed(Some(Move {
                patches: sub,
                entry: entry.clone(),
            }));
            entry
        }
        EntryState::Inserted | EntryState::Moved => {
            insert_node(changes, local, &format!("{key}{DUPLICATE_KEY_SUFFIX}"), vnode)
        }
    }
}

fn remove_node<Msg: 'static>(
    changes: &mut Changes<Msg>,
    local: &mut Vec<Patch<Msg>>,
    key: &str,
    vnode: &VNode<Msg>,
    index: usize,
) {
    let Some(entry) = changes.get(key).cloned() else {
        let slot = push(local, index, PatchKind::RemoveKeyed(None));
        changes.insert(
            key.to_owned(),
            Entry::shared(EntryState::Removed { index, slot }, vnode.clone()),
        );
        return;
    };

    let state = entry.borrow().state;
    match state {
        // Inserted earlier in this pass: a move.
        EntryState::Inserted => {
            entry.borrow_mut().state = EntryState::Moved;
            let new = entry.borrow().vnode.clone();
            let mut sub = Vec::new();
            diff_help(vnode, &new, &mut sub, index);
            push(
                local,
                index,
                PatchKind::RemoveKeyed(Some(Move {
                    patches: sub,
                    entry,
                })),
            );
        }
        EntryState::Removed { .. } | EntryState::Moved => {
            remove_node(changes, local, &format!("{key}{DUPLICATE_KEY_SUFFIX}"), vnode, index);
        }
    }
}

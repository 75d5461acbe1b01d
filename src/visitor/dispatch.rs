// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The event dispatcher: fixpoint walks over a mutating tree.
//!
//! One walk is a depth-first traversal firing enter listeners in pre-order
//! and exit listeners in post-order. Listeners mutate the tree while it is
//! being walked, so the walk tracks each node by identity rather than
//! index: after every callback the current node is re-located among its
//! siblings, which gives the mutation contract its shape —
//!
//! - nodes inserted *after* the current one are visited later in the same
//!   walk;
//! - nodes inserted *before* it are not revisited by this walk;
//! - removing the current node continues with whatever shifted into its
//!   position, without descending into the removed subtree.
//!
//! A single walk is not enough: an insert-before, or a node appended
//! behind the cursor by a later listener, leaves tree regions no listener
//! has seen. [`dispatch`] therefore repeats full walks until one completes
//! with no structural change, detected by comparing the tree's preorder
//! identity sequence across the walk. That catches edits made through the
//! cursor and edits made through [`Cursor::root_mut`] alike. Across those
//! walks each listener fires at most once per node and phase: a record of
//! already-fired events persists over the re-walks, so a follow-up walk
//! only reaches the nodes earlier walks missed. Listener sets registered
//! by several plugins converge on the same final tree this way regardless
//! of which walk first reached which node.

use std::collections::HashSet;

use tracing::trace;

use crate::error::Error;
use crate::nodes::{Node, NodeId, Root};
use crate::visitor::{locate, node_at, Cursor, Listeners, Phase};

/// One delivered event: node identity, phase and listener slot.
type FiredEvent = (NodeId, Phase, usize);

/// Run every listener registered on `root` to fixpoint.
///
/// Returns as soon as a full walk causes no structural change. A listener
/// error aborts mid-walk; the registry is put back either way so a later
/// dispatch can resume.
pub fn dispatch(root: &mut Root) -> Result<(), Error> {
    let mut passes = 0u32;
    let mut fired: HashSet<FiredEvent> = HashSet::new();
    loop {
        let Some(mut listeners) = root.listeners.take() else {
            return Ok(());
        };
        if listeners.is_empty() {
            root.listeners = Some(listeners);
            return Ok(());
        }

        let before = shape(root);
        passes += 1;
        let mut path = Vec::new();
        let result = walk_level(root, &mut listeners, &mut path, &mut fired);

        // Listeners registered mid-walk land in a fresh registry on the
        // root; fold them in behind the existing ones.
        if let Some(added) = root.listeners.take() {
            listeners.merge(added);
        }
        root.listeners = Some(listeners);
        result?;

        if shape(root) == before {
            trace!(passes, "dispatch settled");
            return Ok(());
        }
    }
}

/// The tree's structure as a preorder identity sequence. Field edits leave
/// it unchanged; any insertion, removal or move does not.
fn shape(root: &Root) -> Vec<NodeId> {
    fn rec(nodes: &[Node], out: &mut Vec<NodeId>) {
        for node in nodes {
            out.push(node.id());
            if let Some(children) = node.nodes() {
                rec(children, out);
            }
        }
    }
    let mut out = Vec::new();
    rec(&root.nodes, &mut out);
    out
}

/// Walk the children of the container addressed by `path`, recursing into
/// each child's subtree between its enter and exit events.
fn walk_level(
    root: &mut Root,
    listeners: &mut Listeners,
    path: &mut Vec<usize>,
    fired: &mut HashSet<FiredEvent>,
) -> Result<(), Error> {
    let mut i = 0;
    loop {
        path.push(i);
        let Some((id, target)) = node_at(root, path).map(|n| (n.id(), n.type_name())) else {
            path.pop();
            break;
        };

        fire(root, listeners, target, Phase::Enter, path, id, fired)?;
        path.pop();

        // Removed during enter: the next node now sits at this index.
        let Some(at) = locate(root, path, id) else {
            continue;
        };
        i = at;

        path.push(i);
        let has_children = node_at(root, path)
            .and_then(|n| n.nodes())
            .is_some_and(|c| !c.is_empty());
        if has_children {
            walk_level(root, listeners, path, fired)?;
        }
        path.pop();

        // A descendant's listener may have rearranged this level too.
        let Some(at) = locate(root, path, id) else {
            continue;
        };
        i = at;

        path.push(i);
        fire(root, listeners, target, Phase::Exit, path, id, fired)?;
        path.pop();

        // Gone after exit: its successor already sits at `i`.
        if let Some(at) = locate(root, path, id) {
            i = at + 1;
        }
    }
    Ok(())
}

/// Fire all listeners matching `(target, phase)`, in registration order,
/// re-resolving the node by identity before each one. Listeners that
/// already fired for this node and phase are skipped, so re-walks only
/// deliver events the earlier walks missed. Firing stops early if a
/// callback detaches the node.
fn fire(
    root: &mut Root,
    listeners: &mut Listeners,
    target: &'static str,
    phase: Phase,
    path: &[usize],
    id: NodeId,
    fired: &mut HashSet<FiredEvent>,
) -> Result<(), Error> {
    let parent = &path[..path.len() - 1];
    for (slot, (t, p, callback)) in listeners.entries_mut().enumerate() {
        if t != target || p != phase {
            continue;
        }
        if !fired.insert((id, phase, slot)) {
            continue;
        }
        let Some(at) = locate(root, parent, id) else {
            break;
        };
        let mut resolved = parent.to_vec();
        resolved.push(at);
        let mut cursor = Cursor { root, path: resolved };
        callback(&mut cursor)?;
    }
    Ok(())
}

/// Total node count, used by tests asserting walk coverage.
#[cfg(test)]
fn count_nodes(root: &Root) -> usize {
    fn rec(root: &Root, path: &mut Vec<usize>) -> usize {
        let Some(children) = crate::visitor::children_at(root, path) else {
            return 0;
        };
        let len = children.len();
        let mut total = len;
        for i in 0..len {
            path.push(i);
            total += rec(root, path);
            path.pop();
        }
        total
    }
    rec(root, &mut Vec::new())
}

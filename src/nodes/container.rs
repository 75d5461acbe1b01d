// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tree mutation primitives with whitespace repair.
//!
//! [`Container`] is the shared seam over the three container variants
//! (`Root`, `Rule`, `AtRule`). Every structural edit keeps the tree's
//! formatting coherent without the caller reasoning about raws:
//!
//! - a new node with no `before` raw borrows separator style from the
//!   sibling it lands next to;
//! - prepending keeps the container's established leading style on the old
//!   first child;
//! - removing the first child propagates its `before` to the new first
//!   child, so leading blank lines never silently vanish;
//! - inserting after the first child deliberately does *not* inherit
//!   first-position raws (the stringifier derives a contextual default
//!   instead).
//!
//! The net effect: programmatic edits stringify in the same style as the
//! surrounding hand-written CSS.

use super::{Node, NodeId, Root};

/// Anything a mutation primitive accepts: a single node, a batch, or a
/// whole [`Root`] whose children are drained (a move, never a copy — the
/// donor root is left empty).
pub enum NodeInput {
    One(Node),
    Many(Vec<Node>),
    Tree(Root),
}

impl NodeInput {
    fn into_nodes(self) -> Vec<Node> {
        match self {
            NodeInput::One(node) => vec![node],
            NodeInput::Many(nodes) => nodes,
            NodeInput::Tree(mut root) => std::mem::take(&mut root.nodes),
        }
    }
}

impl From<Node> for NodeInput {
    fn from(node: Node) -> Self {
        NodeInput::One(node)
    }
}

impl From<Vec<Node>> for NodeInput {
    fn from(nodes: Vec<Node>) -> Self {
        NodeInput::Many(nodes)
    }
}

impl From<Root> for NodeInput {
    fn from(root: Root) -> Self {
        NodeInput::Tree(root)
    }
}

/// Keep only the whitespace of a donor separator, so comment text in a
/// `before` raw is never duplicated onto new siblings.
fn whitespace_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_whitespace()).collect()
}

/// Ordered child management plus style-aware insertion and removal.
///
/// `adopt` and `on_remove` are the per-variant style hooks; `Root`
/// overrides them with document-level rules while `Rule`/`AtRule` share the
/// block-level defaults.
pub trait Container {
    fn child_nodes(&self) -> &[Node];
    fn child_nodes_mut(&mut self) -> &mut Vec<Node>;

    /// Repair the `before` raws of `incoming` (and, for prepends, of the
    /// current first child) before insertion. `sample` indexes the sibling
    /// the insertion is anchored to.
    fn adopt(&mut self, incoming: &mut [Node], sample: Option<usize>, prepend: bool) {
        let _ = prepend;
        let Some(si) = sample else { return };
        let Some(donor) = self.child_nodes()[si].before().map(whitespace_of) else {
            return;
        };
        for node in incoming.iter_mut() {
            if node.before().is_none() {
                node.set_before(Some(donor.clone()));
            }
        }
    }

    /// Style fixups applied just before a child is removed.
    fn on_remove(&mut self, index: usize) {
        let _ = index;
    }

    /// Style fixups applied as `incoming` takes over the slot of the child
    /// at `index`. Called with at least one incoming node.
    fn on_replace(&mut self, index: usize, incoming: &mut [Node]) {
        let _ = (index, incoming);
    }

    fn first(&self) -> Option<&Node> {
        self.child_nodes().first()
    }

    fn last(&self) -> Option<&Node> {
        self.child_nodes().last()
    }

    fn len(&self) -> usize {
        self.child_nodes().len()
    }

    fn is_empty(&self) -> bool {
        self.child_nodes().is_empty()
    }

    /// Position of a child by identity.
    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.child_nodes().iter().position(|n| n.id() == id)
    }

    /// Append nodes at the end, borrowing separator style from the current
    /// last child.
    fn append(&mut self, what: impl Into<NodeInput>)
    where
        Self: Sized,
    {
        let mut incoming = what.into().into_nodes();
        if incoming.is_empty() {
            return;
        }
        let sample = self.len().checked_sub(1);
        self.adopt(&mut incoming, sample, false);
        self.child_nodes_mut().extend(incoming);
    }

    /// Insert nodes at the front. Children are prepended one at a time in
    /// reverse so every insertion sees the container's live first child,
    /// which keeps the established leading style in place.
    fn prepend(&mut self, what: impl Into<NodeInput>)
    where
        Self: Sized,
    {
        let incoming = what.into().into_nodes();
        for node in incoming.into_iter().rev() {
            let mut batch = [node];
            let sample = if self.is_empty() { None } else { Some(0) };
            self.adopt(&mut batch, sample, true);
            let [node] = batch;
            self.child_nodes_mut().insert(0, node);
        }
    }

    /// Insert nodes before `index`. Index 0 behaves like [`prepend`].
    ///
    /// [`prepend`]: Container::prepend
    fn insert_before(&mut self, index: usize, what: impl Into<NodeInput>)
    where
        Self: Sized,
    {
        let mut incoming = what.into().into_nodes();
        if incoming.is_empty() {
            return;
        }
        self.adopt(&mut incoming, Some(index), index == 0);
        let tail = self.child_nodes_mut().split_off(index);
        self.child_nodes_mut().extend(incoming);
        self.child_nodes_mut().extend(tail);
    }

    /// Insert nodes after `index`, borrowing separator style from that
    /// sibling only (never from first-position raws).
    fn insert_after(&mut self, index: usize, what: impl Into<NodeInput>)
    where
        Self: Sized,
    {
        let mut incoming = what.into().into_nodes();
        if incoming.is_empty() {
            return;
        }
        self.adopt(&mut incoming, Some(index), false);
        let tail = self.child_nodes_mut().split_off(index + 1);
        self.child_nodes_mut().extend(incoming);
        self.child_nodes_mut().extend(tail);
    }

    /// Detach and return the child at `index`.
    fn remove_child(&mut self, index: usize) -> Node
    where
        Self: Sized,
    {
        self.on_remove(index);
        self.child_nodes_mut().remove(index)
    }

    /// Replace the child at `index` with one or more nodes, which inherit
    /// separator style from the node they replace.
    fn replace_child(&mut self, index: usize, what: impl Into<NodeInput>) -> Node
    where
        Self: Sized,
    {
        let mut incoming = what.into().into_nodes();
        let count = incoming.len();
        self.adopt(&mut incoming, Some(index), false);
        if !incoming.is_empty() {
            self.on_replace(index, &mut incoming);
        }
        let tail = self.child_nodes_mut().split_off(index);
        self.child_nodes_mut().extend(incoming);
        self.child_nodes_mut().extend(tail);
        self.remove_child(index + count)
    }
}

impl Container for Root {
    fn child_nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    /// Document-level adoption. Appends and non-first inserts stamp the
    /// anchor's own separator onto every incoming node (this is what puts a
    /// default separator between formerly-separate runs when one document
    /// is appended to another). Prepends instead re-home the *old* first
    /// child: it takes the second child's separator, or loses its raw
    /// entirely so the stringifier derives a fresh default. Inserts
    /// anchored on the first child inherit nothing — first-position raws
    /// never travel.
    fn adopt(&mut self, incoming: &mut [Node], sample: Option<usize>, prepend: bool) {
        let Some(si) = sample else { return };
        if prepend {
            let replacement = if self.nodes.len() > 1 {
                self.nodes[1].before().map(str::to_owned)
            } else {
                None
            };
            self.nodes[si].set_before(replacement);
        } else if si != 0 {
            let donor = self.nodes[si].before().map(str::to_owned);
            for node in incoming.iter_mut() {
                node.set_before(donor.clone());
            }
        }
    }

    /// Removing the first child hands its `before` to the new first child,
    /// so the document's leading formatting survives the removal.
    fn on_remove(&mut self, index: usize) {
        if index == 0 && self.nodes.len() > 1 {
            let donor = self.nodes[0].before().map(str::to_owned);
            self.nodes[1].set_before(donor);
        }
    }

    /// Replacing the first child likewise keeps the document's leading raw:
    /// the incoming first node takes the outgoing child's `before`.
    fn on_replace(&mut self, index: usize, incoming: &mut [Node]) {
        if index == 0 {
            let donor = self.nodes[0].before().map(str::to_owned);
            incoming[0].set_before(donor);
        }
    }
}

impl Container for super::Rule {
    fn child_nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }
}

impl Container for super::AtRule {
    fn child_nodes(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or(&[])
    }

    fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        self.nodes.get_or_insert_with(Vec::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{decl, rule};

    #[test]
    fn append_borrows_last_separator_on_root() {
        let mut root = Root::new();
        let mut a = rule("a");
        a.set_before(Some("".into()));
        let mut b = rule("b");
        b.set_before(Some("\n".into()));
        root.append(a);
        root.append(b);

        root.append(rule("c"));
        assert_eq!(root.nodes[2].before(), Some("\n"));
    }

    #[test]
    fn append_into_empty_root_keeps_raws_unset() {
        let mut root = Root::new();
        root.append(rule("a"));
        assert_eq!(root.nodes[0].before(), None);
    }

    #[test]
    fn rule_container_copies_sibling_whitespace() {
        let mut r = match rule("a") {
            Node::Rule(r) => r,
            _ => unreachable!(),
        };
        let mut first = decl("color", "red");
        first.set_before(Some("\n  ".into()));
        r.append(first);
        r.append(decl("width", "0"));
        assert_eq!(r.nodes[1].before(), Some("\n  "));
    }

    #[test]
    fn remove_first_propagates_before() {
        let mut root = Root::new();
        let mut a = rule("a");
        a.set_before(Some("".into()));
        let mut b = rule("b");
        b.set_before(Some("\n".into()));
        root.append(a);
        root.append(b);

        root.remove_child(0);
        assert_eq!(root.nodes[0].before(), Some(""));
    }

    #[test]
    fn replace_child_keeps_position() {
        let mut root = Root::new();
        root.append(rule("a"));
        root.append(rule("b"));
        let old = root.replace_child(1, rule("c"));
        assert_eq!(old.as_rule().unwrap().selector, "b");
        assert_eq!(root.nodes[1].as_rule().unwrap().selector, "c");
        assert_eq!(root.nodes.len(), 2);
    }

    #[test]
    fn replace_first_child_propagates_before() {
        let mut root = Root::new();
        let mut a = rule("a");
        a.set_before(Some("\n\n".into()));
        root.append(a);
        root.append(rule("b"));

        root.replace_child(0, rule("x"));
        assert_eq!(root.nodes[0].before(), Some("\n\n"));
        assert_eq!(root.nodes[0].as_rule().unwrap().selector, "x");
    }

    #[test]
    fn moving_a_tree_drains_the_donor() {
        let mut donor = Root::new();
        donor.append(rule("a"));
        let mut target = Root::new();
        target.append(donor);
        assert_eq!(target.nodes.len(), 1);
    }
}

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Event listeners and the traversal cursor.
//!
//! Plugins subscribe to node events on a [`Root`] with [`Root::on`]. Event
//! names follow a two-segment grammar: a node type, optionally followed by
//! a phase (`enter` or `exit`). `"decl"` and `"decl.enter"` name the same
//! event; `"decl.exit"` fires after a declaration's subtree has been walked
//! (for leaves, right after enter). The type segment is open-ended: only
//! `decl`, `rule`, `atrule` and `comment` ever match a node, but any other
//! type registers fine and simply never fires. A bad phase or a third
//! segment is rejected up front with [`Error::InvalidEventName`].
//!
//! Listeners receive a [`Cursor`]: a view of the live tree positioned at
//! the current node. The cursor is how a listener reads the node, edits its
//! fields, and performs structural surgery (insert siblings, remove or
//! replace itself, append children, or reach the whole tree through
//! [`Cursor::root_mut`]). The dispatcher ([`dispatch`]) notices any
//! structural change after a walk and schedules another one, so listeners
//! observe nodes the edit introduced; the walk order and re-walk loop live
//! in [`dispatch`].

pub mod dispatch;

use std::fmt;

use crate::error::Error;
use crate::nodes::{
    AtRule, Comment, Container, Declaration, Node, NodeInput, Root, Rule,
};

pub use dispatch::dispatch;

// ============================================================================
// Event grammar
// ============================================================================

/// Enter fires in pre-order, exit in post-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Enter,
    Exit,
}

/// Parse an event name like `"decl"`, `"rule.exit"` or `"comment.enter"`.
/// The type segment is taken as-is; a type no node carries just never
/// matches during dispatch.
pub(crate) fn parse_event_name(name: &str) -> Result<(String, Phase), Error> {
    let mut segments = name.split('.');
    let target = segments.next().unwrap_or("").to_owned();
    let phase = match segments.next() {
        None => Phase::Enter,
        Some("enter") => Phase::Enter,
        Some("exit") => Phase::Exit,
        Some(other) => {
            return Err(Error::InvalidEventName {
                name: name.to_owned(),
                reason: format!("unknown phase {other:?}, expected enter or exit"),
            })
        }
    };
    if segments.next().is_some() {
        return Err(Error::InvalidEventName {
            name: name.to_owned(),
            reason: "too many segments".to_owned(),
        });
    }
    Ok((target, phase))
}

// ============================================================================
// Listener registry
// ============================================================================

type ListenerFn = Box<dyn FnMut(&mut Cursor<'_>) -> Result<(), Error> + Send>;

struct Listener {
    target: String,
    phase: Phase,
    callback: ListenerFn,
}

/// The listeners registered on one root, in registration order.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<Listener>,
}

impl Listeners {
    pub(crate) fn push(&mut self, target: String, phase: Phase, callback: ListenerFn) {
        self.entries.push(Listener { target, phase, callback });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append another registry's entries, keeping registration order.
    pub(crate) fn merge(&mut self, other: Listeners) {
        self.entries.extend(other.entries);
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&str, Phase, &mut ListenerFn)> {
        self.entries
            .iter_mut()
            .map(|l| (l.target.as_str(), l.phase, &mut l.callback))
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Root {
    /// Register a listener for an event name.
    ///
    /// The type segment is not validated against the known node types; a
    /// listener on an unknown type is kept and never fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEventName`] when the phase segment is not
    /// `enter` or `exit`, or the name has more than two segments.
    pub fn on<F>(&mut self, name: &str, callback: F) -> Result<(), Error>
    where
        F: FnMut(&mut Cursor<'_>) -> Result<(), Error> + Send + 'static,
    {
        let (target, phase) = parse_event_name(name)?;
        self.listeners
            .get_or_insert_with(Listeners::default)
            .push(target, phase, Box::new(callback));
        Ok(())
    }
}

// ============================================================================
// Tree addressing
// ============================================================================

/// Resolve a path of child indices to a node. An empty path is the root
/// itself, which is not a `Node`; callers address children only.
pub(crate) fn node_at<'r>(root: &'r Root, path: &[usize]) -> Option<&'r Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = root.nodes.get(first)?;
    for &i in rest {
        node = node.nodes()?.get(i)?;
    }
    Some(node)
}

pub(crate) fn node_at_mut<'r>(root: &'r mut Root, path: &[usize]) -> Option<&'r mut Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = root.nodes.get_mut(first)?;
    for &i in rest {
        node = node.nodes_mut()?.get_mut(i)?;
    }
    Some(node)
}

/// The child list of the container addressed by `path` (empty = root).
pub(crate) fn children_at<'r>(root: &'r Root, path: &[usize]) -> Option<&'r [Node]> {
    if path.is_empty() {
        return Some(&root.nodes);
    }
    node_at(root, path)?.nodes().map(Vec::as_slice)
}

/// Find a child by identity within the container addressed by `path`.
pub(crate) fn locate(root: &Root, path: &[usize], id: crate::nodes::NodeId) -> Option<usize> {
    children_at(root, path)?.iter().position(|n| n.id() == id)
}

/// A mutable handle on whichever container variant owns the current node.
enum ParentMut<'r> {
    Root(&'r mut Root),
    Rule(&'r mut Rule),
    AtRule(&'r mut AtRule),
}

fn parent_at_mut<'r>(root: &'r mut Root, parent_path: &[usize]) -> Option<ParentMut<'r>> {
    if parent_path.is_empty() {
        return Some(ParentMut::Root(root));
    }
    match node_at_mut(root, parent_path)? {
        Node::Rule(r) => Some(ParentMut::Rule(r)),
        Node::AtRule(a) => Some(ParentMut::AtRule(a)),
        _ => None,
    }
}

// ============================================================================
// Cursor
// ============================================================================

/// A listener's window onto the live tree, positioned at one node.
///
/// The cursor addresses the node by its path from the root, so it stays
/// valid while sibling edits shift indices: the dispatcher re-resolves the
/// path by node identity before every callback. After [`remove_self`] the
/// cursor is detached and node accessors return `None`.
///
/// [`remove_self`]: Cursor::remove_self
pub struct Cursor<'a> {
    pub(crate) root: &'a mut Root,
    pub(crate) path: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub fn node(&self) -> Option<&Node> {
        node_at(self.root, &self.path)
    }

    pub fn node_mut(&mut self) -> Option<&mut Node> {
        node_at_mut(self.root, &self.path)
    }

    pub fn decl_mut(&mut self) -> Option<&mut Declaration> {
        self.node_mut().and_then(Node::as_decl_mut)
    }

    pub fn rule_mut(&mut self) -> Option<&mut Rule> {
        self.node_mut().and_then(Node::as_rule_mut)
    }

    pub fn at_rule_mut(&mut self) -> Option<&mut AtRule> {
        match self.node_mut() {
            Some(Node::AtRule(a)) => Some(a),
            _ => None,
        }
    }

    pub fn comment_mut(&mut self) -> Option<&mut Comment> {
        match self.node_mut() {
            Some(Node::Comment(c)) => Some(c),
            _ => None,
        }
    }

    /// Index of the current node among its siblings.
    pub fn index(&self) -> usize {
        self.path.last().copied().unwrap_or(0)
    }

    /// Nesting depth: 0 for a top-level node.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// The current node's siblings, including itself.
    pub fn siblings(&self) -> &[Node] {
        children_at(self.root, &self.path[..self.path.len() - 1]).unwrap_or(&[])
    }

    /// Whether the current node sits directly under the root.
    pub fn at_top_level(&self) -> bool {
        self.path.len() == 1
    }

    /// The whole tree, for edits beyond the current node's neighborhood.
    pub fn root_mut(&mut self) -> &mut Root {
        self.root
    }

    fn parent(&mut self) -> Option<ParentMut<'_>> {
        let split = self.path.len().checked_sub(1)?;
        parent_at_mut(self.root, &self.path[..split])
    }

    /// Insert siblings before the current node. They will not be visited in
    /// the current walk; the follow-up walk picks them up.
    pub fn insert_before(&mut self, what: impl Into<NodeInput>) {
        let index = self.index();
        let id = self.node().map(Node::id);
        let input = what.into();
        match self.parent() {
            Some(ParentMut::Root(p)) => p.insert_before(index, input),
            Some(ParentMut::Rule(p)) => p.insert_before(index, input),
            Some(ParentMut::AtRule(p)) => p.insert_before(index, input),
            None => {}
        }
        // The insertion shifted the current node right; follow it so a
        // second edit in the same callback anchors on the right sibling.
        if let Some(id) = id {
            let split = self.path.len() - 1;
            if let Some(at) = locate(self.root, &self.path[..split], id) {
                self.path[split] = at;
            }
        }
    }

    /// Insert siblings after the current node; the current walk visits them.
    pub fn insert_after(&mut self, what: impl Into<NodeInput>) {
        let index = self.index();
        let input = what.into();
        match self.parent() {
            Some(ParentMut::Root(p)) => p.insert_after(index, input),
            Some(ParentMut::Rule(p)) => p.insert_after(index, input),
            Some(ParentMut::AtRule(p)) => p.insert_after(index, input),
            None => {}
        }
    }

    /// Detach the current node and return it. The walk continues with the
    /// node that shifted into this position.
    pub fn remove_self(&mut self) -> Option<Node> {
        let index = self.index();
        let removed = match self.parent()? {
            ParentMut::Root(p) => p.remove_child(index),
            ParentMut::Rule(p) => p.remove_child(index),
            ParentMut::AtRule(p) => p.remove_child(index),
        };
        Some(removed)
    }

    /// Swap the current node for one or more replacements, returning it.
    pub fn replace_self(&mut self, what: impl Into<NodeInput>) -> Option<Node> {
        let index = self.index();
        let input = what.into();
        let removed = match self.parent()? {
            ParentMut::Root(p) => p.replace_child(index, input),
            ParentMut::Rule(p) => p.replace_child(index, input),
            ParentMut::AtRule(p) => p.replace_child(index, input),
        };
        Some(removed)
    }

    /// Append children to the current node, when it is a container.
    pub fn append(&mut self, what: impl Into<NodeInput>) {
        let input = what.into();
        match self.node_mut() {
            Some(Node::Rule(r)) => r.append(input),
            Some(Node::AtRule(a)) => a.append(input),
            _ => {}
        }
    }
}

// ============================================================================
// Direct walks
// ============================================================================

fn walk_nodes(nodes: &mut [Node], f: &mut impl FnMut(&mut Node)) {
    for node in nodes {
        f(node);
        if let Some(children) = node.nodes_mut() {
            walk_nodes(children, f);
        }
    }
}

impl Root {
    /// Pre-order walk over every node. Unlike the event dispatcher this is
    /// a plain traversal: no structural edits, single pass.
    pub fn walk(&mut self, mut f: impl FnMut(&mut Node)) {
        walk_nodes(&mut self.nodes, &mut f);
    }

    pub fn walk_decls(&mut self, mut f: impl FnMut(&mut Declaration)) {
        self.walk(|node| {
            if let Node::Decl(d) = node {
                f(d);
            }
        });
    }

    pub fn walk_rules(&mut self, mut f: impl FnMut(&mut Rule)) {
        self.walk(|node| {
            if let Node::Rule(r) = node {
                f(r);
            }
        });
    }

    pub fn walk_at_rules(&mut self, mut f: impl FnMut(&mut AtRule)) {
        self.walk(|node| {
            if let Node::AtRule(a) = node {
                f(a);
            }
        });
    }

    pub fn walk_comments(&mut self, mut f: impl FnMut(&mut Comment)) {
        self.walk(|node| {
            if let Node::Comment(c) = node {
                f(c);
            }
        });
    }
}

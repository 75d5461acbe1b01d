// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The syntax tree: node variants, raws and identity.
//!
//! # Node Identity
//!
//! Every node receives a process-unique [`NodeId`] at construction. Ids are
//! the stable key the traversal cursor uses to re-locate a node after a
//! listener has rearranged its siblings, so a walk never skips or
//! duplicates nodes while the tree shifts under it. Cloning a node assigns
//! fresh ids throughout: a clone is a new node, and no id ever appears
//! twice in one tree.
//!
//! # Raws
//!
//! Raws are formatting-only metadata: the whitespace and punctuation the
//! parser saw around each semantic field. They are always optional; the
//! stringifier substitutes context-derived defaults when one is absent (see
//! [`crate::stringifier`]). Raws never carry semantic weight, and two nodes
//! built independently are semantically equal regardless of raws.
//!
//! # Ownership
//!
//! A container's `nodes` vec is the single ownership authority. There is no
//! stored parent pointer; parent and sibling lookups go through the cursor
//! ([`crate::visitor::Cursor`]), which derives them from the live tree so
//! the two views can never disagree.

pub mod container;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::input::{Input, Position};

pub use container::{Container, NodeInput};

// ============================================================================
// Node identity
// ============================================================================

static NODE_SEQ: AtomicU64 = AtomicU64::new(0);

/// A stable, process-unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate the next id.
    pub fn fresh() -> Self {
        NodeId(NODE_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::fresh()
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Where a node came from: the shared parse input plus start/end positions.
/// Synthetic nodes have no source.
#[derive(Debug, Clone)]
pub struct Source {
    pub input: Arc<Input>,
    pub start: Option<Position>,
    pub end: Option<Position>,
}

// ============================================================================
// Raws
// ============================================================================

/// A semantic value paired with the raw text it was parsed from. The raw
/// spelling is used at stringify time only while the semantic field still
/// equals `value`; editing the field discards the stale raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawValue {
    pub value: String,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRaws {
    /// Trailing whitespace after the last child.
    pub after: Option<String>,
    /// Whether the last declaration-style child ended with `;`.
    pub semicolon: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRaws {
    /// Whitespace and comments before the selector.
    pub before: Option<String>,
    /// Text between the selector and `{`.
    pub between: Option<String>,
    /// Whitespace before the closing `}`.
    pub after: Option<String>,
    /// Whether the last declaration ended with `;`.
    pub semicolon: Option<bool>,
    /// A stray `;` (plus leading spaces) that followed this rule's `}`.
    pub own_semicolon: Option<String>,
    /// Raw selector text when comments were interleaved.
    pub selector: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtRuleRaws {
    pub before: Option<String>,
    /// Text between `@name` and the params.
    pub after_name: Option<String>,
    /// Text between the params and `{`.
    pub between: Option<String>,
    pub after: Option<String>,
    pub semicolon: Option<bool>,
    /// Raw params text when comments were interleaved.
    pub params: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclRaws {
    pub before: Option<String>,
    /// The colon plus surrounding spaces/comments, e.g. `": "`.
    pub between: Option<String>,
    /// Raw `!important` spelling when it was not exactly `" !important"`.
    pub important: Option<String>,
    /// Raw value text when comments were interleaved.
    pub value: Option<RawValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRaws {
    pub before: Option<String>,
    /// Whitespace between `/*` and the text.
    pub left: Option<String>,
    /// Whitespace between the text and `*/`.
    pub right: Option<String>,
}

// ============================================================================
// Node variants
// ============================================================================

/// The root of a parsed or hand-built stylesheet. Owns the top-level node
/// sequence; not itself a member of any `nodes` list.
#[derive(Debug, Serialize, Deserialize)]
pub struct Root {
    pub nodes: Vec<Node>,
    pub raws: RootRaws,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip, default)]
    pub(crate) id: NodeId,
    #[serde(skip, default)]
    pub(crate) listeners: Option<crate::visitor::Listeners>,
}

impl Root {
    pub fn new() -> Self {
        Root {
            nodes: Vec::new(),
            raws: RootRaws::default(),
            source: None,
            id: NodeId::fresh(),
            listeners: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Default for Root {
    fn default() -> Self {
        Root::new()
    }
}

impl Clone for Root {
    /// Deep clone with fresh ids. Listeners are not cloned; a cloned root
    /// starts with an empty registry.
    fn clone(&self) -> Self {
        Root {
            nodes: self.nodes.clone(),
            raws: self.raws.clone(),
            source: self.source.clone(),
            id: NodeId::fresh(),
            listeners: None,
        }
    }
}

/// A `@`-rule such as `@media screen { ... }` or `@charset "utf-8";`.
/// Bodyless at-rules have `nodes == None`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub nodes: Option<Vec<Node>>,
    pub raws: AtRuleRaws,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip, default)]
    pub(crate) id: NodeId,
}

/// A selector plus a block of children, e.g. `a { color: black }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub raws: RuleRaws,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip, default)]
    pub(crate) id: NodeId,
}

/// A property declaration, e.g. `color: black !important`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub important: bool,
    pub raws: DeclRaws,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip, default)]
    pub(crate) id: NodeId,
}

/// A `/* ... */` comment. `text` is trimmed; the surrounding whitespace
/// lives in `raws.left`/`raws.right`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub raws: CommentRaws,
    #[serde(skip)]
    pub source: Option<Source>,
    #[serde(skip, default)]
    pub(crate) id: NodeId,
}

macro_rules! impl_node_common {
    ($ty:ty) => {
        impl $ty {
            pub fn id(&self) -> NodeId {
                self.id
            }
        }
    };
}

impl_node_common!(AtRule);
impl_node_common!(Rule);
impl_node_common!(Declaration);
impl_node_common!(Comment);

impl Clone for AtRule {
    fn clone(&self) -> Self {
        AtRule {
            name: self.name.clone(),
            params: self.params.clone(),
            nodes: self.nodes.clone(),
            raws: self.raws.clone(),
            source: self.source.clone(),
            id: NodeId::fresh(),
        }
    }
}

impl Clone for Rule {
    fn clone(&self) -> Self {
        Rule {
            selector: self.selector.clone(),
            nodes: self.nodes.clone(),
            raws: self.raws.clone(),
            source: self.source.clone(),
            id: NodeId::fresh(),
        }
    }
}

impl Clone for Declaration {
    fn clone(&self) -> Self {
        Declaration {
            prop: self.prop.clone(),
            value: self.value.clone(),
            important: self.important,
            raws: self.raws.clone(),
            source: self.source.clone(),
            id: NodeId::fresh(),
        }
    }
}

impl Clone for Comment {
    fn clone(&self) -> Self {
        Comment {
            text: self.text.clone(),
            raws: self.raws.clone(),
            source: self.source.clone(),
            id: NodeId::fresh(),
        }
    }
}

/// The closed set of child node variants. The root is not a member: a
/// `Node` always lives in some container's `nodes` sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    #[serde(rename = "atrule")]
    AtRule(AtRule),
    Rule(Rule),
    Decl(Declaration),
    Comment(Comment),
}

impl Node {
    /// The discriminator tag, matching the event-name grammar of
    /// [`Root::on`](crate::visitor): `atrule`, `rule`, `decl`, `comment`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::AtRule(_) => "atrule",
            Node::Rule(_) => "rule",
            Node::Decl(_) => "decl",
            Node::Comment(_) => "comment",
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::AtRule(n) => n.id,
            Node::Rule(n) => n.id,
            Node::Decl(n) => n.id,
            Node::Comment(n) => n.id,
        }
    }

    /// Child sequence for container variants, `None` for leaves and
    /// bodyless at-rules.
    pub fn nodes(&self) -> Option<&Vec<Node>> {
        match self {
            Node::AtRule(n) => n.nodes.as_ref(),
            Node::Rule(n) => Some(&n.nodes),
            _ => None,
        }
    }

    pub fn nodes_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::AtRule(n) => n.nodes.as_mut(),
            Node::Rule(n) => Some(&mut n.nodes),
            _ => None,
        }
    }

    /// The `before` raw: leading whitespace/comment text.
    pub fn before(&self) -> Option<&str> {
        match self {
            Node::AtRule(n) => n.raws.before.as_deref(),
            Node::Rule(n) => n.raws.before.as_deref(),
            Node::Decl(n) => n.raws.before.as_deref(),
            Node::Comment(n) => n.raws.before.as_deref(),
        }
    }

    pub fn set_before(&mut self, before: Option<String>) {
        match self {
            Node::AtRule(n) => n.raws.before = before,
            Node::Rule(n) => n.raws.before = before,
            Node::Decl(n) => n.raws.before = before,
            Node::Comment(n) => n.raws.before = before,
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self {
            Node::AtRule(n) => n.source.as_ref(),
            Node::Rule(n) => n.source.as_ref(),
            Node::Decl(n) => n.source.as_ref(),
            Node::Comment(n) => n.source.as_ref(),
        }
    }

    pub fn as_decl(&self) -> Option<&Declaration> {
        match self {
            Node::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_decl_mut(&mut self) -> Option<&mut Declaration> {
        match self {
            Node::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Node::Rule(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_rule_mut(&mut self) -> Option<&mut Rule> {
        match self {
            Node::Rule(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            Node::AtRule(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(c) => Some(c),
            _ => None,
        }
    }
}

// ============================================================================
// Builders for synthetic nodes
// ============================================================================

/// Build a declaration node with no raws; the stringifier derives its
/// formatting from context.
pub fn decl(prop: impl Into<String>, value: impl Into<String>) -> Node {
    Node::Decl(Declaration {
        prop: prop.into(),
        value: value.into(),
        important: false,
        raws: DeclRaws::default(),
        source: None,
        id: NodeId::fresh(),
    })
}

/// Build an empty rule node.
pub fn rule(selector: impl Into<String>) -> Node {
    Node::Rule(Rule {
        selector: selector.into(),
        nodes: Vec::new(),
        raws: RuleRaws::default(),
        source: None,
        id: NodeId::fresh(),
    })
}

/// Build an at-rule node with a body. Use [`at_rule_bodyless`] for
/// directives like `@charset`.
pub fn at_rule(name: impl Into<String>, params: impl Into<String>) -> Node {
    Node::AtRule(AtRule {
        name: name.into(),
        params: params.into(),
        nodes: Some(Vec::new()),
        raws: AtRuleRaws::default(),
        source: None,
        id: NodeId::fresh(),
    })
}

/// Build a bodyless at-rule node.
pub fn at_rule_bodyless(name: impl Into<String>, params: impl Into<String>) -> Node {
    Node::AtRule(AtRule {
        name: name.into(),
        params: params.into(),
        nodes: None,
        raws: AtRuleRaws::default(),
        source: None,
        id: NodeId::fresh(),
    })
}

/// Build a comment node.
pub fn comment(text: impl Into<String>) -> Node {
    Node::Comment(Comment {
        text: text.into(),
        raws: CommentRaws::default(),
        source: None,
        id: NodeId::fresh(),
    })
}

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Stringifier: syntax tree back to CSS text.
//!
//! Every node's raws are emitted verbatim when present, which is what makes
//! `stringify(parse(t))` reproduce `t` byte-for-byte. A raw left unset (on
//! a synthetic node, or deliberately cleared by a mutation primitive) is
//! replaced by a *derived* default: the stringifier scans the tree for the
//! same raw on a comparable node and mimics it, falling back to a fixed
//! house style (newline separators, four-space indent, `": "` after a
//! property) only when the tree offers no precedent. Derived values are
//! cached per stringify run, so one scan serves the whole document.
//!
//! Derived separators that contain a newline are deepened by one indent
//! unit per nesting level, so a synthetic declaration lands at the right
//! column inside `@media { a { ... } }`.
//!
//! The stringifier never mutates the tree. Derived raws are not written
//! back; the same node stringifies differently if the document around it
//! changes, which is the point.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::input::Input;
use crate::nodes::{AtRule, Comment, Declaration, Node, RawValue, Root, Rule};

const DEFAULT_COLON: &str = ": ";
const DEFAULT_INDENT: &str = "    ";
const DEFAULT_BEFORE: &str = "\n";
const DEFAULT_BEFORE_OPEN: &str = " ";
const DEFAULT_COMMENT_PAD: &str = " ";

/// Render a whole tree to CSS text.
pub fn stringify(root: &Root) -> String {
    let mut s = Stringifier::new(root);
    s.run();
    s.out
}

/// One node's contribution to the source map: where it landed in the
/// output, where it came from in an input.
pub(crate) struct MappingEvent {
    pub dst_line: u32,
    pub dst_col: u32,
    pub src_line: u32,
    pub src_col: u32,
    pub input: Arc<Input>,
}

/// Render to CSS text while recording an output-to-source mapping event
/// for every node that carries provenance.
pub(crate) fn stringify_tracked(root: &Root) -> (String, Vec<MappingEvent>) {
    let mut s = Stringifier::new(root);
    s.track = true;
    s.run();
    (s.out, s.events)
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(self))
    }
}

struct Stringifier<'r> {
    root: &'r Root,
    out: String,
    /// Derived raws, keyed by raw name, computed at most once per run.
    cache: HashMap<&'static str, String>,
    semicolon_cache: Option<bool>,
    track: bool,
    events: Vec<MappingEvent>,
    // Output position bookkeeping for mapping events.
    scanned: usize,
    out_line: u32,
    out_col: u32,
}

impl<'r> Stringifier<'r> {
    fn new(root: &'r Root) -> Self {
        Stringifier {
            root,
            out: String::new(),
            cache: HashMap::new(),
            semicolon_cache: None,
            track: false,
            events: Vec::new(),
            scanned: 0,
            out_line: 0,
            out_col: 0,
        }
    }

    fn run(&mut self) {
        let root = self.root;
        if !root.nodes.is_empty() {
            self.body(&root.nodes, root.raws.semicolon, 0, true);
        }
        match &root.raws.after {
            Some(after) => self.out.push_str(after),
            None if !root.nodes.is_empty() => self.out.push('\n'),
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    fn body(&mut self, nodes: &'r [Node], own_semicolon: Option<bool>, depth: usize, at_root: bool) {
        // Trailing comments never influence whether the last declaration
        // gets a semicolon.
        let mut last = nodes.len() - 1;
        while last > 0 && matches!(nodes[last], Node::Comment(_)) {
            last -= 1;
        }
        let semicolon = self.semicolon_for(own_semicolon);
        for (i, child) in nodes.iter().enumerate() {
            let before = self.before_of(child, depth, at_root && i == 0);
            self.out.push_str(&before);
            self.node(child, i != last || semicolon, depth);
        }
    }

    fn node(&mut self, node: &'r Node, semicolon: bool, depth: usize) {
        self.record(node);
        match node {
            Node::Decl(d) => self.decl(d, semicolon),
            Node::Rule(r) => self.rule(r, depth),
            Node::AtRule(a) => self.at_rule(a, semicolon, depth),
            Node::Comment(c) => self.comment(c),
        }
    }

    fn decl(&mut self, d: &'r Declaration, semicolon: bool) {
        let between = match &d.raws.between {
            Some(b) => b.clone(),
            None => self.derived("colon"),
        };
        self.out.push_str(&d.prop);
        self.out.push_str(&between);
        self.out.push_str(raw_or_value(&d.value, &d.raws.value));
        if d.important {
            self.out
                .push_str(d.raws.important.as_deref().unwrap_or(" !important"));
        }
        if semicolon {
            self.out.push(';');
        }
    }

    fn rule(&mut self, r: &'r Rule, depth: usize) {
        let start = raw_or_value(&r.selector, &r.raws.selector).to_owned();
        self.block(&start, &r.nodes, &r.raws.between, &r.raws.after, r.raws.semicolon, depth);
        if let Some(own) = &r.raws.own_semicolon {
            self.out.push_str(own);
        }
    }

    fn at_rule(&mut self, a: &'r AtRule, semicolon: bool, depth: usize) {
        let params = raw_or_value(&a.params, &a.raws.params);
        let after_name = match &a.raws.after_name {
            Some(n) => n.clone(),
            None if params.is_empty() => String::new(),
            None => " ".to_owned(),
        };
        let start = format!("@{}{}{}", a.name, after_name, params);
        match &a.nodes {
            Some(nodes) => {
                self.block(&start, nodes, &a.raws.between, &a.raws.after, a.raws.semicolon, depth);
            }
            None => {
                self.out.push_str(&start);
                if let Some(between) = &a.raws.between {
                    self.out.push_str(between);
                }
                if semicolon {
                    self.out.push(';');
                }
            }
        }
    }

    fn comment(&mut self, c: &'r Comment) {
        let left = c.raws.left.as_deref().unwrap_or(DEFAULT_COMMENT_PAD);
        let right = c.raws.right.as_deref().unwrap_or(DEFAULT_COMMENT_PAD);
        self.out.push_str("/*");
        self.out.push_str(left);
        self.out.push_str(&c.text);
        self.out.push_str(right);
        self.out.push_str("*/");
    }

    #[allow(clippy::too_many_arguments)]
    fn block(
        &mut self,
        start: &str,
        nodes: &'r [Node],
        own_between: &Option<String>,
        own_after: &Option<String>,
        own_semicolon: Option<bool>,
        depth: usize,
    ) {
        let between = match own_between {
            Some(b) => b.clone(),
            None => self.derived("beforeOpen"),
        };
        self.out.push_str(start);
        self.out.push_str(&between);
        self.out.push('{');
        if nodes.is_empty() {
            let after = match own_after {
                Some(a) => a.clone(),
                None => self.derived("emptyBody"),
            };
            self.out.push_str(&after);
        } else {
            self.body(nodes, own_semicolon, depth + 1, false);
            let after = match own_after {
                Some(a) => a.clone(),
                None => {
                    let base = self.derived("beforeClose");
                    self.apply_indent(base, depth)
                }
            };
            self.out.push_str(&after);
        }
        self.out.push('}');
    }

    fn record(&mut self, node: &Node) {
        if !self.track {
            return;
        }
        let Some(source) = node.source() else { return };
        let Some(start) = source.start else { return };
        self.advance_scan();
        self.events.push(MappingEvent {
            dst_line: self.out_line,
            dst_col: self.out_col,
            src_line: start.line.saturating_sub(1) as u32,
            src_col: start.column.saturating_sub(1) as u32,
            input: source.input.clone(),
        });
    }

    fn advance_scan(&mut self) {
        for &b in &self.out.as_bytes()[self.scanned..] {
            if b == b'\n' {
                self.out_line += 1;
                self.out_col = 0;
            } else {
                self.out_col += 1;
            }
        }
        self.scanned = self.out.len();
    }

    // ------------------------------------------------------------------
    // Derived raws
    // ------------------------------------------------------------------

    fn before_of(&mut self, node: &Node, depth: usize, is_root_first: bool) -> String {
        if let Some(before) = node.before() {
            return before.to_owned();
        }
        // The document's very first node carries no separator.
        if is_root_first {
            return String::new();
        }
        let base = match node {
            Node::Decl(_) => self.derived("beforeDecl"),
            Node::Comment(_) => self.derived("beforeComment"),
            _ => self.derived("beforeRule"),
        };
        self.apply_indent(base, depth)
    }

    fn apply_indent(&mut self, mut value: String, depth: usize) -> String {
        if depth > 0 && value.contains('\n') {
            let indent = self.derived("indent");
            for _ in 0..depth {
                value.push_str(&indent);
            }
        }
        value
    }

    fn derived(&mut self, key: &'static str) -> String {
        if let Some(v) = self.cache.get(key) {
            return v.clone();
        }
        let value = match key {
            "beforeRule" => detect_before_rule(self.root)
                .map(normalize_before)
                .unwrap_or_else(|| DEFAULT_BEFORE.to_owned()),
            "beforeDecl" => match detect_before_decl(self.root) {
                Some(v) => normalize_before(v),
                None => self.derived("beforeRule"),
            },
            "beforeComment" => match detect_before_comment(self.root) {
                Some(v) => normalize_before(v),
                None => self.derived("beforeDecl"),
            },
            "beforeClose" => detect_before_close(self.root)
                .map(normalize_before)
                .unwrap_or_else(|| DEFAULT_BEFORE.to_owned()),
            "beforeOpen" => detect_before_open(self.root)
                .unwrap_or_else(|| DEFAULT_BEFORE_OPEN.to_owned()),
            "emptyBody" => detect_empty_body(self.root).unwrap_or_default(),
            "indent" => detect_indent(self.root).unwrap_or_else(|| DEFAULT_INDENT.to_owned()),
            "colon" => detect_colon(self.root).unwrap_or_else(|| DEFAULT_COLON.to_owned()),
            _ => String::new(),
        };
        self.cache.insert(key, value.clone());
        value
    }

    fn semicolon_for(&mut self, own: Option<bool>) -> bool {
        if let Some(own) = own {
            return own;
        }
        if let Some(cached) = self.semicolon_cache {
            return cached;
        }
        let detected = detect_semicolon(self.root).unwrap_or(false);
        self.semicolon_cache = Some(detected);
        detected
    }
}

fn raw_or_value<'a>(value: &'a str, raw: &'a Option<RawValue>) -> &'a str {
    match raw {
        // A stale raw (the field was edited since parse) is discarded.
        Some(r) if r.value == value => &r.raw,
        _ => value,
    }
}

/// Keep everything up to the final newline, then strip non-whitespace, so a
/// borrowed `before` contributes separator shape without indentation or
/// comment text.
fn normalize_before(mut value: String) -> String {
    if let Some(idx) = value.rfind('\n') {
        value.truncate(idx + 1);
    }
    value.chars().filter(|c| c.is_whitespace()).collect()
}

// ----------------------------------------------------------------------
// Tree scans. Each finds the first node that exhibits the raw in question.
// ----------------------------------------------------------------------

fn find_map<'r, T>(nodes: &'r [Node], f: &mut impl FnMut(&'r Node) -> Option<T>) -> Option<T> {
    for node in nodes {
        if let Some(v) = f(node) {
            return Some(v);
        }
        if let Some(children) = node.nodes() {
            if let Some(v) = find_map(children, f) {
                return Some(v);
            }
        }
    }
    None
}

fn detect_semicolon(root: &Root) -> Option<bool> {
    fn check(node: &Node) -> Option<bool> {
        let children = node.nodes().filter(|c| !c.is_empty())?;
        if !matches!(children.last(), Some(Node::Decl(_))) {
            return None;
        }
        match node {
            Node::Rule(r) => r.raws.semicolon,
            Node::AtRule(a) => a.raws.semicolon,
            _ => None,
        }
    }
    find_map(&root.nodes, &mut check)
}

fn detect_empty_body(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| match node {
        Node::Rule(r) if r.nodes.is_empty() => r.raws.after.clone(),
        Node::AtRule(a) if a.nodes.as_ref().is_some_and(Vec::is_empty) => a.raws.after.clone(),
        _ => None,
    })
}

fn detect_before_open(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| match node {
        Node::Rule(r) => r.raws.between.clone(),
        Node::AtRule(a) => a.raws.between.clone(),
        _ => None,
    })
}

fn detect_before_close(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| {
        if node.nodes().is_some_and(|c| !c.is_empty()) {
            match node {
                Node::Rule(r) => r.raws.after.clone(),
                Node::AtRule(a) => a.raws.after.clone(),
                _ => None,
            }
        } else {
            None
        }
    })
}

fn detect_colon(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| {
        node.as_decl().and_then(|d| d.raws.between.as_ref()).map(|between| {
            between
                .chars()
                .filter(|c| c.is_whitespace() || *c == ':')
                .collect()
        })
    })
}

fn detect_before_decl(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| {
        node.as_decl().and_then(|d| d.raws.before.clone())
    })
}

fn detect_before_comment(root: &Root) -> Option<String> {
    find_map(&root.nodes, &mut |node| {
        node.as_comment().and_then(|c| c.raws.before.clone())
    })
}

/// The separator of any container except the document's first node.
fn detect_before_rule(root: &Root) -> Option<String> {
    fn rec(nodes: &[Node], top_level: bool) -> Option<String> {
        for (i, node) in nodes.iter().enumerate() {
            let is_root_first = top_level && i == 0;
            if !is_root_first && node.nodes().is_some() {
                if let Some(before) = node.before() {
                    return Some(before.to_owned());
                }
            }
            if let Some(children) = node.nodes() {
                if let Some(v) = rec(children, false) {
                    return Some(v);
                }
            }
        }
        None
    }
    rec(&root.nodes, true)
}

/// One indentation unit: the whitespace tail of any nested node's
/// separator.
fn detect_indent(root: &Root) -> Option<String> {
    fn rec(nodes: &[Node], depth: usize) -> Option<String> {
        for node in nodes {
            if depth == 1 {
                if let Some(before) = node.before() {
                    let tail = before.rsplit('\n').next().unwrap_or("");
                    return Some(tail.chars().filter(|c| c.is_whitespace()).collect());
                }
            }
            if let Some(children) = node.nodes() {
                if let Some(v) = rec(children, depth + 1) {
                    return Some(v);
                }
            }
        }
        None
    }
    rec(&root.nodes, 0)
}

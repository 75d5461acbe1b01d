// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Parser: token stream to syntax tree.
//!
//! Builds a [`Root`] while recording, per node, the raw formatting needed
//! for the stringifier to reproduce untouched regions byte-for-byte:
//! leading whitespace lands in the *next* node's `before`, block-trailing
//! whitespace in the container's `after`, separators (`: `, text before
//! `{`, `@name` spacing) in the variant-specific raws. The round-trip
//! identity `stringify(parse(t)) == t` is the load-bearing contract here;
//! see `tests/roundtrip.rs`.
//!
//! The grammar is deliberately shallow: selectors, at-rule params and
//! declaration values stay opaque text, so exotic or vendor-specific
//! syntax survives parsing unharmed. Only structural faults (unterminated
//! constructs, stray `}`, a word where a declaration must be) fail.

use std::sync::Arc;

use crate::error::ParseError;
use crate::input::Input;
use crate::nodes::{
    AtRule, AtRuleRaws, Comment, CommentRaws, Declaration, DeclRaws, Node, NodeId, RawValue, Root,
    Rule, RuleRaws, Source,
};
use crate::tokenizer::{tokenize, Token, TokenKind};

/// Parse CSS text into a [`Root`]. `from` names the origin file for
/// diagnostics and source maps.
pub fn parse(css: &str, from: Option<&str>) -> Result<Root, ParseError> {
    let input = Arc::new(Input::new(css.to_owned(), from.map(str::to_owned)));
    let tokens = tokenize(&input, css)?;
    let mut parser = Parser::new(input, tokens);
    parser.run()?;
    Ok(parser.finish())
}

/// A container that has seen its `{` but not yet its `}`.
enum Opened {
    Rule(Rule),
    AtRule(AtRule),
}

struct Parser<'a> {
    input: Arc<Input>,
    tokens: Vec<Token<'a>>,
    pos: usize,
    root: Root,
    stack: Vec<Opened>,
    /// Whitespace (and stray semicolons) waiting to become the next node's
    /// `before` or the enclosing block's `after`.
    spaces: String,
    /// Whether the most recent declaration ended with `;`.
    semicolon: bool,
}

impl<'a> Parser<'a> {
    fn new(input: Arc<Input>, tokens: Vec<Token<'a>>) -> Self {
        let mut root = Root::new();
        root.source = Some(Source {
            input: input.clone(),
            start: Some(input.position(0)),
            end: None,
        });
        Parser {
            input,
            tokens,
            pos: 0,
            root,
            stack: Vec::new(),
            spaces: String::new(),
            semicolon: false,
        }
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos];
            self.pos += 1;
            match token.kind {
                TokenKind::Space => self.spaces.push_str(token.text),
                TokenKind::Semicolon => self.free_semicolon(token),
                TokenKind::CloseCurly => self.end(token)?,
                TokenKind::Comment => self.comment(token),
                TokenKind::AtWord => self.atrule(token)?,
                TokenKind::OpenCurly => self.empty_rule(token),
                _ => self.other(token)?,
            }
        }
        self.end_file()
    }

    fn finish(self) -> Root {
        self.root
    }

    // ------------------------------------------------------------------
    // Tree assembly
    // ------------------------------------------------------------------

    fn push_child(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Opened::Rule(r)) => r.nodes.push(node),
            Some(Opened::AtRule(a)) => a.nodes.get_or_insert_with(Vec::new).push(node),
            None => self.root.nodes.push(node),
        }
    }

    fn take_before(&mut self) -> Option<String> {
        Some(std::mem::take(&mut self.spaces))
    }

    fn source_at(&self, start: usize) -> Option<Source> {
        Some(Source {
            input: self.input.clone(),
            start: Some(self.input.position(start)),
            end: None,
        })
    }

    /// Position of a token's final character. Steps back over the whole
    /// last character, which may span several bytes.
    fn end_position(&self, token: Token<'_>) -> crate::input::Position {
        let last = token.text.chars().last().map_or(1, char::len_utf8);
        self.input.position(token.end.saturating_sub(last))
    }

    // ------------------------------------------------------------------
    // Constructs
    // ------------------------------------------------------------------

    /// A `;` with no declaration in flight. It either documents a stray
    /// semicolon after the previous rule's `}` or accumulates as plain
    /// spacing.
    fn free_semicolon(&mut self, token: Token<'a>) {
        self.spaces.push_str(token.text);
        let last = match self.stack.last_mut() {
            Some(Opened::Rule(r)) => r.nodes.last_mut(),
            Some(Opened::AtRule(a)) => a.nodes.as_mut().and_then(|n| n.last_mut()),
            None => self.root.nodes.last_mut(),
        };
        if let Some(Node::Rule(prev)) = last {
            if prev.raws.own_semicolon.is_none() {
                prev.raws.own_semicolon = Some(std::mem::take(&mut self.spaces));
            }
        }
    }

    fn comment(&mut self, token: Token<'a>) {
        let inner = &token.text[2..token.text.len() - 2];
        let (text, left, right) = if inner.trim().is_empty() {
            (String::new(), inner.to_owned(), String::new())
        } else {
            let trimmed = inner.trim();
            let start = trimmed.as_ptr() as usize - inner.as_ptr() as usize;
            (
                trimmed.to_owned(),
                inner[..start].to_owned(),
                inner[start + trimmed.len()..].to_owned(),
            )
        };
        let mut node = Comment {
            text,
            raws: CommentRaws {
                before: self.take_before(),
                left: Some(left),
                right: Some(right),
            },
            source: self.source_at(token.start),
            id: NodeId::fresh(),
        };
        if let Some(src) = node.source.as_mut() {
            src.end = Some(self.end_position(token));
        }
        self.push_child(Node::Comment(node));
    }

    /// A bare `{`: a rule with an empty selector.
    fn empty_rule(&mut self, token: Token<'a>) {
        let node = Rule {
            selector: String::new(),
            nodes: Vec::new(),
            raws: RuleRaws {
                before: self.take_before(),
                between: Some(String::new()),
                ..RuleRaws::default()
            },
            source: self.source_at(token.start),
            id: NodeId::fresh(),
        };
        self.semicolon = false;
        self.stack.push(Opened::Rule(node));
    }

    /// Anything starting with a word, string, bracket or colon: buffer
    /// tokens until the construct reveals itself as a rule (`{`), a
    /// declaration (`;` or end of block/file), or a fault.
    fn other(&mut self, start: Token<'a>) -> Result<(), ParseError> {
        let mut end = false;
        let mut colon = false;
        let mut first_bracket: Option<Token<'a>> = None;
        let mut brackets: Vec<TokenKind> = Vec::new();
        let mut buffer: Vec<Token<'a>> = Vec::new();
        let mut token = Some(start);

        while let Some(t) = token {
            let kind = t.kind;
            buffer.push(t);
            if kind == TokenKind::OpenParen || kind == TokenKind::OpenSquare {
                if first_bracket.is_none() {
                    first_bracket = Some(t);
                }
                brackets.push(match kind {
                    TokenKind::OpenParen => TokenKind::CloseParen,
                    _ => TokenKind::CloseSquare,
                });
            } else if brackets.is_empty() {
                match kind {
                    TokenKind::Semicolon => {
                        if colon {
                            return self.decl(buffer);
                        }
                        break;
                    }
                    TokenKind::OpenCurly => return self.rule(buffer),
                    TokenKind::CloseCurly => {
                        self.pos -= 1;
                        buffer.pop();
                        end = true;
                        break;
                    }
                    TokenKind::Colon => colon = true,
                    _ => {}
                }
            } else if kind == *brackets.last().unwrap() {
                brackets.pop();
            }

            token = if self.pos < self.tokens.len() {
                let t = self.tokens[self.pos];
                self.pos += 1;
                Some(t)
            } else {
                None
            };
        }

        if self.pos >= self.tokens.len() {
            end = true;
        }
        if !brackets.is_empty() {
            return Err(self.input.error("Unclosed bracket", first_bracket.unwrap().start));
        }

        if end && colon {
            // Give trailing spaces and comments back; they belong to the
            // block's `after`, not the declaration.
            while let Some(last) = buffer.last() {
                if last.kind != TokenKind::Space && last.kind != TokenKind::Comment {
                    break;
                }
                buffer.pop();
                self.pos -= 1;
            }
            self.decl(buffer)
        } else {
            Err(self.unknown_word(&buffer))
        }
    }

    fn rule(&mut self, mut tokens: Vec<Token<'a>>) -> Result<(), ParseError> {
        tokens.pop(); // the `{`
        let start = tokens[0];
        let between = spaces_and_comments_from_end(&mut tokens);
        let (selector, raw) = raw_text(&tokens, true);
        let node = Rule {
            selector,
            nodes: Vec::new(),
            raws: RuleRaws {
                before: self.take_before(),
                between: Some(between),
                selector: raw,
                ..RuleRaws::default()
            },
            source: self.source_at(start.start),
            id: NodeId::fresh(),
        };
        self.semicolon = false;
        self.stack.push(Opened::Rule(node));
        Ok(())
    }

    fn decl(&mut self, mut tokens: Vec<Token<'a>>) -> Result<(), ParseError> {
        let mut before = std::mem::take(&mut self.spaces);
        self.semicolon = false;

        let last = *tokens.last().expect("declaration buffer is never empty");
        if last.kind == TokenKind::Semicolon {
            self.semicolon = true;
            tokens.pop();
        }
        let end_pos = self.end_position(last);

        while tokens[0].kind != TokenKind::Word {
            if tokens.len() == 1 {
                return Err(self.unknown_word(&tokens));
            }
            before.push_str(tokens.remove(0).text);
        }
        let start_token = tokens[0];

        let mut prop = String::new();
        while let Some(t) = tokens.first() {
            match t.kind {
                TokenKind::Colon | TokenKind::Space | TokenKind::Comment => break,
                _ => prop.push_str(tokens.remove(0).text),
            }
        }

        let mut between = String::new();
        loop {
            if tokens.is_empty() {
                break;
            }
            let t = tokens.remove(0);
            if t.kind == TokenKind::Colon {
                between.push_str(t.text);
                break;
            }
            if t.kind == TokenKind::Word && t.text.chars().any(|c| c.is_alphanumeric() || c == '_')
            {
                return Err(self.unknown_word(&[t]));
            }
            between.push_str(t.text);
        }

        // IE hacks: `*prop` / `_prop` keep the marker in `before`.
        if prop.starts_with('_') || prop.starts_with('*') {
            before.push(prop.remove(0));
        }
        between.push_str(&spaces_and_comments_from_start(&mut tokens));

        let mut important = false;
        let mut important_raw: Option<String> = None;
        let mut i = tokens.len();
        while i > 1 {
            i -= 1;
            let t = tokens[i];
            let lower = t.text.to_ascii_lowercase();
            if lower == "!important" {
                important = true;
                let mut spelled = string_from(&mut tokens, i);
                spelled = format!("{}{}", spaces_from_end(&mut tokens), spelled);
                if spelled != " !important" {
                    important_raw = Some(spelled);
                }
                break;
            } else if lower == "important" {
                // `! important`, `!/*x*/important` and friends: walk back
                // from the end collecting the full raw spelling.
                let mut cache = tokens.clone();
                let mut spelled = String::new();
                let mut j = i;
                while j > 0 {
                    let kind = cache[j].kind;
                    if spelled.trim_start().starts_with('!') && kind != TokenKind::Space {
                        break;
                    }
                    let popped = cache.pop().expect("cache shrinks with j");
                    spelled = format!("{}{}", popped.text, spelled);
                    j -= 1;
                }
                if spelled.trim_start().starts_with('!') {
                    important = true;
                    important_raw = Some(spelled);
                    tokens = cache;
                }
            }
            if t.kind != TokenKind::Space && t.kind != TokenKind::Comment {
                break;
            }
        }

        let (value, value_raw) = raw_text(&tokens, false);

        let node = Declaration {
            prop,
            value,
            important,
            raws: DeclRaws {
                before: Some(before),
                between: Some(between),
                important: important_raw,
                value: value_raw,
            },
            source: Some(Source {
                input: self.input.clone(),
                start: Some(self.input.position(start_token.start)),
                end: Some(end_pos),
            }),
            id: NodeId::fresh(),
        };

        if node.value.contains(':') {
            self.check_missed_semicolon(&tokens)?;
        }
        self.push_child(Node::Decl(node));
        Ok(())
    }

    fn atrule(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        let name = token.text[1..].to_owned();
        if name.is_empty() {
            return Err(self.input.error("At-rule without name", token.start));
        }
        let before = self.take_before();
        self.semicolon = false;

        let mut params: Vec<Token<'a>> = Vec::new();
        let mut open = false;
        let mut ended_by_semicolon: Option<Token<'a>> = None;
        let mut close_parent: Option<Token<'a>> = None;

        while self.pos < self.tokens.len() {
            let t = self.tokens[self.pos];
            self.pos += 1;
            match t.kind {
                TokenKind::Semicolon => {
                    self.semicolon = true;
                    ended_by_semicolon = Some(t);
                    break;
                }
                TokenKind::OpenCurly => {
                    open = true;
                    break;
                }
                TokenKind::CloseCurly => {
                    close_parent = Some(t);
                    break;
                }
                _ => params.push(t),
            }
        }

        let at_eof = !open && ended_by_semicolon.is_none() && close_parent.is_none();

        let mut between = spaces_and_comments_from_end(&mut params);
        let after_name = spaces_and_comments_from_start(&mut params);
        let (params_value, params_raw) = raw_text(&params, false);
        let last_param = params.last().copied();

        if at_eof {
            // The trailing spacing belongs to the document, not the node.
            self.spaces = std::mem::take(&mut between);
        }

        let mut node = AtRule {
            name,
            params: params_value,
            nodes: None,
            raws: AtRuleRaws {
                before,
                after_name: Some(after_name),
                between: Some(between),
                params: params_raw,
                ..AtRuleRaws::default()
            },
            source: self.source_at(token.start),
            id: NodeId::fresh(),
        };

        let end_token = ended_by_semicolon.or(last_param).unwrap_or(token);
        if let Some(src) = node.source.as_mut() {
            src.end = Some(self.end_position(end_token));
        }

        if open {
            node.nodes = Some(Vec::new());
            self.semicolon = false;
            self.stack.push(Opened::AtRule(node));
        } else {
            self.push_child(Node::AtRule(node));
            if let Some(close) = close_parent {
                self.end(close)?;
            }
        }
        Ok(())
    }

    /// Close the innermost open block on `}`.
    fn end(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        let Some(opened) = self.stack.pop() else {
            return Err(self.input.error("Unexpected }", token.start));
        };
        let after = std::mem::take(&mut self.spaces);
        let end_pos = Some(self.input.position(token.start));
        let semicolon = std::mem::replace(&mut self.semicolon, false);

        let node = match opened {
            Opened::Rule(mut r) => {
                if !r.nodes.is_empty() {
                    r.raws.semicolon = Some(semicolon);
                }
                r.raws.after = Some(format!("{}{}", r.raws.after.as_deref().unwrap_or(""), after));
                if let Some(src) = r.source.as_mut() {
                    src.end = end_pos;
                }
                Node::Rule(r)
            }
            Opened::AtRule(mut a) => {
                if a.nodes.as_ref().is_some_and(|n| !n.is_empty()) {
                    a.raws.semicolon = Some(semicolon);
                }
                a.raws.after = Some(format!("{}{}", a.raws.after.as_deref().unwrap_or(""), after));
                if let Some(src) = a.source.as_mut() {
                    src.end = end_pos;
                }
                Node::AtRule(a)
            }
        };
        self.push_child(node);
        Ok(())
    }

    fn end_file(&mut self) -> Result<(), ParseError> {
        if let Some(opened) = self.stack.last() {
            let start = match opened {
                Opened::Rule(r) => r.source.as_ref(),
                Opened::AtRule(a) => a.source.as_ref(),
            }
            .and_then(|s| s.start)
            .map(|p| p.offset)
            .unwrap_or(0);
            return Err(self.input.error("Unclosed block", start));
        }
        if !self.root.nodes.is_empty() {
            self.root.raws.semicolon = Some(self.semicolon);
        }
        self.root.raws.after = Some(format!(
            "{}{}",
            self.root.raws.after.as_deref().unwrap_or(""),
            std::mem::take(&mut self.spaces)
        ));
        if let Some(src) = self.root.source.as_mut() {
            src.end = Some(self.input.position(self.input.css().len()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Faults
    // ------------------------------------------------------------------

    fn unknown_word(&self, tokens: &[Token<'_>]) -> ParseError {
        self.input.error("Unknown word", tokens[0].start)
    }

    /// A value containing a bare `:` outside brackets usually means the
    /// author forgot a `;` between two declarations.
    fn check_missed_semicolon(&self, tokens: &[Token<'a>]) -> Result<(), ParseError> {
        let Some(colon) = self.colon_index(tokens)? else {
            return Ok(());
        };
        let mut founded = 0;
        let mut at = tokens[colon];
        for t in tokens[..colon].iter().rev() {
            at = *t;
            if t.kind != TokenKind::Space {
                founded += 1;
                if founded == 2 {
                    break;
                }
            }
        }
        Err(self.input.error("Missed semicolon", at.start))
    }

    fn colon_index(&self, tokens: &[Token<'a>]) -> Result<Option<usize>, ParseError> {
        let mut brackets = 0i32;
        let mut prev: Option<Token<'a>> = None;
        for (i, t) in tokens.iter().enumerate() {
            match t.kind {
                TokenKind::OpenParen => brackets += 1,
                TokenKind::CloseParen => brackets -= 1,
                TokenKind::Colon if brackets == 0 => match prev {
                    None => return Err(self.input.error("Double colon", t.start)),
                    Some(p) if p.kind == TokenKind::Word && p.text == "progid" => {}
                    Some(_) => return Ok(Some(i)),
                },
                _ => {}
            }
            prev = Some(*t);
        }
        Ok(None)
    }
}

// ----------------------------------------------------------------------
// Token buffer helpers
// ----------------------------------------------------------------------

fn spaces_and_comments_from_end(tokens: &mut Vec<Token<'_>>) -> String {
    let mut kept = Vec::new();
    while let Some(t) = tokens.last() {
        if t.kind != TokenKind::Space && t.kind != TokenKind::Comment {
            break;
        }
        kept.push(tokens.pop().unwrap().text);
    }
    kept.iter().rev().copied().collect()
}

fn spaces_and_comments_from_start(tokens: &mut Vec<Token<'_>>) -> String {
    let mut out = String::new();
    while let Some(t) = tokens.first() {
        if t.kind != TokenKind::Space && t.kind != TokenKind::Comment {
            break;
        }
        out.push_str(tokens.remove(0).text);
    }
    out
}

fn spaces_from_end(tokens: &mut Vec<Token<'_>>) -> String {
    let mut kept = Vec::new();
    while let Some(t) = tokens.last() {
        if t.kind != TokenKind::Space {
            break;
        }
        kept.push(tokens.pop().unwrap().text);
    }
    kept.iter().rev().copied().collect()
}

/// Drain `tokens[from..]` into their concatenated text.
fn string_from(tokens: &mut Vec<Token<'_>>, from: usize) -> String {
    tokens.split_off(from).iter().map(|t| t.text).collect()
}

fn looks_like_ident(s: &str) -> bool {
    let s = s.strip_prefix(['.', '#']).unwrap_or(s);
    s.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Collapse a token run into its semantic text, recording the raw spelling
/// when comments (or a trailing space) would otherwise be lost. In
/// selectors, a comment wedged directly between two ident-ish tokens is
/// part of the semantic text (`.a/*x*/.b` selects nothing without it).
fn raw_text(tokens: &[Token<'_>], is_selector: bool) -> (String, Option<RawValue>) {
    let mut value = String::new();
    let mut clean = true;
    let length = tokens.len();

    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            TokenKind::Comment if is_selector => {
                let prev = i.checked_sub(1).map(|p| tokens[p]);
                let next = tokens.get(i + 1).copied();
                let glued = prev.is_some_and(|p| p.kind != TokenKind::Space && looks_like_ident(p.text))
                    && next.is_some_and(|n| n.kind != TokenKind::Space && looks_like_ident(n.text));
                if glued {
                    value.push_str(t.text);
                } else {
                    clean = false;
                }
            }
            TokenKind::Comment => clean = false,
            TokenKind::Space if i == length - 1 => clean = false,
            _ => value.push_str(t.text),
        }
    }

    if clean {
        (value, None)
    } else {
        let raw: String = tokens.iter().map(|t| t.text).collect();
        (value.clone(), Some(RawValue { value, raw }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Container;

    #[test]
    fn parses_simple_rule() {
        let root = parse("a { color: black }", None).unwrap();
        assert_eq!(root.nodes.len(), 1);
        let rule = root.nodes[0].as_rule().unwrap();
        assert_eq!(rule.selector, "a");
        let decl = rule.nodes[0].as_decl().unwrap();
        assert_eq!(decl.prop, "color");
        assert_eq!(decl.value, "black");
        assert_eq!(decl.raws.between.as_deref(), Some(": "));
        assert_eq!(rule.raws.semicolon, Some(false));
    }

    #[test]
    fn records_before_and_after_raws() {
        let root = parse("\n a {\n  color: red;\n }\n", None).unwrap();
        let rule = root.nodes[0].as_rule().unwrap();
        assert_eq!(rule.raws.before.as_deref(), Some("\n "));
        assert_eq!(rule.raws.after.as_deref(), Some("\n "));
        assert_eq!(rule.raws.semicolon, Some(true));
        assert_eq!(root.raws.after.as_deref(), Some("\n"));
    }

    #[test]
    fn parses_bodyless_at_rule() {
        let root = parse("@charset \"utf-8\";", None).unwrap();
        let at = root.nodes[0].as_at_rule().unwrap();
        assert_eq!(at.name, "charset");
        assert_eq!(at.params, "\"utf-8\"");
        assert!(at.nodes.is_none());
        assert_eq!(at.raws.after_name.as_deref(), Some(" "));
        assert_eq!(root.raws.semicolon, Some(true));
    }

    #[test]
    fn parses_nested_at_rule() {
        let root = parse("@media screen { a { width: 0 } }", None).unwrap();
        let at = root.nodes[0].as_at_rule().unwrap();
        assert_eq!(at.name, "media");
        assert_eq!(at.params, "screen");
        assert_eq!(at.raws.between.as_deref(), Some(" "));
        let rule = at.nodes.as_ref().unwrap()[0].as_rule().unwrap();
        assert_eq!(rule.selector, "a");
    }

    #[test]
    fn at_rule_with_empty_params_keeps_spacing_in_between() {
        let root = parse("@media {}", None).unwrap();
        let at = root.nodes[0].as_at_rule().unwrap();
        assert_eq!(at.params, "");
        assert_eq!(at.raws.after_name.as_deref(), Some(""));
        assert_eq!(at.raws.between.as_deref(), Some(" "));
    }

    #[test]
    fn parses_important_variants() {
        let root = parse("a{color:red !important;width:0 ! important}", None).unwrap();
        let rule = root.nodes[0].as_rule().unwrap();
        let c = rule.nodes[0].as_decl().unwrap();
        assert!(c.important);
        assert_eq!(c.raws.important, None);
        let w = rule.nodes[1].as_decl().unwrap();
        assert!(w.important);
        assert_eq!(w.raws.important.as_deref(), Some(" ! important"));
        assert_eq!(w.value, "0");
    }

    #[test]
    fn value_with_comment_keeps_raw() {
        let root = parse("a{border:1px /*x*/ solid}", None).unwrap();
        let d = root.nodes[0].as_rule().unwrap().nodes[0].as_decl().unwrap();
        assert_eq!(d.value, "1px  solid");
        let raw = d.raws.value.as_ref().unwrap();
        assert_eq!(raw.raw, "1px /*x*/ solid");
    }

    #[test]
    fn comment_records_left_and_right() {
        let root = parse("/*  hello */", None).unwrap();
        let c = root.nodes[0].as_comment().unwrap();
        assert_eq!(c.text, "hello");
        assert_eq!(c.raws.left.as_deref(), Some("  "));
        assert_eq!(c.raws.right.as_deref(), Some(" "));
    }

    #[test]
    fn empty_comment_keeps_inner_space_on_left() {
        let root = parse("/* */", None).unwrap();
        let c = root.nodes[0].as_comment().unwrap();
        assert_eq!(c.text, "");
        assert_eq!(c.raws.left.as_deref(), Some(" "));
        assert_eq!(c.raws.right.as_deref(), Some(""));
    }

    #[test]
    fn stray_semicolon_becomes_own_semicolon() {
        let root = parse("a {} ;", None).unwrap();
        let rule = root.nodes[0].as_rule().unwrap();
        assert_eq!(rule.raws.own_semicolon.as_deref(), Some(" ;"));
    }

    #[test]
    fn unclosed_block_errors_at_opening() {
        let err = parse("\na {", None).unwrap_err();
        assert_eq!(err.message, "Unclosed block");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn unexpected_close_errors() {
        let err = parse("a { } }", None).unwrap_err();
        assert_eq!(err.message, "Unexpected }");
    }

    #[test]
    fn unknown_word_errors() {
        let err = parse("a { color red }", None).unwrap_err();
        assert_eq!(err.message, "Unknown word");
    }

    #[test]
    fn missed_semicolon_errors() {
        let err = parse("a { color: black color: white }", None).unwrap_err();
        assert_eq!(err.message, "Missed semicolon");
    }

    #[test]
    fn at_rule_without_name_errors() {
        let err = parse("@ media screen {}", None).unwrap_err();
        assert_eq!(err.message, "At-rule without name");
    }

    #[test]
    fn ie_star_hack_prop_keeps_marker_in_before() {
        let root = parse("a{*zoom:1}", None).unwrap();
        let d = root.nodes[0].as_rule().unwrap().nodes[0].as_decl().unwrap();
        assert_eq!(d.prop, "zoom");
        assert_eq!(d.raws.before.as_deref(), Some("*"));
    }

    #[test]
    fn tolerates_exotic_selectors() {
        let root = parse("a:not(.b):hover, *|x { width: 0 }", None).unwrap();
        let rule = root.nodes[0].as_rule().unwrap();
        assert_eq!(rule.selector, "a:not(.b):hover, *|x");
    }

    #[test]
    fn records_source_positions() {
        let root = parse("a {\n  color: red\n}", None).unwrap();
        let rule = root.nodes[0].as_rule().unwrap();
        let src = rule.source.as_ref().unwrap();
        assert_eq!(src.start.unwrap().line, 1);
        assert_eq!(src.end.unwrap().line, 3);
        let decl_src = rule.nodes[0].source().unwrap();
        assert_eq!(decl_src.start.unwrap().line, 2);
        assert_eq!(decl_src.start.unwrap().column, 3);
    }

    #[test]
    fn multibyte_value_resolves_end_position() {
        let root = parse("a{content:é}", None).unwrap();
        let d = root.nodes[0].as_rule().unwrap().nodes[0].as_decl().unwrap();
        assert_eq!(d.value, "é");
        let end = d.source.as_ref().unwrap().end.unwrap();
        assert_eq!(end.line, 1);
        assert_eq!(end.column, 11);
    }

    #[test]
    fn multibyte_at_rule_params_resolve_end_position() {
        let root = parse("@import déjà", None).unwrap();
        let at = root.nodes[0].as_at_rule().unwrap();
        assert_eq!(at.params, "déjà");
        let end = at.source.as_ref().unwrap().end.unwrap();
        assert_eq!(end.column, 12);
    }

    #[test]
    fn multibyte_comment_resolves_end_position() {
        let root = parse("/* é */", None).unwrap();
        let c = root.nodes[0].as_comment().unwrap();
        assert_eq!(c.source.as_ref().unwrap().end.unwrap().column, 7);
    }

    #[test]
    fn empty_input_gives_empty_root() {
        let root = parse("", None).unwrap();
        assert!(root.is_empty());
        assert_eq!(root.raws.after.as_deref(), Some(""));
        assert_eq!(root.raws.semicolon, None);
    }
}

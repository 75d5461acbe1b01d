// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for CSS source text.
//!
//! A hand-rolled byte scanner that splits a stylesheet into the coarse
//! tokens the parser consumes: whitespace runs, words, quoted strings,
//! comments, at-words, balanced `(...)` runs and the structural single-byte
//! tokens `{ } : ; ( ) [ ]`. Tokens borrow from the source and carry byte
//! offsets; line/column resolution happens later through
//! [`crate::input::Input`].
//!
//! The scanner is deliberately permissive: anything that is not a quoted
//! string, comment or structural byte becomes a word, so vendor-specific
//! and exotic syntax survives as opaque text. The only hard failures are
//! unterminated constructs (strings, comments, `url(` brackets).

use memchr::memchr;

use crate::error::ParseError;
use crate::input::Input;

/// Token classification. `Brackets` is a fully balanced `(...)` slice with
/// no nested specials; an unmatched or suspicious `(` falls back to the
/// structural `OpenParen` so the parser can track depth itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Space,
    Word,
    StringLit,
    Comment,
    AtWord,
    Brackets,
    OpenCurly,
    CloseCurly,
    Colon,
    Semicolon,
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
}

/// One token: classification, borrowed text and byte range (`end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, text: &'a str, start: usize, end: usize) -> Self {
        Token { kind, text, start, end }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\t' | b'\r' | b'\x0c')
}

/// Bytes that terminate a word.
fn is_word_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'{' | b'}' | b'(' | b')' | b':' | b';' | b'@' | b'!' | b'\'' | b'"' | b'\\' | b'[' | b']')
}

/// Bytes that terminate an at-word.
fn is_at_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'{' | b'}' | b'(' | b')' | b'\'' | b'"' | b'\\' | b';' | b'/' | b'[' | b']' | b'#')
}

/// Find the closing quote/paren at or after `from`, skipping escaped ones.
fn find_unescaped(bytes: &[u8], target: u8, mut from: usize) -> Option<usize> {
    loop {
        let found = from + memchr(target, &bytes[from..])?;
        let mut escape_pos = found;
        let mut escaped = false;
        while escape_pos > 0 && bytes[escape_pos - 1] == b'\\' {
            escape_pos -= 1;
            escaped = !escaped;
        }
        if !escaped {
            return Some(found);
        }
        from = found + 1;
    }
}

/// `(...)` content that cannot be collapsed into a single brackets token:
/// anything after the opening paren containing `\ / ( " '` or a newline.
fn bad_bracket(content: &[u8]) -> bool {
    content[1..]
        .iter()
        .any(|&b| matches!(b, b'\\' | b'/' | b'(' | b'"' | b'\'' | b'\n'))
}

/// Tokenizes CSS source text into a flat token sequence.
///
/// # Errors
///
/// Fails with a positioned [`ParseError`] on an unterminated string,
/// comment or `url(` bracket.
pub fn tokenize<'a>(input: &Input, css: &'a str) -> Result<Vec<Token<'a>>, ParseError> {
    let bytes = css.as_bytes();
    let len = bytes.len();
    let mut tokens: Vec<Token<'a>> = Vec::new();
    let mut pos = 0;

    while pos < len {
        let code = bytes[pos];
        match code {
            b if is_space(b) => {
                let mut next = pos + 1;
                while next < len && is_space(bytes[next]) {
                    next += 1;
                }
                tokens.push(Token::new(TokenKind::Space, &css[pos..next], pos, next));
                pos = next;
            }
            b'[' => {
                tokens.push(Token::new(TokenKind::OpenSquare, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b']' => {
                tokens.push(Token::new(TokenKind::CloseSquare, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b'{' => {
                tokens.push(Token::new(TokenKind::OpenCurly, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b'}' => {
                tokens.push(Token::new(TokenKind::CloseCurly, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b':' => {
                tokens.push(Token::new(TokenKind::Colon, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b';' => {
                tokens.push(Token::new(TokenKind::Semicolon, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b')' => {
                tokens.push(Token::new(TokenKind::CloseParen, &css[pos..pos + 1], pos, pos + 1));
                pos += 1;
            }
            b'(' => {
                let prev_is_url = tokens
                    .last()
                    .map(|t| t.kind == TokenKind::Word && t.text == "url")
                    .unwrap_or(false);
                let next_byte = bytes.get(pos + 1).copied();
                let unquoted_url = prev_is_url
                    && !matches!(next_byte, Some(b) if b == b'\'' || b == b'"' || is_space(b));
                if unquoted_url {
                    // Unquoted url() swallows everything up to the matching
                    // unescaped close paren.
                    match find_unescaped(bytes, b')', pos + 1) {
                        Some(close) => {
                            tokens.push(Token::new(
                                TokenKind::Brackets,
                                &css[pos..close + 1],
                                pos,
                                close + 1,
                            ));
                            pos = close + 1;
                        }
                        None => return Err(input.error("Unclosed bracket", pos)),
                    }
                } else {
                    match memchr(b')', &bytes[pos + 1..]) {
                        Some(rel) => {
                            let close = pos + 1 + rel;
                            let content = &bytes[pos..close + 1];
                            if bad_bracket(content) {
                                tokens.push(Token::new(
                                    TokenKind::OpenParen,
                                    &css[pos..pos + 1],
                                    pos,
                                    pos + 1,
                                ));
                                pos += 1;
                            } else {
                                tokens.push(Token::new(
                                    TokenKind::Brackets,
                                    &css[pos..close + 1],
                                    pos,
                                    close + 1,
                                ));
                                pos = close + 1;
                            }
                        }
                        None => {
                            tokens.push(Token::new(
                                TokenKind::OpenParen,
                                &css[pos..pos + 1],
                                pos,
                                pos + 1,
                            ));
                            pos += 1;
                        }
                    }
                }
            }
            b'\'' | b'"' => {
                match find_unescaped(bytes, code, pos + 1) {
                    Some(close) => {
                        tokens.push(Token::new(
                            TokenKind::StringLit,
                            &css[pos..close + 1],
                            pos,
                            close + 1,
                        ));
                        pos = close + 1;
                    }
                    None => return Err(input.error("Unclosed string", pos)),
                }
            }
            b'@' => {
                let mut next = pos + 1;
                while next < len && !is_at_end(bytes[next]) {
                    next += 1;
                }
                tokens.push(Token::new(TokenKind::AtWord, &css[pos..next], pos, next));
                pos = next;
            }
            b'\\' => {
                // A run of backslashes followed by at most one escaped byte.
                let mut next = pos;
                let mut escape = true;
                while next + 1 < len && bytes[next + 1] == b'\\' {
                    next += 1;
                    escape = !escape;
                }
                if escape && next + 1 < len && !is_space(bytes[next + 1]) && bytes[next + 1] != b'/'
                {
                    next += 1;
                    // Keep multi-byte escaped chars whole.
                    while next + 1 < len && !css.is_char_boundary(next + 1) {
                        next += 1;
                    }
                }
                tokens.push(Token::new(TokenKind::Word, &css[pos..next + 1], pos, next + 1));
                pos = next + 1;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                let mut from = pos + 2;
                let close = loop {
                    match memchr(b'*', &bytes[from..]) {
                        Some(rel) if bytes.get(from + rel + 1) == Some(&b'/') => {
                            break from + rel;
                        }
                        Some(rel) => from += rel + 1,
                        None => return Err(input.error("Unclosed comment", pos)),
                    }
                };
                tokens.push(Token::new(
                    TokenKind::Comment,
                    &css[pos..close + 2],
                    pos,
                    close + 2,
                ));
                pos = close + 2;
            }
            _ => {
                let mut next = pos + 1;
                while next < len {
                    let b = bytes[next];
                    if is_word_end(b) || (b == b'/' && bytes.get(next + 1) == Some(&b'*')) {
                        break;
                    }
                    next += 1;
                }
                tokens.push(Token::new(TokenKind::Word, &css[pos..next], pos, next));
                pos = next;
            }
        }
    }

    Ok(tokens)
}

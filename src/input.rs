// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Source text container with offset-to-position resolution.
//!
//! Every node parsed from a stylesheet shares one [`Input`] through an
//! `Arc`, so provenance survives arbitrary tree surgery without copying the
//! source. Tokens and errors carry byte offsets; line/column pairs are
//! derived lazily from a newline index built with `memchr`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ParseError;

static INPUT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A 1-based line/column position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source text.
    pub offset: usize,
}

/// The source text of one parse, plus its origin.
#[derive(Debug)]
pub struct Input {
    css: String,
    file: Option<String>,
    /// Byte offsets of every `\n` in `css`, ascending.
    line_starts: Vec<usize>,
    id: u64,
}

impl Input {
    pub fn new(css: String, file: Option<String>) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', css.as_bytes()).map(|i| i + 1));
        Input {
            css,
            file,
            line_starts,
            id: INPUT_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The raw source text.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Origin file, when the caller supplied one.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Display name used in diagnostics and source maps when no file is
    /// known. Mirrors the reference engine's `<input css N>` naming.
    pub fn name(&self) -> String {
        match &self.file {
            Some(f) => f.clone(),
            None => format!("<input css {}>", self.id),
        }
    }

    /// Resolve a byte offset to a 1-based line/column position. Offsets
    /// inside a multi-byte character snap back to the character's start.
    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.css.len());
        while !self.css.is_char_boundary(offset) {
            offset -= 1;
        }
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.css[self.line_starts[line_idx]..offset].chars().count() + 1;
        Position {
            line: line_idx + 1,
            column,
            offset,
        }
    }

    /// Build a positioned [`ParseError`] at a byte offset.
    pub fn error(&self, message: impl Into<String>, offset: usize) -> ParseError {
        let pos = self.position(offset);
        ParseError {
            message: message.into(),
            line: pos.line,
            column: pos.column,
            file: self.file.clone(),
            offset: pos.offset,
        }
    }
}

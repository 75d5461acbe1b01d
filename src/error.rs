// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the engine.
//!
//! This module provides a unified error type ([`Error`]) covering every
//! failure kind the engine can surface, plus the positioned [`ParseError`]
//! raised for malformed stylesheets.
//!
//! ## Failure kinds
//!
//! - Missing input: the caller handed the processor no text at all.
//! - Parse errors: malformed syntax, carries a line/column position.
//! - Invalid event names: a listener was registered against a name outside
//!   the `<type>[.enter|.exit]` grammar.
//! - Plugin errors: a plugin failed or rejected during a pipeline run.
//!
//! ## Design
//!
//! - **Unified type**: [`Error`] is the single error type the processor and
//!   dispatcher return to callers.
//! - **Bridging**: `impl From<ParseError> for Error` bridges the parser.
//! - **No silent recovery**: every kind aborts the operation in progress;
//!   warnings are the only non-fatal channel (see [`crate::Warning`]).

use thiserror::Error;

// ============================================================================
// Parse errors
// ============================================================================

/// A syntax error raised while parsing a stylesheet.
///
/// Carries the 1-based line/column of the offending character and the origin
/// file when one was given to [`crate::parse`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}:{line}:{column}: {message}", file.as_deref().unwrap_or("<css input>"))]
pub struct ParseError {
    /// Human-readable description, e.g. `Unclosed string`.
    pub message: String,
    /// 1-based line of the error.
    pub line: usize,
    /// 1-based column of the error.
    pub column: usize,
    /// Origin file, when known.
    pub file: Option<String>,
    /// Byte offset of the error in the source.
    pub offset: usize,
}

// ============================================================================
// Unified error type
// ============================================================================

/// Unified error type for parsing, event registration and pipeline runs.
#[derive(Debug, Error)]
pub enum Error {
    /// The processor received no CSS text at all. This is a programmer
    /// error distinct from a syntax error in real text.
    #[error("received null instead of a CSS string")]
    MissingInput,

    /// Malformed stylesheet syntax.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A listener was registered against a malformed event name.
    #[error("invalid event name '{name}': {reason}")]
    InvalidEventName { name: String, reason: String },

    /// A plugin failed during pipeline execution. Mutations applied by
    /// earlier plugins are not rolled back.
    #[error("plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },

    /// An asynchronous plugin was encountered in a synchronous run.
    #[error("plugin '{name}' is asynchronous; use finish() instead of sync()")]
    AsyncPlugin { name: String },

    /// Source map serialization failed.
    #[error("source map error: {0}")]
    SourceMap(String),
}

impl Error {
    /// Position of the failure, when the kind carries one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Error::Parse(e) => Some((e.line, e.column)),
            _ => None,
        }
    }
}

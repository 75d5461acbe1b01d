// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A CSS transformation engine built on a lossless syntax tree.
//!
//! The engine turns stylesheet text into a mutable tree, lets code rework
//! that tree, and turns it back into text. Three properties shape the whole
//! design:
//!
//! - **Lossless round-trips.** Every byte of the input — indentation, odd
//!   spacing, comments, stray semicolons — is captured in per-node "raws",
//!   so `stringify(parse(t))` reproduces `t` exactly. Untouched regions of
//!   an edited document come back byte-identical.
//! - **Style-aware mutation.** Synthetic nodes carry no formatting; the
//!   stringifier derives their separators from the surrounding document, so
//!   programmatic edits blend into hand-written CSS.
//! - **Mutation-tolerant traversal.** Event listeners registered with
//!   [`Root::on`] run against the live tree and may restructure it mid-walk;
//!   the dispatcher re-walks to fixpoint so every listener sees every node.
//!
//! # Quick start
//!
//! ```
//! use stilo::{parse, stringify};
//!
//! let mut root = parse("a { color: black }", None)?;
//! root.walk_decls(|d| d.value = "white".to_owned());
//! assert_eq!(stringify(&root), "a { color: white }");
//! # Ok::<(), stilo::ParseError>(())
//! ```
//!
//! Pipelines wrap the same tree in named, reusable transforms:
//!
//! ```
//! use stilo::{Plugin, ProcessOptions, Processor};
//!
//! let upper = Plugin::new("upper-props", |root, _ctx| {
//!     root.walk_decls(|d| d.prop = d.prop.to_uppercase());
//!     Ok(())
//! });
//! let result = Processor::new()
//!     .use_plugin(upper)
//!     .process("a { color: black }", ProcessOptions::default())
//!     .sync()?;
//! assert_eq!(result.css(), "a { COLOR: black }");
//! # Ok::<(), stilo::Error>(())
//! ```
//!
//! # Module map
//!
//! - [`tokenizer`] / [`parser`] — text to tree, raws captured.
//! - [`nodes`] — the tree, node identity, mutation primitives.
//! - [`stringifier`] — tree to text, derived defaults for missing raws.
//! - [`visitor`] — event listeners, the cursor, the fixpoint dispatcher.
//! - [`plugin`] / [`processor`] / [`result`] — the pipeline.
//! - [`map`] — source maps.

pub mod error;
pub mod input;
pub mod map;
pub mod nodes;
pub mod parser;
pub mod plugin;
pub mod processor;
pub mod result;
pub mod stringifier;
pub mod tokenizer;
pub mod visitor;

pub use error::{Error, ParseError};
pub use input::{Input, Position};
pub use map::MapOptions;
pub use nodes::{
    at_rule, at_rule_bodyless, comment, decl, rule, AtRule, Comment, Container, Declaration, Node,
    NodeId, Root, Rule,
};
pub use parser::parse;
pub use plugin::{Plugin, PluginContext, PluginFactory, PluginSpec};
pub use processor::{CssSource, LazyResult, ProcessOptions, Processor};
pub use result::{ProcessResult, Warning};
pub use stringifier::stringify;
pub use visitor::{dispatch, Cursor};

/// The crate version, stamped onto plugins built by a
/// [`PluginFactory`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render a parse error as an annotated snippet of the offending source.
pub fn prettify_error(css: &str, error: &ParseError) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let origin = error.file.as_deref().unwrap_or("<css input>");
    let span_start = error.offset.min(css.len());
    let span_end = (span_start + 1).min(css.len()).max(span_start);
    let message = Level::Error.title(&error.message).snippet(
        Snippet::source(css)
            .origin(origin)
            .fold(true)
            .annotation(Level::Error.span(span_start..span_end)),
    );
    Renderer::styled().render(message).to_string()
}

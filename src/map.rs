// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Source map generation.
//!
//! Each node that survived from a parse carries its origin position; the
//! tracked stringifier reports where that node landed in the output. This
//! module folds those pairs into a standard JSON source map, with the
//! original stylesheet text embedded as `sourcesContent`. Inputs parsed
//! without a file name appear under their `<input css N>` pseudo-name.
//!
//! Inline maps (the default) are appended to the CSS as a
//! `/*# sourceMappingURL=data:application/json;base64,... */` annotation.
//! External maps are returned as a separate JSON payload, with the
//! annotation pointing at `<to>.map` when the caller named an output file.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sourcemap::SourceMapBuilder;

use crate::error::Error;
use crate::nodes::Root;
use crate::stringifier::stringify_tracked;

/// How to emit the source map for a pipeline run.
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Embed the map in the CSS as a base64 data URL. When false the map
    /// is returned as a separate payload instead.
    pub inline: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions { inline: true }
    }
}

/// Stringify `root` and build its source map.
///
/// Returns the CSS (annotated per `opts`) and, for external maps, the map
/// JSON.
pub(crate) fn generate(
    root: &Root,
    to: Option<&str>,
    opts: &MapOptions,
) -> Result<(String, Option<String>), Error> {
    let (css, events) = stringify_tracked(root);

    let mut builder = SourceMapBuilder::new(to);
    let mut source_ids: HashMap<String, u32> = HashMap::new();
    for event in &events {
        let name = event.input.name();
        let src_id = *source_ids.entry(name).or_insert_with_key(|name| {
            let id = builder.add_source(name);
            builder.set_source_contents(id, Some(event.input.css()));
            id
        });
        builder.add_raw(
            event.dst_line,
            event.dst_col,
            event.src_line,
            event.src_col,
            Some(src_id),
            None,
            false,
        );
    }
    let map = builder.into_sourcemap();
    let mut buf = Vec::new();
    map.to_writer(&mut buf)
        .map_err(|e| Error::SourceMap(e.to_string()))?;

    if opts.inline {
        let url = format!("data:application/json;base64,{}", STANDARD.encode(&buf));
        Ok((annotate(css, &url), None))
    } else {
        let json = String::from_utf8(buf).map_err(|e| Error::SourceMap(e.to_string()))?;
        let css = match to {
            Some(to) => annotate(css, &format!("{to}.map")),
            None => css,
        };
        Ok((css, Some(json)))
    }
}

/// Append a `sourceMappingURL` comment, reusing the stylesheet's own
/// trailing newline as the separator when it has one.
fn annotate(css: String, url: &str) -> String {
    let sep = if css.ends_with('\n') { "" } else { "\n" };
    format!("{css}{sep}/*# sourceMappingURL={url} */")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn inline_map_is_appended_as_annotation() {
        let root = parse("a {}\n", None).unwrap();
        let (css, map) = generate(&root, None, &MapOptions::default()).unwrap();
        assert!(css.starts_with("a {}\n"));
        assert!(css.contains("/*# sourceMappingURL=data:application/json;base64,"));
        assert!(map.is_none());
    }

    #[test]
    fn inline_annotation_reuses_the_trailing_newline() {
        let root = parse("a {}\n", None).unwrap();
        let (css, _) = generate(&root, None, &MapOptions::default()).unwrap();
        assert!(css.starts_with("a {}\n/*# sourceMappingURL="));
        assert!(!css.contains("\n\n/*#"));
        assert!(!css.contains("charset"));
    }

    #[test]
    fn inline_payload_decodes_to_a_valid_map() {
        let root = parse("a { color: red }", Some("in.css")).unwrap();
        let (css, _) = generate(&root, None, &MapOptions::default()).unwrap();
        let start = css.find("base64,").unwrap() + "base64,".len();
        let end = css.rfind(" */").unwrap();
        let bytes = STANDARD.decode(&css[start..end]).unwrap();
        let parsed = sourcemap::SourceMap::from_slice(&bytes).unwrap();
        assert_eq!(parsed.get_source(0), Some("in.css"));
    }

    #[test]
    fn external_map_is_returned_separately() {
        let root = parse("a { color: red }\n", Some("in.css")).unwrap();
        let opts = MapOptions { inline: false };
        let (css, map) = generate(&root, Some("out.css"), &opts).unwrap();
        assert!(css.ends_with("/*# sourceMappingURL=out.css.map */"));
        let json: serde_json::Value = serde_json::from_str(&map.unwrap()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["sources"][0], "in.css");
    }

    #[test]
    fn anonymous_inputs_use_pseudo_names() {
        let root = parse("a {}", None).unwrap();
        let opts = MapOptions { inline: false };
        let (_, map) = generate(&root, None, &opts).unwrap();
        let json: serde_json::Value = serde_json::from_str(&map.unwrap()).unwrap();
        let source = json["sources"][0].as_str().unwrap();
        assert!(source.starts_with("<input css"));
    }

    #[test]
    fn sources_content_embeds_the_input() {
        let css_in = "a { color: red }";
        let root = parse(css_in, Some("x.css")).unwrap();
        let opts = MapOptions { inline: false };
        let (_, map) = generate(&root, None, &opts).unwrap();
        let json: serde_json::Value = serde_json::from_str(&map.unwrap()).unwrap();
        assert_eq!(json["sourcesContent"][0], css_in);
    }

    #[test]
    fn mappings_cover_nested_nodes() {
        let root = parse("@media x {\n  a { color: red }\n}\n", Some("n.css")).unwrap();
        let opts = MapOptions { inline: false };
        let (_, map) = generate(&root, None, &opts).unwrap();
        let parsed = sourcemap::SourceMap::from_slice(map.unwrap().as_bytes()).unwrap();
        // atrule, rule and decl each contribute a token.
        assert!(parsed.get_token_count() >= 3);
    }

    #[test]
    fn synthetic_nodes_do_not_break_the_map() {
        let mut root = parse("a {}\n", None).unwrap();
        use crate::nodes::{rule, Container};
        root.append(rule("b"));
        let (css, _) = generate(&root, None, &MapOptions::default()).unwrap();
        assert!(css.contains("b {}"));
    }
}

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Byte-exact round-trip tests: `stringify(parse(t)) == t` for untouched
//! trees, across formatting styles a parser is likely to meet in the wild.

use difference::Changeset;
use itertools::Itertools;
use stilo::{parse, stringify};

/// Make whitespace visible in failure output: `▩` for spaces, `↩` before
/// newlines.
fn visualize(text: &str) -> String {
    text.replace(' ', "▩").replace('\n', "↩\n")
}

fn assert_roundtrip(css: &str) {
    let root = match parse(css, None) {
        Ok(root) => root,
        Err(e) => panic!("parse failed for {}:\n{e}", visualize(css)),
    };
    let out = stringify(&root);
    if out != css {
        let changeset = Changeset::new(&visualize(css), &visualize(&out), "\n");
        panic!("round-trip mismatch:\n{changeset}");
    }
}

fn assert_all(cases: &[&str]) {
    for css in cases {
        assert_roundtrip(css);
    }
}

#[test]
fn plain_rules() {
    assert_all(&[
        "a{}",
        "a {}",
        "a{color:red}",
        "a { color: red }",
        "a {\n  color: red;\n}\n",
        "a,\nb {\n\tcolor: red;\n}\n",
        "a { color: red; background: blue }",
        "{}",
    ]);
}

#[test]
fn whitespace_extremes() {
    assert_all(&[
        "",
        "   ",
        "\n\n\n",
        "\t a \t { \n }\t\n",
        "a{}\n\n\n\nb{}",
        "a {  }  ;  \n",
        "a{;}",
    ]);
}

#[test]
fn comments_everywhere() {
    assert_all(&[
        "/* plain */",
        "/**/",
        "/* */",
        "/*no spaces*/",
        "/* outer */ a { /* inner */ color: red /* trailing */ }",
        "a/*x*/b {}",
        "a { color: /* why */ red }",
        "a { border: 1px /*x*/ solid /*y*/ black }",
        "/* unclosed star * inside */a{}",
    ]);
}

#[test]
fn at_rules() {
    assert_all(&[
        "@charset \"utf-8\";",
        "@import url(foo.css);",
        "@import \"a\" ;",
        "@media screen {}",
        "@media {}",
        "@media screen{a{color:red}}",
        "@media (min-width: 480px) and (max-width: 767px) {\n  a { width: 100% }\n}\n",
        "@supports (display: grid) { a { display: grid } }",
        "@font-face {\n    font-family: \"Example\";\n    src: url(example.woff);\n}\n",
        "@media screen {\n}\n",
    ]);
}

#[test]
fn declarations_with_odd_shapes() {
    assert_all(&[
        "a{color:red !important}",
        "a{color:red ! important}",
        "a{color:red !IMPORTANT}",
        "a{*zoom:1}",
        "a{_height:10px}",
        "a { filter: progid:DXImageTransform.Microsoft.gradient(startColorstr='#550000FF') }",
        "a { background: url(/gif/logo.gif?a=b&c=d) }",
        "a { background: url('single \\' quote') }",
        "a { content: \"}\" }",
        "a { content: \"a\\\"b\" }",
        "a { margin: 0 0 0 0 }",
        "a { width: calc(100% - (2 * 10px)) }",
    ]);
}

#[test]
fn selectors_with_odd_shapes() {
    assert_all(&[
        "a:not(.b):hover {}",
        "a[href=\"#\"] {}",
        "a[data-x='{'] {}",
        "*|a {}",
        ".a.b.c {}",
        "a >b~ c {}",
        "a\n,\nb {}",
    ]);
}

#[test]
fn nesting_and_semicolons() {
    assert_all(&[
        "@media a { @media b { c { d: e } } }",
        "a { b: c; }",
        "a { b: c ; }",
        "a { b: c;; }",
        "a {} ;",
        "a {};b {}",
        "@media x { a {} ; b {} }",
    ]);
}

#[test]
fn multibyte_text_survives() {
    assert_all(&[
        "/* комментарий */\na { content: \"цвет\" }\n",
        "a::before { content: \"🎨\" }",
        "a { font-family: \"Помощь\", sans-serif }",
    ]);
}

#[test]
fn real_world_shaped_document() {
    let css = [
        "/* reset */",
        "* { margin: 0; padding: 0 }",
        "",
        "@media screen and (min-width: 480px) {",
        "    .nav {",
        "        display: flex;",
        "        background: url(/img/nav.png) no-repeat;",
        "    }",
        "    .nav:hover { opacity: 0.9 }",
        "}",
        "",
        ".footer { color: #888 !important }",
        "",
    ]
    .iter()
    .join("\n");
    assert_roundtrip(&css);
}

#[test]
fn parse_errors_do_not_panic() {
    for css in ["a {", "a { color: red", "}", "a { /* x }", "\"", "a { b }"] {
        assert!(parse(css, None).is_err(), "expected error for {css:?}");
    }
}

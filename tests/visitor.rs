// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Event listeners against a mutating tree: registration grammar, walk
//! order, and the re-walk loop that lets chained listeners converge.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stilo::{decl, dispatch, parse, stringify, Container, Error, Node};

#[test]
fn plain_name_and_enter_share_the_event() {
    let mut root = parse("a{color:red}", None).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    for name in ["decl", "decl.enter"] {
        let hits = hits.clone();
        root.on(name, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    }
    dispatch(&mut root).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn bad_event_names_are_rejected_on_registration() {
    let mut root = parse("", None).unwrap();
    for name in ["decl.abcd", "decl.exit.abcd", "rule.enter.exit"] {
        let err = root.on(name, |_| Ok(())).unwrap_err();
        assert!(
            matches!(err, Error::InvalidEventName { .. }),
            "expected rejection for {name:?}"
        );
    }
}

#[test]
fn unknown_event_types_are_inert() {
    let mut root = parse("a { color: red }", None).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    for name in ["selector", "role.exit"] {
        let hits = hits.clone();
        root.on(name, move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();
    }
    dispatch(&mut root).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(stringify(&root), "a { color: red }");
}

#[test]
fn exit_fires_after_the_subtree() {
    let mut root = parse("@media x { a { color: red } }", None).unwrap();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();

    let l = log.clone();
    root.on("atrule.exit", move |_| {
        l.lock().unwrap().push("atrule.exit");
        Ok(())
    })
    .unwrap();
    let l = log.clone();
    root.on("decl", move |_| {
        l.lock().unwrap().push("decl.enter");
        Ok(())
    })
    .unwrap();

    dispatch(&mut root).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["decl.enter", "atrule.exit"]);
}

/// The will-change idiom: pair each `will-change` declaration with a
/// `backface-visibility` sibling, inserted just before it.
fn add_backface_listener(root: &mut stilo::Root) {
    root.on("decl", |c| {
        let is_will_change = c
            .node()
            .and_then(Node::as_decl)
            .is_some_and(|d| d.prop == "will-change");
        if !is_will_change {
            return Ok(());
        }
        let already = c.siblings().iter().any(|n| {
            n.as_decl()
                .is_some_and(|d| d.prop == "backface-visibility")
        });
        if !already {
            c.insert_before(decl("backface-visibility", "hidden"));
        }
        Ok(())
    })
    .unwrap();
}

#[test]
fn listener_pairs_will_change_inside_media_blocks() {
    let css = "@media screen and(min-width: 480 px) {\
               body {background-color: lightgreen;color: red;}\
               .foo {will-change: transform; }}\
               div {color: green;}";
    let mut root = parse(css, None).unwrap();
    add_backface_listener(&mut root);
    dispatch(&mut root).unwrap();
    assert_eq!(
        stringify(&root),
        "@media screen and(min-width: 480 px) {\
         body {background-color: lightgreen;color: red;}\
         .foo {backface-visibility: hidden;will-change: transform; }}\
         div {color: green;}"
    );
}

#[test]
fn listener_is_idempotent_across_re_walks() {
    let mut root = parse(".b{ will-change: transform; }", None).unwrap();
    add_backface_listener(&mut root);
    dispatch(&mut root).unwrap();
    // A second dispatch must not duplicate the inserted declaration.
    dispatch(&mut root).unwrap();
    assert_eq!(
        stringify(&root),
        ".b{ backface-visibility: hidden; will-change: transform; }"
    );
}

#[test]
fn root_wide_edits_from_a_listener_reach_fixpoint() {
    // One listener reacts to `will-change` by editing a *different* rule
    // through the root handle; the other pairs `will-change` with
    // `backface-visibility`. Convergence needs repeated walks.
    let mut root = parse(".a{ color: red; } .b{ will-change: transform; }", None).unwrap();
    add_backface_listener(&mut root);
    root.on("decl", |c| {
        let is_will_change = c
            .node()
            .and_then(Node::as_decl)
            .is_some_and(|d| d.prop == "will-change");
        if !is_will_change {
            return Ok(());
        }
        c.root_mut().walk_rules(|rule| {
            let has_will_change = rule
                .nodes
                .iter()
                .any(|n| n.as_decl().is_some_and(|d| d.prop == "will-change"));
            let color_at = rule
                .nodes
                .iter()
                .position(|n| n.as_decl().is_some_and(|d| d.prop == "color"));
            if let Some(at) = color_at {
                if !has_will_change {
                    rule.insert_before(at, decl("will-change", "transform"));
                }
            }
        });
        Ok(())
    })
    .unwrap();

    dispatch(&mut root).unwrap();
    assert_eq!(
        stringify(&root),
        ".a{ backface-visibility: hidden; will-change: transform; color: red; } \
         .b{ backface-visibility: hidden; will-change: transform; }"
    );
}

#[test]
fn removing_during_enter_skips_the_subtree() {
    let mut root = parse("a{color:red}b{width:0}", None).unwrap();
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();

    root.on("rule", |c| {
        let is_a = c.node().and_then(Node::as_rule).is_some_and(|r| r.selector == "a");
        if is_a {
            c.remove_self();
        }
        Ok(())
    })
    .unwrap();
    let s = seen.clone();
    root.on("decl", move |c| {
        if let Some(d) = c.node().and_then(Node::as_decl) {
            s.lock().unwrap().push(d.prop.clone());
        }
        Ok(())
    })
    .unwrap();

    dispatch(&mut root).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["width"]);
    assert_eq!(stringify(&root), "b{width:0}");
}

#[test]
fn replace_self_is_seen_by_matching_listeners() {
    let mut root = parse("a{/*note*/}", None).unwrap();
    root.on("comment", |c| {
        c.replace_self(decl("content", "\"note\""));
        Ok(())
    })
    .unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    root.on("decl", move |_| {
        h.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    dispatch(&mut root).unwrap();
    assert!(hits.load(Ordering::SeqCst) >= 1);
    let rule = root.nodes[0].as_rule().unwrap();
    assert!(rule.nodes[0].as_decl().is_some());
}

#[test]
fn listener_error_stops_the_walk() {
    let mut root = parse("a{}b{}", None).unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    root.on("rule", move |c| {
        s.fetch_add(1, Ordering::SeqCst);
        if c.index() == 0 {
            return Err(Error::Plugin {
                name: "strict".to_owned(),
                message: "first rule rejected".to_owned(),
            });
        }
        Ok(())
    })
    .unwrap();
    assert!(dispatch(&mut root).is_err());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn appending_behind_the_cursor_is_eventually_visited() {
    // The rule listener appends a trailing comment once; the comment
    // listener proves a later walk reaches it.
    let mut root = parse("a{}", None).unwrap();
    let comment_seen = Arc::new(AtomicUsize::new(0));

    root.on("rule", |c| {
        let root = c.root_mut();
        let any_comment = root
            .nodes
            .iter()
            .any(|n| n.as_comment().is_some());
        if !any_comment {
            root.append(stilo::comment("end"));
        }
        Ok(())
    })
    .unwrap();
    let cs = comment_seen.clone();
    root.on("comment", move |_| {
        cs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    dispatch(&mut root).unwrap();
    assert!(comment_seen.load(Ordering::SeqCst) >= 1);
}

#[test]
fn container_append_through_cursor() {
    let mut root = parse("a{}", None).unwrap();
    root.on("rule", |c| {
        if c.node().and_then(|n| n.nodes()).is_some_and(Vec::is_empty) {
            c.append(decl("color", "red"));
        }
        Ok(())
    })
    .unwrap();
    dispatch(&mut root).unwrap();
    let rule = root.nodes[0].as_rule().unwrap();
    assert_eq!(rule.nodes.len(), 1);
}

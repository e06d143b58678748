mod common;

use std::rc::Rc;

use common::{tagger, App};
use haskle_vdom::decode::{at, string, succeed};
use haskle_vdom::{keyed_node, map_handler, node, on, text, Handler, Options, VNode};
use serde_json::json;

fn click(msg: u32) -> Handler<u32> {
    Handler::Normal(succeed(msg))
}

fn button(handler: Handler<u32>) -> VNode<u32> {
    node("button", vec![on("click", handler)], vec![text("go")])
}

#[test]
fn messages_go_through_every_tagger_innermost_first() {
    let tree = node(
        "div",
        vec![],
        vec![button(click(1)).map(|m| m * 10).map(|m| m + 2)],
    )
    .map(|m| m + 1000);
    let app = App::mount(tree);

    app.fire(app.at(&[0]), "click", json!({}));
    assert_eq!(app.take_messages(), vec![(1 * 10 + 2 + 1000, false)]);
}

#[test]
fn events_bubble_to_ancestor_handlers() {
    let tree = node("div", vec![on("click", click(7))], vec![button(click(1))]);
    let app = App::mount(tree);
    app.fire(app.at(&[0]), "click", json!({}));
    assert_eq!(app.take_messages(), vec![(1, false), (7, false)]);
}

#[test]
fn retag_updates_the_existing_event_root() {
    let (plus_one, plus_hundred) = (tagger(|m| m + 1), tagger(|m| m + 100));
    let handler = click(1);
    let view = |t| node("div", vec![], vec![button(handler.clone()).map_with(t)]);

    let mut app = App::mount(view(plus_one.clone()));
    let btn = app.at(&[0]);
    app.fire(btn, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(2, false)]);

    assert_eq!(app.update(view(plus_one)), 0);
    assert_eq!(app.update(view(plus_hundred)), 1);
    assert_eq!(app.at(&[0]), btn);
    app.fire(btn, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(101, false)]);
}

#[test]
fn redraw_under_a_tagger_keeps_the_mapping() {
    let t = tagger(|m| m + 50);
    let mut app = App::mount(node("div", vec![], vec![button(click(1))]).map_with(t.clone()));
    app.update(node("section", vec![], vec![button(click(2))]).map_with(t));

    let btn = app.at(&[0]);
    app.fire(btn, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(52, false)]);
}

#[test]
fn same_kind_handler_is_swapped_in_place() {
    let mut app = App::mount(button(click(1)));
    let btn = app.root();
    let before = app.vdom.reconciler().callback(btn, "click").unwrap();

    app.update(button(click(2)));
    let after = app.vdom.reconciler().callback(btn, "click").unwrap();
    assert!(Rc::ptr_eq(&before, &after));
    assert_eq!(app.doc.listener_count(btn, "click"), 1);

    app.fire(btn, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(2, false)]);
}

#[test]
fn kind_change_replaces_the_listener() {
    let mut app = App::mount(button(click(1)));
    let btn = app.root();
    let before = app.vdom.reconciler().callback(btn, "click").unwrap();

    app.update(button(Handler::MayStopPropagation(succeed((3, true)))));
    let after = app.vdom.reconciler().callback(btn, "click").unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(app.doc.listener_count(btn, "click"), 1);

    app.fire(btn, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(3, true)]);
}

#[test]
fn removed_handler_unregisters() {
    let mut app = App::mount(button(click(1)));
    let btn = app.root();
    app.update(node("button", vec![], vec![text("go")]));
    assert_eq!(app.doc.listener_count(btn, "click"), 0);
    assert!(app.vdom.reconciler().callback(btn, "click").is_none());

    app.fire(btn, "click", json!({}));
    assert!(app.take_messages().is_empty());
}

#[test]
fn decode_failures_are_dropped() {
    let input = |prefix: &'static str| -> VNode<u32> {
        let decoder = at(["target", "value"], string()).map(move |s: String| {
            (s.strip_prefix(prefix).map_or(0, |rest| rest.len() as u32), true)
        });
        node(
            "div",
            vec![on("input", click(9))],
            vec![node("input", vec![on("input", Handler::MayStopPropagation(decoder))], vec![])],
        )
    };
    let app = App::mount(input("a"));
    let field = app.at(&[0]);

    // Undecodable: the inner handler does nothing and the event bubbles.
    let event = app.fire(field, "input", json!({"target": {}}));
    assert!(!event.propagation_stopped());
    assert_eq!(app.take_messages(), vec![(9, false)]);

    let event = app.fire(field, "input", json!({"target": {"value": "abc"}}));
    assert!(event.propagation_stopped());
    assert_eq!(app.take_messages(), vec![(2, true)]);
}

#[test]
fn listeners_are_passive_unless_they_may_prevent_default() {
    let tree: VNode<u32> = node(
        "form",
        vec![
            on("submit", Handler::MayPreventDefault(succeed((1, true)))),
            on("scroll", click(2)),
        ],
        vec![],
    );
    let app = App::mount(tree.clone());
    let form = app.root();
    assert_eq!(app.doc.listener_is_passive(form, "scroll"), Some(true));
    assert_eq!(app.doc.listener_is_passive(form, "submit"), Some(false));
    assert!(app.fire(form, "submit", json!({})).default_prevented());

    let app = App::mount_with(
        tree,
        Options {
            passive_listeners: false,
        },
    );
    assert_eq!(app.doc.listener_is_passive(app.root(), "scroll"), Some(false));
}

#[test]
fn moved_keyed_children_keep_their_listeners() {
    let row = |k: u32| (k.to_string(), button(click(k)));
    let mut app = App::mount(keyed_node("ul", vec![], vec![row(1), row(2), row(3)]));
    let first = app.at(&[0]);

    app.update(keyed_node("ul", vec![], vec![row(2), row(3), row(1)]));
    assert_eq!(app.at(&[2]), first);
    app.fire(first, "click", json!({}));
    assert_eq!(app.take_messages(), vec![(1, false)]);
}

#[test]
fn mapped_handlers_keep_their_kind() {
    let handler = map_handler(|m: u32| m + 1, Handler::MayStopPropagation(succeed((4, true))));
    let app = App::mount(node("a", vec![on("click", handler)], vec![]));
    let event = app.fire(app.root(), "click", json!({}));
    assert!(event.propagation_stopped());
    assert_eq!(app.take_messages(), vec![(5, true)]);
}

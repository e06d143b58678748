mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{fresh_html, keyed_list, App};
use haskle_dom::{Document, NodeId};
use haskle_vdom::{
    attribute, custom, lazy, node, node_ns, string_property, text, thunk, CustomPatch, Options,
    ReconcileError, Ref, VNode, VirtualDom, Widget,
};
use serde_json::json;

// ── Keyed children ────────────────────────────────────────────────────────

#[test]
fn adjacent_swap_moves_the_original_nodes() {
    let mut app: App<()> = App::mount(keyed_list(&["a", "b", "c"]));
    let a = app.at(&[0]);
    let b = app.at(&[1]);
    let c = app.at(&[2]);

    app.update(keyed_list(&["b", "a", "c"]));
    assert_eq!(app.html(), "<ul><li>b</li><li>a</li><li>c</li></ul>");
    assert_eq!(app.doc.child_nodes(app.root()), &[b, a, c]);
}

#[test]
fn prepend_and_append_keep_existing_nodes() {
    let mut app: App<()> = App::mount(keyed_list(&["b", "c"]));
    let b = app.at(&[0]);
    let c = app.at(&[1]);

    app.update(keyed_list(&["a", "b", "c", "d"]));
    assert_eq!(
        app.html(),
        "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>"
    );
    assert_eq!(app.at(&[1]), b);
    assert_eq!(app.at(&[2]), c);
}

#[test]
fn removal_in_the_middle_keeps_neighbours() {
    let mut app: App<()> = App::mount(keyed_list(&["a", "b", "c"]));
    let a = app.at(&[0]);
    let c = app.at(&[2]);

    app.update(keyed_list(&["a", "c"]));
    assert_eq!(app.doc.child_nodes(app.root()), &[a, c]);
}

#[test]
fn moved_child_is_patched_on_the_way() {
    let li = |k: &str, label: &str| (k.to_owned(), node("li", vec![], vec![text(label)]));
    let old: VNode<()> = haskle_vdom::keyed_node("ul", vec![], vec![li("a", "A"), li("b", "B")]);
    let new: VNode<()> = haskle_vdom::keyed_node("ul", vec![], vec![li("b", "B2"), li("a", "A2")]);

    let mut app = App::mount(old);
    let a = app.at(&[0]);
    let b = app.at(&[1]);
    app.update(new);
    assert_eq!(app.html(), "<ul><li>B2</li><li>A2</li></ul>");
    assert_eq!(app.doc.child_nodes(app.root()), &[b, a]);
}

#[test]
fn duplicate_keys_still_converge() {
    let steps: [&[&str]; 4] = [&["k", "k"], &["k"], &["k", "x", "k", "k"], &["x", "k"]];
    let mut app: App<()> = App::mount(keyed_list(&["k"]));
    for keys in steps {
        let tree = keyed_list(keys);
        app.update(tree.clone());
        assert!(app.matches(&tree), "{keys:?}: {} vs {}", app.html(), fresh_html(&tree));
    }
}

#[test]
fn swap_after_a_removal_moves_the_later_duplicate() {
    let mut app: App<()> = App::mount(keyed_list(&["b", "c", "a", "b"]));
    let old: Vec<NodeId> = app.doc.child_nodes(app.root()).to_vec();

    // "b" is removed, then the (a, b) pair swaps. The swap pairs the later
    // old "b" with the new one; the first "b" is dropped.
    app.update(keyed_list(&["d", "c", "b", "a"]));
    assert_eq!(
        app.html(),
        "<ul><li>d</li><li>c</li><li>b</li><li>a</li></ul>"
    );
    assert_eq!(app.at(&[1]), old[1]);
    assert_eq!(app.at(&[2]), old[3]);
    assert_eq!(app.at(&[3]), old[2]);
    assert_eq!(app.doc.parent_node(old[0]), None);
}

#[test]
fn element_to_keyed_with_same_tag_is_diffed_not_redrawn() {
    let plain: VNode<()> = node("ul", vec![], vec![node("li", vec![], vec![text("a")])]);
    let mut app = App::mount(plain);
    let root = app.root();
    let li = app.at(&[0]);

    app.update(keyed_list(&["a", "b"]));
    assert_eq!(app.root(), root);
    assert_eq!(app.at(&[0]), li);
    assert_eq!(app.html(), "<ul><li>a</li><li>b</li></ul>");
}

// ── Thunks ────────────────────────────────────────────────────────────────

fn counted(model: &Rc<String>, builds: &Rc<Cell<usize>>) -> VNode<()> {
    let refs = vec![Ref::new(model)];
    let (model, builds) = (model.clone(), builds.clone());
    thunk(refs, move || {
        builds.set(builds.get() + 1);
        node("b", vec![], vec![text(model.as_str())])
    })
}

#[test]
fn thunk_rebuilds_only_when_a_capture_changes() {
    let builds = Rc::new(Cell::new(0));
    let first = Rc::new("one".to_owned());
    let view = |m: &Rc<String>| node("div", vec![], vec![counted(m, &builds)]);

    let mut app = App::mount(view(&first));
    assert_eq!(builds.get(), 1);

    assert_eq!(app.update(view(&first)), 0);
    assert_eq!(builds.get(), 1);

    // Equal value, different allocation: rebuilt.
    let second = Rc::new("one".to_owned());
    assert_eq!(app.update(view(&second)), 0);
    assert_eq!(builds.get(), 2);

    let third = Rc::new("three".to_owned());
    assert_eq!(app.update(view(&third)), 1);
    assert_eq!(builds.get(), 3);
    assert_eq!(app.html(), "<div><b>three</b></div>");

    // The adopted build is what the next diff compares against.
    assert_eq!(app.update(view(&third)), 0);
    assert_eq!(builds.get(), 3);
}

fn greeting(name: &String) -> VNode<()> {
    node("p", vec![], vec![text(format!("hi {name}"))])
}

#[test]
fn lazy_thunk_replaces_its_root() {
    let mut app = App::mount(node(
        "main",
        vec![],
        vec![lazy(greeting, Rc::new("ann".to_owned()))],
    ));
    let p = app.at(&[0]);
    app.update(node(
        "main",
        vec![],
        vec![lazy(|_: &String| node("h1", vec![], vec![text("x")]), Rc::new("bob".to_owned()))],
    ));
    assert_ne!(app.at(&[0]), p);
    assert_eq!(app.html(), "<main><h1>x</h1></main>");
}

#[test]
fn thunk_at_the_root_can_be_redrawn() {
    let mut app: App<()> = App::mount(lazy(greeting, Rc::new("ann".to_owned())));
    app.update(lazy(|_: &String| node("h1", vec![], vec![]), Rc::new("bob".to_owned())));
    assert_eq!(app.html(), "<h1 />");
    assert_eq!(app.doc.child_nodes(app.body), &[app.root()]);
}

// ── Facts ─────────────────────────────────────────────────────────────────

#[test]
fn value_is_reasserted_even_when_the_view_did_not_change_it() {
    let view = |v: &str| -> VNode<()> { node("input", vec![string_property("value", v)], vec![]) };
    let mut app = App::mount(view("draft"));
    let input = app.root();

    // The user typed.
    app.doc.set_property(input, "value", json!("draft!")).unwrap();
    assert_eq!(app.update(view("draft")), 1);
    assert_eq!(app.doc.property(input, "value"), Some(&json!("draft")));

    // In sync again: the patch is still emitted but changes nothing.
    app.update(view("draft"));
    assert_eq!(app.doc.property(input, "value"), Some(&json!("draft")));
}

#[test]
fn namespace_change_redraws() {
    let svg = "http://www.w3.org/2000/svg";
    let mut app: App<()> = App::mount(node("g", vec![], vec![]));
    let root = app.root();
    app.update(node_ns(svg, "g", vec![], vec![]));
    assert_ne!(app.root(), root);
    assert_eq!(app.doc.namespace(app.root()), Some(svg));
}

#[test]
fn script_tags_and_handler_attributes_are_neutralized() {
    let app: App<()> = App::mount(node(
        "script",
        vec![
            attribute("onclick", "alert(1)"),
            attribute("href", "java\tscript:alert(1)"),
        ],
        vec![],
    ));
    assert_eq!(app.html(), r#"<p data-onclick="alert(1)" href="" />"#);
}

// ── Custom widgets ────────────────────────────────────────────────────────

fn meter() -> Widget<u32> {
    Widget::new(
        |doc: &mut Document, level: &u32| -> Result<NodeId, ReconcileError> {
            let el = doc.create_element("meter");
            doc.set_attribute(el, "value", &level.to_string())?;
            Ok(el)
        },
        |old: &u32, new: &u32| {
            if old == new {
                return None;
            }
            let level = new.to_string();
            Some(CustomPatch::new(move |doc: &mut Document, node: NodeId| {
                doc.set_attribute(node, "value", &level)?;
                Ok(node)
            }))
        },
    )
}

#[test]
fn custom_widget_renders_and_applies_its_own_diff() {
    let widget = meter();
    let view = |level: u32| -> VNode<()> {
        node("div", vec![], vec![custom(vec![attribute("title", "m")], level, &widget)])
    };
    let mut app = App::mount(view(1));
    let el = app.at(&[0]);
    assert_eq!(app.html(), r#"<div><meter value="1" title="m" /></div>"#);

    assert_eq!(app.update(view(1)), 0);
    assert_eq!(app.update(view(4)), 1);
    assert_eq!(app.at(&[0]), el);
    assert_eq!(app.doc.attribute(el, "value"), Some("4"));
}

#[test]
fn custom_widget_with_another_renderer_is_redrawn() {
    let (first, second) = (meter(), meter());
    let mut app: App<()> = App::mount(node("div", vec![], vec![custom(vec![], 1, &first)]));
    let el = app.at(&[0]);
    app.update(node("div", vec![], vec![custom(vec![], 1, &second)]));
    assert_ne!(app.at(&[0]), el);
}

// ── Mount and hydrate ─────────────────────────────────────────────────────

#[test]
fn hydrate_adopts_existing_markup() {
    common::init_logger();
    let mut doc = Document::new();
    let app = doc.create_element("DIV");
    doc.set_attribute(app, "id", "app").unwrap();
    let p = doc.create_element("p");
    let t = doc.create_text_node("server");
    doc.append_child(p, t).unwrap();
    doc.append_child(app, p).unwrap();

    let tree: VNode<()> = node(
        "div",
        vec![attribute("id", "app")],
        vec![node("p", vec![], vec![text("client")]), text("!")],
    );
    let vdom = VirtualDom::hydrate(&mut doc, app, tree, |_, _| {}, Options::default()).unwrap();

    assert_eq!(vdom.root(), app);
    assert_eq!(doc.child_at(app, 0), Some(p));
    assert_eq!(doc.text(t), Some("client"));
    assert_eq!(doc.outer_html(app), r#"<DIV id="app"><p>client</p>!</DIV>"#);
}

#[test]
fn hydrate_redraws_when_the_tag_differs() {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    let old = doc.create_element("span");
    doc.append_child(body, old).unwrap();

    let tree: VNode<()> = node("div", vec![], vec![]);
    let vdom = VirtualDom::hydrate(&mut doc, old, tree, |_, _| {}, Options::default()).unwrap();
    assert_ne!(vdom.root(), old);
    assert_eq!(doc.outer_html(body), "<body><div /></body>");
}

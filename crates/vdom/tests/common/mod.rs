#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use haskle_dom::{Document, Event, NodeId};
use haskle_vdom::decode::succeed;
use haskle_vdom::{
    attribute, keyed_node, node, on, style, text, thunk, Attribute, EventRoot, Handler, Options,
    Reconciler, Ref, TaggerFn, VNode, VirtualDom,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde_json::Value;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ── Mounted app ───────────────────────────────────────────────────────────

pub type Inbox<Msg> = Rc<RefCell<Vec<(Msg, bool)>>>;

/// A view mounted into `<body>` with a sink that records every message.
pub struct App<Msg> {
    pub doc: Document,
    pub body: NodeId,
    pub vdom: VirtualDom<Msg>,
    pub inbox: Inbox<Msg>,
}

impl<Msg: 'static> App<Msg> {
    pub fn mount(tree: VNode<Msg>) -> Self {
        Self::mount_with(tree, Options::default())
    }

    pub fn mount_with(tree: VNode<Msg>, options: Options) -> Self {
        init_logger();
        let mut doc = Document::new();
        let body = doc.create_element("body");
        let placeholder = doc.create_element("div");
        doc.append_child(body, placeholder).unwrap();

        let inbox: Inbox<Msg> = Rc::new(RefCell::new(Vec::new()));
        let sink = inbox.clone();
        let vdom = VirtualDom::mount(
            &mut doc,
            placeholder,
            tree,
            move |msg, sync| sink.borrow_mut().push((msg, sync)),
            options,
        )
        .unwrap();
        App {
            doc,
            body,
            vdom,
            inbox,
        }
    }

    pub fn update(&mut self, tree: VNode<Msg>) -> usize {
        self.vdom.update(&mut self.doc, tree).unwrap()
    }

    pub fn root(&self) -> NodeId {
        self.vdom.root()
    }

    pub fn html(&self) -> String {
        self.doc.outer_html(self.vdom.root())
    }

    /// Node reached from the root by child positions.
    pub fn at(&self, path: &[usize]) -> NodeId {
        path.iter().fold(self.root(), |node, &i| {
            self.doc
                .child_at(node, i)
                .unwrap_or_else(|| panic!("no child {i} under {node:?}"))
        })
    }

    pub fn fire(&self, target: NodeId, name: &str, payload: Value) -> Event {
        self.vdom.dispatch(&self.doc, target, name, payload)
    }

    /// Whether the mounted root is structurally equal to a fresh render of
    /// `tree`. Attribute order is not compared.
    pub fn matches(&self, tree: &VNode<Msg>) -> bool {
        let (fresh, root) = fresh_render(tree);
        self.doc.is_equal_node_in(self.root(), &fresh, root)
    }

    pub fn take_messages(&self) -> Vec<(Msg, bool)> {
        std::mem::take(&mut *self.inbox.borrow_mut())
    }
}

/// `tree` rendered from scratch into a new document.
pub fn fresh_render<Msg: 'static>(tree: &VNode<Msg>) -> (Document, NodeId) {
    let mut doc = Document::new();
    let mut reconciler = Reconciler::new(Options::default());
    let root = reconciler
        .render(&mut doc, tree, &EventRoot::root(|_, _| {}))
        .unwrap();
    (doc, root)
}

/// Markup of `tree` rendered from scratch.
pub fn fresh_html<Msg: 'static>(tree: &VNode<Msg>) -> String {
    let (doc, root) = fresh_render(tree);
    doc.outer_html(root)
}

pub fn keyed_list<Msg>(keys: &[&str]) -> VNode<Msg> {
    keyed_node(
        "ul",
        vec![],
        keys.iter()
            .map(|k| (k.to_string(), node("li", vec![], vec![text(*k)])))
            .collect(),
    )
}

pub fn tagger(f: impl Fn(u32) -> u32 + 'static) -> TaggerFn<u32> {
    Rc::new(f)
}

// ── Random trees ──────────────────────────────────────────────────────────

const TAGS: &[&str] = &["div", "span", "p", "section"];
const WORDS: &[&str] = &["a", "b", "c", "d", "e"];
const KEYS: &[&str] = &["k0", "k1", "k2", "k3", "k4", "k5"];

/// Seeded view generator.
///
/// Taggers, handlers and thunk captures come from pools shared by every
/// generator forked from the same one, so two forks with the same seed
/// produce trees that are equal down to identity where identity matters.
pub struct TreeGen {
    rng: Xoshiro256StarStar,
    taggers: Rc<Vec<TaggerFn<u32>>>,
    handlers: Rc<Vec<Handler<u32>>>,
    models: Rc<Vec<Rc<u32>>>,
}

impl TreeGen {
    pub fn new(seed: u64) -> Self {
        let taggers = vec![tagger(|m| m + 1), tagger(|m| m * 2), tagger(|m| m + 100)];
        TreeGen {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            taggers: Rc::new(taggers),
            handlers: Rc::new(vec![
                Handler::Normal(succeed(1)),
                Handler::Normal(succeed(2)),
                Handler::MayPreventDefault(succeed((3, true))),
            ]),
            models: Rc::new((0..3).map(Rc::new).collect()),
        }
    }

    /// A generator over the same pools, reseeded.
    pub fn fork(&self, seed: u64) -> Self {
        TreeGen {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            taggers: self.taggers.clone(),
            handlers: self.handlers.clone(),
            models: self.models.clone(),
        }
    }

    /// A random view rooted at a `<main>` element.
    pub fn tree(&mut self, depth: u32) -> VNode<u32> {
        let kids = self.children(depth);
        let attrs = self.attributes();
        node("main", attrs, kids)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.gen_range(0..items.len())]
    }

    fn word(&mut self) -> &'static str {
        *self.pick(WORDS)
    }

    fn children(&mut self, depth: u32) -> Vec<VNode<u32>> {
        let n = self.rng.gen_range(0..5);
        (0..n).map(|_| self.any(depth)).collect()
    }

    fn any(&mut self, depth: u32) -> VNode<u32> {
        if depth == 0 {
            return text(self.word());
        }
        match self.rng.gen_range(0..10) {
            0..=2 => text(self.word()),
            6 => self.keyed(depth - 1),
            7 => {
                let tagger = self.pick(&self.taggers.clone()).clone();
                self.element(depth - 1).map_with(tagger)
            }
            8 => {
                let model = self.pick(&self.models.clone()).clone();
                let refs = vec![Ref::new(&model)];
                thunk(refs, move || {
                    node("em", vec![], vec![text(model.to_string())])
                })
            }
            _ => self.element(depth - 1),
        }
    }

    fn element(&mut self, depth: u32) -> VNode<u32> {
        let tag = *self.pick(TAGS);
        let attrs = self.attributes();
        let kids = self.children(depth);
        node(tag, attrs, kids)
    }

    fn keyed(&mut self, depth: u32) -> VNode<u32> {
        let n = self.rng.gen_range(0..6);
        let kids = (0..n)
            .map(|_| {
                let key = self.pick(KEYS).to_string();
                let kid = if depth > 0 && self.rng.gen_bool(0.3) {
                    self.element(depth - 1)
                } else {
                    node("li", vec![], vec![text(key.as_str())])
                };
                (key, kid)
            })
            .collect();
        let attrs = self.attributes();
        keyed_node("ol", attrs, kids)
    }

    fn attributes(&mut self) -> Vec<Attribute<u32>> {
        let mut attrs = Vec::new();
        if self.rng.gen_bool(0.3) {
            attrs.push(attribute("title", self.word()));
        }
        if self.rng.gen_bool(0.3) {
            attrs.push(style("color", self.word()));
        }
        if self.rng.gen_bool(0.2) {
            attrs.push(attribute("data-x", self.word()));
        }
        if self.rng.gen_bool(0.2) {
            let handler = self.pick(&self.handlers.clone()).clone();
            attrs.push(on("click", handler));
        }
        attrs
    }
}

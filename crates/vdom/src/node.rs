//! The immutable node model.
//!
//! A [`VNode`] is a cheap, reference-counted handle. Cloning shares the
//! subtree, and [`VNode::ptr_eq`] is what lets `diff(x, x)` return without
//! walking anything.
//!
//! Every composite node caches its descendant count at construction:
//!
//! | Variant        | `descendants()`                         |
//! |----------------|-----------------------------------------|
//! | Text, Custom, Thunk | 0                                  |
//! | Element, Keyed | children + sum of children's counts     |
//! | Tagger         | 1 + child's count                       |

use std::any::Any;
use std::cell::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use haskle_dom::{Document, NodeId};

use crate::error::ReconcileError;
use crate::facts::{Attribute, Facts};
use crate::handler::TaggerFn;
use crate::sanitize::no_script;

// ── Capture keys ──────────────────────────────────────────────────────────

#[derive(Clone)]
enum RefInner {
    Shared(Rc<dyn Any>),
    Addr(usize),
}

/// A thunk capture value compared by identity, never by value.
///
/// Two `Ref`s are equal when they point at the same allocation (or the same
/// function address), so two structurally equal models built separately do
/// not match.
#[derive(Clone)]
pub struct Ref(RefInner);

impl Ref {
    /// Keeps `value` alive and compares by its address.
    pub fn new<T: 'static>(value: &Rc<T>) -> Self {
        Ref(RefInner::Shared(value.clone() as Rc<dyn Any>))
    }

    /// Compares by a raw address, e.g. a view function pointer.
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Ref(RefInner::Addr(ptr as *const () as usize))
    }

    fn addr(&self) -> usize {
        match &self.0 {
            RefInner::Shared(rc) => Rc::as_ptr(rc) as *const () as usize,
            RefInner::Addr(addr) => *addr,
        }
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Ref {}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:#x})", self.addr())
    }
}

// ── Custom widgets ────────────────────────────────────────────────────────

pub type RenderFn = Rc<dyn Fn(&mut Document, &dyn Any) -> Result<NodeId, ReconcileError>>;
pub type DiffFn = Rc<dyn Fn(&dyn Any, &dyn Any) -> Option<CustomPatch>>;

/// Payload of an `ApplyCustomDiff` patch: mutates the widget's node and
/// returns the node that now stands in its place.
#[derive(Clone)]
pub struct CustomPatch(Rc<dyn Fn(&mut Document, NodeId) -> Result<NodeId, ReconcileError>>);

impl CustomPatch {
    pub fn new(
        f: impl Fn(&mut Document, NodeId) -> Result<NodeId, ReconcileError> + 'static,
    ) -> Self {
        CustomPatch(Rc::new(f))
    }

    pub fn apply(&self, doc: &mut Document, node: NodeId) -> Result<NodeId, ReconcileError> {
        (self.0)(doc, node)
    }
}

impl fmt::Debug for CustomPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPatch")
    }
}

/// Render and diff functions of an embedded widget with state `S`.
///
/// The differ redraws a custom node whenever its render function is a
/// different allocation, so build a widget once and clone it.
pub struct Widget<S> {
    render: RenderFn,
    diff: DiffFn,
    _state: PhantomData<fn(&S)>,
}

impl<S> Clone for Widget<S> {
    fn clone(&self) -> Self {
        Widget {
            render: self.render.clone(),
            diff: self.diff.clone(),
            _state: PhantomData,
        }
    }
}

impl<S: 'static> Widget<S> {
    pub fn new(
        render: impl Fn(&mut Document, &S) -> Result<NodeId, ReconcileError> + 'static,
        diff: impl Fn(&S, &S) -> Option<CustomPatch> + 'static,
    ) -> Self {
        Widget {
            render: Rc::new(move |doc: &mut Document, state: &dyn Any| {
                let state = state
                    .downcast_ref::<S>()
                    .ok_or(ReconcileError::Invariant("custom widget state has the wrong type"))?;
                render(doc, state)
            }),
            diff: Rc::new(move |old: &dyn Any, new: &dyn Any| {
                match (old.downcast_ref::<S>(), new.downcast_ref::<S>()) {
                    (Some(old), Some(new)) => diff(old, new),
                    _ => None,
                }
            }),
            _state: PhantomData,
        }
    }
}

// ── Nodes ─────────────────────────────────────────────────────────────────

pub struct Custom<Msg> {
    pub facts: Rc<Facts<Msg>>,
    pub state: Rc<dyn Any>,
    pub render: RenderFn,
    pub diff: DiffFn,
}

impl<Msg> Custom<Msg> {
    pub fn same_render(&self, other: &Custom<Msg>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.render) as *const (),
            Rc::as_ptr(&other.render) as *const (),
        )
    }
}

pub struct Thunk<Msg> {
    pub refs: Vec<Ref>,
    build: Rc<dyn Fn() -> VNode<Msg>>,
    cached: OnceCell<VNode<Msg>>,
}

impl<Msg> Thunk<Msg> {
    /// The built subtree, building it on first use.
    pub fn force(&self) -> &VNode<Msg> {
        self.cached.get_or_init(|| (self.build)())
    }

    pub fn cached(&self) -> Option<&VNode<Msg>> {
        self.cached.get()
    }

    /// Adopts a subtree built by an earlier thunk with the same refs.
    pub(crate) fn adopt(&self, built: &VNode<Msg>) {
        // Already forced: keep it, the build is pure.
        let _ = self.cached.set(built.clone());
    }
}

pub enum Node<Msg> {
    Text(String),
    Element {
        tag: String,
        namespace: Option<String>,
        facts: Rc<Facts<Msg>>,
        children: Vec<VNode<Msg>>,
        descendants: usize,
    },
    KeyedElement {
        tag: String,
        namespace: Option<String>,
        facts: Rc<Facts<Msg>>,
        children: Vec<(String, VNode<Msg>)>,
        descendants: usize,
    },
    Custom(Custom<Msg>),
    Tagger {
        tagger: TaggerFn<Msg>,
        child: VNode<Msg>,
        descendants: usize,
    },
    Thunk(Thunk<Msg>),
}

pub struct VNode<Msg>(Rc<Node<Msg>>);

impl<Msg> Clone for VNode<Msg> {
    fn clone(&self) -> Self {
        VNode(self.0.clone())
    }
}

impl<Msg> VNode<Msg> {
    fn from_node(node: Node<Msg>) -> Self {
        VNode(Rc::new(node))
    }

    pub fn node(&self) -> &Node<Msg> {
        &self.0
    }

    pub fn ptr_eq(&self, other: &VNode<Msg>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn descendants(&self) -> usize {
        match &*self.0 {
            Node::Text(_) | Node::Custom(_) | Node::Thunk(_) => 0,
            Node::Element { descendants, .. }
            | Node::KeyedElement { descendants, .. }
            | Node::Tagger { descendants, .. } => *descendants,
        }
    }

    /// Children of an element or keyed element, keys dropped.
    pub(crate) fn kids(&self) -> Box<dyn Iterator<Item = &VNode<Msg>> + '_> {
        match &*self.0 {
            Node::Element { children, .. } => Box::new(children.iter()),
            Node::KeyedElement { children, .. } => Box::new(children.iter().map(|(_, kid)| kid)),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Flattens a chain of nested taggers into `(outermost..innermost, leaf)`.
    pub(crate) fn tagger_chain(&self) -> Option<(Vec<TaggerFn<Msg>>, &VNode<Msg>)> {
        let Node::Tagger { tagger, child, .. } = &*self.0 else {
            return None;
        };
        let mut taggers = vec![tagger.clone()];
        let mut sub = child;
        while let Node::Tagger { tagger, child, .. } = &*sub.0 {
            taggers.push(tagger.clone());
            sub = child;
        }
        Some((taggers, sub))
    }

    /// A keyed element with its keys discarded; anything else is returned
    /// as is.
    pub fn dekey(&self) -> VNode<Msg> {
        match &*self.0 {
            Node::KeyedElement {
                tag,
                namespace,
                facts,
                children,
                descendants,
            } => VNode::from_node(Node::Element {
                tag: tag.clone(),
                namespace: namespace.clone(),
                facts: facts.clone(),
                children: children.iter().map(|(_, kid)| kid.clone()).collect(),
                descendants: *descendants,
            }),
            _ => self.clone(),
        }
    }
}

impl<Msg: 'static> VNode<Msg> {
    /// Wraps this subtree so that every message it emits goes through `f`.
    pub fn map(self, f: impl Fn(Msg) -> Msg + 'static) -> VNode<Msg> {
        self.map_with(Rc::new(f))
    }

    /// Like [`VNode::map`] with a shared tagger, so that rebuilding the view
    /// with the same `Rc` keeps the tagger identical for the differ.
    pub fn map_with(self, tagger: TaggerFn<Msg>) -> VNode<Msg> {
        let descendants = 1 + self.descendants();
        VNode::from_node(Node::Tagger {
            tagger,
            child: self,
            descendants,
        })
    }
}

impl<Msg> fmt::Debug for VNode<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Node::Element { tag, facts, children, .. } => f
                .debug_struct("Element")
                .field("tag", tag)
                .field("facts", facts)
                .field("children", children)
                .finish(),
            Node::KeyedElement { tag, facts, children, .. } => f
                .debug_struct("KeyedElement")
                .field("tag", tag)
                .field("facts", facts)
                .field("children", children)
                .finish(),
            Node::Custom(c) => f.debug_struct("Custom").field("facts", &c.facts).finish(),
            Node::Tagger { child, .. } => f.debug_tuple("Tagger").field(child).finish(),
            Node::Thunk(t) => f
                .debug_struct("Thunk")
                .field("refs", &t.refs)
                .field("cached", &t.cached.get())
                .finish(),
        }
    }
}

// ── Constructors ──────────────────────────────────────────────────────────

pub fn text<Msg>(content: impl Into<String>) -> VNode<Msg> {
    VNode::from_node(Node::Text(content.into()))
}

/// Element constructor without the tag guard.
pub(crate) fn element<Msg>(
    namespace: Option<&str>,
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    let descendants = children.len() + children.iter().map(VNode::descendants).sum::<usize>();
    VNode::from_node(Node::Element {
        tag: tag.to_owned(),
        namespace: namespace.map(str::to_owned),
        facts: Rc::new(Facts::organize(attributes)),
        children,
        descendants,
    })
}

pub fn node<Msg>(
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    element(None, no_script(tag), attributes, children)
}

pub fn node_ns<Msg>(
    namespace: &str,
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<VNode<Msg>>,
) -> VNode<Msg> {
    element(Some(namespace), no_script(tag), attributes, children)
}

fn keyed_element<Msg>(
    namespace: Option<&str>,
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<(String, VNode<Msg>)>,
) -> VNode<Msg> {
    let descendants = children.len()
        + children
            .iter()
            .map(|(_, kid)| kid.descendants())
            .sum::<usize>();
    VNode::from_node(Node::KeyedElement {
        tag: no_script(tag).to_owned(),
        namespace: namespace.map(str::to_owned),
        facts: Rc::new(Facts::organize(attributes)),
        children,
        descendants,
    })
}

pub fn keyed_node<Msg>(
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<(String, VNode<Msg>)>,
) -> VNode<Msg> {
    keyed_element(None, tag, attributes, children)
}

pub fn keyed_node_ns<Msg>(
    namespace: &str,
    tag: &str,
    attributes: Vec<Attribute<Msg>>,
    children: Vec<(String, VNode<Msg>)>,
) -> VNode<Msg> {
    keyed_element(Some(namespace), tag, attributes, children)
}

pub fn custom<Msg, S: 'static>(
    attributes: Vec<Attribute<Msg>>,
    state: S,
    widget: &Widget<S>,
) -> VNode<Msg> {
    VNode::from_node(Node::Custom(Custom {
        facts: Rc::new(Facts::organize(attributes)),
        state: Rc::new(state),
        render: widget.render.clone(),
        diff: widget.diff.clone(),
    }))
}

/// A lazily built subtree, rebuilt only when one of `refs` changes identity.
pub fn thunk<Msg>(refs: Vec<Ref>, build: impl Fn() -> VNode<Msg> + 'static) -> VNode<Msg> {
    VNode::from_node(Node::Thunk(Thunk {
        refs,
        build: Rc::new(build),
        cached: OnceCell::new(),
    }))
}

pub fn lazy<Msg: 'static, A: 'static>(view: fn(&A) -> VNode<Msg>, a: Rc<A>) -> VNode<Msg> {
    let refs = vec![Ref::from_ptr(view as *const ()), Ref::new(&a)];
    thunk(refs, move || view(&a))
}

pub fn lazy2<Msg: 'static, A: 'static, B: 'static>(
    view: fn(&A, &B) -> VNode<Msg>,
    a: Rc<A>,
    b: Rc<B>,
) -> VNode<Msg> {
    let refs = vec![Ref::from_ptr(view as *const ()), Ref::new(&a), Ref::new(&b)];
    thunk(refs, move || view(&a, &b))
}

pub fn lazy3<Msg: 'static, A: 'static, B: 'static, C: 'static>(
    view: fn(&A, &B, &C) -> VNode<Msg>,
    a: Rc<A>,
    b: Rc<B>,
    c: Rc<C>,
) -> VNode<Msg> {
    let refs = vec![
        Ref::from_ptr(view as *const ()),
        Ref::new(&a),
        Ref::new(&b),
        Ref::new(&c),
    ];
    thunk(refs, move || view(&a, &b, &c))
}

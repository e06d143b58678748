//! haskle-vdom — virtual DOM reconciliation.
//!
//! A view is an immutable [`VNode`] tree. The first one is rendered into a
//! [`haskle_dom::Document`]; every later one is diffed against its
//! predecessor and the resulting patches are bound to real nodes and
//! applied, so the document converges on the new tree with as few
//! mutations as the heuristics allow.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`node`] | [`VNode`] and its constructors, thunks, custom widgets |
//! | [`facts`] | [`Attribute`] entries, [`Facts`], the facts diff |
//! | [`decode`] | [`Decoder`] combinators over event payloads |
//! | [`handler`] | [`Handler`] kinds and message mapping |
//! | [`event`] | [`EventRoot`] chains and the bound [`EventCallback`] |
//! | [`sanitize`] | Tag, key and URI guards applied by the constructors |
//! | [`diff`] | Tree and keyed-children diff producing [`Patch`]es |
//! | [`patch`] | Patch types |
//! | [`render`] | [`Reconciler`]: side tables and first render |
//! | [`index`] | Binding patches to real nodes |
//! | [`apply`] | The patcher |
//! | [`virtualize`] | Reading real markup back into a [`VNode`] |
//! | [`runtime`] | [`VirtualDom`], the mounted view driver |

pub mod apply;
pub mod decode;
pub mod diff;
pub mod error;
pub mod event;
pub mod facts;
pub mod handler;
pub mod index;
pub mod node;
pub mod options;
pub mod patch;
pub mod render;
pub mod runtime;
pub mod sanitize;
pub mod virtualize;

pub use decode::{DecodeError, Decoder};
pub use diff::{diff, DUPLICATE_KEY_SUFFIX};
pub use error::ReconcileError;
pub use event::{EventCallback, EventRoot, Sink};
pub use facts::{
    attribute, attribute_ns, bool_property, class, diff_facts, map_attribute, on, property,
    string_property, style, Attribute, Facts, FactsDiff,
};
pub use handler::{map_handler, CustomEvent, Handler, HandlerKind, TaggerFn};
pub use node::{
    custom, keyed_node, keyed_node_ns, lazy, lazy2, lazy3, node, node_ns, text, thunk,
    CustomPatch, Node, Ref, VNode, Widget,
};
pub use options::Options;
pub use patch::{Patch, PatchKind};
pub use render::Reconciler;
pub use runtime::VirtualDom;
pub use virtualize::virtualize;

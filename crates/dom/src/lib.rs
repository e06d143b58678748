//! haskle-dom — an arena-backed in-memory document.
//!
//! This is the "real" tree that `haskle-vdom` renders into and patches. It
//! models the slice of the browser DOM the reconciler touches:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | [`NodeId`], [`NodeKind`], [`ElementData`], [`DomError`] |
//! | [`document`] | [`Document`]: creation, tree mutation, attributes, properties, styles, listeners, dispatch |
//! | [`event`] | [`Event`], [`EventListener`], [`ListenerOptions`] |
//! | [`html`] | HTML serialization of subtrees |

pub mod document;
pub mod event;
pub mod html;
pub mod types;

pub use document::Document;
pub use event::{same_listener, Event, EventListener, ListenerOptions};
pub use html::to_html;
pub use types::{DomError, ElementData, NodeId, NodeKind};

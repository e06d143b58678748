//! Core types for the in-memory document.
//!
//! Nodes live in a `Vec`-backed arena owned by [`crate::Document`]. Every
//! "pointer" (parent, children) is a [`NodeId`] index into that arena. Ids
//! are handed out monotonically and never recycled, so an id stays a valid
//! identity for as long as the document exists, attached or not.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

// ── NodeId ────────────────────────────────────────────────────────────────

/// Handle to a node in a [`crate::Document`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("{0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("{0:?} is not a text node")]
    NotAText(NodeId),
}

// ── Node kinds ────────────────────────────────────────────────────────────

/// Payload of an element node.
///
/// Namespaced attributes are keyed by `(namespace, local name)`. Every map
/// preserves insertion order, which is also serialization order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementData {
    pub tag: String,
    pub namespace: Option<String>,
    pub attributes: IndexMap<String, String>,
    pub attributes_ns: IndexMap<(String, String), String>,
    pub properties: IndexMap<String, Value>,
    pub styles: IndexMap<String, String>,
}

impl ElementData {
    pub fn new(tag: &str, namespace: Option<&str>) -> Self {
        Self {
            tag: tag.to_owned(),
            namespace: namespace.map(str::to_owned),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// Detached container whose children move out when it is inserted.
    Fragment,
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }
}

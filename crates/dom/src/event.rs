//! Events and listeners.
//!
//! A listener is any `Rc<dyn EventListener>`. Registration identity is the
//! pointer of that `Rc`, so the same listener object registered twice for the
//! same event name is only invoked once, and removal needs the same `Rc`.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::types::NodeId;

/// Receives events dispatched to the node it is registered on (or bubbling
/// up through it).
pub trait EventListener {
    fn handle_event(&self, event: &mut Event);
}

/// Options supplied at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// A passive listener cannot prevent the default action.
    pub passive: bool,
}

/// An event travelling from its target up to the root.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    /// Event fields as seen by decoders (`{"target": {"value": ..}, ..}`).
    pub payload: Value,
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    propagation_stopped: bool,
    default_prevented: bool,
    in_passive_listener: bool,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            target,
            current_target: None,
            propagation_stopped: false,
            default_prevented: false,
            in_passive_listener: false,
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Ignored while a passive listener is running.
    pub fn prevent_default(&mut self) {
        if !self.in_passive_listener {
            self.default_prevented = true;
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub(crate) fn set_passive(&mut self, passive: bool) {
        self.in_passive_listener = passive;
    }
}

/// A listener bound to one event name on one node.
#[derive(Clone)]
pub(crate) struct Registration {
    pub name: String,
    pub listener: Rc<dyn EventListener>,
    pub options: ListenerOptions,
}

impl Registration {
    pub fn is(&self, name: &str, listener: &Rc<dyn EventListener>) -> bool {
        self.name == name && same_listener(&self.listener, listener)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("passive", &self.options.passive)
            .finish()
    }
}

/// Pointer identity of two listeners, ignoring vtable metadata.
pub fn same_listener(a: &Rc<dyn EventListener>, b: &Rc<dyn EventListener>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(a) as *const (),
        Rc::as_ptr(b) as *const (),
    )
}

//! Event roots and the listener bound for each (node, event name).
//!
//! An event root is a linked list from a tagged subtree up to the
//! application's sink. A message decoded at a leaf is passed through every
//! tagger on the way up, innermost first, and then handed to the sink.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use haskle_dom::{Event, EventListener};

use crate::handler::{Handler, HandlerKind, TaggerFn};

/// Receives `(message, is_synchronous)`. A message is synchronous when its
/// handler stopped propagation.
pub type Sink<Msg> = Rc<dyn Fn(Msg, bool)>;

pub enum EventRoot<Msg> {
    Root(Sink<Msg>),
    Tagged {
        /// Outermost first, as flattened from nested taggers.
        taggers: RefCell<Vec<TaggerFn<Msg>>>,
        parent: Rc<EventRoot<Msg>>,
    },
}

impl<Msg> fmt::Debug for EventRoot<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRoot::Root(_) => f.write_str("Root"),
            EventRoot::Tagged { taggers, parent } => f
                .debug_struct("Tagged")
                .field("taggers", &taggers.borrow().len())
                .field("parent", parent)
                .finish(),
        }
    }
}

impl<Msg> EventRoot<Msg> {
    pub fn root(sink: impl Fn(Msg, bool) + 'static) -> Rc<Self> {
        Rc::new(EventRoot::Root(Rc::new(sink)))
    }

    pub fn tagged(taggers: Vec<TaggerFn<Msg>>, parent: Rc<EventRoot<Msg>>) -> Rc<Self> {
        Rc::new(EventRoot::Tagged {
            taggers: RefCell::new(taggers),
            parent,
        })
    }

    /// Replaces the tagger chain in place. Returns `false` on a root, which
    /// has no chain to replace.
    pub fn retag(&self, new: Vec<TaggerFn<Msg>>) -> bool {
        match self {
            EventRoot::Root(_) => false,
            EventRoot::Tagged { taggers, .. } => {
                *taggers.borrow_mut() = new;
                true
            }
        }
    }

    /// Maps `message` through every tagger up the chain and delivers it.
    pub fn deliver(&self, mut message: Msg, sync: bool) {
        let mut curr = self;
        loop {
            match curr {
                EventRoot::Root(sink) => {
                    sink(message, sync);
                    return;
                }
                EventRoot::Tagged { taggers, parent } => {
                    let chain = taggers.borrow().clone();
                    for tagger in chain.iter().rev() {
                        message = tagger(message);
                    }
                    curr = &**parent;
                }
            }
        }
    }
}

/// The listener registered for one event name on one node. Its handler is
/// swapped in place on re-render as long as the handler kind is unchanged.
pub struct EventCallback<Msg> {
    handler: RefCell<Handler<Msg>>,
    event_root: Rc<EventRoot<Msg>>,
}

impl<Msg: 'static> EventCallback<Msg> {
    pub fn new(handler: Handler<Msg>, event_root: Rc<EventRoot<Msg>>) -> Self {
        EventCallback {
            handler: RefCell::new(handler),
            event_root,
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.handler.borrow().kind()
    }

    pub fn swap(&self, handler: Handler<Msg>) {
        *self.handler.borrow_mut() = handler;
    }

    pub fn event_root(&self) -> &Rc<EventRoot<Msg>> {
        &self.event_root
    }
}

impl<Msg: 'static> EventListener for EventCallback<Msg> {
    fn handle_event(&self, event: &mut Event) {
        // The sink may re-enter and swap this handler.
        let handler = self.handler.borrow().clone();
        let decoded = match handler.decode(&event.payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                log::debug!("{} dropped: {err}", event.name);
                return;
            }
        };
        if decoded.stop_propagation {
            event.stop_propagation();
        }
        if decoded.prevent_default {
            event.prevent_default();
        }
        self.event_root.deliver(decoded.message, decoded.stop_propagation);
    }
}

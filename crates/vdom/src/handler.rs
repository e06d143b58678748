//! Event handlers: a decoder plus what the handler may do to the event.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::decode::{DecodeError, Decoder};

/// Message transformer used by taggers and handler mapping.
pub type TaggerFn<Msg> = Rc<dyn Fn(Msg) -> Msg>;

/// Result of a [`Handler::Custom`] decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent<Msg> {
    pub message: Msg,
    pub stop_propagation: bool,
    pub prevent_default: bool,
}

/// The kind of a handler, ordered by how much it may affect the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlerKind {
    Normal,
    MayStopPropagation,
    MayPreventDefault,
    Custom,
}

pub enum Handler<Msg> {
    Normal(Decoder<Msg>),
    /// Decodes `(message, stop_propagation)`.
    MayStopPropagation(Decoder<(Msg, bool)>),
    /// Decodes `(message, prevent_default)`.
    MayPreventDefault(Decoder<(Msg, bool)>),
    Custom(Decoder<CustomEvent<Msg>>),
}

impl<Msg> Clone for Handler<Msg> {
    fn clone(&self) -> Self {
        match self {
            Handler::Normal(d) => Handler::Normal(d.clone()),
            Handler::MayStopPropagation(d) => Handler::MayStopPropagation(d.clone()),
            Handler::MayPreventDefault(d) => Handler::MayPreventDefault(d.clone()),
            Handler::Custom(d) => Handler::Custom(d.clone()),
        }
    }
}

impl<Msg> fmt::Debug for Handler<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Normal(d) => f.debug_tuple("Normal").field(d).finish(),
            Handler::MayStopPropagation(d) => f.debug_tuple("MayStopPropagation").field(d).finish(),
            Handler::MayPreventDefault(d) => f.debug_tuple("MayPreventDefault").field(d).finish(),
            Handler::Custom(d) => f.debug_tuple("Custom").field(d).finish(),
        }
    }
}

impl<Msg: 'static> Handler<Msg> {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Normal(_) => HandlerKind::Normal,
            Handler::MayStopPropagation(_) => HandlerKind::MayStopPropagation,
            Handler::MayPreventDefault(_) => HandlerKind::MayPreventDefault,
            Handler::Custom(_) => HandlerKind::Custom,
        }
    }

    /// Same kind and the same decoder allocation.
    pub fn same_as(&self, other: &Handler<Msg>) -> bool {
        match (self, other) {
            (Handler::Normal(a), Handler::Normal(b)) => a.ptr_eq(b),
            (Handler::MayStopPropagation(a), Handler::MayStopPropagation(b)) => a.ptr_eq(b),
            (Handler::MayPreventDefault(a), Handler::MayPreventDefault(b)) => a.ptr_eq(b),
            (Handler::Custom(a), Handler::Custom(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Runs the decoder and normalizes the outcome.
    pub fn decode(&self, payload: &Value) -> Result<CustomEvent<Msg>, DecodeError> {
        Ok(match self {
            Handler::Normal(d) => CustomEvent {
                message: d.decode(payload)?,
                stop_propagation: false,
                prevent_default: false,
            },
            Handler::MayStopPropagation(d) => {
                let (message, stop_propagation) = d.decode(payload)?;
                CustomEvent {
                    message,
                    stop_propagation,
                    prevent_default: false,
                }
            }
            Handler::MayPreventDefault(d) => {
                let (message, prevent_default) = d.decode(payload)?;
                CustomEvent {
                    message,
                    stop_propagation: false,
                    prevent_default,
                }
            }
            Handler::Custom(d) => d.decode(payload)?,
        })
    }

    /// Maps the message this handler produces, keeping its kind.
    pub fn map(self, f: TaggerFn<Msg>) -> Handler<Msg> {
        match self {
            Handler::Normal(d) => Handler::Normal(d.map(move |m| f(m))),
            Handler::MayStopPropagation(d) => {
                Handler::MayStopPropagation(d.map(move |(m, stop)| (f(m), stop)))
            }
            Handler::MayPreventDefault(d) => {
                Handler::MayPreventDefault(d.map(move |(m, prevent)| (f(m), prevent)))
            }
            Handler::Custom(d) => Handler::Custom(d.map(move |e| CustomEvent {
                message: f(e.message),
                stop_propagation: e.stop_propagation,
                prevent_default: e.prevent_default,
            })),
        }
    }
}

pub fn map_handler<Msg: 'static>(
    f: impl Fn(Msg) -> Msg + 'static,
    handler: Handler<Msg>,
) -> Handler<Msg> {
    handler.map(Rc::new(f))
}

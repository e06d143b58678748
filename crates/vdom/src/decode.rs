//! Decoders that turn an event payload into a message.
//!
//! A [`Decoder`] is a shared function from `&serde_json::Value` to
//! `Result<T, DecodeError>`. Two decoders are equal only if they are the same
//! allocation ([`Decoder::ptr_eq`]); the facts diff relies on this to keep
//! event-handler comparison O(1).

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("expecting {expected}, found {found}")]
    Expecting { expected: &'static str, found: Value },
    #[error("at field `{name}`: {source}")]
    Field {
        name: String,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("at index {index}: {source}")]
    Index {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("all {} alternatives failed", .0.len())]
    OneOf(Vec<DecodeError>),
    #[error("{0}")]
    Failure(String),
}

// ── Decoder ───────────────────────────────────────────────────────────────

type DecodeFn<T> = dyn Fn(&Value) -> Result<T, DecodeError>;

pub struct Decoder<T>(Rc<DecodeFn<T>>);

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        Decoder(self.0.clone())
    }
}

impl<T> fmt::Debug for Decoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decoder({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

impl<T: 'static> Decoder<T> {
    pub fn new(f: impl Fn(&Value) -> Result<T, DecodeError> + 'static) -> Self {
        Decoder(Rc::new(f))
    }

    pub fn decode(&self, value: &Value) -> Result<T, DecodeError> {
        (self.0)(value)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Decoder<T>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Decoder<U> {
        Decoder::new(move |v| self.decode(v).map(&f))
    }

    pub fn and_then<U: 'static>(self, f: impl Fn(T) -> Decoder<U> + 'static) -> Decoder<U> {
        Decoder::new(move |v| f(self.decode(v)?).decode(v))
    }
}

// ── Primitives ────────────────────────────────────────────────────────────

pub fn succeed<T: Clone + 'static>(value: T) -> Decoder<T> {
    Decoder::new(move |_| Ok(value.clone()))
}

pub fn fail<T: 'static>(message: impl Into<String>) -> Decoder<T> {
    let message = message.into();
    Decoder::new(move |_| Err(DecodeError::Failure(message.clone())))
}

pub fn value() -> Decoder<Value> {
    Decoder::new(|v| Ok(v.clone()))
}

pub fn string() -> Decoder<String> {
    Decoder::new(|v| {
        v.as_str().map(str::to_owned).ok_or_else(|| DecodeError::Expecting {
            expected: "a STRING",
            found: v.clone(),
        })
    })
}

pub fn bool() -> Decoder<bool> {
    Decoder::new(|v| {
        v.as_bool().ok_or_else(|| DecodeError::Expecting {
            expected: "a BOOL",
            found: v.clone(),
        })
    })
}

pub fn int() -> Decoder<i64> {
    Decoder::new(|v| {
        v.as_i64().ok_or_else(|| DecodeError::Expecting {
            expected: "an INT",
            found: v.clone(),
        })
    })
}

pub fn float() -> Decoder<f64> {
    Decoder::new(|v| {
        v.as_f64().ok_or_else(|| DecodeError::Expecting {
            expected: "a FLOAT",
            found: v.clone(),
        })
    })
}

// ── Structure ─────────────────────────────────────────────────────────────

pub fn field<T: 'static>(name: impl Into<String>, decoder: Decoder<T>) -> Decoder<T> {
    let name = name.into();
    Decoder::new(move |v| {
        let obj = v.as_object().ok_or_else(|| DecodeError::Expecting {
            expected: "an OBJECT",
            found: v.clone(),
        })?;
        let inner = obj.get(&name).ok_or_else(|| DecodeError::Expecting {
            expected: "an OBJECT with a field",
            found: v.clone(),
        });
        inner
            .and_then(|inner| decoder.decode(inner))
            .map_err(|source| DecodeError::Field {
                name: name.clone(),
                source: Box::new(source),
            })
    })
}

/// Nested [`field`]s: `at(["target", "value"], string())`.
pub fn at<T: 'static, S: Into<String>>(
    path: impl IntoIterator<Item = S>,
    decoder: Decoder<T>,
) -> Decoder<T> {
    let path: Vec<String> = path.into_iter().map(Into::into).collect();
    path.into_iter()
        .rev()
        .fold(decoder, |inner, name| field(name, inner))
}

pub fn index<T: 'static>(index: usize, decoder: Decoder<T>) -> Decoder<T> {
    Decoder::new(move |v| {
        let arr = v.as_array().ok_or_else(|| DecodeError::Expecting {
            expected: "an ARRAY",
            found: v.clone(),
        })?;
        let item = arr.get(index).ok_or_else(|| DecodeError::Expecting {
            expected: "a longer ARRAY",
            found: v.clone(),
        });
        item.and_then(|item| decoder.decode(item))
            .map_err(|source| DecodeError::Index {
                index,
                source: Box::new(source),
            })
    })
}

pub fn nullable<T: 'static>(decoder: Decoder<T>) -> Decoder<Option<T>> {
    Decoder::new(move |v| {
        if v.is_null() {
            Ok(None)
        } else {
            decoder.decode(v).map(Some)
        }
    })
}

// ── Combination ───────────────────────────────────────────────────────────

pub fn map2<A: 'static, B: 'static, T: 'static>(
    f: impl Fn(A, B) -> T + 'static,
    a: Decoder<A>,
    b: Decoder<B>,
) -> Decoder<T> {
    Decoder::new(move |v| Ok(f(a.decode(v)?, b.decode(v)?)))
}

/// First decoder that succeeds; collects every failure otherwise.
pub fn one_of<T: 'static>(decoders: Vec<Decoder<T>>) -> Decoder<T> {
    Decoder::new(move |v| {
        let mut errors = Vec::with_capacity(decoders.len());
        for d in &decoders {
            match d.decode(v) {
                Ok(t) => return Ok(t),
                Err(e) => errors.push(e),
            }
        }
        Err(DecodeError::OneOf(errors))
    })
}

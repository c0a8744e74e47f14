//! Published payloads
//!
//! A publish call carries either a literal value, encoded once and shared by
//! every subscriber, or a differentiation function evaluated against each
//! subscriber's properties.

use std::fmt;

use crate::sse::Record;

/// Boxed error returned by a fallible differentiation function
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type DifferentiateFn<P> = dyn Fn(&P) -> Result<Option<Record>, BoxError> + Send + Sync;

/// Data handed to [`Broadcaster::publish`](super::Broadcaster::publish)
pub enum Payload<P> {
    /// The same record for every subscriber
    Literal(Record),
    /// A per-subscriber value computed from the subscriber's properties
    ///
    /// `Ok(None)` skips that subscriber for this publish only.
    Differentiated(Box<DifferentiateFn<P>>),
}

impl<P> Payload<P> {
    /// Encode a value once for all subscribers
    pub fn literal<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Payload::Literal(Record::encode(value))
    }

    /// Compute a value per subscriber; `None` skips the subscriber
    pub fn differentiated<F, T>(f: F) -> Self
    where
        F: Fn(&P) -> Option<T> + Send + Sync + 'static,
        T: fmt::Display,
    {
        Payload::Differentiated(Box::new(move |properties| {
            Ok(f(properties).map(|value| Record::encode(&value)))
        }))
    }

    /// Like [`differentiated`](Self::differentiated), but the function may fail
    ///
    /// A failure aborts the remaining fan-out of that publish call.
    pub fn try_differentiated<F, T, E>(f: F) -> Self
    where
        F: Fn(&P) -> Result<Option<T>, E> + Send + Sync + 'static,
        T: fmt::Display,
        E: Into<BoxError>,
    {
        Payload::Differentiated(Box::new(move |properties| {
            f(properties)
                .map(|value| value.map(|value| Record::encode(&value)))
                .map_err(Into::into)
        }))
    }

    /// Check if the payload is evaluated per subscriber
    pub fn is_differentiated(&self) -> bool {
        matches!(self, Payload::Differentiated(_))
    }

    /// Record to deliver to a subscriber with the given properties
    pub(super) fn render(&self, properties: &P) -> Result<Option<Record>, BoxError> {
        match self {
            Payload::Literal(record) => Ok(Some(record.clone())),
            Payload::Differentiated(f) => f(properties),
        }
    }
}

impl<P> fmt::Debug for Payload<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Literal(record) => f.debug_tuple("Literal").field(record).finish(),
            Payload::Differentiated(_) => f.write_str("Differentiated(..)"),
        }
    }
}

impl<P> From<&str> for Payload<P> {
    fn from(value: &str) -> Self {
        Payload::literal(value)
    }
}

impl<P> From<String> for Payload<P> {
    fn from(value: String) -> Self {
        Payload::literal(&value)
    }
}

impl<P> From<&String> for Payload<P> {
    fn from(value: &String) -> Self {
        Payload::literal(value)
    }
}

impl<P> From<Record> for Payload<P> {
    fn from(record: Record) -> Self {
        Payload::Literal(record)
    }
}

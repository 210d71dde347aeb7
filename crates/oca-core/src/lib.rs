//! OpenNebula object model: pools and pool elements backed by a remote XML transport.

mod entity;
mod pool;

use std::fmt;

use thiserror::Error;

pub use entity::Entity;
pub use oca_xml::{
    AttributeView, Field, FieldDecl, FieldRule, MultiTags, Template, Value, XmlElement, XmlError,
};
pub use pool::Pool;

/// Failure reported by a [`Transport`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server processed the call and reported an error.
    #[error("server fault {code}: {message}")]
    Fault { code: i64, message: String },
    /// The call could not be delivered or its response could not be read.
    #[error("io error: {0}")]
    Io(String),
}

/// Error type produced by pool and entity operations.
#[derive(Debug, Error)]
pub enum OcaError {
    /// Parsing, root validation, or field lookup failed.
    #[error(transparent)]
    Xml(#[from] XmlError),
    /// The transport failed; passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// No pool entry carries the requested id.
    #[error("unknown id: {0}")]
    UnknownId(i64),
    /// No pool entry carries the requested name.
    #[error("unknown name: {0}")]
    UnknownName(String),
}

/// Scalar argument of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Bool(v) => write!(f, "{v}"),
            Arg::Str(v) => f.write_str(v),
        }
    }
}

/// Remote procedure call abstraction returning XML documents.
pub trait Transport {
    /// Invoke `method` with `args` and return the XML payload as text.
    fn call(&self, method: &str, args: &[Arg]) -> Result<String, TransportError>;
}

/// Static description of one resource kind: XML root tags, remote method
/// names, and declared field schema.
pub trait Kind: Sized {
    /// Root tag of a single element, e.g. `VM`.
    const ELEMENT_NAME: &'static str;
    /// Root tag of the pool listing, e.g. `VM_POOL`.
    const POOL_NAME: &'static str;
    const INFO_METHOD: &'static str;
    const DELETE_METHOD: &'static str;
    const POOL_INFO_METHOD: &'static str;
    /// Declared fields coerced when an element is parsed.
    const SCHEMA: &'static [FieldDecl];

    /// Turn one child of a pool listing into an entity sharing `transport`.
    fn factory<'c>(
        transport: &'c dyn Transport,
        element: XmlElement,
    ) -> Result<Entity<'c, Self>, OcaError> {
        Entity::from_element(transport, element)
    }
}

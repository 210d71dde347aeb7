#![cfg_attr(docsrs, feature(doc_cfg))]
//! High level OpenNebula facade that re-exports the workspace crates and
//! declares the standard resource kinds.
//!
//! ```rust
//! use oca::{Arg, Transport, TransportError, VmPool};
//!
//! struct Canned;
//!
//! impl Transport for Canned {
//!     fn call(&self, _method: &str, _args: &[Arg]) -> Result<String, TransportError> {
//!         Ok("<VM_POOL><VM><ID>0</ID><NAME>web</NAME></VM></VM_POOL>".into())
//!     }
//! }
//!
//! # fn main() -> Result<(), oca::OcaError> {
//! let transport = Canned;
//! let mut vms = VmPool::new(&transport);
//! vms.refresh(&[Arg::Int(-2), Arg::Int(-1), Arg::Int(-1), Arg::Int(-1)])?;
//! assert_eq!(vms.find_by_name("web")?.id(), 0);
//! # Ok(())
//! # }
//! ```

pub use oca_core as model;
pub use oca_xml as xml;

pub mod kinds;
pub mod xmlrpc;

pub use kinds::{
    Host, HostKind, HostPool, Image, ImageKind, ImagePool, User, UserKind, UserPool, Vm, VmKind,
    VmPool, Vnet, VnetKind, VnetPool,
};
pub use oca_core::{
    Arg, AttributeView, Entity, Field, Kind, OcaError, Pool, Template, Transport, TransportError,
    Value, XmlElement, XmlError,
};

/// Empty pool of kind `K` bound to `transport`.
pub fn pool<K: Kind>(transport: &dyn Transport) -> Pool<'_, K> {
    Pool::new(transport)
}

/// Entity of kind `K` known only by id, bound to `transport`.
pub fn entity<K: Kind>(transport: &dyn Transport, id: i64) -> Result<Entity<'_, K>, OcaError> {
    Entity::new_with_id(transport, id)
}

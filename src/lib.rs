//! Aggregator crate for the OpenNebula client workspace; see the `oca` facade.

pub use oca::*;

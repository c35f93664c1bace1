//! `hpi-wire` is the protocol layer of the HPI remote procedure call
//! transport.
//!
//! It provides a schema-driven binary marshaling engine: every request and
//! reply is described by a tree of [`descriptor::TypeDescriptor`]s, and a
//! single generic [`codec`] walks such a tree to turn dynamically typed
//! [`value::Value`]s into bytes and back. Multi-byte scalars can be decoded
//! in either byte order, so peers of different architectures can talk to
//! each other.
//!
//! On top of the engine, the crate offers:
//!
//! - a [`registry::CallRegistry`] mapping each numeric operation id to the
//!   typed request and reply field lists of that operation, enforcing the
//!   reply-shape contract where a non-success status suppresses every other
//!   reply field;
//! - the complete HPI catalog: operation ids, status codes and the type
//!   descriptors of the HPI data structures;
//! - the message framing used on the wire, along with a `tokio-util` codec
//!   when the `codec` feature is enabled.

#![deny(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
mod macros;

/// The HPI call table.
pub mod calls;
/// Encoding and decoding of values through descriptors.
pub mod codec;
/// The type descriptor model.
pub mod descriptor;
/// Codec and descriptor errors.
pub mod error;
/// Message framing.
pub mod frame;
/// Inventory data records and their custom codec.
pub mod inventory;
/// HPI operation identifiers.
pub mod operation;
/// Registry of call specifications.
pub mod registry;
/// HPI status codes.
pub mod status;
/// Descriptors of the HPI data types.
pub mod types;
/// Dynamically typed values.
pub mod value;

pub use codec::ByteOrder;
pub use registry::{CallRegistry, CallSpec};
pub use status::Status;
pub use value::{Fields, Value};

//! `hpi-client` calls HPI operations on a remote server.
//!
//! A [`Client`] encodes requests through the HPI
//! [`CallRegistry`](hpi_wire::CallRegistry), sends them one at a time and
//! decodes the replies in the byte order chosen by the server. Besides the
//! generic [`Client::call`], it offers helpers for the session and plugin
//! operations.

#![deny(unsafe_code)]
#![deny(missing_docs)]

/// The client.
pub mod client;
/// All client errors.
pub mod error;

pub use client::Client;
pub use error::{Error, ErrorKind, Result};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hpi_wire::{ByteOrder, CallSpec, Fields, Status};

/// Information about the connection a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    peer: Option<SocketAddr>,
    session: Option<u32>,
    byte_order: ByteOrder,
}

impl CallContext {
    /// Creates a [`CallContext`].
    #[must_use]
    pub const fn new(peer: Option<SocketAddr>, session: Option<u32>, byte_order: ByteOrder) -> Self {
        Self {
            peer,
            session,
            byte_order,
        }
    }

    /// Returns the address of the peer, when the connection has one.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Returns the session opened on this connection, if any.
    #[must_use]
    pub const fn session(&self) -> Option<u32> {
        self.session
    }

    /// Returns the byte order of the peer.
    #[must_use]
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// The outcome of a call.
///
/// Reply values are only transmitted when the status means success.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    status: Status,
    values: Fields,
}

impl Reply {
    /// Creates a [`Reply`].
    #[must_use]
    pub const fn new(status: Status, values: Fields) -> Self {
        Self { status, values }
    }

    /// Creates a successful [`Reply`].
    #[must_use]
    pub const fn ok(values: Fields) -> Self {
        Self::new(Status::OK, values)
    }

    /// Creates a [`Reply`] made only of a status.
    #[must_use]
    pub fn status_only(status: Status) -> Self {
        Self::new(status, Fields::new())
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the reply values.
    #[must_use]
    pub const fn values(&self) -> &Fields {
        &self.values
    }
}

impl From<Status> for Reply {
    fn from(status: Status) -> Self {
        Self::status_only(status)
    }
}

/// The business logic answering calls.
///
/// A connection invokes its handler for one request at a time, while
/// distinct connections invoke it concurrently.
pub trait Handler: Send + Sync + 'static {
    /// Answers a call.
    ///
    /// `request` holds every request field of `spec`. On success, the reply
    /// must hold every reply field except the status.
    fn call(
        &self,
        spec: &CallSpec,
        request: Fields,
        context: &CallContext,
    ) -> impl Future<Output = Reply> + Send;

    /// Closes a session left open by a terminated connection.
    fn close_session(&self, session: u32) -> impl Future<Output = ()> + Send;
}

impl<H: Handler> Handler for Arc<H> {
    fn call(
        &self,
        spec: &CallSpec,
        request: Fields,
        context: &CallContext,
    ) -> impl Future<Output = Reply> + Send {
        self.as_ref().call(spec, request, context)
    }

    fn close_session(&self, session: u32) -> impl Future<Output = ()> + Send {
        self.as_ref().close_session(session)
    }
}

#[cfg(test)]
mod tests {
    use hpi_wire::{Fields, Status};

    use super::Reply;

    #[test]
    fn replies() {
        let reply = Reply::from(Status::INVALID_SESSION);
        assert_eq!(reply.status(), Status::INVALID_SESSION);
        assert!(reply.values().is_empty());

        let reply = Reply::ok(Fields::new().with("SessionId", 3u32));
        assert!(reply.status().is_ok());
        assert_eq!(reply.values().get("SessionId").unwrap().as_u32(), Some(3));
    }
}

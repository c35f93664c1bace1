//! `hpi-daemon` serves HPI remote procedure calls.
//!
//! A [`Server`] accepts TCP connections and serves each of them on its own
//! task. A connection reads one frame at a time, looks its operation up in
//! the [`CallRegistry`](hpi_wire::CallRegistry), decodes the request and
//! hands it over to a [`Handler`], which holds the business logic. The
//! handler reply is then encoded in the byte order of the request and sent
//! back.
//!
//! A connection owns the session opened through it, if any: when the
//! connection terminates, the session is closed through the handler.

#![deny(unsafe_code)]
#![deny(missing_docs)]

/// Server configuration.
pub mod config;
/// Connection state machine.
pub mod connection;
/// All daemon errors.
pub mod error;
/// The business-logic interface.
pub mod handler;
/// TCP server.
pub mod server;

mod dispatch;

pub use config::Config;
pub use connection::serve_connection;
pub use handler::{CallContext, Handler, Reply};
pub use server::Server;

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use hashbrown::HashSet;

    use hpi_wire::frame::Frame;
    use hpi_wire::operation::Operation;
    use hpi_wire::{ByteOrder, CallRegistry, CallSpec, Fields, Status};

    use crate::handler::{CallContext, Handler, Reply};

    pub(crate) const VERSION: u32 = 0x0002_0301;

    pub(crate) fn init_logging() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    // Opens increasing sessions and counts every call.
    #[derive(Debug, Default)]
    pub(crate) struct CountingHandler {
        calls: AtomicUsize,
        last_session: AtomicU32,
        open: Mutex<HashSet<u32>>,
        closed: Mutex<Vec<u32>>,
    }

    impl CountingHandler {
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn closed_sessions(&self) -> Vec<u32> {
            self.closed.lock().unwrap().clone()
        }
    }

    impl Handler for CountingHandler {
        async fn call(&self, spec: &CallSpec, request: Fields, _context: &CallContext) -> Reply {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match Operation::from_id(spec.operation_id()) {
                Some(Operation::VersionGet) => Status::new(VERSION.cast_signed()).into(),
                Some(Operation::SessionOpen) => {
                    if request.get("DomainId").and_then(|domain| domain.as_u32()) == Some(0) {
                        return Status::INVALID_DOMAIN.into();
                    }
                    let session = self.last_session.fetch_add(1, Ordering::SeqCst) + 1;
                    self.open.lock().unwrap().insert(session);
                    Reply::ok(Fields::new().with("SessionId", session))
                }
                Some(Operation::SessionClose) => {
                    let session = request.get("SessionId").and_then(|session| session.as_u32());
                    match session {
                        Some(session) if self.open.lock().unwrap().remove(&session) => {
                            Reply::ok(Fields::new())
                        }
                        _ => Status::INVALID_SESSION.into(),
                    }
                }
                _ => Status::UNSUPPORTED_API.into(),
            }
        }

        async fn close_session(&self, session: u32) {
            self.open.lock().unwrap().remove(&session);
            self.closed.lock().unwrap().push(session);
        }
    }

    fn request(registry: &CallRegistry, operation: Operation, order: ByteOrder, values: &Fields) -> Frame {
        let spec = registry.find(operation.id()).unwrap();
        let payload = registry.encode_request_in(order, spec, values).unwrap();
        Frame::message(operation.id(), order, payload)
    }

    pub(crate) fn session_open_request(registry: &CallRegistry, order: ByteOrder, domain: u32) -> Frame {
        request(
            registry,
            Operation::SessionOpen,
            order,
            &Fields::new().with("DomainId", domain),
        )
    }

    pub(crate) fn session_close_request(registry: &CallRegistry, order: ByteOrder, session: u32) -> Frame {
        request(
            registry,
            Operation::SessionClose,
            order,
            &Fields::new().with("SessionId", session),
        )
    }
}

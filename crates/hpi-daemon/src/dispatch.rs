use std::net::SocketAddr;
use std::sync::Arc;

use hpi_wire::frame::{Frame, FrameKind};
use hpi_wire::registry::SessionRole;
use hpi_wire::{CallRegistry, CallSpec, Fields, Status, Value};

use tracing::{debug, warn};

use crate::error::Result;
use crate::handler::{CallContext, Handler};

/// Turns request frames into reply frames.
#[derive(Debug)]
pub(crate) struct Dispatcher<H> {
    registry: Arc<CallRegistry>,
    handler: Arc<H>,
}

impl<H: Handler> Dispatcher<H> {
    pub(crate) const fn new(registry: Arc<CallRegistry>, handler: Arc<H>) -> Self {
        Self { registry, handler }
    }

    pub(crate) fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    pub(crate) fn handler(&self) -> &H {
        &self.handler
    }

    /// Answers a frame, updating the session tracked by the connection.
    ///
    /// Only reply encoding failures are returned as errors.
    pub(crate) async fn dispatch(
        &self,
        frame: Frame,
        peer: Option<SocketAddr>,
        session: &mut Option<u32>,
    ) -> Result<Frame> {
        let order = frame.byte_order;
        let operation_id = frame.operation_id;

        if frame.kind != FrameKind::Message {
            warn!(
                "Rejecting a frame of kind {} for operation {operation_id}",
                frame.kind.as_byte()
            );
            return Ok(Frame::error(operation_id, order));
        }

        let Some(spec) = self.registry.find(operation_id) else {
            warn!("Operation {operation_id} is not supported");
            return Ok(Frame::message(
                operation_id,
                order,
                CallRegistry::encode_status(order, Status::UNSUPPORTED_API),
            ));
        };

        let request = match self
            .registry
            .decode_request(order, spec, &frame.payload)
        {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid {} request: {e}", spec.name());
                let payload = self.registry.encode_reply_in(
                    order,
                    spec,
                    Status::INVALID_PARAMS,
                    &Fields::new(),
                )?;
                return Ok(Frame::message(operation_id, order, payload));
            }
        };

        debug!("Dispatching {} ({operation_id})", spec.name());

        // The request is handed over to the handler.
        let closed = match spec.session_role() {
            SessionRole::Closes(field) => request.get(field.name()).and_then(Value::as_u32),
            _ => None,
        };

        let context = CallContext::new(peer, *session, order);
        let reply = self.handler.call(spec, request, &context).await;

        if reply.status().is_ok() {
            track_session(spec, reply.values(), closed, session);
        } else {
            debug!("{} failed: {}", spec.name(), reply.status());
        }

        let payload = self
            .registry
            .encode_reply_in(order, spec, reply.status(), reply.values())?;
        Ok(Frame::message(operation_id, order, payload))
    }
}

fn track_session(spec: &CallSpec, values: &Fields, closed: Option<u32>, session: &mut Option<u32>) {
    match spec.session_role() {
        SessionRole::None => {}
        SessionRole::Opens(field) => {
            let Some(opened) = values.get(field.name()).and_then(Value::as_u32) else {
                return;
            };
            if let Some(previous) = session.replace(opened) {
                warn!("Session {opened} replaces session {previous} on the same connection");
            } else {
                debug!("Session {opened} opened");
            }
        }
        SessionRole::Closes(_) => {
            if let Some(closed) = closed
                && *session == Some(closed)
            {
                debug!("Session {closed} closed");
                *session = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use hpi_wire::frame::{Frame, FrameKind};
    use hpi_wire::operation::Operation;
    use hpi_wire::{ByteOrder, CallRegistry, Fields, Status};

    use crate::tests::{CountingHandler, VERSION, session_close_request, session_open_request};

    use super::Dispatcher;

    fn dispatcher() -> (Dispatcher<CountingHandler>, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(Arc::new(CallRegistry::hpi().unwrap()), Arc::clone(&handler));
        (dispatcher, handler)
    }

    fn status_of(dispatcher: &Dispatcher<CountingHandler>, frame: &Frame) -> Status {
        let spec = dispatcher.registry().find(frame.operation_id).unwrap();
        dispatcher
            .registry()
            .decode_reply(frame.byte_order, spec, &frame.payload)
            .unwrap()
            .0
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rejected_frame_kind() {
        let (dispatcher, handler) = dispatcher();
        let frame = Frame {
            kind: FrameKind::Unknown(9),
            operation_id: Operation::Discover.id(),
            byte_order: ByteOrder::Big,
            payload: Bytes::from_static(&[0; 4]),
        };

        let reply = dispatcher.dispatch(frame, None, &mut None).await.unwrap();
        assert_eq!(reply, Frame::error(Operation::Discover.id(), ByteOrder::Big));
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unsupported_operation() {
        let (dispatcher, handler) = dispatcher();
        let frame = Frame::message(4096, ByteOrder::Little, Bytes::new());

        let reply = dispatcher.dispatch(frame, None, &mut None).await.unwrap();
        assert_eq!(reply.kind, FrameKind::Message);
        assert_eq!(reply.operation_id, 4096);
        assert_eq!(&reply.payload[..], (-1002i32).to_le_bytes());
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn short_request() {
        let (dispatcher, handler) = dispatcher();
        let mut request = session_open_request(dispatcher.registry(), ByteOrder::Big, 1);
        let payload = request.payload.slice(..request.payload.len() - 1);
        request.payload = payload;

        let reply = dispatcher.dispatch(request, None, &mut None).await.unwrap();
        assert_eq!(status_of(&dispatcher, &reply), Status::INVALID_PARAMS);
        assert_eq!(reply.payload.len(), 4);
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn session_tracking() {
        let (dispatcher, handler) = dispatcher();
        let registry = dispatcher.registry();
        let mut session = None;

        let reply = dispatcher
            .dispatch(session_open_request(registry, ByteOrder::Little, 1), None, &mut session)
            .await
            .unwrap();
        assert_eq!(status_of(&dispatcher, &reply), Status::OK);
        let opened = session.unwrap();

        // Closing another session keeps the tracked one.
        dispatcher
            .dispatch(session_close_request(registry, ByteOrder::Little, opened + 1), None, &mut session)
            .await
            .unwrap();
        assert_eq!(session, Some(opened));

        dispatcher
            .dispatch(session_close_request(registry, ByteOrder::Little, opened), None, &mut session)
            .await
            .unwrap();
        assert_eq!(session, None);
        assert_eq!(handler.calls(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_session_open() {
        let (dispatcher, _) = dispatcher();
        let mut session = None;

        // The stub handler refuses domain 0.
        let reply = dispatcher
            .dispatch(
                session_open_request(dispatcher.registry(), ByteOrder::Big, 0),
                None,
                &mut session,
            )
            .await
            .unwrap();

        assert_eq!(status_of(&dispatcher, &reply), Status::INVALID_DOMAIN);
        assert_eq!(reply.payload.len(), 4);
        assert_eq!(session, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reply_byte_order() {
        let (dispatcher, _) = dispatcher();
        let spec = dispatcher.registry().find(Operation::VersionGet.id()).unwrap();
        let request = dispatcher
            .registry()
            .encode_request_in(ByteOrder::Big, spec, &Fields::new())
            .unwrap();

        let reply = dispatcher
            .dispatch(Frame::message(spec.operation_id(), ByteOrder::Big, request), None, &mut None)
            .await
            .unwrap();

        assert_eq!(reply.byte_order, ByteOrder::Big);
        assert_eq!(&reply.payload[..], VERSION.to_be_bytes());
    }
}

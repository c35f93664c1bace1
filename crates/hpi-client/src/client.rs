use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};

use hashbrown::HashSet;

use hpi_wire::frame::{Frame, FrameCodec, FrameKind};
use hpi_wire::operation::Operation;
use hpi_wire::types::TextBuffer;
use hpi_wire::{ByteOrder, CallRegistry, Fields, Status, Value};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tokio_util::codec::Framed;

use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};

/// A connection to an HPI server.
///
/// Requests are encoded in the byte order of the client, the native one by
/// default, and replies are decoded in the byte order announced by their
/// frame.
///
/// Once a reply goes missing, because of a reply timeout or because a call
/// was dropped while waiting, the client can no longer pair requests with
/// replies and every later call fails with [`ErrorKind::Transport`].
#[derive(Debug)]
pub struct Client<S> {
    framed: Framed<S, FrameCodec>,
    registry: Arc<CallRegistry>,
    byte_order: ByteOrder,
    reply_timeout: Option<Duration>,
    // A request was sent and its reply has not been read.
    awaiting_reply: bool,
}

impl Client<TcpStream> {
    /// Connects to a server.
    ///
    /// # Errors
    ///
    /// Fails when the server cannot be reached.
    pub async fn connect(address: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        info!("Connected to {}", stream.peer_addr()?);
        Self::from_stream(stream)
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a [`Client`] speaking the HPI calls over a stream.
    ///
    /// # Errors
    ///
    /// Fails when the HPI call registry cannot be built.
    pub fn from_stream(stream: S) -> Result<Self> {
        Ok(Self::with_registry(stream, Arc::new(CallRegistry::hpi()?)))
    }

    /// Creates a [`Client`] speaking the calls of `registry` over a stream.
    pub fn with_registry(stream: S, registry: Arc<CallRegistry>) -> Self {
        let codec = FrameCodec::new(registry.payload_limit());
        Self {
            framed: Framed::new(stream, codec),
            registry,
            byte_order: ByteOrder::NATIVE,
            reply_timeout: None,
            awaiting_reply: false,
        }
    }

    /// Sets the byte order of the requests.
    #[must_use]
    pub const fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Sets how long to wait for each reply.
    #[must_use]
    pub const fn reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = Some(reply_timeout);
        self
    }

    /// Returns the call registry.
    #[must_use]
    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    /// Calls an operation, returning the reply status and values.
    ///
    /// The values are empty when the status is a failure.
    ///
    /// # Errors
    ///
    /// Fails when the operation is unknown, when the request cannot be
    /// encoded, on transport errors and on malformed or rejected replies.
    pub async fn call(&mut self, operation_id: u32, request: &Fields) -> Result<(Status, Fields)> {
        if self.awaiting_reply {
            return Err(Error::new(
                ErrorKind::Transport,
                "A previous reply is missing, the connection is out of sync",
            ));
        }

        let registry = Arc::clone(&self.registry);
        let spec = registry.find(operation_id).ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownOperation,
                format!("Operation {operation_id} is not registered"),
            )
        })?;
        let payload = registry.encode_request_in(self.byte_order, spec, request)?;

        debug!("Calling {} ({operation_id})", spec.name());
        self.awaiting_reply = true;
        self.framed
            .send(Frame::message(operation_id, self.byte_order, payload))
            .await?;

        let reply = self.next_reply().await?;
        self.awaiting_reply = false;
        if reply.kind != FrameKind::Message {
            return Err(Error::new(
                ErrorKind::Rejected,
                format!("The server rejected the {} request", spec.name()),
            ));
        }
        if reply.operation_id != operation_id {
            return Err(Error::new(
                ErrorKind::Decode,
                format!(
                    "Reply to operation {} received for operation {operation_id}",
                    reply.operation_id
                ),
            ));
        }

        Ok(registry.decode_reply(reply.byte_order, spec, &reply.payload)?)
    }

    /// Calls an operation, failing unless the reply status is a success.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call`], and fails on a failure status.
    pub async fn call_ok(&mut self, operation: Operation, request: &Fields) -> Result<Fields> {
        let (status, values) = self.call(operation.id(), request).await?;
        if status.is_ok() {
            Ok(values)
        } else {
            Err(Error::status_failure(operation.name(), status))
        }
    }

    /// Returns the interface version of the server.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call`].
    pub async fn version_get(&mut self) -> Result<u32> {
        let (version, _) = self
            .call(Operation::VersionGet.id(), &Fields::new())
            .await?;
        Ok(version.code().cast_unsigned())
    }

    /// Opens a session on a domain, returning the session id.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn session_open(&mut self, domain_id: u32) -> Result<u32> {
        let values = self
            .call_ok(
                Operation::SessionOpen,
                &Fields::new().with("DomainId", domain_id),
            )
            .await?;
        values
            .get("SessionId")
            .and_then(Value::as_u32)
            .ok_or_else(|| Error::new(ErrorKind::Decode, "Missing session id"))
    }

    /// Closes a session.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn session_close(&mut self, session_id: u32) -> Result<()> {
        self.call_ok(
            Operation::SessionClose,
            &Fields::new().with("SessionId", session_id),
        )
        .await
        .map(|_| ())
    }

    /// Asks the server to discover the resources of the session domain.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn discover(&mut self, session_id: u32) -> Result<()> {
        self.call_ok(
            Operation::Discover,
            &Fields::new().with("SessionId", session_id),
        )
        .await
        .map(|_| ())
    }

    /// Loads a plugin.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn plugin_load(&mut self, name: &str) -> Result<()> {
        self.call_ok(Operation::PluginLoad, &plugin_request(name))
            .await
            .map(|_| ())
    }

    /// Unloads a plugin.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn plugin_unload(&mut self, name: &str) -> Result<()> {
        self.call_ok(Operation::PluginUnload, &plugin_request(name))
            .await
            .map(|_| ())
    }

    /// Returns the reference count of a loaded plugin.
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`].
    pub async fn plugin_ref_count(&mut self, name: &str) -> Result<i32> {
        let values = self
            .call_ok(Operation::PluginInfo, &plugin_request(name))
            .await?;
        values
            .get("Info")
            .and_then(Value::as_struct)
            .and_then(|info| info.get("RefCount"))
            .and_then(Value::as_i32)
            .ok_or_else(|| Error::new(ErrorKind::Decode, "Missing plugin reference count"))
    }

    /// Returns the names of the loaded plugins.
    ///
    /// The list is walked from an empty name until the server answers
    /// [`Status::NOT_PRESENT`].
    ///
    /// # Errors
    ///
    /// Same as [`Client::call_ok`], and fails when the server names a plugin
    /// twice.
    pub async fn plugins(&mut self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut plugins = Vec::new();
        let mut name = String::new();
        loop {
            let (status, values) = self
                .call(Operation::PluginGetNext.id(), &plugin_request(&name))
                .await?;
            if status == Status::NOT_PRESENT {
                return Ok(plugins);
            }
            if !status.is_ok() {
                return Err(Error::status_failure(Operation::PluginGetNext.name(), status));
            }

            name = values
                .get("NextName")
                .and_then(TextBuffer::from_value)
                .and_then(|text| text.as_str().map(str::to_owned))
                .ok_or_else(|| Error::new(ErrorKind::Decode, "Invalid plugin name"))?;
            if !seen.insert(name.clone()) {
                return Err(Error::new(
                    ErrorKind::Decode,
                    format!("Plugin {name} listed twice"),
                ));
            }
            plugins.push(name.clone());
        }
    }

    async fn next_reply(&mut self) -> Result<Frame> {
        let next = match self.reply_timeout {
            Some(duration) => timeout(duration, self.framed.next())
                .await
                .map_err(|_| {
                    Error::new(
                        ErrorKind::Transport,
                        format!("No reply received within {duration:?}"),
                    )
                })?,
            None => self.framed.next().await,
        };
        next.ok_or_else(|| Error::new(ErrorKind::Transport, "Connection closed by the server"))?
            .map_err(Error::from)
    }
}

fn plugin_request(name: &str) -> Fields {
    Fields::new().with("Name", TextBuffer::text(name).to_value())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};

    use hpi_wire::frame::{Frame, FrameCodec};
    use hpi_wire::operation::Operation;
    use hpi_wire::types::TextBuffer;
    use hpi_wire::{ByteOrder, CallRegistry, Fields, Status, Value};

    use tokio::io::{DuplexStream, duplex};
    use tokio::time::sleep;
    use tokio_util::codec::Framed;

    use crate::error::ErrorKind;

    use super::Client;

    const PLUGINS: [&str; 2] = ["libsimulator", "libipmidirect"];

    // Answers in the byte order opposite to the request one.
    async fn serve(stream: DuplexStream, registry: Arc<CallRegistry>) {
        let mut framed = Framed::new(stream, FrameCodec::default());
        while let Some(Ok(frame)) = framed.next().await {
            let order = frame.byte_order.swapped();
            let id = frame.operation_id;
            let spec = registry.find(id).unwrap();
            let request = registry
                .decode_request(frame.byte_order, spec, &frame.payload)
                .unwrap();

            let (status, values) = match Operation::from_id(id).unwrap() {
                Operation::VersionGet => (Status::new(0x0002_0301), Fields::new()),
                Operation::SessionOpen => (Status::OK, Fields::new().with("SessionId", 42u32)),
                Operation::SessionClose => (Status::INVALID_SESSION, Fields::new()),
                // Error frames for discoveries.
                Operation::Discover => {
                    framed.send(Frame::error(id, order)).await.unwrap();
                    continue;
                }
                Operation::PluginGetNext => {
                    let name = TextBuffer::from_value(request.get("Name").unwrap()).unwrap();
                    let position = PLUGINS.iter().position(|plugin| Some(*plugin) == name.as_str());
                    let next = match position {
                        None if name.data.is_empty() => Some(PLUGINS[0]),
                        Some(position) => PLUGINS.get(position + 1).copied(),
                        None => None,
                    };
                    match next {
                        Some(next) => (
                            Status::OK,
                            Fields::new().with("NextName", TextBuffer::text(next).to_value()),
                        ),
                        None => (Status::NOT_PRESENT, Fields::new()),
                    }
                }
                Operation::PluginInfo => (
                    Status::OK,
                    Fields::new().with("Info", Value::Struct(Fields::new().with("RefCount", 3i32))),
                ),
                // Closes the connection.
                _ => return,
            };

            let payload = registry.encode_reply_in(order, spec, status, &values).unwrap();
            framed.send(Frame::message(id, order, payload)).await.unwrap();
        }
    }

    fn client(order: ByteOrder) -> Client<DuplexStream> {
        let registry = Arc::new(CallRegistry::hpi().unwrap());
        let (client, server) = duplex(4096);
        tokio::spawn(serve(server, Arc::clone(&registry)));
        Client::with_registry(client, registry).byte_order(order)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sessions() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let mut client = client(order);

            assert_eq!(client.version_get().await.unwrap(), 0x0002_0301);
            assert_eq!(client.session_open(1).await.unwrap(), 42);

            let error = client.session_close(42).await.unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Status);
            assert_eq!(error.status(), Some(Status::INVALID_SESSION));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn plugins() {
        let mut client = client(ByteOrder::NATIVE);

        assert_eq!(client.plugins().await.unwrap(), PLUGINS);
        assert_eq!(client.plugin_ref_count("libsimulator").await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failures() {
        let mut client = client(ByteOrder::Big);

        assert_eq!(
            client.discover(1).await.unwrap_err().kind(),
            ErrorKind::Rejected
        );
        assert_eq!(
            client
                .call(4096, &Fields::new())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::UnknownOperation
        );
        // The request misses its field.
        assert_eq!(
            client
                .call(Operation::SessionOpen.id(), &Fields::new())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::Encode
        );

        // The server hangs up.
        assert_eq!(
            client.plugin_load("libsimulator").await.unwrap_err().kind(),
            ErrorKind::Transport
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_plugin() {
        let registry = Arc::new(CallRegistry::hpi().unwrap());
        let (client, server) = duplex(4096);

        // Always names the same plugin.
        let server_registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let mut framed = Framed::new(server, FrameCodec::default());
            while let Some(Ok(frame)) = framed.next().await {
                let spec = server_registry.find(frame.operation_id).unwrap();
                let values = Fields::new().with("NextName", TextBuffer::text(PLUGINS[0]).to_value());
                let payload = server_registry
                    .encode_reply_in(frame.byte_order, spec, Status::OK, &values)
                    .unwrap();
                framed
                    .send(Frame::message(frame.operation_id, frame.byte_order, payload))
                    .await
                    .unwrap();
            }
        });

        let mut client = Client::with_registry(client, registry);
        let error = client.plugins().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decode);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn late_reply() {
        let registry = Arc::new(CallRegistry::hpi().unwrap());
        let (client, server) = duplex(4096);

        // Answers every call after a delay.
        let server_registry = Arc::clone(&registry);
        tokio::spawn(async move {
            let mut framed = Framed::new(server, FrameCodec::default());
            while let Some(Ok(frame)) = framed.next().await {
                sleep(Duration::from_millis(100)).await;
                let spec = server_registry.find(frame.operation_id).unwrap();
                let payload = server_registry
                    .encode_reply_in(frame.byte_order, spec, Status::new(7), &Fields::new())
                    .unwrap();
                framed
                    .send(Frame::message(frame.operation_id, frame.byte_order, payload))
                    .await
                    .unwrap();
            }
        });

        let mut client =
            Client::with_registry(client, registry).reply_timeout(Duration::from_millis(20));
        assert_eq!(
            client.version_get().await.unwrap_err().kind(),
            ErrorKind::Transport
        );

        // The late reply is buffered by now and must not answer this call.
        sleep(Duration::from_millis(200)).await;
        assert_eq!(
            client.version_get().await.unwrap_err().kind(),
            ErrorKind::Transport
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reply_timeout() {
        let registry = Arc::new(CallRegistry::hpi().unwrap());
        let (client, _server) = duplex(4096);
        let mut client =
            Client::with_registry(client, registry).reply_timeout(Duration::from_millis(50));

        assert_eq!(
            client.version_get().await.unwrap_err().kind(),
            ErrorKind::Transport
        );
    }
}

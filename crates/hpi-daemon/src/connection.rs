use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};

use hpi_wire::CallRegistry;
use hpi_wire::frame::{Frame, FrameCodec};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use tracing::{debug, info};

use crate::config::ReadTimeout;
use crate::dispatch::Dispatcher;
use crate::error::{Error, ErrorKind, Result};
use crate::handler::Handler;

/// An accepted connection.
///
/// [`Connection::serve`] answers its requests one after the other until the
/// peer goes away, a transport error occurs or the server shuts down. The
/// session opened on the connection, if any, is then closed through the
/// handler.
#[derive(Debug)]
pub struct Connection<S, H> {
    framed: Framed<S, FrameCodec>,
    dispatcher: Dispatcher<H>,
    peer: Option<SocketAddr>,
    read_timeout: ReadTimeout,
    shutdown: Option<watch::Receiver<bool>>,
    session: Option<u32>,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    /// Creates a [`Connection`] over a stream.
    ///
    /// Frame payloads are limited to the registry payload limit, and reads
    /// never time out.
    pub fn new(stream: S, registry: Arc<CallRegistry>, handler: Arc<H>) -> Self {
        let codec = FrameCodec::new(registry.payload_limit());
        Self {
            framed: Framed::new(stream, codec),
            dispatcher: Dispatcher::new(registry, handler),
            peer: None,
            read_timeout: ReadTimeout::Unbounded,
            shutdown: None,
            session: None,
        }
    }

    /// Sets the peer address.
    #[must_use]
    pub const fn peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, read_timeout: ReadTimeout) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    #[must_use]
    pub(crate) fn shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Serves the connection until it is closed.
    ///
    /// # Errors
    ///
    /// Returns the transport or encoding error which closed the connection.
    /// A peer closing the connection is not an error.
    pub async fn serve(mut self) -> Result<()> {
        let name = self
            .peer
            .map_or_else(|| "stream".to_owned(), |peer| peer.to_string());
        info!("Serving connection {name}");

        let result = self.serve_requests().await;

        if let Some(session) = self.session.take() {
            info!("Closing session {session} left open by {name}");
            self.dispatcher.handler().close_session(session).await;
        }
        info!("Connection {name} closed");

        result
    }

    async fn serve_requests(&mut self) -> Result<()> {
        while let Some(frame) = self.next_frame().await? {
            let reply = self
                .dispatcher
                .dispatch(frame, self.peer, &mut self.session)
                .await?;
            self.framed.send(reply).await?;
        }
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Self {
            framed,
            read_timeout,
            shutdown,
            ..
        } = self;

        let read = async {
            let next = match read_timeout.duration() {
                Some(duration) => timeout(duration, framed.next()).await.map_err(|_| {
                    Error::new(
                        ErrorKind::Transport,
                        format!("No request received within {duration:?}"),
                    )
                })?,
                None => framed.next().await,
            };
            next.transpose().map_err(Error::from)
        };

        let Some(shutdown) = shutdown else {
            return read.await;
        };
        tokio::select! {
            next = read => next,
            _ = shutdown.changed() => {
                debug!("Server shutting down");
                Ok(None)
            }
        }
    }
}

/// Serves a connection over any stream, without read timeout.
///
/// # Errors
///
/// Same as [`Connection::serve`].
pub async fn serve_connection<S, H>(stream: S, registry: Arc<CallRegistry>, handler: Arc<H>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler,
{
    Connection::new(stream, registry, handler).serve().await
}

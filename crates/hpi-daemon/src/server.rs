use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;

use hpi_wire::CallRegistry;
use hpi_wire::frame::MAX_PAYLOAD_LENGTH;

use tokio::net::TcpListener;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinSet};

use tracing::{error, info, warn};

use crate::config::{Config, DEFAULT_PORT, ReadTimeout, Workers};
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::handler::Handler;

// The entire local network is considered, so the Ipv4 unspecified address is
// used.
const DEFAULT_ADDRESS: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

#[derive(Debug)]
struct ServerData<H> {
    // Listening address.
    address: Ipv4Addr,
    // Listening port.
    port: u16,
    // Maximum number of connections served at the same time.
    max_workers: Workers,
    // Per-connection read timeout.
    read_timeout: ReadTimeout,
    // Maximum frame payload size.
    max_payload: usize,
    // Call registry, the HPI one when absent.
    registry: Option<CallRegistry>,
    // Business logic.
    handler: H,
}

/// A server answering HPI calls on a TCP port.
///
/// Each accepted connection is served by its own task.
#[derive(Debug)]
pub struct Server<H> {
    data: ServerData<H>,
}

impl<H: Handler> Server<H> {
    /// Creates a [`Server`] dispatching calls to the given [`Handler`].
    pub const fn new(handler: H) -> Self {
        Self {
            data: ServerData {
                address: DEFAULT_ADDRESS,
                port: DEFAULT_PORT,
                max_workers: Workers::Unbounded,
                read_timeout: ReadTimeout::Unbounded,
                max_payload: MAX_PAYLOAD_LENGTH,
                registry: None,
                handler,
            },
        }
    }

    /// Creates a [`Server`] from a [`Config`].
    pub fn from_config(config: &Config, handler: H) -> Self {
        Self::new(handler)
            .address(config.address)
            .port(config.port)
            .max_workers(config.max_workers)
            .read_timeout(config.read_timeout)
            .max_payload(config.max_payload)
    }

    /// Sets the server `IPv4` address.
    #[must_use]
    pub const fn address(mut self, address: Ipv4Addr) -> Self {
        self.data.address = address;
        self
    }

    /// Sets the server port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.data.port = port;
        self
    }

    /// Sets the maximum number of connections served at the same time.
    ///
    /// Further connections wait to be accepted.
    #[must_use]
    pub const fn max_workers(mut self, max_workers: Workers) -> Self {
        self.data.max_workers = max_workers;
        self
    }

    /// Sets the per-connection read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, read_timeout: ReadTimeout) -> Self {
        self.data.read_timeout = read_timeout;
        self
    }

    /// Sets the maximum frame payload size.
    #[must_use]
    pub const fn max_payload(mut self, max_payload: usize) -> Self {
        self.data.max_payload = max_payload;
        self
    }

    /// Sets the call registry, replacing the HPI one.
    #[must_use]
    #[inline]
    pub fn registry(mut self, registry: CallRegistry) -> Self {
        self.data.registry = Some(registry);
        self
    }

    /// Transforms the server into a [`GracefulShutdownServer`].
    ///
    /// The [`Future`] passed as input manages the graceful shutdown of
    /// the server.
    #[must_use]
    #[inline]
    pub fn with_graceful_shutdown<F>(self, signal: F) -> GracefulShutdownServer<H, F>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        GracefulShutdownServer {
            data: self.data,
            signal,
        }
    }

    /// Runs the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn run(self) -> Result<()> {
        self.with_graceful_shutdown(std::future::pending())
            .run()
            .await
    }
}

/// A server with graceful shutdown.
///
/// Aside from the graceful shutdown functionality, it behaves the same as
/// [`Server`]. Once the signal completes, no connection is accepted anymore
/// and every connection is closed as soon as it has answered its current
/// request.
#[derive(Debug)]
pub struct GracefulShutdownServer<H, F> {
    // Server data.
    data: ServerData<H>,
    // Graceful shutdown signal.
    signal: F,
}

impl<H, F> GracefulShutdownServer<H, F>
where
    H: Handler,
    F: Future<Output = ()> + Send + 'static,
{
    /// Runs the server with graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn run(self) -> Result<()> {
        let ServerData {
            address,
            port,
            max_workers,
            read_timeout,
            max_payload,
            registry,
            handler,
        } = self.data;

        if max_payload == 0 || max_workers == Workers::Bounded(0) {
            return Err(Error::new(
                ErrorKind::Configuration,
                "Workers and payload maximum must be positive",
            ));
        }

        // The registry is complete before the first connection is accepted.
        let registry = match registry {
            Some(registry) => registry,
            None => CallRegistry::hpi()?,
        };
        let registry = Arc::new(registry.max_payload(max_payload));
        let handler = Arc::new(handler);
        info!("Registered {} calls", registry.len());

        let workers = match max_workers {
            Workers::Unbounded => None,
            Workers::Bounded(workers) => Some(Arc::new(Semaphore::new(workers))),
        };

        let listener = TcpListener::bind((address, port)).await?;
        info!("Server listening on {address}:{port}");

        let (shutdown_sender, shutdown) = watch::channel(false);
        let mut connections = JoinSet::new();
        let mut signal = std::pin::pin!(self.signal);

        'accept: loop {
            let permit = match &workers {
                Some(workers) => tokio::select! {
                    permit = Arc::clone(workers).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(e) => return Err(Error::new(ErrorKind::Transport, e.to_string())),
                    },
                    () = &mut signal => break 'accept,
                },
                None => None,
            };

            let (stream, peer) = loop {
                tokio::select! {
                    accepted = listener.accept() => match accepted {
                        Ok(accepted) => break accepted,
                        Err(e) => error!("Failed to accept a connection: {e}"),
                    },
                    Some(joined) = connections.join_next() => reap(joined),
                    () = &mut signal => break 'accept,
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Cannot disable Nagle's algorithm for {peer}: {e}");
            }
            info!("Accepted connection from {peer}");

            let connection = Connection::new(stream, Arc::clone(&registry), Arc::clone(&handler))
                .peer(peer)
                .read_timeout(read_timeout)
                .shutdown(shutdown.clone());
            connections.spawn(async move {
                // The worker slot is released with the connection.
                let _permit = permit;
                // Errors are already logged.
                let _ = connection.serve().await;
            });
        }

        info!("Stopping server...");
        drop(listener);
        // Receivers exist as long as their connections.
        let _ = shutdown_sender.send(true);
        while let Some(joined) = connections.join_next().await {
            reap(joined);
        }
        info!("Server stopped");

        Ok(())
    }
}

fn reap(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        error!("Connection task failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::time::Duration;

    use hpi_client::Client;

    use hpi_wire::Status;

    use serial_test::serial;

    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use crate::config::{Config, ReadTimeout, Workers};
    use crate::error::Result;
    use crate::tests::{CountingHandler, VERSION, init_logging};

    use super::Server;

    const PORT: u16 = 47_430;

    fn start(server: Server<Arc<CountingHandler>>) -> (oneshot::Sender<()>, tokio::task::JoinHandle<Result<()>>) {
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(
            server
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .run(),
        );
        (stop, task)
    }

    async fn connect() -> Client<TcpStream> {
        for _ in 0..50 {
            if let Ok(client) = Client::connect((Ipv4Addr::LOCALHOST, PORT)).await {
                return client;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("Server not reachable on port {PORT}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[serial]
    async fn serve_clients() {
        init_logging();
        let handler = Arc::new(CountingHandler::default());
        let server = Server::new(Arc::clone(&handler))
            .address(Ipv4Addr::LOCALHOST)
            .port(PORT);
        let (stop, task) = start(server);

        let mut first = connect().await;
        let mut second = connect().await;

        assert_eq!(first.version_get().await.unwrap(), VERSION);
        let session = first.session_open(7).await.unwrap();
        let other = second.session_open(7).await.unwrap();
        assert_ne!(session, other);

        second.session_close(other).await.unwrap();
        assert_eq!(
            second.session_close(other).await.unwrap_err().status(),
            Some(Status::INVALID_SESSION)
        );

        // An abrupt close cleans the session up.
        drop(first);
        drop(second);
        for _ in 0..50 {
            if !handler.closed_sessions().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(handler.closed_sessions(), [session]);

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[serial]
    async fn graceful_shutdown_closes_sessions() {
        let handler = Arc::new(CountingHandler::default());
        let config = Config {
            address: Ipv4Addr::LOCALHOST,
            port: PORT,
            max_workers: Workers::Bounded(2),
            read_timeout: ReadTimeout::Unbounded,
            ..Config::default()
        };
        let (stop, task) = start(Server::from_config(&config, Arc::clone(&handler)));

        let mut client = connect().await;
        let session = client.session_open(1).await.unwrap();

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();

        assert_eq!(handler.closed_sessions(), [session]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[serial]
    async fn bounded_workers() {
        let handler = Arc::new(CountingHandler::default());
        let server = Server::new(Arc::clone(&handler))
            .address(Ipv4Addr::LOCALHOST)
            .port(PORT)
            .max_workers(Workers::Bounded(1));
        let (stop, task) = start(server);

        let mut first = connect().await;
        assert_eq!(first.version_get().await.unwrap(), VERSION);

        // The second connection waits in the backlog for the first to end.
        let mut second = Client::connect((Ipv4Addr::LOCALHOST, PORT)).await.unwrap();
        let waiting = tokio::spawn(async move { second.version_get().await.unwrap() });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiting.is_finished());

        drop(first);
        assert_eq!(waiting.await.unwrap(), VERSION);

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[serial]
    async fn zero_workers() {
        let server = Server::new(CountingHandler::default())
            .port(PORT)
            .max_workers(Workers::Bounded(0));
        assert!(server.run().await.is_err());
    }
}

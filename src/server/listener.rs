//! HTTP listener
//!
//! Handles the TCP accept loop and spawns one task per viewer connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::broadcast::BroadcastHandle;
use crate::error::{Error, Result};
use crate::server::config::ServerConfig;
use crate::server::http;
use crate::session::StreamSession;

/// MJPEG streaming HTTP server
///
/// Serves the landing page at `/index.html` and the live stream at
/// `/stream.mjpg`. The producer keeps ownership of the
/// [`FrameBroadcaster`]; the server only holds a [`BroadcastHandle`] and
/// attaches one receiver per streaming viewer.
///
/// [`FrameBroadcaster`]: crate::broadcast::FrameBroadcaster
pub struct MjpegServer {
    config: ServerConfig,
    frames: BroadcastHandle,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl MjpegServer {
    /// Create a new server with the given configuration and frame source
    pub fn new(config: ServerConfig, frames: BroadcastHandle) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            frames,
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let frames = self.frames.clone();
        let max_request_head = self.config.max_request_head;

        tokio::spawn(async move {
            // Permit released when the connection task ends
            let _permit = permit;

            match serve_connection(session_id, socket, &frames, max_request_head).await {
                Ok(()) => {
                    tracing::debug!(session_id = session_id, "Connection closed");
                }
                Err(e) if e.is_disconnect() => {
                    tracing::info!(session_id = session_id, "Client disconnected");
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = session_id,
                        error = %e,
                        "Connection failed"
                    );
                }
            }
        });
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

/// Serve one already-accepted connection.
///
/// Reads the request head, routes it, and either answers with a short
/// response or hands the connection to a [`StreamSession`] for the rest of
/// its life. Public so the server can be driven over transports other than
/// plain TCP (tests use in-memory duplex streams).
pub async fn serve_connection<S>(
    session_id: u64,
    mut stream: S,
    frames: &BroadcastHandle,
    max_request_head: usize,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = match http::read_request(&mut stream, max_request_head).await {
        Ok(request) => request,
        Err(e @ (Error::InvalidRequest(_) | Error::RequestTooLarge(_))) => {
            tracing::debug!(session_id = session_id, error = %e, "Rejecting request");
            stream
                .write_all(http::bad_request_response().as_bytes())
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(
        session_id = session_id,
        method = %request.method,
        target = %request.target,
        "Request"
    );

    if request.method != "GET" {
        stream
            .write_all(http::method_not_allowed_response().as_bytes())
            .await?;
        return Ok(());
    }

    match request.target.as_str() {
        "/" | "/index.html" => {
            stream.write_all(http::index_response().as_bytes()).await?;
            Ok(())
        }
        "/stream.mjpg" => {
            let mut session = StreamSession::new(session_id, frames.subscribe(), stream);
            session.run().await.map(|_| ())
        }
        _ => {
            stream
                .write_all(http::not_found_response().as_bytes())
                .await?;
            Ok(())
        }
    }
}

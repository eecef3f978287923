//! TCP transport implementation.
//!
//! Each accepted connection gets its own rmcp session, served on its own
//! task. Sessions share the server (and with it the Glassnode client and its
//! connection pool) but nothing else.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, info, info_span, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// Pause after a failed `accept` before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
    active: Arc<AtomicUsize>,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind and serve connections until a fatal error.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (MCP over TCP)", addr);
        self.accept_loop(listener, server).await
    }

    async fn accept_loop(&self, listener: TcpListener, server: McpServer) -> TransportResult<()> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
            }

            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            info!("Accepted connection from {} ({} active)", peer, active);

            let server = server.clone();
            let counter = self.active.clone();
            tokio::spawn(
                async move {
                    serve_connection(server, stream, peer).await;
                    let remaining = counter.fetch_sub(1, Ordering::SeqCst) - 1;
                    info!("Connection closed ({} active)", remaining);
                }
                .instrument(info_span!("tcp_session", %peer)),
            );
        }
    }
}

/// Run one MCP session over an accepted stream.
async fn serve_connection(server: McpServer, stream: TcpStream, peer: SocketAddr) {
    let service = match server.serve(stream).await {
        Ok(service) => service,
        Err(e) => {
            warn!("Failed to initialize session for {}: {}", peer, e);
            return;
        }
    };

    if let Err(e) = service.waiting().await {
        warn!("Session with {} ended with an error: {}", peer, e);
    }
}

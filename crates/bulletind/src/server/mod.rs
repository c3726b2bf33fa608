//! HTTP server for the bulletin daemon.
//!
//! The server:
//! - Listens on a TCP socket through `tiny_http`, which owns connection
//!   handling and HTTP/1.x parsing
//! - Forwards each request from a blocking accept thread into the runtime
//! - Spawns a RequestHandler for each request
//! - Routes `/add`, `/del` and the listing page to the registry
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HttpServer    │
//! │                 │
//! │ tiny_http recv  │  (accept thread)
//! └───────┬─────────┘
//!         │ mpsc
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ RequestHandler  │────▶│  RegistryHandle │
//! │ (per request)   │     │                 │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Request errors are logged and allow continued operation

mod page;
mod request;
mod routes;

pub use page::render_service_list;
pub use request::{request_url, RequestError, RequestHandler};
pub use routes::{route, HttpResponse};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use tiny_http::{Request, Server};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::RegistryHandle;

/// Requests queued between the accept thread and the runtime
const REQUEST_BUFFER: usize = 64;

/// HTTP server for the bulletin daemon.
pub struct HttpServer {
    /// Bound server, shared with the accept thread
    server: Arc<Server>,

    /// Handle to the service registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Request counter for log correlation
    request_counter: AtomicU64,
}

impl HttpServer {
    /// Binds the listening socket.
    ///
    /// Binding happens up front so that a busy port is reported at startup,
    /// before any background task is running.
    ///
    /// # Errors
    ///
    /// - `ServerError::Bind` if the address cannot be bound
    pub fn bind(
        addr: SocketAddr,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let server = Server::http(addr).map_err(|e| ServerError::Bind {
            addr,
            error: e.to_string(),
        })?;

        Ok(Self {
            server: Arc::new(server),
            registry,
            cancel_token,
            request_counter: AtomicU64::new(0),
        })
    }

    /// Returns the address the server is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.server
            .server_addr()
            .to_ip()
            .ok_or(ServerError::LocalAddr)
    }

    /// Runs the server.
    ///
    /// Serves requests until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// - `ServerError::Spawn` if the accept thread cannot be started
    pub async fn run(&self) -> Result<(), ServerError> {
        let (tx, mut rx) = mpsc::channel::<Request>(REQUEST_BUFFER);

        let server = Arc::clone(&self.server);
        thread::Builder::new()
            .name("http-accept".to_string())
            .spawn(move || {
                while let Ok(request) = server.recv() {
                    if tx.blocking_send(request).is_err() {
                        break;
                    }
                }
                debug!("HTTP accept thread exiting");
            })
            .map_err(|e| ServerError::Spawn(e.to_string()))?;

        if let Ok(addr) = self.local_addr() {
            info!(addr = %addr, "HTTP server listening");
        }

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                maybe_request = rx.recv() => {
                    let Some(request) = maybe_request else {
                        warn!("HTTP accept thread stopped");
                        break;
                    };
                    let request_number = self.request_counter.fetch_add(1, Ordering::Relaxed);
                    self.handle_request(request, request_number);
                }
            }
        }

        // Wakes the accept thread out of recv()
        self.server.unblock();

        info!("HTTP server stopped");
        Ok(())
    }

    /// Handles a new request by spawning a handler task.
    fn handle_request(&self, request: Request, request_number: u64) {
        let handler = RequestHandler::new(request, self.registry.clone(), request_number);
        tokio::spawn(handler.run());
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },

    #[error("Server is not bound to an IP address")]
    LocalAddr,

    #[error("Failed to spawn accept thread: {0}")]
    Spawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: SocketAddr::from(([127, 0, 0, 1], 8087)),
            error: "address in use".to_string(),
        };
        assert!(err.to_string().contains("127.0.0.1:8087"));
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_bind_busy_port_fails() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let registry = RegistryHandle::new(cmd_tx);

        let first = HttpServer::bind(
            SocketAddr::from(([127, 0, 0, 1], 0)),
            registry.clone(),
            CancellationToken::new(),
        )
        .unwrap();
        let addr = first.local_addr().unwrap();

        let second = HttpServer::bind(addr, registry, CancellationToken::new());
        assert!(matches!(second, Err(ServerError::Bind { .. })));
    }
}

//! Handler for individual HTTP requests.
//!
//! Each request handed over by the accept thread gets its own
//! `RequestHandler` that:
//! - Resolves the request target into a URL
//! - Routes it to the registry
//! - Sends the response back on a blocking worker
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response failures are logged and the request is dropped

use tiny_http::Request;
use tracing::{debug, warn};
use url::Url;

use super::routes::{route, HttpResponse};
use crate::registry::RegistryHandle;

/// Handler for a single request.
pub struct RequestHandler {
    request: Request,
    registry: RegistryHandle,
    request_number: u64,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(request: Request, registry: RegistryHandle, request_number: u64) -> Self {
        Self {
            request,
            registry,
            request_number,
        }
    }

    /// Serves the request.
    pub async fn run(self) {
        let Self {
            request,
            registry,
            request_number,
        } = self;

        debug!(
            request = request_number,
            peer = ?request.remote_addr(),
            method = %request.method(),
            target = %request.url(),
            "Request received"
        );

        let response = match request_url(request.url()) {
            Ok(url) => route(&registry, &url).await,
            Err(e) => {
                warn!(request = request_number, error = %e, "Invalid request target");
                HttpResponse::text(400, "Bad Request")
            }
        };

        let status = response.status;
        let sent = tokio::task::spawn_blocking(move || request.respond(response.into_response())).await;

        match sent {
            Ok(Ok(())) => debug!(request = request_number, status, "Response sent"),
            Ok(Err(e)) => debug!(request = request_number, error = %e, "Failed to send response"),
            Err(e) => warn!(request = request_number, error = %e, "Response task failed"),
        }
    }
}

/// Resolves an origin-form request target into a URL for path and query
/// access.
pub fn request_url(target: &str) -> Result<Url, RequestError> {
    if !target.starts_with('/') {
        return Err(RequestError::MalformedTarget(target.to_string()));
    }

    Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| RequestError::MalformedTarget(format!("{target}: {e}")))
}

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Malformed request target: {0}")]
    MalformedTarget(String),
}

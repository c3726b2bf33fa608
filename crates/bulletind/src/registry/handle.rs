//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to the registry actor. Request handlers and the status prober
//! each hold a clone; neither ever touches registry state directly.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use bulletin_core::{ServiceEntry, ServiceName, ServiceStatus};
use tokio::sync::{mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError};

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// # Usage
///
/// ```ignore
/// let handle = registry_handle.clone();
///
/// handle.set_url(ServiceName::parse("svc1")?, "http://x").await?;
/// let removed = handle.delete(ServiceName::parse("svc1")?).await?;
/// let entries = handle.snapshot().await;
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(sender: mpsc::Sender<RegistryCommand>) -> Self {
        Self { sender }
    }

    /// Register a service or replace its URL.
    ///
    /// Returns once the change has been applied and written to the store.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn set_url(
        &self,
        name: ServiceName,
        url: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::SetUrl {
                name,
                url: url.into(),
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Record the status of an already registered service.
    ///
    /// Does nothing if the service is not registered.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn set_status(
        &self,
        name: ServiceName,
        status: ServiceStatus,
    ) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::SetStatus {
                name,
                status,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Remove a service.
    ///
    /// Returns `true` if the service was registered.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn delete(&self, name: ServiceName) -> Result<bool, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Delete {
                name,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Get a point-in-time copy of every entry, ordered by name.
    ///
    /// Returns an empty vector if no services are registered or if
    /// communication with the actor fails.
    pub async fn snapshot(&self) -> Vec<ServiceEntry> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Snapshot { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (RegistryHandle::new(cmd_tx), cmd_rx)
    }

    fn name(s: &str) -> ServiceName {
        ServiceName::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_set_url_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::SetUrl {
                name,
                url,
                respond_to,
            }) = rx.recv().await
            {
                assert_eq!(name.as_str(), "svc1");
                assert_eq!(url, "http://x");
                let _ = respond_to.send(());
                return true;
            }
            false
        });

        let result = handle.set_url(name("svc1"), "http://x").await;
        assert!(result.is_ok());
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_set_status_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::SetStatus {
                name,
                status,
                respond_to,
            }) = rx.recv().await
            {
                assert_eq!(name.as_str(), "svc1");
                assert_eq!(status, ServiceStatus::On);
                let _ = respond_to.send(());
                return true;
            }
            false
        });

        let result = handle.set_status(name("svc1"), ServiceStatus::On).await;
        assert!(result.is_ok());
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_returns_actor_answer() {
        let (handle, mut rx) = create_test_handle();

        tokio::spawn(async move {
            if let Some(RegistryCommand::Delete { respond_to, .. }) = rx.recv().await {
                let _ = respond_to.send(true);
            }
        });

        assert!(handle.delete(name("svc1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_url_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.set_url(name("svc1"), "http://x").await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_delete_dropped_response_is_channel_closed() {
        let (handle, mut rx) = create_test_handle();

        // Receive the command but drop the responder without answering
        tokio::spawn(async move {
            let _ = rx.recv().await;
        });

        let result = handle.delete(name("svc1")).await;
        assert!(matches!(result, Err(RegistryError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_snapshot_returns_empty_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(handle.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        assert!(!handle.is_connected());
    }
}

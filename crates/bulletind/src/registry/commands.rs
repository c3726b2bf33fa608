//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur while talking to the actor

use bulletin_core::{ServiceEntry, ServiceName, ServiceStatus};
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for its response. The actor only
/// answers after the command's state change has been written to the store,
/// so a resolved response means the change is durable (or its persistence
/// failure has been logged).
#[derive(Debug)]
pub enum RegistryCommand {
    /// Create the service or replace its URL.
    ///
    /// An existing service keeps its status; a new one starts `Off`.
    SetUrl {
        name: ServiceName,
        url: String,
        respond_to: oneshot::Sender<()>,
    },

    /// Record a probe result for an existing service.
    ///
    /// Ignored if the service is not registered.
    SetStatus {
        name: ServiceName,
        status: ServiceStatus,
        respond_to: oneshot::Sender<()>,
    },

    /// Remove a service. Responds with whether it was present.
    Delete {
        name: ServiceName,
        respond_to: oneshot::Sender<bool>,
    },

    /// Copy out every entry, ordered by name.
    Snapshot {
        respond_to: oneshot::Sender<Vec<ServiceEntry>>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
///
/// Persistence failures are not listed here: the actor logs them and keeps
/// the in-memory change.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The command or response channel was closed.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,

    /// The actor thread could not be started.
    #[error("failed to spawn registry actor: {0}")]
    Spawn(String),
}

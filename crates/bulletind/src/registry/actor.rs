//! Registry actor - owns all service state and processes commands.
//!
//! The RegistryActor is the single owner of the service map and the only
//! writer of the store. It runs on its own thread, takes commands one at a
//! time from an mpsc channel, and writes the full map to disk before
//! answering any command that changed it.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Store failures are logged, never propagated
//! - Response send failures (caller went away) are ignored

use bulletin_core::{ServiceEntry, ServiceName, ServiceRecord, ServiceStatus};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::commands::RegistryCommand;
use crate::store::{ServiceMap, Store};

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns all service state.
///
/// # Consistency
///
/// Commands are processed sequentially, and each command's store write
/// happens before its response is sent and before the next command is
/// taken. Readers therefore always observe the latest persisted state, and
/// concurrent mutations apply in the order they reach the channel.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Service records keyed by name
    services: ServiceMap,

    /// Backing file, rewritten after every mutation
    store: Store,
}

impl RegistryActor {
    /// Creates a new registry actor seeded with previously loaded state.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        store: Store,
        services: ServiceMap,
    ) -> Self {
        Self {
            receiver,
            services,
            store,
        }
    }

    /// Runs the actor loop until every sender has been dropped.
    ///
    /// Blocks the calling thread; run it on a dedicated thread, never on an
    /// async worker.
    pub fn run(mut self) {
        info!(services = self.services.len(), "Registry actor starting");

        while let Some(cmd) = self.receiver.blocking_recv() {
            self.handle_command(cmd);
        }

        info!(services = self.services.len(), "Registry actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::SetUrl {
                name,
                url,
                respond_to,
            } => {
                self.handle_set_url(name, url);
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(());
            }
            RegistryCommand::SetStatus {
                name,
                status,
                respond_to,
            } => {
                self.handle_set_status(&name, status);
                let _ = respond_to.send(());
            }
            RegistryCommand::Delete { name, respond_to } => {
                let removed = self.handle_delete(&name);
                let _ = respond_to.send(removed);
            }
            RegistryCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.handle_snapshot());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_set_url(&mut self, name: ServiceName, url: String) {
        match self.services.get_mut(&name) {
            Some(record) => {
                info!(service = %name, url = %url, "Service URL updated");
                record.url = url;
            }
            None => {
                info!(
                    service = %name,
                    url = %url,
                    total_services = self.services.len() + 1,
                    "Service registered"
                );
                self.services.insert(name, ServiceRecord::new(url));
            }
        }

        self.persist();
    }

    fn handle_set_status(&mut self, name: &ServiceName, status: ServiceStatus) {
        let Some(record) = self.services.get_mut(name) else {
            // Deleted while its probe was in flight
            debug!(service = %name, "Status update for unknown service, ignoring");
            return;
        };

        if record.status == status {
            debug!(service = %name, status = %status, "Service status unchanged");
            return;
        }

        let previous = std::mem::replace(&mut record.status, status);
        info!(
            service = %name,
            from = %previous,
            to = %status,
            "Service status changed"
        );

        self.persist();
    }

    fn handle_delete(&mut self, name: &ServiceName) -> bool {
        if self.services.remove(name).is_none() {
            debug!(service = %name, "Delete for unknown service");
            return false;
        }

        info!(
            service = %name,
            remaining_services = self.services.len(),
            "Service removed"
        );

        self.persist();
        true
    }

    fn handle_snapshot(&self) -> Vec<ServiceEntry> {
        self.services
            .iter()
            .map(|(name, record)| ServiceEntry::from_record(name, record))
            .collect()
    }

    /// Writes the full map to the store, logging on failure.
    ///
    /// The in-memory change is kept either way.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.services) {
            error!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to persist service registry"
            );
        }
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    /// Returns the number of services currently registered.
    #[cfg(test)]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

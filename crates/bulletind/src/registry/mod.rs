//! Service registry using Actor pattern.
//!
//! The registry is the single source of truth for registered services and
//! the only writer of the persistent store. It receives commands via a tokio
//! mpsc channel and processes them one at a time on a dedicated thread.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Request handler │──┐
//! └─────────────────┘  │  RegistryCommand   ┌─────────────────┐     ┌───────────────┐
//!                      ├───(mpsc channel)──▶│  RegistryActor  │────▶│ services.json │
//! ┌─────────────────┐  │                    │ BTreeMap<Name,  │     └───────────────┘
//! │  Status prober  │──┘                    │   ServiceRecord>│   write-through on
//! └─────────────────┘                       └─────────────────┘   every mutation
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

use crate::store::Store;

/// Channel buffer size
const COMMAND_BUFFER: usize = 100;

/// Spawn the registry actor and return a handle for interaction.
///
/// This function:
/// 1. Loads prior state from the store (empty if missing or corrupt)
/// 2. Spawns the RegistryActor on a dedicated thread, so store writes
///    never block async workers
/// 3. Returns a RegistryHandle for client use
///
/// The actor stops once every handle has been dropped.
///
/// # Errors
///
/// - `RegistryError::Spawn` if the actor thread cannot be created
///
/// # Example
///
/// ```no_run
/// use bulletind::registry::spawn_registry;
/// use bulletind::store::Store;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry(Store::in_dir(".")).unwrap();
///
///     let services = handle.snapshot().await;
/// }
/// ```
pub fn spawn_registry(store: Store) -> Result<RegistryHandle, RegistryError> {
    let services = store.load();
    debug!(
        path = %store.path().display(),
        services = services.len(),
        "Spawning registry actor"
    );

    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let actor = RegistryActor::new(cmd_rx, store, services);

    thread::Builder::new()
        .name("registry".to_string())
        .spawn(move || actor.run())
        .map_err(|e| RegistryError::Spawn(e.to_string()))?;

    Ok(RegistryHandle::new(cmd_tx))
}

//! Persistent store for the service registry.
//!
//! The whole registry lives in one pretty-printed JSON file mapping service
//! names to records:
//!
//! ```text
//! {
//!   "svc1": {
//!     "URL": "http://x",
//!     "Status": "off"
//!   }
//! }
//! ```
//!
//! The file is rewritten in full on every save. Content goes to a sibling
//! `.tmp` file first and is then renamed over the target, so a crash mid-write
//! leaves the previous state intact.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bulletin_core::{ServiceName, ServiceRecord};
use thiserror::Error;
use tracing::{debug, warn};

/// File name of the store inside the root directory.
pub const DB_FILE_NAME: &str = "services.json";

/// Full registry state, ordered by service name.
pub type ServiceMap = BTreeMap<ServiceName, ServiceRecord>;

/// Errors that can occur while reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid store content: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// JSON file backing the registry.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at `<root>/services.json`.
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(DB_FILE_NAME))
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted registry state.
    ///
    /// Never fails: a missing, unreadable or malformed file is logged and
    /// yields an empty map.
    pub fn load(&self) -> ServiceMap {
        match self.try_load() {
            Ok(services) => {
                debug!(
                    path = %self.path.display(),
                    services = services.len(),
                    "Loaded service store"
                );
                services
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not load service store, starting empty"
                );
                ServiceMap::new()
            }
        }
    }

    /// Loads the persisted state, reporting why it could not be read.
    pub fn try_load(&self) -> Result<ServiceMap, StoreError> {
        let content = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    /// Replaces the backing file with the given state.
    pub fn save(&self, services: &ServiceMap) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(services)?;
        let tmp_path = self.tmp_path();

        let mut file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        file.write_all(&content)
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

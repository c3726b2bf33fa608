//! Daemon configuration.
//!
//! Everything the daemon needs to start: where its files live, which port to
//! listen on, and how the status prober is paced.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::Store;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8087;

/// Time between two probe rounds.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Upper bound for a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Log directory, relative to the root directory.
pub const LOG_DIR_NAME: &str = "log";

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "bulletin.log";

/// Runtime configuration for the bulletin daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `services.json` and `log/`
    pub root: PathBuf,

    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,

    /// Time between two probe rounds
    pub probe_interval: Duration,

    /// Timeout of one probe request
    pub probe_timeout: Duration,
}

impl Config {
    /// Creates a configuration with default pacing, listening on all
    /// interfaces at `port`.
    pub fn new(root: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            root: root.into(),
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            probe_interval: DEFAULT_PROBE_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the store backed by `<root>/services.json`.
    pub fn store(&self) -> Store {
        Store::in_dir(&self.root)
    }

    /// Returns the log directory, `<root>/log`.
    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_NAME)
    }

    /// Returns the log file path, `<root>/log/bulletin.log`.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("/srv/bulletin", DEFAULT_PORT);

        assert_eq!(config.listen_addr.port(), 8087);
        assert!(config.listen_addr.ip().is_unspecified());
        assert_eq!(config.probe_interval, Duration::from_secs(5));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_paths_derive_from_root() {
        let config = Config::new("/srv/bulletin", 9000);

        assert_eq!(config.root(), Path::new("/srv/bulletin"));
        assert_eq!(config.store().path(), Path::new("/srv/bulletin/services.json"));
        assert_eq!(config.log_dir(), PathBuf::from("/srv/bulletin/log"));
        assert_eq!(
            config.log_file(),
            PathBuf::from("/srv/bulletin/log/bulletin.log")
        );
    }
}

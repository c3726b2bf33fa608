//! Service entries, their names and liveness status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult};

// ============================================================================
// Type-Safe Identifiers
// ============================================================================

/// Unique, non-empty name of a registered service.
///
/// This is the registry key. Ordering is lexicographic so that listings
/// and the persisted file come out sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a service name, rejecting the empty string.
    pub fn parse(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::EmptyServiceName);
        }
        Ok(Self(name))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

// ============================================================================
// Service Status
// ============================================================================

/// Liveness of a service as last observed by the prober.
///
/// A freshly registered service is `Off` until its first probe answers 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Last probe got an HTTP 200 response.
    On,

    /// Never probed, or the last probe failed.
    #[default]
    Off,
}

impl ServiceStatus {
    /// Maps a probe outcome to a status.
    #[must_use]
    pub fn from_alive(alive: bool) -> Self {
        if alive {
            Self::On
        } else {
            Self::Off
        }
    }

    /// Returns the wire/display label (`"on"` or `"off"`).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// Returns true if the service answered its last probe.
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Records and Views
// ============================================================================

/// Stored state of one service, keyed by its name elsewhere.
///
/// Field names match the persisted JSON layout (`{"URL": ..., "Status": ...}`).
/// Files written without status tracking carry only `URL`; those records
/// load as `Off`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "Status", default)]
    pub status: ServiceStatus,
}

impl ServiceRecord {
    /// Creates a record for a newly registered service.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ServiceStatus::Off,
        }
    }
}

/// Owned, read-only view of one registry entry.
///
/// Snapshots hand these out so no caller ever holds a reference into
/// registry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: ServiceName,
    pub url: String,
    pub status: ServiceStatus,
}

impl ServiceEntry {
    /// Builds a view from a registry key and its record.
    pub fn from_record(name: &ServiceName, record: &ServiceRecord) -> Self {
        Self {
            name: name.clone(),
            url: record.url.clone(),
            status: record.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_rejects_empty() {
        assert_eq!(ServiceName::parse(""), Err(DomainError::EmptyServiceName));
        assert_eq!(ServiceName::parse("svc1").unwrap().as_str(), "svc1");
    }

    #[test]
    fn test_service_name_deserialize_validates() {
        let name: ServiceName = serde_json::from_str("\"svc1\"").unwrap();
        assert_eq!(name.to_string(), "svc1");

        let result: Result<ServiceName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_service_name_ordering() {
        let mut names = vec![
            ServiceName::parse("web").unwrap(),
            ServiceName::parse("api").unwrap(),
            ServiceName::parse("db").unwrap(),
        ];
        names.sort();
        let sorted: Vec<&str> = names.iter().map(ServiceName::as_str).collect();
        assert_eq!(sorted, vec!["api", "db", "web"]);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ServiceStatus::On.label(), "on");
        assert_eq!(ServiceStatus::Off.to_string(), "off");
        assert_eq!(ServiceStatus::default(), ServiceStatus::Off);
        assert!(ServiceStatus::from_alive(true).is_on());
        assert!(!ServiceStatus::from_alive(false).is_on());
    }

    #[test]
    fn test_record_json_layout() {
        let record = ServiceRecord {
            url: "http://x".to_string(),
            status: ServiceStatus::On,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"URL": "http://x", "Status": "on"}));
    }

    #[test]
    fn test_record_without_status_loads_off() {
        let record: ServiceRecord = serde_json::from_str(r#"{"URL": "http://x"}"#).unwrap();
        assert_eq!(record, ServiceRecord::new("http://x"));
    }

    #[test]
    fn test_entry_from_record() {
        let name = ServiceName::parse("svc1").unwrap();
        let entry = ServiceEntry::from_record(&name, &ServiceRecord::new("http://x"));
        assert_eq!(entry.name, name);
        assert_eq!(entry.url, "http://x");
        assert_eq!(entry.status, ServiceStatus::Off);
    }
}

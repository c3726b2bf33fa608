//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Service names are registry keys and must not be empty
    #[error("Service name must not be empty")]
    EmptyServiceName,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
